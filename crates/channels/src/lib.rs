//! Broadcaster plugin system.
//!
//! Each delivery target (Slack, the log, a no-op sink) implements the
//! [`Broadcaster`] trait and is constructed from a URI by a
//! [`BroadcasterFactory`] registered by scheme in a [`BroadcasterRegistry`].

pub mod broadcaster;
pub mod builtin;
pub mod error;
pub mod multi;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use {
    broadcaster::{Broadcaster, BroadcasterFactory, with_logger},
    builtin::{LogBroadcaster, LogBroadcasterFactory, NullBroadcaster, NullBroadcasterFactory},
    error::{Error, Result},
    multi::MultiBroadcaster,
    registry::BroadcasterRegistry,
};
