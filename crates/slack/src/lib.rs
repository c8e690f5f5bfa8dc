//! Slack broadcaster.
//!
//! Delivers a message to one Slack channel: images are uploaded concurrently
//! through `files.upload`, then a single `chat.postMessage` call carries the
//! text and one image block per uploaded asset, in the original image order.

pub mod api;
pub mod blocks;
pub mod broadcaster;
pub mod compose;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fanout;
pub mod upload;

pub use {
    broadcaster::{SlackBroadcaster, SlackBroadcasterFactory},
    config::SlackConfig,
    error::{Error, Result},
};
