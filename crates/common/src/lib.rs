//! Shared types, error definitions, and utilities used across all broadcaster crates.

pub mod error;
pub mod id;
pub mod secrets;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    id::{DeliveryId, IdGenerator, IdStyle, RandomIdGenerator, TimestampIdGenerator},
    secrets::{RuntimeVarResolver, SecretResolver},
    types::Message,
};
