//! Locally synthesized delivery identifiers.
//!
//! Remote services rarely hand back a durable message id, so broadcasters
//! mint their own. Uniqueness is best-effort: callers must not use these as
//! deduplication keys.

use std::{
    fmt,
    str::FromStr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::Error;

/// Opaque identifier returned after a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryId {
    String(String),
    Int(i64),
    /// One id per child broadcaster, in broadcaster order.
    Multi(Vec<DeliveryId>),
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Multi(ids) => {
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        f.write_str("#")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            },
        }
    }
}

/// Source of delivery identifiers, seeded with a namespace per broadcaster.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, namespace: &str) -> DeliveryId;
}

/// `<namespace>-<uuid v4>`. The default generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self, namespace: &str) -> DeliveryId {
        DeliveryId::String(format!("{namespace}-{}", uuid::Uuid::new_v4()))
    }
}

/// `<namespace>-<unix nanos>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampIdGenerator;

impl IdGenerator for TimestampIdGenerator {
    fn generate(&self, namespace: &str) -> DeliveryId {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        DeliveryId::String(format!("{namespace}-{nanos}"))
    }
}

/// Which [`IdGenerator`] a broadcaster should use, as named in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStyle {
    #[default]
    Random,
    Timestamp,
}

impl IdStyle {
    #[must_use]
    pub fn generator(self) -> Arc<dyn IdGenerator> {
        match self {
            Self::Random => Arc::new(RandomIdGenerator),
            Self::Timestamp => Arc::new(TimestampIdGenerator),
        }
    }
}

impl FromStr for IdStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "timestamp" => Ok(Self::Timestamp),
            other => Err(Error::message(format!("unknown id style: {other}"))),
        }
    }
}
