//! Slack's uniform `{ "ok": ..., "error": ... }` response wrapper.
//!
//! Slack reports most failures with HTTP 200 and `"ok": false`, so success
//! is decided here, never by the HTTP status alone.

use std::{io::Read, sync::Arc};

use {
    broadcaster_common::{DeliveryId, IdGenerator, RandomIdGenerator},
    serde::Deserialize,
    serde_json::{Map, Value},
};

use crate::{Error, Result};

/// Code used when an `ok: false` envelope omits `error`.
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// Namespace for delivery identifiers minted by this crate.
pub const ID_NAMESPACE: &str = "slack";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Every other top-level field.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Envelope {
    pub fn parse<R: Read>(body: R) -> Result<Self> {
        Ok(serde_json::from_reader(body)?)
    }

    /// `Ok(self)` when `ok` is true, otherwise an [`Error::Api`] carrying the
    /// remote error code.
    pub fn into_result(self) -> Result<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(Error::api(
                self.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ))
        }
    }

    /// Look up a dotted path such as `file.thumb_480`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Non-empty string at `path`, or [`Error::MissingAsset`].
    pub fn asset_ref(&self, path: &str) -> Result<String> {
        self.lookup(path)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(Error::MissingAsset)
    }
}

/// Turns a chat-post response into a delivery identifier.
///
/// Slack returns no durable message id, so one is synthesized locally on
/// every successful call.
#[derive(Clone)]
pub struct ResponseInterpreter {
    ids: Arc<dyn IdGenerator>,
}

impl Default for ResponseInterpreter {
    fn default() -> Self {
        Self::new(Arc::new(RandomIdGenerator))
    }
}

impl ResponseInterpreter {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    pub fn interpret<R: Read>(&self, body: R) -> Result<DeliveryId> {
        Envelope::parse(body)?.into_result()?;
        Ok(self.ids.generate(ID_NAMESPACE))
    }
}
