//! Broadcasters that need no remote service.

use std::sync::Arc;

use {
    async_trait::async_trait,
    broadcaster_common::{DeliveryId, IdGenerator, Message, RandomIdGenerator},
    tracing::{Dispatch, info},
    url::Url,
};

use crate::{
    Result,
    broadcaster::{Broadcaster, BroadcasterFactory, with_logger},
};

/// Accepts every message and delivers it nowhere.
pub struct NullBroadcaster {
    ids: Arc<dyn IdGenerator>,
}

impl Default for NullBroadcaster {
    fn default() -> Self {
        Self {
            ids: Arc::new(RandomIdGenerator),
        }
    }
}

#[async_trait]
impl Broadcaster for NullBroadcaster {
    async fn broadcast_message(&self, _message: &Message) -> Result<DeliveryId> {
        Ok(self.ids.generate("null"))
    }

    fn set_logger(&mut self, _logger: Dispatch) {}
}

/// Writes each message to the tracing output at `info`.
pub struct LogBroadcaster {
    ids: Arc<dyn IdGenerator>,
    logger: Option<Dispatch>,
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self {
            ids: Arc::new(RandomIdGenerator),
            logger: None,
        }
    }
}

#[async_trait]
impl Broadcaster for LogBroadcaster {
    async fn broadcast_message(&self, message: &Message) -> Result<DeliveryId> {
        with_logger(self.logger.as_ref(), async {
            info!(
                title = %message.title,
                body = %message.body,
                images = message.images.len(),
                "broadcast message"
            );
        })
        .await;
        Ok(self.ids.generate("log"))
    }

    fn set_logger(&mut self, logger: Dispatch) {
        self.logger = Some(logger);
    }
}

#[derive(Default)]
pub struct NullBroadcasterFactory;

#[async_trait]
impl BroadcasterFactory for NullBroadcasterFactory {
    fn scheme(&self) -> &str {
        "null"
    }

    async fn create(&self, _uri: &Url) -> Result<Box<dyn Broadcaster>> {
        Ok(Box::new(NullBroadcaster::default()))
    }
}

#[derive(Default)]
pub struct LogBroadcasterFactory;

#[async_trait]
impl BroadcasterFactory for LogBroadcasterFactory {
    fn scheme(&self) -> &str {
        "log"
    }

    async fn create(&self, _uri: &Url) -> Result<Box<dyn Broadcaster>> {
        Ok(Box::new(LogBroadcaster::default()))
    }
}
