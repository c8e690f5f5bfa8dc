use {
    async_trait::async_trait,
    broadcaster_common::{DeliveryId, Message},
    futures::future::join_all,
    tracing::{Dispatch, warn},
};

use crate::{
    Error, Result,
    broadcaster::{Broadcaster, with_logger},
};

/// Delivers one message to several broadcasters concurrently.
///
/// Every child is attempted even when others fail; the call only succeeds
/// when all of them do.
pub struct MultiBroadcaster {
    broadcasters: Vec<Box<dyn Broadcaster>>,
    logger: Option<Dispatch>,
}

impl MultiBroadcaster {
    pub fn new(broadcasters: Vec<Box<dyn Broadcaster>>) -> Self {
        Self {
            broadcasters,
            logger: None,
        }
    }

    pub fn len(&self) -> usize {
        self.broadcasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.broadcasters.is_empty()
    }

    async fn broadcast_all(&self, message: &Message) -> Result<DeliveryId> {
        let results = join_all(
            self.broadcasters
                .iter()
                .map(|br| br.broadcast_message(message)),
        )
        .await;

        let mut ids = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (idx, result) in results.into_iter().enumerate() {
            match result {
                Ok(id) => ids.push(id),
                Err(e) => {
                    warn!(broadcaster = idx, error = %e, "broadcast failed");
                    failures.push(e);
                },
            }
        }

        if failures.is_empty() {
            Ok(DeliveryId::Multi(ids))
        } else {
            Err(Error::Multi { failures })
        }
    }
}

#[async_trait]
impl Broadcaster for MultiBroadcaster {
    async fn broadcast_message(&self, message: &Message) -> Result<DeliveryId> {
        with_logger(self.logger.as_ref(), self.broadcast_all(message)).await
    }

    fn set_logger(&mut self, logger: Dispatch) {
        for br in &mut self.broadcasters {
            br.set_logger(logger.clone());
        }
        self.logger = Some(logger);
    }
}
