use std::future::Future;

use {
    async_trait::async_trait,
    broadcaster_common::{DeliveryId, Message},
    tracing::{Dispatch, instrument::WithSubscriber},
    url::Url,
};

use crate::Result;

/// Something that can deliver a [`Message`] to one external destination.
///
/// These are exactly the operations the host application calls.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Deliver `message` and return a locally synthesized identifier.
    ///
    /// The identifier is not stable across deliveries and must not be used
    /// for deduplication.
    async fn broadcast_message(&self, message: &Message) -> Result<DeliveryId>;

    /// Route this broadcaster's diagnostics to `logger` instead of the
    /// process-wide default subscriber.
    fn set_logger(&mut self, logger: Dispatch);
}

/// Constructs broadcasters for one URI scheme.
#[async_trait]
pub trait BroadcasterFactory: Send + Sync {
    /// Scheme handled by this factory (e.g. "slack").
    fn scheme(&self) -> &str;

    /// Build a broadcaster from its configuration URI.
    async fn create(&self, uri: &Url) -> Result<Box<dyn Broadcaster>>;
}

/// Run `fut` under `logger` when one has been set.
pub async fn with_logger<F: Future>(logger: Option<&Dispatch>, fut: F) -> F::Output {
    match logger {
        Some(dispatch) => fut.with_subscriber(dispatch.clone()).await,
        None => fut.await,
    }
}
