use std::collections::HashMap;

use {tracing::debug, url::Url};

use crate::{
    Error, Result,
    broadcaster::{Broadcaster, BroadcasterFactory},
    builtin::{LogBroadcasterFactory, NullBroadcasterFactory},
    multi::MultiBroadcaster,
};

/// Registry of broadcaster factories, keyed by URI scheme.
///
/// Built by the host application; nothing registers itself implicitly.
pub struct BroadcasterRegistry {
    factories: HashMap<String, Box<dyn BroadcasterFactory>>,
}

impl Default for BroadcasterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcasterRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry pre-populated with the `null` and `log` broadcasters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NullBroadcasterFactory));
        registry.register(Box::new(LogBroadcasterFactory));
        registry
    }

    /// Register `factory`, replacing any factory already bound to its scheme.
    pub fn register(&mut self, factory: Box<dyn BroadcasterFactory>) {
        let scheme = factory.scheme().to_string();
        debug!(scheme = %scheme, "registering broadcaster");
        self.factories.insert(scheme, factory);
    }

    pub fn get(&self, scheme: &str) -> Option<&dyn BroadcasterFactory> {
        self.factories.get(scheme).map(|f| f.as_ref())
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        schemes.sort_unstable();
        schemes
    }

    /// Construct the broadcaster named by `uri`'s scheme.
    pub async fn new_broadcaster(&self, uri: &str) -> Result<Box<dyn Broadcaster>> {
        let parsed = Url::parse(uri)?;
        let factory = self
            .get(parsed.scheme())
            .ok_or_else(|| Error::unknown_scheme(parsed.scheme()))?;
        factory.create(&parsed).await
    }

    /// Construct one broadcaster per URI. A single URI yields that
    /// broadcaster directly; several are wrapped in a [`MultiBroadcaster`].
    pub async fn new_multi_broadcaster(&self, uris: &[String]) -> Result<Box<dyn Broadcaster>> {
        let mut broadcasters = Vec::with_capacity(uris.len());
        for uri in uris {
            broadcasters.push(self.new_broadcaster(uri).await?);
        }
        match broadcasters.len() {
            0 => Err(Error::invalid_input("no broadcaster URIs given")),
            1 => Ok(broadcasters.remove(0)),
            _ => Ok(Box::new(MultiBroadcaster::new(broadcasters))),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, broadcaster_common::Message};

    #[test]
    fn builtins_are_registered() {
        let registry = BroadcasterRegistry::with_builtins();
        assert_eq!(registry.schemes(), vec!["log", "null"]);
        assert!(registry.get("slack").is_none());
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let registry = BroadcasterRegistry::with_builtins();
        let err = registry.new_broadcaster("carrier-pigeon://coop").await;
        assert!(matches!(err, Err(Error::UnknownScheme { scheme }) if scheme == "carrier-pigeon"));
    }

    #[tokio::test]
    async fn malformed_uri_is_rejected() {
        let registry = BroadcasterRegistry::with_builtins();
        let err = registry.new_broadcaster("not a uri").await;
        assert!(matches!(err, Err(Error::Url(_))));
    }

    #[tokio::test]
    async fn builds_and_broadcasts_null() {
        let registry = BroadcasterRegistry::with_builtins();
        let br = registry.new_broadcaster("null://").await.unwrap();
        let id = br.broadcast_message(&Message::new("hi", "")).await.unwrap();
        assert!(id.to_string().starts_with("null-"));
    }

    #[tokio::test]
    async fn multi_requires_at_least_one_uri() {
        let registry = BroadcasterRegistry::with_builtins();
        let err = registry.new_multi_broadcaster(&[]).await;
        assert!(matches!(err, Err(Error::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn multi_wraps_several_uris() {
        let registry = BroadcasterRegistry::with_builtins();
        let br = registry
            .new_multi_broadcaster(&["null://".into(), "log://".into()])
            .await
            .unwrap();
        let id = br.broadcast_message(&Message::new("hi", "")).await.unwrap();
        match id {
            broadcaster_common::DeliveryId::Multi(ids) => assert_eq!(ids.len(), 2),
            other => panic!("expected multi id, got {other:?}"),
        }
    }
}
