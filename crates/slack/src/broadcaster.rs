use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    broadcaster_channels::{Broadcaster, BroadcasterFactory, with_logger},
    broadcaster_common::{DeliveryId, IdGenerator, Message, RuntimeVarResolver, SecretResolver},
    reqwest::{
        Body, Method,
        header::{CONTENT_TYPE, HeaderMap, HeaderValue},
    },
    secrecy::Secret,
    tracing::{Dispatch, debug, info},
    url::Url,
};

use crate::{
    Error, Result,
    api::{CHAT_METHOD, SlackApi},
    compose::Composer,
    config::SlackConfig,
    envelope::ResponseInterpreter,
    fanout::FanOut,
    upload::{AssetUploader, PngEncoder, SlackImageUploader, Uploader},
};

/// Upper bound on credential resolution at construction time.
pub const CREDENTIALS_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers messages to one Slack channel.
pub struct SlackBroadcaster {
    api: SlackApi,
    composer: Composer,
    fanout: FanOut,
    interpreter: ResponseInterpreter,
    logger: Option<Dispatch>,
}

impl SlackBroadcaster {
    /// Build a broadcaster for `config` with an already resolved `token`.
    pub fn new(config: &SlackConfig, token: Secret<String>) -> Result<Self> {
        let http = SlackApi::client_with_timeout(config.timeout)?;
        let api = SlackApi::new(http, token, config.api_base.clone());
        let uploader = SlackImageUploader::new(Uploader::new(api.clone()), Arc::new(PngEncoder));
        Ok(Self::with_parts(
            config,
            api,
            Arc::new(uploader),
            config.ids.generator(),
        ))
    }

    /// Assemble from explicit collaborators.
    pub fn with_parts(
        config: &SlackConfig,
        api: SlackApi,
        uploader: Arc<dyn AssetUploader>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let mut fanout = FanOut::new(uploader);
        if let Some(max) = config.max_uploads {
            fanout = fanout.with_max_concurrency(max);
        }
        Self {
            api,
            composer: Composer::new(config.channel.clone(), config.alt_text.clone()),
            fanout,
            interpreter: ResponseInterpreter::new(ids),
            logger: None,
        }
    }

    /// Upload any images, post the composed chat message and interpret the
    /// response.
    pub async fn deliver(&self, message: &Message) -> Result<DeliveryId> {
        with_logger(self.logger.as_ref(), self.deliver_inner(message)).await
    }

    async fn deliver_inner(&self, message: &Message) -> Result<DeliveryId> {
        let assets = if message.has_images() {
            self.fanout.run(&message.images).await?
        } else {
            Vec::new()
        };
        debug!(assets = assets.len(), "images uploaded");

        let post = self.composer.compose(message, &assets);
        let body = post.encode()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let response = self
            .api
            .call(Method::POST, CHAT_METHOD, headers, Body::from(body))
            .await?;

        let id = self.interpreter.interpret(response)?;
        info!(channel = %post.channel, images = assets.len(), id = %id, "message posted to slack");
        Ok(id)
    }
}

#[async_trait]
impl Broadcaster for SlackBroadcaster {
    async fn broadcast_message(&self, message: &Message) -> broadcaster_channels::Result<DeliveryId> {
        Ok(self.deliver(message).await?)
    }

    fn set_logger(&mut self, logger: Dispatch) {
        self.logger = Some(logger);
    }
}

/// Builds [`SlackBroadcaster`]s from `slack://` URIs.
pub struct SlackBroadcasterFactory {
    resolver: Arc<dyn SecretResolver>,
}

impl Default for SlackBroadcasterFactory {
    fn default() -> Self {
        Self::new(Arc::new(RuntimeVarResolver))
    }
}

impl SlackBroadcasterFactory {
    pub fn new(resolver: Arc<dyn SecretResolver>) -> Self {
        Self { resolver }
    }

    /// Parse `uri`, resolve its credentials and build the broadcaster.
    pub async fn build(&self, uri: &Url) -> Result<SlackBroadcaster> {
        let config = SlackConfig::from_uri(uri)?;
        let token = tokio::time::timeout(
            CREDENTIALS_TIMEOUT,
            self.resolver.resolve(&config.credentials),
        )
        .await
        .map_err(|_| Error::credentials("timed out resolving credentials"))?
        .map_err(|e| Error::credentials(e.to_string()))?;

        debug!(channel = %config.channel, api_base = %config.api_base, "slack broadcaster configured");
        SlackBroadcaster::new(&config, token)
    }
}

#[async_trait]
impl BroadcasterFactory for SlackBroadcasterFactory {
    fn scheme(&self) -> &str {
        "slack"
    }

    async fn create(&self, uri: &Url) -> broadcaster_channels::Result<Box<dyn Broadcaster>> {
        Ok(Box::new(self.build(uri).await?))
    }
}
