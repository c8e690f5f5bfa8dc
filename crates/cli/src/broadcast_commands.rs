use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    broadcaster_channels::BroadcasterRegistry,
    broadcaster_common::{DeliveryId, Message},
    broadcaster_slack::SlackBroadcasterFactory,
    clap::Args,
    image::{DynamicImage, ImageReader},
    tracing::info,
};

#[derive(Args)]
pub struct SendArgs {
    /// Broadcaster URI, e.g. `slack://C123?credentials=env://SLACK_TOKEN`.
    /// Repeat to deliver to several targets.
    #[arg(long = "broadcaster", required = true)]
    pub broadcasters: Vec<String>,

    /// Message title.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Message body.
    #[arg(long, default_value = "")]
    pub body: String,

    /// Image file to attach. Repeat for several, in display order.
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
}

/// Registry with every broadcaster this binary ships.
pub fn registry() -> BroadcasterRegistry {
    let mut registry = BroadcasterRegistry::with_builtins();
    registry.register(Box::new(SlackBroadcasterFactory::default()));
    registry
}

pub async fn handle_send(
    registry: &BroadcasterRegistry,
    args: SendArgs,
) -> anyhow::Result<DeliveryId> {
    let mut message = Message::new(args.title, args.body);
    for path in &args.images {
        message = message.with_image(load_image(path)?);
    }

    let broadcaster = registry
        .new_multi_broadcaster(&args.broadcasters)
        .await
        .context("failed to build broadcaster")?;

    let id = broadcaster
        .broadcast_message(&message)
        .await
        .context("failed to deliver message")?;
    info!(id = %id, targets = args.broadcasters.len(), "message delivered");
    Ok(id)
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    ImageReader::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to read image {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode image {}", path.display()))
}
