//! Builds the outbound `chat.postMessage` call for a message.
//!
//! Images are uploaded first; the chat post then carries one text block
//! followed by one image block per uploaded asset. Without images the text
//! goes out as a plain `text` field.

use {broadcaster_common::Message, url::form_urlencoded};

use crate::{Result, blocks::DisplayBlock};

/// Form body of one `chat.postMessage` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPost {
    pub channel: String,
    pub text: Option<String>,
    pub blocks: Option<Vec<DisplayBlock>>,
}

impl ChatPost {
    /// `application/x-www-form-urlencoded` body. `blocks` is sent as a JSON
    /// array in a single field.
    pub fn encode(&self) -> Result<String> {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("channel", &self.channel);
        if let Some(text) = &self.text {
            form.append_pair("text", text);
        }
        if let Some(blocks) = &self.blocks {
            form.append_pair("blocks", &serde_json::to_string(blocks)?);
        }
        Ok(form.finish())
    }
}

#[derive(Debug, Clone)]
pub struct Composer {
    channel: String,
    alt_text: String,
}

impl Composer {
    pub fn new(channel: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            alt_text: alt_text.into(),
        }
    }

    /// Compose the chat post for `message` given its uploaded `assets`, which
    /// must be in the message's image order.
    ///
    /// Blank text is left out entirely rather than sent empty.
    pub fn compose(&self, message: &Message, assets: &[String]) -> ChatPost {
        let text = Some(message.text()).filter(|t| !t.is_empty());

        if assets.is_empty() {
            return ChatPost {
                channel: self.channel.clone(),
                text,
                blocks: None,
            };
        }

        let blocks = text
            .map(DisplayBlock::mrkdwn)
            .into_iter()
            .chain(
                assets
                    .iter()
                    .map(|url| DisplayBlock::image(url.as_str(), self.alt_text.as_str())),
            )
            .collect();

        ChatPost {
            channel: self.channel.clone(),
            text: None,
            blocks: Some(blocks),
        }
    }
}
