//! Block Kit display blocks.

use serde::{Serialize, Serializer};

/// Text formatting understood by Slack text objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    #[default]
    Mrkdwn,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub format: TextFormat,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    pub url: String,
    pub alt_text: String,
}

/// One unit of message layout. Serializes to a Slack `section` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayBlock {
    Text(TextBlock),
    Image(ImageBlock),
}

impl DisplayBlock {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Text(TextBlock {
            format: TextFormat::Mrkdwn,
            text: text.into(),
        })
    }

    pub fn image(url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self::Image(ImageBlock {
            url: url.into(),
            alt_text: alt_text.into(),
        })
    }
}

// ── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Section<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextObject<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accessory: Option<ImageElement<'a>>,
}

#[derive(Serialize)]
struct TextObject<'a> {
    #[serde(rename = "type")]
    kind: TextFormat,
    text: &'a str,
}

#[derive(Serialize)]
struct ImageElement<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    image_url: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    alt_text: &'a str,
}

impl Serialize for DisplayBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let section = match self {
            Self::Text(block) => Section {
                kind: "section",
                text: Some(TextObject {
                    kind: block.format,
                    text: &block.text,
                }),
                accessory: None,
            },
            Self::Image(block) => Section {
                kind: "section",
                text: None,
                accessory: Some(ImageElement {
                    kind: "image",
                    image_url: &block.url,
                    alt_text: &block.alt_text,
                }),
            },
        };
        section.serialize(serializer)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_block_wire_shape() {
        let json = serde_json::to_string(&DisplayBlock::mrkdwn("Testing")).unwrap();
        assert_eq!(
            json,
            r#"{"type":"section","text":{"type":"mrkdwn","text":"Testing"}}"#
        );
    }

    #[test]
    fn plain_text_format_name() {
        let block = DisplayBlock::Text(TextBlock {
            format: TextFormat::PlainText,
            text: "x".into(),
        });
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains(r#""type":"plain_text""#));
    }

    #[test]
    fn image_block_wire_shape() {
        let json = serde_json::to_string(&DisplayBlock::image(
            "https://files.slack.com/files-pri/testing.jpg",
            "alt text",
        ))
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"section","accessory":{"type":"image","image_url":"https://files.slack.com/files-pri/testing.jpg","alt_text":"alt text"}}"#
        );
    }

    #[test]
    fn empty_alt_text_is_omitted() {
        let json = serde_json::to_string(&DisplayBlock::image("https://x/y.png", "")).unwrap();
        assert!(!json.contains("alt_text"));
        assert!(!json.contains("null"));
    }
}
