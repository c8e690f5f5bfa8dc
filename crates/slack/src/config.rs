use std::time::Duration;

use {broadcaster_common::IdStyle, url::Url};

use crate::{Error, Result, api::DEFAULT_API_BASE};

/// Placeholder alt text for image blocks.
pub const DEFAULT_ALT_TEXT: &str = "alt text";

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for one Slack broadcaster, parsed from a URI of the form
/// `slack://<channel>?credentials=<secret-uri>`.
///
/// Optional query parameters:
/// - `api_base`: API root (default `https://slack.com/api`)
/// - `alt_text`: alt text for image blocks
/// - `timeout`: HTTP request timeout in seconds
/// - `max_uploads`: cap on concurrent image uploads (unbounded when absent)
/// - `ids`: delivery id style, `random` (default) or `timestamp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub channel: String,
    /// Secret reference, resolved by a `SecretResolver`. Never the token itself.
    pub credentials: String,
    pub api_base: String,
    pub alt_text: String,
    pub timeout: Duration,
    pub max_uploads: Option<usize>,
    pub ids: IdStyle,
}

impl SlackConfig {
    pub fn from_uri(uri: &Url) -> Result<Self> {
        let param = |name: &str| {
            uri.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };

        let credentials =
            param("credentials").ok_or_else(|| Error::config("missing ?credentials= parameter"))?;

        let channel = uri
            .host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .or_else(|| param("channel"))
            .ok_or_else(|| Error::config("missing channel"))?;

        let timeout = match param("timeout") {
            Some(secs) => match secs.parse::<u64>() {
                Ok(0) => return Err(Error::config("timeout must be at least one second")),
                Ok(n) => Duration::from_secs(n),
                Err(e) => return Err(Error::config(format!("invalid timeout '{secs}': {e}"))),
            },
            None => DEFAULT_TIMEOUT,
        };

        let max_uploads = match param("max_uploads") {
            Some(n) => match n.parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(Error::config(format!("invalid max_uploads '{n}'")));
                },
                Ok(n) => Some(n),
            },
            None => None,
        };

        let ids = match param("ids") {
            Some(style) => style.parse().map_err(|e| Error::config(format!("{e}")))?,
            None => IdStyle::default(),
        };

        Ok(Self {
            channel,
            credentials,
            api_base: param("api_base").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            alt_text: param("alt_text").unwrap_or_else(|| DEFAULT_ALT_TEXT.to_string()),
            timeout,
            max_uploads,
            ids,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str) -> Result<SlackConfig> {
        SlackConfig::from_uri(&Url::parse(uri).unwrap())
    }

    #[test]
    fn minimal_uri_uses_defaults() {
        let cfg = parse("slack://C0123ABC?credentials=env://SLACK_TOKEN").unwrap();
        assert_eq!(cfg.channel, "C0123ABC");
        assert_eq!(cfg.credentials, "env://SLACK_TOKEN");
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.alt_text, DEFAULT_ALT_TEXT);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
        assert_eq!(cfg.max_uploads, None);
        assert_eq!(cfg.ids, IdStyle::Random);
    }

    #[test]
    fn missing_credentials_fails_fast() {
        let err = parse("slack://C0123ABC").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("credentials"));

        assert!(parse("slack://C0123ABC?credentials=").is_err());
    }

    #[test]
    fn missing_channel_fails() {
        let err = parse("slack://?credentials=constant://?val=x").unwrap_err();
        assert!(err.to_string().contains("channel"));
    }

    #[test]
    fn channel_query_parameter_is_a_fallback() {
        let cfg = parse("slack://?channel=general&credentials=env://T").unwrap();
        assert_eq!(cfg.channel, "general");
    }

    #[test]
    fn optional_parameters_are_honoured() {
        let cfg = parse(
            "slack://C1?credentials=env://T&api_base=http://127.0.0.1:9/api&alt_text=photo&timeout=5&max_uploads=2",
        )
        .unwrap();
        assert_eq!(cfg.api_base, "http://127.0.0.1:9/api");
        assert_eq!(cfg.alt_text, "photo");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.max_uploads, Some(2));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(parse("slack://C1?credentials=env://T&timeout=soon").is_err());
        assert!(parse("slack://C1?credentials=env://T&max_uploads=0").is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = parse("slack://C1?credentials=env://T&timeout=0").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn id_style_is_selectable() {
        let cfg = parse("slack://C1?credentials=env://T&ids=timestamp").unwrap();
        assert_eq!(cfg.ids, IdStyle::Timestamp);

        let err = parse("slack://C1?credentials=env://T&ids=sequential").unwrap_err();
        assert!(err.to_string().contains("sequential"));
    }
}
