//! Credential lookup by URI.
//!
//! Broadcaster URIs never embed tokens directly; they carry a
//! `credentials=<uri>` reference that a [`SecretResolver`] turns into the
//! secret value.

use {async_trait::async_trait, secrecy::Secret, tracing::debug, url::Url};

use crate::error::{Context, Error, Result};

/// Resolves a secret reference such as `env://SLACK_TOKEN` into its value.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, uri: &str) -> Result<Secret<String>>;
}

/// Resolver for the common runtime-variable schemes:
///
/// - `constant://?val=<value>`: the value inline (tests and local use)
/// - `env://<NAME>`: an environment variable
/// - `file:///<path>`: file contents with surrounding whitespace trimmed
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeVarResolver;

#[async_trait]
impl SecretResolver for RuntimeVarResolver {
    async fn resolve(&self, uri: &str) -> Result<Secret<String>> {
        let parsed = Url::parse(uri)?;
        debug!(scheme = parsed.scheme(), "resolving secret");

        let value = match parsed.scheme() {
            "constant" => parsed
                .query_pairs()
                .find(|(k, _)| k == "val")
                .map(|(_, v)| v.into_owned())
                .context("constant secret is missing ?val= parameter")?,
            "env" => {
                // Read the name from the raw string so its case survives.
                let name = uri
                    .strip_prefix("env://")
                    .map(|rest| rest.split(['?', '/']).next().unwrap_or_default())
                    .filter(|name| !name.is_empty())
                    .context("env secret is missing a variable name")?;
                std::env::var(name)
                    .with_context(|| format!("failed to read environment variable {name}"))?
            },
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|()| Error::message(format!("invalid file secret path: {uri}")))?;
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read secret file {}", path.display()))?
                    .trim()
                    .to_string()
            },
            other => {
                return Err(Error::message(format!(
                    "unsupported secret scheme: {other}"
                )));
            },
        };

        if value.is_empty() {
            return Err(Error::message(format!("secret resolved to an empty value: {uri}")));
        }
        Ok(Secret::new(value))
    }
}
