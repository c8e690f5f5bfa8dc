//! Authenticated calls against the Slack Web API.

use std::{fmt, io::Cursor, time::Duration};

use {
    bytes::Bytes,
    reqwest::{Body, Client, Method, RequestBuilder, header::HeaderMap, multipart::Form},
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";
pub const UPLOAD_METHOD: &str = "files.upload";
pub const CHAT_METHOD: &str = "chat.postMessage";

/// Fully buffered response body. Seekable, so callers may re-read it.
pub type ResponseBody = Cursor<Bytes>;

/// Issues one bearer-authenticated HTTP request per call.
///
/// Cheap to clone: the underlying connection pool is shared.
#[derive(Clone)]
pub struct SlackApi {
    http: Client,
    token: Secret<String>,
    api_base: String,
}

impl fmt::Debug for SlackApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackApi")
            .field("token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl SlackApi {
    pub fn new(http: Client, token: Secret<String>, api_base: impl Into<String>) -> Self {
        Self {
            http,
            token,
            api_base: api_base.into(),
        }
    }

    /// Build an HTTP client with `timeout` applied to every request.
    pub fn client_with_timeout(timeout: Duration) -> Result<Client> {
        Ok(Client::builder().timeout(timeout).build()?)
    }

    pub fn endpoint(&self, api_method: &str) -> String {
        format!("{}/{api_method}", self.api_base.trim_end_matches('/'))
    }

    /// Send `body` to `api_method`. Any status outside the 2xx family is a
    /// [`Error::Transport`] and the body is discarded unread.
    pub async fn call(
        &self,
        method: Method,
        api_method: &str,
        headers: HeaderMap,
        body: Body,
    ) -> Result<ResponseBody> {
        let url = self.endpoint(api_method);
        debug!(%method, %url, "calling slack API");
        let request = self.http.request(method, &url).headers(headers).body(body);
        self.send(request, &url).await
    }

    /// POST `form` as `multipart/form-data` to `api_method`. Status handling
    /// is the same as [`call`](Self::call).
    pub async fn call_multipart(&self, api_method: &str, form: Form) -> Result<ResponseBody> {
        let url = self.endpoint(api_method);
        debug!(%url, "uploading to slack API");
        self.send(self.http.post(&url).multipart(form), &url).await
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<ResponseBody> {
        let resp = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport { status });
        }

        let bytes = resp.bytes().await?;
        debug!(%url, len = bytes.len(), "slack API responded");
        Ok(Cursor::new(bytes))
    }
}
