//! Image upload through `files.upload`.
//!
//! The file part of the multipart form is fed by a separate producer task
//! writing into a bounded in-memory pipe while the HTTP request reads from
//! the other end, so an encoded image is never copied into a second
//! full-size buffer.

use std::{collections::BTreeMap, io::Cursor, sync::Arc};

use {
    async_trait::async_trait,
    bytes::Bytes,
    image::{DynamicImage, ImageFormat},
    reqwest::{
        Body,
        multipart::{Form, Part},
    },
    tokio::{
        io::{AsyncRead, AsyncWriteExt},
        sync::oneshot,
    },
    tokio_util::{io::ReaderStream, sync::CancellationToken},
    tracing::{debug, instrument::WithSubscriber},
};

use crate::{
    Error, Result,
    api::{SlackApi, UPLOAD_METHOD},
    envelope::Envelope,
};

/// Capacity of the pipe between the producer and the request body.
pub const PIPE_CAPACITY: usize = 64 * 1024;

/// Where `files.upload` responses carry the uploaded image's URL.
pub const ASSET_PATH: &str = "file.thumb_480";

/// Serializes an in-memory image to a wire format.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>>;
    fn mime_type(&self) -> &str;
    fn file_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(Error::encode)?;
        Ok(buf.into_inner())
    }

    fn mime_type(&self) -> &str {
        "image/png"
    }

    fn file_name(&self) -> &str {
        "upload.png"
    }
}

/// One encoded file ready for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub data: Bytes,
    pub file_name: String,
    pub mime_type: String,
}

/// Streams single files to `files.upload` and returns their asset URL.
#[derive(Debug, Clone)]
pub struct Uploader {
    api: SlackApi,
    asset_path: String,
}

impl Uploader {
    pub fn new(api: SlackApi) -> Self {
        Self {
            api,
            asset_path: ASSET_PATH.to_string(),
        }
    }

    /// Upload `file` followed by one text part per entry in `fields`.
    pub async fn upload(
        &self,
        file: UploadFile,
        fields: &BTreeMap<String, String>,
    ) -> Result<String> {
        let UploadFile {
            data,
            file_name,
            mime_type,
        } = file;
        self.upload_from(Cursor::new(data), &file_name, &mime_type, fields)
            .await
    }

    /// Upload whatever `source` yields as the file part.
    ///
    /// A failed HTTP call is returned as is. A producer error (reading
    /// `source` or feeding the pipe) replaces a response that otherwise
    /// looked successful.
    pub async fn upload_from<R>(
        &self,
        source: R,
        file_name: &str,
        mime_type: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<String>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
        let part = Part::stream(Body::wrap_stream(ReaderStream::new(reader)))
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = fields
            .iter()
            .fold(Form::new().part("file", part), |form, (key, value)| {
                form.text(key.clone(), value.clone())
            });

        let (err_tx, mut err_rx) = oneshot::channel();
        let producer = tokio::spawn(
            async move {
                let (mut source, mut writer) = (source, writer);
                let outcome = match tokio::io::copy(&mut source, &mut writer).await {
                    Ok(copied) => {
                        debug!(bytes = copied, "upload body written");
                        writer
                            .shutdown()
                            .await
                            .map_err(|e| Error::upload("failed to close upload writer", e))
                    },
                    Err(e) => Err(Error::upload("failed to copy file", e)),
                };
                // Report before the pipe closes so the error is buffered by
                // the time the request body ends.
                if let Err(e) = outcome {
                    let _ = err_tx.send(e);
                }
                drop(writer);
            }
            .with_current_subscriber(),
        );

        let result = self.api.call_multipart(UPLOAD_METHOD, form).await;
        producer.abort();

        let body = result?;
        if let Ok(err) = err_rx.try_recv() {
            return Err(err);
        }

        let envelope = Envelope::parse(body)?.into_result()?;
        let asset = envelope.asset_ref(&self.asset_path)?;
        debug!(asset = %asset, "uploaded file");
        Ok(asset)
    }
}

/// Uploads one image of a message and returns its asset reference.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Returns [`Error::Cancelled`] without touching the network when
    /// `cancel` fires before the request would start.
    async fn upload_image(
        &self,
        index: usize,
        image: Arc<DynamicImage>,
        cancel: &CancellationToken,
    ) -> Result<String>;
}

/// Encodes images and uploads them through an [`Uploader`].
pub struct SlackImageUploader {
    uploader: Uploader,
    encoder: Arc<dyn ImageEncoder>,
}

impl SlackImageUploader {
    pub fn new(uploader: Uploader, encoder: Arc<dyn ImageEncoder>) -> Self {
        Self { uploader, encoder }
    }
}

#[async_trait]
impl AssetUploader for SlackImageUploader {
    async fn upload_image(
        &self,
        index: usize,
        image: Arc<DynamicImage>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let encoder = Arc::clone(&self.encoder);
        let data = tokio::task::spawn_blocking(move || encoder.encode(&image)).await??;
        debug!(index, bytes = data.len(), "encoded image");

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let file = UploadFile {
            data: Bytes::from(data),
            file_name: self.encoder.file_name().to_string(),
            mime_type: self.encoder.mime_type().to_string(),
        };
        self.uploader.upload(file, &BTreeMap::new()).await
    }
}
