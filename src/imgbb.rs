use crate::{
    domain::{ImageHost, ImageUpload},
    errors::StorageError,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct UploadResponse {
    success: bool,
    data: Option<UploadedImage>,
}

#[derive(Deserialize, Debug)]
struct UploadedImage {
    url: String,
}

/// Image host backed by the ImgBB upload API.
#[derive(Debug, Clone)]
pub struct ImgbbHost {
    client: reqwest::Client,
    upload_url: String,
    api_key: Option<String>,
}

impl ImgbbHost {
    pub fn new(client: reqwest::Client, upload_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbHost {
    async fn upload(&self, image: ImageUpload) -> Result<String, StorageError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(StorageError::MissingCredentials("ImgBB API key is missing"))?;

        let file_name = image.file_name.unwrap_or_else(|| "upload".to_string());
        let content_type = image
            .content_type
            .or_else(|| mime_guess::from_path(&file_name).first_raw().map(|s| s.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        tracing::debug!(%file_name, %content_type, bytes = image.data.len(), "ImgBB: uploading image");

        let part = Part::bytes(image.data)
            .file_name(file_name)
            .mime_str(&content_type)
            .context("ImgBB: invalid content type")?;
        let form = Form::new().part("image", part);

        let response: UploadResponse = self
            .client
            .post(&self.upload_url)
            .query(&[("key", api_key)])
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("ImgBB: upload request failed")?
            .json()
            .await
            .context("ImgBB: could not decode upload response")?;

        match response {
            UploadResponse {
                success: true,
                data: Some(image),
            } => {
                tracing::info!(image_url = %image.url, "ImgBB: upload successful");
                Ok(image.url)
            }
            _ => Err(StorageError::UploadFailed("ImgBB upload failed".to_string())),
        }
    }
}
