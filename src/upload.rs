use crate::{
    domain::{Captioner, ImageHost, ImageUpload, UserMemeRepository},
    errors::AppError,
    models::{NewUserMeme, UserMeme},
};
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_CAPTION: &str = "No caption provided";
const NOTHING_SELECTED: &str = "Please select a template or upload an image";

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    #[default]
    Template,
    Custom,
}

/// Everything the upload form can carry. Only the fields of `mode` are used.
#[derive(Debug, Clone, Default)]
pub struct UploadSubmission {
    pub mode: UploadMode,
    pub template_id: Option<String>,
    pub top_text: String,
    pub bottom_text: String,
    pub image: Option<ImageUpload>,
    pub caption: Option<String>,
}

/// Produces a hosted image (captioned template or custom upload) and records it.
#[derive(Clone)]
pub struct UploadPipeline {
    captioner: Arc<dyn Captioner>,
    image_host: Arc<dyn ImageHost>,
    repo: Arc<dyn UserMemeRepository>,
}

impl UploadPipeline {
    pub fn new(
        captioner: Arc<dyn Captioner>,
        image_host: Arc<dyn ImageHost>,
        repo: Arc<dyn UserMemeRepository>,
    ) -> Self {
        Self {
            captioner,
            image_host,
            repo,
        }
    }

    /// Runs the submission. Validation and sign-in failures are returned as-is;
    /// anything else is logged and reported as [`AppError::UploadFailed`].
    pub async fn submit(&self, owner: Option<&str>, submission: UploadSubmission) -> Result<UserMeme, AppError> {
        match self.try_submit(owner, submission).await {
            Ok(meme) => Ok(meme),
            Err(e) if e.is_client_error() => Err(e),
            Err(e) => {
                tracing::error!(error = %e, detail = ?e, "Meme submission failed");
                Err(AppError::UploadFailed)
            }
        }
    }

    async fn try_submit(&self, owner: Option<&str>, submission: UploadSubmission) -> Result<UserMeme, AppError> {
        let owner = owner.ok_or(AppError::SignInRequired)?;

        let template_id = submission
            .template_id
            .filter(|id| !id.trim().is_empty());
        let image = submission.image.filter(|image| !image.data.is_empty());

        let image_url = match (submission.mode, template_id, image) {
            (UploadMode::Template, Some(template_id), _) => {
                tracing::debug!(%template_id, "Generating meme from template");
                self.captioner
                    .caption(&template_id, &submission.top_text, &submission.bottom_text)
                    .await?
            }
            (UploadMode::Custom, _, Some(image)) => {
                tracing::debug!(bytes = image.data.len(), "Hosting custom image");
                self.image_host.upload(image).await?
            }
            _ => return Err(AppError::Validation(NOTHING_SELECTED.to_string())),
        };

        let caption = submission
            .caption
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CAPTION.to_string());

        let meme = self
            .repo
            .create(NewUserMeme {
                user_id: owner.to_string(),
                image_url,
                caption,
            })
            .await?;

        tracing::info!(meme_id = %meme.id, user_id = %meme.user_id, "Meme created successfully");
        Ok(meme)
    }
}
