//! In-process fakes for the external collaborators.

use crate::{
    domain::{Captioner, ImageHost, ImageUpload, MemeSource, UserMemeRepository},
    errors::{ApiError, RepoError, StorageError},
    models::{MemeTemplate, NewUserMeme, UserMeme},
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};
use uuid::Uuid;

pub fn template(id: &str, name: &str) -> MemeTemplate {
    MemeTemplate {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("https://i.imgflip.com/{}.jpg", id),
        width: 600,
        height: 400,
    }
}

pub struct FakeMemeSource {
    templates: Option<Vec<MemeTemplate>>,
}

impl FakeMemeSource {
    pub fn with(templates: Vec<MemeTemplate>) -> Self {
        Self {
            templates: Some(templates),
        }
    }

    pub fn failing() -> Self {
        Self { templates: None }
    }
}

#[async_trait]
impl MemeSource for FakeMemeSource {
    async fn fetch_templates(&self) -> Result<Vec<MemeTemplate>, ApiError> {
        self.templates.clone().ok_or(ApiError::Unsuccessful {
            service: "Imgflip",
            message: "Imgflip API response unsuccessful".to_string(),
        })
    }
}

pub struct FakeCaptioner {
    url: Option<String>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl FakeCaptioner {
    pub fn ok(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn missing_credentials() -> Self {
        Self {
            url: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Captioner for FakeCaptioner {
    async fn caption(&self, template_id: &str, top_text: &str, bottom_text: &str) -> Result<String, ApiError> {
        let url = self.url.clone().ok_or(ApiError::MissingCredentials("Imgflip"))?;
        self.calls.lock().unwrap().push((
            template_id.to_string(),
            top_text.to_string(),
            bottom_text.to_string(),
        ));
        Ok(url)
    }
}

pub struct FakeImageHost {
    url: Option<String>,
    calls: AtomicUsize,
}

impl FakeImageHost {
    pub fn ok(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, _image: ImageUpload) -> Result<String, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.url
            .clone()
            .ok_or_else(|| StorageError::UploadFailed("ImgBB upload failed".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryRepository {
    memes: Mutex<Vec<UserMeme>>,
    fail: bool,
}

impl InMemoryRepository {
    pub fn failing() -> Self {
        Self {
            memes: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn all(&self) -> Vec<UserMeme> {
        self.memes.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserMemeRepository for InMemoryRepository {
    async fn create(&self, meme: NewUserMeme) -> Result<UserMeme, RepoError> {
        if self.fail {
            return Err(RepoError::BackendError(anyhow::anyhow!("table unavailable")));
        }
        let meme = UserMeme {
            id: Uuid::new_v4(),
            user_id: meme.user_id,
            image_url: meme.image_url,
            caption: meme.caption,
            created_at: Utc::now(),
        };
        self.memes.lock().unwrap().push(meme.clone());
        Ok(meme)
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<UserMeme>, RepoError> {
        if self.fail {
            return Err(RepoError::BackendError(anyhow::anyhow!("table unavailable")));
        }
        Ok(self
            .memes
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }
}
