use crate::errors::{ApiError, LocalStoreError, RepoError, StorageError};
use crate::models::{MemeTemplate, NewUserMeme, UserMeme};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Source of the meme template catalogue.
#[async_trait]
pub trait MemeSource: Send + Sync + 'static {
    /// Fetches the full template list. Not cached; every call hits the upstream API.
    async fn fetch_templates(&self) -> Result<Vec<MemeTemplate>, ApiError>;
}

/// Composites two lines of text onto a template and returns the hosted image URL.
#[async_trait]
pub trait Captioner: Send + Sync + 'static {
    async fn caption(&self, template_id: &str, top_text: &str, bottom_text: &str) -> Result<String, ApiError>;
}

/// A raw image submitted for hosting.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Hosts raw image bytes and returns a public URL.
#[async_trait]
pub trait ImageHost: Send + Sync + 'static {
    async fn upload(&self, image: ImageUpload) -> Result<String, StorageError>;
}

/// Operations for storing and querying user-created meme metadata.
#[async_trait]
pub trait UserMemeRepository: Send + Sync + 'static {
    /// Stores a new record; the repository assigns the id and creation time.
    async fn create(&self, meme: NewUserMeme) -> Result<UserMeme, RepoError>;

    /// Lists every record owned by `user_id`.
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<UserMeme>, RepoError>;
}

/// String-keyed, JSON-valued storage namespaced per client (one namespace per browser).
pub trait LocalStore: Send + Sync + 'static {
    fn get(&self, client_id: &str, key: &str) -> Result<Option<Value>, LocalStoreError>;
    fn set(&self, client_id: &str, key: &str, value: Value) -> Result<(), LocalStoreError>;
}

impl<'a> dyn LocalStore + 'a {
    /// Reads and decodes a value, `None` when the key was never written.
    pub fn read<T: DeserializeOwned>(&self, client_id: &str, key: &str) -> Result<Option<T>, LocalStoreError> {
        match self.get(client_id, key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn write<T: Serialize>(&self, client_id: &str, key: &str, value: &T) -> Result<(), LocalStoreError> {
        self.set(client_id, key, serde_json::to_value(value)?)
    }
}
