use crate::{
    domain::{LocalStore, UserMemeRepository},
    errors::AppError,
    interactions,
    local_store::run_blocking,
    models::{LikedMeme, ProfileDetails, Theme, UserMeme},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const THEME_KEY: &str = "theme";

fn bio_key(user_id: &str) -> String {
    format!("bio_{}", user_id)
}

fn details_key(user_id: &str) -> String {
    format!("profile_{}", user_id)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub user_id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub bio: String,
    pub uploaded: Vec<UserMeme>,
    pub liked: Vec<LikedMeme>,
}

/// Fields a user may edit; absent fields are left unchanged.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
}

/// Combines server-side uploads with the client's own liked list and profile fields.
#[derive(Clone)]
pub struct ProfileAggregator {
    repo: Arc<dyn UserMemeRepository>,
    store: Arc<dyn LocalStore>,
}

impl ProfileAggregator {
    pub fn new(repo: Arc<dyn UserMemeRepository>, store: Arc<dyn LocalStore>) -> Self {
        Self { repo, store }
    }

    /// Uploaded and liked memes are returned side by side; a meme can appear in both.
    pub async fn load(&self, client_id: &str, user_id: &str) -> Result<ProfileView, AppError> {
        let uploaded = self.repo.list_by_owner(user_id).await?;
        let (client, user) = (client_id.to_string(), user_id.to_string());
        let (liked, details, bio) = run_blocking(&self.store, move |store| {
            let liked = interactions::liked_memes(store, &client, &user)?;
            let details: ProfileDetails = store.read(&client, &details_key(&user))?.unwrap_or_default();
            let bio: String = store.read(&client, &bio_key(&user))?.unwrap_or_default();
            Ok((liked, details, bio))
        })
        .await?;

        tracing::debug!(%user_id, uploaded = uploaded.len(), liked = liked.len(), "Profile loaded");
        Ok(ProfileView {
            user_id: user_id.to_string(),
            display_name: details.display_name,
            photo_url: details.photo_url,
            bio,
            uploaded,
            liked,
        })
    }

    pub async fn update(&self, client_id: &str, user_id: &str, update: ProfileUpdate) -> Result<(), AppError> {
        let client = client_id.to_string();
        let key = details_key(user_id);
        let bio_entry = bio_key(user_id);
        run_blocking(&self.store, move |store| {
            let mut details: ProfileDetails = store.read(&client, &key)?.unwrap_or_default();
            if let Some(name) = update.display_name {
                details.display_name = Some(name);
            }
            if let Some(photo) = update.photo_url {
                details.photo_url = Some(photo);
            }
            store.write(&client, &key, &details)?;

            if let Some(bio) = update.bio {
                store.write(&client, &bio_entry, &bio)?;
            }
            Ok(())
        })
        .await?;
        tracing::info!(%user_id, "Profile updated");
        Ok(())
    }

    /// `None` when the client never chose a theme.
    pub async fn theme(&self, client_id: &str) -> Result<Option<Theme>, AppError> {
        let client = client_id.to_string();
        run_blocking(&self.store, move |store| Ok(store.read::<Theme>(&client, THEME_KEY)?)).await
    }

    pub async fn set_theme(&self, client_id: &str, theme: Theme) -> Result<(), AppError> {
        let client = client_id.to_string();
        run_blocking(&self.store, move |store| Ok(store.write(&client, THEME_KEY, &theme)?)).await
    }
}
