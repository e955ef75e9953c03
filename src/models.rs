use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reusable base image exposed by the template API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemeTemplate {
    pub id: String,
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A template with ephemeral engagement numbers, regenerated per request.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DisplayMeme {
    #[serde(flatten)]
    pub template: MemeTemplate,
    pub likes: u32,
    pub comments: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// A meme created by a user, persisted in the document database.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserMeme {
    pub id: Uuid,
    pub user_id: String,
    pub image_url: String,
    pub caption: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the upload pipeline; id and timestamp are assigned on write.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserMeme {
    pub user_id: String,
    pub image_url: String,
    pub caption: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeState {
    pub count: i64,
    pub is_liked: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LikedMeme {
    pub id: String,
    pub name: String,
    pub url: String,
    pub liked_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProfileDetails {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Trending,
    New,
    Classic,
    Random,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Likes,
    Date,
    Comments,
}
