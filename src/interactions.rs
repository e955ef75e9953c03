//! Likes, comments and the liked list, all kept in the per-client store.

use crate::{
    domain::LocalStore,
    errors::AppError,
    models::{Comment, LikeState, LikedMeme, MemeTemplate},
};
use chrono::Utc;
use uuid::Uuid;

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

pub fn likes_key(meme_id: &str) -> String {
    format!("meme-{}-likes", meme_id)
}

pub fn comments_key(meme_id: &str) -> String {
    format!("meme-{}-comments", meme_id)
}

pub fn liked_list_key(user_id: &str) -> String {
    format!("likedMemes_{}", user_id)
}

pub fn like_state(store: &dyn LocalStore, client_id: &str, meme_id: &str) -> Result<LikeState, AppError> {
    Ok(store.read(client_id, &likes_key(meme_id))?.unwrap_or_default())
}

pub fn comments(store: &dyn LocalStore, client_id: &str, meme_id: &str) -> Result<Vec<Comment>, AppError> {
    Ok(store.read(client_id, &comments_key(meme_id))?.unwrap_or_default())
}

pub fn liked_memes(store: &dyn LocalStore, client_id: &str, user_id: &str) -> Result<Vec<LikedMeme>, AppError> {
    Ok(store.read(client_id, &liked_list_key(user_id))?.unwrap_or_default())
}

/// Flips the like flag and moves the counter by one in the matching direction.
///
/// When `user_id` is given, the meme is also added to or removed from that
/// user's liked list.
pub fn toggle_like(
    store: &dyn LocalStore,
    client_id: &str,
    meme: &MemeTemplate,
    user_id: Option<&str>,
) -> Result<LikeState, AppError> {
    let current = like_state(store, client_id, &meme.id)?;
    let next = LikeState {
        count: if current.is_liked { current.count - 1 } else { current.count + 1 },
        is_liked: !current.is_liked,
    };
    store.write(client_id, &likes_key(&meme.id), &next)?;

    if let Some(user_id) = user_id {
        let mut liked = liked_memes(store, client_id, user_id)?;
        liked.retain(|m| m.id != meme.id);
        if next.is_liked {
            liked.insert(
                0,
                LikedMeme {
                    id: meme.id.clone(),
                    name: meme.name.clone(),
                    url: meme.url.clone(),
                    liked_at: Utc::now(),
                },
            );
        }
        store.write(client_id, &liked_list_key(user_id), &liked)?;
    }

    tracing::debug!(meme_id = %meme.id, count = next.count, is_liked = next.is_liked, "Like toggled");
    Ok(next)
}

/// Prepends a new anonymous comment. Blank text is rejected and nothing is stored.
pub fn add_comment(store: &dyn LocalStore, client_id: &str, meme_id: &str, text: &str) -> Result<Comment, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Comment text cannot be empty".to_string()));
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        text: text.to_string(),
        author: ANONYMOUS_AUTHOR.to_string(),
        created_at: Utc::now(),
    };
    let mut all = comments(store, client_id, meme_id)?;
    all.insert(0, comment.clone());
    store.write(client_id, &comments_key(meme_id), &all)?;

    tracing::debug!(%meme_id, comment_id = %comment.id, total = all.len(), "Comment added");
    Ok(comment)
}
