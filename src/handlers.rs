use crate::{
    domain::ImageUpload,
    errors::AppError,
    extractors::ClientContext,
    interactions,
    listing::{self, ListingQuery},
    local_store::run_blocking,
    models::{Category, Comment, LikeState, MemeTemplate, SortKey, Theme},
    profile::ProfileUpdate,
    upload::{UploadMode, UploadSubmission},
    AppState,
};
use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize, Debug, Default)]
pub struct ExploreParams {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub sort: Option<SortKey>,
    pub page: Option<usize>,
}

#[derive(Serialize, Debug)]
pub struct MemeDetail {
    pub meme: MemeTemplate,
    pub likes: LikeState,
    pub comments: Vec<Comment>,
}

#[derive(Deserialize, Debug)]
pub struct NewComment {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ThemeBody {
    pub theme: Option<Theme>,
}

async fn find_template(state: &AppState, id: &str) -> Result<MemeTemplate, AppError> {
    let templates = state.meme_source.fetch_templates().await?;
    templates.into_iter().find(|t| t.id == id).ok_or_else(|| {
        tracing::warn!(meme_id = %id, "Meme not found");
        AppError::MemeNotFound(id.to_string())
    })
}

pub async fn home(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let templates = state.meme_source.fetch_templates().await?;
    Ok(Json(listing::home_feed(templates)))
}

pub async fn explore(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ExploreParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let query = ListingQuery::default()
        .with_search(params.search.unwrap_or_default())
        .with_category(params.category.unwrap_or_default())
        .with_sort(params.sort.unwrap_or_default())
        .with_page(params.page.unwrap_or(1));

    let templates = state.meme_source.fetch_templates().await?;
    let now = Utc::now();
    let mut rng = rand::thread_rng();
    let memes = listing::decorate(templates, now, &mut rng);
    let page = listing::list_page(&memes, &query, now, &mut rng);
    Ok(Json(page))
}

pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let templates = state.meme_source.fetch_templates().await?;
    let board = listing::leaderboard(templates, &mut rand::thread_rng());
    Ok(Json(board))
}

pub async fn meme_detail(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let meme = find_template(&state, &id).await?;
    let meme_id = meme.id.clone();
    let (likes, comments) = run_blocking(&state.local_store, move |store| {
        Ok((
            interactions::like_state(store, &ctx.client_id, &meme_id)?,
            interactions::comments(store, &ctx.client_id, &meme_id)?,
        ))
    })
    .await?;
    Ok(Json(MemeDetail { meme, likes, comments }))
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let meme = find_template(&state, &id).await?;
    let like = run_blocking(&state.local_store, move |store| {
        interactions::toggle_like(store, &ctx.client_id, &meme, ctx.user_id.as_deref())
    })
    .await?;
    Ok(Json(like))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let meme = find_template(&state, &id).await?;
    let comments = run_blocking(&state.local_store, move |store| {
        interactions::comments(store, &ctx.client_id, &meme.id)
    })
    .await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    Path(id): Path<String>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let meme = find_template(&state, &id).await?;
    let Json(body) = body?;
    let comment = run_blocking(&state.local_store, move |store| {
        interactions::add_comment(store, &ctx.client_id, &meme.id, &body.text)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn upload_meme(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut submission = UploadSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let read_text = |e: MultipartError| AppError::InvalidInput(format!("Failed to read {}: {}", field_name, e));
        match field_name.as_str() {
            "mode" => {
                let raw = field.text().await.map_err(read_text)?;
                submission.mode = match raw.trim().to_lowercase().as_str() {
                    "template" => UploadMode::Template,
                    "custom" => UploadMode::Custom,
                    other => return Err(AppError::InvalidInput(format!("Unknown upload mode: {}", other))),
                };
            }
            "template_id" => submission.template_id = Some(field.text().await.map_err(read_text)?),
            "top_text" => submission.top_text = field.text().await.map_err(read_text)?,
            "bottom_text" => submission.bottom_text = field.text().await.map_err(read_text)?,
            "caption" => submission.caption = Some(field.text().await.map_err(read_text)?),
            "image" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|m| m.to_string());
                submission.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data: field.bytes().await?.to_vec(),
                });
            }
            _ => tracing::debug!("Ignoring unknown multipart field: {}", field_name),
        }
    }

    let meme = state.upload.submit(ctx.user_id.as_deref(), submission).await?;
    Ok((StatusCode::CREATED, Json(meme)))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
) -> Result<impl IntoResponse, AppError> {
    let user_id = ctx.user_id.as_deref().ok_or(AppError::SignInRequired)?;
    Ok(Json(state.profiles.load(&ctx.client_id, user_id).await?))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    update: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = ctx.user_id.as_deref().ok_or(AppError::SignInRequired)?;
    let Json(update) = update?;
    state.profiles.update(&ctx.client_id, user_id, update).await?;
    Ok(Json(state.profiles.load(&ctx.client_id, user_id).await?))
}

pub async fn get_theme(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(ThemeBody {
        theme: state.profiles.theme(&ctx.client_id).await?,
    }))
}

pub async fn set_theme(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    body: Result<Json<ThemeBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let theme = body
        .theme
        .ok_or_else(|| AppError::InvalidInput("theme must be 'dark' or 'light'".to_string()))?;
    state.profiles.set_theme(&ctx.client_id, theme).await?;
    Ok(Json(ThemeBody { theme: Some(theme) }))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
