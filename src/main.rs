use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aws_clients;
mod config;
mod domain;
mod errors;
mod extractors;
mod handlers;
mod imgbb;
mod imgflip;
mod interactions;
mod listing;
mod local_store;
mod models;
mod profile;
mod repositories;
mod routes;
mod startup;
mod storage;
#[cfg(test)]
mod test_support;
mod upload;

use crate::config::{CaptionService, Config, ImageHostKind};
use crate::domain::{Captioner, ImageHost, LocalStore, MemeSource, UserMemeRepository};
use crate::errors::AppError;
use crate::imgbb::ImgbbHost;
use crate::imgflip::{ImgflipClient, MemegenCaptioner};
use crate::local_store::SqliteLocalStore;
use crate::profile::ProfileAggregator;
use crate::repositories::DynamoDbUserMemeRepository;
use crate::storage::S3ImageHost;
use crate::upload::UploadPipeline;

/// AppState holds shared resources for the web server.
pub struct AppState {
    pub meme_source: Arc<dyn MemeSource>,
    pub local_store: Arc<dyn LocalStore>,
    pub upload: UploadPipeline,
    pub profiles: ProfileAggregator,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "memeverse=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(bind_address = %config.bind_address, caption_service = ?config.caption_service, "Configuration loaded");

    tracing::info!("Initializing AWS clients...");
    let sdk_config = aws_clients::create_sdk_config(&config).await;
    let db_client = aws_clients::create_dynamodb_client(&sdk_config);
    startup::create_dynamodb_table_if_not_exists(&db_client, &config.memes_table_name).await?;

    // Outbound calls carry no timeout; a hung upstream hangs its request.
    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::InitError(format!("Failed to build HTTP client: {}", e)))?;

    let imgflip = ImgflipClient::new(http.clone(), config.imgflip_api_url.clone())
        .with_credentials(config.imgflip_username.clone(), config.imgflip_password.clone());
    if config.imgflip_username.is_none() || config.imgflip_password.is_none() {
        tracing::warn!("Imgflip credentials are not set; template captioning will fail");
    }

    let captioner: Arc<dyn Captioner> = match config.caption_service {
        CaptionService::Imgflip => Arc::new(imgflip.clone()),
        CaptionService::Memegen => Arc::new(MemegenCaptioner::default()),
    };

    let image_host: Arc<dyn ImageHost> = match &config.image_host {
        ImageHostKind::Imgbb => {
            if config.imgbb_api_key.is_none() {
                tracing::warn!("IMGBB_API_KEY is not set; custom uploads will fail");
            }
            Arc::new(ImgbbHost::new(
                http.clone(),
                config.imgbb_api_url.clone(),
                config.imgbb_api_key.clone(),
            ))
        }
        ImageHostKind::S3 { bucket_name } => {
            let s3_client = aws_clients::create_s3_client(&sdk_config);
            startup::ensure_s3_bucket_exists(&s3_client, bucket_name, &config.aws_region).await?;
            Arc::new(S3ImageHost::new(
                s3_client,
                bucket_name.clone(),
                &config.aws_region,
                config.localstack_endpoint.as_deref(),
            ))
        }
    };

    let local_store: Arc<dyn LocalStore> = match &config.local_store_path {
        Some(path) => Arc::new(SqliteLocalStore::open(path)?),
        None => {
            tracing::info!("LOCAL_STORE_PATH not set, client data is kept in memory only");
            Arc::new(SqliteLocalStore::in_memory()?)
        }
    };

    let repo: Arc<dyn UserMemeRepository> = Arc::new(DynamoDbUserMemeRepository::new(
        db_client,
        config.memes_table_name.clone(),
    ));

    let state = Arc::new(AppState {
        meme_source: Arc::new(imgflip),
        local_store: local_store.clone(),
        upload: UploadPipeline::new(captioner, image_host, repo.clone()),
        profiles: ProfileAggregator::new(repo, local_store),
    });

    let app = routes::create_router(state);

    tracing::info!("Server listening on http://{}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
