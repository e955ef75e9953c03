use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

/// Which service turns a template plus two lines of text into a hosted image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptionService {
    Imgflip,
    Memegen,
}

impl FromStr for CaptionService {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "imgflip" => Ok(CaptionService::Imgflip),
            "memegen" => Ok(CaptionService::Memegen),
            other => Err(format!("unknown caption service '{}'", other)),
        }
    }
}

/// Where custom uploads are hosted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageHostKind {
    Imgbb,
    S3 { bucket_name: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub aws_region: String,
    // Optional endpoint for LocalStack
    pub localstack_endpoint: Option<String>,
    pub memes_table_name: String,
    pub imgflip_api_url: String,
    pub imgflip_username: Option<String>,
    pub imgflip_password: Option<String>,
    pub caption_service: CaptionService,
    pub image_host: ImageHostKind,
    pub imgbb_api_url: String,
    pub imgbb_api_key: Option<String>,
    pub local_store_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `load` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address_str = non_empty("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let aws_region = non_empty("AWS_DEFAULT_REGION").unwrap_or_else(|| "ca-central-1".to_string());
        let localstack_endpoint = non_empty("AWS_ENDPOINT_URL");
        let memes_table_name = non_empty("MEMES_TABLE_NAME").unwrap_or_else(|| "memes".to_string());

        let imgflip_api_url = non_empty("IMGFLIP_API_URL")
            .unwrap_or_else(|| "https://api.imgflip.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let caption_service = match non_empty("CAPTION_SERVICE") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidVar("CAPTION_SERVICE".into(), e))?,
            None => CaptionService::Imgflip,
        };

        let image_host = match non_empty("IMAGE_HOST").map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("imgbb") => ImageHostKind::Imgbb,
            Some("s3") => ImageHostKind::S3 {
                bucket_name: non_empty("MEME_BUCKET_NAME")
                    .ok_or_else(|| ConfigError::MissingVar("MEME_BUCKET_NAME".into()))?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidVar(
                    "IMAGE_HOST".into(),
                    format!("unknown image host '{}'", other),
                ));
            }
        };

        Ok(Config {
            bind_address,
            aws_region,
            localstack_endpoint,
            memes_table_name,
            imgflip_api_url,
            imgflip_username: non_empty("IMGFLIP_USERNAME"),
            imgflip_password: non_empty("IMGFLIP_PASSWORD"),
            caption_service,
            image_host,
            imgbb_api_url: non_empty("IMGBB_API_URL")
                .unwrap_or_else(|| "https://api.imgbb.com/1/upload".to_string()),
            imgbb_api_key: non_empty("IMGBB_API_KEY"),
            local_store_path: non_empty("LOCAL_STORE_PATH").map(PathBuf::from),
        })
    }
}
