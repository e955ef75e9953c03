use crate::{
    domain::{Captioner, MemeSource},
    errors::ApiError,
    models::MemeTemplate,
};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const SERVICE: &str = "Imgflip";

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TemplateList {
    memes: Vec<MemeTemplate>,
}

#[derive(Deserialize, Debug)]
struct Captioned {
    url: String,
}

impl<T> Envelope<T> {
    fn into_data(self, what: &str) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(ApiError::Unsuccessful {
                service: SERVICE,
                message: self
                    .error_message
                    .unwrap_or_else(|| format!("{} response unsuccessful", what)),
            }),
        }
    }
}

/// Client for the Imgflip template listing and captioning endpoints.
#[derive(Debug, Clone)]
pub struct ImgflipClient {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ImgflipClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    fn request_error(source: reqwest::Error) -> ApiError {
        ApiError::Request { service: SERVICE, source }
    }
}

#[async_trait]
impl MemeSource for ImgflipClient {
    async fn fetch_templates(&self) -> Result<Vec<MemeTemplate>, ApiError> {
        let url = format!("{}/get_memes", self.base_url);
        tracing::debug!(%url, "Imgflip: fetching templates");

        let envelope: Envelope<TemplateList> = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(Self::request_error)?
            .json()
            .await
            .map_err(Self::request_error)?;

        let memes = envelope.into_data("Imgflip template")?.memes;
        tracing::info!(count = memes.len(), "Imgflip: fetched templates");
        Ok(memes)
    }
}

#[async_trait]
impl Captioner for ImgflipClient {
    async fn caption(&self, template_id: &str, top_text: &str, bottom_text: &str) -> Result<String, ApiError> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(ApiError::MissingCredentials(SERVICE));
        };

        let url = format!("{}/caption_image", self.base_url);
        tracing::debug!(%url, template_id, "Imgflip: captioning template");

        let form = [
            ("template_id", template_id),
            ("username", username.as_str()),
            ("password", password.as_str()),
            ("text0", top_text),
            ("text1", bottom_text),
        ];
        let envelope: Envelope<Captioned> = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(Self::request_error)?
            .json()
            .await
            .map_err(Self::request_error)?;

        let captioned = envelope.into_data("Imgflip caption")?;
        tracing::info!(template_id, image_url = %captioned.url, "Imgflip: meme generated");
        Ok(captioned.url)
    }
}

/// Builds memegen.link image URLs locally; no request is made.
#[derive(Debug, Clone)]
pub struct MemegenCaptioner {
    base_url: String,
}

impl Default for MemegenCaptioner {
    fn default() -> Self {
        Self {
            base_url: "https://memegen.link".to_string(),
        }
    }
}

fn memegen_segment(text: &str) -> String {
    let replaced = text.replace(' ', "_");
    if replaced.is_empty() { "-".to_string() } else { replaced }
}

impl MemegenCaptioner {
    pub fn image_url(&self, template_id: &str, top_text: &str, bottom_text: &str) -> Result<String, ApiError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ApiError::Unsuccessful {
            service: "Memegen",
            message: format!("invalid base URL: {}", e),
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Unsuccessful {
                service: "Memegen",
                message: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(template_id)
            .push(&memegen_segment(top_text))
            .push(&format!("{}.jpg", memegen_segment(bottom_text)));
        Ok(url.to_string())
    }
}

#[async_trait]
impl Captioner for MemegenCaptioner {
    async fn caption(&self, template_id: &str, top_text: &str, bottom_text: &str) -> Result<String, ApiError> {
        self.image_url(template_id, top_text, bottom_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> ImgflipClient {
        ImgflipClient::new(reqwest::Client::new(), uri)
    }

    #[tokio::test]
    async fn maps_template_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_memes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": { "memes": [{
                    "id": "181913649",
                    "name": "Drake Hotline Bling",
                    "url": "https://i.imgflip.com/30b1gx.jpg",
                    "width": 1200,
                    "height": 1200,
                    "box_count": 2,
                    "captions": 1234
                }]}
            })))
            .mount(&mock_server)
            .await;

        let memes = client(&mock_server.uri()).fetch_templates().await.unwrap();
        assert_eq!(
            memes,
            vec![MemeTemplate {
                id: "181913649".into(),
                name: "Drake Hotline Bling".into(),
                url: "https://i.imgflip.com/30b1gx.jpg".into(),
                width: 1200,
                height: 1200,
            }]
        );
    }

    #[tokio::test]
    async fn unsuccessful_listing_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_memes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": false })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).fetch_templates().await.unwrap_err();
        assert!(matches!(err, ApiError::Unsuccessful { .. }));
    }

    #[tokio::test]
    async fn server_error_is_a_request_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_memes"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).fetch_templates().await.unwrap_err();
        assert!(matches!(err, ApiError::Request { .. }));
    }

    #[tokio::test]
    async fn caption_posts_form_and_returns_url() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/caption_image"))
            .and(body_string_contains("template_id=181913649"))
            .and(body_string_contains("username=meme-bot"))
            .and(body_string_contains("text0=top+line"))
            .and(body_string_contains("text1=bottom"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": { "url": "https://i.imgflip.com/abc123.jpg", "page_url": "https://imgflip.com/i/abc123" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = client(&mock_server.uri())
            .with_credentials(Some("meme-bot".into()), Some("hunter2".into()))
            .caption("181913649", "top line", "bottom")
            .await
            .unwrap();
        assert_eq!(url, "https://i.imgflip.com/abc123.jpg");
    }

    #[tokio::test]
    async fn caption_failure_carries_upstream_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/caption_image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error_message": "Invalid username/password combination"
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri())
            .with_credentials(Some("a".into()), Some("b".into()))
            .caption("1", "", "")
            .await
            .unwrap_err();
        match err {
            ApiError::Unsuccessful { message, .. } => assert_eq!(message, "Invalid username/password combination"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn caption_without_credentials_makes_no_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).caption("1", "a", "b").await.unwrap_err();
        assert!(matches!(err, ApiError::MissingCredentials("Imgflip")));
    }

    #[tokio::test]
    async fn memegen_builds_escaped_url() {
        let url = MemegenCaptioner::default()
            .caption("drake", "no tests", "")
            .await
            .unwrap();
        assert_eq!(url, "https://memegen.link/drake/no_tests/-.jpg");

        let escaped = MemegenCaptioner::default().image_url("buzz", "what?", "50% off").unwrap();
        assert_eq!(escaped, "https://memegen.link/buzz/what%3F/50%25_off.jpg");
    }
}
