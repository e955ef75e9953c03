use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Who is calling: the browser's storage namespace and, when signed in, the user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub client_id: String,
    pub user_id: Option<String>,
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientContext {
            client_id: header_value(parts, CLIENT_ID_HEADER).unwrap_or_else(|| ANONYMOUS_CLIENT.to_string()),
            user_id: header_value(parts, USER_ID_HEADER),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(builder: axum::http::request::Builder) -> ClientContext {
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        ClientContext::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn defaults_to_anonymous_signed_out() {
        let ctx = extract(Request::builder()).await;
        assert_eq!(ctx.client_id, ANONYMOUS_CLIENT);
        assert_eq!(ctx.user_id, None);
    }

    #[tokio::test]
    async fn reads_trimmed_headers_and_ignores_blank() {
        let ctx = extract(
            Request::builder()
                .header(CLIENT_ID_HEADER, " tab-7 ")
                .header(USER_ID_HEADER, "   "),
        )
        .await;
        assert_eq!(ctx.client_id, "tab-7");
        assert_eq!(ctx.user_id, None);
    }
}
