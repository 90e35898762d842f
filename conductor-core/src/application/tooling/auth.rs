use super::error::ToolInvokeError;
use crate::config::{EventStreamParams, ServerAuth};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Build the headers sent with both the event-stream GET and every POST.
pub(crate) async fn resolve_headers(
    client: &Client,
    server: &str,
    params: &EventStreamParams,
) -> Result<HeaderMap, ToolInvokeError> {
    let mut headers = HeaderMap::new();
    for (key, value) in &params.headers {
        insert(&mut headers, server, key, value)?;
    }

    match &params.auth {
        ServerAuth::None => {}
        ServerAuth::ApiKey { header, key } => insert(&mut headers, server, header, key)?,
        ServerAuth::Bearer { token } => {
            insert(&mut headers, server, AUTHORIZATION.as_str(), &format!("Bearer {token}"))?
        }
        ServerAuth::Basic { username, password } => {
            let encoded = STANDARD.encode(format!("{username}:{password}"));
            insert(&mut headers, server, AUTHORIZATION.as_str(), &format!("Basic {encoded}"))?
        }
        ServerAuth::TokenEndpoint {
            url,
            client_id,
            client_secret,
        } => {
            let token = fetch_token(client, server, url, client_id, client_secret).await?;
            insert(&mut headers, server, AUTHORIZATION.as_str(), &format!("Bearer {token}"))?
        }
    }

    Ok(headers)
}

async fn fetch_token(
    client: &Client,
    server: &str,
    url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, ToolInvokeError> {
    debug!(server, url, "Requesting access token");
    let auth_error = |message: String| ToolInvokeError::Auth {
        server: server.to_string(),
        message,
    };

    let response = client
        .post(url)
        .json(&json!({ "client_id": client_id, "client_secret": client_secret }))
        .send()
        .await
        .map_err(|err| auth_error(format!("token request failed: {err}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(auth_error(format!("token endpoint returned {status}")));
    }
    let body: TokenResponse = response
        .json()
        .await
        .map_err(|err| auth_error(format!("token response missing access_token: {err}")))?;
    Ok(body.access_token)
}

fn insert(
    headers: &mut HeaderMap,
    server: &str,
    key: &str,
    value: &str,
) -> Result<(), ToolInvokeError> {
    let invalid = |what: &str| ToolInvokeError::Auth {
        server: server.to_string(),
        message: format!("invalid header {what} '{key}'"),
    };
    let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| invalid("name"))?;
    let mut value = HeaderValue::from_str(value).map_err(|_| invalid("value for"))?;
    value.set_sensitive(name == AUTHORIZATION || key.eq_ignore_ascii_case("x-api-key"));
    headers.insert(name, value);
    Ok(())
}
