//! Base HTTP client with shared logic

use crate::infrastructure::model::types::ModelError;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            api_key,
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// POST a JSON body and decode the JSON reply. `bearer` selects whether
    /// the configured API key is attached.
    pub async fn post_json<Req, Res>(
        &self,
        url: &str,
        body: &Req,
        bearer: bool,
    ) -> Result<Res, ModelError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let mut request = self.http.post(url).json(body);
        if bearer {
            request = request.bearer_auth(self.require_api_key()?);
        }

        let network = |err: reqwest::Error| ModelError::network(&self.id, err);
        let response = request.send().await.map_err(network)?;
        let response = response.error_for_status().map_err(network)?;
        response.json().await.map_err(network)
    }

    fn require_api_key(&self) -> Result<&str, ModelError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::missing_api_key(&self.id))
    }
}
