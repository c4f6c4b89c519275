use std::future::Future;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use crate::constants::USER_AGENT;
use crate::error::FetchError;

/// Fetches a JSON document from a third-party API.
///
/// Every outbound call of the server goes through this seam so the
/// upstream and IP providers can be replaced in tests.
pub trait JsonFetch: Send + Sync + 'static {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// reqwest-backed [`JsonFetch`]
#[derive(Clone)]
pub struct HttpJson {
    client: Arc<Client>,
}

impl HttpJson {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

impl JsonFetch for HttpJson {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let data = response.json::<Value>().await?;
        Ok(data)
    }
}

impl<F: JsonFetch> JsonFetch for Arc<F> {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, FetchError>> + Send {
        (**self).get_json(url)
    }
}
