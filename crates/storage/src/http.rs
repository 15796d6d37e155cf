use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::repository::{DocumentPath, DocumentStore, StorageError};

#[derive(Clone, Debug)]
pub struct HttpDocumentStoreConfig {
    pub base_url: String,
    pub token: Option<String>,
}

/// Remote document store reached over plain REST.
///
/// `GET`, `PUT` and `DELETE` against `{base_url}/{path}` with JSON bodies.
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: Client,
    config: HttpDocumentStoreConfig,
}

impl HttpDocumentStore {
    #[must_use]
    pub fn new(config: HttpDocumentStoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// `{base_url}/{path}` with every path segment percent-encoded.
    fn url(&self, path: &DocumentPath) -> Result<Url, StorageError> {
        let base = &self.config.base_url;
        if let Some(segment) = path
            .segments()
            .iter()
            .find(|s| matches!(s.as_str(), "." | ".."))
        {
            return Err(StorageError::InvalidPath(format!(
                "dot segment `{segment}` in {path}"
            )));
        }
        let mut url =
            Url::parse(base).map_err(|err| StorageError::InvalidPath(format!("{base}: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| StorageError::InvalidPath(format!("{base} cannot be a base")))?
            .pop_if_empty()
            .extend(path.segments());
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn transport(err: reqwest::Error) -> StorageError {
    StorageError::Connection(err.to_string())
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Value>, StorageError> {
        let response = self
            .authorize(self.client.get(self.url(path)?))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StorageError::HttpStatus(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        if body.is_null() {
            return Ok(None);
        }
        Ok(Some(body))
    }

    async fn set_document(&self, path: &DocumentPath, document: &Value) -> Result<(), StorageError> {
        let response = self
            .authorize(self.client.put(self.url(path)?))
            .json(document)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(StorageError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StorageError> {
        let response = self
            .authorize(self.client.delete(self.url(path)?))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(StorageError::HttpStatus(status.as_u16()))
    }
}
