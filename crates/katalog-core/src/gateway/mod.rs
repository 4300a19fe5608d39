//! Remote entity gateway for the catalog REST service.
//!
//! Every response is validated here. Callers see either decoded data or one
//! of the three [`FetchError`] variants, never a half-parsed payload.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::credential::CredentialSource;
use crate::error::{Error, FetchError, FetchResult, Result};
use crate::filter::BookFilter;
use crate::models::{EntityId, EntityKind};
use crate::util::compact_text;

/// Typed CRUD over the service's entity collections.
#[allow(async_fn_in_trait)]
pub trait EntityGateway {
    /// `GET /{kind}`
    async fn fetch_all<T: DeserializeOwned>(&self, kind: EntityKind) -> FetchResult<Vec<T>>;

    /// `GET /{kind}/{filter-segment}/{value}`
    async fn fetch_filtered<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        filter: &BookFilter,
    ) -> FetchResult<Vec<T>>;

    /// `POST /{kind}`; returns the server's canonical representation.
    async fn create<P, T>(&self, kind: EntityKind, payload: &P) -> FetchResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned;

    /// `PUT /{kind}/{id}`; returns the server's canonical representation.
    async fn update<P, T>(&self, kind: EntityKind, id: EntityId, payload: &P) -> FetchResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned;

    /// `DELETE /{kind}/{id}`
    async fn remove(&self, kind: EntityKind, id: EntityId) -> FetchResult<()>;
}

/// `{ data, message }` wrapper the service puts around every response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// reqwest-backed gateway.
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    client: Client,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialSource>) -> Result<Self> {
        let config = config.clone().validated()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|error| Error::Config(format!("failed to build HTTP client: {error}")))?;
        Ok(Self {
            base_url: config.api_base_url,
            client,
            credentials,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json");
        match self.credentials.token() {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> FetchResult<(StatusCode, Vec<u8>)> {
        let response: Response = request
            .send()
            .await
            .map_err(|error| FetchError::Transport(error.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| FetchError::Transport(error.to_string()))?;
        if status.is_success() {
            Ok((status, body.to_vec()))
        } else {
            Err(application_error(status, &body))
        }
    }

    async fn send_for_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> FetchResult<T> {
        let (_, body) = self.send(request).await?;
        decode_data(&body)
    }
}

impl EntityGateway for HttpGateway {
    async fn fetch_all<T: DeserializeOwned>(&self, kind: EntityKind) -> FetchResult<Vec<T>> {
        tracing::debug!("GET {}", kind.collection_path());
        self.send_for_data(self.request(Method::GET, kind.collection_path()))
            .await
    }

    async fn fetch_filtered<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        filter: &BookFilter,
    ) -> FetchResult<Vec<T>> {
        let path = format!("{}/{}", kind.collection_path(), filter.sub_path());
        tracing::debug!("GET {path}");
        self.send_for_data(self.request(Method::GET, &path)).await
    }

    async fn create<P, T>(&self, kind: EntityKind, payload: &P) -> FetchResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", kind.collection_path());
        self.send_for_data(
            self.request(Method::POST, kind.collection_path())
                .json(payload),
        )
        .await
    }

    async fn update<P, T>(&self, kind: EntityKind, id: EntityId, payload: &P) -> FetchResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let path = format!("{}/{id}", kind.collection_path());
        tracing::debug!("PUT {path}");
        self.send_for_data(self.request(Method::PUT, &path).json(payload))
            .await
    }

    async fn remove(&self, kind: EntityKind, id: EntityId) -> FetchResult<()> {
        let path = format!("{}/{id}", kind.collection_path());
        tracing::debug!("DELETE {path}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}

/// Decode the `data` member of a 2xx body. `null` or missing data is malformed.
pub(crate) fn decode_data<T: DeserializeOwned>(body: &[u8]) -> FetchResult<T> {
    let envelope: ApiEnvelope<T> = serde_json::from_slice(body)
        .map_err(|error| FetchError::Decode(format!("response body: {error}")))?;
    envelope.data.ok_or_else(|| {
        let detail = envelope
            .message
            .map_or_else(String::new, |message| format!(": {}", compact_text(&message)));
        FetchError::Decode(format!("response carried no data{detail}"))
    })
}

/// Build the application error for a non-2xx response, keeping the server's message.
pub(crate) fn application_error(status: StatusCode, body: &[u8]) -> FetchError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| payload.message.or(payload.error))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let text = compact_text(&String::from_utf8_lossy(body));
            if text.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                text
            }
        });
    FetchError::Application {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LookupEntry;

    #[test]
    fn decode_data_unwraps_envelope() {
        let body = br#"{"data":[{"id":1,"nama":"Tersedia"}],"message":"ok"}"#;
        let entries: Vec<LookupEntry> = decode_data(body).unwrap();
        assert_eq!(entries, vec![LookupEntry::new(1, "Tersedia")]);
    }

    #[test]
    fn null_data_is_a_decode_error() {
        let body = br#"{"data":null,"message":"Buku tidak ditemukan"}"#;
        let error = decode_data::<Vec<LookupEntry>>(body).unwrap_err();
        assert!(matches!(error, FetchError::Decode(ref detail) if detail.contains("tidak ditemukan")));
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let body = br#"{"data":{"id":"x"}}"#;
        assert!(matches!(
            decode_data::<Vec<LookupEntry>>(body),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            decode_data::<Vec<LookupEntry>>(b"<html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn application_error_prefers_server_message() {
        let error = application_error(
            StatusCode::BAD_REQUEST,
            br#"{"data":null,"message":"Judul wajib diisi"}"#,
        );
        assert_eq!(
            error,
            FetchError::Application {
                status: 400,
                message: "Judul wajib diisi".to_string(),
            }
        );
    }

    #[test]
    fn application_error_falls_back_to_body_or_status() {
        let plain = application_error(StatusCode::BAD_GATEWAY, b"upstream down");
        assert!(matches!(plain, FetchError::Application { ref message, .. } if message == "upstream down"));

        let empty = application_error(StatusCode::UNAUTHORIZED, b"");
        assert!(matches!(empty, FetchError::Application { ref message, .. } if message == "HTTP 401"));
    }
}
