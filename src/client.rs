//! HTTP client core.
//!
//! One configured `reqwest::Client` shared by both facades. Before every
//! request the persisted token is read and attached as a bearer credential;
//! on a 401 the session store is cleared before the failure propagates.
//! There is no retry and no token refresh.

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::response::{RawEnvelope, SESSION_EXPIRED_MESSAGE};
use crate::session::SessionStore;

const MAX_ERROR_BODY_SNIPPET: usize = 200;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: SessionStore,
}

impl ApiClient {
    /// Construction errors are local (TLS backend, builder settings) and
    /// stay outside the [`ApiError`] taxonomy, which only describes the
    /// request pipeline.
    pub fn new(config: ApiConfig, session: SessionStore) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("building the HTTP client")?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    pub(crate) async fn get(&self, path: &str) -> ApiResult<RawEnvelope> {
        self.execute(self.http.get(self.url(path))).await
    }

    pub(crate) async fn get_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<RawEnvelope> {
        self.execute(self.http.get(self.url(path)).query(query)).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<RawEnvelope> {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    pub(crate) async fn post_empty(&self, path: &str) -> ApiResult<RawEnvelope> {
        self.execute(self.http.post(self.url(path))).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<RawEnvelope> {
        self.execute(self.http.put(self.url(path)).json(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<RawEnvelope> {
        self.execute(self.http.delete(self.url(path))).await
    }

    /// Upload a single file under `field`, with an optional slower deadline
    /// for the inference endpoint.
    pub(crate) async fn post_multipart(
        &self,
        path: &str,
        field: &'static str,
        filename: &str,
        bytes: Bytes,
        timeout: Option<Duration>,
    ) -> ApiResult<RawEnvelope> {
        let mime = mime_for_filename(filename);
        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let form = Form::new().part(field, part);

        let mut builder = self.http.post(self.url(path)).multipart(form);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        self.execute(builder).await
    }

    async fn execute(&self, builder: RequestBuilder) -> ApiResult<RawEnvelope> {
        let builder = match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            debug!("session rejected by backend, clearing local state");
            if let Err(e) = self.session.clear().await {
                warn!(error = %e, "failed to clear session after 401");
            }
            let message = serde_json::from_str::<RawEnvelope>(&body)
                .ok()
                .and_then(|env| env.declared_message().map(str::to_string))
                .unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string());
            return Err(ApiError::Unauthorized(message));
        }

        match serde_json::from_str::<RawEnvelope>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => Err(ApiError::InvalidResponse(e.to_string())),
            Err(_) => {
                let mut message = body;
                message.truncate(MAX_ERROR_BODY_SNIPPET);
                Err(ApiError::Backend {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

/// Guess the MIME type from the filename extension.
///
/// Unrecognized extensions fall back to `image/jpeg`, matching what the
/// backend assumes for camera captures.
pub(crate) fn mime_for_filename(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
