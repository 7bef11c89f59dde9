//! News API interaction.
//!
//! This module is the only place the client touches the network.
//!
//! # Architecture
//!
//! - [`NewsApi`]: Core trait, one async method per endpoint the client consumes
//! - [`HttpNewsApi`]: `reqwest` implementation talking JSON over HTTPS
//!
//! The client flows in [`crate::listing`], [`crate::uploader`] and
//! [`crate::submitter`] are generic over [`NewsApi`], so they can be driven by
//! an in-memory fake in tests.
//!
//! # Failure policy
//!
//! Every call is a single attempt. Non-2xx answers become
//! [`ClientError::Server`] (or [`ClientError::Credential`] for the pre-signed
//! URL endpoint); the decision to retry is left to the user.

use crate::error::ClientError;
use crate::models::{
    ApiErrorBody, Cursor, NewsItem, NewsItemRequest, NewsItemResponse, NewsPage,
    UploadCredential,
};
use crate::uploader::ThumbnailFile;
use crate::utils::truncate_for_log;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// The endpoints of the news board API.
pub trait NewsApi {
    /// `GET /news?limit=<n>&start_key=<json>`: one page of news items.
    async fn list_news(
        &self,
        limit: u32,
        start_key: Option<&Cursor>,
    ) -> Result<NewsPage, ClientError>;

    /// `GET /pre-signed-url?filename=<name>`: a single-use upload credential.
    async fn request_credential(&self, filename: &str) -> Result<UploadCredential, ClientError>;

    /// Multipart `POST` of `file` to the credential's URL.
    ///
    /// Only transport failures are errors; the storage service's response
    /// status is not inspected.
    async fn upload(
        &self,
        credential: &UploadCredential,
        file: &ThumbnailFile,
    ) -> Result<(), ClientError>;

    /// `POST /newsitem`: create a news item and return its canonical form.
    async fn create_news_item(&self, request: &NewsItemRequest) -> Result<NewsItem, ClientError>;
}

/// [`NewsApi`] over HTTP.
#[derive(Clone)]
pub struct HttpNewsApi {
    client: Client,
    base_url: Url,
}

impl fmt::Debug for HttpNewsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpNewsApi")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpNewsApi {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// A trailing slash is added when missing so that endpoint paths are
    /// joined below the base instead of replacing its last segment.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Like [`HttpNewsApi::new`] with a caller-supplied `reqwest` client.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    /// Absolute URL of an endpoint such as `"news"`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn news_url(&self, limit: u32, start_key: Option<&Cursor>) -> Result<Url, ClientError> {
        let mut url = self.endpoint("news")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(cursor) = start_key {
                query.append_pair("start_key", &cursor.to_query_value());
            }
        }
        Ok(url)
    }

    fn credential_url(&self, filename: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint("pre-signed-url")?;
        url.query_pairs_mut().append_pair("filename", filename);
        Ok(url)
    }
}

/// Read a response body as JSON, or turn a non-2xx answer into an error.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Server {
            status,
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|e| {
        warn!(%status, body = %truncate_for_log(&body, 300), error = %e, "Unexpected response body");
        ClientError::Decode(e)
    })
}

/// Best-effort extraction of the human-readable part of an error body.
fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.into_message(),
        Err(_) if !body.trim().is_empty() => Some(truncate_for_log(body.trim(), 200)),
        Err(_) => None,
    }
}

impl NewsApi for HttpNewsApi {
    #[instrument(level = "info", skip_all, fields(%limit, has_cursor = start_key.is_some()))]
    async fn list_news(
        &self,
        limit: u32,
        start_key: Option<&Cursor>,
    ) -> Result<NewsPage, ClientError> {
        let url = self.news_url(limit, start_key)?;
        let t0 = Instant::now();
        debug!(%url, "GET news");

        let response = self.client.get(url).send().await?;
        let page: NewsPage = read_json(response).await?;

        info!(
            count = page.news_items.len(),
            has_next = page.next_key.is_some(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched news page"
        );
        Ok(page)
    }

    #[instrument(level = "info", skip_all, fields(%filename))]
    async fn request_credential(&self, filename: &str) -> Result<UploadCredential, ClientError> {
        let url = self.credential_url(filename)?;
        let response = self.client.get(url).send().await?;

        let credential: UploadCredential = match read_json(response).await {
            Ok(c) => c,
            Err(ClientError::Server { status, message }) => {
                return Err(ClientError::Credential { status, message });
            }
            Err(e) => return Err(e),
        };

        info!(key = %credential.key, fields = credential.fields.len(), "Obtained upload credential");
        Ok(credential)
    }

    #[instrument(level = "info", skip_all, fields(key = %credential.key, bytes = file.len()))]
    async fn upload(
        &self,
        credential: &UploadCredential,
        file: &ThumbnailFile,
    ) -> Result<(), ClientError> {
        let mut form = Form::new();
        for (name, value) in &credential.fields {
            form = form.text(name.clone(), value.clone());
        }
        let part = Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
        form = form.part("file", part);

        let t0 = Instant::now();
        let response = self
            .client
            .post(credential.url.as_str())
            .multipart(form)
            .send()
            .await?;

        // The storage service's verdict is not acted upon; record it for diagnosis.
        let status = response.status();
        if status.is_success() {
            info!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Uploaded thumbnail");
        } else {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Storage rejected thumbnail upload");
        }
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(title = %request.title))]
    async fn create_news_item(&self, request: &NewsItemRequest) -> Result<NewsItem, ClientError> {
        let url = self.endpoint("newsitem")?;
        let response = self.client.post(url).json(request).send().await?;
        let created: NewsItemResponse = read_json(response).await?;

        info!(id = %created.news_item.id, date = %created.news_item.date, "Created news item");
        Ok(created.news_item)
    }
}
