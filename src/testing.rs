//! In-memory [`NewsApi`] used by the flow tests.

use crate::api::NewsApi;
use crate::error::ClientError;
use crate::models::{Cursor, NewsItem, NewsItemRequest, NewsPage, UploadCredential};
use crate::uploader::ThumbnailFile;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Build a news item with the given id and date.
pub fn item(id: &str, date: &str) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        title: format!("Title {}", id),
        description: format!("Description {}", id),
        date: date.to_string(),
        thumbnail_key: None,
    }
}

/// A request the fake received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List {
        limit: u32,
        start_key: Option<Cursor>,
    },
    Credential(String),
    Upload {
        url: String,
        key: String,
        filename: String,
        bytes: usize,
    },
    Create(NewsItemRequest),
}

/// Scripted responses plus a log of every call.
///
/// Listing calls pop from `pages`; an empty queue answers with a server
/// error. A `None` credential or created item also answers with a server
/// error.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub pages: Mutex<VecDeque<NewsPage>>,
    pub credential: Option<UploadCredential>,
    pub created: Option<NewsItem>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn with_pages(pages: Vec<NewsPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A credential as the pre-signed URL handler would issue it.
pub fn credential(key: &str) -> UploadCredential {
    UploadCredential {
        url: "https://bucket.s3.amazonaws.com/".to_string(),
        fields: HashMap::from([
            ("key".to_string(), format!("uploads/{}", key)),
            ("policy".to_string(), "eyJleHBpcmF0aW9uIjoi".to_string()),
        ]),
        key: key.to_string(),
    }
}

fn server_error() -> ClientError {
    ClientError::Server {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: Some("boom".to_string()),
    }
}

impl NewsApi for FakeApi {
    async fn list_news(
        &self,
        limit: u32,
        start_key: Option<&Cursor>,
    ) -> Result<NewsPage, ClientError> {
        self.record(Call::List {
            limit,
            start_key: start_key.cloned(),
        });
        self.pages.lock().unwrap().pop_front().ok_or_else(server_error)
    }

    async fn request_credential(&self, filename: &str) -> Result<UploadCredential, ClientError> {
        self.record(Call::Credential(filename.to_string()));
        self.credential.clone().ok_or(ClientError::Credential {
            status: StatusCode::FORBIDDEN,
            message: Some("An error occurred while generating the pre-signed URL".to_string()),
        })
    }

    async fn upload(
        &self,
        credential: &UploadCredential,
        file: &ThumbnailFile,
    ) -> Result<(), ClientError> {
        self.record(Call::Upload {
            url: credential.url.clone(),
            key: credential.key.clone(),
            filename: file.filename.clone(),
            bytes: file.len(),
        });
        Ok(())
    }

    async fn create_news_item(&self, request: &NewsItemRequest) -> Result<NewsItem, ClientError> {
        self.record(Call::Create(request.clone()));
        self.created.clone().ok_or_else(server_error)
    }
}
