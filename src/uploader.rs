//! Thumbnail uploader.
//!
//! Uploading is a two-step exchange:
//!
//! 1. **Credential**: ask `/pre-signed-url` for a short-lived upload target
//! 2. **Upload**: multipart `POST` of the credential's fields plus the file
//!    straight to object storage
//!
//! The credential's `key` is then stored as the draft's thumbnail key.
//! Files larger than [`MAX_THUMBNAIL_BYTES`] are refused before step 1.

use crate::api::NewsApi;
use crate::error::ClientError;
use crate::state::{Action, Store};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Largest accepted thumbnail: 5 MB.
pub const MAX_THUMBNAIL_BYTES: u64 = 5 * 1024 * 1024;

/// User-visible message for oversized files.
pub const TOO_LARGE: &str = "Image size must not exceed 5MB.";
/// User-visible prefix for credential failures.
pub const CREDENTIAL_FAILED: &str = "Failed to get pre-signed URL";
/// User-visible prefix for upload failures.
pub const UPLOAD_FAILED: &str = "Failed to upload file";

/// An image read from disk, ready to be uploaded.
#[derive(Clone, PartialEq)]
pub struct ThumbnailFile {
    /// Name sent to `/pre-signed-url` and used as the multipart file name.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ThumbnailFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailFile")
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ThumbnailFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a file from disk.
    ///
    /// The size limit is checked against the file's metadata first, so an
    /// oversized file is never read into memory.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] if the file exceeds [`MAX_THUMBNAIL_BYTES`]
    /// - [`ClientError::Io`] if the file cannot be inspected or read
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let size = fs::metadata(path).await?.len();
        check_size(size)?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let bytes = fs::read(path).await?;
        Ok(Self::new(filename, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

fn check_size(size: u64) -> Result<(), ClientError> {
    if size > MAX_THUMBNAIL_BYTES {
        return Err(ClientError::Validation(TOO_LARGE.to_string()));
    }
    Ok(())
}

/// Uploads thumbnails through a [`NewsApi`] and records the resulting key.
#[derive(Debug)]
pub struct ThumbnailUploader<'a, A> {
    api: &'a A,
}

impl<'a, A: NewsApi> ThumbnailUploader<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Read `path` and upload it. See [`ThumbnailUploader::upload`].
    ///
    /// Oversized or unreadable files are reported in the store without any
    /// request being issued.
    pub async fn upload_path(
        &self,
        store: &Store,
        path: impl AsRef<Path>,
    ) -> Result<String, ClientError> {
        match ThumbnailFile::from_path(path).await {
            Ok(file) => self.upload(store, file).await,
            Err(e) => {
                warn!(error = %e, "Thumbnail rejected before upload");
                store.dispatch(Action::UploadRejected(e.user_message(UPLOAD_FAILED)));
                Err(e)
            }
        }
    }

    /// Obtain a credential for `file` and upload it.
    ///
    /// # Returns
    ///
    /// The storage key of the uploaded object. The key is also written to the
    /// draft, unless a newer upload was started in the meantime.
    #[instrument(level = "info", skip_all, fields(filename = %file.filename, bytes = file.len()))]
    pub async fn upload(&self, store: &Store, file: ThumbnailFile) -> Result<String, ClientError> {
        if let Err(e) = check_size(file.len() as u64) {
            store.dispatch(Action::UploadRejected(e.user_message(UPLOAD_FAILED)));
            return Err(e);
        }

        let ticket = store.begin_upload();
        store.dispatch(Action::UploadStarted(ticket));

        let credential = match self.api.request_credential(&file.filename).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Could not obtain upload credential");
                store.dispatch(Action::UploadFailed {
                    ticket,
                    message: e.user_message(CREDENTIAL_FAILED),
                });
                return Err(e);
            }
        };

        if let Err(e) = self.api.upload(&credential, &file).await {
            warn!(error = %e, "Thumbnail upload failed");
            store.dispatch(Action::UploadFailed {
                ticket,
                message: e.user_message(UPLOAD_FAILED),
            });
            return Err(e);
        }

        info!(key = %credential.key, ticket = ticket.0, "Thumbnail uploaded");
        store.dispatch(Action::UploadSucceeded {
            ticket,
            key: credential.key.clone(),
        });
        Ok(credential.key)
    }
}
