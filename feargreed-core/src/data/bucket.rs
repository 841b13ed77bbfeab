//! Load sink: object storage buckets.
//!
//! A bucket accepts encoded bytes under an object name. `upload_frame`
//! encodes a frame, names the object `{partition path}{format suffix}` and
//! writes it in one piece. Callers never see a partial object:
//! - `LocalBucket` writes to `{name}.tmp` and renames into place
//! - `GcsBucket` issues a single media upload

use super::frame::OutputFormat;
use super::provider::DataError;
use crate::domain::PartitionKey;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// What was written by one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Full object URI, e.g. `gs://bucket/sentiments/2022-04-01.gz.parquet`.
    pub uri: String,
    pub object_name: String,
    pub rows: usize,
    pub bytes: usize,
    /// BLAKE3 hex digest of the object bytes.
    pub content_hash: String,
}

/// Object storage reachable by path.
pub trait Bucket: Send + Sync {
    /// Bucket name as shown in logs and URIs.
    fn name(&self) -> &str;

    /// URI of an object in this bucket.
    fn uri(&self, object_name: &str) -> String;

    /// Write one whole object, replacing any previous version.
    fn put_object(
        &self,
        object_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), DataError>;

    /// Encode `df` and upload it to the partition's path.
    fn upload_frame(
        &self,
        df: &DataFrame,
        key: &PartitionKey,
        format: OutputFormat,
    ) -> Result<UploadReceipt, DataError> {
        let object_name = format!("{}{}", key.path(), format.suffix());
        let bytes = format.encode(df)?;
        self.put_object(&object_name, &bytes, format.content_type())?;
        Ok(UploadReceipt {
            uri: self.uri(&object_name),
            rows: df.height(),
            bytes: bytes.len(),
            content_hash: blake3::hash(&bytes).to_hex().to_string(),
            object_name,
        })
    }
}

/// Bucket backed by a local directory.
pub struct LocalBucket {
    name: String,
    root: PathBuf,
}

impl LocalBucket {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Filesystem path of an object.
    pub fn object_path(&self, object_name: &str) -> PathBuf {
        self.root.join(object_name)
    }

    /// Object names currently stored under `prefix`, sorted.
    pub fn list(&self, prefix: &str) -> Result<Vec<String>, DataError> {
        let mut names = Vec::new();
        collect_objects(&self.root, &self.root, &mut names)?;
        names.retain(|n| n.starts_with(prefix));
        names.sort();
        Ok(names)
    }
}

fn collect_objects(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), DataError> {
    if !dir.exists() {
        return Ok(());
    }
    let entries =
        fs::read_dir(dir).map_err(|e| DataError::Storage(format!("read dir {}: {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| DataError::Storage(format!("dir entry: {e}")))?;
        let path = entry.path();
        if path.is_dir() {
            collect_objects(root, &path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) != Some("tmp") {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    Ok(())
}

impl Bucket for LocalBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn uri(&self, object_name: &str) -> String {
        format!("file://{}", self.object_path(object_name).display())
    }

    fn put_object(
        &self,
        object_name: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), DataError> {
        let inside_root = Path::new(object_name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if object_name.is_empty() || !inside_root {
            return Err(DataError::Storage(format!(
                "object name '{object_name}' escapes the bucket root"
            )));
        }
        let path = self.object_path(object_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DataError::Storage(format!("failed to create dir: {e}")))?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, bytes)
            .map_err(|e| DataError::Storage(format!("write {}: {e}", tmp_path.display())))?;

        // Atomic rename
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Storage(format!("atomic rename failed: {e}"))
        })
    }
}

pub const GCS_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Google Cloud Storage bucket using the JSON API's media upload.
pub struct GcsBucket {
    client: reqwest::blocking::Client,
    bucket: String,
    access_token: String,
    upload_base: String,
}

impl GcsBucket {
    pub fn new(bucket: impl Into<String>, access_token: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| DataError::Storage(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            bucket: bucket.into(),
            access_token: access_token.into(),
            upload_base: GCS_UPLOAD_BASE.into(),
        })
    }

    pub fn with_upload_base(mut self, base: &str) -> Self {
        self.upload_base = base.trim_end_matches('/').to_string();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/b/{}/o", self.upload_base, self.bucket)
    }
}

impl Bucket for GcsBucket {
    fn name(&self) -> &str {
        &self.bucket
    }

    fn uri(&self, object_name: &str) -> String {
        format!("gs://{}/{object_name}", self.bucket)
    }

    fn put_object(
        &self,
        object_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), DataError> {
        let resp = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", object_name)])
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .map_err(|e| DataError::Storage(format!("upload {object_name}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(DataError::Storage(format!(
                "upload {object_name} to {}: HTTP {status}: {}",
                self.bucket,
                detail.chars().take(200).collect::<String>()
            )));
        }
        Ok(())
    }
}
