use crate::error::TrendsError;
use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error, info};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Read access to a bucket of named objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, TrendsError> {
        self.list_objects_with_prefix(bucket, "", None).await
    }

    /// Lists object names starting with `prefix`. With a `delimiter`, names
    /// containing the delimiter after the prefix (objects in "subfolders")
    /// are left out.
    async fn list_objects_with_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<Vec<String>, TrendsError>;

    async fn download_object(
        &self,
        bucket: &str,
        name: &str,
        destination: &Path,
    ) -> Result<u64, TrendsError>;
}

/// Google Cloud Storage over its JSON API.
pub struct GcsStore {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<RemoteObject>,
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteObject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GcsStore {
    /// Picks up an access token from the environment when one is set.
    pub fn from_env() -> Self {
        let token = std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::new(DEFAULT_STORAGE_URL, token)
    }

    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn objects_url(&self, bucket: &str) -> Result<Url, TrendsError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| TrendsError::InvalidStorageUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| TrendsError::InvalidStorageUrl {
                url: self.base_url.clone(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o"]);
        Ok(url)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, TrendsError> {
        let req = match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TrendsError::Storage {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn list_objects_with_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<Vec<String>, TrendsError> {
        let url = self.objects_url(bucket)?;
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = Vec::new();
            if !prefix.is_empty() {
                query.push(("prefix", prefix));
            }
            if let Some(d) = delimiter {
                query.push(("delimiter", d));
            }
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let resp = self.send(self.client.get(url.clone()).query(&query)).await?;
            let page: ObjectList = serde_json::from_slice(&resp.bytes().await?)?;
            debug!("Listed {} objects from gs://{}", page.items.len(), bucket);
            names.extend(page.items.into_iter().map(|o| o.name));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(names)
    }

    async fn download_object(
        &self,
        bucket: &str,
        name: &str,
        destination: &Path,
    ) -> Result<u64, TrendsError> {
        let mut url = self.objects_url(bucket)?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(name);
        }
        info!("Downloading gs://{}/{} to {}", bucket, name, destination.display());

        let resp = self
            .send(self.client.get(url).query(&[("alt", "media")]))
            .await?;

        // The final name only ever holds a complete object.
        let partial = partial_path(destination);
        let result = async {
            let mut file = File::create(&partial).await?;
            let mut stream = resp.bytes_stream();
            let mut written: u64 = 0;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, TrendsError>(written)
        }
        .await;

        match result {
            Ok(written) => {
                tokio::fs::rename(&partial, destination).await?;
                Ok(written)
            }
            Err(e) => {
                error!("Download of gs://{}/{} failed: {}", bucket, name, e);
                if let Err(rm) = tokio::fs::remove_file(&partial).await {
                    debug!("Could not remove {}: {}", partial.display(), rm);
                }
                Err(e)
            }
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}
