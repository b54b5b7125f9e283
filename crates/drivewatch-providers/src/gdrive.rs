//! Google Drive v3 provider — lists folder children through `files.list`.

use async_trait::async_trait;
use drivewatch_core::config::DriveConfig;
use drivewatch_core::error::{DriveWatchError, Result};
use drivewatch_core::traits::{ListFilter, StorageProvider};
use drivewatch_core::types::{DriveItem, NodeKind};
use std::time::Duration;

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,size)";

pub struct GoogleDriveProvider {
    api_url: String,
    access_token: String,
    page_size: u32,
    client: reqwest::Client,
}

impl GoogleDriveProvider {
    pub fn new(config: &DriveConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("DriveWatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DriveWatchError::Http(format!("Drive client init failed: {e}")))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            page_size: config.page_size.clamp(1, 1000),
            client,
        })
    }

    async fn fetch_page(&self, parent_id: &str, query: &str, page_token: Option<&str>) -> Result<serde_json::Value> {
        let page_size = self.page_size.to_string();
        let mut params = vec![
            ("q", query),
            ("fields", LIST_FIELDS),
            ("pageSize", page_size.as_str()),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let resp = self.client
            .get(format!("{}/files", self.api_url))
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DriveWatchError::Timeout(format!("Drive list timed out: {e}"))
                } else {
                    DriveWatchError::Provider(format!("Drive request failed ({}): {e}", self.api_url))
                }
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DriveWatchError::FolderNotFound(parent_id.to_string()));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DriveWatchError::Provider(format!("Drive API error {status}: {text}")));
        }

        resp.json().await
            .map_err(|e| DriveWatchError::Provider(format!("Invalid Drive response: {e}")))
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveProvider {
    fn name(&self) -> &str { "gdrive" }

    async fn list_children(&self, parent_id: &str, filter: ListFilter) -> Result<Vec<DriveItem>> {
        let query = build_query(parent_id, filter);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let body = self.fetch_page(parent_id, &query, page_token.as_deref()).await?;
            let (mut page, next) = parse_file_list(&body);
            items.append(&mut page);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Drive listed {} children of {parent_id}", items.len());
        Ok(items)
    }
}

/// Build the `q` expression for a parent's children.
pub fn build_query(parent_id: &str, filter: ListFilter) -> String {
    let escaped = parent_id.replace('\\', "\\\\").replace('\'', "\\'");
    let mut query = format!("'{escaped}' in parents and trashed=false");
    if filter == ListFilter::FoldersOnly {
        query.push_str(&format!(" and mimeType='{FOLDER_MIME}'"));
    }
    query
}

/// Extract items and the next page token from a `files.list` body.
/// Entries without an id or name are skipped.
pub fn parse_file_list(body: &serde_json::Value) -> (Vec<DriveItem>, Option<String>) {
    let items = body["files"].as_array()
        .map(|files| {
            files.iter().filter_map(|f| {
                let kind = if f["mimeType"].as_str() == Some(FOLDER_MIME) {
                    NodeKind::Folder
                } else {
                    NodeKind::File
                };
                // Drive reports size as a decimal string.
                let size = f["size"].as_str()
                    .and_then(|s| s.parse::<u64>().ok())
                    .or_else(|| f["size"].as_u64());
                Some(DriveItem {
                    id: f["id"].as_str()?.to_string(),
                    name: f["name"].as_str()?.to_string(),
                    kind,
                    size: if kind == NodeKind::File { size } else { None },
                })
            }).collect()
        })
        .unwrap_or_default();

    let next = body["nextPageToken"].as_str()
        .filter(|t| !t.is_empty())
        .map(String::from);
    (items, next)
}
