//! Remote document source: capability trait and the Feishu Open API client
//!
//! The traversal/download engine consumes the [`DocumentSource`] trait rather
//! than a concrete client, so tests drive it with in-memory fixtures and the
//! binary plugs in [`FeishuClient`].

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::{FeishuConfig, RetryConfig};
use crate::error::{ApiError, Error, Result};
use crate::markdown::DocxBlock;
use crate::retry::with_retry;
use crate::types::{DocxDocument, DriveEntry, ResolvedNode, WikiNode};

/// A fetched document: metadata plus its structured content blocks
#[derive(Clone, Debug)]
pub struct DocumentContent {
    /// Document metadata (id, title, revision)
    pub document: DocxDocument,
    /// Content blocks in document order
    pub blocks: Vec<DocxBlock>,
}

/// Capability contract consumed by the traversal/download engine
///
/// Mirrors the remote API's failure surface: each method fails with the
/// corresponding [`ApiError`] variant wrapped in [`Error::Api`].
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// List the immediate children of a drive folder
    async fn list_folder(&self, folder_token: &str) -> Result<Vec<DriveEntry>>;

    /// List the immediate child nodes of a wiki space node
    /// (`parent_node_token = None` lists the space root)
    async fn list_wiki_nodes(
        &self,
        space_id: &str,
        parent_node_token: Option<&str>,
    ) -> Result<Vec<WikiNode>>;

    /// Resolve a wiki node token to its underlying object
    async fn resolve_wiki_node(&self, node_token: &str) -> Result<ResolvedNode>;

    /// Fetch a wiki space's display name
    async fn wiki_name(&self, space_id: &str) -> Result<String>;

    /// Fetch a document's metadata and structured content
    async fn fetch_document(&self, doc_token: &str) -> Result<DocumentContent>;

    /// Download a binary asset into `target_dir`, returning the written path
    async fn download_asset(&self, token: &str, target_dir: &Path) -> Result<PathBuf>;
}

/// Safety margin subtracted from a token's reported lifetime
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Page size for drive folder listings
const FOLDER_PAGE_SIZE: usize = 200;

/// Page size for wiki node listings
const WIKI_PAGE_SIZE: usize = 50;

/// Page size for document block listings
const BLOCK_PAGE_SIZE: usize = 500;

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Production [`DocumentSource`] backed by the Feishu Open API
///
/// Holds a cached tenant access token, refreshed shortly before expiry.
/// Transient failures are retried per the configured [`RetryConfig`].
pub struct FeishuClient {
    http: reqwest::Client,
    config: FeishuConfig,
    retry: RetryConfig,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: u64,
}

#[derive(Deserialize)]
struct FileListData {
    #[serde(default)]
    files: Vec<DriveEntry>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct NodeListData {
    #[serde(default)]
    items: Vec<WikiNode>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Deserialize)]
struct GetNodeData {
    node: WikiNode,
}

#[derive(Deserialize)]
struct SpaceData {
    space: SpaceInfo,
}

#[derive(Deserialize)]
struct SpaceInfo {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct DocumentData {
    document: DocxDocument,
}

#[derive(Deserialize)]
struct BlockListData {
    #[serde(default)]
    items: Vec<DocxBlock>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    page_token: Option<String>,
}

impl FeishuClient {
    /// Create a client from API credentials and retry configuration
    pub fn new(config: FeishuConfig, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            retry,
            token: RwLock::new(None),
        }
    }

    /// Get a valid tenant access token, refreshing the cache if needed
    async fn tenant_token(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.value.clone());
                }
            }
        }

        let url = format!(
            "{}/open-apis/auth/v3/tenant_access_token/internal",
            self.config.base_url
        );
        let body = serde_json::json!({
            "app_id": self.config.app_id,
            "app_secret": self.config.app_secret,
        });

        let response: TokenResponse = with_retry(&self.retry, || async {
            let resp = self.http.post(&url).json(&body).send().await?;
            Ok::<_, Error>(resp.json().await?)
        })
        .await?;

        if response.code != 0 {
            return Err(ApiError::Auth {
                code: response.code,
                message: response.msg,
            }
            .into());
        }

        let expires_at = Instant::now() + Duration::from_secs(response.expire)
            - TOKEN_EXPIRY_MARGIN.min(Duration::from_secs(response.expire));
        let mut cached = self.token.write().await;
        *cached = Some(CachedToken {
            value: response.tenant_access_token.clone(),
            expires_at,
        });
        Ok(response.tenant_access_token)
    }

    /// GET a JSON endpoint with auth and retry, unwrapping the API envelope
    async fn get_data<T, F>(&self, path: &str, query: &[(&str, String)], map_err: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(i64, String) -> ApiError,
    {
        let token = self.tenant_token().await?;
        let url = format!("{}{}", self.config.base_url, path);

        let envelope: Envelope<T> = with_retry(&self.retry, || async {
            let resp = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(&token)
                .send()
                .await?;
            Ok::<_, Error>(resp.json().await?)
        })
        .await?;

        if envelope.code != 0 {
            return Err(map_err(envelope.code, envelope.msg).into());
        }
        envelope
            .data
            .ok_or_else(|| map_err(0, "response carried no data".to_string()).into())
    }
}

#[async_trait]
impl DocumentSource for FeishuClient {
    async fn list_folder(&self, folder_token: &str) -> Result<Vec<DriveEntry>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("folder_token", folder_token.to_string()),
                ("page_size", FOLDER_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let data: FileListData = self
                .get_data("/open-apis/drive/v1/files", &query, |code, message| {
                    ApiError::List {
                        token: folder_token.to_string(),
                        code,
                        message,
                    }
                })
                .await?;

            entries.extend(data.files);
            match (data.has_more, data.next_page_token) {
                (true, Some(next)) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn list_wiki_nodes(
        &self,
        space_id: &str,
        parent_node_token: Option<&str>,
    ) -> Result<Vec<WikiNode>> {
        let path = format!("/open-apis/wiki/v2/spaces/{}/nodes", space_id);
        let list_token = parent_node_token.unwrap_or(space_id).to_string();
        let mut nodes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("page_size", WIKI_PAGE_SIZE.to_string())];
            if let Some(parent) = parent_node_token {
                query.push(("parent_node_token", parent.to_string()));
            }
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let data: NodeListData = self
                .get_data(&path, &query, |code, message| ApiError::List {
                    token: list_token.clone(),
                    code,
                    message,
                })
                .await?;

            nodes.extend(data.items);
            match (data.has_more, data.page_token) {
                (true, Some(next)) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(nodes)
    }

    async fn resolve_wiki_node(&self, node_token: &str) -> Result<ResolvedNode> {
        let query = vec![("token", node_token.to_string())];
        let data: GetNodeData = self
            .get_data(
                "/open-apis/wiki/v2/spaces/get_node",
                &query,
                |code, message| ApiError::Resolve {
                    token: node_token.to_string(),
                    code,
                    message,
                },
            )
            .await?;
        Ok(ResolvedNode {
            obj_type: data.node.obj_type,
            obj_token: data.node.obj_token,
        })
    }

    async fn wiki_name(&self, space_id: &str) -> Result<String> {
        let path = format!("/open-apis/wiki/v2/spaces/{}", space_id);
        let data: SpaceData = self
            .get_data(&path, &[], |code, message| ApiError::List {
                token: space_id.to_string(),
                code,
                message,
            })
            .await?;
        Ok(data.space.name)
    }

    async fn fetch_document(&self, doc_token: &str) -> Result<DocumentContent> {
        let meta_path = format!("/open-apis/docx/v1/documents/{}", doc_token);
        let data: DocumentData = self
            .get_data(&meta_path, &[], |code, message| ApiError::Fetch {
                token: doc_token.to_string(),
                code,
                message,
            })
            .await?;
        let document = data.document;

        let blocks_path = format!("/open-apis/docx/v1/documents/{}/blocks", doc_token);
        let mut blocks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("page_size", BLOCK_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let data: BlockListData = self
                .get_data(&blocks_path, &query, |code, message| ApiError::Fetch {
                    token: doc_token.to_string(),
                    code,
                    message,
                })
                .await?;

            blocks.extend(data.items);
            match (data.has_more, data.page_token) {
                (true, Some(next)) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(DocumentContent { document, blocks })
    }

    async fn download_asset(&self, token: &str, target_dir: &Path) -> Result<PathBuf> {
        let auth = self.tenant_token().await?;
        let url = format!(
            "{}/open-apis/drive/v1/medias/{}/download",
            self.config.base_url, token
        );

        let response = with_retry(&self.retry, || async {
            let resp = self.http.get(&url).bearer_auth(&auth).send().await?;
            Ok::<_, Error>(resp)
        })
        .await?;

        if !response.status().is_success() {
            return Err(ApiError::Asset {
                token: token.to_string(),
                code: response.status().as_u16() as i64,
                message: format!("download returned HTTP {}", response.status()),
            }
            .into());
        }

        let extension = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(extension_for)
            .unwrap_or("bin");
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(target_dir).await?;
        let file_path = target_dir.join(format!("{}.{}", token, extension));
        tokio::fs::write(&file_path, &bytes).await?;

        tracing::debug!(token = token, path = %file_path.display(), size = bytes.len(), "Asset downloaded");
        Ok(file_path)
    }
}

/// Map an asset's content type to a file extension
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        t if t.starts_with("image/png") => "png",
        t if t.starts_with("image/jpeg") => "jpg",
        t if t.starts_with("image/gif") => "gif",
        t if t.starts_with("image/webp") => "webp",
        t if t.starts_with("image/svg") => "svg",
        _ => "bin",
    }
}
