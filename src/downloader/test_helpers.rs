//! Shared test helpers: an in-memory document source fixture.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::client::{DocumentContent, DocumentSource};
use crate::error::{ApiError, Result};
use crate::markdown::{DocxBlock, ImageBlock, TextBlock, TextElement, TextRun};
use crate::types::{DocxDocument, DriveEntry, DriveEntryType, ObjType, ResolvedNode, WikiNode};

/// Key used for a wiki space's root level in [`MockSource::add_wiki_level`]
pub(crate) const ROOT: &str = "";

/// In-memory [`DocumentSource`] with failure injection and concurrency
/// observation, for driving the batch machinery without a network.
#[derive(Default)]
pub(crate) struct MockSource {
    folders: HashMap<String, Vec<DriveEntry>>,
    wiki_children: HashMap<String, Vec<WikiNode>>,
    wiki_names: HashMap<String, String>,
    resolved: HashMap<String, ResolvedNode>,
    documents: HashMap<String, DocumentContent>,
    failing_docs: HashSet<String>,
    failing_lists: HashSet<String>,
    fetch_delay: Duration,
    active_fetches: AtomicUsize,
    max_active_fetches: AtomicUsize,
}

impl MockSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a folder's immediate entries
    pub(crate) fn add_folder(&mut self, token: &str, entries: Vec<DriveEntry>) -> &mut Self {
        self.folders.insert(token.to_string(), entries);
        self
    }

    /// Register a wiki level: `parent` is a node token, or [`ROOT`]
    pub(crate) fn add_wiki_level(&mut self, parent: &str, nodes: Vec<WikiNode>) -> &mut Self {
        for node in &nodes {
            self.resolved.insert(
                node.node_token.clone(),
                ResolvedNode {
                    obj_type: node.obj_type,
                    obj_token: node.obj_token.clone(),
                },
            );
        }
        self.wiki_children.insert(parent.to_string(), nodes);
        self
    }

    pub(crate) fn set_wiki_name(&mut self, space_id: &str, name: &str) -> &mut Self {
        self.wiki_names
            .insert(space_id.to_string(), name.to_string());
        self
    }

    /// Register a docx document with a single paragraph of text
    pub(crate) fn add_document(&mut self, token: &str, title: &str, body: &str) -> &mut Self {
        self.documents
            .insert(token.to_string(), text_document(token, title, body));
        self
    }

    /// Register a docx document with explicit blocks
    pub(crate) fn add_document_blocks(
        &mut self,
        token: &str,
        title: &str,
        blocks: Vec<DocxBlock>,
    ) -> &mut Self {
        self.documents.insert(
            token.to_string(),
            DocumentContent {
                document: DocxDocument {
                    document_id: token.to_string(),
                    title: title.to_string(),
                    revision_id: 1,
                },
                blocks,
            },
        );
        self
    }

    /// Make fetching this document token fail deterministically
    pub(crate) fn fail_document(&mut self, token: &str) -> &mut Self {
        self.failing_docs.insert(token.to_string());
        self
    }

    /// Make listing this container token fail deterministically
    pub(crate) fn fail_listing(&mut self, token: &str) -> &mut Self {
        self.failing_lists.insert(token.to_string());
        self
    }

    /// Hold each document fetch open for `delay` (for concurrency tests)
    pub(crate) fn set_fetch_delay(&mut self, delay: Duration) -> &mut Self {
        self.fetch_delay = delay;
        self
    }

    /// Highest number of simultaneously active document fetches observed
    pub(crate) fn max_active_fetches(&self) -> usize {
        self.max_active_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn list_folder(&self, folder_token: &str) -> Result<Vec<DriveEntry>> {
        if self.failing_lists.contains(folder_token) {
            return Err(ApiError::List {
                token: folder_token.to_string(),
                code: 500,
                message: "injected listing failure".to_string(),
            }
            .into());
        }
        Ok(self.folders.get(folder_token).cloned().unwrap_or_default())
    }

    async fn list_wiki_nodes(
        &self,
        _space_id: &str,
        parent_node_token: Option<&str>,
    ) -> Result<Vec<WikiNode>> {
        let key = parent_node_token.unwrap_or(ROOT);
        if self.failing_lists.contains(key) {
            return Err(ApiError::List {
                token: key.to_string(),
                code: 500,
                message: "injected listing failure".to_string(),
            }
            .into());
        }
        Ok(self.wiki_children.get(key).cloned().unwrap_or_default())
    }

    async fn resolve_wiki_node(&self, node_token: &str) -> Result<ResolvedNode> {
        self.resolved.get(node_token).cloned().ok_or_else(|| {
            ApiError::Resolve {
                token: node_token.to_string(),
                code: 404,
                message: "unknown node".to_string(),
            }
            .into()
        })
    }

    async fn wiki_name(&self, space_id: &str) -> Result<String> {
        Ok(self.wiki_names.get(space_id).cloned().unwrap_or_default())
    }

    async fn fetch_document(&self, doc_token: &str) -> Result<DocumentContent> {
        let active = self.active_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_fetches.fetch_max(active, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        self.active_fetches.fetch_sub(1, Ordering::SeqCst);

        if self.failing_docs.contains(doc_token) {
            return Err(ApiError::Fetch {
                token: doc_token.to_string(),
                code: 500,
                message: "injected fetch failure".to_string(),
            }
            .into());
        }
        self.documents.get(doc_token).cloned().ok_or_else(|| {
            ApiError::Fetch {
                token: doc_token.to_string(),
                code: 404,
                message: "unknown document".to_string(),
            }
            .into()
        })
    }

    async fn download_asset(&self, token: &str, target_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(target_dir).await?;
        let path = target_dir.join(format!("{}.png", token));
        tokio::fs::write(&path, b"png-bytes").await?;
        Ok(path)
    }
}

/// A drive folder entry of document type
pub(crate) fn doc_entry(name: &str, token: &str) -> DriveEntry {
    DriveEntry {
        name: name.to_string(),
        token: token.to_string(),
        entry_type: DriveEntryType::Docx,
        url: format!("https://acme.feishu.cn/docx/{}", token),
    }
}

/// A drive folder entry of folder type
pub(crate) fn folder_entry(name: &str, token: &str) -> DriveEntry {
    DriveEntry {
        name: name.to_string(),
        token: token.to_string(),
        entry_type: DriveEntryType::Folder,
        url: format!("https://acme.feishu.cn/drive/folder/{}", token),
    }
}

/// A wiki node whose object is a docx document
pub(crate) fn doc_node(title: &str, node_token: &str, has_child: bool) -> WikiNode {
    WikiNode {
        title: title.to_string(),
        node_token: node_token.to_string(),
        obj_token: format!("obj-{}", node_token),
        obj_type: ObjType::Docx,
        has_child,
    }
}

/// A wiki node that only groups children
pub(crate) fn branch_node(title: &str, node_token: &str) -> WikiNode {
    WikiNode {
        title: title.to_string(),
        node_token: node_token.to_string(),
        obj_token: format!("obj-{}", node_token),
        obj_type: ObjType::Unknown,
        has_child: true,
    }
}

/// A one-paragraph docx document
pub(crate) fn text_document(token: &str, title: &str, body: &str) -> DocumentContent {
    DocumentContent {
        document: DocxDocument {
            document_id: token.to_string(),
            title: title.to_string(),
            revision_id: 1,
        },
        blocks: vec![paragraph(body)],
    }
}

/// A plain paragraph block
pub(crate) fn paragraph(content: &str) -> DocxBlock {
    DocxBlock {
        block_id: format!("blk-{}", content.len()),
        block_type: 2,
        text: Some(TextBlock {
            elements: vec![TextElement {
                text_run: Some(TextRun {
                    content: content.to_string(),
                    text_element_style: None,
                }),
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// An image block referencing an asset token
pub(crate) fn image_block(token: &str) -> DocxBlock {
    DocxBlock {
        block_id: format!("img-{}", token),
        block_type: 27,
        image: Some(ImageBlock {
            token: token.to_string(),
        }),
        ..Default::default()
    }
}
