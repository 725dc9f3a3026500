use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::models::{Document, KnowledgeError, KnowledgeStats, ScoredDocument};
use crate::services::loader::seed_documents;
use crate::services::similarity::{rank, render_context};

/// In-memory document store backed by a JSON file.
///
/// Queries take the read lock; upserts and clears take the write lock and
/// rewrite the file before releasing it.
pub struct KnowledgeBase {
    documents: RwLock<Vec<Document>>,
    path: PathBuf,
}

impl KnowledgeBase {
    /// Loads the persisted store at `path`, seeding from `data_dir` when it is missing or empty.
    pub fn open(path: impl Into<PathBuf>, data_dir: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let path = path.into();
        let mut documents = read_store(&path);

        if documents.is_empty() {
            documents = seed_documents(data_dir.as_ref());
            write_store(&path, &documents)?;
        }

        info!("Knowledge base ready with {} documents", documents.len());

        Ok(Self {
            documents: RwLock::new(documents),
            path,
        })
    }

    /// Store with the given documents that persists to `path`; nothing is read from disk.
    pub fn with_documents(path: impl Into<PathBuf>, documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
            path: path.into(),
        }
    }

    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, k: usize) -> Vec<ScoredDocument> {
        let documents = self.documents.read().await;
        rank(&documents, text, k)
    }

    pub async fn augmented_context(&self, text: &str, k: usize) -> String {
        render_context(&self.query(text, k).await)
    }

    /// Inserts a document or, when `id` already exists, replaces its content and category.
    ///
    /// The change becomes visible to queries only once the file has been rewritten.
    #[instrument(skip(self, content))]
    pub async fn add_document(&self, id: &str, content: &str, category: &str) -> Result<(), KnowledgeError> {
        let mut documents = self.documents.write().await;

        let mut updated = documents.clone();
        match updated.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => {
                existing.content = content.to_string();
                existing.category = category.to_string();
            }
            None => updated.push(Document::new(id, content, category)),
        }

        persist(&self.path, &updated).await?;
        *documents = updated;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), KnowledgeError> {
        let mut documents = self.documents.write().await;
        persist(&self.path, &[]).await?;
        documents.clear();
        Ok(())
    }

    pub async fn stats(&self) -> KnowledgeStats {
        let documents = self.documents.read().await;

        let mut categories = Map::new();
        for doc in documents.iter() {
            let seen = categories.get(&doc.category).and_then(Value::as_u64).unwrap_or(0);
            categories.insert(doc.category.clone(), Value::from(seen + 1));
        }

        KnowledgeStats {
            total_documents: documents.len(),
            categories,
            database_path: self.path.display().to_string(),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn read_store(path: &Path) -> Vec<Document> {
    if !path.exists() {
        return Vec::new();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(KnowledgeError::from)
        .and_then(|raw| serde_json::from_str::<Vec<Document>>(&raw).map_err(KnowledgeError::from));

    match parsed {
        Ok(documents) => {
            info!("Loaded {} documents from {}", documents.len(), path.display());
            documents
        }
        Err(e) => {
            error!("Error loading documents from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn write_store(path: &Path, documents: &[Document]) -> Result<(), KnowledgeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(documents)?)?;
    Ok(())
}

async fn persist(path: &Path, documents: &[Document]) -> Result<(), KnowledgeError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(documents)?).await?;
    Ok(())
}
