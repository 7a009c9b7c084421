use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::Document,
};

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Document>>;
    async fn create(&self, document: Document) -> AppResult<Document>;
    /// Newest first. `query` filters on filename or text.
    async fn list(
        &self,
        offset: usize,
        limit: usize,
        query: Option<&str>,
    ) -> AppResult<(Vec<Document>, usize)>;
}

#[derive(Default, Clone)]
pub struct InMemoryDocumentRepository {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents.get(id).cloned())
    }

    async fn create(&self, document: Document) -> AppResult<Document> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(AppError::AlreadyExists(format!(
                "Document with id '{}' already exists",
                document.id
            )));
        }

        documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn list(
        &self,
        offset: usize,
        limit: usize,
        query: Option<&str>,
    ) -> AppResult<(Vec<Document>, usize)> {
        let documents = self.documents.read().await;
        let mut items: Vec<_> = documents
            .values()
            .filter(|d| query.map_or(true, |q| d.matches(q)))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = items.len();
        let page = items.into_iter().skip(offset).take(limit).collect();

        Ok((page, total))
    }
}
