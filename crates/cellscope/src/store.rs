//! Document store

use crate::document::{DocumentKind, IndexedDocument};
use ahash::AHashMap;

/// In-memory document store keyed by document id
///
/// Documents are kept in insertion order so that ranking ties resolve the
/// same way on every run. Re-inserting an id replaces the stored document
/// in place and keeps its original position.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    /// All documents, in first-insertion order
    documents: Vec<IndexedDocument>,
    /// id -> position in `documents`
    index_map: AHashMap<String, usize>,
}

/// Document counts, split by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct IndexStats {
    pub total_documents: usize,
    pub cells: usize,
    pub ranges: usize,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document; returns `true` if the id was new
    pub fn upsert(&mut self, document: IndexedDocument) -> bool {
        if let Some(&idx) = self.index_map.get(document.id()) {
            self.documents[idx] = document;
            return false;
        }

        let idx = self.documents.len();
        self.index_map.insert(document.id().to_string(), idx);
        self.documents.push(document);
        true
    }

    /// Get a document by id
    pub fn get(&self, id: &str) -> Option<&IndexedDocument> {
        self.index_map.get(id).map(|&idx| &self.documents[idx])
    }

    /// Whether a document with this id is stored
    pub fn contains(&self, id: &str) -> bool {
        self.index_map.contains_key(id)
    }

    /// Iterate documents in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &IndexedDocument> {
        self.documents.iter()
    }

    /// Documents as a slice, in insertion order
    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    /// Get the number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Remove every document
    pub fn clear(&mut self) {
        self.documents.clear();
        self.index_map.clear();
    }

    /// Counts by kind
    pub fn stats(&self) -> IndexStats {
        let cells = self
            .documents
            .iter()
            .filter(|d| d.kind() == DocumentKind::Cell)
            .count();
        IndexStats {
            total_documents: self.documents.len(),
            cells,
            ranges: self.documents.len() - cells,
        }
    }
}
