//! Read-only document metadata, built once from the loaded corpus.

use std::collections::HashMap;

use ragchat_core::types::{Document, DocumentMetadata};

/// Metadata for every corpus document, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadataStore {
    entries: Vec<DocumentMetadata>,
    positions: HashMap<String, usize>,
}

impl DocumentMetadataStore {
    /// Build the store in corpus load order.
    ///
    /// A file name seen more than once keeps the position of its first
    /// occurrence and the metadata of its last.
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut store = Self::default();
        for doc in documents {
            let name = doc.id().to_string();
            match store.positions.get(&name) {
                Some(&pos) => store.entries[pos] = doc.metadata.clone(),
                None => {
                    store.positions.insert(name, store.entries.len());
                    store.entries.push(doc.metadata.clone());
                }
            }
        }
        store
    }

    pub fn list(&self) -> &[DocumentMetadata] {
        &self.entries
    }

    pub fn get(&self, file_name: &str) -> Option<&DocumentMetadata> {
        self.positions.get(file_name).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(meta: DocumentMetadata) -> Document {
        Document::new("text", meta)
    }

    #[test]
    fn test_list_preserves_load_order() {
        let store = DocumentMetadataStore::from_documents(&[
            doc(DocumentMetadata::new("b.pdf")),
            doc(DocumentMetadata::new("a.pdf")),
        ]);
        let names: Vec<&str> = store.list().iter().map(|m| m.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get() {
        let store = DocumentMetadataStore::from_documents(&[doc(
            DocumentMetadata::new("test_doc.pdf")
                .with_title("Test Document")
                .with_author("Test Author")
                .with_date("2025-01-01"),
        )]);

        let meta = store.get("test_doc.pdf").unwrap();
        assert_eq!(meta.title.as_deref(), Some("Test Document"));
        assert!(store.get("missing.pdf").is_none());
    }

    #[test]
    fn test_duplicate_file_names_collapse() {
        let store = DocumentMetadataStore::from_documents(&[
            doc(DocumentMetadata::new("a.pdf").with_title("Page 1")),
            doc(DocumentMetadata::new("b.pdf")),
            doc(DocumentMetadata::new("a.pdf").with_title("Page 2")),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].file_name, "a.pdf");
        assert_eq!(store.list()[0].title.as_deref(), Some("Page 2"));
        assert_eq!(store.list()[1].file_name, "b.pdf");
    }

    #[test]
    fn test_empty_corpus() {
        let store = DocumentMetadataStore::from_documents(&[]);
        assert!(store.is_empty());
        assert!(store.list().is_empty());
    }
}
