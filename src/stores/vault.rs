//! Document vault (read-only seed; uploads are simulated)

use crate::models::{Document, DocumentKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVault {
    documents: Vec<Document>,
}

impl DocumentVault {
    pub fn seeded() -> Self {
        let document = |id: &str, name: &str, kind, date_added: &str, size: &str| Document {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            date_added: date_added.to_string(),
            size: size.to_string(),
        };

        Self {
            documents: vec![
                document("1", "Cédula de Identidad", DocumentKind::Id, "15 Mar 2024", "2.1 MB"),
                document(
                    "2",
                    "Seguro Médico FONASA",
                    DocumentKind::Insurance,
                    "10 Mar 2024",
                    "1.8 MB",
                ),
                document(
                    "3",
                    "Lista de Medicamentos",
                    DocumentKind::Medication,
                    "8 Mar 2024",
                    "0.5 MB",
                ),
                document(
                    "4",
                    "Contactos de Emergencia",
                    DocumentKind::Emergency,
                    "5 Mar 2024",
                    "0.3 MB",
                ),
            ],
        }
    }

    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    pub fn by_kind(&self, kind: DocumentKind) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(move |d| d.kind == kind)
    }
}

impl Default for DocumentVault {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_contains_one_document_per_listed_kind() {
        let vault = DocumentVault::seeded();
        assert_eq!(vault.all().len(), 4);
        assert_eq!(vault.by_kind(DocumentKind::Insurance).count(), 1);
        assert_eq!(vault.by_kind(DocumentKind::Medical).count(), 0);
    }
}
