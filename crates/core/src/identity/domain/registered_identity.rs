use crate::shared::embedding::Embedding;

/// A known person: caller-chosen label plus reference embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisteredIdentity {
    label: String,
    embedding: Embedding,
}

impl RegisteredIdentity {
    pub fn new(label: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            label: label.into(),
            embedding,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }
}
