use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An uploaded document and the text extracted from it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub text: String,
    pub content_sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new_document(filename: &str, raw: &[u8], text: String) -> Self {
        Document {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            text,
            content_sha256: format!("{:x}", Sha256::digest(raw)),
            uploaded_at: Utc::now(),
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.filename.to_lowercase().contains(&query) || self.text.to_lowercase().contains(&query)
    }
}
