use serde::{Deserialize, Serialize};

/// Display name given to every newly added person.
pub const DEFAULT_NAME: &str = "Unknown";

/// A named record pointing to a photo in the [`PhotoStore`](crate::PhotoStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Persistence key. Callers address people by grid position, not by id.
    pub id: String,
    pub name: String,
    /// Filename of the JPEG inside the photo directory.
    pub image: String,
    pub created_at: String,
}

impl Person {
    /// Create a person named [`DEFAULT_NAME`] for a freshly stored image.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: DEFAULT_NAME.to_string(),
            image: image.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
