//! Shared data structures for the catalog state
//!
//! These structs represent the rows read from the library database
//! and handed to the migration.

/// A film roll: one folder tracked by the photo library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmRoll {
    /// Unique database ID
    pub id: i64,
    /// Folder path as stored (e.g., "/home/joe/photos/2020")
    pub folder: String,
}

impl FilmRoll {
    pub fn new(id: i64, folder: impl Into<String>) -> Self {
        Self {
            id,
            folder: folder.into(),
        }
    }
}
