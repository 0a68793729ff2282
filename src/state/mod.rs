//! Catalog state
//!
//! This module handles the photo library database, including:
//! - Database connections, scans and folder updates (library.rs)
//! - Shared data structures (data.rs)

pub mod data;
pub mod library;

pub use data::FilmRoll;
pub use library::Library;
