//! Relocate a photo library by rewriting the film roll folders stored in
//! its SQLite catalog.
//!
//! [`convert`] holds the pure path rewriting, [`migrate`] runs it against a
//! [`state::Library`].

pub mod cli;
pub mod convert;
pub mod error;
pub mod migrate;
pub mod state;

pub use convert::{ConversionConfig, Direction, PrefixMapping};
pub use error::{ConfigError, MigrateError};
pub use migrate::{MigrationOptions, MigrationSummary};
