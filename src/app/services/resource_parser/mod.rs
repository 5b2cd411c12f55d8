//! Resource CSV parser
//!
//! Turns resource listing CSV files into validated [`ResourceRecord`]s. Every
//! file must have a header whose names are record attributes or configured
//! extras; every data row is normalized against closed enum vocabularies and a
//! category vocabulary fetched from the API at session start.
//!
//! ## Architecture
//!
//! - [`parser`] - Session lifecycle and concurrent per-file orchestration
//! - [`header`] - Header name validation
//! - [`record_parser`] - Row to record normalization
//! - [`field_parsers`] - Scalar, enum, list-enum and grade field helpers
//! - [`category`] - Compound category/subcategory validation
//! - [`stats`] - Per-file outcomes and run totals
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use resource_ingest::app::services::resource_parser::ParseSession;
//! use resource_ingest::VocabularySnapshot;
//!
//! # async fn example() -> resource_ingest::Result<()> {
//! let vocabulary = VocabularySnapshot::new(["Tutoring"], ["Math"]);
//! let mut session = ParseSession::new(BTreeSet::from(["GRADELEVEL".to_string()]));
//! session.load_vocabulary(&vocabulary).await?;
//! session.add_files(["resources.csv".into()]);
//!
//! let rows = session.parse_all().await?;
//! println!("Parsed {} resources", rows);
//! # Ok(())
//! # }
//! ```
//!
//! [`ResourceRecord`]: crate::app::models::ResourceRecord

pub mod category;
pub mod field_parsers;
pub mod header;
pub mod parser;
pub mod record_parser;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use parser::{ParseSession, SessionState};
pub use record_parser::normalize_row;
pub use stats::{FileOutcome, ParseStats};
