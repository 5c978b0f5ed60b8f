//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `sqlite`: SQLite for patient and history storage
//! - `llm`: chat-completions client for narratives and image findings
//! - `tabular`: CSV/XLSX import
//! - `sanitize`: PII filtering for logs

pub mod llm;
pub mod sanitize;
pub mod sqlite;
pub mod tabular;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
