//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (storage, language models).

mod narrative;
mod storage;

pub use narrative::{ImageInterpreter, NarrativeError, NarrativeGenerator, NarrativeRequest};
pub use storage::{
    CountBucket, GroupField, Page, Paging, PatientFilter, Storage, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
