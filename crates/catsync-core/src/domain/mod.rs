//! Domain entities and business logic
//!
//! This module contains the core domain types for the catalog sync service:
//! - Catalog entities (categories, marks, products, project configuration rows)
//! - Product-owned child records and the many-to-many link kinds
//! - Payload schema validation for incoming snapshot records
//! - Field-level diffing between stored and incoming records
//! - The structured change report produced by every sync run
//! - Domain-specific error types

pub mod catalog;
pub mod children;
pub mod diff;
pub mod errors;
pub mod payload;
pub mod report;
pub mod snapshot;

// Re-export commonly used types
pub use catalog::{
    Category, Mark, Product, ProductView, ProjectAction, ProjectBadge, ProjectJsonConfig,
    ProjectParameter,
};
pub use children::{
    ChildKind, ChildRecord, ExcludedCombination, ImportanceItem, LinkKind, ProductColor,
    ProductExtra, ProductImage, ProductParameter, ProductReview, ProductVideo,
};
pub use diff::{FieldChange, FieldDiff};
pub use errors::{DomainError, FetchError, RecordError};
pub use payload::{IncomingProduct, IncomingRecord};
pub use report::{
    ChangeKind, ChangeRecord, EntityKind, EntityRef, RunOutcome, Section, SectionOutcome,
    SectionReport, SyncPhase, SyncReport, ALL_GREEN,
};
pub use snapshot::{Selector, Snapshot};
