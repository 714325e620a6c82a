//! Catsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Category`, `Mark`, `Product` and its owned child records,
//!   plus the project-level configuration rows
//! - **Payload schema** - explicit required-field validation for every incoming record kind
//! - **Change report** - structured change records rendered to text only at the boundary
//! - **Port definitions** - Traits for adapters: `ISnapshotSource`, `ICatalogStore`, `IRunLog`
//!
//! # Architecture
//!
//! The domain module has no I/O. Ports define the trait interfaces that the
//! adapter crates (`catsync-cache`, `catsync-remote`, `catsync-audit`) implement,
//! and the reconciliation engine in `catsync-sync` drives them.

pub mod config;
pub mod domain;
pub mod ports;
