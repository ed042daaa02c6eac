#![forbid(unsafe_code)]

//! Core domain model and business logic for the coachgen session generator.
//!
//! This crate provides:
//! - Domain types (exercises, requests, blocks, sessions, warnings)
//! - Exercise and template catalogs
//! - The generation pipeline (filter, planner, selector, prescription, assembler)
//! - Persistence (JSONL session store, snapshots, CSV export, client exclusions)
//! - Configuration and logging

pub mod types;
pub mod error;
pub mod catalog;
pub mod templates;
pub mod config;
pub mod logging;
pub mod filter;
pub mod planner;
pub mod selector;
pub mod prescription;
pub mod assembler;
pub mod engine;
pub mod exclusions;
pub mod store;
pub mod snapshot;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use templates::{get_default_templates, Template, TemplateCatalog};
pub use config::Config;
pub use engine::{generate_session, generate_session_with_limit, validate_request};
pub use exclusions::load_client_exclusions;
pub use store::{JsonlSessionStore, SessionStore};
pub use snapshot::{load_session, save_session};
pub use export::sessions_to_csv;
