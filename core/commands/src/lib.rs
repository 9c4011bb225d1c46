//! helm-commands - the Command Catalog & Executor (§4.4).
//!
//! Owns the closed-set command catalog: registering handlers, validating and
//! dispatching one [`helm_protocol::Command`] at a time, capping and
//! stopping a per-step command sequence, classifying raw automation errors
//! into retryable/non-retryable categories, and masking sensitive values in
//! returned results. The browser driver, DOM renderer, and model-provider
//! HTTP client this crate calls through are out of scope; [`collaborators`]
//! is the seam those implementations plug into.
//!
//! # Module Structure
//!
//! - [`builtin`] - the built-in handler for every closed-set command
//! - [`catalog`] - the handler registry, validation, and dispatch
//! - [`classification`] - the raw-error pattern table
//! - [`collaborators`] - the Browser/PageAnalyzer/FileAccess consumed contracts
//! - [`context`] - `ExecutionContext`, the per-dispatch handler environment
//! - [`error`] - catalog-level errors (unknown command, schema violation, ...)
//! - [`handler`] - the `CommandHandler` trait
//! - [`sequence`] - per-step sequence execution, masking, and the stop rule

pub mod builtin;
pub mod catalog;
pub mod classification;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod handler;
pub mod sequence;

pub use builtin::default_catalog;
pub use catalog::CommandCatalog;
pub use classification::ClassifiedError;
pub use classification::ErrorCategory;
pub use classification::classify;
pub use collaborators::BrowserCollaborator;
pub use collaborators::BrowserState;
pub use collaborators::CdpHandle;
pub use collaborators::ElementCandidate;
pub use collaborators::FileAccess;
pub use collaborators::PageAnalysis;
pub use collaborators::PageAnalyzer;
pub use collaborators::PageHandle;
pub use collaborators::Screenshot;
pub use collaborators::ScrollPosition;
pub use context::ExecutionContext;
pub use error::CommandError;
pub use error::Result;
pub use handler::CommandHandler;
pub use sequence::execute_sequence;
