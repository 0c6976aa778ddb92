//! # Phenoflow Core
//!
//! Phenotype operations over a [`phenoflow_store::ContentStore`]: every
//! phenotype is one repository holding a README, a LICENSE and its workflow
//! documents.
//!
//! ```text
//! Phenoflow (service facade)
//!     ├──> PhenotypeOrchestrator   create / delete, with compensation
//!     ├──> StepResolver            step number -> document -> description / code
//!     ├──> AuthorGate              creator check via commit history
//!     └──> ContentTreeWalker       repository tree -> flat file list
//! ```

pub mod documents;
mod error;
mod gate;
mod orchestrator;
pub mod seed;
mod service;
mod steps;
mod walker;

#[cfg(test)]
mod test_support;

pub use error::{CoreError, ErrorKind, Result};
pub use gate::AuthorGate;
pub use orchestrator::PhenotypeOrchestrator;
pub use service::{FileView, Phenoflow, ServiceConfig, DEFAULT_KEEP_REPOSITORY};
pub use steps::{implementation_names, workflow_path, StepNumber, StepResolver};
pub use walker::ContentTreeWalker;
