// lib.rs - fastaval library root

//! # fastaval - Streaming validator and fixer for large protein FASTA files
//!
//! This library checks protein FASTA files record by record without loading
//! them into memory, and can write a repaired copy with protein names fixed
//! and duplicate names or sequences resolved.
//!
//! ## Features
//!
//! - **Streaming parser**: single pass, bounded line buffers, cooperative abort
//! - **Rule engine**: configurable regex rules for headers, names, descriptions and residues
//! - **Duplicate detection**: sequence hashing (SHA-1, SHA-256, MD5) over sharded indices
//! - **Fixed FASTA output**: name truncation, renaming, rewrapping, two-pass consolidation
//! - **Preload workflow**: external-sort keep lists for files too large to hash in memory
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use fastaval::prelude::*;
//!
//! let mut options = ValidatorOptions::default();
//! options.fixed.generate = true;
//! options.fixed.consolidate_duplicate_sequences = true;
//!
//! let validator = FastaValidator::with_default_rules(options)?;
//! let report = validator.validate_file(std::path::Path::new("proteins.fasta"))?;
//! println!(
//!     "{} proteins, {} errors, {} warnings",
//!     report.summary.protein_count,
//!     report.error_count(),
//!     report.warning_count()
//! );
//! # Ok::<(), fastaval::FastaError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod hashers;
pub mod index;
pub mod output;
pub mod preload;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{FastaValidator, ValidationReport, ValidatorOptions};
    pub use crate::core::{FixedFastaOptions, OutputOptions, ParseSummary};
    pub use crate::core::{RuleDefinition, RuleDefinitions, RuleSet};
    pub use crate::data::{MessageCode, MessageLog, ProteinHashRecord};
    pub use crate::error::{FastaError, Result};
    pub use crate::hashers::{HasherRegistry, Md5Hasher, SequenceHasher, Sha1Hasher, Sha256Hasher};
    pub use crate::output::report_messages;
}

// Re-export main types at the root level for convenience
pub use crate::cli::{Args, ValidationResult};
pub use crate::core::{FastaValidator, ValidationReport, ValidatorOptions};
pub use crate::data::{MessageCode, MessageLog};
pub use crate::error::{FastaError, Result};
pub use crate::hashers::{HasherRegistry, SequenceHasher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "fastaval v{} - Streaming validator and fixer for protein FASTA files",
        VERSION
    )
}
