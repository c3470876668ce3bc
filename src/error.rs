// error.rs - Error types shared by the library and the CLI

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures that stop an operation.
///
/// Content problems found inside a FASTA file (bad residues, duplicate names,
/// missing headers) are not errors at this level: they are recorded as
/// messages and reported through [`crate::core::ParseSummary`].
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid rule '{pattern}': {message}")]
    InvalidRule { pattern: String, message: String },

    #[error("Index error: {message}")]
    Index { message: String },

    #[error("External sort failed: {message}")]
    ExternalSort { message: String },

    #[error("Malformed hash file '{}' (line {line}): {message}", path.display())]
    HashFile {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),
}

impl FastaError {
    pub fn io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn index<S: Into<String>>(message: S) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    pub fn external_sort<S: Into<String>>(message: S) -> Self {
        Self::ExternalSort {
            message: message.into(),
        }
    }

    pub fn hash_file<P: AsRef<Path>, S: Into<String>>(path: P, line: usize, message: S) -> Self {
        Self::HashFile {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// True for errors raised before any input file is touched
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FastaError::Configuration { .. } | FastaError::InvalidRule { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FastaError>;
