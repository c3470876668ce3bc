// options.rs - Typed validator options

use crate::core::rules::RuleSettings;
use crate::error::{FastaError, Result};
use crate::hashers::{HasherRegistry, DEFAULT_HASHER};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options controlling the fixed FASTA file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedFastaOptions {
    /// Write `<name>_new.fasta`
    pub generate: bool,
    /// Rename duplicate names with `-b`, `-c`, ... suffixes
    pub rename_duplicate_names: bool,
    /// Keep duplicate names unless name and sequence both repeat
    pub keep_duplicate_names_unless_matching_sequence: bool,
    /// Merge proteins sharing a sequence into the first one (second pass)
    pub consolidate_duplicate_sequences: bool,
    /// Treat L and I as equal when hashing
    pub ignore_il_difference: bool,
    /// Move extra references after the first `source|organism|id` into the description
    pub split_multiple_refs_in_names: bool,
    /// Shorten names longer than the maximum length
    pub truncate_long_names: bool,
    /// Characters at which long names may be split
    pub long_name_split_chars: String,
    /// Replace characters not allowed in names with `_`
    pub replace_invalid_name_characters: bool,
    /// Drop residues that are not letters
    pub remove_invalid_residues: bool,
    /// Rewrap residues at `residues_per_line`; otherwise keep the original wrapping
    pub wrap_long_residue_lines: bool,
    pub residues_per_line: usize,
}

impl Default for FixedFastaOptions {
    fn default() -> Self {
        Self {
            generate: false,
            rename_duplicate_names: true,
            keep_duplicate_names_unless_matching_sequence: false,
            consolidate_duplicate_sequences: false,
            ignore_il_difference: false,
            split_multiple_refs_in_names: false,
            truncate_long_names: true,
            long_name_split_chars: "|".to_string(),
            replace_invalid_name_characters: true,
            remove_invalid_residues: false,
            wrap_long_residue_lines: true,
            residues_per_line: 60,
        }
    }
}

impl FixedFastaOptions {
    /// The fixed file needs a second pass
    pub fn needs_consolidation(&self) -> bool {
        self.generate
            && (self.consolidate_duplicate_sequences
                || self.keep_duplicate_names_unless_matching_sequence)
    }
}

/// Which reports are written and where
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Directory for generated files; the input's directory when unset
    pub output_directory: Option<PathBuf>,
    /// Write `<name>_ProteinHashes.txt`
    pub save_basic_hash_info: bool,
    /// Write `<name>_UniqueProteinSeqs.txt` (and the duplicates mapping file)
    pub save_unique_sequence_report: bool,
    /// Append messages to this tab-delimited file instead of printing them
    pub stats_file: Option<PathBuf>,
}

/// Everything a validation run needs to know; fixed for the whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    pub marker: char,
    pub min_protein_name_length: usize,
    pub max_protein_name_length: usize,
    pub max_residues_per_line: usize,
    pub allow_asterisk: bool,
    pub allow_dash: bool,
    pub allow_all_symbols_in_protein_names: bool,
    pub warn_blank_lines_between_proteins: bool,
    pub check_for_duplicate_names: bool,
    pub check_for_duplicate_sequences: bool,
    /// Append a missing final line terminator silently
    pub add_missing_linefeed: bool,
    /// Analyse a CRLF copy of the input
    pub normalize_line_endings: bool,
    /// Detail entries kept per message code
    pub max_detail_per_code: usize,
    pub hasher: String,
    /// Tab-delimited hash file used to build the preload keep list
    pub preload_hash_file: Option<PathBuf>,
    /// Lines between abort checks
    pub abort_check_interval: usize,
    pub fixed: FixedFastaOptions,
    pub output: OutputOptions,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            marker: '>',
            min_protein_name_length: 3,
            max_protein_name_length: 60,
            max_residues_per_line: 120,
            allow_asterisk: false,
            allow_dash: false,
            allow_all_symbols_in_protein_names: false,
            warn_blank_lines_between_proteins: false,
            check_for_duplicate_names: true,
            check_for_duplicate_sequences: true,
            add_missing_linefeed: false,
            normalize_line_endings: false,
            max_detail_per_code: crate::data::messages::DEFAULT_MAX_DETAIL_PER_CODE,
            hasher: DEFAULT_HASHER.to_string(),
            preload_hash_file: None,
            abort_check_interval: 1000,
            fixed: FixedFastaOptions::default(),
            output: OutputOptions::default(),
        }
    }
}

impl ValidatorOptions {
    /// Reject combinations no run can honour
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_whitespace() {
            return Err(FastaError::config("Header marker cannot be whitespace"));
        }
        if self.max_protein_name_length == 0 {
            return Err(FastaError::config("Maximum protein name length must be > 0"));
        }
        if self.min_protein_name_length > self.max_protein_name_length {
            return Err(FastaError::config(format!(
                "Minimum protein name length ({}) exceeds maximum ({})",
                self.min_protein_name_length, self.max_protein_name_length
            )));
        }
        if self.max_residues_per_line == 0 {
            return Err(FastaError::config("Maximum residues per line must be > 0"));
        }
        if self.fixed.wrap_long_residue_lines && self.fixed.residues_per_line == 0 {
            return Err(FastaError::config("Residue wrap width must be > 0"));
        }
        if self.fixed.truncate_long_names && self.fixed.long_name_split_chars.is_empty() {
            return Err(FastaError::config(
                "Name truncation needs at least one split character",
            ));
        }
        if self.abort_check_interval == 0 {
            return Err(FastaError::config("Abort check interval must be > 0"));
        }
        let registry = HasherRegistry::new();
        if !registry.has_hasher(&self.hasher) {
            return Err(FastaError::config(format!(
                "Unknown hasher '{}'. Available: {}",
                self.hasher,
                registry.get_hasher_names().join(", ")
            )));
        }
        Ok(())
    }

    pub fn rule_settings(&self) -> RuleSettings {
        RuleSettings {
            marker: self.marker,
            allow_asterisk: self.allow_asterisk,
            allow_dash: self.allow_dash,
            allow_all_symbols_in_protein_names: self.allow_all_symbols_in_protein_names,
        }
    }

    /// Sequence hashes are needed during the first pass
    pub fn tracks_sequences(&self) -> bool {
        self.check_for_duplicate_sequences
            || self.output.save_unique_sequence_report
            || self.fixed.needs_consolidation()
    }
}
