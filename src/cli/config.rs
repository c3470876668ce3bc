// config.rs - Configuration file support

use crate::core::RuleDefinitions;
use crate::error::{FastaError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub input: Option<Vec<String>>,
    pub output_dir: Option<String>,
    pub stats_file: Option<String>,
    pub save_hash_info: Option<bool>,
    pub save_unique_report: Option<bool>,

    // Validation
    pub marker: Option<char>,
    pub min_name_length: Option<usize>,
    pub max_name_length: Option<usize>,
    pub max_residues_per_line: Option<usize>,
    pub allow_asterisk: Option<bool>,
    pub allow_dash: Option<bool>,
    pub allow_all_symbols: Option<bool>,
    pub warn_blank_lines: Option<bool>,
    pub no_duplicate_names_check: Option<bool>,
    pub no_duplicate_sequences_check: Option<bool>,
    pub add_missing_linefeed: Option<bool>,
    pub normalize_line_endings: Option<bool>,
    pub max_detail: Option<usize>,
    pub hasher: Option<String>,
    pub preload_hash_file: Option<String>,

    // Fixed FASTA file
    pub fix: Option<bool>,
    pub no_rename_duplicates: Option<bool>,
    pub keep_duplicate_names: Option<bool>,
    pub consolidate: Option<bool>,
    pub ignore_il: Option<bool>,
    pub split_refs: Option<bool>,
    pub no_truncate: Option<bool>,
    pub split_chars: Option<String>,
    pub no_replace_invalid_chars: Option<bool>,
    pub remove_invalid_residues: Option<bool>,
    pub no_wrap: Option<bool>,
    pub residues_per_line: Option<usize>,

    /// Custom rule groups replacing the built-in ones
    pub rules: Option<RuleDefinitions>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FastaError::io(path, e))?;
        let config = Self::from_toml(&content)
            .map_err(|e| FastaError::config(format!("Failed to parse config file '{}': {}", path.display(), e)))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| FastaError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).map_err(|e| FastaError::io(path, e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# fastaval.toml - Configuration file for fastaval
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# FASTA files or directories (.fasta, .fa, .faa, .fas files are picked up)
input = ["/path/to/proteins.fasta"]

# Directory for generated files (default: next to each input)
# output_dir = "/path/to/output"

# Append messages to a tab-delimited stats file instead of printing them
# stats_file = "fastaval_stats.txt"

# Write <name>_ProteinHashes.txt
save_hash_info = false

# Write <name>_UniqueProteinSeqs.txt and <name>_UniqueProteinSeqDuplicates.txt
save_unique_report = false

# =============================================================================
# VALIDATION
# =============================================================================

# Header marker character
marker = ">"

# Protein name length limits
min_name_length = 3
max_name_length = 60

# Residue lines longer than this are reported
max_residues_per_line = 120

# Relaxed symbol checks
allow_asterisk = false
allow_dash = false
allow_all_symbols = false

# Report blank lines between proteins
warn_blank_lines = false

# Disable duplicate checks
no_duplicate_names_check = false
no_duplicate_sequences_check = false

# Line terminators
add_missing_linefeed = false
normalize_line_endings = false

# Detail entries kept per message code
max_detail = 150

# Sequence hasher: sha1, sha256, md5
hasher = "sha1"

# Protein hash file (Protein_Name, Sequence_Length, Sequence_Hash columns)
# used to decide which proteins the fixed file keeps
# preload_hash_file = "/path/to/proteins_ProteinHashes.txt"

# =============================================================================
# FIXED FASTA FILE
# =============================================================================

# Write <name>_new.fasta
fix = false

# Duplicate names: renamed (-b, -c, ...) unless disabled
no_rename_duplicates = false
keep_duplicate_names = false

# Write each sequence once, other names appended to the description
consolidate = false
ignore_il = false

# Protein name fixes
split_refs = false
no_truncate = false
split_chars = "|"
no_replace_invalid_chars = false

# Residue fixes
remove_invalid_residues = false
no_wrap = false
residues_per_line = 60

# =============================================================================
# CUSTOM RULES
# =============================================================================
# A group listed here replaces the built-in rules of that group.
# Severity 5 or above is an error, below 5 a warning.

# [[rules.name]]
# pattern = "[^A-Za-z0-9_.|:-]"
# message = "Protein name contains an unexpected character"
# severity = 5
# show_match_as_context = true

# [[rules.sequence]]
# pattern = "[^A-Z]"
# message = "Residues contain a non-letter"
# severity = 5
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config = Config::from_toml(&Config::generate_sample()).unwrap();
        assert_eq!(config.marker, Some('>'));
        assert_eq!(config.max_name_length, Some(60));
        assert_eq!(config.hasher.as_deref(), Some("sha1"));
        assert!(config.rules.is_none());
    }

    #[test]
    fn test_custom_rules_section() {
        let config = Config::from_toml(
            r#"
max_name_length = 40

[[rules.name]]
pattern = "^sp\\|"
message = "SwissProt style name"
severity = 2

[[rules.sequence]]
pattern = "^M"
message = "Sequence does not start with M"
match_means_problem = false
"#,
        )
        .unwrap();

        let rules = config.rules.unwrap();
        let name = rules.name.unwrap();
        assert_eq!(name.len(), 1);
        assert_eq!(name[0].severity, 2);
        let sequence = rules.sequence.unwrap();
        assert!(!sequence[0].match_means_problem);
        assert_eq!(sequence[0].severity, 5);
        assert!(rules.header.is_none());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fastaval.toml");
        let config = Config {
            fix: Some(true),
            residues_per_line: Some(80),
            ..Config::new()
        };
        config.to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }
}
