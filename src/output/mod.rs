// mod.rs - Output writers module

pub mod reports;
pub mod stats;

use crate::error::{FastaError, Result};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

// Re-export main types for convenience
pub use reports::{write_sequence_reports, HashInfoWriter, SequenceReportSummary, SequenceReportWriter};
pub use stats::{append_stats_file, print_messages, report_messages};

pub const FIXED_FASTA_SUFFIX: &str = "_new.fasta";
pub const PASS1_SUFFIX: &str = "_new.fasta.pass1.tmp";
pub const HASH_INFO_SUFFIX: &str = "_ProteinHashes.txt";
pub const UNIQUE_SEQUENCES_SUFFIX: &str = "_UniqueProteinSeqs.txt";
pub const DUPLICATE_MAPPING_SUFFIX: &str = "_UniqueProteinSeqDuplicates.txt";
pub const DUPLICATE_NAMES_SUFFIX: &str = "_DuplicateProteinNames.txt";

/// Ensure parent directory exists before creating file
pub fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| FastaError::io(parent, e))?;
        }
    }
    Ok(())
}

/// `<dir>/<input stem><suffix>`, next to the input unless `output_dir` is given
pub fn output_path(input: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let input = Path::new("/data/proteins.fasta");
        assert_eq!(
            output_path(input, None, FIXED_FASTA_SUFFIX),
            PathBuf::from("/data/proteins_new.fasta")
        );
        assert_eq!(
            output_path(input, Some(Path::new("/out")), HASH_INFO_SUFFIX),
            PathBuf::from("/out/proteins_ProteinHashes.txt")
        );
    }
}
