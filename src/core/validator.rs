// validator.rs - One validation run per file: preload, parse, consolidate, report

use crate::core::consolidate::{correct_for_duplicate_sequences, ConsolidationSummary, ProvisionalFixedFile};
use crate::core::duplicates::SequenceTracker;
use crate::core::names::NameFixer;
use crate::core::options::ValidatorOptions;
use crate::core::parser::{FastaParser, FixedOutput, ParseOutputs, ParseSummary};
use crate::core::rules::RuleSet;
use crate::data::{LineEnding, MessageLog, TempFileList};
use crate::error::{FastaError, Result};
use crate::hashers::{HasherRegistry, SequenceHasher};
use crate::index::{estimate_spanner_length, sample_fasta_names};
use crate::output::{
    ensure_parent_dir, output_path, write_sequence_reports, HashInfoWriter, SequenceReportSummary,
    DUPLICATE_MAPPING_SUFFIX, FIXED_FASTA_SUFFIX, HASH_INFO_SUFFIX, PASS1_SUFFIX, UNIQUE_SEQUENCES_SUFFIX,
};
use crate::preload::{ChunkedMergeSorter, PreloadSummary, PreloadWorkflow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const NORMALIZED_SUFFIX: &str = "_crlf.fasta.tmp";
const READ_BUFFER_BYTES: usize = 1 << 20;

/// Everything one `validate_file` call produced
#[derive(Debug)]
pub struct ValidationReport {
    pub source: PathBuf,
    pub summary: ParseSummary,
    pub messages: MessageLog,
    pub line_ending: LineEnding,
    pub name_spanner_length: u8,
    pub unique_sequences: usize,
    pub duplicated_sequences: usize,
    pub fixed_file: Option<PathBuf>,
    pub hash_info_file: Option<PathBuf>,
    pub sequence_report: Option<SequenceReportSummary>,
    pub consolidation: Option<ConsolidationSummary>,
    pub preload: Option<PreloadSummary>,
}

impl ValidationReport {
    /// No structural error and not aborted; content errors do not count
    pub fn success(&self) -> bool {
        self.summary.success()
    }

    pub fn error_count(&self) -> usize {
        self.messages.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.warning_count()
    }
}

/// Validates (and optionally fixes) protein FASTA files with fixed options
pub struct FastaValidator {
    options: ValidatorOptions,
    rules: RuleSet,
    name_fixer: NameFixer,
    hasher: Arc<dyn SequenceHasher>,
    abort: Arc<AtomicBool>,
    show_progress: bool,
}

impl FastaValidator {
    pub fn new(options: ValidatorOptions, rules: RuleSet) -> Result<Self> {
        options.validate()?;
        let registry = HasherRegistry::new();
        let hasher = registry
            .get_hasher(&options.hasher)
            .ok_or_else(|| FastaError::config(format!("Unknown hasher '{}'", options.hasher)))?;

        Ok(Self {
            options,
            rules,
            name_fixer: NameFixer::new()?,
            hasher,
            abort: Arc::new(AtomicBool::new(false)),
            show_progress: false,
        })
    }

    /// Validator using the built-in rule set
    pub fn with_default_rules(options: ValidatorOptions) -> Result<Self> {
        let rules = RuleSet::default_rules(options.rule_settings())?;
        Self::new(options, rules)
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Setting the flag stops the current parse at its next abort check
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    fn new_message_log(&self) -> MessageLog {
        let mut messages = MessageLog::new(self.options.max_detail_per_code);
        for rule in self.rules.iter() {
            messages.errors.register_description(rule.id, &rule.message);
            messages.warnings.register_description(rule.id, &rule.message);
        }
        messages
    }

    fn progress_bar(&self, path: &Path) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let length = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let pb = ProgressBar::new(length);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) ETA: {eta}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }

    /// Run the whole pipeline on one file.
    ///
    /// Content problems end up in the report's messages; `Err` means the run
    /// itself could not proceed (I/O, malformed preload file).
    pub fn validate_file(&self, path: &Path) -> Result<ValidationReport> {
        if !path.is_file() {
            return Err(FastaError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "input file not found"),
            ));
        }

        let options = &self.options;
        let output_dir = options.output.output_directory.as_deref();
        let mut temp_files = TempFileList::new();
        let mut messages = self.new_message_log();

        let analysed = if options.normalize_line_endings {
            let copy = output_path(path, output_dir, NORMALIZED_SUFFIX);
            ensure_parent_dir(&copy)?;
            temp_files.track(&copy);
            let lines = crate::data::lines::normalize_to_crlf(path, &copy).map_err(|e| FastaError::io(path, e))?;
            debug!("Normalized {} lines to CRLF in {}", lines, copy.display());
            copy
        } else {
            path.to_path_buf()
        };

        let line_ending = LineEnding::detect_in_file(&analysed).map_err(|e| FastaError::io(&analysed, e))?;
        info!("Validating {} ({} line endings)", path.display(), line_ending.label());

        let mut preload = None;
        let mut keep_list = None;
        if let Some(hash_file) = &options.preload_hash_file {
            let sorter = ChunkedMergeSorter::default();
            let workflow = PreloadWorkflow::new(
                &sorter,
                options.output.output_directory.clone(),
                options.output.save_unique_sequence_report,
            );
            let (list, summary) = workflow.run(hash_file, &mut temp_files)?;
            keep_list = Some(list);
            preload = Some(summary);
        }

        let sampled = sample_fasta_names(&analysed, options.marker).map_err(|e| FastaError::io(&analysed, e))?;
        let name_spanner_length = estimate_spanner_length(&sampled).spanner_length;
        debug!("Name index spanner length: {}", name_spanner_length);

        let mut sequences = (options.tracks_sequences() && keep_list.is_none())
            .then(|| SequenceTracker::new(Arc::clone(&self.hasher), options.fixed.ignore_il_difference));

        let generate = options.fixed.generate;
        let consolidating = generate && sequences.is_some() && options.fixed.needs_consolidation();
        let fixed_path = output_path(path, output_dir, FIXED_FASTA_SUFFIX);
        let first_pass_path = if consolidating {
            output_path(path, output_dir, PASS1_SUFFIX)
        } else {
            fixed_path.clone()
        };

        let mut fixed_writer = if generate {
            ensure_parent_dir(&first_pass_path)?;
            if consolidating {
                temp_files.track(&first_pass_path);
            }
            let file = File::create(&first_pass_path).map_err(|e| FastaError::io(&first_pass_path, e))?;
            Some(BufWriter::new(file))
        } else {
            None
        };

        let hash_info_path = output_path(path, output_dir, HASH_INFO_SUFFIX);
        let mut hash_writer = if options.output.save_basic_hash_info {
            ensure_parent_dir(&hash_info_path)?;
            Some(HashInfoWriter::create(&hash_info_path)?)
        } else {
            None
        };

        let progress = self.progress_bar(&analysed);
        let file = File::open(&analysed).map_err(|e| FastaError::io(&analysed, e))?;
        let reader = BufReader::with_capacity(READ_BUFFER_BYTES, file);

        let summary = {
            let mut outputs = ParseOutputs {
                fixed: fixed_writer.as_mut().map(|writer| FixedOutput {
                    path: first_pass_path.as_path(),
                    writer: writer as &mut dyn Write,
                }),
                hash_info: hash_writer.as_mut(),
                progress: progress.as_ref(),
            };
            let mut parser = FastaParser::new(
                &analysed,
                options,
                &self.rules,
                &self.name_fixer,
                Arc::clone(&self.hasher),
                &mut messages,
                &self.abort,
                name_spanner_length,
            )
            .with_line_ending(line_ending);
            if let Some(tracker) = sequences.as_mut() {
                parser = parser.with_sequences(tracker);
            }
            if let Some(list) = keep_list.as_mut() {
                parser = parser.with_keep_list(list);
            }
            let summary = parser.parse(reader, &mut outputs)?;

            #[cfg(feature = "debug-stats")]
            {
                let names = parser.name_tracker();
                debug!(
                    "Name index: {} names in {} shards (spanner {})",
                    names.len(),
                    names.shard_count(),
                    names.spanner_length()
                );
            }

            summary
        };

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        // Close the first-pass outputs before anything reads them back
        drop(fixed_writer);
        drop(hash_writer);

        let mut consolidation = None;
        let mut fixed_file = None;
        if generate {
            if !consolidating {
                fixed_file = Some(fixed_path.clone());
            } else if let (true, Some(tracker)) = (summary.success(), sequences.as_ref()) {
                let provisional = ProvisionalFixedFile {
                    path: first_pass_path.clone(),
                    line_ending,
                };
                consolidation = Some(correct_for_duplicate_sequences(
                    &provisional,
                    &fixed_path,
                    tracker,
                    options,
                    &mut messages,
                )?);
                fixed_file = Some(fixed_path.clone());
            } else {
                warn!(
                    "Skipping duplicate sequence consolidation for {}: the first pass did not complete",
                    path.display()
                );
            }
        }

        let mut sequence_report = None;
        if options.output.save_unique_sequence_report {
            if let Some(tracker) = sequences.as_ref() {
                sequence_report = Some(write_sequence_reports(
                    tracker.records(),
                    &output_path(path, output_dir, UNIQUE_SEQUENCES_SUFFIX),
                    &output_path(path, output_dir, DUPLICATE_MAPPING_SUFFIX),
                )?);
            }
        }

        #[cfg(feature = "debug-stats")]
        if let Some(tracker) = sequences.as_ref() {
            debug!(
                "Sequence index: {} hashes in {} shards, {} shared",
                tracker.len(),
                tracker.shard_count(),
                tracker.duplicated_sequence_count()
            );
        }

        let removed = temp_files.delete_all();
        if removed > 0 {
            debug!("Removed {} temporary files", removed);
        }

        info!(
            "{}: {} lines, {} proteins, {} residues, {} errors, {} warnings",
            path.display(),
            summary.line_count,
            summary.protein_count,
            summary.residue_count,
            messages.error_count(),
            messages.warning_count()
        );

        Ok(ValidationReport {
            source: path.to_path_buf(),
            summary,
            line_ending,
            name_spanner_length,
            unique_sequences: sequences.as_ref().map_or(0, |t| t.len()),
            duplicated_sequences: sequences.as_ref().map_or(0, |t| t.duplicated_sequence_count()),
            fixed_file,
            hash_info_file: options.output.save_basic_hash_info.then_some(hash_info_path),
            sequence_report,
            consolidation,
            preload,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MessageCode;
    use std::fs;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn fixing_options(dir: &TempDir) -> ValidatorOptions {
        let mut options = ValidatorOptions::default();
        options.fixed.generate = true;
        options.output.output_directory = Some(dir.path().join("out"));
        options
    }

    #[test]
    fn test_rejects_invalid_options() {
        let options = ValidatorOptions {
            hasher: "crc64".to_string(),
            ..ValidatorOptions::default()
        };
        let err = FastaValidator::with_default_rules(options).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let validator = FastaValidator::with_default_rules(ValidatorOptions::default()).unwrap();
        let err = validator.validate_file(Path::new("/no/such/file.fasta")).unwrap_err();
        assert!(matches!(err, FastaError::Io { .. }));
    }

    #[test]
    fn test_round_trip_without_fixes() {
        let dir = TempDir::new().unwrap();
        let content = ">Prot_A first protein\nMKVLAAGIVG\nLLA\n>Prot_B second\nMSTNPKPQRK\n";
        let input = write_input(&dir, "clean.fasta", content);

        let mut options = fixing_options(&dir);
        options.fixed.wrap_long_residue_lines = false;
        let validator = FastaValidator::with_default_rules(options).unwrap();
        let report = validator.validate_file(&input).unwrap();

        assert!(report.success());
        assert_eq!(report.summary.protein_count, 2);
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.unique_sequences, 2);
        let fixed = fs::read_to_string(report.fixed_file.unwrap()).unwrap();
        assert_eq!(fixed, content);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "dups.fasta",
            ">Prot_A one\nMKVLAAGIVG\n>Prot_B two\nMKVLAAGIVG\n>Prot_C three\nMSTNPKPQRK\n",
        );

        let mut options = fixing_options(&dir);
        options.fixed.consolidate_duplicate_sequences = true;
        let validator = FastaValidator::with_default_rules(options.clone()).unwrap();
        let report = validator.validate_file(&input).unwrap();

        let consolidation = report.consolidation.unwrap();
        assert_eq!(consolidation.proteins_read, 3);
        assert_eq!(consolidation.proteins_written, 2);
        assert_eq!(consolidation.proteins_removed, 1);
        let first_output = report.fixed_file.unwrap();
        let first = fs::read_to_string(&first_output).unwrap();
        assert!(first.contains(">Prot_A one Prot_B"));
        assert!(!first.contains(">Prot_B"));
        // The first-pass file is temporary
        assert!(!dir.path().join("out").join("dups_new.fasta.pass1.tmp").exists());

        // Running again on the output changes nothing
        let second_dir = TempDir::new().unwrap();
        options.output.output_directory = Some(second_dir.path().to_path_buf());
        let validator = FastaValidator::with_default_rules(options).unwrap();
        let report = validator.validate_file(&first_output).unwrap();
        assert_eq!(report.consolidation.unwrap().proteins_removed, 0);
        let second = fs::read_to_string(report.fixed_file.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_names_fit() {
        let dir = TempDir::new().unwrap();
        let long_name = format!("sp|{}|LONG_HUMAN", "Q".repeat(70));
        let input = write_input(&dir, "long.fasta", &format!(">{} kinase\nMKV\n", long_name));

        let validator = FastaValidator::with_default_rules(fixing_options(&dir)).unwrap();
        let report = validator.validate_file(&input).unwrap();
        let fixed = fs::read_to_string(report.fixed_file.unwrap()).unwrap();
        let header = fixed.lines().next().unwrap();
        let name = header[1..].split(' ').next().unwrap();
        assert!(name.chars().count() <= 60);
        assert_eq!(report.messages.count_of(MessageCode::ProteinNameIsTooLong), 0);

        // Without truncation the same name is an error
        let mut options = fixing_options(&dir);
        options.fixed.truncate_long_names = false;
        let validator = FastaValidator::with_default_rules(options).unwrap();
        let report = validator.validate_file(&input).unwrap();
        assert_eq!(report.messages.count_of(MessageCode::ProteinNameIsTooLong), 1);
    }

    #[test]
    fn test_duplicate_name_still_hashed_in_basic_hash_file() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "names.fasta", ">Prot_A\nMKV\n>Prot_A\nMST\n");

        let mut options = ValidatorOptions::default();
        options.output.output_directory = Some(dir.path().to_path_buf());
        options.output.save_basic_hash_info = true;
        let validator = FastaValidator::with_default_rules(options).unwrap();
        let report = validator.validate_file(&input).unwrap();

        assert_eq!(report.messages.count_of(MessageCode::DuplicateProteinName), 1);
        let hashes = fs::read_to_string(report.hash_info_file.unwrap()).unwrap();
        let rows: Vec<&str> = hashes.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.contains("Prot_A")));
    }

    #[test]
    fn test_sequence_reports_written() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "seqs.fasta", ">Prot_A\nMKV\n>Prot_B\nMKV\n>Prot_C\nMST\n");

        let mut options = ValidatorOptions::default();
        options.output.output_directory = Some(dir.path().to_path_buf());
        options.output.save_unique_sequence_report = true;
        let validator = FastaValidator::with_default_rules(options).unwrap();
        let report = validator.validate_file(&input).unwrap();

        assert_eq!(report.unique_sequences, 2);
        assert_eq!(report.duplicated_sequences, 1);
        assert_eq!(report.messages.count_of(MessageCode::DuplicateProteinSequence), 1);
        let summary = report.sequence_report.unwrap();
        assert_eq!(summary.unique_sequences, 2);
        assert!(dir.path().join("seqs_UniqueProteinSeqDuplicates.txt").exists());
    }

    #[test]
    fn test_preload_keep_list_drops_unlisted_proteins() {
        let dir = TempDir::new().unwrap();
        let hash_file = write_input(
            &dir,
            "big_ProteinHashes.txt",
            "Protein_ID\tProtein_Name\tSequence_Length\tSequence_Hash\n\
             1\tProt_A\t3\tAAAA\n\
             2\tProt_B\t3\tAAAA\n\
             3\tProt_C\t3\tCCCC\n",
        );
        let input = write_input(&dir, "big.fasta", ">Prot_A\nMKV\n>Prot_B\nMKV\n>Prot_C\nMST\n");

        let mut options = fixing_options(&dir);
        options.preload_hash_file = Some(hash_file);
        let validator = FastaValidator::with_default_rules(options).unwrap();
        let report = validator.validate_file(&input).unwrap();

        let preload = report.preload.unwrap();
        assert_eq!(preload.proteins, 3);
        assert_eq!(preload.unique_sequences, 2);
        assert_eq!(report.messages.count_of(MessageCode::ProteinRemovedNotInKeepList), 1);
        let fixed = fs::read_to_string(report.fixed_file.unwrap()).unwrap();
        assert!(fixed.contains(">Prot_A"));
        assert!(!fixed.contains(">Prot_B"));
        assert!(fixed.contains(">Prot_C"));
    }

    #[test]
    fn test_normalized_copy_is_removed() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "unix.fasta", ">Prot_A\nMKV\n");

        let mut options = fixing_options(&dir);
        options.normalize_line_endings = true;
        let validator = FastaValidator::with_default_rules(options).unwrap();
        let report = validator.validate_file(&input).unwrap();

        assert_eq!(report.line_ending, LineEnding::CrLf);
        let fixed = fs::read_to_string(report.fixed_file.unwrap()).unwrap();
        assert_eq!(fixed, ">Prot_A\r\nMKV\r\n");
        assert!(!dir.path().join("out").join("unix_crlf.fasta.tmp").exists());
    }

    #[test]
    fn test_abort_before_start() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "abort.fasta", ">Prot_A\nMKV\n>Prot_B\nMST\n");
        let options = ValidatorOptions {
            abort_check_interval: 1,
            ..ValidatorOptions::default()
        };
        let validator = FastaValidator::with_default_rules(options).unwrap();
        validator.abort_handle().store(true, std::sync::atomic::Ordering::Relaxed);
        let report = validator.validate_file(&input).unwrap();
        assert!(report.summary.aborted);
        assert!(!report.success());
    }
}
