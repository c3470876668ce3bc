// workflow.rs - Build the keep list from a tab-delimited protein hash file

use super::external_sort::ExternalSorter;
use super::keep_list::KeepList;
use crate::data::{ProteinHashRecord, TempFileList};
use crate::error::{FastaError, Result};
use crate::index::{estimate_spanner_length, sample_column};
use crate::output::{self, SequenceReportWriter};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SORTED_BY_HASH_SUFFIX: &str = "_SortedByHash.txt";
pub const SORTED_BY_NAME_SUFFIX: &str = "_SortedByName.txt";
pub const NAMES_TO_KEEP_SUFFIX: &str = "_NamesToKeep.txt";
pub const NAMES_TO_KEEP_SORTED_SUFFIX: &str = "_NamesToKeep_Sorted.txt";

pub const COLUMN_PROTEIN_NAME: &str = "Protein_Name";
pub const COLUMN_SEQUENCE_LENGTH: &str = "Sequence_Length";
pub const COLUMN_SEQUENCE_HASH: &str = "Sequence_Hash";
pub const COLUMN_PROTEIN_ID: &str = "Protein_ID";

/// Column positions found in a hash file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashFileColumns {
    pub header_line: String,
    pub protein_name: usize,
    pub sequence_length: usize,
    pub sequence_hash: usize,
    pub protein_id: Option<usize>,
}

impl HashFileColumns {
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path).map_err(|e| FastaError::io(path, e))?);
        let mut header_line = String::new();
        reader
            .read_line(&mut header_line)
            .map_err(|e| FastaError::io(path, e))?;
        let header_line = header_line.trim_end_matches(['\r', '\n']).to_string();
        Self::parse(path, &header_line)
    }

    fn parse(path: &Path, header_line: &str) -> Result<Self> {
        let columns: Vec<&str> = header_line.split('\t').map(str::trim).collect();
        let find = |name: &str| columns.iter().position(|c| c.eq_ignore_ascii_case(name));
        let required = |name: &str| {
            find(name).ok_or_else(|| FastaError::hash_file(path, 1, format!("missing column '{}'", name)))
        };
        Ok(Self {
            header_line: header_line.to_string(),
            protein_name: required(COLUMN_PROTEIN_NAME)?,
            sequence_length: required(COLUMN_SEQUENCE_LENGTH)?,
            sequence_hash: required(COLUMN_SEQUENCE_HASH)?,
            protein_id: find(COLUMN_PROTEIN_ID),
        })
    }
}

/// What the preload produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadSummary {
    pub proteins: usize,
    pub unique_sequences: usize,
    pub duplicate_proteins: usize,
    pub name_collisions: usize,
    pub spanner_length: u8,
    pub reused_sorted_file: bool,
    pub duplicate_names_path: Option<PathBuf>,
}

/// Turns a protein hash file into the keep list used by the main parse
pub struct PreloadWorkflow<'a> {
    sorter: &'a dyn ExternalSorter,
    output_dir: Option<PathBuf>,
    write_sequence_reports: bool,
}

fn count_data_lines(path: &Path) -> Result<usize> {
    let reader = BufReader::new(File::open(path).map_err(|e| FastaError::io(path, e))?);
    let mut count = 0;
    for line in reader.split(b'\n').skip(1) {
        let line = line.map_err(|e| FastaError::io(path, e))?;
        if !(line.is_empty() || line == b"\r") {
            count += 1;
        }
    }
    Ok(count)
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| FastaError::io(path, e))?;
    Ok(ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(file))
}

fn field<'r>(record: &'r StringRecord, column: usize, path: &Path, line: usize) -> Result<&'r str> {
    record
        .get(column)
        .map(str::trim)
        .ok_or_else(|| FastaError::hash_file(path, line, format!("missing column {}", column + 1)))
}

impl<'a> PreloadWorkflow<'a> {
    pub fn new(sorter: &'a dyn ExternalSorter, output_dir: Option<PathBuf>, write_sequence_reports: bool) -> Self {
        Self {
            sorter,
            output_dir,
            write_sequence_reports,
        }
    }

    fn path_for(&self, hash_file: &Path, suffix: &str) -> PathBuf {
        output::output_path(hash_file, self.output_dir.as_deref(), suffix)
    }

    /// A sorted file from an earlier run is reused when header and line count still match
    fn sorted_file_is_current(sorted: &Path, header_line: &str, data_lines: usize) -> bool {
        if !sorted.exists() {
            return false;
        }
        match HashFileColumns::read(sorted) {
            Ok(columns) if columns.header_line == header_line => {
                count_data_lines(sorted).map_or(false, |n| n == data_lines)
            }
            _ => false,
        }
    }

    pub fn run(&self, hash_file: &Path, temp_files: &mut TempFileList) -> Result<(KeepList, PreloadSummary)> {
        let columns = HashFileColumns::read(hash_file)?;
        let data_lines = count_data_lines(hash_file)?;
        info!("Preloading {} protein hashes from {}", data_lines, hash_file.display());

        let mut summary = PreloadSummary {
            proteins: data_lines,
            ..Default::default()
        };

        let sorted_by_hash = self.path_for(hash_file, SORTED_BY_HASH_SUFFIX);
        if Self::sorted_file_is_current(&sorted_by_hash, &columns.header_line, data_lines) {
            debug!("Reusing {}", sorted_by_hash.display());
            summary.reused_sorted_file = true;
        } else {
            self.sorter
                .sort_by_column(hash_file, &sorted_by_hash, columns.sequence_hash, true)?;
        }

        let keep_file = self.path_for(hash_file, NAMES_TO_KEEP_SUFFIX);
        temp_files.track(&keep_file);
        self.write_keep_file(&sorted_by_hash, &columns, &keep_file, hash_file, &mut summary)?;

        let keep_sorted = self.path_for(hash_file, NAMES_TO_KEEP_SORTED_SUFFIX);
        temp_files.track(&keep_sorted);
        self.sorter.sort_by_column(&keep_file, &keep_sorted, 0, true)?;

        let sorted_by_name = self.path_for(hash_file, SORTED_BY_NAME_SUFFIX);
        temp_files.track(&sorted_by_name);
        self.sorter
            .sort_by_column(hash_file, &sorted_by_name, columns.protein_name, true)?;
        self.audit_name_collisions(&sorted_by_name, &columns, hash_file, &mut summary)?;

        let sample = sample_column(&keep_sorted, 0, '\t').map_err(|e| FastaError::io(&keep_sorted, e))?;
        summary.spanner_length = estimate_spanner_length(&sample).spanner_length;
        let keep_list = KeepList::load(&keep_sorted, summary.spanner_length)?;

        info!(
            "Keep list ready: {} names, {} unique sequences, spanner length {}",
            keep_list.len(),
            summary.unique_sequences,
            summary.spanner_length
        );
        Ok((keep_list, summary))
    }

    /// Scan the hash-sorted file, writing the first name of each hash group
    fn write_keep_file(
        &self,
        sorted_by_hash: &Path,
        columns: &HashFileColumns,
        keep_file: &Path,
        hash_file: &Path,
        summary: &mut PreloadSummary,
    ) -> Result<()> {
        output::ensure_parent_dir(keep_file)?;
        let mut keep = WriterBuilder::new().delimiter(b'\t').quote_style(csv::QuoteStyle::Never).from_writer(
            BufWriter::new(File::create(keep_file).map_err(|e| FastaError::io(keep_file, e))?),
        );
        keep.write_record([COLUMN_PROTEIN_NAME, "Count"])?;

        let mut reports = if self.write_sequence_reports {
            Some(SequenceReportWriter::create(
                &self.path_for(hash_file, output::UNIQUE_SEQUENCES_SUFFIX),
                &self.path_for(hash_file, output::DUPLICATE_MAPPING_SUFFIX),
            )?)
        } else {
            None
        };

        let mut group: Option<ProteinHashRecord> = None;
        let mut finish_group = |record: ProteinHashRecord,
                                keep: &mut csv::Writer<BufWriter<File>>,
                                summary: &mut PreloadSummary|
         -> Result<()> {
            keep.write_record([record.first_protein_name.as_str(), "0"])?;
            summary.unique_sequences += 1;
            summary.duplicate_proteins += record.protein_count() - 1;
            if let Some(reports) = reports.as_mut() {
                reports.write_record(&record)?;
            }
            Ok(())
        };

        let mut reader = tsv_reader(sorted_by_hash)?;
        for (row, record) in reader.records().enumerate() {
            let line = row + 2;
            let record = record?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let name = field(&record, columns.protein_name, sorted_by_hash, line)?;
            let hash = field(&record, columns.sequence_hash, sorted_by_hash, line)?;
            let length_text = field(&record, columns.sequence_length, sorted_by_hash, line)?;
            let length: usize = length_text.parse().map_err(|_| {
                FastaError::hash_file(sorted_by_hash, line, format!("invalid sequence length '{}'", length_text))
            })?;

            match group.as_mut() {
                Some(current) if current.sequence_hash == hash => {
                    current.add_protein(name);
                }
                _ => {
                    let next = ProteinHashRecord::from_summary(hash.to_string(), length, name);
                    if let Some(done) = group.replace(next) {
                        finish_group(done, &mut keep, summary)?;
                    }
                }
            }
        }
        if let Some(done) = group.take() {
            finish_group(done, &mut keep, summary)?;
        }

        keep.flush().map_err(|e| FastaError::io(keep_file, e))?;
        if let Some(reports) = reports {
            let written = reports.finish()?;
            debug!("Preload sequence report: {} unique sequences", written.unique_sequences);
        }
        Ok(())
    }

    /// Names appearing more than once in the hash file go to `<name>_DuplicateProteinNames.txt`
    fn audit_name_collisions(
        &self,
        sorted_by_name: &Path,
        columns: &HashFileColumns,
        hash_file: &Path,
        summary: &mut PreloadSummary,
    ) -> Result<()> {
        let collisions_path = self.path_for(hash_file, output::DUPLICATE_NAMES_SUFFIX);
        let mut writer: Option<BufWriter<File>> = None;
        let mut current: Option<(String, usize)> = None;

        let mut flush_name = |name: &str, count: usize, summary: &mut PreloadSummary| -> Result<()> {
            if count < 2 {
                return Ok(());
            }
            if writer.is_none() {
                output::ensure_parent_dir(&collisions_path)?;
                let mut file = BufWriter::new(
                    File::create(&collisions_path).map_err(|e| FastaError::io(&collisions_path, e))?,
                );
                writeln!(file, "{}\tOccurrences", COLUMN_PROTEIN_NAME)
                    .map_err(|e| FastaError::io(&collisions_path, e))?;
                writer = Some(file);
            }
            if let Some(file) = writer.as_mut() {
                writeln!(file, "{}\t{}", name, count).map_err(|e| FastaError::io(&collisions_path, e))?;
            }
            summary.name_collisions += 1;
            Ok(())
        };

        let mut reader = tsv_reader(sorted_by_name)?;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let name = field(&record, columns.protein_name, sorted_by_name, row + 2)?;
            if name.is_empty() {
                continue;
            }
            match current.as_mut() {
                Some((previous, count)) if previous.as_str() == name => *count += 1,
                _ => {
                    if let Some((previous, count)) = current.replace((name.to_string(), 1)) {
                        flush_name(&previous, count, summary)?;
                    }
                }
            }
        }
        if let Some((previous, count)) = current.take() {
            flush_name(&previous, count, summary)?;
        }

        if let Some(mut file) = writer {
            file.flush().map_err(|e| FastaError::io(&collisions_path, e))?;
            warn!(
                "{} protein names occur more than once in {}; see {}",
                summary.name_collisions,
                hash_file.display(),
                collisions_path.display()
            );
            summary.duplicate_names_path = Some(collisions_path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preload::{ChunkedMergeSorter, KeepDecision};
    use std::fs;

    const HASH_FILE: &str = "Protein_ID\tProtein_Name\tSequence_Length\tSequence_Hash\n\
        1\tP1\t3\tAAA\n\
        2\tP2\t4\tBBB\n\
        3\tP3\t3\tAAA\n\
        4\tP4\t5\tCCC\n\
        5\tP2\t4\tBBB\n";

    #[test]
    fn test_header_columns() {
        let columns = HashFileColumns::parse(Path::new("h.txt"), "Protein_ID\tProtein_Name\tSequence_Length\tSequence_Hash").unwrap();
        assert_eq!(columns.protein_name, 1);
        assert_eq!(columns.sequence_hash, 3);
        assert_eq!(columns.protein_id, Some(0));

        let err = HashFileColumns::parse(Path::new("h.txt"), "Protein_Name\tSequence_Hash").unwrap_err();
        assert!(err.to_string().contains("Sequence_Length"));
    }

    #[test]
    fn test_preload_builds_keep_list() {
        let dir = tempfile::tempdir().unwrap();
        let hash_file = dir.path().join("proteins_ProteinHashes.txt");
        fs::write(&hash_file, HASH_FILE).unwrap();

        let sorter = ChunkedMergeSorter::new(2);
        let workflow = PreloadWorkflow::new(&sorter, None, true);
        let mut temp = TempFileList::new();
        let (mut keep, summary) = workflow.run(&hash_file, &mut temp).unwrap();

        assert_eq!(summary.proteins, 5);
        assert_eq!(summary.unique_sequences, 3);
        assert_eq!(summary.duplicate_proteins, 2);
        assert_eq!(summary.name_collisions, 1);
        assert!(!summary.reused_sorted_file);

        assert_eq!(keep.len(), 3);
        assert_eq!(keep.lookup("P1"), KeepDecision::Keep);
        assert_eq!(keep.lookup("P3"), KeepDecision::NotListed);
        assert_eq!(keep.lookup("P2"), KeepDecision::Keep);
        assert_eq!(keep.lookup("P2"), KeepDecision::Duplicate);

        let collisions = fs::read_to_string(summary.duplicate_names_path.unwrap()).unwrap();
        assert!(collisions.contains("P2\t2"));

        let unique = fs::read_to_string(dir.path().join("proteins_ProteinHashes_UniqueProteinSeqs.txt")).unwrap();
        assert!(unique.contains("\tP1\t3\tAAA\t2\tP3"));

        assert_eq!(temp.delete_all(), 3);

        // Second run reuses the hash-sorted file
        let (_, summary) = workflow.run(&hash_file, &mut temp).unwrap();
        assert!(summary.reused_sorted_file);
    }
}
