// reports.rs - Tab-delimited hash info and unique sequence reports

use crate::data::ProteinHashRecord;
use crate::error::{FastaError, Result};
use csv::{QuoteStyle, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const HASH_INFO_HEADER: [&str; 4] = [
    "Protein_ID",
    "Protein_Name",
    "Sequence_Length",
    "Sequence_Hash",
];

pub const UNIQUE_SEQUENCES_HEADER: [&str; 6] = [
    "Sequence_Index",
    "Protein_Name_First",
    "Sequence_Length",
    "Sequence_Hash",
    "Protein_Count",
    "Duplicate_Proteins",
];

pub const DUPLICATE_MAPPING_HEADER: [&str; 4] = [
    "Sequence_Index",
    "Protein_Name_First",
    "Sequence_Length",
    "Duplicate_Protein",
];

/// Tab-delimited writer without quoting; names may legitimately contain quotes
fn tsv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_writer(inner)
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    super::ensure_parent_dir(path)?;
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| FastaError::io(path, e))
}

/// `<name>_ProteinHashes.txt`: one row per protein entry in file order
pub struct HashInfoWriter {
    writer: csv::Writer<Box<dyn Write>>,
    path: PathBuf,
    next_id: usize,
}

impl HashInfoWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = create_file(path)?;
        Self::from_writer(Box::new(file), path)
    }

    /// `path` names the destination in I/O errors
    pub fn from_writer(inner: Box<dyn Write>, path: &Path) -> Result<Self> {
        let mut writer = tsv_writer(inner);
        writer.write_record(HASH_INFO_HEADER)?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            next_id: 1,
        })
    }

    pub fn write_protein(&mut self, protein_name: &str, sequence_length: usize, sequence_hash: &str) -> Result<()> {
        let id = self.next_id.to_string();
        let length = sequence_length.to_string();
        self.writer
            .write_record([id.as_str(), protein_name, length.as_str(), sequence_hash])?;
        self.next_id += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> usize {
        self.next_id - 1
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| FastaError::io(&self.path, e))
    }
}

/// Row counts of a finished sequence report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReportSummary {
    pub unique_sequences: usize,
    pub duplicate_rows: usize,
    /// Set only when at least one duplicate was written
    pub duplicates_path: Option<PathBuf>,
}

/// `<name>_UniqueProteinSeqs.txt` plus `<name>_UniqueProteinSeqDuplicates.txt`.
///
/// The duplicates file is only created once the first duplicate arrives.
pub struct SequenceReportWriter {
    unique: csv::Writer<BufWriter<File>>,
    unique_path: PathBuf,
    duplicates: Option<csv::Writer<BufWriter<File>>>,
    duplicates_path: PathBuf,
    next_index: usize,
    duplicate_rows: usize,
}

impl SequenceReportWriter {
    pub fn create(unique_path: &Path, duplicates_path: &Path) -> Result<Self> {
        let mut unique = tsv_writer(create_file(unique_path)?);
        unique.write_record(UNIQUE_SEQUENCES_HEADER)?;
        Ok(Self {
            unique,
            unique_path: unique_path.to_path_buf(),
            duplicates: None,
            duplicates_path: duplicates_path.to_path_buf(),
            next_index: 1,
            duplicate_rows: 0,
        })
    }

    pub fn write_record(&mut self, record: &ProteinHashRecord) -> Result<()> {
        let index = self.next_index.to_string();
        let length = record.sequence_length.to_string();
        let count = record.protein_count().to_string();
        let duplicates = record.additional_proteins().join(",");
        self.unique.write_record([
            index.as_str(),
            record.first_protein_name.as_str(),
            length.as_str(),
            record.sequence_hash.as_str(),
            count.as_str(),
            duplicates.as_str(),
        ])?;

        for duplicate in record.additional_proteins() {
            if self.duplicates.is_none() {
                let mut writer = tsv_writer(create_file(&self.duplicates_path)?);
                writer.write_record(DUPLICATE_MAPPING_HEADER)?;
                self.duplicates = Some(writer);
            }
            if let Some(writer) = self.duplicates.as_mut() {
                writer.write_record([
                    index.as_str(),
                    record.first_protein_name.as_str(),
                    length.as_str(),
                    duplicate.as_str(),
                ])?;
                self.duplicate_rows += 1;
            }
        }

        self.next_index += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<SequenceReportSummary> {
        self.unique
            .flush()
            .map_err(|e| FastaError::io(&self.unique_path, e))?;
        let duplicates_path = match self.duplicates.as_mut() {
            Some(writer) => {
                writer
                    .flush()
                    .map_err(|e| FastaError::io(&self.duplicates_path, e))?;
                Some(self.duplicates_path.clone())
            }
            None => None,
        };
        Ok(SequenceReportSummary {
            unique_sequences: self.next_index - 1,
            duplicate_rows: self.duplicate_rows,
            duplicates_path,
        })
    }
}

/// Write both sequence reports for records held in memory
pub fn write_sequence_reports(
    records: &[ProteinHashRecord],
    unique_path: &Path,
    duplicates_path: &Path,
) -> Result<SequenceReportSummary> {
    let mut writer = SequenceReportWriter::create(unique_path, duplicates_path)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer.finish()
}
