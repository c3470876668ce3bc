// consolidate.rs - Second pass over the provisional fixed file

use crate::core::duplicates::{SequenceTracker, HASH_SPANNER_LENGTH};
use crate::core::options::ValidatorOptions;
use crate::core::parser::{original_wrapping, write_record, MAX_LINE_LENGTH};
use crate::data::{LineEnding, LineReader, MessageCode, MessageLog};
use crate::error::{FastaError, Result};
use crate::index::{ShardedHashMap, StringIndex};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Longest description produced by merging names into it
pub const MAX_CONSOLIDATED_DESCRIPTION: usize = 7995;

/// Output of the first pass, handed to `correct_for_duplicate_sequences`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalFixedFile {
    pub path: PathBuf,
    pub line_ending: LineEnding,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationSummary {
    pub proteins_read: usize,
    pub proteins_written: usize,
    pub proteins_removed: usize,
    pub descriptions_extended: usize,
}

/// Cut `description` to at most `max_chars` characters
pub fn cap_description(description: &mut String, max_chars: usize) {
    if let Some((cut, _)) = description.char_indices().nth(max_chars) {
        description.truncate(cut);
    }
}

/// Description of the kept protein followed by the names of the proteins merged into it
fn merged_description(description: &str, merged_names: &[&str]) -> String {
    let mut merged = description.to_string();
    for name in merged_names {
        if !merged.is_empty() {
            merged.push(' ');
        }
        merged.push_str(name);
    }
    cap_description(&mut merged, MAX_CONSOLIDATED_DESCRIPTION);
    merged
}

struct Record {
    header_line: usize,
    name: String,
    description: String,
    residues: String,
    line_lengths: Vec<usize>,
}

struct Consolidator<'a> {
    options: &'a ValidatorOptions,
    sequences: &'a SequenceTracker,
    messages: &'a mut MessageLog,
    line_ending: LineEnding,
    written_hashes: ShardedHashMap<()>,
    written_names: ShardedHashMap<Vec<String>>,
    summary: ConsolidationSummary,
}

impl Consolidator<'_> {
    fn handle(&mut self, record: Record, writer: &mut dyn Write, output: &Path) -> Result<()> {
        self.summary.proteins_read += 1;
        let sequences = self.sequences;
        let hash = sequences.hash(&record.residues);
        let known = sequences.record_for_hash(&hash);

        let description = if self.options.fixed.consolidate_duplicate_sequences {
            if self.written_hashes.contains(&hash) {
                let master = known.map(|r| r.first_protein_name.clone()).unwrap_or_default();
                return self.remove(&record, master);
            }
            self.written_hashes.insert(&hash, ());

            match known {
                Some(hash_record) => {
                    let merged: Vec<&str> = std::iter::once(hash_record.first_protein_name.as_str())
                        .chain(hash_record.additional_proteins().iter().map(String::as_str))
                        .filter(|n| *n != record.name)
                        .collect();
                    if merged.is_empty() {
                        record.description.clone()
                    } else {
                        self.summary.descriptions_extended += 1;
                        merged_description(&record.description, &merged)
                    }
                }
                None => record.description.clone(),
            }
        } else {
            let hashes = self.written_names.get_or_insert_with(&record.name, Vec::new);
            if hashes.contains(&hash) {
                let master = record.name.clone();
                return self.remove(&record, master);
            }
            hashes.push(hash);
            record.description.clone()
        };

        let lines = original_wrapping(record.residues.as_bytes(), &record.line_lengths);
        write_record(
            writer,
            self.options.marker,
            &record.name,
            &description,
            lines,
            self.line_ending,
        )
        .map_err(|e| FastaError::io(output, e))?;
        self.summary.proteins_written += 1;
        Ok(())
    }

    fn remove(&mut self, record: &Record, master: String) -> Result<()> {
        self.messages.record(
            MessageCode::ProteinRemovedSinceDuplicateSequence,
            record.header_line,
            &record.name,
            master,
        );
        self.summary.proteins_removed += 1;
        Ok(())
    }
}

/// Rewrite the provisional fixed file into `output`, dropping or merging
/// proteins whose sequence was already written.
///
/// With consolidation every sequence is written once, under its first name,
/// with the other names appended to the description. Otherwise a protein is
/// only dropped when the same name was already written with the same sequence.
pub fn correct_for_duplicate_sequences(
    provisional: &ProvisionalFixedFile,
    output: &Path,
    sequences: &SequenceTracker,
    options: &ValidatorOptions,
    messages: &mut MessageLog,
) -> Result<ConsolidationSummary> {
    let input = &provisional.path;
    let reader = BufReader::new(File::open(input).map_err(|e| FastaError::io(input, e))?);
    crate::output::ensure_parent_dir(output)?;
    let mut writer = BufWriter::new(File::create(output).map_err(|e| FastaError::io(output, e))?);

    let mut consolidator = Consolidator {
        options,
        sequences,
        messages,
        line_ending: provisional.line_ending,
        written_hashes: ShardedHashMap::new(HASH_SPANNER_LENGTH),
        written_names: ShardedHashMap::new(HASH_SPANNER_LENGTH),
        summary: ConsolidationSummary::default(),
    };

    let mut lines = LineReader::new(reader, MAX_LINE_LENGTH);
    let mut buf = Vec::new();
    let mut line_number = 0;
    let mut current: Option<Record> = None;

    while lines
        .read_line(&mut buf)
        .map_err(|e| FastaError::io(input, e))?
        .is_some()
    {
        line_number += 1;
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(options.marker) {
            if let Some(record) = current.take() {
                consolidator.handle(record, &mut writer, output)?;
            }
            let (name, description) = match rest.find([' ', '\t']) {
                Some(end) => (&rest[..end], rest[end..].trim_start()),
                None => (rest, ""),
            };
            current = Some(Record {
                header_line: line_number,
                name: name.to_string(),
                description: description.to_string(),
                residues: String::new(),
                line_lengths: Vec::new(),
            });
        } else if let Some(record) = current.as_mut() {
            record.residues.push_str(line);
            record.line_lengths.push(line.len());
        }
    }
    if let Some(record) = current.take() {
        consolidator.handle(record, &mut writer, output)?;
    }
    writer.flush().map_err(|e| FastaError::io(output, e))?;

    let summary = consolidator.summary;
    info!(
        "Consolidated {}: {} proteins written, {} removed",
        output.display(),
        summary.proteins_written,
        summary.proteins_removed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashers::Sha1Hasher;
    use std::fs;
    use std::sync::Arc;

    fn run(input: &str, tracker_input: &[(&str, &str)], consolidate: bool) -> (String, ConsolidationSummary, MessageLog) {
        let dir = tempfile::tempdir().unwrap();
        let provisional = dir.path().join("x_new.fasta.pass1.tmp");
        let output = dir.path().join("x_new.fasta");
        fs::write(&provisional, input).unwrap();

        let mut sequences = SequenceTracker::new(Arc::new(Sha1Hasher), false);
        for (name, residues) in tracker_input {
            sequences.record_sequence(name, residues);
        }
        let mut options = ValidatorOptions::default();
        options.fixed.generate = true;
        options.fixed.consolidate_duplicate_sequences = consolidate;
        options.fixed.keep_duplicate_names_unless_matching_sequence = !consolidate;

        let mut messages = MessageLog::default();
        let summary = correct_for_duplicate_sequences(
            &ProvisionalFixedFile {
                path: provisional,
                line_ending: LineEnding::Lf,
            },
            &output,
            &sequences,
            &options,
            &mut messages,
        )
        .unwrap();
        (fs::read_to_string(output).unwrap(), summary, messages)
    }

    #[test]
    fn test_consolidate_merges_names() {
        let (text, summary, messages) = run(
            ">P1 first\nMKV\n>P2 second\nMKV\n>P3\nAAA\n>P4\nMK\nV\n",
            &[("P1", "MKV"), ("P2", "MKV"), ("P3", "AAA"), ("P4", "MKV")],
            true,
        );
        assert_eq!(text, ">P1 first P2 P4\nMKV\n>P3\nAAA\n");
        assert_eq!(summary.proteins_read, 4);
        assert_eq!(summary.proteins_written, 2);
        assert_eq!(summary.proteins_removed, 2);
        assert_eq!(
            messages.count_of(MessageCode::ProteinRemovedSinceDuplicateSequence),
            2
        );
        assert_eq!(messages.warnings.entries()[0].extra_info, "P1");
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let (first, _, _) = run(
            ">P1 first\nMKV\n>P2\nMKV\n",
            &[("P1", "MKV"), ("P2", "MKV")],
            true,
        );
        let (second, summary, _) = run(&first, &[("P1", "MKV")], true);
        assert_eq!(first, second);
        assert_eq!(summary.proteins_removed, 0);
    }

    #[test]
    fn test_keep_unless_matching() {
        let (text, summary, _) = run(
            ">P1\nMKV\n>P1\nAAA\n>P1\nMKV\n>P2\nMKV\n",
            &[("P1", "MKV"), ("P1", "AAA"), ("P1", "MKV"), ("P2", "MKV")],
            false,
        );
        assert_eq!(text, ">P1\nMKV\n>P1\nAAA\n>P2\nMKV\n");
        assert_eq!(summary.proteins_removed, 1);
    }

    #[test]
    fn test_trailing_whitespace_not_part_of_sequence() {
        let (text, summary, _) = run(
            ">P1\nMKV \t\n>P2\nMKV\n",
            &[("P1", "MKV"), ("P2", "MKV")],
            true,
        );
        assert_eq!(text, ">P1 P2\nMKV\n");
        assert_eq!(summary.proteins_removed, 1);
    }

    #[test]
    fn test_cap_description() {
        let mut description = "é".repeat(10);
        cap_description(&mut description, 4);
        assert_eq!(description, "éééé");
        let long = merged_description(&"x".repeat(MAX_CONSOLIDATED_DESCRIPTION), &["P2"]);
        assert_eq!(long.chars().count(), MAX_CONSOLIDATED_DESCRIPTION);
    }
}
