// stats.rs - Error and warning output to the console or an appended stats file

use crate::data::{MessageLog, MessageStore};
use crate::error::{FastaError, Result};
use csv::{QuoteStyle, WriterBuilder};
use log::warn;
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::Duration;

pub const STATS_HEADER: [&str; 8] = [
    "Date",
    "SourceFile",
    "MessageType",
    "LineNumber",
    "ColumnNumber",
    "Description_or_Protein",
    "Info",
    "Context",
];

/// Attempts at opening the stats file before falling back to the console
pub const STATS_OPEN_ATTEMPTS: usize = 3;
const STATS_RETRY_DELAY: Duration = Duration::from_millis(250);

/// One row of the stats file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRow {
    pub message_type: &'static str,
    pub line_number: usize,
    pub column_number: usize,
    pub description_or_protein: String,
    pub info: String,
    pub context: String,
}

fn store_rows(store: &MessageStore, message_type: &'static str, rows: &mut Vec<StatsRow>) {
    for entry in store.entries() {
        let description = store.describe(entry.code);
        let info = if entry.extra_info.is_empty() {
            description
        } else {
            format!("{}: {}", description, entry.extra_info)
        };
        rows.push(StatsRow {
            message_type,
            line_number: entry.line_number,
            column_number: entry.column_number,
            description_or_protein: entry.protein_name.clone(),
            info,
            context: entry.context.clone(),
        });
    }

    for (&code, count) in store.counts() {
        let mut info = format!("Count: {}", count.total());
        if count.overflow > 0 {
            info.push_str(&format!(" ({} not listed)", count.overflow));
        }
        rows.push(StatsRow {
            message_type,
            line_number: 0,
            column_number: 0,
            description_or_protein: store.describe(code),
            info,
            context: String::new(),
        });
    }
}

/// Detail rows followed by per-code totals, errors first
pub fn stats_rows(log: &MessageLog) -> Vec<StatsRow> {
    let mut rows = Vec::new();
    store_rows(&log.errors, "Error", &mut rows);
    store_rows(&log.warnings, "Warning", &mut rows);
    rows
}

fn open_with_retries(path: &Path) -> Result<File> {
    let mut attempt = 1;
    loop {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => return Ok(file),
            Err(e) if attempt < STATS_OPEN_ATTEMPTS => {
                warn!(
                    "Could not open stats file {} (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    STATS_OPEN_ATTEMPTS,
                    e
                );
                attempt += 1;
                thread::sleep(STATS_RETRY_DELAY);
            }
            Err(e) => return Err(FastaError::io(path, e)),
        }
    }
}

/// Tabs and line breaks would shift the stats columns
fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\t', '\r', '\n']) {
        Cow::Owned(text.replace(['\t', '\r', '\n'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

/// Append the messages of one file; the header is written when the file is new
pub fn append_stats_file(path: &Path, source_file: &str, log: &MessageLog) -> Result<usize> {
    let is_new = path.metadata().map_or(true, |m| m.len() == 0);
    let file = open_with_retries(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_writer(file);

    if is_new {
        writer.write_record(STATS_HEADER)?;
    }

    let date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let source_file = single_line(source_file);
    let rows = stats_rows(log);
    for row in &rows {
        let line = row.line_number.to_string();
        let column = row.column_number.to_string();
        writer.write_record([
            date.as_str(),
            source_file.as_ref(),
            row.message_type,
            line.as_str(),
            column.as_str(),
            single_line(&row.description_or_protein).as_ref(),
            single_line(&row.info).as_ref(),
            single_line(&row.context).as_ref(),
        ])?;
    }
    writer.flush().map_err(|e| FastaError::io(path, e))?;
    Ok(rows.len())
}

/// Print messages in the same layout as the stats file
pub fn print_messages(source_file: &str, log: &MessageLog) {
    if log.errors.is_empty() && log.warnings.is_empty() {
        println!("✅ {}: no errors or warnings", source_file);
        return;
    }
    for row in stats_rows(log) {
        let icon = if row.message_type == "Error" { "❌" } else { "⚠️ " };
        if row.line_number == 0 {
            println!("{} {}: {}", icon, row.description_or_protein, row.info);
        } else if row.context.is_empty() {
            println!(
                "{} line {}: {} - {}",
                icon, row.line_number, row.description_or_protein, row.info
            );
        } else {
            println!(
                "{} line {}, col {}: {} - {} [{}]",
                icon, row.line_number, row.column_number, row.description_or_protein, row.info, row.context
            );
        }
    }
}

/// Stats file when configured and reachable, console otherwise
pub fn report_messages(source_file: &str, log: &MessageLog, stats_file: Option<&Path>) {
    if let Some(path) = stats_file {
        match append_stats_file(path, source_file, log) {
            Ok(_) => return,
            Err(e) => warn!("Stats file unavailable, printing to console instead: {}", e),
        }
    }
    print_messages(source_file, log);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MessageCode, MessageEntry};

    fn sample_log() -> MessageLog {
        let mut log = MessageLog::new(1);
        log.record(MessageCode::DuplicateProteinName, 5, "P1", "");
        log.record(MessageCode::DuplicateProteinName, 9, "P1", "");
        log.record(MessageCode::ResiduesLineTooLong, 2, "P0", "50");
        log
    }

    #[test]
    fn test_rows() {
        let rows = stats_rows(&sample_log());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].message_type, "Error");
        assert_eq!(rows[0].line_number, 5);
        assert_eq!(rows[1].info, "Count: 2 (1 not listed)");
        assert_eq!(rows[2].info, "Residues line is longer than the maximum allowed length: 50");
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        let log = sample_log();

        assert_eq!(append_stats_file(&path, "a.fasta", &log).unwrap(), 4);
        append_stats_file(&path, "b.fasta", &log).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Date\tSourceFile").count(), 1);
        assert_eq!(text.lines().count(), 9);
        assert!(text.contains("\tb.fasta\tWarning\t2\t0\tP0\t"));
    }

    #[test]
    fn test_free_text_keeps_column_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        let mut log = MessageLog::new(5);
        log.warnings
            .register_description(1001, "Protein description\tcontains a tab");
        log.record_entry(
            false,
            MessageEntry {
                line_number: 3,
                column_number: 7,
                protein_name: "Prot\t1".to_string(),
                code: 1001,
                extra_info: "tab found".to_string(),
                context: " some\tdesc\r\n".to_string(),
            },
        );

        append_stats_file(&path, "a.fasta", &log).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        for line in text.lines() {
            assert_eq!(line.split('\t').count(), STATS_HEADER.len(), "{}", line);
        }
        assert!(text.contains("\tProt 1\tProtein description contains a tab: tab found\t"));
        assert!(text.contains(" some desc  \n"));
    }
}
