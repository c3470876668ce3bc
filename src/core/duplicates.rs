// duplicates.rs - Duplicate sequence and duplicate name detection

use crate::core::names::rename_suffix;
use crate::data::ProteinHashRecord;
use crate::hashers::{compute_hash, SequenceHasher};
use crate::index::{ShardedHashMap, StringIndex};
use std::sync::Arc;

/// Hex digests are uniformly distributed, so a short fixed prefix shards them evenly
pub const HASH_SPANNER_LENGTH: u8 = 2;

/// What `record_sequence` found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceOutcome {
    pub hash: String,
    /// Position of the record in `SequenceTracker::records`
    pub record_index: usize,
    /// Name of the first protein with this sequence when it was seen before
    pub duplicate_of: Option<String>,
}

/// Sequence hashes of one pass, keyed by digest
#[derive(Debug)]
pub struct SequenceTracker {
    hasher: Arc<dyn SequenceHasher>,
    ignore_il_difference: bool,
    records: Vec<ProteinHashRecord>,
    by_hash: ShardedHashMap<usize>,
}

impl SequenceTracker {
    pub fn new(hasher: Arc<dyn SequenceHasher>, ignore_il_difference: bool) -> Self {
        Self {
            hasher,
            ignore_il_difference,
            records: Vec::new(),
            by_hash: ShardedHashMap::new(HASH_SPANNER_LENGTH),
        }
    }

    pub fn hash(&self, residues: &str) -> String {
        compute_hash(self.hasher.as_ref(), residues, self.ignore_il_difference)
    }

    /// Hash the residues and file the protein under that hash
    pub fn record_sequence(&mut self, protein_name: &str, residues: &str) -> SequenceOutcome {
        let hash = self.hash(residues);
        if let Some(&record_index) = self.by_hash.get_value(&hash) {
            let record = &mut self.records[record_index];
            record.add_protein(protein_name);
            return SequenceOutcome {
                duplicate_of: Some(record.first_protein_name.clone()),
                hash,
                record_index,
            };
        }

        let record_index = self.records.len();
        self.records
            .push(ProteinHashRecord::new(hash.clone(), residues, protein_name));
        self.by_hash.insert(&hash, record_index);
        SequenceOutcome {
            hash,
            record_index,
            duplicate_of: None,
        }
    }

    pub fn record_for_hash(&self, hash: &str) -> Option<&ProteinHashRecord> {
        self.by_hash.get_value(hash).map(|&i| &self.records[i])
    }

    /// Records in order of first appearance
    pub fn records(&self) -> &[ProteinHashRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequences shared by more than one protein entry
    pub fn duplicated_sequence_count(&self) -> usize {
        self.records.iter().filter(|r| r.has_duplicates()).count()
    }

    pub fn shard_count(&self) -> usize {
        self.by_hash.shard_count()
    }
}

/// How a repeated protein name is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateNamePolicy {
    pub rename: bool,
    pub keep_unless_matching_sequence: bool,
    /// Renamed copies of a name within this many characters stay within it
    pub max_name_length: Option<usize>,
}

/// `name` with `suffix` appended, cutting the name back so the result stays
/// within `max_length` characters. Names already over the limit are left whole.
fn suffixed_name(name: &str, suffix: &str, max_length: Option<usize>) -> String {
    let base = match max_length {
        Some(max) if name.chars().count() <= max => {
            let keep = max.saturating_sub(suffix.chars().count());
            match name.char_indices().nth(keep) {
                Some((cut, _)) => &name[..cut],
                None => name,
            }
        }
        _ => name,
    };
    format!("{}{}", base, suffix)
}

/// Outcome of `examine_protein_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameDecision {
    Unique,
    Renamed(String),
    Retained,
    Duplicate,
}

/// Protein names seen so far in a pass
#[derive(Debug)]
pub struct NameTracker {
    seen: ShardedHashMap<()>,
}

impl NameTracker {
    pub fn new(spanner_length: u8) -> Self {
        Self {
            seen: ShardedHashMap::new(spanner_length),
        }
    }

    pub fn examine_protein_name(&mut self, name: &str, policy: DuplicateNamePolicy) -> NameDecision {
        if self.seen.insert(name, ()).is_none() {
            return NameDecision::Unique;
        }
        if policy.rename {
            let mut attempt = 0;
            loop {
                let candidate = suffixed_name(name, &rename_suffix(attempt), policy.max_name_length);
                if self.seen.insert(&candidate, ()).is_none() {
                    return NameDecision::Renamed(candidate);
                }
                attempt += 1;
            }
        }
        if policy.keep_unless_matching_sequence {
            NameDecision::Retained
        } else {
            NameDecision::Duplicate
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn spanner_length(&self) -> u8 {
        self.seen.spanner_length()
    }

    pub fn shard_count(&self) -> usize {
        self.seen.shard_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashers::Sha1Hasher;

    fn tracker(ignore_il: bool) -> SequenceTracker {
        SequenceTracker::new(Arc::new(Sha1Hasher), ignore_il)
    }

    #[test]
    fn test_shared_sequence_single_record() {
        let mut sequences = tracker(false);
        let first = sequences.record_sequence("P1", "MKVLA");
        assert_eq!(first.duplicate_of, None);

        let second = sequences.record_sequence("P2", "MKVLA");
        assert_eq!(second.duplicate_of.as_deref(), Some("P1"));
        assert_eq!(second.hash, first.hash);

        assert_eq!(sequences.len(), 1);
        let record = sequences.record_for_hash(&first.hash).unwrap();
        assert_eq!(record.first_protein_name, "P1");
        assert_eq!(record.additional_proteins(), &["P2".to_string()]);
        assert_eq!(sequences.duplicated_sequence_count(), 1);
    }

    #[test]
    fn test_same_name_and_sequence_counts_duplicate_name() {
        let mut sequences = tracker(false);
        sequences.record_sequence("P1", "MKV");
        sequences.record_sequence("P1", "MKV");
        let record = &sequences.records()[0];
        assert_eq!(record.duplicate_name_count, 1);
        assert!(record.additional_proteins().is_empty());
    }

    #[test]
    fn test_ignore_il() {
        let mut sequences = tracker(true);
        sequences.record_sequence("P1", "MKLV");
        let outcome = sequences.record_sequence("P2", "MKIV");
        assert_eq!(outcome.duplicate_of.as_deref(), Some("P1"));

        let mut strict = tracker(false);
        strict.record_sequence("P1", "MKLV");
        assert_eq!(strict.record_sequence("P2", "MKIV").duplicate_of, None);
    }

    #[test]
    fn test_examine_protein_name() {
        let rename = DuplicateNamePolicy {
            rename: true,
            keep_unless_matching_sequence: false,
            max_name_length: None,
        };
        let mut names = NameTracker::new(1);
        assert_eq!(names.examine_protein_name("P1", rename), NameDecision::Unique);
        assert_eq!(
            names.examine_protein_name("P1", rename),
            NameDecision::Renamed("P1-b".to_string())
        );
        assert_eq!(
            names.examine_protein_name("P1", rename),
            NameDecision::Renamed("P1-c".to_string())
        );
        assert_eq!(names.len(), 3);

        let keep = DuplicateNamePolicy {
            rename: false,
            keep_unless_matching_sequence: true,
            max_name_length: None,
        };
        assert_eq!(names.examine_protein_name("P1", keep), NameDecision::Retained);
        assert_eq!(
            names.examine_protein_name("P1", DuplicateNamePolicy::default()),
            NameDecision::Duplicate
        );
    }

    #[test]
    fn test_rename_skips_taken_suffix() {
        let rename = DuplicateNamePolicy {
            rename: true,
            ..Default::default()
        };
        let mut names = NameTracker::new(2);
        names.examine_protein_name("P1-b", rename);
        names.examine_protein_name("P1", rename);
        assert_eq!(
            names.examine_protein_name("P1", rename),
            NameDecision::Renamed("P1-c".to_string())
        );
    }

    #[test]
    fn test_rename_stays_within_max_length() {
        let rename = DuplicateNamePolicy {
            rename: true,
            max_name_length: Some(10),
            ..Default::default()
        };
        let mut names = NameTracker::new(2);
        assert_eq!(names.examine_protein_name("ABCDEFGHIJ", rename), NameDecision::Unique);
        assert_eq!(
            names.examine_protein_name("ABCDEFGHIJ", rename),
            NameDecision::Renamed("ABCDEFGH-b".to_string())
        );
        // Short names keep their full text
        names.examine_protein_name("ABC", rename);
        assert_eq!(
            names.examine_protein_name("ABC", rename),
            NameDecision::Renamed("ABC-b".to_string())
        );
        // Cut on a character boundary
        names.examine_protein_name("ÅÅÅÅÅÅÅÅÅÅ", rename);
        assert_eq!(
            names.examine_protein_name("ÅÅÅÅÅÅÅÅÅÅ", rename),
            NameDecision::Renamed("ÅÅÅÅÅÅÅÅ-b".to_string())
        );

        for _ in 0..30 {
            if let NameDecision::Renamed(name) = names.examine_protein_name("ABCDEFGHIJ", rename) {
                assert!(name.chars().count() <= 10, "{}", name);
            }
        }
        assert_eq!(
            suffixed_name("ABCDEFGHIJKL", "-b", Some(10)),
            "ABCDEFGHIJKL-b",
            "names already over the limit are reported, not cut"
        );
    }
}
