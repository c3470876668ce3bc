// hash_record.rs - Per-sequence duplicate bookkeeping

use std::collections::HashSet;

/// Residues kept from the start of each sequence for reports
pub const SEQUENCE_START_LENGTH: usize = 20;

/// Everything known about one distinct sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinHashRecord {
    pub sequence_hash: String,
    pub sequence_length: usize,
    pub sequence_start: String,
    pub first_protein_name: String,
    additional_proteins: Vec<String>,
    /// Lookup side of `additional_proteins`; shared sequences can have huge name lists
    additional_index: HashSet<String>,
    pub duplicate_name_count: usize,
}

impl ProteinHashRecord {
    pub fn new(sequence_hash: String, residues: &str, first_protein_name: &str) -> Self {
        Self {
            sequence_hash,
            sequence_length: residues.len(),
            sequence_start: residues.chars().take(SEQUENCE_START_LENGTH).collect(),
            first_protein_name: first_protein_name.to_string(),
            additional_proteins: Vec::new(),
            additional_index: HashSet::new(),
            duplicate_name_count: 0,
        }
    }

    /// Record rebuilt from a hash file row, where residues are not available
    pub fn from_summary(sequence_hash: String, sequence_length: usize, first_protein_name: &str) -> Self {
        Self {
            sequence_hash,
            sequence_length,
            sequence_start: String::new(),
            first_protein_name: first_protein_name.to_string(),
            additional_proteins: Vec::new(),
            additional_index: HashSet::new(),
            duplicate_name_count: 0,
        }
    }

    /// Record another protein with this sequence.
    ///
    /// Returns false when the name was already known for this sequence; a
    /// repeat of the first name bumps `duplicate_name_count`.
    pub fn add_protein(&mut self, protein_name: &str) -> bool {
        if protein_name == self.first_protein_name {
            self.duplicate_name_count += 1;
            return false;
        }
        if !self.additional_index.insert(protein_name.to_string()) {
            return false;
        }
        self.additional_proteins.push(protein_name.to_string());
        true
    }

    /// Additional names in insertion order, never including the first name
    pub fn additional_proteins(&self) -> &[String] {
        &self.additional_proteins
    }

    pub fn has_duplicates(&self) -> bool {
        !self.additional_proteins.is_empty() || self.duplicate_name_count > 0
    }

    /// All occurrences of this sequence in the file
    pub fn protein_count(&self) -> usize {
        1 + self.additional_proteins.len() + self.duplicate_name_count
    }

    pub fn contains_protein(&self, protein_name: &str) -> bool {
        self.first_protein_name == protein_name || self.additional_index.contains(protein_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additional_proteins_set_semantics() {
        let mut record = ProteinHashRecord::new("ABC".to_string(), "MKVLAAGIVGLLLA", "P1");
        assert!(record.add_protein("P2"));
        assert!(!record.add_protein("P2"));
        assert!(!record.add_protein("P1"));
        assert_eq!(record.additional_proteins(), &["P2".to_string()]);
        assert_eq!(record.duplicate_name_count, 1);
        assert_eq!(record.protein_count(), 3);
        assert!(record.contains_protein("P2"));
        assert!(!record.contains_protein("P3"));
    }

    #[test]
    fn test_many_shared_names_keep_insertion_order() {
        let mut record = ProteinHashRecord::new("H".to_string(), "MKV", "DECOY_0");
        for round in 0..3 {
            for i in (0..20_000).rev() {
                let added = record.add_protein(&format!("DECOY_{}", i));
                assert_eq!(added, round == 0 && i != 0);
            }
        }
        assert_eq!(record.additional_proteins().len(), 19_999);
        assert_eq!(record.additional_proteins()[0], "DECOY_19999");
        assert_eq!(record.additional_proteins()[19_998], "DECOY_1");
        assert_eq!(record.duplicate_name_count, 3);
        assert_eq!(record.protein_count(), 20_003);
        assert!(record.contains_protein("DECOY_12345"));
    }

    #[test]
    fn test_sequence_start_is_capped() {
        let residues = "A".repeat(50);
        let record = ProteinHashRecord::new("H".to_string(), &residues, "P1");
        assert_eq!(record.sequence_start.len(), SEQUENCE_START_LENGTH);
        assert_eq!(record.sequence_length, 50);
        assert!(!record.has_duplicates());
    }
}
