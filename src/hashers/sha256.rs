// sha256.rs - SHA256 hasher implementation

use super::traits::SequenceHasher;

/// SHA256 hasher - cryptographically secure alternative
#[derive(Debug, Clone)]
pub struct Sha256Hasher;

impl SequenceHasher for Sha256Hasher {
    fn hash_residues(&self, residues: &[u8]) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(residues);
        format!("{:X}", hasher.finalize())
    }

    fn name(&self) -> &'static str {
        "SHA256"
    }

    fn description(&self) -> &'static str {
        "SHA256 hash for cryptographically secure sequence identification"
    }

    fn digest_length(&self) -> usize {
        64
    }
}
