// md5.rs - MD5 hasher implementation

use super::traits::SequenceHasher;

/// MD5 hasher - legacy compatibility
#[derive(Debug, Clone)]
pub struct Md5Hasher;

impl SequenceHasher for Md5Hasher {
    fn hash_residues(&self, residues: &[u8]) -> String {
        let digest = md5::compute(residues);
        format!("{:X}", digest)
    }

    fn name(&self) -> &'static str {
        "MD5"
    }

    fn description(&self) -> &'static str {
        "MD5 hash for legacy compatibility"
    }

    fn digest_length(&self) -> usize {
        32
    }
}
