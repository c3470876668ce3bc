// mod.rs - Sharded string indices

pub mod hash_map;
pub mod sorted_list;
pub mod spanner;
pub mod traits;

// Re-export main types for convenience
pub use hash_map::ShardedHashMap;
pub use sorted_list::ShardedSortedList;
pub use spanner::{estimate_spanner_length, sample_column, sample_fasta_names, SpannerEstimate};
pub use traits::{shard_key, StringIndex};
