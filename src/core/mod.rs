// mod.rs - Core logic module

pub mod consolidate;
pub mod duplicates;
pub mod names;
pub mod options;
pub mod parser;
pub mod rules;
pub mod validator;

// Re-export main types for convenience
pub use consolidate::{correct_for_duplicate_sequences, ConsolidationSummary, ProvisionalFixedFile};
pub use duplicates::{DuplicateNamePolicy, NameDecision, NameTracker, SequenceOutcome, SequenceTracker};
pub use names::NameFixer;
pub use options::{FixedFastaOptions, OutputOptions, ValidatorOptions};
pub use parser::{FastaParser, FixedOutput, LineLimits, ParseOutputs, ParseState, ParseSummary};
pub use rules::{
    evaluate, Rule, RuleCategory, RuleDefinition, RuleDefinitions, RuleHit, RuleSet, RuleSettings,
};
pub use validator::{FastaValidator, ValidationReport};
