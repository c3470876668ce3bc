// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::{FixedFastaOptions, OutputOptions, RuleDefinitions, RuleSet, ValidatorOptions};
use crate::error::{FastaError, Result};
use crate::hashers::HasherRegistry;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions picked up when an input is a directory
pub const FASTA_EXTENSIONS: [&str; 4] = ["fasta", "fa", "faa", "fas"];

#[derive(Debug)]
pub struct ValidationResult {
    pub inputs: Vec<PathBuf>,
    pub options: ValidatorOptions,
    pub rules: RuleSet,
    pub show_progress: bool,
}

fn has_fasta_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| FASTA_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Expand directories into their FASTA files; files are taken as given
pub fn collect_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(&path)
                .map_err(|e| FastaError::io(&path, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_fasta_extension(p))
                .collect();
            if found.is_empty() {
                return Err(FastaError::config(format!(
                    "No FASTA files ({}) found in directory '{}'",
                    FASTA_EXTENSIONS.join(", "),
                    path.display()
                )));
            }
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path);
        } else {
            return Err(FastaError::config(format!("Input '{}' does not exist", input)));
        }
    }
    Ok(files)
}

/// Build validator options from the merged arguments
pub fn build_options(args: &Args) -> ValidatorOptions {
    ValidatorOptions {
        marker: args.marker,
        min_protein_name_length: args.min_name_length,
        max_protein_name_length: args.max_name_length,
        max_residues_per_line: args.max_residues_per_line,
        allow_asterisk: args.allow_asterisk,
        allow_dash: args.allow_dash,
        allow_all_symbols_in_protein_names: args.allow_all_symbols,
        warn_blank_lines_between_proteins: args.warn_blank_lines,
        check_for_duplicate_names: !args.no_duplicate_names_check,
        check_for_duplicate_sequences: !args.no_duplicate_sequences_check,
        add_missing_linefeed: args.add_missing_linefeed,
        normalize_line_endings: args.normalize_line_endings,
        max_detail_per_code: args.max_detail,
        hasher: args.hasher.to_lowercase(),
        preload_hash_file: args.preload_hash_file.as_ref().map(PathBuf::from),
        fixed: FixedFastaOptions {
            generate: args.fix,
            rename_duplicate_names: !args.no_rename_duplicates,
            keep_duplicate_names_unless_matching_sequence: args.keep_duplicate_names,
            consolidate_duplicate_sequences: args.consolidate,
            ignore_il_difference: args.ignore_il,
            split_multiple_refs_in_names: args.split_refs,
            truncate_long_names: !args.no_truncate,
            long_name_split_chars: args.split_chars.clone(),
            replace_invalid_name_characters: !args.no_replace_invalid_chars,
            remove_invalid_residues: args.remove_invalid_residues,
            wrap_long_residue_lines: !args.no_wrap,
            residues_per_line: args.residues_per_line,
        },
        output: OutputOptions {
            output_directory: args.output_dir.as_ref().map(PathBuf::from),
            save_basic_hash_info: args.save_hash_info,
            save_unique_sequence_report: args.save_unique_report,
            stats_file: args.stats_file.as_ref().map(PathBuf::from),
        },
        ..ValidatorOptions::default()
    }
}

/// Validate all command line arguments
pub fn validate_args(args: &Args, custom_rules: Option<&RuleDefinitions>) -> Result<ValidationResult> {
    // Validate hasher type
    let registry = HasherRegistry::new();
    if !registry.has_hasher(&args.hasher) {
        return Err(FastaError::config(format!(
            "Invalid hasher '{}'. Available: {}",
            args.hasher,
            registry.get_hasher_names().join(", ")
        )));
    }

    if args.input.is_empty() {
        return Err(FastaError::config(
            "No input given; use --input or set 'input' in the config file",
        ));
    }

    if args.consolidate && !args.fix {
        return Err(FastaError::config("--consolidate requires --fix"));
    }

    let options = build_options(args);
    options.validate()?;

    let inputs = collect_inputs(&args.input)?;

    if let Some(hash_file) = &options.preload_hash_file {
        if !hash_file.is_file() {
            return Err(FastaError::config(format!(
                "Preload hash file '{}' does not exist",
                hash_file.display()
            )));
        }
        if inputs.len() > 1 {
            return Err(FastaError::config(
                "--preload-hash-file describes a single FASTA file; give exactly one input",
            ));
        }
    }

    let rules = match custom_rules {
        Some(definitions) if !definitions.is_empty() => {
            RuleSet::from_definitions(options.rule_settings(), definitions)?
        }
        _ => RuleSet::default_rules(options.rule_settings())?,
    };

    Ok(ValidationResult {
        inputs,
        options,
        rules,
        show_progress: !args.no_progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RuleDefinition;
    use argh::FromArgs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["fastaval"], args).unwrap()
    }

    #[test]
    fn test_directory_inputs_expand() {
        let dir = TempDir::new().unwrap();
        for name in ["b.fasta", "a.FAA", "notes.txt"] {
            fs::write(dir.path().join(name), ">P1\nMKV\n").unwrap();
        }
        let inputs = collect_inputs(&[dir.path().display().to_string()]).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.FAA", "b.fasta"]);

        let err = collect_inputs(&["/no/such/input.fasta".to_string()]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("x.fasta");
        fs::write(&input, ">P1\nMKV\n").unwrap();
        let input = input.display().to_string();

        let err = validate_args(&parse(&["-i", &input, "--hasher", "crc32"]), None).unwrap_err();
        assert!(err.to_string().contains("sha1"));

        let err = validate_args(
            &parse(&["-i", &input, "--min-name-length", "70", "--max-name-length", "60"]),
            None,
        )
        .unwrap_err();
        assert!(err.is_configuration());

        assert!(validate_args(&parse(&["-i", &input, "--consolidate"]), None).is_err());
        assert!(validate_args(&parse(&[]), None).is_err());
    }

    #[test]
    fn test_options_from_arguments() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("x.fasta");
        fs::write(&input, ">P1\nMKV\n").unwrap();
        let input = input.display().to_string();

        let result = validate_args(
            &parse(&["-i", &input, "--fix", "--consolidate", "--allow-dash", "--no-wrap", "--hasher", "SHA256"]),
            None,
        )
        .unwrap();
        assert_eq!(result.inputs.len(), 1);
        assert!(result.options.fixed.generate);
        assert!(result.options.fixed.consolidate_duplicate_sequences);
        assert!(!result.options.fixed.wrap_long_residue_lines);
        assert!(result.options.allow_dash);
        assert_eq!(result.options.hasher, "sha256");
        assert!(result.show_progress);
    }

    #[test]
    fn test_custom_rules_replace_group() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("x.fasta");
        fs::write(&input, ">P1\nMKV\n").unwrap();
        let input = input.display().to_string();

        let defaults = validate_args(&parse(&["-i", &input]), None).unwrap();
        let custom = RuleDefinitions {
            name: Some(vec![RuleDefinition::new("^sp\\|", "SwissProt style name", 2)]),
            ..RuleDefinitions::default()
        };
        let result = validate_args(&parse(&["-i", &input]), Some(&custom)).unwrap();
        assert_eq!(result.rules.rules(crate::core::RuleCategory::Name).len(), 1);
        assert_eq!(
            result.rules.rules(crate::core::RuleCategory::Sequence).len(),
            defaults.rules.rules(crate::core::RuleCategory::Sequence).len()
        );
    }
}
