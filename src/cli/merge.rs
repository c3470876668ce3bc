// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};
use crate::error::Result;

/// Take the config value when the CLI still holds its default
fn merge_value<T: PartialEq + Clone>(cli: &mut T, default: T, config: &Option<T>) {
    if let Some(value) = config {
        if *cli == default {
            *cli = value.clone();
        }
    }
}

/// Switches can only be turned on by the config file
fn merge_switch(cli: &mut bool, config: Option<bool>) {
    if !*cli && config.unwrap_or(false) {
        *cli = true;
    }
}

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: &Config) -> Self {
        // Input/Output
        if self.input.is_empty() {
            self.input = config.input.clone().unwrap_or_default();
        }
        if self.output_dir.is_none() {
            self.output_dir = config.output_dir.clone();
        }
        if self.stats_file.is_none() {
            self.stats_file = config.stats_file.clone();
        }
        merge_switch(&mut self.save_hash_info, config.save_hash_info);
        merge_switch(&mut self.save_unique_report, config.save_unique_report);

        // Validation (only override defaults, not explicit CLI values)
        merge_value(&mut self.marker, '>', &config.marker);
        merge_value(&mut self.min_name_length, 3, &config.min_name_length);
        merge_value(&mut self.max_name_length, 60, &config.max_name_length);
        merge_value(&mut self.max_residues_per_line, 120, &config.max_residues_per_line);
        merge_switch(&mut self.allow_asterisk, config.allow_asterisk);
        merge_switch(&mut self.allow_dash, config.allow_dash);
        merge_switch(&mut self.allow_all_symbols, config.allow_all_symbols);
        merge_switch(&mut self.warn_blank_lines, config.warn_blank_lines);
        merge_switch(&mut self.no_duplicate_names_check, config.no_duplicate_names_check);
        merge_switch(&mut self.no_duplicate_sequences_check, config.no_duplicate_sequences_check);
        merge_switch(&mut self.add_missing_linefeed, config.add_missing_linefeed);
        merge_switch(&mut self.normalize_line_endings, config.normalize_line_endings);
        merge_value(&mut self.max_detail, 150, &config.max_detail);
        merge_value(&mut self.hasher, "sha1".to_string(), &config.hasher);
        if self.preload_hash_file.is_none() {
            self.preload_hash_file = config.preload_hash_file.clone();
        }

        // Fixed FASTA file
        merge_switch(&mut self.fix, config.fix);
        merge_switch(&mut self.no_rename_duplicates, config.no_rename_duplicates);
        merge_switch(&mut self.keep_duplicate_names, config.keep_duplicate_names);
        merge_switch(&mut self.consolidate, config.consolidate);
        merge_switch(&mut self.ignore_il, config.ignore_il);
        merge_switch(&mut self.split_refs, config.split_refs);
        merge_switch(&mut self.no_truncate, config.no_truncate);
        merge_value(&mut self.split_chars, "|".to_string(), &config.split_chars);
        merge_switch(&mut self.no_replace_invalid_chars, config.no_replace_invalid_chars);
        merge_switch(&mut self.remove_invalid_residues, config.remove_invalid_residues);
        merge_switch(&mut self.no_wrap, config.no_wrap);
        merge_value(&mut self.residues_per_line, 60, &config.residues_per_line);

        self
    }

    /// Load configuration and merge with CLI args; the config is returned for its rules
    pub fn with_config_file(self, config_path: &str) -> Result<(Self, Config)> {
        let config = Config::from_file(config_path)?;
        Ok((self.merge_with_config(&config), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["fastaval"], args).unwrap()
    }

    #[test]
    fn test_cli_values_win() {
        let config = Config {
            input: Some(vec!["from_config.fasta".to_string()]),
            max_name_length: Some(40),
            min_name_length: Some(5),
            hasher: Some("md5".to_string()),
            fix: Some(true),
            ..Config::new()
        };
        let args = parse(&["--input", "cli.fasta", "--max-name-length", "80"]).merge_with_config(&config);

        assert_eq!(args.input, vec!["cli.fasta"]);
        assert_eq!(args.max_name_length, 80);
        assert_eq!(args.min_name_length, 5);
        assert_eq!(args.hasher, "md5");
        assert!(args.fix);
    }

    #[test]
    fn test_config_fills_missing_inputs() {
        let config = Config {
            input: Some(vec!["a.fasta".to_string(), "b.fasta".to_string()]),
            split_chars: Some("|;".to_string()),
            ..Config::new()
        };
        let args = parse(&[]).merge_with_config(&config);
        assert_eq!(args.input.len(), 2);
        assert_eq!(args.split_chars, "|;");
        assert!(!args.fix);
    }
}
