// main.rs - CLI entry point

use fastaval::cli::Config;
use fastaval::output::report_messages;
use fastaval::prelude::*;
use std::path::Path;
use std::time::Instant;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match run_main() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

/// Ok(false) when at least one file could not be validated
fn run_main() -> Result<bool> {
    let mut args: Args = argh::from_env();

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(true);
    }

    if args.list_hashers {
        println!("Available hashers:");
        for (name, desc) in HasherRegistry::new().list_hashers() {
            println!("  - {}: {}", name, desc);
        }
        return Ok(true);
    }

    // Load configuration file if specified
    let mut custom_rules = None;
    if let Some(config_path) = args.config.clone() {
        let (merged, config) = args.with_config_file(&config_path)?;
        args = merged;
        custom_rules = config.rules;
    }

    let validation = validate_args(&args, custom_rules.as_ref())?;
    let options = validation.options;

    println!("🚀 fastaval v{}", fastaval::VERSION);
    println!("🔨 Hasher: {}", options.hasher);
    println!(
        "📏 Protein names: {}-{} characters, residue lines up to {}",
        options.min_protein_name_length, options.max_protein_name_length, options.max_residues_per_line
    );
    if options.fixed.generate {
        println!(
            "🛠️  Fixed FASTA: on (consolidate: {}, rename duplicates: {})",
            options.fixed.consolidate_duplicate_sequences, options.fixed.rename_duplicate_names
        );
    }
    if let Some(hash_file) = &options.preload_hash_file {
        println!("📦 Preload hash file: {}", hash_file.display());
    }

    let stats_file = options.output.stats_file.clone();
    let validator = FastaValidator::new(options, validation.rules)?.with_progress(validation.show_progress);

    let total_start = Instant::now();
    let mut failed = 0;
    for input in &validation.inputs {
        if !process_file(&validator, input, stats_file.as_deref()) {
            failed += 1;
        }
    }

    let total = validation.inputs.len();
    if failed == 0 {
        println!(
            "\n✅ {} file(s) validated in {:.2}s",
            total,
            total_start.elapsed().as_secs_f64()
        );
    } else {
        println!(
            "\n⚠️  {} of {} file(s) failed in {:.2}s",
            failed,
            total,
            total_start.elapsed().as_secs_f64()
        );
    }
    Ok(failed == 0)
}

/// Validate one input; returns false on a failed run or a structural error
fn process_file(validator: &FastaValidator, input: &Path, stats_file: Option<&Path>) -> bool {
    println!("\n📂 Processing {}", input.display());
    let start = Instant::now();

    let report = match validator.validate_file(input) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ ERROR processing {}: {}", input.display(), e);
            return false;
        }
    };

    let source = input.display().to_string();
    report_messages(&source, &report.messages, stats_file);

    println!(
        "📊 {} lines, {} proteins, {} residues ({} line endings)",
        report.summary.line_count,
        report.summary.protein_count,
        report.summary.residue_count,
        report.line_ending.label()
    );
    if report.unique_sequences > 0 {
        println!(
            "🧬 {} unique sequences, {} shared by several proteins",
            report.unique_sequences, report.duplicated_sequences
        );
    }
    if let Some(preload) = &report.preload {
        println!(
            "📦 Keep list: {} proteins, {} unique sequences, {} name collisions",
            preload.proteins, preload.unique_sequences, preload.name_collisions
        );
    }
    if let Some(consolidation) = &report.consolidation {
        println!(
            "🔗 Consolidated: {} written, {} removed, {} descriptions extended",
            consolidation.proteins_written, consolidation.proteins_removed, consolidation.descriptions_extended
        );
    }
    if let Some(fixed) = &report.fixed_file {
        println!("💾 Fixed FASTA: {}", fixed.display());
    }
    if let Some(hashes) = &report.hash_info_file {
        println!("💾 Protein hashes: {}", hashes.display());
    }
    if let Some(sequence_report) = &report.sequence_report {
        println!("💾 Unique sequences: {} written", sequence_report.unique_sequences);
    }

    if report.summary.aborted {
        println!("⏹️  Aborted after {} lines", report.summary.line_count);
    }
    if report.success() {
        println!(
            "✅ {} errors, {} warnings ({:.2}s)",
            report.error_count(),
            report.warning_count(),
            start.elapsed().as_secs_f64()
        );
        true
    } else {
        println!(
            "❌ Invalid file: {} errors, {} warnings ({:.2}s)",
            report.error_count(),
            report.warning_count(),
            start.elapsed().as_secs_f64()
        );
        false
    }
}
