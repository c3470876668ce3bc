// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// fastaval - Streaming validator and fixer for protein FASTA files
pub struct Args {
    /// input FASTA file or directory of FASTA files (repeatable)
    #[argh(option, short = 'i')]
    pub input: Vec<String>,

    /// directory for generated files (default: next to each input file)
    #[argh(option, short = 'o')]
    pub output_dir: Option<String>,

    /// header marker character (default: >)
    #[argh(option, default = "'>'")]
    pub marker: char,

    /// minimum protein name length before a warning (default: 3)
    #[argh(option, default = "3")]
    pub min_name_length: usize,

    /// maximum protein name length (default: 60)
    #[argh(option, default = "60")]
    pub max_name_length: usize,

    /// maximum residues per line before a warning (default: 120)
    #[argh(option, default = "120")]
    pub max_residues_per_line: usize,

    /// accept '*' inside residue lines
    #[argh(switch)]
    pub allow_asterisk: bool,

    /// accept '-' inside residue lines
    #[argh(switch)]
    pub allow_dash: bool,

    /// accept any symbol in protein names
    #[argh(switch)]
    pub allow_all_symbols: bool,

    /// warn about blank lines between proteins
    #[argh(switch)]
    pub warn_blank_lines: bool,

    /// do not check for duplicate protein names
    #[argh(switch)]
    pub no_duplicate_names_check: bool,

    /// do not check for duplicate sequences
    #[argh(switch)]
    pub no_duplicate_sequences_check: bool,

    /// silently accept a missing final line terminator
    #[argh(switch)]
    pub add_missing_linefeed: bool,

    /// analyse a CRLF-normalized copy of each input
    #[argh(switch)]
    pub normalize_line_endings: bool,

    /// detail entries kept per message code (default: 150)
    #[argh(option, default = "150")]
    pub max_detail: usize,

    /// sequence hasher: sha1, sha256, md5 (default: sha1)
    #[argh(option, default = "String::from(\"sha1\")")]
    pub hasher: String,

    /// tab-delimited protein hash file used to build a keep list
    #[argh(option)]
    pub preload_hash_file: Option<String>,

    /// write a fixed FASTA file (<name>_new.fasta)
    #[argh(switch)]
    pub fix: bool,

    /// skip duplicate names instead of renaming them
    #[argh(switch)]
    pub no_rename_duplicates: bool,

    /// keep duplicate names unless the sequence also matches
    #[argh(switch)]
    pub keep_duplicate_names: bool,

    /// write each sequence once, merging duplicate names into the description
    #[argh(switch)]
    pub consolidate: bool,

    /// treat I and L as the same residue when hashing
    #[argh(switch)]
    pub ignore_il: bool,

    /// move extra references out of names with several '|' separated references
    #[argh(switch)]
    pub split_refs: bool,

    /// do not truncate long protein names
    #[argh(switch)]
    pub no_truncate: bool,

    /// characters at which long names are split (default: |)
    #[argh(option, default = "String::from(\"|\")")]
    pub split_chars: String,

    /// keep invalid characters in protein names
    #[argh(switch)]
    pub no_replace_invalid_chars: bool,

    /// drop residues that are not valid amino acid symbols
    #[argh(switch)]
    pub remove_invalid_residues: bool,

    /// keep the original residue line wrapping
    #[argh(switch)]
    pub no_wrap: bool,

    /// residues per line in the fixed file (default: 60)
    #[argh(option, default = "60")]
    pub residues_per_line: usize,

    /// write <name>_ProteinHashes.txt
    #[argh(switch)]
    pub save_hash_info: bool,

    /// write <name>_UniqueProteinSeqs.txt and the duplicates mapping file
    #[argh(switch)]
    pub save_unique_report: bool,

    /// append messages to this tab-delimited stats file instead of printing them
    #[argh(option)]
    pub stats_file: Option<String>,

    /// hide the progress bar
    #[argh(switch)]
    pub no_progress: bool,

    /// list available sequence hashers and exit
    #[argh(switch)]
    pub list_hashers: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
