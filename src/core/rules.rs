// rules.rs - Pattern rules for header, name, description and sequence checks

use crate::data::messages::CUSTOM_RULE_ID_START;
use crate::error::{FastaError, Result};
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Rules at or above this severity are errors
pub const ERROR_SEVERITY: u8 = 5;
pub const MAX_SEVERITY: u8 = 9;

/// Characters of context shown around a rule match
pub const DEFAULT_CONTEXT_WIDTH: usize = 11;

/// Part of a header or residue line a rule group is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Header,
    Name,
    Description,
    Sequence,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::Header,
        RuleCategory::Name,
        RuleCategory::Description,
        RuleCategory::Sequence,
    ];
}

fn default_true() -> bool {
    true
}

fn default_severity() -> u8 {
    ERROR_SEVERITY
}

/// A rule as written in a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub pattern: String,
    pub message: String,
    /// When false the rule fires if the pattern does not match
    #[serde(default = "default_true")]
    pub match_means_problem: bool,
    #[serde(default = "default_severity")]
    pub severity: u8,
    #[serde(default)]
    pub show_match_as_context: bool,
}

impl RuleDefinition {
    pub fn new(pattern: &str, message: &str, severity: u8) -> Self {
        Self {
            pattern: pattern.to_string(),
            message: message.to_string(),
            match_means_problem: true,
            severity,
            show_match_as_context: false,
        }
    }

    fn inverted(mut self) -> Self {
        self.match_means_problem = false;
        self
    }

    fn showing_match(mut self) -> Self {
        self.show_match_as_context = true;
        self
    }
}

/// Custom rule groups; a group that is present replaces the built-in one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinitions {
    pub header: Option<Vec<RuleDefinition>>,
    pub name: Option<Vec<RuleDefinition>>,
    pub description: Option<Vec<RuleDefinition>>,
    pub sequence: Option<Vec<RuleDefinition>>,
}

impl RuleDefinitions {
    pub fn group(&self, category: RuleCategory) -> Option<&Vec<RuleDefinition>> {
        match category {
            RuleCategory::Header => self.header.as_ref(),
            RuleCategory::Name => self.name.as_ref(),
            RuleCategory::Description => self.description.as_ref(),
            RuleCategory::Sequence => self.sequence.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        RuleCategory::ALL.iter().all(|c| self.group(*c).is_none())
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: u32,
    pub regex: Regex,
    pub message: String,
    pub match_means_problem: bool,
    pub severity: u8,
    pub show_match_as_context: bool,
}

impl Rule {
    pub fn compile(definition: &RuleDefinition, id: u32) -> Result<Self> {
        if definition.severity > MAX_SEVERITY {
            return Err(FastaError::InvalidRule {
                pattern: definition.pattern.clone(),
                message: format!("severity {} is above {}", definition.severity, MAX_SEVERITY),
            });
        }
        let regex = Regex::new(&definition.pattern).map_err(|e| FastaError::InvalidRule {
            pattern: definition.pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            id,
            regex,
            message: definition.message.clone(),
            match_means_problem: definition.match_means_problem,
            severity: definition.severity,
            show_match_as_context: definition.show_match_as_context,
        })
    }

    pub fn is_error(&self) -> bool {
        self.severity >= ERROR_SEVERITY
    }
}

/// One rule that fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub rule_id: u32,
    pub is_error: bool,
    /// 1-based column in the full line
    pub column: usize,
    pub extra_info: String,
    pub context: String,
}

/// Which built-in checks are relaxed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleSettings {
    pub marker: char,
    pub allow_asterisk: bool,
    pub allow_dash: bool,
    pub allow_all_symbols_in_protein_names: bool,
}

/// The four ordered rule groups
#[derive(Debug, Clone)]
pub struct RuleSet {
    header: Vec<Rule>,
    name: Vec<Rule>,
    description: Vec<Rule>,
    sequence: Vec<Rule>,
}

impl RuleSet {
    /// Built-in rules
    pub fn default_rules(settings: RuleSettings) -> Result<Self> {
        Self::from_definitions(settings, &RuleDefinitions::default())
    }

    /// Built-in rules with any custom groups swapped in.
    ///
    /// Malformed custom rules are logged and skipped.
    pub fn from_definitions(settings: RuleSettings, custom: &RuleDefinitions) -> Result<Self> {
        let mut next_id = CUSTOM_RULE_ID_START;
        let mut groups: Vec<Vec<Rule>> = Vec::with_capacity(4);

        for category in RuleCategory::ALL {
            let mut rules = Vec::new();
            match custom.group(category) {
                Some(definitions) => {
                    for definition in definitions {
                        match Rule::compile(definition, next_id) {
                            Ok(rule) => {
                                rules.push(rule);
                                next_id += 1;
                            }
                            Err(e) => warn!("Skipping {:?} rule: {}", category, e),
                        }
                    }
                }
                None => {
                    for definition in default_definitions(category, settings) {
                        rules.push(Rule::compile(&definition, next_id)?);
                        next_id += 1;
                    }
                }
            }
            groups.push(rules);
        }

        let sequence = groups.pop().unwrap_or_default();
        let description = groups.pop().unwrap_or_default();
        let name = groups.pop().unwrap_or_default();
        let header = groups.pop().unwrap_or_default();
        Ok(Self {
            header,
            name,
            description,
            sequence,
        })
    }

    pub fn rules(&self, category: RuleCategory) -> &[Rule] {
        match category {
            RuleCategory::Header => &self.header,
            RuleCategory::Name => &self.name,
            RuleCategory::Description => &self.description,
            RuleCategory::Sequence => &self.sequence,
        }
    }

    /// Every rule in id order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.header
            .iter()
            .chain(&self.name)
            .chain(&self.description)
            .chain(&self.sequence)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn default_definitions(category: RuleCategory, settings: RuleSettings) -> Vec<RuleDefinition> {
    match category {
        RuleCategory::Header => {
            let marker = regex::escape(&settings.marker.to_string());
            vec![
                RuleDefinition::new(
                    &format!("^{}[ \\t]*$", marker),
                    "Protein name is missing after the header marker",
                    7,
                ),
                RuleDefinition::new(
                    &format!("^{}[ \\t].+", marker),
                    "Space or tab found directly after the header marker",
                    7,
                ),
                RuleDefinition::new(
                    &format!("^{}[^ \\t]+\\t", marker),
                    "Protein name and description are separated by a tab",
                    3,
                ),
            ]
        }
        RuleCategory::Name => {
            let invalid = if settings.allow_all_symbols_in_protein_names {
                RuleDefinition::new(
                    r"[\x00-\x20\x7F]",
                    "Protein name contains a space or control character",
                    7,
                )
            } else {
                RuleDefinition::new(
                    r"[^A-Za-z0-9.\-_:,|/()\[\]=+#]",
                    "Protein name contains invalid characters",
                    7,
                )
                .showing_match()
            };
            vec![
                invalid,
                RuleDefinition::new(
                    "^[A-Za-z0-9]",
                    "Protein name does not start with a letter or number",
                    3,
                )
                .inverted(),
                RuleDefinition::new(
                    r"\|[^|]*\|[^|]*\|",
                    "Protein name contains three or more vertical bars",
                    4,
                ),
            ]
        }
        RuleCategory::Description => vec![
            RuleDefinition::new("\"", "Protein description contains a quotation mark", 3),
            RuleDefinition::new("\t", "Protein description contains a tab", 3),
            RuleDefinition::new(r"\\/", "Protein description contains an escaped slash", 3),
            RuleDefinition::new(
                r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]",
                "Protein description contains a control character",
                5,
            ),
            RuleDefinition::new("^.{900,}", "Protein description is over 900 characters long", 4),
        ],
        RuleCategory::Sequence => {
            let mut rules = vec![RuleDefinition::new(r"\s", "Space or tab found in the residues", 7)];
            if !settings.allow_asterisk {
                rules.push(RuleDefinition::new(r"\*", "Asterisk found in the residues", 7));
            }
            if !settings.allow_dash {
                rules.push(RuleDefinition::new("-", "Dash found in the residues", 7));
            }
            rules.push(
                RuleDefinition::new(r"[^A-Za-z \t*\-]", "Invalid residue found", 7).showing_match(),
            );
            rules.push(
                RuleDefinition::new("(?i)[BJOUXZ]", "Ambiguous or non-standard residue found", 3)
                    .showing_match(),
            );
            rules
        }
    }
}

/// Evaluate `text`, found at byte `offset_in_line` of `full_line`, against `rules`
///
/// Each rule fires at most once per call.
pub fn evaluate(
    rules: &[Rule],
    text: &str,
    offset_in_line: usize,
    full_line: &str,
    context_width: usize,
) -> Vec<RuleHit> {
    let mut hits = Vec::new();
    for rule in rules {
        let found = rule.regex.find(text);
        let (position, extra_info) = match (found, rule.match_means_problem) {
            (Some(m), true) => {
                let extra = if rule.show_match_as_context {
                    m.as_str().to_string()
                } else {
                    String::new()
                };
                (offset_in_line + m.start(), extra)
            }
            (None, false) => (offset_in_line, String::new()),
            _ => continue,
        };

        hits.push(RuleHit {
            rule_id: rule.id,
            is_error: rule.is_error(),
            column: position + 1,
            extra_info,
            context: context_window(full_line, position, context_width),
        });
    }
    hits
}

/// Slice of `line` centred on byte `position`; the width is made odd and the
/// window is clamped to the line and to character boundaries
pub fn context_window(line: &str, position: usize, width: usize) -> String {
    if line.is_empty() || width == 0 {
        return String::new();
    }
    let width = if width % 2 == 0 { width + 1 } else { width };
    let half = width / 2;
    let center = position.min(line.len() - 1);

    let mut start = center.saturating_sub(half);
    while !line.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (center + half + 1).min(line.len());
    while !line.is_char_boundary(end) {
        end += 1;
    }
    line[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RuleSettings {
        RuleSettings {
            marker: '>',
            ..Default::default()
        }
    }

    #[test]
    fn test_default_ids_start_at_custom_range() {
        let rules = RuleSet::default_rules(settings()).unwrap();
        let ids: Vec<u32> = rules.iter().map(|r| r.id).collect();
        assert_eq!(ids[0], CUSTOM_RULE_ID_START);
        assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_header_rules() {
        let rules = RuleSet::default_rules(settings()).unwrap();
        let header = rules.rules(RuleCategory::Header);

        assert!(evaluate(header, ">P1 desc", 0, ">P1 desc", 11).is_empty());

        let hits = evaluate(header, "> P1", 0, "> P1", 11);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].is_error);

        let hits = evaluate(header, ">P1\tdesc", 0, ">P1\tdesc", 11);
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].is_error);
    }

    #[test]
    fn test_inverted_name_rule() {
        let rules = RuleSet::default_rules(settings()).unwrap();
        let name_rules = rules.rules(RuleCategory::Name);

        let hits = evaluate(name_rules, "_P1", 1, ">_P1 x", 11);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].column, 2);
        assert!(!hits[0].is_error);

        let hits = evaluate(name_rules, "P1;x", 1, ">P1;x", 11);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].extra_info, ";");
        assert_eq!(hits[0].column, 4);
    }

    #[test]
    fn test_allow_all_symbols() {
        let relaxed = RuleSettings {
            allow_all_symbols_in_protein_names: true,
            ..settings()
        };
        let rules = RuleSet::default_rules(relaxed).unwrap();
        assert!(evaluate(rules.rules(RuleCategory::Name), "P1;x", 1, ">P1;x", 11).is_empty());
    }

    #[test]
    fn test_sequence_rules() {
        let rules = RuleSet::default_rules(settings()).unwrap();
        let sequence = rules.rules(RuleCategory::Sequence);
        assert!(evaluate(sequence, "MKVLA", 0, "MKVLA", 11).is_empty());

        let hits = evaluate(sequence, "MK-VX", 0, "MK-VX", 11);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].is_error);
        assert_eq!(hits[0].column, 3);
        assert_eq!(hits[1].extra_info, "X");
        assert!(!hits[1].is_error);

        let allowed = RuleSettings {
            allow_dash: true,
            allow_asterisk: true,
            ..settings()
        };
        let rules = RuleSet::default_rules(allowed).unwrap();
        assert!(evaluate(rules.rules(RuleCategory::Sequence), "MK-V*", 0, "MK-V*", 11).is_empty());
    }

    #[test]
    fn test_custom_group_replaces_default() {
        let custom: RuleDefinitions = toml::from_str(
            r#"
[[name]]
pattern = "^sp\\|"
message = "SwissProt name"
severity = 2

[[name]]
pattern = "(unclosed"
message = "broken"

[[name]]
pattern = "x"
message = "too severe"
severity = 12
"#,
        )
        .unwrap();
        let rules = RuleSet::from_definitions(settings(), &custom).unwrap();
        let name_rules = rules.rules(RuleCategory::Name);
        assert_eq!(name_rules.len(), 1);
        assert_eq!(name_rules[0].message, "SwissProt name");
        assert_eq!(rules.rules(RuleCategory::Header).len(), 3);
    }

    #[test]
    fn test_context_window() {
        assert_eq!(context_window("ABCDEFGHIJ", 5, 4), "DEFGH");
        assert_eq!(context_window("ABCDEFGHIJ", 0, 5), "ABC");
        assert_eq!(context_window("ABCDEFGHIJ", 9, 5), "HIJ");
        assert_eq!(context_window("aéb", 1, 1), "é");
        assert_eq!(context_window("", 3, 5), "");
    }
}
