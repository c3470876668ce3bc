// names.rs - Protein name repairs as pure (name, description) transformations

use crate::error::{FastaError, Result};
use regex::Regex;

/// Truncation never shortens a name below this many characters at a split point
pub const MIN_TRUNCATED_NAME_LENGTH: usize = 6;

/// Accession layouts tried before plain truncation, in priority order
const ACCESSION_PATTERNS: [&str; 4] = [
    // UniRef:UPI0001.2|rest
    r"^([A-Za-z]+:[A-Za-z]+[0-9]+\.[0-9]+)[|:;](.+)$",
    // gi|12345|rest
    r"^(gi\|[0-9]+)\|(.+)$",
    // tr|A0A024|ORGANISM|rest
    r"^([A-Za-z]+\|[^|]+\|[^|]+)\|(.+)$",
    r"^([^|:;]+[|:;][^|:;]+)[|:;](.+)$",
];

/// Shortens protein names that are over the length limit
#[derive(Debug, Clone)]
pub struct NameFixer {
    accession_patterns: Vec<Regex>,
}

impl NameFixer {
    pub fn new() -> Result<Self> {
        let accession_patterns = ACCESSION_PATTERNS
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| FastaError::InvalidRule {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { accession_patterns })
    }

    /// Fit `name` within `max_length` characters, moving what is removed to the
    /// front of the description. `None` when the name already fits.
    ///
    /// A recognised accession layout is tried first; then the name is cut at the
    /// last split character repeatedly, and as a last resort at `max_length`.
    pub fn auto_fix_name(
        &self,
        name: &str,
        description: &str,
        max_length: usize,
        split_chars: &str,
    ) -> Option<(String, String)> {
        if name.chars().count() <= max_length {
            return None;
        }

        let mut name = name.to_string();
        let mut description = description.to_string();

        for pattern in &self.accession_patterns {
            if let Some(caps) = pattern.captures(&name) {
                let (head, tail) = (caps[1].to_string(), caps[2].to_string());
                description = prepend_to_description(&tail, &description);
                name = head;
                break;
            }
        }

        while name.chars().count() > max_length {
            let Some(split) = name.rfind(|c| split_chars.contains(c)) else {
                break;
            };
            if name[..split].chars().count() < MIN_TRUNCATED_NAME_LENGTH {
                break;
            }
            description = prepend_to_description(&name[split + 1..], &description);
            name.truncate(split);
        }

        if let Some((cut, _)) = name.char_indices().nth(max_length) {
            description = prepend_to_description(&name[cut..], &description);
            name.truncate(cut);
        }

        Some((name, description))
    }
}

/// `tail` followed by a space and the old description
pub fn prepend_to_description(tail: &str, description: &str) -> String {
    match (tail.is_empty(), description.is_empty()) {
        (true, _) => description.to_string(),
        (false, true) => tail.to_string(),
        (false, false) => format!("{} {}", tail, description),
    }
}

/// Keep the leading `source|organism|id` of a name holding several references
/// and move the remaining references into the description
pub fn split_multiple_refs(name: &str, description: &str) -> Option<(String, String)> {
    let (third_bar, _) = name.match_indices('|').nth(2)?;
    let tail = &name[third_bar + 1..];
    if tail.is_empty() {
        return None;
    }
    Some((
        name[..third_bar].to_string(),
        prepend_to_description(tail, description),
    ))
}

/// Characters accepted in protein names
pub fn is_valid_name_char(c: char, allow_all_symbols: bool) -> bool {
    if allow_all_symbols {
        return !(c.is_whitespace() || c.is_control());
    }
    c.is_ascii_alphanumeric() || ".-_:,|/()[]=+#".contains(c)
}

/// Trim invalid characters from the ends of a name and replace the inner ones with `_`
///
/// `None` when nothing changes or nothing valid remains.
pub fn replace_invalid_characters(name: &str, allow_all_symbols: bool) -> Option<String> {
    let trimmed = name.trim_matches(|c| !is_valid_name_char(c, allow_all_symbols));
    if trimmed.is_empty() {
        return None;
    }
    let fixed: String = trimmed
        .chars()
        .map(|c| if is_valid_name_char(c, allow_all_symbols) { c } else { '_' })
        .collect();
    (fixed != name).then_some(fixed)
}

/// Suffix tried on the given rename attempt: `-b` … `-z`, then `-a2` … `-z2`, `-a3` …
pub fn rename_suffix(attempt: usize) -> String {
    const FIRST_ROUND: usize = 25;
    if attempt < FIRST_ROUND {
        return format!("-{}", (b'b' + attempt as u8) as char);
    }
    let rest = attempt - FIRST_ROUND;
    format!("-{}{}", (b'a' + (rest % 26) as u8) as char, rest / 26 + 2)
}
