//! Argument extraction. Runs on the raw utterance regardless of which stage
//! produced the match.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    /// The original, unmodified input.
    pub raw: String,
    /// First phase-number-shaped token (`3`, `03`, `2.1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_number: Option<String>,
    /// `--flag` tokens in order of first appearance, without duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

static FLAG_RE: OnceLock<Regex> = OnceLock::new();
static PHASE_RE: OnceLock<Regex> = OnceLock::new();

fn flag_re() -> &'static Regex {
    FLAG_RE.get_or_init(|| {
        Regex::new(r"(?:^|\s)(--[A-Za-z][A-Za-z0-9-]*)(?:=\S*)?").expect("valid regex")
    })
}

fn phase_re() -> &'static Regex {
    PHASE_RE.get_or_init(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("valid regex"))
}

pub fn extract(raw: &str) -> Arguments {
    let mut flags: Vec<String> = Vec::new();
    for cap in flag_re().captures_iter(raw) {
        let flag = cap[1].to_lowercase();
        if !flags.contains(&flag) {
            flags.push(flag);
        }
    }
    // Numbers that belong to flags (`--limit=5`) are not phase numbers.
    let without_flags = flag_re().replace_all(raw, " ");
    let phase_number = phase_re()
        .find(&without_flags)
        .map(|m| m.as_str().to_string());

    Arguments {
        raw: raw.to_string(),
        phase_number,
        flags,
    }
}
