//! `@agent-id` mention scanning.
//!
//! A mention is `@` followed by one or more identifier characters. Mid-word
//! mentions count (`ping@alpha`). The `regex` engine guarantees a scan
//! linear in the input length.

use crate::a2a::types::AgentIdentifier;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_-]+)").expect("mention pattern compiles"));

/// A mention together with the byte span of its `@token` in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub target: AgentIdentifier,
    pub span: Range<usize>,
}

/// All mentions in order of appearance, duplicates kept.
pub fn find_mentions(text: &str) -> Vec<Mention> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let target = AgentIdentifier::parse(caps.get(1)?.as_str()).ok()?;
            Some(Mention {
                target,
                span: whole.range(),
            })
        })
        .collect()
}

/// Identifiers mentioned in `text`, left to right.
pub fn parse(text: &str) -> Vec<AgentIdentifier> {
    find_mentions(text).into_iter().map(|m| m.target).collect()
}

/// Remove exactly the token at `span` and tidy the whitespace around it.
pub fn strip_mention(text: &str, span: &Range<usize>) -> String {
    let before = text.get(..span.start).unwrap_or_default().trim_end();
    let after = text.get(span.end..).unwrap_or_default().trim_start();
    match (before.is_empty(), after.is_empty()) {
        (true, _) => after.trim_end().to_string(),
        (false, true) => before.trim_start().to_string(),
        (false, false) => format!("{} {}", before.trim_start(), after.trim_end()),
    }
}
