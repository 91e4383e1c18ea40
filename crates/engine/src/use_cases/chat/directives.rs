//! Movement directives embedded in narrator replies.
//!
//! The narrator ends a reply with `MOVE_TO:<location>` (sometimes wrapped in
//! `**`) when the story takes the player somewhere. The directive is stripped
//! before the reply is shown.

use std::sync::LazyLock;

use regex_lite::Regex;

static MOVE_TO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*{0,2}MOVE_TO:\s*([^\s*]+)\*{0,2}").expect("valid regex")
});

/// Reply text with every directive removed, plus the targets in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub text: String,
    pub move_targets: Vec<String>,
}

pub fn extract_move_directives(reply: &str) -> ParsedReply {
    let move_targets = MOVE_TO_RE
        .captures_iter(reply)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', ',', '!', '?']).to_string())
        .filter(|target| !target.is_empty())
        .collect();

    let text = MOVE_TO_RE.replace_all(reply, "").trim().to_string();
    ParsedReply { text, move_targets }
}
