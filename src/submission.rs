use regex::Regex;
use std::sync::OnceLock;

fn permalink_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:reddit\.com/(?:r/[A-Za-z0-9_]+/)?comments/|redd\.it/)([a-z0-9]{4,10})")
            .expect("permalink pattern is valid")
    })
}

fn bare_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:t3_)?([a-z0-9]{4,10})$").expect("bare id pattern is valid")
    })
}

/// Extract a normalized submission id from free-form user input.
///
/// Accepts full `reddit.com` permalinks (with or without the subreddit
/// segment), `redd.it` short links, `t3_`-prefixed fullnames and bare base36
/// ids. Returns `None` for anything else; this is a pure precondition check
/// and never touches the network.
#[must_use]
pub fn extract_submission_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.contains("reddit.com") || input.contains("redd.it") {
        permalink_pattern()
            .captures(input)
            .map(|captures| captures[1].to_string())
    } else {
        bare_id_pattern()
            .captures(input)
            .map(|captures| captures[1].to_string())
    }
}
