//! Parser for retest commands in comment text.
//!
//! A comment starting with `retest <service>` asks the service to re-run
//! rule dispatch for the commented pull request; an optional
//! `/<subservice>` suffix restricts the run to the rule with that name.
//!
//! # Parsing rules
//!
//! - The grammar is anchored at the start of the comment
//! - Matching is ASCII case-insensitive
//! - The service name must end at a word boundary or `/`, so
//!   `retest change-relayx` is not a command for `change-relay`
//! - A `/` with no word characters after it counts as no subservice
//! - Returns `None` if the comment is not a retest command

/// A parsed retest command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetestCommand {
    /// When present, only the rule with this name runs.
    pub only_rule: Option<String>,
}

/// Parses a retest command addressed to `root_service`.
///
/// ```
/// use change_relay::commands::{parse_retest, RetestCommand};
///
/// assert_eq!(
///     parse_retest("retest change-relay", "change-relay"),
///     Some(RetestCommand { only_rule: None })
/// );
/// assert_eq!(
///     parse_retest("retest change-relay/alarms", "change-relay"),
///     Some(RetestCommand { only_rule: Some("alarms".to_string()) })
/// );
/// assert_eq!(parse_retest("lgtm, merging", "change-relay"), None);
/// ```
pub fn parse_retest(text: &str, root_service: &str) -> Option<RetestCommand> {
    let rest = strip_prefix_ignore_case(text, "retest ")?;
    let rest = strip_prefix_ignore_case(rest.trim_start(), root_service)?;

    match rest.chars().next() {
        // Bare `retest <service>`: run everything.
        None => Some(RetestCommand { only_rule: None }),
        Some('/') => {
            let subservice: String = rest[1..]
                .chars()
                .take_while(|c| is_word_char(*c))
                .collect();
            Some(RetestCommand {
                only_rule: (!subservice.is_empty()).then(|| subservice.to_ascii_lowercase()),
            })
        }
        // The service name must end here, not continue into a longer word.
        Some(c) if is_word_char(c) => None,
        Some(_) => Some(RetestCommand { only_rule: None }),
    }
}

/// Strips `prefix` from the start of `text`, ASCII case-insensitively.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let candidate = text.get(..prefix.len())?;
    candidate
        .eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
