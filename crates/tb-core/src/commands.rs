use crate::types::{Action, Command};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const TICKET_PREFIX: &str = r"(?:#|(?:ticket|issue|bug)[: ]?)";

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    let reference = format!("{TICKET_PREFIX}[0-9]+");
    Regex::new(&format!(
        r"(?P<action>[A-Za-z]*).?(?P<tickets>{reference}(?:(?:[, &]*|[ ]?and[ ]?){reference})*)"
    ))
    .expect("command pattern compiles")
});

static TICKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("{TICKET_PREFIX}([0-9]+)")).expect("ticket pattern compiles")
});

/// Extracts every `(action, ticket)` pair from `message`, left to right.
pub fn parse(message: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    for caps in COMMAND_RE.captures_iter(message) {
        let word = caps.name("action").map_or("", |m| m.as_str());
        let Some(action) = Action::from_word(word) else {
            continue;
        };
        let tickets = caps.name("tickets").map_or("", |m| m.as_str());
        for ticket in TICKET_RE.captures_iter(tickets) {
            let digits = &ticket[1];
            match digits.parse::<u64>() {
                Ok(id) => commands.push(Command::new(action, id)),
                Err(_) => debug!(digits, "ticket reference out of range"),
            }
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use Action::{Close, Reference, ReturnToReporter};

    fn cmds(pairs: &[(Action, u64)]) -> Vec<Command> {
        pairs.iter().map(|&(a, id)| Command::new(a, id)).collect()
    }

    #[test]
    fn test_no_action_words() {
        assert!(parse("").is_empty());
        assert!(parse("Tidy up the README").is_empty());
        assert!(parse("#12 is still broken").is_empty());
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(
            parse("Fixes #10, #12 and #14"),
            cmds(&[(Close, 10), (Close, 12), (Close, 14)])
        );
    }

    #[test]
    fn test_named_reference_forms() {
        assert_eq!(
            parse("Refs ticket:5 & issue:6"),
            cmds(&[(Reference, 5), (Reference, 6)])
        );
        assert_eq!(
            parse("see bug 3 and ticket 4"),
            cmds(&[(Reference, 3), (Reference, 4)])
        );
        assert_eq!(parse("closes issue8"), cmds(&[(Close, 8)]));
    }

    #[test]
    fn test_unknown_action_is_dropped() {
        assert!(parse("unknownverb #1").is_empty());
    }

    #[test]
    fn test_case_insensitive_actions() {
        assert_eq!(parse("FIXED #2"), cmds(&[(Close, 2)]));
        assert_eq!(parse("Returns #9"), cmds(&[(ReturnToReporter, 9)]));
    }

    #[test]
    fn test_multiple_groups() {
        assert_eq!(
            parse("Changed blah and foo to do this or that. Fixes #10 and #12, and refs #12."),
            cmds(&[(Close, 10), (Close, 12), (Reference, 12)])
        );
        assert_eq!(
            parse("Fixes #10. Refs #12."),
            cmds(&[(Close, 10), (Reference, 12)])
        );
    }

    #[test]
    fn test_zero_and_leading_zeros_are_kept() {
        assert_eq!(parse("fix #0 #007"), cmds(&[(Close, 0), (Close, 7)]));
    }

    #[test]
    fn test_single_character_after_action() {
        assert_eq!(parse("fixes:#4"), cmds(&[(Close, 4)]));
        assert!(parse("fixes: #4").is_empty());
        assert!(parse("fixes -- #4").is_empty());
    }

    #[test]
    fn test_display_prefix_is_not_a_command() {
        let msg = "(In [https://github.com/acme/widgets/commit/0123456789 0123456789]) see #5";
        assert_eq!(parse(msg), cmds(&[(Reference, 5)]));
    }

    #[test]
    fn test_overflowing_digits_are_skipped() {
        assert_eq!(
            parse("fixes #99999999999999999999999 and #3"),
            cmds(&[(Close, 3)])
        );
    }
}
