//! Keystroke translation: `y<Enter>`-style syntax → tmux key tokens.
//!
//! Input mixes literal characters with bracketed special keys. The scan is
//! left to right; at each position every known token name is tried
//! case-insensitively, and anything that is not a token passes through as a
//! single literal character.

/// One translated key, ready for the pane's raw key-send primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A literal character, sent with `send-keys -l`.
    Literal(char),
    /// A tmux key name (`Enter`, `C-c`, `PPage`, ...), sent unquoted.
    Named(&'static str),
}

/// Symbolic token name → tmux key name.
const KEY_TABLE: &[(&str, &str)] = &[
    ("enter", "Enter"),
    ("tab", "Tab"),
    ("escape", "Escape"),
    ("backspace", "BSpace"),
    ("delete", "DC"),
    ("space", "Space"),
    ("up", "Up"),
    ("down", "Down"),
    ("left", "Left"),
    ("right", "Right"),
    ("home", "Home"),
    ("end", "End"),
    ("pageup", "PPage"),
    ("pagedown", "NPage"),
    ("ctrl+c", "C-c"),
    ("ctrl+d", "C-d"),
    ("ctrl+z", "C-z"),
    ("ctrl+l", "C-l"),
    ("ctrl+a", "C-a"),
    ("ctrl+e", "C-e"),
    ("ctrl+k", "C-k"),
    ("ctrl+u", "C-u"),
    ("ctrl+w", "C-w"),
    ("ctrl+r", "C-r"),
];

/// Parse `input` into an ordered key sequence.
pub fn parse_keys(input: &str) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut rest = input;

    'outer: while !rest.is_empty() {
        if rest.starts_with('<') {
            for (name, tmux_key) in KEY_TABLE {
                let token_len = name.len() + 2;
                if let Some(candidate) = rest.get(..token_len) {
                    // The `>` check first: it guarantees the inner slice
                    // ends on a character boundary.
                    if candidate.ends_with('>')
                        && candidate[1..token_len - 1].eq_ignore_ascii_case(name)
                    {
                        keys.push(Key::Named(tmux_key));
                        rest = &rest[token_len..];
                        continue 'outer;
                    }
                }
            }
        }

        let Some(ch) = rest.chars().next() else { break };
        keys.push(Key::Literal(ch));
        rest = &rest[ch.len_utf8()..];
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_literals() {
        assert_eq!(
            parse_keys("ab"),
            vec![Key::Literal('a'), Key::Literal('b')]
        );
    }

    #[test]
    fn answer_then_enter() {
        assert_eq!(
            parse_keys("y<Enter>"),
            vec![Key::Literal('y'), Key::Named("Enter")]
        );
    }

    #[test]
    fn token_names_are_case_insensitive() {
        assert_eq!(parse_keys("<ENTER>"), vec![Key::Named("Enter")]);
        assert_eq!(parse_keys("<enter>"), vec![Key::Named("Enter")]);
        assert_eq!(parse_keys("<CtRl+C>"), vec![Key::Named("C-c")]);
    }

    #[test]
    fn control_chords() {
        assert_eq!(parse_keys("<Ctrl+C>"), vec![Key::Named("C-c")]);
        assert_eq!(parse_keys("<Ctrl+Z>"), vec![Key::Named("C-z")]);
    }

    #[test]
    fn navigation_and_editing_keys() {
        assert_eq!(
            parse_keys("<Up><Down><Home><End><PageUp><PageDown><Backspace><Delete>"),
            vec![
                Key::Named("Up"),
                Key::Named("Down"),
                Key::Named("Home"),
                Key::Named("End"),
                Key::Named("PPage"),
                Key::Named("NPage"),
                Key::Named("BSpace"),
                Key::Named("DC"),
            ]
        );
    }

    #[test]
    fn unknown_token_falls_through_as_literals() {
        let keys = parse_keys("<Nope>");
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0], Key::Literal('<'));
        assert_eq!(keys[5], Key::Literal('>'));
    }

    #[test]
    fn mixed_sequence() {
        assert_eq!(
            parse_keys("yes<Enter><Ctrl+C>"),
            vec![
                Key::Literal('y'),
                Key::Literal('e'),
                Key::Literal('s'),
                Key::Named("Enter"),
                Key::Named("C-c"),
            ]
        );
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        assert_eq!(
            parse_keys("<En"),
            vec![Key::Literal('<'), Key::Literal('E'), Key::Literal('n')]
        );
    }

    #[test]
    fn non_ascii_literals_survive() {
        assert_eq!(parse_keys("é"), vec![Key::Literal('é')]);
    }
}
