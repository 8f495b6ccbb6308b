//! Output truncation.
//!
//! The consuming agent has a finite context window while command output is
//! unbounded (`cat big.log`, `find /`). Symmetric head/tail truncation keeps
//! both the invocation context at the top and the final result or error at
//! the bottom.

/// Hard ceiling on output returned to the caller (characters).
pub const MAX_OUTPUT_CHARS: usize = 50_000;

/// Truncate `output` to at most `max_chars` characters using middle
/// omission.
///
/// Content at or under the ceiling is returned untouched. Otherwise the
/// result is the first `max_chars / 2` characters, a marker line stating
/// exactly how many characters were dropped, and the last `max_chars / 2`
/// characters. Splits happen on `char` boundaries so multi-byte sequences
/// are never broken.
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    if output.len() <= max_chars {
        // Byte length bounds char length; nothing to do.
        return output.to_owned();
    }

    let chars: Vec<char> = output.chars().collect();
    let total = chars.len();
    if total <= max_chars {
        return output.to_owned();
    }

    let half = max_chars / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[total - half..].iter().collect();
    let omitted = total - max_chars;

    format!("{head}\n[... {omitted} characters omitted ...]\n{tail}")
}
