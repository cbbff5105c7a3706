//! Splits long replies to fit Discord's message size limit

/// Discord rejects messages longer than this many characters
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Split `text` into sendable parts.
///
/// Text that fits is returned as-is. Longer text is split on line breaks,
/// and lines that are still too long are cut every `MAX_MESSAGE_LEN` chars.
/// Blank lines are dropped from split output since Discord refuses empty
/// messages.
pub fn split_message(text: &str) -> Vec<String> {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let chars: Vec<char> = line.chars().collect();
        for piece in chars.chunks(MAX_MESSAGE_LEN) {
            parts.push(piece.iter().collect());
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(split_message("Pong!"), vec!["Pong!".to_string()]);
        assert_eq!(split_message("a\nb"), vec!["a\nb".to_string()]);
    }

    #[test]
    fn test_long_text_split_by_lines() {
        let line = "x".repeat(1500);
        let text = format!("{line}\n\n{line}");
        let parts = split_message(&text);
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.len() == 1500));
    }

    #[test]
    fn test_long_line_cut() {
        let text = "é".repeat(4500);
        let parts = split_message(&text);
        let lens: Vec<usize> = parts.iter().map(|p| p.chars().count()).collect();
        assert_eq!(lens, vec![2000, 2000, 500]);
    }
}
