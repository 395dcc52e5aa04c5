//! String helpers for log output

/// Single-line preview of `text`, at most `max_chars` characters plus `...`
///
/// Line breaks are shown as `⏎` so a multi-sentence batch stays on one log
/// line. Never slices inside a multi-byte character.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text
        .chars()
        .take(max_chars)
        .map(|c| if c == '\n' { '⏎' } else { c })
        .collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short() {
        assert_eq!(preview("Әйе.", 10), "Әйе.");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("Җөмләләр", 3), "Җөм...");
    }

    #[test]
    fn test_preview_flattens_lines() {
        assert_eq!(preview("Әйе.\nЮк.", 20), "Әйе.⏎Юк.");
    }

    #[test]
    fn test_preview_empty() {
        assert_eq!(preview("", 5), "");
    }
}
