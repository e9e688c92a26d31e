//! Discord length limits and truncation helpers
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Message, embed description and embed field limits

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Discord embed description limit
pub const EMBED_LIMIT: usize = 4096;
/// Discord embed field value limit
pub const FIELD_LIMIT: usize = 1024;

/// Largest UTF-8 boundary at or below `max`
fn floor_char_boundary(text: &str, max: usize) -> usize {
    let mut end = max.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Cut `text` to at most `max` bytes, never splitting a character
pub fn clip(text: &str, max: usize) -> &str {
    &text[..floor_char_boundary(text, max)]
}

/// Keep the first `max` bytes of `text` and append "..." when anything was cut
///
/// The ellipsis is added after the kept prefix, so the result can be up to
/// three bytes longer than `max`.
pub fn clip_with_ellipsis(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        format!("{}...", clip(text, max))
    }
}

/// Truncate text to fit the message limit, adding ellipsis if needed
pub fn truncate_for_message(text: &str) -> String {
    if text.len() <= MESSAGE_LIMIT {
        text.to_string()
    } else {
        format!("{}...", clip(text, MESSAGE_LIMIT - 3))
    }
}

/// Truncate text to fit the embed description limit, adding ellipsis if needed
pub fn truncate_for_embed(text: &str) -> String {
    if text.len() <= EMBED_LIMIT {
        text.to_string()
    } else {
        format!("{}...", clip(text, EMBED_LIMIT - 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_short_text_untouched() {
        assert_eq!(clip("hello", 100), "hello");
    }

    #[test]
    fn test_clip_respects_utf8() {
        // "世" is three bytes
        let text = "a世界";
        assert_eq!(clip(text, 2), "a");
        assert_eq!(clip(text, 4), "a世");
    }

    #[test]
    fn test_clip_with_ellipsis() {
        assert_eq!(clip_with_ellipsis("abcdef", 10), "abcdef");
        assert_eq!(clip_with_ellipsis("abcdef", 3), "abc...");
    }

    #[test]
    fn test_truncate_for_message_short() {
        let text = "short text";
        assert_eq!(truncate_for_message(text), text);
    }

    #[test]
    fn test_truncate_for_message_long() {
        let result = truncate_for_message(&"a".repeat(3000));
        assert_eq!(result.len(), MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_for_embed_long() {
        let result = truncate_for_embed(&"a".repeat(5000));
        assert!(result.len() <= EMBED_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_exactly_at_limit() {
        let text = "a".repeat(MESSAGE_LIMIT);
        assert_eq!(truncate_for_message(&text), text);
    }
}
