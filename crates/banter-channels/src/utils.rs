//! Message segmentation for transport character limits.

/// Telegram's limit for a text message, in characters.
pub const TEXT_LIMIT: usize = 4096;

/// Telegram's limit for a photo caption, in characters. When a photo leads
/// the delivery, the first chunk has to fit here.
pub const CAPTION_LIMIT: usize = 1024;

/// Split a message into chunks that respect the transport's character limits.
///
/// The first chunk is capped at [`CAPTION_LIMIT`] when `with_photo` is true
/// (a photo is sent with the first chunk as its caption), otherwise at
/// [`TEXT_LIMIT`]; every later chunk uses [`TEXT_LIMIT`]. Within each window
/// the split prefers the last newline, then the last space (the delimiter is
/// dropped), and falls back to a hard cut when the window has neither.
///
/// Limits count characters, not bytes; all slice boundaries are aligned to
/// UTF-8 char boundaries, so multi-byte content (Cyrillic, CJK, emoji) is
/// never cut mid-character. Deterministic, no side effects; empty input
/// yields no chunks.
pub fn split_message(text: &str, with_photo: bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let limit = if parts.is_empty() && with_photo {
            CAPTION_LIMIT
        } else {
            TEXT_LIMIT
        };

        let end = char_boundary_at(rest, limit);
        if end == rest.len() {
            // The remaining text fits within the current limit.
            parts.push(rest);
            break;
        }

        let window = &rest[..end];
        if let Some(i) = window.rfind('\n') {
            parts.push(&rest[..i]);
            rest = &rest[i + 1..];
        } else if let Some(i) = window.rfind(' ') {
            parts.push(&rest[..i]);
            rest = &rest[i + 1..];
        } else {
            // No break point in the window: hard cut.
            parts.push(window);
            rest = &rest[end..];
        }
    }

    parts
}

/// Byte index just past the `max_chars`-th character, or the full length
/// when the string is shorter.
fn char_boundary_at(s: &str, max_chars: usize) -> usize {
    s.char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
