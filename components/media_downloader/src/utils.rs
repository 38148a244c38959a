// components/media_downloader/src/utils.rs

/// Longest filename we produce, leaving the extension to the caller
pub const MAX_FILENAME_CHARS: usize = 255;

/// Characters that never survive into a filename, besides control characters and spaces
pub const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']', ',', '#'];

/// The same rule as [`sanitize_filename`], as a regex the engine can apply to titles
pub const RESERVED_PATTERN: &str = r#"[<>:"/\\|?*\x00-\x1F\x7F\[\],# ]"#;

fn is_reserved(c: char) -> bool {
    c == ' ' || c.is_ascii_control() || RESERVED_CHARS.contains(&c)
}

/// Sanitize a title to be safe for all filesystems
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect()
}
