//! Track filename validation
//!
//! Allow-list grammar:
//!
//! ```text
//! name  := head body+ "." ext
//! head  := ASCII letter | ASCII digit | CJK ideograph (U+4E00..=U+9FA5)
//! body  := head | whitespace | "-" | "_" | "."
//! ext   := "mp3" | "wav" | "flac" | "m4a"
//! ```

/// Audio extensions served by the track endpoint
pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "flac", "m4a"];

const fn is_head_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '\u{4e00}'..='\u{9fa5}')
}

fn is_body_char(c: char) -> bool {
    is_head_char(c) || c.is_whitespace() || matches!(c, '-' | '_' | '.')
}

/// Check a decoded track filename against the allow-list grammar
pub fn is_valid_filename(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    if !AUDIO_EXTENSIONS.contains(&ext) {
        return false;
    }

    let mut chars = stem.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest = chars.as_str();

    is_head_char(first) && !rest.is_empty() && rest.chars().all(is_body_char)
}

/// Check whether a decoded path contains a parent-directory segment
///
/// Both `/` and `\` count as separators so that encoded Windows-style
/// paths are caught as well.
pub fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}
