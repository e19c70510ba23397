//! Token-text reversal, e.g. "country" to "yrtnuoc". Prepending a marker
//! character to the reversed text makes leading-wildcard lookups cheap: the
//! index can distinguish reversed tokens from ordinary ones.

/// Example marker character: U+0001 (START OF HEADING).
pub const START_OF_HEADING_MARKER: char = '\u{0001}';

/// Example marker character: U+001F (INFORMATION SEPARATOR ONE).
pub const INFORMATION_SEPARATOR_MARKER: char = '\u{001f}';

/// Example marker character: U+EC00 (PRIVATE USE AREA: EC00).
pub const PUA_EC00_MARKER: char = '\u{ec00}';

/// Example marker character: U+200F (RIGHT-TO-LEFT MARK).
pub const RTL_DIRECTION_MARKER: char = '\u{200f}';

/// Reverses token text by code point.
pub fn reverse(input: &str) -> String {
    input.chars().rev().collect()
}

/// Reverses token text and prepends `marker`: with a marker of U+0001,
/// "country" becomes "\u{1}yrtnuoc".
pub fn reverse_marked(input: &str, marker: char) -> String {
    let mut output = String::with_capacity(input.len() + marker.len_utf8());
    output.push(marker);
    output.extend(input.chars().rev());
    output
}
