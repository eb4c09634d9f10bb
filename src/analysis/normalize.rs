//! Text normalization ahead of segmentation.
//!
//! Normalization lower-cases the input and strips a fixed set of characters.
//! Punctuation is deleted outright, so `"don't"` becomes `"dont"`.
//! Separators and dashes are deleted too but leave a token boundary behind,
//! so `"AI-driven"` yields the two runs `"ai"` and `"driven"`. The word and
//! dictionary tokenizers rely on those boundaries.

/// ASCII punctuation, the same set as Python's `string.punctuation`.
const ASCII_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Full-width punctuation common in Chinese headlines.
const CJK_PUNCTUATION: &str = "，。！？、：；“”‘’《》〈〉（）【】「」『』…～·";

/// Separator characters; each one is removed and marks a boundary.
const SEPARATORS: &[char] = &[' ', '\t', '\n', '\r', '\u{3000}', '\u{00a0}'];

/// Hyphen and dashes join words; they split like separators.
const DASHES: &[char] = &['-', '\u{2013}', '\u{2014}'];

fn is_punctuation(c: char) -> bool {
    ASCII_PUNCTUATION.contains(c) || CJK_PUNCTUATION.contains(c)
}

fn is_separator(c: char) -> bool {
    SEPARATORS.contains(&c) || DASHES.contains(&c)
}

/// Lower-case `text`, drop punctuation, and collapse separators and dashes.
///
/// The returned string holds the surviving runs joined by a single ASCII
/// space, with no leading or trailing space. Empty or separator-only input
/// yields an empty string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize("AI-driven tools, grow!"), "ai driven tools grow");
/// assert_eq!(normalize("数字经济\u{3000}大模型"), "数字经济 大模型");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_boundary = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if is_separator(c) {
            pending_boundary = true;
        } else if is_punctuation(c) {
            continue;
        } else {
            if pending_boundary && !out.is_empty() {
                out.push(' ');
            }
            pending_boundary = false;
            out.push(c);
        }
    }
    out
}
