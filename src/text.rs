//! Line layout for monospace text.
//!
//! All fonts in the toolkit are [`MonoFont`]s, so a line's width is its character
//! count times the glyph advance. Layout works in characters and leaves pixel
//! placement to the caller.
//!
//! | Mode | Overlong line |
//! |------|---------------|
//! | `Ellipsis` | cut and ended with `...` |
//! | `Clip` | kept whole, the clip rectangle hides the rest |
//! | `Char` | broken at the last character that fits |
//! | `Word` | broken at the last space that fits, or mid-word if none does |

use embedded_graphics::mono_font::MonoFont;

const ELLIPSIS: &str = "...";

/// How a label lays out text wider than its rect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    Ellipsis,
    Clip,
    Char,
    Word,
}

/// Horizontal placement of each line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Horizontal advance of one glyph.
#[inline]
pub const fn char_advance(font: &MonoFont<'_>) -> u32 {
    font.character_size.width + font.character_spacing
}

/// How many glyphs of `font` fit into `width` pixels.
#[inline]
pub const fn chars_that_fit(
    font: &MonoFont<'_>,
    width: u32,
) -> usize {
    let advance = char_advance(font);
    if advance == 0 { 0 } else { (width / advance) as usize }
}

/// Pixel width of `text` set in `font`.
pub fn text_width(
    font: &MonoFont<'_>,
    text: &str,
) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    count * char_advance(font) - font.character_spacing
}

/// Break `text` into display lines of at most `max_chars` characters.
///
/// Explicit newlines always start a new line. Single-line modes (`Ellipsis`,
/// `Clip`) only consider the first line.
pub fn layout_lines(
    text: &str,
    max_chars: usize,
    wrap: Wrap,
) -> Vec<String> {
    match wrap {
        Wrap::Ellipsis => vec![ellipsize(text.lines().next().unwrap_or(""), max_chars)],
        Wrap::Clip => vec![text.lines().next().unwrap_or("").to_owned()],
        Wrap::Char => text.split('\n').flat_map(|line| wrap_chars(line, max_chars)).collect(),
        Wrap::Word => text.split('\n').flat_map(|line| wrap_words(line, max_chars)).collect(),
    }
}

fn ellipsize(
    line: &str,
    max_chars: usize,
) -> String {
    if line.chars().count() <= max_chars {
        return line.to_owned();
    }
    if max_chars <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(max_chars).collect();
    }
    let mut cut: String = line.chars().take(max_chars - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    cut
}

fn wrap_chars(
    line: &str,
    max_chars: usize,
) -> Vec<String> {
    if max_chars == 0 || line.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(max_chars).map(|chunk| chunk.iter().collect()).collect()
}

fn wrap_words(
    line: &str,
    max_chars: usize,
) -> Vec<String> {
    if max_chars == 0 {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split(' ').filter(|word| !word.is_empty()) {
        let word_len = word.chars().count();
        let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };
        if needed <= max_chars {
            if current_len > 0 {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
            continue;
        }

        if current_len > 0 {
            lines.push(core::mem::take(&mut current));
        }
        if word_len <= max_chars {
            current.push_str(word);
            current_len = word_len;
        } else {
            // Longer than a whole line: hard break, keep the tail for the next word
            let mut pieces = wrap_chars(word, max_chars);
            let tail = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            current_len = tail.chars().count();
            current = tail;
        }
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    use super::*;

    #[test]
    fn test_chars_that_fit() {
        assert_eq!(chars_that_fit(&FONT_6X10, 60), 10);
        assert_eq!(chars_that_fit(&FONT_6X10, 5), 0);
        assert_eq!(text_width(&FONT_6X10, "abc"), 18);
        assert_eq!(text_width(&FONT_6X10, ""), 0);
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(layout_lines("Navigation", 20, Wrap::Ellipsis), vec!["Navigation"]);
        assert_eq!(layout_lines("Navigation", 7, Wrap::Ellipsis), vec!["Navi..."]);
        assert_eq!(layout_lines("Navigation", 2, Wrap::Ellipsis), vec![".."]);
        assert_eq!(layout_lines("one\ntwo", 10, Wrap::Ellipsis), vec!["one"], "only the first line is shown");
    }

    #[test]
    fn test_clip_keeps_line_whole() {
        assert_eq!(layout_lines("Navigation", 4, Wrap::Clip), vec!["Navigation"]);
    }

    #[test]
    fn test_char_wrap() {
        assert_eq!(layout_lines("abcdefg", 3, Wrap::Char), vec!["abc", "def", "g"]);
        assert_eq!(layout_lines("ab\n\ncd", 3, Wrap::Char), vec!["ab", "", "cd"]);
    }

    #[test]
    fn test_word_wrap() {
        assert_eq!(
            layout_lines("the quick brown fox", 10, Wrap::Word),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(layout_lines("a  b", 10, Wrap::Word), vec!["a b"], "runs of spaces collapse");
        assert_eq!(layout_lines("", 10, Wrap::Word), vec![""]);
    }

    #[test]
    fn test_word_wrap_breaks_long_words() {
        assert_eq!(
            layout_lines("go abcdefghij x", 4, Wrap::Word),
            vec!["go", "abcd", "efgh", "ij x"]
        );
    }
}
