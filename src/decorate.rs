//! Line-local decorations: intraline edits, the substring fallback, tabs and
//! trailing whitespace.
//!
//! Intraline ranges are computed in characters on the raw line text and only
//! converted to byte offsets once the display text has been built.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::diff::IntralineEdit;
use crate::model::{DecoratedText, Highlight, HighlightKind};
use crate::options::DiffOptions;

/// Glyph shown in place of a tab when tabs are highlighted.
pub const TAB_GLYPH: char = '\u{00BB}';

static TRAILING_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+$").expect("trailing whitespace pattern is valid"));

/// Map a hunk side's edit list onto its lines.
///
/// Edits address the side's lines joined with `\n`; the returned ranges are
/// per line, clipped to the line's own characters.
#[must_use]
pub fn intraline_ranges(lines: &[String], edits: &[IntralineEdit]) -> Vec<Vec<Range<usize>>> {
    let mut result = vec![Vec::new(); lines.len()];

    let mut spans = Vec::with_capacity(lines.len());
    let mut offset = 0usize;
    for line in lines {
        let len = line.chars().count();
        spans.push(offset..offset + len);
        offset += len + 1;
    }

    let mut pos = 0usize;
    let mut first_line = 0usize;
    for edit in edits {
        pos += edit.skip();
        let mark = pos..pos + edit.mark();
        pos = mark.end;
        if mark.is_empty() {
            continue;
        }

        // Regions only move forward, so lines ending before this one are done.
        while first_line < spans.len() && spans[first_line].end < mark.start {
            first_line += 1;
        }
        for (idx, span) in spans.iter().enumerate().skip(first_line) {
            if span.start >= mark.end {
                break;
            }
            let start = mark.start.max(span.start);
            let end = mark.end.min(span.end);
            if start < end {
                result[idx].push(start - span.start..end - span.start);
            }
        }
    }

    result
}

/// Approximate intraline ranges for a line pair the server sent no edits for.
///
/// When the shorter line occurs inside the longer one (first occurrence), the
/// longer line's prefix and suffix around it are marked. Otherwise the part
/// between the common prefix and common suffix is marked on both lines.
#[must_use]
pub fn fallback_ranges(old: &str, new: &str) -> (Vec<Range<usize>>, Vec<Range<usize>>) {
    let old_len = old.chars().count();
    let new_len = new.chars().count();

    if old_len <= new_len {
        if let Some(ranges) = containment_ranges(old, new) {
            return (Vec::new(), ranges);
        }
    } else if let Some(ranges) = containment_ranges(new, old) {
        return (ranges, Vec::new());
    }

    let prefix = old
        .chars()
        .zip(new.chars())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old_len.min(new_len) - prefix;
    let suffix = old
        .chars()
        .rev()
        .zip(new.chars().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let middle = |len: usize| {
        let range = prefix..len - suffix;
        if range.is_empty() {
            Vec::new()
        } else {
            vec![range]
        }
    };
    (middle(old_len), middle(new_len))
}

fn containment_ranges(shorter: &str, longer: &str) -> Option<Vec<Range<usize>>> {
    let byte_pos = longer.find(shorter)?;
    let start = longer[..byte_pos].chars().count();
    let end = start + shorter.chars().count();
    let longer_len = longer.chars().count();
    Some(
        [0..start, end..longer_len]
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect(),
    )
}

/// Build the display text for one line.
///
/// Tabs are substituted first, then trailing whitespace is detected on the
/// substituted text. `intraline` holds character ranges on `raw`.
#[must_use]
pub fn decorate_line(raw: &str, intraline: &[Range<usize>], options: &DiffOptions) -> DecoratedText {
    let tab_width = options.tab_width.max(1);
    let mut text = String::with_capacity(raw.len());
    let mut highlights = Vec::new();
    // Byte offset in `text` where each raw character starts, plus the end.
    let mut char_starts = Vec::with_capacity(raw.len() + 1);

    for ch in raw.chars() {
        char_starts.push(text.len());
        if ch == '\t' {
            if options.highlight_tabs {
                let start = text.len();
                text.push(TAB_GLYPH);
                text.extend(std::iter::repeat_n(' ', tab_width - 1));
                highlights.push(Highlight {
                    start,
                    end: text.len(),
                    kind: HighlightKind::Tab,
                });
            } else {
                text.extend(std::iter::repeat_n(' ', tab_width));
            }
        } else {
            text.push(ch);
        }
    }
    char_starts.push(text.len());

    let last = char_starts.len() - 1;
    for range in intraline {
        let start = char_starts[range.start.min(last)];
        let end = char_starts[range.end.min(last)];
        if start < end {
            highlights.push(Highlight {
                start,
                end,
                kind: HighlightKind::Intraline,
            });
        }
    }

    if options.highlight_trailing_whitespace {
        if let Some(found) = TRAILING_WHITESPACE.find(&text) {
            highlights.push(Highlight {
                start: found.start(),
                end: found.end(),
                kind: HighlightKind::TrailingWhitespace,
            });
        }
    }

    highlights.sort_by_key(|h| h.start);
    DecoratedText { text, highlights }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LayoutMode;
    use pretty_assertions::assert_eq;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_intraline_single_line() {
        let ranges = intraline_ranges(&lines(&["    old();"]), &[IntralineEdit(4, 3)]);
        assert_eq!(ranges, vec![vec![4..7]]);
    }

    #[test]
    fn test_intraline_spans_newline_between_lines() {
        // "abc\ndef": mark "c\nd" covers the end of line 0 and start of line 1
        let ranges = intraline_ranges(&lines(&["abc", "def"]), &[IntralineEdit(2, 3)]);
        assert_eq!(ranges, vec![vec![2..3], vec![0..1]]);
    }

    #[test]
    fn test_intraline_multiple_edits_accumulate_offset() {
        let ranges = intraline_ranges(
            &lines(&["one two", "three"]),
            &[IntralineEdit(0, 3), IntralineEdit(1, 3), IntralineEdit(1, 2)],
        );
        assert_eq!(ranges, vec![vec![0..3, 4..7], vec![0..2]]);
    }

    #[test]
    fn test_fallback_identical_lines_have_no_highlight() {
        assert_eq!(fallback_ranges("foo", "foo"), (Vec::new(), Vec::new()));
    }

    #[test]
    fn test_fallback_containment_marks_longer_line() {
        let (old, new) = fallback_ranges("bar", "foo bar baz");
        assert!(old.is_empty());
        assert_eq!(new, vec![0..4, 7..11]);
    }

    #[test]
    fn test_fallback_uses_first_occurrence() {
        let (_, new) = fallback_ranges("ab", "xabab");
        assert_eq!(new, vec![0..1, 3..5]);
    }

    #[test]
    fn test_fallback_differing_suffix() {
        assert_eq!(fallback_ranges("bar", "baz"), (vec![2..3], vec![2..3]));
    }

    #[test]
    fn test_fallback_shorter_old_contains_in_old() {
        let (old, new) = fallback_ranges("let x = 1;", "x = 1");
        assert_eq!(old, vec![0..4, 9..10]);
        assert!(new.is_empty());
    }

    #[test]
    fn test_tab_substitution_highlighted() {
        let options = DiffOptions::with_mode(LayoutMode::Unified);
        let text = decorate_line("\tx", &[], &options);
        assert_eq!(text.text, "\u{00BB}   x");
        assert_eq!(text.highlighted(HighlightKind::Tab), vec!["\u{00BB}   "]);
    }

    #[test]
    fn test_tab_expands_to_spaces_when_not_highlighted() {
        let options = DiffOptions::plain(LayoutMode::Unified);
        let text = decorate_line("a\tb", &[], &options);
        assert_eq!(text.text, "a    b");
        assert!(text.highlights.is_empty());
    }

    #[test]
    fn test_trailing_whitespace() {
        let options = DiffOptions::with_mode(LayoutMode::Unified);
        let text = decorate_line("code  ", &[], &options);
        assert_eq!(text.highlighted(HighlightKind::TrailingWhitespace), vec!["  "]);

        let clean = decorate_line("code", &[], &options);
        assert!(clean.highlights.is_empty());
    }

    #[test]
    fn test_intraline_offsets_follow_tab_substitution() {
        let options = DiffOptions::with_mode(LayoutMode::Unified);
        // Mark "b" after a tab; the tab grows to four columns.
        let text = decorate_line("\tb", &[1..2], &options);
        assert_eq!(text.highlighted(HighlightKind::Intraline), vec!["b"]);
    }

    #[test]
    fn test_intraline_handles_multibyte_characters() {
        let options = DiffOptions::with_mode(LayoutMode::Unified);
        let text = decorate_line("héllo", &[1..2], &options);
        assert_eq!(text.highlighted(HighlightKind::Intraline), vec!["é"]);
    }
}
