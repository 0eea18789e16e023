//! Line-skip folding of long unchanged hunks.

use std::ops::Range;

use crate::model::{RenderLine, Row, SkipMarker};

/// Where a hunk sits in the file's hunk list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkPosition {
    pub index: usize,
    pub count: usize,
}

impl HunkPosition {
    #[must_use]
    pub const fn is_first(self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        self.index + 1 == self.count
    }
}

/// Indices of an unchanged hunk's lines that should be folded, if any.
///
/// The first hunk keeps its last `context` lines, the last hunk its first
/// `context` lines, and interior hunks keep `context` lines at both ends. A
/// hunk that is both first and last follows the first-hunk rule.
#[must_use]
pub fn fold_range(len: usize, position: HunkPosition, context: usize) -> Option<Range<usize>> {
    if position.is_first() {
        (len > context).then(|| 0..len - context)
    } else if position.is_last() {
        (len > context).then(|| context..len)
    } else {
        (len > context.saturating_mul(2)).then(|| context..len - context)
    }
}

/// Emit an unchanged hunk's lines, folding `hidden` into one [`SkipMarker`].
#[must_use]
pub fn fold_lines(mut lines: Vec<RenderLine>, hidden: Option<Range<usize>>) -> Vec<Row> {
    let Some(hidden) = hidden.filter(|r| !r.is_empty() && r.end <= lines.len()) else {
        return lines.into_iter().map(Row::Line).collect();
    };

    let after = lines.split_off(hidden.end);
    let folded = lines.split_off(hidden.start);
    log::trace!("folding {} unchanged lines", folded.len());

    let mut rows: Vec<Row> = lines.into_iter().map(Row::Line).collect();
    rows.push(Row::Skip(SkipMarker::new(folded)));
    rows.extend(after.into_iter().map(Row::Line));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecoratedText, LineColor, LineSide, RowKind};
    use pretty_assertions::assert_eq;

    const K: usize = 10;

    fn unchanged(count: u32) -> Vec<RenderLine> {
        (1..=count)
            .map(|n| {
                let side = LineSide {
                    number: n,
                    text: DecoratedText::plain(format!("line {n}")),
                    color: LineColor::None,
                };
                RenderLine {
                    old: Some(side.clone()),
                    new: Some(side),
                }
            })
            .collect()
    }

    fn at(index: usize, count: usize) -> HunkPosition {
        HunkPosition { index, count }
    }

    #[test]
    fn test_short_hunks_are_not_folded() {
        assert_eq!(fold_range(K, at(0, 3), K), None);
        assert_eq!(fold_range(K, at(2, 3), K), None);
        assert_eq!(fold_range(2 * K, at(1, 3), K), None);
    }

    #[test]
    fn test_first_hunk_keeps_trailing_context() {
        assert_eq!(fold_range(25, at(0, 3), K), Some(0..15));
    }

    #[test]
    fn test_last_hunk_keeps_leading_context() {
        assert_eq!(fold_range(25, at(2, 3), K), Some(10..25));
    }

    #[test]
    fn test_interior_hunk_keeps_both_ends() {
        assert_eq!(fold_range(25, at(1, 3), K), Some(10..15));
    }

    #[test]
    fn test_huge_context_never_folds() {
        assert_eq!(fold_range(25, at(1, 3), usize::MAX), None);
        assert_eq!(fold_range(25, at(0, 3), usize::MAX), None);
        assert_eq!(fold_range(25, at(2, 3), usize::MAX), None);
    }

    #[test]
    fn test_sole_hunk_uses_first_rule() {
        assert_eq!(fold_range(25, at(0, 1), K), Some(0..15));
    }

    #[test]
    fn test_fold_lines_first_hunk_visible_tail() {
        let rows = fold_lines(unchanged(25), fold_range(25, at(0, 2), K));

        assert_eq!(rows.len(), 11);
        let Row::Skip(marker) = &rows[0] else {
            panic!("expected skip marker first");
        };
        assert_eq!(marker.len(), 15);
        assert_eq!(marker.label, "15 skipped lines");
        let visible: Vec<u32> = rows[1..]
            .iter()
            .filter_map(|r| r.as_line().and_then(|l| l.new.as_ref()).map(|s| s.number))
            .collect();
        assert_eq!(visible, (16..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_fold_lines_interior_layout() {
        let rows = fold_lines(unchanged(30), fold_range(30, at(1, 3), K));
        let kinds: Vec<RowKind> = rows.iter().map(Row::kind).collect();

        assert_eq!(kinds.len(), 21);
        assert_eq!(kinds[10], RowKind::Skip);
        assert!(kinds[..10].iter().all(|k| *k == RowKind::Line));
        assert!(kinds[11..].iter().all(|k| *k == RowKind::Line));
    }

    #[test]
    fn test_fold_lines_without_range_emits_everything() {
        let rows = fold_lines(unchanged(4), None);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.kind() == RowKind::Line));
    }
}
