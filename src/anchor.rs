//! Comment and draft anchoring.
//!
//! Comment rows are inserted right after the line they refer to; file
//! comments go to the top of the sequence, grouped after any comment rows
//! already there. In side-by-side mode an old-side and a new-side comment
//! attached to the same row share one [`CommentRow`].

use crate::comment::{CommentInfo, CommentSet, CommentTarget, Side};
use crate::model::{CommentRow, Row};
use crate::options::LayoutMode;

/// Position of the first visible line whose `side` number is `line`.
#[must_use]
pub fn find_line_in_model(rows: &[Row], side: Side, line: u32) -> Option<usize> {
    rows.iter()
        .position(|row| row.as_line().and_then(|l| l.number(side)) == Some(line))
}

/// Anchor every comment of `comments` into `rows`, old collection first.
///
/// Returns the line comments whose line is not visible in `rows` (folded or
/// nonexistent), keeping their collection.
pub fn anchor_comments(
    rows: &mut Vec<Row>,
    comments: &CommentSet,
    mode: LayoutMode,
    is_draft: bool,
) -> CommentSet {
    let mut unresolved = CommentSet::default();

    for (from_old, list) in [(true, &comments.old), (false, &comments.new)] {
        for comment in list {
            let side = comment.logical_side(from_old);
            let anchored = match comment.target() {
                CommentTarget::File => {
                    anchor_file_comment(rows, side, comment, mode, is_draft);
                    true
                }
                CommentTarget::RangeOnly => {
                    log::debug!("dropping range-only comment {:?}", comment.id);
                    true
                }
                CommentTarget::Line(line) => match find_line_in_model(rows, side, line) {
                    Some(index) => {
                        anchor_line_comment(rows, index, side, comment, mode, is_draft);
                        true
                    }
                    None => false,
                },
            };

            if !anchored {
                let target = if from_old {
                    &mut unresolved.old
                } else {
                    &mut unresolved.new
                };
                target.push(comment.clone());
            }
        }
    }

    unresolved
}

fn anchor_file_comment(
    rows: &mut Vec<Row>,
    side: Side,
    comment: &CommentInfo,
    mode: LayoutMode,
    is_draft: bool,
) {
    let insert_at = rows
        .iter()
        .position(|row| !row.is_comment())
        .unwrap_or(rows.len());

    if mode == LayoutMode::SideBySide {
        let reusable = rows[..insert_at].iter_mut().find_map(|row| match row {
            Row::Comment(existing)
                if existing.line.is_none()
                    && existing.is_draft == is_draft
                    && existing.slot(side).is_none() =>
            {
                Some(existing)
            }
            _ => None,
        });
        if let Some(existing) = reusable {
            *existing.slot_mut(side) = Some(comment.clone());
            return;
        }
    }

    rows.insert(
        insert_at,
        Row::Comment(CommentRow::new(side, comment.clone(), is_draft, None)),
    );
}

fn anchor_line_comment(
    rows: &mut Vec<Row>,
    line_index: usize,
    side: Side,
    comment: &CommentInfo,
    mode: LayoutMode,
    is_draft: bool,
) {
    let Some(line_ref) = rows[line_index].as_line().map(|line| line.line_ref()) else {
        return;
    };

    let mut insert_at = line_index + 1;
    while let Some(Row::Comment(existing)) = rows.get_mut(insert_at) {
        if mode == LayoutMode::SideBySide
            && existing.is_draft == is_draft
            && existing.slot(side).is_none()
        {
            *existing.slot_mut(side) = Some(comment.clone());
            return;
        }
        insert_at += 1;
    }

    rows.insert(
        insert_at,
        Row::Comment(CommentRow::new(side, comment.clone(), is_draft, Some(line_ref))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_rows;
    use crate::diff::{DiffHunk, FileDiff};
    use crate::model::RowKind;
    use crate::options::DiffOptions;
    use pretty_assertions::assert_eq;

    fn five_line_file(mode: LayoutMode) -> Vec<Row> {
        let diff = FileDiff::new(vec![
            DiffHunk::unchanged(&["one", "two"]),
            DiffHunk::changed(&["three"], &["THREE"]),
            DiffHunk::unchanged(&["four", "five"]),
        ]);
        build_rows(&diff, &DiffOptions::with_mode(mode))
    }

    fn line_comment(line: u32, message: &str) -> CommentInfo {
        CommentInfo {
            line: Some(line),
            patch_set: Some(2),
            message: message.to_string(),
            ..CommentInfo::default()
        }
    }

    fn file_comment(message: &str) -> CommentInfo {
        CommentInfo {
            patch_set: Some(2),
            message: message.to_string(),
            ..CommentInfo::default()
        }
    }

    fn comment_rows(rows: &[Row]) -> Vec<(usize, &CommentRow)> {
        rows.iter()
            .enumerate()
            .filter_map(|(i, row)| match row {
                Row::Comment(c) => Some((i, c)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_find_line_in_model() {
        let rows = five_line_file(LayoutMode::SideBySide);
        assert_eq!(find_line_in_model(&rows, Side::New, 3), Some(2));
        assert_eq!(find_line_in_model(&rows, Side::Old, 5), Some(4));
        assert_eq!(find_line_in_model(&rows, Side::New, 999), None);
    }

    #[test]
    fn test_line_comment_follows_its_line() {
        let mut rows = five_line_file(LayoutMode::Unified);
        let comments = CommentSet::new(Vec::new(), vec![line_comment(2, "why?")]);
        let unresolved = anchor_comments(&mut rows, &comments, LayoutMode::Unified, false);

        assert!(unresolved.is_empty());
        assert_eq!(rows[2].kind(), RowKind::Comment);
        let Row::Comment(row) = &rows[2] else {
            unreachable!();
        };
        assert_eq!(row.new.as_ref().map(|c| c.message.as_str()), Some("why?"));
        assert!(row.old.is_none());
        assert_eq!(row.line.and_then(|l| l.new), Some(2));
        assert!(!row.is_draft);
    }

    #[test]
    fn test_unified_stacks_comments_in_order() {
        let mut rows = five_line_file(LayoutMode::Unified);
        let comments = CommentSet::new(
            vec![line_comment(1, "old side")],
            vec![line_comment(1, "first"), line_comment(1, "second")],
        );
        anchor_comments(&mut rows, &comments, LayoutMode::Unified, false);

        let found = comment_rows(&rows);
        assert_eq!(found.len(), 3);
        assert_eq!(
            found.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let messages: Vec<&str> = found
            .iter()
            .map(|(_, c)| c.old.as_ref().or(c.new.as_ref()).map_or("", |m| m.message.as_str()))
            .collect();
        assert_eq!(messages, vec!["old side", "first", "second"]);
    }

    #[test]
    fn test_side_by_side_pairs_opposite_sides() {
        let mut rows = five_line_file(LayoutMode::SideBySide);
        let before = rows.len();
        let comments = CommentSet::new(
            vec![line_comment(4, "left")],
            vec![line_comment(4, "right")],
        );
        anchor_comments(&mut rows, &comments, LayoutMode::SideBySide, false);

        assert_eq!(rows.len(), before + 1);
        let found = comment_rows(&rows);
        assert_eq!(found.len(), 1);
        let (index, row) = found[0];
        assert_eq!(index, 4);
        assert_eq!(row.old.as_ref().map(|c| c.message.as_str()), Some("left"));
        assert_eq!(row.new.as_ref().map(|c| c.message.as_str()), Some("right"));
    }

    #[test]
    fn test_drafts_do_not_share_comment_rows() {
        let mut rows = five_line_file(LayoutMode::SideBySide);
        let comments = CommentSet::new(vec![line_comment(4, "published")], Vec::new());
        let drafts = CommentSet::new(Vec::new(), vec![line_comment(4, "draft")]);
        anchor_comments(&mut rows, &comments, LayoutMode::SideBySide, false);
        anchor_comments(&mut rows, &drafts, LayoutMode::SideBySide, true);

        let found = comment_rows(&rows);
        assert_eq!(found.len(), 2);
        assert!(!found[0].1.is_draft);
        assert!(found[1].1.is_draft);
        assert_eq!(found[1].0, found[0].0 + 1);
    }

    #[test]
    fn test_file_draft_goes_to_top() {
        let mut rows = five_line_file(LayoutMode::SideBySide);
        let drafts = CommentSet::new(Vec::new(), vec![file_comment("overall")]);
        anchor_comments(&mut rows, &drafts, LayoutMode::SideBySide, true);

        let Row::Comment(row) = &rows[0] else {
            panic!("expected comment row at the top");
        };
        assert!(row.is_draft);
        assert!(row.line.is_none());
        assert!(row.old.is_none());
        assert_eq!(row.new.as_ref().map(|c| c.message.as_str()), Some("overall"));
    }

    #[test]
    fn test_file_comments_group_at_top() {
        let mut rows = five_line_file(LayoutMode::SideBySide);
        let comments = CommentSet::new(
            vec![file_comment("base")],
            vec![file_comment("a"), file_comment("b")],
        );
        anchor_comments(&mut rows, &comments, LayoutMode::SideBySide, false);

        let found = comment_rows(&rows);
        assert_eq!(found.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1]);
        // "a" fills the base row's empty new side, "b" needs a new row
        assert_eq!(found[0].1.old.as_ref().map(|c| c.message.as_str()), Some("base"));
        assert_eq!(found[0].1.new.as_ref().map(|c| c.message.as_str()), Some("a"));
        assert_eq!(found[1].1.new.as_ref().map(|c| c.message.as_str()), Some("b"));
        assert_eq!(rows[2].kind(), RowKind::Line);
    }

    #[test]
    fn test_unified_file_comments_never_share() {
        let mut rows = five_line_file(LayoutMode::Unified);
        let comments = CommentSet::new(vec![file_comment("base")], vec![file_comment("a")]);
        anchor_comments(&mut rows, &comments, LayoutMode::Unified, false);

        assert_eq!(comment_rows(&rows).len(), 2);
    }

    #[test]
    fn test_range_only_comment_is_dropped() {
        let mut rows = five_line_file(LayoutMode::SideBySide);
        let before = rows.clone();
        let comment = CommentInfo {
            range: Some(crate::comment::CommentRange {
                start_line: 1,
                start_character: 0,
                end_line: 1,
                end_character: 2,
            }),
            ..CommentInfo::default()
        };
        let unresolved = anchor_comments(
            &mut rows,
            &CommentSet::new(Vec::new(), vec![comment]),
            LayoutMode::SideBySide,
            false,
        );

        assert_eq!(rows, before);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_unknown_line_is_left_unresolved() {
        let mut rows = five_line_file(LayoutMode::SideBySide);
        let before = rows.clone();
        let unresolved = anchor_comments(
            &mut rows,
            &CommentSet::new(Vec::new(), vec![line_comment(999, "lost")]),
            LayoutMode::SideBySide,
            false,
        );

        assert_eq!(rows, before);
        assert_eq!(unresolved.new.len(), 1);
    }
}
