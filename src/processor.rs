//! Diff processing pipeline: build, anchor comments and drafts, unfold.
//!
//! [`process`] runs every pass synchronously. [`spawn`] runs it on a named
//! worker thread and hands the finished [`RenderModel`] to a callback.

use std::thread::{self, JoinHandle};

use crate::anchor::anchor_comments;
use crate::builder::build_rows;
use crate::comment::CommentSet;
use crate::diff::FileDiff;
use crate::model::RenderModel;
use crate::options::DiffOptions;
use crate::unfold::unfold_commented_lines;

/// Everything needed to build one file's render model.
#[derive(Debug, Clone, Default)]
pub struct DiffRequest {
    pub diff: FileDiff,
    pub comments: CommentSet,
    pub drafts: CommentSet,
    pub options: DiffOptions,
}

impl DiffRequest {
    #[must_use]
    pub fn new(diff: FileDiff, options: DiffOptions) -> Self {
        Self {
            diff,
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_comments(mut self, comments: CommentSet) -> Self {
        self.comments = comments;
        self
    }

    #[must_use]
    pub fn with_drafts(mut self, drafts: CommentSet) -> Self {
        self.drafts = drafts;
        self
    }
}

/// Run the whole pipeline for `request`.
#[must_use]
pub fn process(request: &DiffRequest) -> RenderModel {
    let mode = request.options.mode;
    let mut rows = build_rows(&request.diff, &request.options);

    let pending_comments = anchor_comments(&mut rows, &request.comments, mode, false);
    let pending_drafts = anchor_comments(&mut rows, &request.drafts, mode, true);

    let reveals = unfold_commented_lines(
        &mut rows,
        &[&request.comments, &request.drafts],
        request.options.context_lines,
    );

    // Comments on folded lines could only be placed once the lines were revealed.
    let (lost_comments, lost_drafts) = if reveals > 0 {
        (
            anchor_comments(&mut rows, &pending_comments, mode, false),
            anchor_comments(&mut rows, &pending_drafts, mode, true),
        )
    } else {
        (pending_comments, pending_drafts)
    };
    if !lost_comments.is_empty() || !lost_drafts.is_empty() {
        log::debug!(
            "{} comments and {} drafts refer to lines outside the diff",
            lost_comments.len(),
            lost_drafts.len()
        );
    }

    let model = RenderModel::new(rows);
    log::debug!(
        "processed {:?}: {} rows, {} comment rows",
        request.diff.path.as_deref().unwrap_or("<unnamed>"),
        model.len(),
        model.comment_rows().count()
    );
    model
}

/// Process `request` on a worker thread and pass the result to `on_done`.
///
/// The callback runs on the worker thread once, after every pass has
/// finished; the model is not touched again afterwards.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn<F>(request: DiffRequest, on_done: F) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce(RenderModel) + Send + 'static,
{
    thread::Builder::new()
        .name("diff-processor".to_string())
        .spawn(move || on_done(process(&request)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{CommentInfo, Side};
    use crate::diff::DiffHunk;
    use crate::model::{Advise, HighlightKind, Row, RowKind};
    use crate::options::LayoutMode;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;

    fn numbered(prefix: &str, range: std::ops::RangeInclusive<usize>) -> Vec<String> {
        range.map(|n| format!("{prefix} {n}")).collect()
    }

    fn kinds(model: &RenderModel) -> Vec<RowKind> {
        model.iter().map(Row::kind).collect()
    }

    fn five_line_file() -> FileDiff {
        FileDiff::new(vec![
            DiffHunk::unchanged(&["one", "two"]),
            DiffHunk::changed(&["three"], &["THREE"]),
            DiffHunk::unchanged(&["four", "five"]),
        ])
    }

    fn comment_on(line: Option<u32>, message: &str) -> CommentInfo {
        CommentInfo {
            line,
            patch_set: Some(1),
            message: message.to_string(),
            ..CommentInfo::default()
        }
    }

    #[test]
    fn test_empty_diff_yields_empty_model() {
        let model = process(&DiffRequest::default());
        assert!(model.is_empty());
    }

    #[test]
    fn test_leading_context_folds_before_first_change() {
        let diff = FileDiff::new(vec![
            DiffHunk::Unchanged(numbered("ctx", 1..=25)),
            DiffHunk::changed(&["old"], &["new"]),
        ]);
        let model = process(&DiffRequest::new(diff, DiffOptions::default()));
        let kinds = kinds(&model);

        assert_eq!(kinds[0], RowKind::Skip);
        assert_eq!(kinds.iter().filter(|k| **k == RowKind::Line).count(), 11);
        assert_eq!(kinds.last(), Some(&RowKind::Decorator));
    }

    #[test]
    fn test_unified_fallback_highlights() {
        let diff = FileDiff::new(vec![DiffHunk::changed(&["foo", "bar"], &["foo", "baz"])]);
        let model = process(&DiffRequest::new(
            diff,
            DiffOptions::with_mode(LayoutMode::Unified),
        ));

        assert_eq!(
            kinds(&model),
            vec![
                RowKind::Line,
                RowKind::Line,
                RowKind::Line,
                RowKind::Line,
                RowKind::Decorator
            ]
        );
        let highlights: Vec<Vec<&str>> = model
            .iter()
            .filter_map(Row::as_line)
            .map(|l| {
                l.old
                    .as_ref()
                    .or(l.new.as_ref())
                    .map(|s| s.text.highlighted(HighlightKind::Intraline))
                    .unwrap_or_default()
            })
            .collect();
        assert_eq!(highlights, vec![vec![], vec!["r"], vec![], vec!["z"]]);
    }

    #[test]
    fn test_file_draft_inserted_first() {
        let request = DiffRequest::new(five_line_file(), DiffOptions::default())
            .with_drafts(CommentSet::new(Vec::new(), vec![comment_on(None, "draft")]));
        let model = process(&request);

        let Row::Comment(row) = &model.rows()[0] else {
            panic!("expected a comment row first");
        };
        assert!(row.is_draft);
        assert!(row.old.is_none());
        assert_eq!(row.new.as_ref().map(|c| c.message.as_str()), Some("draft"));
        assert_eq!(model.comment_rows().count(), 1);
    }

    #[test]
    fn test_comment_on_missing_line_is_skipped() {
        let plain = process(&DiffRequest::new(five_line_file(), DiffOptions::default()));
        let request = DiffRequest::new(five_line_file(), DiffOptions::default())
            .with_comments(CommentSet::new(Vec::new(), vec![comment_on(Some(999), "lost")]));

        assert_eq!(process(&request), plain);
    }

    #[test]
    fn test_comment_on_folded_line_is_revealed_and_anchored() {
        let diff = FileDiff::new(vec![
            DiffHunk::changed(&["a"], &["b"]),
            DiffHunk::Unchanged(numbered("ctx", 2..=61)),
            DiffHunk::changed(&["c"], &["d"]),
        ]);
        let request = DiffRequest::new(diff, DiffOptions::default())
            .with_comments(CommentSet::new(Vec::new(), vec![comment_on(Some(30), "here")]))
            .with_drafts(CommentSet::new(vec![comment_on(Some(40), "base")], Vec::new()));
        let model = process(&request);

        let comment_positions: Vec<usize> = model
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_comment())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(comment_positions.len(), 2);

        for (index, side, line) in [(comment_positions[0], Side::New, 30), (comment_positions[1], Side::Old, 40)] {
            let anchor = model.rows()[index - 1]
                .as_line()
                .and_then(|l| l.number(side));
            assert_eq!(anchor, Some(line));
        }

        // Folded plus visible lines are conserved across the unfold.
        let total: usize = model
            .iter()
            .map(|row| match row {
                Row::Line(_) => 1,
                Row::Skip(marker) => marker.len(),
                _ => 0,
            })
            .sum();
        assert_eq!(total, 62);
    }

    #[test]
    fn test_binary_file() {
        let diff = FileDiff {
            binary: true,
            ..FileDiff::default()
        };
        let model = process(&DiffRequest::new(diff, DiffOptions::default()));
        assert_eq!(
            model.rows(),
            &[Row::Advise {
                advise: Advise::Binary
            }]
        );
    }

    #[test]
    fn test_spawn_delivers_model_once() {
        let (tx, rx) = mpsc::channel();
        let request = DiffRequest::new(five_line_file(), DiffOptions::default());
        let expected = process(&request);

        let handle = spawn(request, move |model| {
            tx.send(model).expect("receiver alive");
        })
        .expect("spawn worker");
        handle.join().expect("worker finished");

        assert_eq!(rx.recv().expect("model delivered"), expected);
        assert!(rx.try_recv().is_err());
    }
}
