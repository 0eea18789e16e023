//! Diff model builder: turns a file's hunk list into render rows.

use std::ops::Range;

use crate::decorate::{decorate_line, fallback_ranges, intraline_ranges};
use crate::diff::{DiffHunk, FileDiff, IntralineEdit};
use crate::fold::{fold_lines, fold_range, HunkPosition};
use crate::model::{Advise, LineColor, LineSide, RenderLine, Row};
use crate::options::{DiffOptions, LayoutMode};

/// Build the row sequence for `diff`.
///
/// Never fails: absent sides produce no rows, an empty hunk list produces an
/// empty sequence. The end-of-diff decorator is appended only when at least
/// one line (visible or folded) was produced.
#[must_use]
pub fn build_rows(diff: &FileDiff, options: &DiffOptions) -> Vec<Row> {
    let mut builder = ModelBuilder::new(options);

    if diff.binary {
        builder.rows.push(Row::Advise {
            advise: Advise::Binary,
        });
        return builder.rows;
    }

    let no_differences = diff.has_no_differences();
    if no_differences {
        builder.rows.push(Row::Advise {
            advise: Advise::NoDifferences,
        });
    }

    let count = diff.hunks.len();
    for (index, hunk) in diff.hunks.iter().enumerate() {
        let position = HunkPosition { index, count };
        match hunk {
            DiffHunk::Unchanged(lines) => builder.push_unchanged(lines, position, !no_differences),
            DiffHunk::Changed {
                lines_a,
                lines_b,
                edit_a,
                edit_b,
            } => builder.push_changed(lines_a, lines_b, edit_a.as_deref(), edit_b.as_deref()),
            DiffHunk::ServerSkipped(skipped) => builder.push_server_skip(*skipped),
        }
    }

    let has_lines = builder
        .rows
        .iter()
        .any(|row| matches!(row, Row::Line(_) | Row::Skip(_)));
    if has_lines {
        builder.rows.push(Row::Decorator);
    }

    log::debug!(
        "built {} rows from {} hunks ({:?}, {} old / {} new lines)",
        builder.rows.len(),
        count,
        options.mode,
        builder.line_a,
        builder.line_b
    );
    builder.rows
}

struct ModelBuilder<'a> {
    options: &'a DiffOptions,
    rows: Vec<Row>,
    line_a: u32,
    line_b: u32,
}

impl<'a> ModelBuilder<'a> {
    const fn new(options: &'a DiffOptions) -> Self {
        Self {
            options,
            rows: Vec::new(),
            line_a: 0,
            line_b: 0,
        }
    }

    fn push_unchanged(&mut self, lines: &[String], position: HunkPosition, allow_fold: bool) {
        let built: Vec<RenderLine> = lines
            .iter()
            .map(|raw| {
                self.line_a += 1;
                self.line_b += 1;
                let text = decorate_line(raw, &[], self.options);
                RenderLine {
                    old: Some(LineSide {
                        number: self.line_a,
                        text: text.clone(),
                        color: LineColor::None,
                    }),
                    new: Some(LineSide {
                        number: self.line_b,
                        text,
                        color: LineColor::None,
                    }),
                }
            })
            .collect();

        let hidden = if allow_fold {
            fold_range(built.len(), position, self.options.context_lines)
        } else {
            None
        };
        self.rows.extend(fold_lines(built, hidden));
    }

    fn push_changed(
        &mut self,
        lines_a: &[String],
        lines_b: &[String],
        edit_a: Option<&[IntralineEdit]>,
        edit_b: Option<&[IntralineEdit]>,
    ) {
        let (ranges_a, ranges_b) = self.intraline(lines_a, lines_b, edit_a, edit_b);

        match self.options.mode {
            LayoutMode::SideBySide => {
                for i in 0..lines_a.len().max(lines_b.len()) {
                    let old = lines_a
                        .get(i)
                        .map(|raw| self.old_side(raw, &ranges_a[i]));
                    let new = lines_b
                        .get(i)
                        .map(|raw| self.new_side(raw, &ranges_b[i]));
                    self.rows.push(Row::Line(RenderLine { old, new }));
                }
            }
            LayoutMode::Unified => {
                for (raw, ranges) in lines_a.iter().zip(&ranges_a) {
                    let old = Some(self.old_side(raw, ranges));
                    self.rows.push(Row::Line(RenderLine { old, new: None }));
                }
                for (raw, ranges) in lines_b.iter().zip(&ranges_b) {
                    let new = Some(self.new_side(raw, ranges));
                    self.rows.push(Row::Line(RenderLine { old: None, new }));
                }
            }
        }
    }

    fn push_server_skip(&mut self, skipped: usize) {
        let step = u32::try_from(skipped).unwrap_or(u32::MAX);
        self.line_a = self.line_a.saturating_add(step);
        self.line_b = self.line_b.saturating_add(step);
        self.rows.push(Row::Advise {
            advise: Advise::ServerSkipped(skipped),
        });
    }

    fn old_side(&mut self, raw: &str, ranges: &[Range<usize>]) -> LineSide {
        self.line_a += 1;
        LineSide {
            number: self.line_a,
            text: decorate_line(raw, ranges, self.options),
            color: LineColor::Deleted,
        }
    }

    fn new_side(&mut self, raw: &str, ranges: &[Range<usize>]) -> LineSide {
        self.line_b += 1;
        LineSide {
            number: self.line_b,
            text: decorate_line(raw, ranges, self.options),
            color: LineColor::Added,
        }
    }

    /// Per-line intraline ranges for both sides of a changed hunk.
    fn intraline(
        &self,
        lines_a: &[String],
        lines_b: &[String],
        edit_a: Option<&[IntralineEdit]>,
        edit_b: Option<&[IntralineEdit]>,
    ) -> (Vec<Vec<Range<usize>>>, Vec<Vec<Range<usize>>>) {
        let mut ranges_a = vec![Vec::new(); lines_a.len()];
        let mut ranges_b = vec![Vec::new(); lines_b.len()];
        if !self.options.highlight_intraline_diffs {
            return (ranges_a, ranges_b);
        }

        if edit_a.is_some() || edit_b.is_some() {
            if let Some(edits) = edit_a {
                ranges_a = intraline_ranges(lines_a, edits);
            }
            if let Some(edits) = edit_b {
                ranges_b = intraline_ranges(lines_b, edits);
            }
        } else if !lines_a.is_empty() && !lines_b.is_empty() {
            // No edit metadata: compare index-aligned line pairs.
            for (i, (old, new)) in lines_a.iter().zip(lines_b).enumerate() {
                let (old_ranges, new_ranges) = fallback_ranges(old, new);
                ranges_a[i] = old_ranges;
                ranges_b[i] = new_ranges;
            }
        }
        (ranges_a, ranges_b)
    }
}
