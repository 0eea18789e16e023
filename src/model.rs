//! Render model: the flat row sequence handed to the UI layer.
//!
//! Rows form a closed set of variants; consumers branch on [`Row::kind`].

use serde::Serialize;

use crate::comment::{CommentInfo, Side};

/// Background tag for one side of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineColor {
    #[default]
    None,
    Added,
    Deleted,
}

/// What a highlight span marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Intraline,
    Tab,
    TrailingWhitespace,
}

/// Highlighted byte range of a [`DecoratedText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub kind: HighlightKind,
}

/// Display text with highlight spans (byte offsets into `text`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecoratedText {
    pub text: String,
    pub highlights: Vec<Highlight>,
}

impl DecoratedText {
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlights: Vec::new(),
        }
    }

    /// Text covered by highlights of `kind`, in order.
    #[must_use]
    pub fn highlighted(&self, kind: HighlightKind) -> Vec<&str> {
        self.highlights
            .iter()
            .filter(|h| h.kind == kind)
            .map(|h| &self.text[h.start..h.end])
            .collect()
    }
}

/// One side (old or new) of a rendered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSide {
    pub number: u32,
    pub text: DecoratedText,
    pub color: LineColor,
}

/// One visual row of the diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderLine {
    pub old: Option<LineSide>,
    pub new: Option<LineSide>,
}

impl RenderLine {
    #[must_use]
    pub const fn side(&self, side: Side) -> Option<&LineSide> {
        match side {
            Side::Old => self.old.as_ref(),
            Side::New => self.new.as_ref(),
        }
    }

    #[must_use]
    pub fn number(&self, side: Side) -> Option<u32> {
        self.side(side).map(|s| s.number)
    }

    #[must_use]
    pub fn line_ref(&self) -> LineRef {
        LineRef {
            old: self.number(Side::Old),
            new: self.number(Side::New),
        }
    }
}

/// Folded run of unchanged lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipMarker {
    pub label: String,
    pub lines: Vec<RenderLine>,
}

impl SkipMarker {
    #[must_use]
    pub fn new(lines: Vec<RenderLine>) -> Self {
        Self {
            label: skip_label(lines.len()),
            lines,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[must_use]
pub fn skip_label(count: usize) -> String {
    if count == 1 {
        "1 skipped line".to_string()
    } else {
        format!("{count} skipped lines")
    }
}

/// Informational row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advise {
    Binary,
    NoDifferences,
    /// Common lines the server left out of the diff.
    ServerSkipped(usize),
}

impl Advise {
    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::Binary => "Binary file, no text differences shown".to_string(),
            Self::NoDifferences => "No differences".to_string(),
            Self::ServerSkipped(count) => {
                format!("{} not sent by the server", skip_label(count))
            }
        }
    }
}

/// Line numbers of the row a comment row is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineRef {
    pub old: Option<u32>,
    pub new: Option<u32>,
}

/// Comments (or drafts) shown below a line, or at the top for file comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentRow {
    pub old: Option<CommentInfo>,
    pub new: Option<CommentInfo>,
    pub is_draft: bool,
    /// Absent for file-level comments.
    pub line: Option<LineRef>,
}

impl CommentRow {
    #[must_use]
    pub fn new(side: Side, comment: CommentInfo, is_draft: bool, line: Option<LineRef>) -> Self {
        let mut row = Self {
            old: None,
            new: None,
            is_draft,
            line,
        };
        *row.slot_mut(side) = Some(comment);
        row
    }

    #[must_use]
    pub const fn slot(&self, side: Side) -> Option<&CommentInfo> {
        match side {
            Side::Old => self.old.as_ref(),
            Side::New => self.new.as_ref(),
        }
    }

    pub const fn slot_mut(&mut self, side: Side) -> &mut Option<CommentInfo> {
        match side {
            Side::Old => &mut self.old,
            Side::New => &mut self.new,
        }
    }
}

/// Row discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Line,
    Skip,
    Advise,
    Decorator,
    Comment,
}

/// One entry of the render sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Line(RenderLine),
    Skip(SkipMarker),
    Advise { advise: Advise },
    /// End-of-diff sentinel.
    Decorator,
    Comment(CommentRow),
}

impl Row {
    #[must_use]
    pub const fn kind(&self) -> RowKind {
        match self {
            Self::Line(_) => RowKind::Line,
            Self::Skip(_) => RowKind::Skip,
            Self::Advise { .. } => RowKind::Advise,
            Self::Decorator => RowKind::Decorator,
            Self::Comment(_) => RowKind::Comment,
        }
    }

    #[must_use]
    pub const fn as_line(&self) -> Option<&RenderLine> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }
}

/// Added/deleted line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub added: usize,
    pub deleted: usize,
}

/// Finished render sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderModel {
    rows: Vec<Row>,
}

impl RenderModel {
    #[must_use]
    pub const fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn comment_rows(&self) -> impl Iterator<Item = &CommentRow> {
        self.rows.iter().filter_map(|row| match row {
            Row::Comment(comment) => Some(comment),
            _ => None,
        })
    }

    /// Count added/deleted sides, including lines folded into skip markers.
    #[must_use]
    pub fn change_counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        let mut tally = |line: &RenderLine| {
            for side in [&line.old, &line.new].into_iter().flatten() {
                match side.color {
                    LineColor::Added => counts.added += 1,
                    LineColor::Deleted => counts.deleted += 1,
                    LineColor::None => {}
                }
            }
        };
        for row in &self.rows {
            match row {
                Row::Line(line) => tally(line),
                Row::Skip(marker) => marker.lines.iter().for_each(&mut tally),
                _ => {}
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a RenderModel {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
