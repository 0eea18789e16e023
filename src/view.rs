//! Text preview of a render model.
//!
//! Renders unified or side-by-side text, optionally with 24-bit ANSI colours.
//! Row colour tags are resolved through [`DiffColors`]; code foregrounds come
//! from the syntax [`Highlighter`] when one is supplied.

use std::iter::repeat_n;
use std::ops::Range;

use crate::comment::CommentInfo;
use crate::model::{CommentRow, LineColor, LineSide, RenderLine, RenderModel, Row};
use crate::options::LayoutMode;
use crate::syntax::{HighlightSpan, Highlighter};
use crate::theme::{DiffColors, Rgba};

const RESET: &str = "\x1b[0m";
/// Width of a line-number gutter.
const GUTTER: usize = 5;
/// Gutter, `+`/`-` marker and the spaces around it.
const PREFIX: usize = GUTTER + 3;
const SEPARATOR: &str = " \u{2502} ";

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub mode: LayoutMode,
    /// Emit ANSI colour sequences.
    pub color: bool,
    pub colors: DiffColors,
    /// Text columns per side in side-by-side mode.
    pub column_width: usize,
    /// File path used to pick a syntax.
    pub path: Option<String>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            color: false,
            colors: DiffColors::default(),
            column_width: 60,
            path: None,
        }
    }
}

/// Render `model` as text, one output line per visual line.
#[must_use]
pub fn render_text(
    model: &RenderModel,
    options: &ViewOptions,
    highlighter: Option<&Highlighter>,
) -> String {
    let renderer = TextRenderer {
        options,
        highlighter,
    };
    let mut out = String::new();
    for row in model {
        renderer.render_row(row, &mut out);
    }
    out
}

struct TextRenderer<'a> {
    options: &'a ViewOptions,
    highlighter: Option<&'a Highlighter>,
}

impl TextRenderer<'_> {
    fn render_row(&self, row: &Row, out: &mut String) {
        match row {
            Row::Line(line) => match self.options.mode {
                LayoutMode::Unified => self.unified_line(line, out),
                LayoutMode::SideBySide => self.side_by_side_line(line, out),
            },
            Row::Skip(marker) => {
                let text = format!("{:PREFIX$}... {} ...", "", marker.label);
                push_line(out, &self.style(&text, Some(self.options.colors.muted), None));
            }
            Row::Advise { advise } => {
                let text = format!("{:PREFIX$}[{}]", "", advise.message());
                push_line(out, &self.style(&text, Some(self.options.colors.muted), None));
            }
            Row::Decorator => {
                let rule: String = repeat_n('\u{2500}', self.total_width()).collect();
                push_line(out, &self.style(&rule, Some(self.options.colors.muted), None));
            }
            Row::Comment(comment) => self.comment_row(comment, out),
        }
    }

    const fn total_width(&self) -> usize {
        match self.options.mode {
            LayoutMode::Unified => PREFIX + GUTTER + 1 + self.options.column_width,
            LayoutMode::SideBySide => 2 * (PREFIX + self.options.column_width) + 3,
        }
    }

    fn unified_line(&self, line: &RenderLine, out: &mut String) {
        let Some(side) = line.new.as_ref().or(line.old.as_ref()) else {
            return;
        };
        let prefix = format!(
            "{} {} {} ",
            gutter(line.old.as_ref()),
            gutter(line.new.as_ref()),
            marker(side.color)
        );
        let colors = &self.options.colors;
        let mut text = self.style(&prefix, Some(colors.muted), colors.line_bg(side.color));
        text.push_str(&self.paint_side(side, None));
        push_line(out, &text);
    }

    fn side_by_side_line(&self, line: &RenderLine, out: &mut String) {
        let width = self.options.column_width;
        let mut text = String::new();
        match &line.old {
            Some(side) => {
                text.push_str(&self.side_prefix(side));
                text.push_str(&self.paint_side(side, Some(width)));
            }
            None => text.extend(repeat_n(' ', PREFIX + width)),
        }
        text.push_str(SEPARATOR);
        if let Some(side) = &line.new {
            text.push_str(&self.side_prefix(side));
            text.push_str(&self.paint_side(side, None));
        }
        push_line(out, text.trim_end_matches(' '));
    }

    fn side_prefix(&self, side: &LineSide) -> String {
        let text = format!("{:>GUTTER$} {} ", side.number, marker(side.color));
        self.style(&text, Some(self.options.colors.muted), self.options.colors.line_bg(side.color))
    }

    fn comment_row(&self, row: &CommentRow, out: &mut String) {
        let colors = &self.options.colors;
        let bg = if row.is_draft {
            colors.draft_bg
        } else {
            colors.comment_bg
        };
        let old = row.old.as_ref().map(|c| comment_lines(c, row.is_draft)).unwrap_or_default();
        let new = row.new.as_ref().map(|c| comment_lines(c, row.is_draft)).unwrap_or_default();

        match self.options.mode {
            LayoutMode::Unified => {
                for text in old.iter().chain(&new) {
                    let text = format!("{:width$}> {text}", "", width = PREFIX + GUTTER + 1);
                    push_line(out, &self.style(&text, None, Some(bg)));
                }
            }
            LayoutMode::SideBySide => {
                let width = PREFIX + self.options.column_width;
                for i in 0..old.len().max(new.len()) {
                    let left = old.get(i).map_or_else(String::new, |t| format!("  > {t}"));
                    let right = new.get(i).map_or_else(String::new, |t| format!("  > {t}"));
                    let mut text = String::new();
                    if left.is_empty() {
                        text.extend(repeat_n(' ', width));
                    } else {
                        text.push_str(&self.style(&pad(&left, width), None, Some(bg)));
                    }
                    text.push_str(SEPARATOR);
                    if !right.is_empty() {
                        text.push_str(&self.style(&right, None, Some(bg)));
                    }
                    push_line(out, text.trim_end_matches(' '));
                }
            }
        }
    }

    /// Decorated text of one side, padded to `width` columns when given.
    fn paint_side(&self, side: &LineSide, width: Option<usize>) -> String {
        let text = side.text.text.as_str();
        let padding = width.map_or(0, |w| w.saturating_sub(text.chars().count()));
        if !self.options.color {
            return pad(text, text.chars().count() + padding);
        }

        let colors = &self.options.colors;
        let line_bg = colors.line_bg(side.color);
        let syntax = self.syntax_spans(text);

        let mut cuts = vec![0, text.len()];
        for highlight in &side.text.highlights {
            cuts.extend([highlight.start, highlight.end]);
        }
        for (range, _) in &syntax {
            cuts.extend([range.start, range.end]);
        }
        cuts.sort_unstable();
        cuts.dedup();

        let mut out = String::new();
        for pair in cuts.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let Some(segment) = text.get(start..end) else {
                continue;
            };
            let bg = side
                .text
                .highlights
                .iter()
                .rev()
                .find(|h| h.start <= start && end <= h.end)
                .map(|h| colors.highlight_bg(h.kind, side.color))
                .or(line_bg);
            let span = syntax
                .iter()
                .find(|(range, _)| range.start <= start && end <= range.end)
                .map(|(_, span)| span);
            out.push_str(span.map_or("", font_style));
            out.push_str(&ansi(segment, Some(span.map_or(colors.foreground, |s| s.fg)), bg));
        }
        if padding > 0 {
            out.push_str(&ansi(&" ".repeat(padding), None, line_bg));
        }
        out
    }

    fn syntax_spans(&self, text: &str) -> Vec<(Range<usize>, HighlightSpan)> {
        let (Some(highlighter), Some(path)) = (self.highlighter, self.options.path.as_deref()) else {
            return Vec::new();
        };
        let Some(spans) = highlighter.highlight_line(text, path) else {
            return Vec::new();
        };
        let mut offset = 0;
        spans
            .into_iter()
            .map(|span| {
                let range = offset..offset + span.text.len();
                offset = range.end;
                (range, span)
            })
            .collect()
    }

    fn style(&self, text: &str, fg: Option<Rgba>, bg: Option<Rgba>) -> String {
        if self.options.color {
            ansi(text, fg, bg)
        } else {
            text.to_string()
        }
    }
}

/// SGR prefix for a token's font style; [`ansi`] resets it.
const fn font_style(span: &HighlightSpan) -> &'static str {
    match (span.bold, span.italic) {
        (true, true) => "\x1b[1;3m",
        (true, false) => "\x1b[1m",
        (false, true) => "\x1b[3m",
        (false, false) => "",
    }
}

fn ansi(text: &str, fg: Option<Rgba>, bg: Option<Rgba>) -> String {
    if fg.is_none() && bg.is_none() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 40);
    if let Some(c) = fg {
        out.push_str(&format!("\x1b[38;2;{};{};{}m", c.r, c.g, c.b));
    }
    if let Some(c) = bg {
        out.push_str(&format!("\x1b[48;2;{};{};{}m", c.r, c.g, c.b));
    }
    out.push_str(text);
    out.push_str(RESET);
    out
}

fn comment_lines(comment: &CommentInfo, is_draft: bool) -> Vec<String> {
    let mut header = comment.author_name();
    if is_draft {
        header.push_str(" [draft]");
    }
    if comment.unresolved == Some(true) {
        header.push_str(" (unresolved)");
    }
    header.push(':');

    std::iter::once(header)
        .chain(comment.message.lines().map(|line| format!("  {line}")))
        .collect()
}

fn gutter(side: Option<&LineSide>) -> String {
    side.map_or_else(|| " ".repeat(GUTTER), |s| format!("{:>GUTTER$}", s.number))
}

const fn marker(color: LineColor) -> char {
    match color {
        LineColor::None => ' ',
        LineColor::Added => '+',
        LineColor::Deleted => '-',
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffHunk, FileDiff};
    use crate::options::DiffOptions;
    use crate::processor::{process, DiffRequest};
    use crate::comment::CommentSet;
    use pretty_assertions::assert_eq;

    fn model(mode: LayoutMode) -> RenderModel {
        let diff = FileDiff::new(vec![
            DiffHunk::unchanged(&["keep"]),
            DiffHunk::changed(&["bar"], &["baz"]),
        ]);
        let comment = CommentInfo {
            line: Some(2),
            patch_set: Some(1),
            message: "typo?".to_string(),
            ..CommentInfo::default()
        };
        process(
            &DiffRequest::new(diff, DiffOptions::with_mode(mode))
                .with_drafts(CommentSet::new(Vec::new(), vec![comment])),
        )
    }

    fn options(mode: LayoutMode) -> ViewOptions {
        ViewOptions {
            mode,
            column_width: 10,
            ..ViewOptions::default()
        }
    }

    #[test]
    fn test_unified_plain_text() {
        let text = render_text(&model(LayoutMode::Unified), &options(LayoutMode::Unified), None);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "    1     1   keep");
        assert_eq!(lines[1], "    2       - bar");
        assert_eq!(lines[2], "          2 + baz");
        assert_eq!(lines[3].trim(), "> anonymous [draft]:");
        assert_eq!(lines[4].trim(), ">   typo?");
        assert!(lines[5].starts_with('\u{2500}'));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_side_by_side_plain_text() {
        let text = render_text(&model(LayoutMode::SideBySide), &options(LayoutMode::SideBySide), None);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "    1   keep       \u{2502}     1   keep");
        assert_eq!(lines[1], "    2 - bar        \u{2502}     2 + baz");
        assert!(lines[2].contains("\u{2502}   > anonymous [draft]:"));
    }

    #[test]
    fn test_skip_and_advise_rows() {
        let diff = FileDiff::new(vec![
            DiffHunk::ServerSkipped(3),
            DiffHunk::Unchanged((1..=15).map(|n| format!("l{n}")).collect()),
        ]);
        let model = process(&DiffRequest::new(diff, DiffOptions::with_mode(LayoutMode::Unified)));
        let text = render_text(&model, &options(LayoutMode::Unified), None);

        assert!(text.contains("[3 skipped lines not sent by the server]"));
        assert!(text.contains("... 5 skipped lines ..."));
    }

    #[test]
    fn test_color_output_uses_palette() {
        let view = ViewOptions {
            color: true,
            ..options(LayoutMode::Unified)
        };
        let text = render_text(&model(LayoutMode::Unified), &view, None);
        let added = view.colors.added_bg;
        let intraline = view.colors.intraline_added;

        assert!(text.contains(&format!("\x1b[48;2;{};{};{}m", added.r, added.g, added.b)));
        assert!(text.contains(&format!(
            "\x1b[48;2;{};{};{}mz",
            intraline.r, intraline.g, intraline.b
        )));
        assert!(text.contains(RESET));
    }

    #[test]
    fn test_font_style_escapes() {
        let span = |bold, italic| HighlightSpan {
            text: "fn".to_string(),
            fg: Rgba::rgb(1, 2, 3),
            bold,
            italic,
        };
        assert_eq!(font_style(&span(false, false)), "");
        assert_eq!(font_style(&span(true, false)), "\x1b[1m");
        assert_eq!(font_style(&span(false, true)), "\x1b[3m");
        assert_eq!(font_style(&span(true, true)), "\x1b[1;3m");
    }

    #[test]
    fn test_plain_output_has_no_escapes() {
        let text = render_text(&model(LayoutMode::SideBySide), &options(LayoutMode::SideBySide), None);
        assert!(!text.contains('\x1b'));
    }
}
