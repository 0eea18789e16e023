//! Reveal folded lines that carry comments or drafts.

use crate::comment::{CommentSet, Side};
use crate::model::{RenderLine, Row, SkipMarker};

/// Split skip markers hiding a commented line until none remain.
///
/// Each split reveals the first commented line of a marker together with up
/// to `context` lines on either side, then rescans the whole sequence. A
/// marker with several commented lines is opened up over several passes.
/// Returns the number of splits performed.
pub fn unfold_commented_lines(rows: &mut Vec<Row>, collections: &[&CommentSet], context: usize) -> usize {
    let mut reveals = 0;

    'scan: loop {
        for index in 0..rows.len() {
            let Row::Skip(marker) = &mut rows[index] else {
                continue;
            };
            let Some(hidden) = marker
                .lines
                .iter()
                .position(|line| is_commented(line, collections))
            else {
                continue;
            };

            let lines = std::mem::take(&mut marker.lines);
            log::debug!(
                "revealing folded line {} of {} at row {index}",
                hidden + 1,
                lines.len()
            );
            rows.splice(index..=index, split_marker(lines, hidden, context));
            reveals += 1;
            continue 'scan;
        }
        break;
    }

    reveals
}

fn is_commented(line: &RenderLine, collections: &[&CommentSet]) -> bool {
    [Side::Old, Side::New].into_iter().any(|side| {
        line.number(side)
            .is_some_and(|number| collections.iter().any(|set| set.targets_line(side, number)))
    })
}

/// Replace a marker's lines with: leading marker (if any lines remain before
/// the window), the revealed window, trailing marker (if any remain after).
fn split_marker(mut lines: Vec<RenderLine>, hidden: usize, context: usize) -> Vec<Row> {
    let start = hidden.saturating_sub(context);
    let end = hidden.saturating_add(context).saturating_add(1).min(lines.len());

    let suffix = lines.split_off(end);
    let revealed = lines.split_off(start);
    let prefix = lines;

    let mut rows = Vec::with_capacity(revealed.len() + 2);
    if !prefix.is_empty() {
        rows.push(Row::Skip(SkipMarker::new(prefix)));
    }
    rows.extend(revealed.into_iter().map(Row::Line));
    if !suffix.is_empty() {
        rows.push(Row::Skip(SkipMarker::new(suffix)));
    }
    rows
}
