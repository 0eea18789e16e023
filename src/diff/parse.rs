//! Unified diff parser
//!
//! Parses standard unified diff format and converts it into the hunk model
//! Gerrit uses, so `git diff` output can go through the same pipeline.

use super::wire::{DiffHunk, FileDiff};

/// A parsed unified diff for a single file
#[derive(Debug, Clone, Default)]
pub struct ParsedPatch {
    pub file_a: Option<String>,
    pub file_b: Option<String>,
    pub hunks: Vec<PatchHunk>,
}

/// A single `@@` hunk from a patch
#[derive(Debug, Clone)]
pub struct PatchHunk {
    /// Starting line in old file
    pub old_start: u32,
    /// Number of lines in old file
    pub old_count: u32,
    /// Starting line in new file
    pub new_start: u32,
    /// Number of lines in new file
    pub new_count: u32,
    /// Lines in this hunk
    pub lines: Vec<PatchLine>,
}

/// A single line in a patch hunk, without its `+`/`-`/` ` prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl ParsedPatch {
    /// Parse a unified diff string
    #[must_use]
    pub fn parse(diff: &str) -> Self {
        let mut result = Self::default();
        let mut lines = diff.lines().peekable();

        // Header (--- and +++ lines)
        while let Some(line) = lines.peek() {
            if let Some(name) = line.strip_prefix("--- ") {
                result.file_a = strip_side_prefix(name, "a/");
                lines.next();
            } else if let Some(name) = line.strip_prefix("+++ ") {
                result.file_b = strip_side_prefix(name, "b/");
                lines.next();
            } else if line.starts_with("@@") {
                break;
            } else {
                lines.next(); // diff --git, index, mode lines
            }
        }

        while let Some(line) = lines.next() {
            if line.starts_with("@@") {
                if let Some(hunk) = Self::parse_hunk(line, &mut lines) {
                    result.hunks.push(hunk);
                }
            }
        }

        result
    }

    fn parse_hunk(
        header: &str,
        lines: &mut std::iter::Peekable<std::str::Lines<'_>>,
    ) -> Option<PatchHunk> {
        // @@ -start,count +start,count @@ optional context
        let parts: Vec<&str> = header.split_whitespace().collect();
        if parts.len() < 3 {
            return None;
        }

        let (old_start, old_count) = Self::parse_range(parts[1].trim_start_matches('-'))?;
        let (new_start, new_count) = Self::parse_range(parts[2].trim_start_matches('+'))?;

        let mut hunk = PatchHunk {
            old_start,
            old_count,
            new_start,
            new_count,
            lines: Vec::new(),
        };

        while let Some(line) = lines.peek() {
            if line.starts_with("@@") || line.starts_with("diff ") {
                break;
            }
            let Some(line) = lines.next() else {
                break;
            };

            let parsed = if let Some(content) = line.strip_prefix('+') {
                PatchLine::Added(content.to_string())
            } else if let Some(content) = line.strip_prefix('-') {
                PatchLine::Removed(content.to_string())
            } else if let Some(content) = line.strip_prefix(' ') {
                PatchLine::Context(content.to_string())
            } else if line.starts_with('\\') {
                // "\ No newline at end of file"
                continue;
            } else {
                PatchLine::Context(line.to_string())
            };
            hunk.lines.push(parsed);
        }

        Some(hunk)
    }

    fn parse_range(s: &str) -> Option<(u32, u32)> {
        if let Some((start, count)) = s.split_once(',') {
            Some((start.parse().ok()?, count.parse().ok()?))
        } else {
            // "5" means start=5, count=1
            Some((s.parse().ok()?, 1))
        }
    }

    /// Convert into the Gerrit hunk model.
    ///
    /// Gaps before and between `@@` hunks become [`DiffHunk::ServerSkipped`]
    /// so line numbers stay aligned with the real file.
    #[must_use]
    pub fn into_file_diff(self) -> FileDiff {
        let mut hunks = Vec::new();
        let mut next_old_line = 1u32;

        for patch_hunk in self.hunks {
            // A pure insertion reports the old line it follows (0 for a new file)
            let first_old_line = if patch_hunk.old_count == 0 {
                patch_hunk.old_start + 1
            } else {
                patch_hunk.old_start
            };
            let gap = first_old_line.saturating_sub(next_old_line);
            if gap > 0 {
                hunks.push(DiffHunk::ServerSkipped(gap as usize));
            }
            next_old_line = first_old_line + patch_hunk.old_count;
            group_patch_lines(patch_hunk.lines, &mut hunks);
        }

        FileDiff {
            path: self.file_b.or(self.file_a),
            binary: false,
            hunks,
        }
    }
}

fn strip_side_prefix(name: &str, prefix: &str) -> Option<String> {
    if name == "/dev/null" {
        return None;
    }
    Some(name.strip_prefix(prefix).unwrap_or(name).to_string())
}

/// Group a hunk's lines into unchanged runs and changed blocks.
fn group_patch_lines(lines: Vec<PatchLine>, out: &mut Vec<DiffHunk>) {
    let mut common: Vec<String> = Vec::new();
    let mut removed: Vec<String> = Vec::new();
    let mut added: Vec<String> = Vec::new();

    for line in lines {
        match line {
            PatchLine::Context(content) => {
                flush_changed(&mut removed, &mut added, out);
                common.push(content);
            }
            PatchLine::Removed(content) => {
                if !common.is_empty() {
                    out.push(DiffHunk::Unchanged(std::mem::take(&mut common)));
                }
                removed.push(content);
            }
            PatchLine::Added(content) => {
                if !common.is_empty() {
                    out.push(DiffHunk::Unchanged(std::mem::take(&mut common)));
                }
                added.push(content);
            }
        }
    }

    flush_changed(&mut removed, &mut added, out);
    if !common.is_empty() {
        out.push(DiffHunk::Unchanged(common));
    }
}

fn flush_changed(removed: &mut Vec<String>, added: &mut Vec<String>, out: &mut Vec<DiffHunk>) {
    if removed.is_empty() && added.is_empty() {
        return;
    }
    out.push(DiffHunk::Changed {
        lines_a: std::mem::take(removed),
        lines_b: std::mem::take(added),
        edit_a: None,
        edit_b: None,
    });
}
