//! Gerrit `DiffInfo` wire types and the hunk model built from them.
//!
//! The JSON shapes follow Gerrit's REST API (`GET /changes/{id}/revisions/{rev}/files/{path}/diff`).

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Prefix Gerrit puts in front of every JSON response body.
pub const XSSI_PREFIX: &str = ")]}'";

/// File-level diff as returned by Gerrit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffInfo {
    #[serde(default)]
    pub meta_a: Option<FileMeta>,
    #[serde(default)]
    pub meta_b: Option<FileMeta>,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub content: Vec<DiffContent>,
}

/// Metadata about one side of the diff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub lines: Option<u32>,
}

/// One entry of `DiffInfo.content`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffContent {
    #[serde(default)]
    pub ab: Option<Vec<String>>,
    #[serde(default)]
    pub a: Option<Vec<String>>,
    #[serde(default)]
    pub b: Option<Vec<String>>,
    #[serde(default)]
    pub edit_a: Option<Vec<IntralineEdit>>,
    #[serde(default)]
    pub edit_b: Option<Vec<IntralineEdit>>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub common: bool,
}

/// A `(skip, mark)` pair: advance `skip` characters, then mark `mark` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntralineEdit(pub usize, pub usize);

impl IntralineEdit {
    #[must_use]
    pub const fn skip(self) -> usize {
        self.0
    }

    #[must_use]
    pub const fn mark(self) -> usize {
        self.1
    }
}

/// One segment of a file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffHunk {
    /// Lines identical on both sides.
    Unchanged(Vec<String>),
    /// Removed (`lines_a`) and added (`lines_b`) lines with optional intraline edits.
    Changed {
        lines_a: Vec<String>,
        lines_b: Vec<String>,
        edit_a: Option<Vec<IntralineEdit>>,
        edit_b: Option<Vec<IntralineEdit>>,
    },
    /// Common lines the server did not send.
    ServerSkipped(usize),
}

impl DiffHunk {
    /// Shorthand for a changed hunk without intraline data.
    #[must_use]
    pub fn changed(lines_a: &[&str], lines_b: &[&str]) -> Self {
        Self::Changed {
            lines_a: lines_a.iter().map(ToString::to_string).collect(),
            lines_b: lines_b.iter().map(ToString::to_string).collect(),
            edit_a: None,
            edit_b: None,
        }
    }

    /// Shorthand for an unchanged hunk.
    #[must_use]
    pub fn unchanged(lines: &[&str]) -> Self {
        Self::Unchanged(lines.iter().map(ToString::to_string).collect())
    }
}

impl From<DiffContent> for DiffHunk {
    fn from(content: DiffContent) -> Self {
        if let Some(ab) = content.ab {
            return Self::Unchanged(ab);
        }
        if let Some(skip) = content.skip {
            return Self::ServerSkipped(skip);
        }
        Self::Changed {
            lines_a: content.a.unwrap_or_default(),
            lines_b: content.b.unwrap_or_default(),
            edit_a: content.edit_a,
            edit_b: content.edit_b,
        }
    }
}

/// Input handed to the diff model builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    pub path: Option<String>,
    pub binary: bool,
    pub hunks: Vec<DiffHunk>,
}

impl FileDiff {
    #[must_use]
    pub const fn new(hunks: Vec<DiffHunk>) -> Self {
        Self {
            path: None,
            binary: false,
            hunks,
        }
    }

    /// True when the diff is a single unchanged hunk (nothing differs).
    #[must_use]
    pub fn has_no_differences(&self) -> bool {
        matches!(self.hunks.as_slice(), [DiffHunk::Unchanged(_)])
    }
}

impl From<DiffInfo> for FileDiff {
    fn from(info: DiffInfo) -> Self {
        let path = info
            .meta_b
            .as_ref()
            .or(info.meta_a.as_ref())
            .map(|meta| meta.name.clone());
        Self {
            path,
            binary: info.binary,
            hunks: info.content.into_iter().map(DiffHunk::from).collect(),
        }
    }
}

/// Strip Gerrit's XSSI guard line, if present.
#[must_use]
pub fn strip_xssi_prefix(body: &str) -> &str {
    body.trim_start()
        .strip_prefix(XSSI_PREFIX)
        .map_or(body, str::trim_start)
}

/// Parse a Gerrit `DiffInfo` JSON body.
///
/// # Errors
///
/// Returns an error if the body is not valid `DiffInfo` JSON.
pub fn parse_diff_info(body: &str) -> anyhow::Result<DiffInfo> {
    serde_json::from_str(strip_xssi_prefix(body)).context("Failed to parse DiffInfo JSON")
}
