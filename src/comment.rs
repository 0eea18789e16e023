//! Gerrit comment records and the old/new collections handed to the anchorer.
//!
//! Comments and drafts share the same wire shape (`CommentInfo`); whether a
//! record is a draft is decided by which collection it arrives in.

use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::diff::strip_xssi_prefix;

/// Which revision of the file a comment was written against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommentSide {
    /// The base (parent) of the patch set.
    Parent,
    #[default]
    Revision,
}

/// Logical column a comment is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Old,
    New,
}

/// Character range a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

/// Comment author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "_account_id", default)]
    pub account_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl AccountInfo {
    /// Best available display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.username.clone())
            .or_else(|| self.email.clone())
            .or_else(|| self.account_id.map(|id| id.to_string()))
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

/// A published comment or a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub patch_set: Option<u32>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub side: CommentSide,
    /// Absent for file-level comments.
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub range: Option<CommentRange>,
    #[serde(default)]
    pub in_reply_to: Option<String>,
    #[serde(default)]
    pub author: Option<AccountInfo>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub unresolved: Option<bool>,
}

/// How a comment is anchored to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    /// Applies to the whole file.
    File,
    /// Applies to one line.
    Line(u32),
    /// Only a character range was given; these cannot be anchored.
    RangeOnly,
}

impl CommentInfo {
    #[must_use]
    pub const fn target(&self) -> CommentTarget {
        match (self.line, self.range) {
            (Some(line), _) => CommentTarget::Line(line),
            (None, None) => CommentTarget::File,
            (None, Some(_)) => CommentTarget::RangeOnly,
        }
    }

    /// Column this comment belongs to, given the collection it came from.
    #[must_use]
    pub fn logical_side(&self, from_old_collection: bool) -> Side {
        if from_old_collection || self.patch_set == Some(0) || self.side == CommentSide::Parent {
            Side::Old
        } else {
            Side::New
        }
    }

    #[must_use]
    pub fn author_name(&self) -> String {
        self.author
            .as_ref()
            .map_or_else(|| "anonymous".to_string(), AccountInfo::display_name)
    }
}

/// Old-side and new-side collections of comments (or of drafts).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentSet {
    pub old: Vec<CommentInfo>,
    pub new: Vec<CommentInfo>,
}

impl CommentSet {
    #[must_use]
    pub const fn new(old: Vec<CommentInfo>, new: Vec<CommentInfo>) -> Self {
        Self { old, new }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.old.len() + self.new.len()
    }

    /// Every comment paired with its logical side, old collection first.
    pub fn iter_sided(&self) -> impl Iterator<Item = (Side, &CommentInfo)> {
        self.old
            .iter()
            .map(|c| (c.logical_side(true), c))
            .chain(self.new.iter().map(|c| (c.logical_side(false), c)))
    }

    /// True when some comment targets `line` on `side`.
    #[must_use]
    pub fn targets_line(&self, side: Side, line: u32) -> bool {
        self.iter_sided()
            .any(|(s, c)| s == side && c.target() == CommentTarget::Line(line))
    }
}

/// Comments file contents: a plain list or Gerrit's map keyed by path.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommentsBody {
    List(Vec<CommentInfo>),
    ByPath(BTreeMap<String, Vec<CommentInfo>>),
}

/// Parse a comments JSON body, keeping only entries for `path` when given.
///
/// # Errors
///
/// Returns an error if the body is neither a comment list nor a map of lists.
pub fn parse_comments(body: &str, path: Option<&str>) -> anyhow::Result<Vec<CommentInfo>> {
    let parsed: CommentsBody = serde_json::from_str(strip_xssi_prefix(body))
        .context("Failed to parse comments JSON")?;

    let comments = match parsed {
        CommentsBody::List(list) => list
            .into_iter()
            .filter(|c| match (path, c.path.as_deref()) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .collect(),
        CommentsBody::ByPath(map) => map
            .into_iter()
            .filter(|(key, _)| path.is_none_or(|wanted| wanted == key))
            .flat_map(|(key, list)| {
                list.into_iter().map(move |mut c| {
                    c.path.get_or_insert_with(|| key.clone());
                    c
                })
            })
            .collect(),
    };
    Ok(comments)
}
