//! gerrit-diff - render models for Gerrit file diffs
//!
//! Turns a file's hunk list plus its comments and drafts into a flat row
//! sequence (lines, fold markers, advisories, comment rows) ready for a UI
//! to draw. The pipeline is build, anchor, unfold; see [`processor`].

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod anchor;
pub mod builder;
pub mod comment;
pub mod config;
pub mod db;
pub mod decorate;
pub mod diff;
pub mod fold;
pub mod model;
pub mod options;
pub mod processor;
pub mod syntax;
pub mod theme;
pub mod unfold;
pub mod view;

pub use comment::{CommentInfo, CommentSet, Side};
pub use db::CommentDb;
pub use diff::{FileDiff, ParsedPatch};
pub use model::{RenderModel, Row, RowKind};
pub use options::{DiffOptions, LayoutMode};
pub use processor::{process, spawn, DiffRequest};
pub use syntax::{HighlightSpan, Highlighter};
pub use theme::DiffColors;
pub use view::{render_text, ViewOptions};
