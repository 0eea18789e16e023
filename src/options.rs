//! Rendering preferences consumed by the diff model builder.

use serde::{Deserialize, Serialize};

/// Number of context lines kept visible around changes and revealed comments.
pub const CONTEXT_LINES: usize = 10;

/// Columns a tab expands to.
pub const TAB_WIDTH: usize = 4;

/// Diff layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Old and new file in two parallel columns.
    #[default]
    SideBySide,
    /// Deletions then additions in one column.
    Unified,
}

impl LayoutMode {
    /// Parse a user-facing mode name (`unified`, `side-by-side`, `sbs`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "unified" => Some(Self::Unified),
            "side-by-side" | "side_by_side" | "sbs" => Some(Self::SideBySide),
            _ => None,
        }
    }
}

/// Layout mode plus decoration flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub mode: LayoutMode,
    pub highlight_tabs: bool,
    pub highlight_trailing_whitespace: bool,
    pub highlight_intraline_diffs: bool,
    pub context_lines: usize,
    pub tab_width: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            highlight_tabs: true,
            highlight_trailing_whitespace: true,
            highlight_intraline_diffs: true,
            context_lines: CONTEXT_LINES,
            tab_width: TAB_WIDTH,
        }
    }
}

impl DiffOptions {
    #[must_use]
    pub fn with_mode(mode: LayoutMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Options with every decoration turned off.
    #[must_use]
    pub fn plain(mode: LayoutMode) -> Self {
        Self {
            mode,
            highlight_tabs: false,
            highlight_trailing_whitespace: false,
            highlight_intraline_diffs: false,
            ..Self::default()
        }
    }
}
