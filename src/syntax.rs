//! Syntax highlighting module using syntect
//!
//! Gives the text preview foreground colours for code. Diff backgrounds and
//! highlight spans come from the render model; syntect only picks the
//! foreground of each token.

use std::path::Path;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Theme as SyntectTheme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::theme::Rgba;

/// Default syntect theme for dark palettes.
pub const DARK_SYNTAX_THEME: &str = "base16-ocean.dark";
/// Default syntect theme for light palettes.
pub const LIGHT_SYNTAX_THEME: &str = "InspiredGitHub";

/// Highlighted text span with color information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub text: String,
    pub fg: Rgba,
    pub bold: bool,
    pub italic: bool,
}

/// Syntax highlighter with loaded syntaxes and theme
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Option<SyntectTheme>,
}

impl Highlighter {
    /// Create a highlighter with the default dark theme.
    #[must_use]
    pub fn new() -> Self {
        Self::with_theme(DARK_SYNTAX_THEME)
    }

    /// Create a highlighter with a specific syntect theme name, falling back
    /// to the dark default when the name is unknown.
    #[must_use]
    pub fn with_theme(theme_name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut theme_set = ThemeSet::load_defaults();

        let theme = theme_set
            .themes
            .remove(theme_name)
            .or_else(|| {
                log::warn!("unknown syntax theme {theme_name:?}, using {DARK_SYNTAX_THEME}");
                theme_set.themes.remove(DARK_SYNTAX_THEME)
            });

        Self { syntax_set, theme }
    }

    /// Theme suited to a background of the given luminance.
    #[must_use]
    pub fn for_background(background: Rgba) -> Self {
        if background.luminance() < 0.5 {
            Self::with_theme(DARK_SYNTAX_THEME)
        } else {
            Self::with_theme(LIGHT_SYNTAX_THEME)
        }
    }

    /// Get syntax reference for a file path (by extension)
    fn syntax_for_path(&self, path: &str) -> Option<&SyntaxReference> {
        let path = Path::new(path);

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Some(syntax) = self.syntax_set.find_syntax_by_extension(ext) {
                return Some(syntax);
            }
        }

        // Extensionless build files
        match path.file_name().and_then(|n| n.to_str())? {
            "Makefile" | "makefile" | "GNUmakefile" => self.syntax_set.find_syntax_by_extension("make"),
            "BUILD" | "WORKSPACE" => self.syntax_set.find_syntax_by_extension("py"),
            "Cargo.lock" => self.syntax_set.find_syntax_by_extension("toml"),
            _ => None,
        }
    }

    /// True when `file_path` maps to a known syntax.
    #[must_use]
    pub fn supports(&self, file_path: &str) -> bool {
        self.theme.is_some() && self.syntax_for_path(file_path).is_some()
    }

    /// Highlight a single line of code, returning spans with colors
    ///
    /// Returns None if the syntax couldn't be determined or highlighting failed.
    #[must_use]
    pub fn highlight_line(&self, line: &str, file_path: &str) -> Option<Vec<HighlightSpan>> {
        let theme = self.theme.as_ref()?;
        let syntax = self.syntax_for_path(file_path)?;
        let mut highlighter = HighlightLines::new(syntax, theme);

        let ranges = highlighter.highlight_line(line, &self.syntax_set).ok()?;

        Some(
            ranges
                .into_iter()
                .map(|(style, text)| HighlightSpan {
                    text: text.to_string(),
                    fg: syntect_color_to_rgba(style.foreground),
                    bold: style.font_style.contains(FontStyle::BOLD),
                    italic: style.font_style.contains(FontStyle::ITALIC),
                })
                .collect(),
        )
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

const fn syntect_color_to_rgba(color: Color) -> Rgba {
    Rgba {
        r: color.r,
        g: color.g,
        b: color.b,
        a: color.a,
    }
}
