//! Diff colours.
//!
//! Rows only carry colour tags (`LineColor`, `HighlightKind`); the view
//! resolves them through a [`DiffColors`] value. Colours are derived from six
//! seed colours and any derived colour can be overridden from JSON.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::{HighlightKind, LineColor};

/// Opaque 8-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() || !matches!(digits.len(), 6 | 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }

    /// Perceived brightness in `0.0..=1.0`.
    #[must_use]
    pub fn luminance(self) -> f32 {
        (f32::from(self.r) * 0.299 + f32::from(self.g) * 0.587 + f32::from(self.b) * 0.114) / 255.0
    }

    /// Linear mix, `t = 0` gives `self` and `t = 1` gives `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Paint `self` at `alpha` opacity over `background`.
    #[must_use]
    pub fn blend_over(self, background: Self, alpha: f32) -> Self {
        let mut blended = background.lerp(self, alpha);
        blended.a = background.a;
        blended
    }
}

/// Resolved colours for every tag the render model can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffColors {
    pub name: String,
    pub background: Rgba,
    pub foreground: Rgba,
    pub muted: Rgba,
    pub added_bg: Rgba,
    pub deleted_bg: Rgba,
    pub intraline_added: Rgba,
    pub intraline_deleted: Rgba,
    pub tab: Rgba,
    pub trailing_whitespace: Rgba,
    pub comment_bg: Rgba,
    pub draft_bg: Rgba,
}

impl Default for DiffColors {
    fn default() -> Self {
        Self::dark()
    }
}

// ---------------------------------------------------------------------------
// Tag resolution
// ---------------------------------------------------------------------------

impl DiffColors {
    /// Background for a line side.
    #[must_use]
    pub const fn line_bg(&self, color: LineColor) -> Option<Rgba> {
        match color {
            LineColor::None => None,
            LineColor::Added => Some(self.added_bg),
            LineColor::Deleted => Some(self.deleted_bg),
        }
    }

    /// Background for a highlight span on a line tagged `color`.
    #[must_use]
    pub const fn highlight_bg(&self, kind: HighlightKind, color: LineColor) -> Rgba {
        match kind {
            HighlightKind::Intraline => match color {
                LineColor::Deleted => self.intraline_deleted,
                LineColor::Added | LineColor::None => self.intraline_added,
            },
            HighlightKind::Tab => self.tab,
            HighlightKind::TrailingWhitespace => self.trailing_whitespace,
        }
    }
}

// ---------------------------------------------------------------------------
// Seed-based construction
// ---------------------------------------------------------------------------

/// The seed colours every other colour is derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorSeeds {
    pub background: String,
    pub foreground: String,
    pub muted: String,
    pub added: String,
    pub deleted: String,
    pub warning: String,
}

/// Optional overrides for derived colours.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorOverrides {
    pub added_bg: Option<String>,
    pub deleted_bg: Option<String>,
    pub intraline_added: Option<String>,
    pub intraline_deleted: Option<String>,
    pub tab: Option<String>,
    pub trailing_whitespace: Option<String>,
    pub comment_bg: Option<String>,
    pub draft_bg: Option<String>,
}

/// Colours file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorsFile {
    pub name: String,
    pub seeds: ColorSeeds,
    #[serde(default)]
    pub overrides: Option<ColorOverrides>,
}

impl DiffColors {
    /// Derive a full palette from `seeds`, then apply `overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if any seed or override is not a valid hex colour.
    pub fn from_seeds(
        name: String,
        seeds: &ColorSeeds,
        overrides: Option<&ColorOverrides>,
    ) -> anyhow::Result<Self> {
        let background = parse_color(&seeds.background)?;
        let foreground = parse_color(&seeds.foreground)?;
        let muted = parse_color(&seeds.muted)?;
        let added = parse_color(&seeds.added)?;
        let deleted = parse_color(&seeds.deleted)?;
        let warning = parse_color(&seeds.warning)?;

        // Dark backgrounds need stronger tints to stay visible.
        let tint = if background.luminance() < 0.5 { 0.18 } else { 0.12 };
        let mut colors = Self {
            name,
            background,
            foreground,
            muted,
            added_bg: added.blend_over(background, tint),
            deleted_bg: deleted.blend_over(background, tint),
            intraline_added: added.blend_over(background, tint * 2.5),
            intraline_deleted: deleted.blend_over(background, tint * 2.5),
            tab: muted.blend_over(background, 0.35),
            trailing_whitespace: deleted.blend_over(background, 0.6),
            comment_bg: background.lerp(foreground, 0.08),
            draft_bg: warning.blend_over(background, tint),
        };

        if let Some(ov) = overrides {
            apply_override(&mut colors.added_bg, ov.added_bg.as_ref())?;
            apply_override(&mut colors.deleted_bg, ov.deleted_bg.as_ref())?;
            apply_override(&mut colors.intraline_added, ov.intraline_added.as_ref())?;
            apply_override(&mut colors.intraline_deleted, ov.intraline_deleted.as_ref())?;
            apply_override(&mut colors.tab, ov.tab.as_ref())?;
            apply_override(&mut colors.trailing_whitespace, ov.trailing_whitespace.as_ref())?;
            apply_override(&mut colors.comment_bg, ov.comment_bg.as_ref())?;
            apply_override(&mut colors.draft_bg, ov.draft_bg.as_ref())?;
        }

        Ok(colors)
    }

    /// Built-in dark palette.
    ///
    /// # Panics
    ///
    /// Panics if the built-in seed colours are invalid.
    #[must_use]
    pub fn dark() -> Self {
        Self::from_seeds(
            "dark".to_string(),
            &ColorSeeds {
                background: "#1a1b26".into(),
                foreground: "#c0caf5".into(),
                muted: "#565f89".into(),
                added: "#9ece6a".into(),
                deleted: "#f7768e".into(),
                warning: "#e0af68".into(),
            },
            None,
        )
        .expect("built-in dark seeds are valid")
    }

    /// Built-in light palette.
    ///
    /// # Panics
    ///
    /// Panics if the built-in seed colours are invalid.
    #[must_use]
    pub fn light() -> Self {
        Self::from_seeds(
            "light".to_string(),
            &ColorSeeds {
                background: "#ffffff".into(),
                foreground: "#24292f".into(),
                muted: "#6e7781".into(),
                added: "#1a7f37".into(),
                deleted: "#cf222e".into(),
                warning: "#9a6700".into(),
            },
            None,
        )
        .expect("built-in light seeds are valid")
    }

    /// Built-in palette by name.
    #[must_use]
    pub fn built_in(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_color(hex: &str) -> anyhow::Result<Rgba> {
    Rgba::from_hex(hex).ok_or_else(|| anyhow::anyhow!("Invalid hex color: {hex}"))
}

fn apply_override(target: &mut Rgba, source: Option<&String>) -> anyhow::Result<()> {
    if let Some(hex) = source {
        *target = parse_color(hex)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a colours file.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or contains invalid colours.
pub fn load_colors_from_str(json: &str) -> anyhow::Result<DiffColors> {
    let file: ColorsFile = serde_json::from_str(json).context("Failed to parse colors JSON")?;
    DiffColors::from_seeds(file.name, &file.seeds, file.overrides.as_ref())
}

/// Load a colours file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid colours file.
pub fn load_colors_from_path(path: &Path) -> anyhow::Result<DiffColors> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read colors file {}", path.display()))?;
    load_colors_from_str(&json).with_context(|| format!("Invalid colors file {}", path.display()))
}

/// Resolve a palette name or file path.
///
/// # Errors
///
/// Returns an error if `spec` is neither a built-in name nor a loadable file.
pub fn resolve_colors(spec: &str) -> anyhow::Result<DiffColors> {
    match DiffColors::built_in(spec) {
        Some(colors) => Ok(colors),
        None => load_colors_from_path(Path::new(spec)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex("#ff8000"), Some(Rgba::rgb(255, 128, 0)));
        assert_eq!(
            Rgba::from_hex("00000080"),
            Some(Rgba {
                r: 0,
                g: 0,
                b: 0,
                a: 128
            })
        );
        assert_eq!(Rgba::from_hex("#fff"), None);
        assert_eq!(Rgba::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_lerp_endpoints() {
        let black = Rgba::rgb(0, 0, 0);
        let white = Rgba::rgb(255, 255, 255);
        assert_eq!(black.lerp(white, 0.0), black);
        assert_eq!(black.lerp(white, 1.0), white);
        assert_eq!(black.lerp(white, 0.5).r, 128);
    }

    #[test]
    fn test_tag_resolution() {
        let colors = DiffColors::dark();
        assert_eq!(colors.line_bg(LineColor::None), None);
        assert_eq!(colors.line_bg(LineColor::Added), Some(colors.added_bg));
        assert_eq!(
            colors.highlight_bg(HighlightKind::Intraline, LineColor::Deleted),
            colors.intraline_deleted
        );
        assert_eq!(
            colors.highlight_bg(HighlightKind::Tab, LineColor::Added),
            colors.tab
        );
    }

    #[test]
    fn test_overrides_apply() {
        let json = r##"{
            "name": "custom",
            "seeds": {
                "background": "#000000",
                "foreground": "#ffffff",
                "muted": "#808080",
                "added": "#00ff00",
                "deleted": "#ff0000",
                "warning": "#ffff00"
            },
            "overrides": { "addedBg": "#003300" }
        }"##;
        let colors = load_colors_from_str(json).expect("valid colors");
        assert_eq!(colors.name, "custom");
        assert_eq!(colors.added_bg, Rgba::rgb(0, 0x33, 0));
        assert_ne!(colors.deleted_bg, colors.background);
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let json = r##"{
            "name": "broken",
            "seeds": {
                "background": "#000000",
                "foreground": "#ffffff",
                "muted": "#808080",
                "added": "#00ff00",
                "deleted": "#ff0000",
                "warning": "#ffff00"
            },
            "overrides": { "tab": "blue" }
        }"##;
        let err = load_colors_from_str(json).expect_err("invalid override");
        assert!(err.to_string().contains("Invalid hex color"));
    }

    #[test]
    fn test_resolve_built_in() {
        assert_eq!(resolve_colors("light").expect("built-in").name, "light");
        assert!(resolve_colors("/nonexistent/colors.json").is_err());
    }
}
