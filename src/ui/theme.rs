//! Theme system for defbox
//!
//! Provides:
//! - Theme struct with the UI colors
//! - Named selection tokens resolved through [`ThemeLookup`]
//! - Built-in presets (default, darkwall, catppuccin, nord, gruvbox)
//! - Hex color parsing

use ratatui::style::Color;
use thiserror::Error;

/// Background applied to the selected entry when the theme leaves it unset
pub const DEFAULT_SELECTED_BACKGROUND: &str = "#3390ff";
/// Foreground applied to the selected entry when the theme leaves it unset
pub const DEFAULT_SELECTED_FOREGROUND: &str = "#ffffff";

/// Named color tokens the list asks the theme for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeToken {
    SelectedBackground,
    SelectedForeground,
}

impl ThemeToken {
    pub fn name(self) -> &'static str {
        match self {
            ThemeToken::SelectedBackground => "selected-background",
            ThemeToken::SelectedForeground => "selected-foreground",
        }
    }
}

/// Color resolution capability injected into the list.
///
/// Returns an empty string when the token is unset.
pub trait ThemeLookup {
    fn lookup(&self, token: ThemeToken) -> String;
}

/// Colors applied to a highlighted entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub background: String,
    pub foreground: String,
}

impl Highlight {
    /// Resolve selection colors, falling back to the fixed defaults
    /// for any token the theme leaves empty.
    pub fn resolve(theme: &dyn ThemeLookup) -> Self {
        Self {
            background: lookup_or(theme, ThemeToken::SelectedBackground, DEFAULT_SELECTED_BACKGROUND),
            foreground: lookup_or(theme, ThemeToken::SelectedForeground, DEFAULT_SELECTED_FOREGROUND),
        }
    }
}

fn lookup_or(theme: &dyn ThemeLookup, token: ThemeToken, fallback: &str) -> String {
    let value = theme.lookup(token);
    if value.trim().is_empty() {
        tracing::trace!("{} unset, using {}", token.name(), fallback);
        fallback.to_string()
    } else {
        value
    }
}

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Main background color
    pub background: Color,
    /// Primary text color
    pub foreground: Color,
    /// Accent color (borders, prompt)
    pub accent: Color,
    /// Dimmed text (status bar, details)
    pub dimmed: Color,
    /// Error notices
    pub error: Color,
    /// `selected-background` token, empty when unset
    pub selected_background: String,
    /// `selected-foreground` token, empty when unset
    pub selected_foreground: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::plain()
    }
}

impl ThemeLookup for Theme {
    fn lookup(&self, token: ThemeToken) -> String {
        match token {
            ThemeToken::SelectedBackground => self.selected_background.clone(),
            ThemeToken::SelectedForeground => self.selected_foreground.clone(),
        }
    }
}

impl Theme {
    /// Terminal default colors, selection tokens left unset
    pub fn plain() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Reset,
            accent: Color::Blue,
            dimmed: Color::DarkGray,
            error: Color::Red,
            selected_background: String::new(),
            selected_foreground: String::new(),
        }
    }

    /// Darkwall theme
    pub fn darkwall() -> Self {
        Self {
            background: Color::Rgb(13, 17, 22),    // #0d1116
            foreground: Color::Rgb(229, 234, 241), // #e5eaf1
            accent: Color::Rgb(180, 83, 9),        // #b45309 (amber)
            dimmed: Color::Rgb(107, 114, 128),     // #6b7280
            error: Color::Rgb(239, 68, 68),        // #ef4444
            selected_background: "#141c2a".to_string(),
            selected_foreground: "#e5eaf1".to_string(),
        }
    }

    /// Catppuccin Mocha theme
    pub fn catppuccin_mocha() -> Self {
        Self {
            background: Color::Rgb(30, 30, 46),    // #1e1e2e (base)
            foreground: Color::Rgb(205, 214, 244), // #cdd6f4 (text)
            accent: Color::Rgb(137, 180, 250),     // #89b4fa (blue)
            dimmed: Color::Rgb(147, 153, 178),     // #9399b2 (overlay2)
            error: Color::Rgb(243, 139, 168),      // #f38ba8 (red)
            selected_background: "#313244".to_string(),
            selected_foreground: "#cdd6f4".to_string(),
        }
    }

    /// Nord theme
    pub fn nord() -> Self {
        Self {
            background: Color::Rgb(46, 52, 64),    // #2e3440 (nord0)
            foreground: Color::Rgb(236, 239, 244), // #eceff4 (nord6)
            accent: Color::Rgb(136, 192, 208),     // #88c0d0 (nord8)
            dimmed: Color::Rgb(76, 86, 106),       // #4c566a (nord3)
            error: Color::Rgb(191, 97, 106),       // #bf616a (nord11)
            selected_background: "#434c5e".to_string(),
            selected_foreground: "#eceff4".to_string(),
        }
    }

    /// Gruvbox dark theme
    pub fn gruvbox() -> Self {
        Self {
            background: Color::Rgb(40, 40, 40),    // #282828 (bg)
            foreground: Color::Rgb(235, 219, 178), // #ebdbb2 (fg)
            accent: Color::Rgb(215, 153, 33),      // #d79921 (yellow)
            dimmed: Color::Rgb(146, 131, 116),     // #928374 (gray)
            error: Color::Rgb(204, 36, 29),        // #cc241d (red)
            selected_background: "#3c3836".to_string(),
            selected_foreground: "#ebdbb2".to_string(),
        }
    }

    /// Load theme from preset name
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" | "plain" => Some(Self::plain()),
            "darkwall" => Some(Self::darkwall()),
            "catppuccin-mocha" | "catppuccin_mocha" | "catppuccin" => Some(Self::catppuccin_mocha()),
            "nord" => Some(Self::nord()),
            "gruvbox" | "gruvbox-dark" | "gruvbox_dark" => Some(Self::gruvbox()),
            _ => None,
        }
    }

    /// Override the selection tokens; `None` keeps the preset value
    pub fn with_selection(mut self, background: Option<&str>, foreground: Option<&str>) -> Self {
        if let Some(bg) = background {
            self.selected_background = bg.to_string();
        }
        if let Some(fg) = foreground {
            self.selected_foreground = fg.to_string();
        }
        self
    }
}

/// Parse hex color string to Color
/// Supports: #rrggbb, #rgb, #rrggbbaa (with or without the leading #)
pub fn parse_hex_color(s: &str) -> Result<Color, ColorError> {
    let s = s.trim().trim_start_matches('#');

    if !s.is_ascii() {
        return Err(ColorError::InvalidHex);
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| ColorError::InvalidHex)
    };

    match s.len() {
        // #rgb -> #rrggbb
        3 => Ok(Color::Rgb(channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17)),
        // #rrggbb, #rrggbbaa (alpha ignored)
        6 | 8 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        _ => Err(ColorError::InvalidLength),
    }
}

/// Color parsing error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color length (expected 3, 6, or 8 hex chars)")]
    InvalidLength,
    #[error("invalid hex character")]
    InvalidHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        assert_eq!(parse_hex_color("#3390ff"), Ok(Color::Rgb(0x33, 0x90, 0xff)));
        assert_eq!(parse_hex_color("00ff00"), Ok(Color::Rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_hex_3_and_8() {
        assert_eq!(parse_hex_color("#fff"), Ok(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("#ff0000ff"), Ok(Color::Rgb(255, 0, 0)));
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert_eq!(parse_hex_color("#gg0000"), Err(ColorError::InvalidHex));
        assert_eq!(parse_hex_color("#ff00"), Err(ColorError::InvalidLength));
        assert_eq!(parse_hex_color(""), Err(ColorError::InvalidLength));
        assert!(parse_hex_color("#ééé").is_err());
    }

    #[test]
    fn test_highlight_falls_back_when_unset() {
        let highlight = Highlight::resolve(&Theme::plain());
        assert_eq!(highlight.background, "#3390ff");
        assert_eq!(highlight.foreground, "#ffffff");
    }

    #[test]
    fn test_highlight_uses_theme_tokens() {
        let theme = Theme::plain().with_selection(Some("#123456"), None);
        let highlight = Highlight::resolve(&theme);
        assert_eq!(highlight.background, "#123456");
        assert_eq!(highlight.foreground, DEFAULT_SELECTED_FOREGROUND);
    }

    #[test]
    fn test_presets() {
        assert!(Theme::from_preset("default").is_some());
        assert!(Theme::from_preset("Nord").is_some());
        assert!(Theme::from_preset("catppuccin").is_some());
        assert!(Theme::from_preset("nonexistent").is_none());
        assert!(Theme::from_preset("darkwall").unwrap().lookup(ThemeToken::SelectedBackground).starts_with('#'));
    }

    #[test]
    fn test_token_names() {
        assert_eq!(ThemeToken::SelectedBackground.name(), "selected-background");
        assert_eq!(ThemeToken::SelectedForeground.name(), "selected-foreground");
    }
}
