use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::import::ImportPolicy;
use crate::listbox::SelectionPolicy;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeConfig,
    pub list: ListConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Preset name: "default", "darkwall", "catppuccin-mocha", "nord", "gruvbox"
    pub preset: String,
    /// Overrides the preset's `selected-background` token
    pub selected_background: Option<String>,
    /// Overrides the preset's `selected-foreground` token
    pub selected_foreground: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// What to do with the selection when an earlier entry is removed
    pub selection_policy: SelectionPolicy,
    /// Show the selected definition's fields next to the list
    pub show_details: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// The one file extension the picker accepts (without the dot)
    pub extension: String,
    /// How overlapping imports are resolved
    pub policy: ImportPolicy,
    /// Give up on an import after this many seconds
    pub timeout_secs: u64,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            preset: "default".to_string(),
            selected_background: None,
            selected_foreground: None,
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            selection_policy: SelectionPolicy::default(),
            show_details: true,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            extension: "json".to_string(),
            policy: ImportPolicy::default(),
            timeout_secs: 30,
        }
    }
}

impl ThemeConfig {
    /// Build the theme, falling back to the default preset on unknown names
    pub fn build(&self) -> Theme {
        let theme = Theme::from_preset(&self.preset).unwrap_or_else(|| {
            tracing::warn!("Unknown theme preset {:?}, using default", self.preset);
            Theme::default()
        });
        theme.with_selection(
            self.selected_background.as_deref(),
            self.selected_foreground.as_deref(),
        )
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            tracing::info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.import.timeout_secs == 0 {
            bail!("import.timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Default config location under the user's config dir
    pub fn default_path() -> String {
        dirs::config_dir()
            .map(|dir| dir.join("defbox").join("config.toml").display().to_string())
            .unwrap_or_else(|| "~/.config/defbox/config.toml".to_string())
    }
}
