use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub input_background: &'static str,
    pub input_border: &'static str,
    pub button_background: &'static str,
    pub button_text: &'static str,
    pub cancel_background: &'static str,
    pub cancel_text: &'static str,
    pub star_filled: &'static str,
    pub star_empty: &'static str,
    pub tooltip_background: &'static str,
    pub tooltip_text: &'static str,
}

pub const LIGHT: Palette = Palette {
    background: "#FFFFFF",
    text: "#000000",
    input_background: "#F7F7F7",
    input_border: "#D1D5DB",
    button_background: "#000000",
    button_text: "#FFFFFF",
    cancel_background: "#f0f0f0",
    cancel_text: "#000000",
    star_filled: "#000000",
    star_empty: "#E5E7EB",
    tooltip_background: "#FFFFFF",
    tooltip_text: "#000000",
};

pub const DARK: Palette = Palette {
    background: "#1F1F1F",
    text: "#FFFFFF",
    input_background: "#333333",
    input_border: "#444444",
    button_background: "#FFFFFF",
    button_text: "#000000",
    cancel_background: "#000000",
    cancel_text: "#f0f0f0",
    star_filled: "#FFFFFF",
    star_empty: "#666666",
    tooltip_background: "#000000",
    tooltip_text: "#FFFFFF",
};

impl ThemeMode {
    /// `prefers_dark` is the host's colour-scheme preference and only
    /// matters for [`ThemeMode::System`].
    pub fn palette(&self, prefers_dark: bool) -> &'static Palette {
        match self {
            ThemeMode::Light => &LIGHT,
            ThemeMode::Dark => &DARK,
            ThemeMode::System if prefers_dark => &DARK,
            ThemeMode::System => &LIGHT,
        }
    }
}

/// Trigger button size: a named preset or a literal padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ButtonSize {
    Preset(ButtonPreset),
    Pixels(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonPreset {
    Small,
    Medium,
    Large,
}

impl Default for ButtonSize {
    fn default() -> Self {
        ButtonSize::Preset(ButtonPreset::Small)
    }
}

impl ButtonSize {
    /// CSS padding for the trigger button.
    pub fn padding(&self) -> String {
        match self {
            ButtonSize::Pixels(px) => format!("{}px", px),
            ButtonSize::Preset(ButtonPreset::Small) => "8px 16px".to_string(),
            ButtonSize::Preset(ButtonPreset::Medium) => "12px 24px".to_string(),
            ButtonSize::Preset(ButtonPreset::Large) => "16px 32px".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipPlacement {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}
