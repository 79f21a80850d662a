use std::str::FromStr;

use tuirealm::ratatui::style::Color;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ThemePreset {
    #[default]
    Default,
    HighContrast,
    Mono,
}

impl ThemePreset {
    pub const ALL: [Self; 3] = [Self::Default, Self::HighContrast, Self::Mono];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::HighContrast => "high-contrast",
            Self::Mono => "mono",
        }
    }
}

impl FromStr for ThemePreset {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "high-contrast" | "high_contrast" | "contrast" => Ok(Self::HighContrast),
            "mono" | "monochrome" => Ok(Self::Mono),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub base: BasePalette,
    pub interactive: InteractivePalette,
    pub dialog: DialogPalette,
}

#[derive(Debug, Clone, Copy)]
pub struct BasePalette {
    pub text: Color,
    pub text_muted: Color,
    pub title_fg: Color,
    pub title_bg: Color,
    pub danger: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct InteractivePalette {
    /// Background of the focused control.
    pub focus: Color,
    pub focus_text: Color,
    /// Marks values that differ from what is saved.
    pub unsaved: Color,
    pub border: Color,
    pub selected_text: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct DialogPalette {
    pub border: Color,
    pub button_fg: Color,
    pub input_bg: Color,
}

impl Theme {
    pub fn from_preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Default => Self {
                base: BasePalette {
                    text: Color::Rgb(0xEE, 0xEE, 0xEE),
                    text_muted: Color::Rgb(0x5D, 0xAD, 0xE2),
                    title_fg: Color::Rgb(0xFF, 0xFD, 0xF5),
                    title_bg: Color::Rgb(0x25, 0xA0, 0x65),
                    danger: Color::Rgb(0xE0, 0x4F, 0x5F),
                },
                interactive: InteractivePalette {
                    focus: Color::Rgb(0x00, 0x00, 0xFF),
                    focus_text: Color::Rgb(0xFF, 0xFF, 0xFF),
                    unsaved: Color::Rgb(0x00, 0x77, 0xFF),
                    border: Color::Rgb(0x44, 0x44, 0x44),
                    selected_text: Color::Rgb(0xEE, 0x6F, 0xF8),
                },
                dialog: DialogPalette {
                    border: Color::Indexed(63),
                    button_fg: Color::Rgb(0xFF, 0xFF, 0xFF),
                    input_bg: Color::Rgb(0x1E, 0x1E, 0x1E),
                },
            },
            ThemePreset::HighContrast => Self {
                base: BasePalette {
                    text: Color::White,
                    text_muted: Color::Gray,
                    title_fg: Color::Black,
                    title_bg: Color::Yellow,
                    danger: Color::LightRed,
                },
                interactive: InteractivePalette {
                    focus: Color::Yellow,
                    focus_text: Color::Black,
                    unsaved: Color::LightBlue,
                    border: Color::White,
                    selected_text: Color::LightYellow,
                },
                dialog: DialogPalette {
                    border: Color::White,
                    button_fg: Color::White,
                    input_bg: Color::Black,
                },
            },
            ThemePreset::Mono => Self {
                base: BasePalette {
                    text: Color::Gray,
                    text_muted: Color::DarkGray,
                    title_fg: Color::Black,
                    title_bg: Color::Gray,
                    danger: Color::White,
                },
                interactive: InteractivePalette {
                    focus: Color::White,
                    focus_text: Color::Black,
                    unsaved: Color::DarkGray,
                    border: Color::DarkGray,
                    selected_text: Color::White,
                },
                dialog: DialogPalette {
                    border: Color::Gray,
                    button_fg: Color::Gray,
                    input_bg: Color::Reset,
                },
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_preset(ThemePreset::Default)
    }
}
