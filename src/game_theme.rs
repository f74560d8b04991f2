use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameTheme {
    Monokai,
    Dracula,
    Nord,
    HighContrast,
}

pub struct ThemeColors {
    pub background: Color,
    pub border: Color,
    pub text: Color,
    pub accent: Color,
    pub line: Color,
}

impl GameTheme {
    pub fn colors(&self) -> ThemeColors {
        match self {
            GameTheme::Monokai => ThemeColors {
                background: Color::Reset,
                border: Color::Rgb(249, 38, 114), // Monokai pink
                text: Color::Rgb(248, 248, 242),  // Monokai foreground
                accent: Color::Rgb(166, 226, 46), // Monokai green
                line: Color::Rgb(102, 217, 239),  // Monokai cyan
            },
            GameTheme::Dracula => ThemeColors {
                background: Color::Reset,
                border: Color::Rgb(255, 121, 198), // Dracula pink
                text: Color::Rgb(248, 248, 242),   // Dracula foreground
                accent: Color::Rgb(189, 147, 249), // Dracula purple
                line: Color::Rgb(80, 250, 123),    // Dracula green
            },
            GameTheme::Nord => ThemeColors {
                background: Color::Reset,
                border: Color::Rgb(136, 192, 208), // Nord frost
                text: Color::Rgb(216, 222, 233),   // Nord fg
                accent: Color::Rgb(235, 203, 139), // Nord yellow
                line: Color::Rgb(94, 129, 172),    // Nord blue
            },
            GameTheme::HighContrast => ThemeColors {
                background: Color::Black,
                border: Color::White,
                text: Color::White,
                accent: Color::Yellow,
                line: Color::Rgb(0, 255, 255), // bright cyan
            },
        }
    }
}
