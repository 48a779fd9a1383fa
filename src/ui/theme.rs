use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    pub title_style: Style,

    // Conversation bubbles
    pub user_text_style: Style,
    pub user_bubble_bg: Color,
    pub assistant_text_style: Style,
    pub assistant_bubble_bg: Color,

    // Status line
    pub loading_style: Style,
    pub status_info_style: Style,
    pub status_error_style: Style,

    // Input fields
    pub input_border_style: Style,
    pub input_focused_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,
    pub placeholder_style: Style,
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            background_color: Color::Rgb(0x17, 0x17, 0x17),
            title_style: Style::default()
                .fg(Color::Rgb(0xB4, 0xB4, 0xB4))
                .add_modifier(Modifier::BOLD),

            user_text_style: Style::default().fg(Color::Rgb(0xEC, 0xEC, 0xEC)),
            user_bubble_bg: Color::Rgb(0x2F, 0x2F, 0x2F),
            assistant_text_style: Style::default().fg(Color::Rgb(0xD1, 0xD5, 0xDB)),
            assistant_bubble_bg: Color::Rgb(0x21, 0x21, 0x21),

            loading_style: Style::default().fg(Color::Rgb(0x9C, 0xA3, 0xAF)),
            status_info_style: Style::default().fg(Color::Rgb(0x9C, 0xA3, 0xAF)),
            status_error_style: Style::default().fg(Color::Rgb(0xF8, 0x71, 0x71)),

            input_border_style: Style::default().fg(Color::Rgb(0x4B, 0x55, 0x63)),
            input_focused_border_style: Style::default().fg(Color::Rgb(0x60, 0xA5, 0xFA)),
            input_title_style: Style::default().fg(Color::Rgb(0x9C, 0xA3, 0xAF)),
            input_text_style: Style::default().fg(Color::Rgb(0xEC, 0xEC, 0xEC)),
            placeholder_style: Style::default()
                .fg(Color::Rgb(0x6B, 0x72, 0x80))
                .add_modifier(Modifier::ITALIC),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
