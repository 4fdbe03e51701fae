//! Color palette shared by every pane

use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    /// Titles, active frame, array cells
    pub accent: Color,
    /// Current element, loop pointer, executing line marker
    pub pointer: Color,
    /// Labels, line numbers, inactive frames
    pub muted: Color,
    pub success: Color,
    pub error: Color,
    pub keyword: Color,
    pub string: Color,
    pub number: Color,
    pub border: Color,
    /// Background of the highlighted source line
    pub current_line: Color,
    pub function: Color,
    /// Values produced by `return`
    pub return_value: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(137, 180, 250),
    pointer: Color::Rgb(250, 179, 135),
    muted: Color::Rgb(127, 132, 156),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    keyword: Color::Rgb(203, 166, 247),
    string: Color::Rgb(166, 227, 161),
    number: Color::Rgb(250, 179, 135),
    border: Color::Rgb(88, 91, 112),
    current_line: Color::Rgb(49, 50, 68),
    function: Color::Rgb(249, 226, 175),
    return_value: Color::Rgb(245, 194, 231),
};
