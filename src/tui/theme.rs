//! Terminal theme and color definitions

use crossterm::style::Color;

/// Colors for CLI output and the chat shell
pub struct Theme {
    /// User prompt symbol
    pub prompt: Color,
    /// Mentor name in chat
    pub mentor: Color,
    pub system: Color,
    pub error: Color,
    /// Skipped or rate-limited candidates
    pub warning: Color,
    /// Secondary info
    pub dim: Color,
    pub success: Color,
    pub title: Color,
    /// Numbers in usage and report lines
    pub stats: Color,
    /// Slash command names
    pub command: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            prompt: Color::Cyan,
            mentor: Color::Magenta,
            system: Color::DarkYellow,
            error: Color::Red,
            warning: Color::Yellow,
            dim: Color::DarkGrey,
            success: Color::Green,
            title: Color::Magenta,
            stats: Color::Blue,
            command: Color::Yellow,
        }
    }
}
