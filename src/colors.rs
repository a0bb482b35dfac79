use crossterm::style::Color;
use serde::Deserialize;

/// Logical colour role of a drawn cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ok,       // Green
    Warn,     // Yellow
    Error,    // Red
    Neutral,  // Cyan
}

impl Role {
    pub fn color(self) -> Color {
        match self {
            Role::Ok => Color::Green,
            Role::Warn => Color::Yellow,
            Role::Error => Color::Red,
            Role::Neutral => Color::Cyan,
        }
    }
}
