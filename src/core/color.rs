//! Display attributes of log levels
//!
//! A level is bound to a [`LevelColor`], which renders to the ANSI escape
//! sequences used by the `Color`, `BoldColor` and `NoColor` template fields
//! and by terminal-attached file backends.

use colored::Color;
use std::fmt;
use std::str::FromStr;

const ESCAPE: &str = "\x1b[";

/// ANSI reset sequence
pub const RESET: &str = "\x1b[0m";

/// Color bound to a level in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelColor {
    /// A color known to `colored` (`red`, `bright blue`, ...)
    Named(Color),
    /// Raw SGR parameters placed between `ESC[` and `m`, e.g. `38;5;208`
    Literal(String),
}

impl LevelColor {
    /// Escape sequence selecting this color with normal intensity
    pub fn sequence(&self) -> String {
        match self {
            LevelColor::Named(color) => format!("{ESCAPE}0;{}m", color.to_fg_str()),
            LevelColor::Literal(literal) => format!("{ESCAPE}{literal}m"),
        }
    }

    /// Escape sequence selecting this color in bold
    pub fn bold_sequence(&self) -> String {
        match self {
            LevelColor::Named(color) => format!("{ESCAPE}1;{}m", color.to_fg_str()),
            LevelColor::Literal(literal) => format!("{ESCAPE}1;{literal}m"),
        }
    }

    /// Parse a color name; anything `colored` doesn't know becomes a literal
    pub fn from_name(name: &str) -> Self {
        match Color::from_str(name.trim()) {
            Ok(color) => LevelColor::Named(color),
            Err(()) => LevelColor::Literal(name.trim().to_string()),
        }
    }
}

impl Default for LevelColor {
    /// Custom levels without an explicit color are magenta
    fn default() -> Self {
        LevelColor::Named(Color::Magenta)
    }
}

impl From<Color> for LevelColor {
    fn from(color: Color) -> Self {
        LevelColor::Named(color)
    }
}

impl fmt::Display for LevelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sequence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_sequences() {
        let red = LevelColor::Named(Color::Red);
        assert_eq!(red.sequence(), "\x1b[0;31m");
        assert_eq!(red.bold_sequence(), "\x1b[1;31m");
        assert_eq!(red.to_string(), red.sequence());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(LevelColor::from_name("CYAN"), LevelColor::Named(Color::Cyan));
        assert_eq!(LevelColor::from_name(" green "), LevelColor::Named(Color::Green));
        assert_eq!(
            LevelColor::from_name("38;5;208"),
            LevelColor::Literal("38;5;208".to_string())
        );
    }

    #[test]
    fn test_literal_sequences() {
        let orange = LevelColor::Literal("38;5;208".to_string());
        assert_eq!(orange.sequence(), "\x1b[38;5;208m");
        assert_eq!(orange.bold_sequence(), "\x1b[1;38;5;208m");
    }

    #[test]
    fn test_default_is_magenta() {
        assert_eq!(LevelColor::default(), LevelColor::Named(Color::Magenta));
    }
}
