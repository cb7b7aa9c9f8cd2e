//! Format templates
//!
//! A template is plain text with `{{.Field}}` placeholders, for example
//! `{{.Date}} {{.Time}} {{.Logger}} {{.Level}} {{.Message}}`. Whitespace
//! inside the braces is ignored and `LevelLetters` takes an optional letter
//! count (`{{.LevelLetters 4}}`). Unknown field names are rejected when the
//! template is parsed.

use super::error::{Result, RouterError};
use std::fmt;
use std::str::FromStr;

/// Basic format: date, time, logger, level and message
pub const DEFAULT_FORMAT: &str =
    "{{.Date}} {{.Time}} {{.BoldColor}}{{.Logger}} {{.Level}}{{.NoColor}} {{.Color}}{{.Message}}{{.NoColor}}";

/// Verbose format including sequence ids and caller location
pub const DEBUG_FORMAT: &str = "{{.Date}} {{.Time}}{{.Nano}} {{.BoldColor}}{{.GID}}|{{.Logger}}|{{.LID}}{{.NoColor}} {{.Color}}{{.Message}}{{.NoColor}} {{.Func}} {{.File}}:{{.Line}}";

/// Message only
pub const MESSAGE_FORMAT: &str = "{{.Message}}";

/// A named value a template can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Time,
    Milli,
    Nano,
    Pid,
    Ppid,
    Gid,
    Lid,
    Logger,
    Level,
    LevelNum,
    LevelLetters(usize),
    Func,
    File,
    Line,
    Message,
    Color,
    BoldColor,
    NoColor,
}

impl FromStr for Field {
    type Err = ();

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match name {
            "Date" => Field::Date,
            "Time" => Field::Time,
            "Milli" => Field::Milli,
            "Nano" => Field::Nano,
            "PID" => Field::Pid,
            "PPID" => Field::Ppid,
            "GID" => Field::Gid,
            "LID" => Field::Lid,
            "Logger" => Field::Logger,
            "Level" => Field::Level,
            "LevelNum" => Field::LevelNum,
            "LevelLetters" => Field::LevelLetters(0),
            "Func" => Field::Func,
            "File" => Field::File,
            "Line" => Field::Line,
            "Message" | "Msg" => Field::Message,
            "Color" => Field::Color,
            "BoldColor" => Field::BoldColor,
            "NoColor" | "ColorReset" => Field::NoColor,
            _ => return Err(()),
        })
    }
}

/// Anything a template can be rendered against
pub trait FieldSource {
    /// Value of `field`; color fields must be empty when `colors` is false
    fn field(&self, field: Field, colors: bool) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Field(Field),
}

/// A parsed format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<Token>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                tokens.push(Token::Literal(rest[..start].to_string()));
            }
            let inner_start = start + 2;
            let end = rest[inner_start..]
                .find("}}")
                .ok_or_else(|| RouterError::template(offset + start, "unterminated '{{'"))?;
            let inner = &rest[inner_start..inner_start + end];
            tokens.push(Token::Field(Self::parse_field(inner, offset + start)?));

            let consumed = inner_start + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            tokens.push(Token::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    fn parse_field(inner: &str, position: usize) -> Result<Field> {
        let mut parts = inner.split_whitespace();
        let name = parts
            .next()
            .and_then(|part| part.strip_prefix('.'))
            .ok_or_else(|| RouterError::template(position, format!("expected '.Field', found '{}'", inner.trim())))?;

        let field = name
            .parse::<Field>()
            .map_err(|_| RouterError::template(position, format!("unknown field '{name}'")))?;

        let field = match (field, parts.next()) {
            (field, None) => field,
            (Field::LevelLetters(_), Some(arg)) => {
                let n = arg.parse::<usize>().map_err(|_| {
                    RouterError::template(position, format!("invalid letter count '{arg}'"))
                })?;
                Field::LevelLetters(n)
            }
            (_, Some(arg)) => {
                return Err(RouterError::template(
                    position,
                    format!("field '{name}' takes no argument, found '{arg}'"),
                ))
            }
        };

        if let Some(extra) = parts.next() {
            return Err(RouterError::template(position, format!("unexpected '{extra}'")));
        }
        Ok(field)
    }

    /// The format string this template was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fields referenced by this template, in order of appearance
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.tokens.iter().filter_map(|token| match token {
            Token::Field(field) => Some(*field),
            Token::Literal(_) => None,
        })
    }

    pub fn render<S: FieldSource + ?Sized>(&self, source: &S, colors: bool) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Field(field) => out.push_str(&source.field(*field, colors)),
            }
        }
        out
    }
}

impl FromStr for Template {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        Template::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
