//! Log entry structure
//!
//! An [`Entry`] is built once per accepted log call and never mutated. The
//! router hands it to every interested backend by reference; all accessors
//! are pure, so backends read it concurrently without locking.

use super::caller::CallerInfo;
use super::color::{LevelColor, RESET};
use super::error::Result;
use super::level::Level;
use super::redact::{self, Arg};
use super::template::{Field, FieldSource, Template};
use chrono::{DateTime, Local};
use std::sync::{Arc, OnceLock};

fn process_ids() -> (u32, u32) {
    static IDS: OnceLock<(u32, u32)> = OnceLock::new();
    *IDS.get_or_init(|| (std::process::id(), parent_process_id()))
}

#[cfg(unix)]
fn parent_process_id() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn parent_process_id() -> u32 {
    0
}

/// Message payload
#[derive(Debug, Clone)]
pub enum Payload {
    /// Already rendered text
    Text(String),
    /// Arguments joined with spaces when rendered
    Args(Vec<Arg>),
    /// A `{}` format string and its arguments
    Format { format: String, args: Vec<Arg> },
}

impl Payload {
    pub fn render(&self) -> String {
        match self {
            Payload::Text(text) => text.clone(),
            Payload::Args(args) => redact::render_args(args),
            Payload::Format { format, args } => redact::render_format(format, args),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<Arg>> for Payload {
    fn from(args: Vec<Arg>) -> Self {
        Payload::Args(args)
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    gid: u64,
    lid: u64,
    logger: Arc<str>,
    level: Level,
    level_name: Arc<str>,
    color: LevelColor,
    pid: u32,
    ppid: u32,
    timestamp: DateTime<Local>,
    caller: CallerInfo,
    payload: Payload,
    outputs: Option<Arc<[String]>>,
}

impl Entry {
    /// Start an entry; ids default to zero until the router assigns them
    pub fn builder(level: Level, level_name: impl Into<Arc<str>>) -> EntryBuilder {
        let (pid, ppid) = process_ids();
        EntryBuilder {
            entry: Entry {
                gid: 0,
                lid: 0,
                logger: Arc::from(""),
                level,
                level_name: level_name.into(),
                color: LevelColor::default(),
                pid,
                ppid,
                timestamp: Local::now(),
                caller: CallerInfo::default(),
                payload: Payload::Text(String::new()),
                outputs: None,
            },
        }
    }

    /// Global sequence number
    pub fn gid(&self) -> u64 {
        self.gid
    }

    /// Per-logger sequence number
    pub fn lid(&self) -> u64 {
        self.lid
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    pub fn level_num(&self) -> String {
        self.level.ordinal().to_string()
    }

    /// First `n` letters of the level name (`n == 0` means 3)
    pub fn level_letters(&self, n: usize) -> &str {
        let n = if n == 0 { 3 } else { n };
        match self.level_name.char_indices().nth(n) {
            Some((idx, _)) => &self.level_name[..idx],
            None => &self.level_name,
        }
    }

    pub fn color(&self) -> &LevelColor {
        &self.color
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn ppid(&self) -> u32 {
        self.ppid
    }

    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    /// `YYYY/MM/DD`
    pub fn date(&self) -> String {
        self.timestamp.format("%Y/%m/%d").to_string()
    }

    /// `HH:MM:SS`
    pub fn time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Milliseconds as `.mmm`
    pub fn milli(&self) -> String {
        self.timestamp.format("%.3f").to_string()
    }

    /// Microseconds as `.uuuuuu`
    pub fn nano(&self) -> String {
        self.timestamp.format("%.6f").to_string()
    }

    pub fn caller(&self) -> &CallerInfo {
        &self.caller
    }

    pub fn file(&self) -> &str {
        &self.caller.file
    }

    pub fn line(&self) -> u32 {
        self.caller.line
    }

    pub fn function(&self) -> &str {
        &self.caller.function
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The rendered message, redactable arguments replaced
    pub fn message(&self) -> String {
        self.payload.render()
    }

    /// Backend names this entry is restricted to (`None` means every backend)
    pub fn outputs(&self) -> Option<&[String]> {
        self.outputs.as_deref()
    }

    /// Whether the backend named `name` should see this entry
    pub fn targets(&self, name: &str) -> bool {
        self.outputs
            .as_ref()
            .map_or(true, |outputs| outputs.iter().any(|output| output == name))
    }

    /// Render through a format string, color fields empty
    pub fn render(&self, format: &str) -> Result<String> {
        self.render_colored(format, false)
    }

    /// Render through a format string, color fields resolved when `colors`
    pub fn render_colored(&self, format: &str, colors: bool) -> Result<String> {
        Ok(Template::parse(format)?.render(self, colors))
    }

    pub(crate) fn with_ids(mut self, gid: u64, lid: u64) -> Self {
        self.gid = gid;
        self.lid = lid;
        self
    }
}

impl FieldSource for Entry {
    fn field(&self, field: Field, colors: bool) -> String {
        match field {
            Field::Date => self.date(),
            Field::Time => self.time(),
            Field::Milli => self.milli(),
            Field::Nano => self.nano(),
            Field::Pid => self.pid.to_string(),
            Field::Ppid => self.ppid.to_string(),
            Field::Gid => self.gid.to_string(),
            Field::Lid => self.lid.to_string(),
            Field::Logger => self.logger.to_string(),
            Field::Level => self.level_name.to_string(),
            Field::LevelNum => self.level_num(),
            Field::LevelLetters(n) => self.level_letters(n).to_string(),
            Field::Func => self.caller.function.clone(),
            Field::File => self.caller.file.clone(),
            Field::Line => self.caller.line.to_string(),
            Field::Message => self.message(),
            Field::Color if colors => self.color.sequence(),
            Field::BoldColor if colors => self.color.bold_sequence(),
            Field::NoColor if colors => RESET.to_string(),
            Field::Color | Field::BoldColor | Field::NoColor => String::new(),
        }
    }
}

/// Builder for [`Entry`]
#[derive(Debug)]
pub struct EntryBuilder {
    entry: Entry,
}

impl EntryBuilder {
    #[must_use]
    pub fn logger(mut self, name: impl Into<Arc<str>>) -> Self {
        self.entry.logger = name.into();
        self
    }

    #[must_use]
    pub fn color(mut self, color: LevelColor) -> Self {
        self.entry.color = color;
        self
    }

    #[must_use]
    pub fn caller(mut self, caller: CallerInfo) -> Self {
        self.entry.caller = caller;
        self
    }

    #[must_use]
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.entry.payload = payload.into();
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.entry.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn outputs(mut self, outputs: Option<Arc<[String]>>) -> Self {
        self.entry.outputs = outputs;
        self
    }

    #[must_use]
    pub fn ids(mut self, gid: u64, lid: u64) -> Self {
        self.entry = self.entry.with_ids(gid, lid);
        self
    }

    pub fn build(self) -> Entry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::redact::Redactable;
    use chrono::TimeZone;
    use colored::Color;
    use std::fmt;

    struct Token(&'static str);

    impl fmt::Display for Token {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Redactable for Token {
        fn redacted(&self) -> String {
            "[REDACTED]".to_string()
        }
    }

    fn sample() -> Entry {
        Entry::builder(Level::WARNING, "WARNING")
            .logger("app.db")
            .color(LevelColor::Named(Color::Yellow))
            .caller(CallerInfo::new("src/db.rs", 42, "app::db::connect"))
            .timestamp(Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap())
            .payload(Payload::Format {
                format: "retry {} with {}".to_string(),
                args: vec![Arg::from(3), Arg::redacted(Token("hunter2"))],
            })
            .ids(17, 4)
            .build()
    }

    #[test]
    fn test_accessors() {
        let entry = sample();
        assert_eq!(entry.gid(), 17);
        assert_eq!(entry.lid(), 4);
        assert_eq!(entry.logger(), "app.db");
        assert_eq!(entry.level(), Level::WARNING);
        assert_eq!(entry.level_num(), "1");
        assert_eq!(entry.date(), "2024/03/09");
        assert_eq!(entry.time(), "07:05:01");
        assert_eq!(entry.milli(), ".000");
        assert_eq!(entry.nano(), ".000000");
        assert_eq!(entry.file(), "src/db.rs");
        assert_eq!(entry.line(), 42);
        assert_eq!(entry.function(), "app::db::connect");
        assert_eq!(entry.pid(), std::process::id());
    }

    #[test]
    fn test_level_letters() {
        let entry = sample();
        assert_eq!(entry.level_letters(0), "WAR");
        assert_eq!(entry.level_letters(4), "WARN");
        assert_eq!(entry.level_letters(50), "WARNING");
    }

    #[test]
    fn test_message_is_redacted() {
        let entry = sample();
        assert_eq!(entry.message(), "retry 3 with [REDACTED]");
        assert_eq!(entry.render("{{.Message}}").unwrap(), entry.message());
    }

    #[test]
    fn test_render_is_idempotent() {
        let entry = sample();
        let format = "{{.Date}} {{.Time}} {{.Logger}}:{{.LID}} {{.Level}} {{.Message}}";
        let first = entry.render(format).unwrap();
        let second = entry.render(format).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "2024/03/09 07:05:01 app.db:4 WARNING retry 3 with [REDACTED]");
    }

    #[test]
    fn test_render_colors() {
        let entry = sample();
        let format = "{{.Color}}{{.Level}}{{.NoColor}}";
        assert_eq!(entry.render(format).unwrap(), "WARNING");
        assert_eq!(
            entry.render_colored(format, true).unwrap(),
            "\x1b[0;33mWARNING\x1b[0m"
        );
    }

    #[test]
    fn test_render_unknown_field() {
        assert!(sample().render("{{.Nope}}").is_err());
    }

    #[test]
    fn test_targets() {
        let entry = sample();
        assert!(entry.targets("anything"));

        let outputs: Arc<[String]> = Arc::from(vec!["file:///dev/stdout".to_string()]);
        let restricted = Entry::builder(Level::INFO, "INFO")
            .outputs(Some(outputs))
            .build();
        assert!(restricted.targets("file:///dev/stdout"));
        assert!(!restricted.targets("file:///dev/stderr"));
    }

    #[test]
    fn test_text_and_args_payloads() {
        let text = Entry::builder(Level::INFO, "INFO").payload("plain").build();
        assert_eq!(text.message(), "plain");

        let args = Entry::builder(Level::INFO, "INFO")
            .payload(vec![Arg::from("a"), Arg::from(2)])
            .build();
        assert_eq!(args.message(), "a 2");
    }
}
