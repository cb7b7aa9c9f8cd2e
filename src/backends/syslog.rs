//! Syslog backend over the local datagram socket
//!
//! Lines are sent in RFC 3164 framing:
//! `<PRI>Mmm dd hh:mm:ss tag[pid]: message`.

use crate::core::{Backend, BackendConfig, Entry, Level, LevelSet, Result, RouterError};
use parking_lot::Mutex;
use std::fmt;
use std::os::unix::net::UnixDatagram;
use std::path::Path;
use std::str::FromStr;

/// Sockets tried in order by [`SyslogBackend::new`]
pub const SOCKET_PATHS: [&str; 2] = ["/dev/log", "/var/run/syslog"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facility {
    Kern = 0,
    #[default]
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    AuthPriv = 10,
    Ftp = 11,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl Facility {
    pub const ALL: [Facility; 20] = [
        Facility::Kern,
        Facility::User,
        Facility::Mail,
        Facility::Daemon,
        Facility::Auth,
        Facility::Syslog,
        Facility::Lpr,
        Facility::News,
        Facility::Uucp,
        Facility::Cron,
        Facility::AuthPriv,
        Facility::Ftp,
        Facility::Local0,
        Facility::Local1,
        Facility::Local2,
        Facility::Local3,
        Facility::Local4,
        Facility::Local5,
        Facility::Local6,
        Facility::Local7,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::AuthPriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Facility {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.to_ascii_lowercase();
        Facility::ALL
            .into_iter()
            .find(|facility| facility.name() == name)
            .ok_or_else(|| RouterError::config("syslog", format!("unknown facility '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
}

impl Severity {
    /// Severity for an entry level; custom levels map to notice
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::ERROR => Severity::Error,
            Level::WARNING => Severity::Warning,
            Level::NOTICE => Severity::Notice,
            Level::INFO => Severity::Informational,
            Level::DEBUG => Severity::Debug,
            _ => Severity::Notice,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Emergency => "emerg",
            Severity::Alert => "alert",
            Severity::Critical => "crit",
            Severity::Error => "err",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Informational => "info",
            Severity::Debug => "debug",
        };
        f.write_str(name)
    }
}

pub struct SyslogBackend {
    name: String,
    config: BackendConfig,
    facility: Facility,
    tag: String,
    socket: Mutex<UnixDatagram>,
}

impl SyslogBackend {
    /// Connect to the local syslog daemon
    pub fn new(format: &str, levels: LevelSet, facility: Facility, tag: &str) -> Result<Self> {
        let mut last_error = None;
        for path in SOCKET_PATHS {
            match Self::connect(path, format, levels.clone(), facility, tag) {
                Ok(backend) => return Ok(backend),
                Err(e @ RouterError::BackendWrite { .. }) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            RouterError::config("syslog", "no syslog socket available")
        }))
    }

    /// Connect to the syslog socket at `path`
    pub fn connect(
        path: impl AsRef<Path>,
        format: &str,
        levels: LevelSet,
        facility: Facility,
        tag: &str,
    ) -> Result<Self> {
        let config = BackendConfig::new(format, levels)?;
        let name = syslog_url(facility, tag);
        let socket = UnixDatagram::unbound()
            .and_then(|socket| socket.connect(path.as_ref()).map(|()| socket))
            .map_err(|e| RouterError::backend_write(name.clone(), e))?;

        Ok(Self {
            name,
            config,
            facility,
            tag: tag.to_string(),
            socket: Mutex::new(socket),
        })
    }

    /// Backend for the location part of a `syslog://` URL
    ///
    /// The location is `[facility[/tag]]`; the facility defaults to `user`
    /// and the tag to `default_tag`.
    pub fn from_location(
        location: &str,
        format: &str,
        levels: LevelSet,
        default_tag: &str,
    ) -> Result<Self> {
        let (facility, tag) = parse_location(location, default_tag)?;
        Self::new(format, levels, facility, &tag)
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn frame(&self, entry: &Entry) -> String {
        let body = self.config.template().render(entry, false);
        let priority = (self.facility as u8) * 8 + Severity::for_level(entry.level()) as u8;
        format!(
            "<{}>{} {}[{}]: {}",
            priority,
            entry.timestamp().format("%b %e %H:%M:%S"),
            self.tag,
            entry.pid(),
            body
        )
    }
}

impl Backend for SyslogBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn log(&self, entry: &Entry) -> Result<()> {
        if !self.wants(entry) {
            return Ok(());
        }
        let message = self.frame(entry);
        self.socket
            .lock()
            .send(message.as_bytes())
            .map(|_| ())
            .map_err(|e| RouterError::backend_write(self.name.clone(), e))
    }
}

fn parse_location(location: &str, default_tag: &str) -> Result<(Facility, String)> {
    let (facility, tag) = match location.split_once('/') {
        Some((facility, tag)) => (facility, tag),
        None => (location, ""),
    };
    let facility = if facility.is_empty() {
        Facility::default()
    } else {
        facility.parse()?
    };
    let tag = if tag.is_empty() { default_tag } else { tag };
    Ok((facility, tag.to_string()))
}

fn syslog_url(facility: Facility, tag: &str) -> String {
    format!("syslog://{}/{}", facility, tag)
}
