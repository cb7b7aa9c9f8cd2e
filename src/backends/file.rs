//! File backend: stdout, stderr or an append-mode file

use crate::core::{Backend, BackendConfig, Entry, LevelSet, Result, RouterError, RESET};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

pub const STDOUT_PATH: &str = "/dev/stdout";
pub const STDERR_PATH: &str = "/dev/stderr";

enum Target {
    Stdout,
    Stderr,
    File(BufWriter<File>),
}

impl Target {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Target::Stdout => io::stdout().lock().write_all(line.as_bytes()),
            Target::Stderr => io::stderr().lock().write_all(line.as_bytes()),
            Target::File(writer) => writer.write_all(line.as_bytes()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Target::Stdout => io::stdout().flush(),
            Target::Stderr => io::stderr().flush(),
            Target::File(writer) => writer.flush(),
        }
    }
}

/// Writes one rendered line per entry
///
/// When the target is an interactive terminal and color output is enabled,
/// each line is wrapped in its level's color and template color fields
/// resolve to escape sequences. Otherwise output is plain text.
pub struct FileBackend {
    name: String,
    path: PathBuf,
    config: BackendConfig,
    target: Mutex<Target>,
    terminal: bool,
    color_output: bool,
}

impl FileBackend {
    pub fn stdout(format: &str, levels: LevelSet) -> Result<Self> {
        Self::with_target(
            Target::Stdout,
            STDOUT_PATH,
            io::stdout().is_terminal(),
            format,
            levels,
        )
    }

    pub fn stderr(format: &str, levels: LevelSet) -> Result<Self> {
        Self::with_target(
            Target::Stderr,
            STDERR_PATH,
            io::stderr().is_terminal(),
            format,
            levels,
        )
    }

    /// Open `path` for appending, creating it (mode 0600 on unix) if needed
    pub fn open(path: impl AsRef<Path>, format: &str, levels: LevelSet) -> Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options
            .open(path)
            .map_err(|e| RouterError::backend_write(file_url(path), e))?;
        let terminal = file.is_terminal();

        Self::with_target(
            Target::File(BufWriter::new(file)),
            path,
            terminal,
            format,
            levels,
        )
    }

    /// Backend for the location part of a `file://` URL
    ///
    /// `/dev/stdout` and `/dev/stderr` share the process streams instead of
    /// opening the device files.
    pub fn from_location(location: &str, format: &str, levels: LevelSet) -> Result<Self> {
        match location {
            STDOUT_PATH => Self::stdout(format, levels),
            STDERR_PATH => Self::stderr(format, levels),
            "" => Err(RouterError::MalformedUrl {
                url: file_url(Path::new(location)),
            }),
            path => Self::open(path, format, levels),
        }
    }

    fn with_target(
        target: Target,
        path: impl Into<PathBuf>,
        terminal: bool,
        format: &str,
        levels: LevelSet,
    ) -> Result<Self> {
        let path = path.into();
        Ok(Self {
            name: file_url(&path),
            path,
            config: BackendConfig::new(format, levels)?,
            target: Mutex::new(target),
            terminal,
            color_output: true,
        })
    }

    /// Enable or disable colors on terminals (enabled by default)
    #[must_use]
    pub fn with_color_output(mut self, enabled: bool) -> Self {
        self.color_output = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn colors_enabled(&self) -> bool {
        self.terminal && self.color_output
    }

    fn render(&self, entry: &Entry) -> String {
        let colors = self.colors_enabled();
        let body = self.config.template().render(entry, colors);
        if colors {
            format!("{}{}{}\n", entry.color().sequence(), body, RESET)
        } else {
            format!("{}\n", body)
        }
    }
}

impl Backend for FileBackend {
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
        let line = self.render(entry);
        self.target
            .lock()
            .write_line(&line)
            .map_err(|e| RouterError::backend_write(self.name.clone(), e))
    }

    fn flush(&self) -> Result<()> {
        self.target
            .lock()
            .flush()
            .map_err(|e| RouterError::backend_write(self.name.clone(), e))
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Err(e) = self.target.get_mut().flush() {
            eprintln!("[ROUTER WARNING] Failed to flush {} on drop: {}", self.name, e);
        }
    }
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
