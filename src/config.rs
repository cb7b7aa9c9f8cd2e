//! Declarative configuration
//!
//! A [`Config`] lists custom levels, outputs (by URL) and named loggers.
//! [`configure`] validates it and starts a router with the configured
//! backends; the result is a [`Logging`] handle that hands out loggers.
//!
//! ```
//! use rust_log_router::config::{configure, Config};
//!
//! let config = Config::from_json_str(r#"{
//!     "logger_name": "app",
//!     "levels": [{ "name": "audit", "color": "blue" }],
//!     "outputs": [{ "url": "file:///dev/stderr", "wants": ["ERROR", "AUDIT"] }]
//! }"#).unwrap();
//!
//! let logging = configure(&config).unwrap();
//! logging.default_logger().info("filtered out by the only output").unwrap();
//! logging.close().unwrap();
//! ```

use crate::backends::{self, OutputUrl, STDERR_URL, STDOUT_URL};
use crate::core::{
    Level, LevelColor, LevelRegistry, LevelSet, Logger, Result, Router, RouterError,
    SharedBackend, Template, DEFAULT_FORMAT,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LOGGER_NAME: &str = "main";

fn default_logger_name() -> String {
    DEFAULT_LOGGER_NAME.to_string()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_level_color() -> String {
    "magenta".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Name of the logger returned by [`Logging::default_logger`]
    #[serde(default = "default_logger_name")]
    pub logger_name: String,

    /// Format for outputs that don't set their own
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Custom levels, registered in order after the built-in ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<LevelConfig>,

    /// Outputs; when empty, stdout and stderr split the built-in levels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loggers: Vec<LoggerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logger_name: default_logger_name(),
            default_format: default_format(),
            levels: Vec::new(),
            outputs: Vec::new(),
            loggers: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelConfig {
    pub name: String,

    /// A color name (`red`, `bright blue`, ...) or a raw SGR parameter
    /// string such as `38;5;208`
    #[serde(default = "default_level_color")]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    pub url: String,

    /// Level names; empty means all levels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wants: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerConfig {
    pub name: String,

    /// Level names; empty means all levels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wants: Vec<String>,

    /// Output URLs this logger feeds; empty means all outputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone)]
struct LoggerSettings {
    levels: LevelSet,
    outputs: Option<Vec<String>>,
}

/// A running router plus the named-logger settings it was configured with
pub struct Logging {
    router: Router,
    default_logger: Logger,
    loggers: HashMap<String, LoggerSettings>,
}

impl Logging {
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn registry(&self) -> &Arc<LevelRegistry> {
        self.router.registry()
    }

    pub fn default_logger(&self) -> &Logger {
        &self.default_logger
    }

    /// A logger named `name`, carrying its configured levels and outputs
    ///
    /// Names without configuration get a logger that wants every level and
    /// feeds every output.
    pub fn logger(&self, name: &str) -> Logger {
        let logger = self.router.logger(name);
        match self.loggers.get(name) {
            Some(settings) => apply(logger, settings),
            None => logger,
        }
    }

    /// Drain and stop the router
    pub fn close(&self) -> Result<()> {
        self.router.close()
    }
}

impl std::fmt::Debug for Logging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logging")
            .field("router", &self.router)
            .field("default_logger", &self.default_logger.name())
            .field("loggers", &self.loggers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn apply(logger: Logger, settings: &LoggerSettings) -> Logger {
    let logger = logger.with_levels(settings.levels.clone());
    match &settings.outputs {
        Some(outputs) => logger.with_outputs(outputs.iter().cloned()),
        None => logger,
    }
}

/// Start a router with the default configuration
pub fn init() -> Result<Logging> {
    configure(&Config::default())
}

/// Validate `config` and start a router for it
///
/// Every error is reported before the dispatch thread starts: unknown level
/// names, bad templates, malformed URLs, unsupported schemes and outputs that
/// cannot be opened.
pub fn configure(config: &Config) -> Result<Logging> {
    if config.logger_name.is_empty() {
        return Err(RouterError::config("logger_name", "must not be empty"));
    }
    Template::parse(&config.default_format)?;

    let registry = Arc::new(LevelRegistry::new());
    for level in &config.levels {
        registry.register(&level.name, LevelColor::from_name(&level.color))?;
    }

    let (backends, names) = if config.outputs.is_empty() {
        default_backends(&config.default_format)?
    } else {
        open_outputs(config, &registry)?
    };

    let mut loggers = HashMap::new();
    for logger in &config.loggers {
        let levels = wanted_levels(&registry, &logger.wants)?;
        let outputs = if logger.outputs.is_empty() {
            None
        } else {
            let resolved = logger
                .outputs
                .iter()
                .map(|url| resolve_output(url, &names))
                .collect::<Result<Vec<_>>>()?;
            Some(resolved)
        };
        loggers.insert(logger.name.clone(), LoggerSettings { levels, outputs });
    }

    let router = Router::builder()
        .registry(registry)
        .backends(backends)
        .build()?;

    let default_logger = router.logger(config.logger_name.as_str());
    let default_logger = match loggers.get(&config.logger_name) {
        Some(settings) => apply(default_logger, settings),
        None => default_logger,
    };

    Ok(Logging {
        router,
        default_logger,
        loggers,
    })
}

/// Backends plus a map from normalized output URL to backend name
type OpenedOutputs = (Vec<SharedBackend>, HashMap<String, String>);

fn default_backends(format: &str) -> Result<OpenedOutputs> {
    let stdout = backends::open(
        STDOUT_URL,
        format,
        LevelSet::from([Level::DEBUG, Level::INFO, Level::NOTICE]),
        "",
    )?;
    let stderr = backends::open(
        STDERR_URL,
        format,
        LevelSet::from([Level::WARNING, Level::ERROR]),
        "",
    )?;

    let names = [&stdout, &stderr]
        .iter()
        .map(|backend| (backend.name().to_string(), backend.name().to_string()))
        .collect();
    Ok((vec![stdout, stderr], names))
}

fn open_outputs(config: &Config, registry: &LevelRegistry) -> Result<OpenedOutputs> {
    let mut backends: Vec<SharedBackend> = Vec::with_capacity(config.outputs.len());
    let mut names: HashMap<String, String> = HashMap::new();

    for output in &config.outputs {
        let url = OutputUrl::parse(&output.url)?.url();
        let levels = wanted_levels(&registry, &output.wants)?;
        let format = output.format.as_deref().unwrap_or(&config.default_format);

        // a repeated URL reconfigures the backend it already opened
        if let Some(name) = names.get(&url) {
            if let Some(existing) = backends.iter().find(|b| b.name() == name.as_str()) {
                existing.set_levels(levels);
                existing.set_format(format)?;
                continue;
            }
        }

        let backend = backends::open(&url, format, levels, &config.logger_name)?;
        names.insert(url, backend.name().to_string());
        backends.push(backend);
    }

    Ok((backends, names))
}

/// An empty `wants` list means every level
fn wanted_levels(registry: &LevelRegistry, names: &[String]) -> Result<LevelSet> {
    if names.is_empty() {
        Ok(LevelSet::all())
    } else {
        registry.parse_all(names)
    }
}

fn resolve_output(url: &str, names: &HashMap<String, String>) -> Result<String> {
    let normalized = OutputUrl::parse(url)?.url();
    names
        .get(&normalized)
        .or_else(|| names.values().find(|name| name.as_str() == url))
        .cloned()
        .ok_or_else(|| {
            RouterError::config("loggers", format!("output '{}' is not configured", url))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file_output(dir: &tempfile::TempDir, file: &str, wants: &[&str]) -> OutputConfig {
        OutputConfig {
            url: format!("file://{}", dir.path().join(file).display()),
            wants: wants.iter().map(|s| s.to_string()).collect(),
            format: Some("{{.Logger}} {{.Level}} {{.Message}}".to_string()),
        }
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.logger_name, DEFAULT_LOGGER_NAME);
        assert_eq!(config.default_format, DEFAULT_FORMAT);
    }

    #[test]
    fn test_level_color_defaults_to_magenta() {
        let config = Config::from_json_str(r#"{"levels": [{"name": "trace"}]}"#).unwrap();
        assert_eq!(config.levels[0].color, "magenta");
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config {
            logger_name: "svc".to_string(),
            loggers: vec![LoggerConfig {
                name: "svc.db".to_string(),
                wants: vec!["ERROR".to_string()],
                outputs: Vec::new(),
            }],
            ..Config::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(Config::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Config::from_json_str("{ not json"),
            Err(RouterError::JsonError(_))
        ));
    }

    #[test]
    fn test_init_uses_std_streams() {
        let logging = init().unwrap();
        let status = logging.router().status().unwrap();
        assert_eq!(status.backends, 2);
        assert_eq!(logging.default_logger().name(), DEFAULT_LOGGER_NAME);
        logging.close().unwrap();
    }

    #[test]
    fn test_configure_outputs_and_loggers() {
        let dir = tempfile::tempdir().unwrap();
        let all = file_output(&dir, "all.log", &[]);
        let errors = file_output(&dir, "errors.log", &["error", "audit"]);

        let config = Config {
            logger_name: "app".to_string(),
            levels: vec![LevelConfig {
                name: "audit".to_string(),
                color: "blue".to_string(),
            }],
            outputs: vec![all.clone(), errors.clone()],
            loggers: vec![LoggerConfig {
                name: "app.security".to_string(),
                wants: vec!["AUDIT".to_string()],
                outputs: vec![errors.url.clone()],
            }],
            ..Config::default()
        };

        let logging = configure(&config).unwrap();
        let audit = logging.registry().parse("Audit").unwrap();

        logging.default_logger().info("started").unwrap();
        logging.default_logger().error("broken").unwrap();

        let security = logging.logger("app.security");
        security.log(audit, "login").unwrap();
        security.info("ignored by logger filter").unwrap();

        logging.logger("other").log(audit, "plain logger").unwrap();
        logging.close().unwrap();

        let all_log = fs::read_to_string(dir.path().join("all.log")).unwrap();
        assert_eq!(
            all_log,
            "app INFO started\napp ERROR broken\nother AUDIT plain logger\n"
        );

        let errors_log = fs::read_to_string(dir.path().join("errors.log")).unwrap();
        assert_eq!(
            errors_log,
            "app ERROR broken\napp.security AUDIT login\nother AUDIT plain logger\n"
        );
    }

    #[test]
    fn test_duplicate_output_reconfigures() {
        let dir = tempfile::tempdir().unwrap();
        let first = file_output(&dir, "dup.log", &["INFO"]);
        let mut second = first.clone();
        second.wants = vec!["ERROR".to_string()];

        let config = Config {
            outputs: vec![first, second],
            ..Config::default()
        };
        let logging = configure(&config).unwrap();
        assert_eq!(logging.router().status().unwrap().backends, 1);

        logging.default_logger().info("dropped").unwrap();
        logging.default_logger().error("kept").unwrap();
        logging.close().unwrap();

        let contents = fs::read_to_string(dir.path().join("dup.log")).unwrap();
        assert_eq!(contents, "main ERROR kept\n");
    }

    #[test]
    fn test_configuration_errors() {
        let unsupported = Config {
            outputs: vec![OutputConfig {
                url: "kafka://broker".to_string(),
                wants: Vec::new(),
                format: None,
            }],
            ..Config::default()
        };
        assert!(matches!(
            configure(&unsupported),
            Err(RouterError::UnsupportedScheme { .. })
        ));

        let malformed = Config {
            outputs: vec![OutputConfig {
                url: "/var/log/app.log".to_string(),
                wants: Vec::new(),
                format: None,
            }],
            ..Config::default()
        };
        assert!(matches!(
            configure(&malformed),
            Err(RouterError::MalformedUrl { .. })
        ));

        let unknown_level = Config {
            loggers: vec![LoggerConfig {
                name: "x".to_string(),
                wants: vec!["VERBOSE".to_string()],
                outputs: Vec::new(),
            }],
            ..Config::default()
        };
        assert!(matches!(
            configure(&unknown_level),
            Err(RouterError::InvalidLevel { .. })
        ));

        let bad_format = Config {
            default_format: "{{.Hostname}}".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            configure(&bad_format),
            Err(RouterError::Template { .. })
        ));

        let unknown_output = Config {
            loggers: vec![LoggerConfig {
                name: "x".to_string(),
                wants: Vec::new(),
                outputs: vec!["file:///nowhere.log".to_string()],
            }],
            ..Config::default()
        };
        assert!(matches!(
            configure(&unknown_output),
            Err(RouterError::InvalidConfiguration { .. })
        ));
    }
}
