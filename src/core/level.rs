//! Log level definitions and the level registry
//!
//! Levels are small ordinals. Their names and colors live in a
//! [`LevelRegistry`], which is owned explicitly and shared through an `Arc`
//! with every router and logger that needs it. The five built-in levels are
//! registered first and keep fixed ordinals; custom levels are appended.

use super::color::LevelColor;
use super::error::{Result, RouterError};
use colored::Color;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// A severity ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(u8);

impl Level {
    pub const ERROR: Level = Level(0);
    pub const WARNING: Level = Level(1);
    pub const NOTICE: Level = Level(2);
    pub const INFO: Level = Level(3);
    pub const DEBUG: Level = Level(4);

    /// Built-in levels in ordinal order
    pub const BUILTIN: [Level; 5] = [
        Level::ERROR,
        Level::WARNING,
        Level::NOTICE,
        Level::INFO,
        Level::DEBUG,
    ];

    #[inline]
    pub const fn ordinal(self) -> u8 {
        self.0
    }

    /// Name of a built-in level, `None` for custom ordinals
    pub fn builtin_name(self) -> Option<&'static str> {
        BUILTIN_NAMES.get(self.0 as usize).copied()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "LEVEL{}", self.0),
        }
    }
}

const BUILTIN_NAMES: [&str; 5] = ["ERROR", "WARNING", "NOTICE", "INFO", "DEBUG"];

/// Set of levels a logger or backend is interested in
///
/// [`LevelSet::all`] is the wildcard: it wants every level, including custom
/// levels registered later. Removing a level from the wildcard excludes just
/// that level. An explicit set wants only its members, so an explicit set
/// emptied by `remove` wants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSet(Members);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Members {
    All { except: BTreeSet<Level> },
    Only(BTreeSet<Level>),
}

impl LevelSet {
    /// The wildcard set
    pub fn all() -> Self {
        LevelSet(Members::All {
            except: BTreeSet::new(),
        })
    }

    /// An explicit set with no members
    pub fn none() -> Self {
        LevelSet(Members::Only(BTreeSet::new()))
    }

    /// Start wanting `level`; returns false if it was already wanted
    pub fn insert(&mut self, level: Level) -> bool {
        match &mut self.0 {
            Members::All { except } => except.remove(&level),
            Members::Only(levels) => levels.insert(level),
        }
    }

    /// Stop wanting `level`; returns false if it was not wanted
    pub fn remove(&mut self, level: Level) -> bool {
        match &mut self.0 {
            Members::All { except } => except.insert(level),
            Members::Only(levels) => levels.remove(&level),
        }
    }

    #[inline]
    pub fn wants(&self, level: Level) -> bool {
        match &self.0 {
            Members::All { except } => !except.contains(&level),
            Members::Only(levels) => levels.contains(&level),
        }
    }

    /// True for the untouched wildcard
    pub fn is_wildcard(&self) -> bool {
        matches!(&self.0, Members::All { except } if except.is_empty())
    }

    /// True if no level at all is wanted
    pub fn is_empty(&self) -> bool {
        matches!(&self.0, Members::Only(levels) if levels.is_empty())
    }

    /// Members of an explicit set in ordinal order, `None` for the wildcard
    pub fn members(&self) -> Option<Vec<Level>> {
        match &self.0 {
            Members::All { .. } => None,
            Members::Only(levels) => Some(levels.iter().copied().collect()),
        }
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Level> for LevelSet {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        LevelSet(Members::Only(iter.into_iter().collect()))
    }
}

impl<const N: usize> From<[Level; N]> for LevelSet {
    fn from(levels: [Level; N]) -> Self {
        levels.into_iter().collect()
    }
}

impl From<&[Level]> for LevelSet {
    fn from(levels: &[Level]) -> Self {
        levels.iter().copied().collect()
    }
}

impl Extend<Level> for LevelSet {
    fn extend<I: IntoIterator<Item = Level>>(&mut self, iter: I) {
        for level in iter {
            self.insert(level);
        }
    }
}

/// Name and color registered for one ordinal
#[derive(Debug, Clone)]
pub struct LevelInfo {
    pub name: Arc<str>,
    pub color: LevelColor,
}

#[derive(Debug)]
struct RegistryState {
    by_name: HashMap<String, Level>,
    levels: Vec<LevelInfo>,
}

/// Thread-safe table of registered levels
#[derive(Debug)]
pub struct LevelRegistry {
    state: RwLock<RegistryState>,
}

impl LevelRegistry {
    /// Largest number of levels an ordinal can address
    pub const MAX_LEVELS: usize = u8::MAX as usize + 1;

    /// A registry holding the built-in levels only
    pub fn new() -> Self {
        let builtin_colors = [
            Color::Red,
            Color::Yellow,
            Color::Green,
            Color::White,
            Color::Cyan,
        ];

        let mut by_name = HashMap::new();
        let mut levels = Vec::with_capacity(BUILTIN_NAMES.len());
        for (idx, (name, color)) in BUILTIN_NAMES.iter().zip(builtin_colors).enumerate() {
            by_name.insert((*name).to_string(), Level(idx as u8));
            levels.push(LevelInfo {
                name: Arc::from(*name),
                color: LevelColor::Named(color),
            });
        }

        Self {
            state: RwLock::new(RegistryState { by_name, levels }),
        }
    }

    /// Register a level by name, returning it and whether it was newly added
    ///
    /// Names are case-insensitive. Re-registering an existing name keeps its
    /// ordinal and replaces its color.
    pub fn register(&self, name: &str, color: LevelColor) -> Result<(Level, bool)> {
        let key = name.trim().to_uppercase();
        if key.is_empty() {
            return Err(RouterError::invalid_level(name));
        }

        let mut state = self.state.write();
        if let Some(&level) = state.by_name.get(&key) {
            state.levels[level.0 as usize].color = color;
            return Ok((level, false));
        }

        if state.levels.len() >= Self::MAX_LEVELS {
            return Err(RouterError::LevelRegistryFull {
                max: Self::MAX_LEVELS,
            });
        }

        let level = Level(state.levels.len() as u8);
        state.levels.push(LevelInfo {
            name: Arc::from(key.as_str()),
            color,
        });
        state.by_name.insert(key, level);
        Ok((level, true))
    }

    /// Look up a level by name (case-insensitive)
    pub fn parse(&self, name: &str) -> Result<Level> {
        self.state
            .read()
            .by_name
            .get(&name.trim().to_uppercase())
            .copied()
            .ok_or_else(|| RouterError::invalid_level(name))
    }

    /// Parse every name, failing on the first unknown one
    pub fn parse_all<S: AsRef<str>>(&self, names: &[S]) -> Result<LevelSet> {
        names.iter().map(|name| self.parse(name.as_ref())).collect()
    }

    pub fn is_valid(&self, level: Level) -> bool {
        (level.0 as usize) < self.state.read().levels.len()
    }

    pub fn is_valid_name(&self, name: &str) -> bool {
        self.state
            .read()
            .by_name
            .contains_key(&name.trim().to_uppercase())
    }

    pub fn info(&self, level: Level) -> Option<LevelInfo> {
        self.state.read().levels.get(level.0 as usize).cloned()
    }

    pub fn name(&self, level: Level) -> Option<Arc<str>> {
        self.info(level).map(|info| info.name)
    }

    pub fn color(&self, level: Level) -> Option<LevelColor> {
        self.info(level).map(|info| info.color)
    }

    /// All registered levels in ordinal order
    pub fn levels(&self) -> Vec<Level> {
        (0..self.state.read().levels.len())
            .map(|idx| Level(idx as u8))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels() {
        let registry = LevelRegistry::new();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.levels(), Level::BUILTIN.to_vec());
        assert_eq!(registry.parse("error").unwrap(), Level::ERROR);
        assert_eq!(registry.parse("Warning").unwrap(), Level::WARNING);
        assert_eq!(registry.parse("NOTICE").unwrap(), Level::NOTICE);
        assert_eq!(registry.parse("info").unwrap(), Level::INFO);
        assert_eq!(registry.parse("debug").unwrap(), Level::DEBUG);
        assert_eq!(&*registry.name(Level::INFO).unwrap(), "INFO");
    }

    #[test]
    fn test_register_custom_level() {
        let registry = LevelRegistry::new();
        let (custom, is_new) = registry
            .register("custom1", LevelColor::Named(Color::Blue))
            .unwrap();

        assert!(is_new);
        assert_eq!(custom.ordinal(), 5);
        assert_eq!(registry.parse("CuStOm1").unwrap(), custom);
        assert_eq!(&*registry.name(custom).unwrap(), "CUSTOM1");
        assert_eq!(custom.to_string(), "LEVEL5");
    }

    #[test]
    fn test_register_existing_updates_color() {
        let registry = LevelRegistry::new();
        let (level, is_new) = registry
            .register("Info", LevelColor::Named(Color::Blue))
            .unwrap();

        assert!(!is_new);
        assert_eq!(level, Level::INFO);
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.color(Level::INFO),
            Some(LevelColor::Named(Color::Blue))
        );
    }

    #[test]
    fn test_ordinals_are_append_only() {
        let registry = LevelRegistry::new();
        let (a, _) = registry.register("a", LevelColor::default()).unwrap();
        let (b, _) = registry.register("b", LevelColor::default()).unwrap();
        let (a_again, is_new) = registry.register("A", LevelColor::default()).unwrap();

        assert_eq!(a.ordinal(), 5);
        assert_eq!(b.ordinal(), 6);
        assert_eq!(a_again, a);
        assert!(!is_new);
    }

    #[test]
    fn test_parse_unknown_fails() {
        let registry = LevelRegistry::new();
        let err = registry.parse("nonexistent").unwrap_err();
        assert!(matches!(err, RouterError::InvalidLevel { ref name } if name == "nonexistent"));
        assert!(!registry.is_valid_name("nonexistent"));
        assert!(!registry.is_valid(Level(42)));
        assert!(registry.is_valid(Level::DEBUG));
    }

    #[test]
    fn test_register_empty_name_fails() {
        let registry = LevelRegistry::new();
        assert!(registry.register("  ", LevelColor::default()).is_err());
    }

    #[test]
    fn test_registry_full() {
        let registry = LevelRegistry::new();
        for idx in 5..LevelRegistry::MAX_LEVELS {
            registry
                .register(&format!("custom{idx}"), LevelColor::default())
                .unwrap();
        }
        let err = registry
            .register("one_too_many", LevelColor::default())
            .unwrap_err();
        assert!(matches!(err, RouterError::LevelRegistryFull { max: 256 }));
    }

    #[test]
    fn test_parse_all() {
        let registry = LevelRegistry::new();
        let set = registry.parse_all(&["info", "NOTICE"]).unwrap();
        assert_eq!(set, LevelSet::from([Level::INFO, Level::NOTICE]));
        assert!(registry.parse_all(&["info", "bogus"]).is_err());
    }

    #[test]
    fn test_level_set_wildcard() {
        let mut all = LevelSet::all();
        assert!(all.is_wildcard());
        assert_eq!(all.members(), None);
        for level in Level::BUILTIN {
            assert!(all.wants(level));
        }
        assert!(all.wants(Level(200)));

        assert!(all.remove(Level::DEBUG));
        assert!(!all.wants(Level::DEBUG));
        assert!(all.wants(Level::INFO));
        assert!(!all.is_wildcard());

        assert!(all.insert(Level::DEBUG));
        assert!(all.is_wildcard());
    }

    #[test]
    fn test_emptied_level_set_wants_nothing() {
        let mut some = LevelSet::from([Level::INFO, Level::NOTICE]);
        assert!(some.wants(Level::INFO));
        assert!(!some.wants(Level::ERROR));

        some.remove(Level::INFO);
        some.remove(Level::NOTICE);
        assert!(some.is_empty());
        assert!(!some.is_wildcard());
        for level in Level::BUILTIN {
            assert!(!some.wants(level));
        }
        assert_eq!(some, LevelSet::none());
        assert_eq!(some.members(), Some(Vec::new()));
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(LevelRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .register("shared", LevelColor::default())
                        .unwrap()
                        .0
                })
            })
            .collect();

        let levels: Vec<Level> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(levels.iter().all(|level| *level == levels[0]));
        assert_eq!(registry.len(), 6);
    }
}
