//! Configuration store.
//!
//! `settings.toml` lives in the config directory. Top-level keys are global
//! options; tables are local overrides keyed either `"ft:<filetype>"` or by a
//! glob matched against the buffer path:
//!
//! ```toml
//! tabsize = 4
//! softwrap = false
//!
//! ["ft:go"]
//! tabstospaces = false
//!
//! ["*.md"]
//! softwrap = true
//! ```
//!
//! A read or parse failure latches the store into an invalid state: the
//! failure is reported once and settings are never written back, so a broken
//! file is not overwritten with defaults.

use globset::Glob;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub mod options;

pub use options::{
    OptionValue, Settings, clamp_scroll_margin, default_global, default_local, parse_option,
    validate,
};

pub const SETTINGS_FILE: &str = "settings.toml";
pub const BINDINGS_FILE: &str = "bindings.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not a valid option")]
    UnknownOption(String),
    #[error("{value} is not a valid {expected} for {option}")]
    InvalidValue {
        option: String,
        value: String,
        expected: &'static str,
    },
    #[error("invalid value for {option}: {reason}")]
    Validation { option: String, reason: String },
    #[error("error compiling glob {pattern}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("error reading settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("error parsing settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("error writing settings file: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Errors produced by a user typing a bad option or value; these are
    /// reported on the info bar and otherwise ignored.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::UnknownOption(_)
                | ConfigError::InvalidValue { .. }
                | ConfigError::Validation { .. }
                | ConfigError::InvalidGlob { .. }
        )
    }
}

/// Config directory: explicit override, else `<platform config dir>/mica`,
/// else a relative `.mica`.
pub fn config_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("mica");
    }
    PathBuf::from(".mica")
}

/// Best-effort settings path: a `mica.toml` in the working directory wins,
/// then the config directory.
pub fn discover(override_dir: Option<&Path>) -> PathBuf {
    let local = PathBuf::from("mica.toml");
    if override_dir.is_none() && local.exists() {
        return local;
    }
    config_dir(override_dir).join(SETTINGS_FILE)
}

#[derive(Debug, Clone, PartialEq)]
enum SectionMatcher {
    Filetype(String),
    Glob(String),
}

#[derive(Debug, Clone)]
struct LocalSection {
    key: String,
    matcher: SectionMatcher,
    values: Settings,
}

/// Global options, parsed local sections and the invalid-settings latch.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    global: Settings,
    sections: Vec<LocalSection>,
    path: Option<PathBuf>,
    invalid: bool,
    load_error: Option<String>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ConfigStore {
    pub fn with_defaults() -> Self {
        Self {
            global: default_global(),
            sections: Vec::new(),
            path: None,
            invalid: false,
            load_error: None,
        }
    }

    /// Load settings from `path` (or the discovered default). Missing files
    /// yield defaults; unreadable or malformed files yield defaults with the
    /// invalid latch set.
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(|| discover(None));
        let mut store = Self::with_defaults();
        store.path = Some(path.clone());
        if !path.exists() {
            return store;
        }
        match fs::read_to_string(&path)
            .map_err(ConfigError::from)
            .and_then(|content| store.apply_file(&content))
        {
            Ok(rejected) => {
                for err in rejected {
                    warn!(target: "config", error = %err, "settings_value_rejected");
                    store.load_error.get_or_insert_with(|| err.to_string());
                }
            }
            Err(err) => {
                warn!(target: "config", path = %path.display(), error = %err, "settings_invalid");
                store.invalid = true;
                store.load_error = Some(err.to_string());
            }
        }
        store
    }

    fn apply_file(&mut self, content: &str) -> Result<Vec<ConfigError>, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut rejected = Vec::new();
        for (key, value) in table {
            match value {
                toml::Value::Table(inner) => {
                    let matcher = match key.strip_prefix("ft:") {
                        Some(ft) => SectionMatcher::Filetype(ft.to_string()),
                        None => SectionMatcher::Glob(key.clone()),
                    };
                    let mut values = Settings::default();
                    for (name, v) in inner {
                        match decode(&name, v) {
                            Ok(v) => values.insert(name, v),
                            Err(e) => rejected.push(e),
                        }
                    }
                    self.sections.push(LocalSection {
                        key,
                        matcher,
                        values,
                    });
                }
                other => match decode(&key, other) {
                    Ok(v) => self.global.insert(key, v),
                    Err(e) => rejected.push(e),
                },
            }
        }
        Ok(rejected)
    }

    /// Settings file path, if one was configured.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn settings_invalid(&self) -> bool {
        self.invalid
    }

    /// The load failure message, handed out once for the info bar.
    pub fn take_load_error(&mut self) -> Option<String> {
        self.load_error.take()
    }

    pub fn global(&self) -> &Settings {
        &self.global
    }

    /// Look up an option: the local table wins when it has the key.
    pub fn get_option<'a>(&'a self, name: &str, local: Option<&'a Settings>) -> Option<&'a OptionValue> {
        local
            .and_then(|l| l.get(name))
            .or_else(|| self.global.get(name))
    }

    /// Parse and set a global option. Returns the stored value so the caller
    /// can propagate it into buffers that carry the same key locally.
    pub fn set_global_option(&mut self, name: &str, raw: &str) -> Result<OptionValue, ConfigError> {
        let current = self
            .global
            .get(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?;
        let value = parse_option(name, raw, current)?;
        info!(target: "config", option = name, value = %value, "global_option_set");
        self.global.insert(name, value.clone());
        Ok(value)
    }

    /// Parse and set an option on a buffer's local table.
    pub fn set_local_option(
        &self,
        local: &mut Settings,
        name: &str,
        raw: &str,
    ) -> Result<OptionValue, ConfigError> {
        let current = local
            .get(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?;
        let value = parse_option(name, raw, current)?;
        local.insert(name, value.clone());
        Ok(value)
    }

    /// Local settings for a newly opened buffer: local defaults seeded from
    /// the current global values, then matching file sections applied in
    /// file order. Glob compile errors are returned alongside the result.
    pub fn local_settings_for(&self, path: Option<&Path>, filetype: &str) -> (Settings, Vec<ConfigError>) {
        let mut local = default_local();
        let keys: Vec<String> = local.iter().map(|(k, _)| k.clone()).collect();
        for key in keys {
            if let Some(v) = self.global.get(&key) {
                local.insert(key, v.clone());
            }
        }
        local.insert("filetype", OptionValue::Text(filetype.to_string()));
        let mut errors = Vec::new();
        for section in &self.sections {
            let applies = match &section.matcher {
                SectionMatcher::Filetype(ft) => ft == filetype,
                SectionMatcher::Glob(pattern) => match Glob::new(pattern) {
                    Ok(glob) => path.is_some_and(|p| glob.compile_matcher().is_match(p)),
                    Err(source) => {
                        errors.push(ConfigError::InvalidGlob {
                            pattern: pattern.clone(),
                            source,
                        });
                        false
                    }
                },
            };
            if applies {
                for (k, v) in section.values.iter() {
                    local.insert(k.clone(), v.clone());
                }
            }
        }
        (local, errors)
    }

    /// Write settings back to disk unless the invalid latch is set.
    pub fn write_settings(&self) -> Result<(), ConfigError> {
        match self.settings_file()? {
            Some(file) => file.write(),
            None => Ok(()),
        }
    }

    /// Render the settings file without touching the disk. `None` when the
    /// invalid latch is set or the store has no path.
    pub fn settings_file(&self) -> Result<Option<SettingsFile>, ConfigError> {
        if self.invalid {
            info!(target: "config", "settings_write_suppressed");
            return Ok(None);
        }
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let mut table = toml::Table::new();
        for (k, v) in self.global.iter() {
            table.insert(k.clone(), toml::Value::try_from(v)?);
        }
        for section in &self.sections {
            let mut inner = toml::Table::new();
            for (k, v) in section.values.iter() {
                inner.insert(k.clone(), toml::Value::try_from(v)?);
            }
            table.insert(section.key.clone(), toml::Value::Table(inner));
        }
        Ok(Some(SettingsFile {
            path: path.clone(),
            contents: toml::to_string_pretty(&table)?,
        }))
    }
}

/// Rendered settings, ready to be written from any thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFile {
    pub path: PathBuf,
    pub contents: String,
}

impl SettingsFile {
    pub fn write(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &self.contents)?;
        Ok(())
    }
}

fn decode(name: &str, value: toml::Value) -> Result<OptionValue, ConfigError> {
    let shown = value.to_string();
    let decoded: OptionValue = value
        .try_into()
        .map_err(|_| ConfigError::InvalidValue {
            option: name.to_string(),
            value: shown,
            expected: "bool, number, string or string list",
        })?;
    options::check_file_value(name, &decoded)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl Write for LockedWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn store_with(content: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, content).unwrap();
        let store = ConfigStore::load_from(Some(path));
        (dir, store)
    }

    #[test]
    fn defaults_when_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load_from(Some(dir.path().join("absent.toml")));
        assert!(!store.settings_invalid());
        assert_eq!(store.global().get_usize("scrollmargin"), 3);
        assert_eq!(store.global().get_usize("tabsize"), 4);
    }

    #[test]
    fn parses_global_values() {
        let (_d, store) = store_with("tabsize = 8\nsoftwrap = true\n");
        assert_eq!(store.global().get_usize("tabsize"), 8);
        assert!(store.global().get_bool("softwrap"));
    }

    #[test]
    fn malformed_file_latches_invalid_and_suppresses_write() {
        let (dir, mut store) = store_with("tabsize = = 3");
        assert!(store.settings_invalid());
        assert!(store.take_load_error().is_some());
        assert!(store.take_load_error().is_none());
        store.write_settings().unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(on_disk, "tabsize = = 3");
    }

    #[test]
    fn wrong_kind_in_file_is_rejected_but_not_fatal() {
        let (_d, mut store) = store_with("tabsize = \"wide\"\nruler = false\n");
        assert!(!store.settings_invalid());
        assert!(store.take_load_error().is_some());
        assert_eq!(store.global().get_usize("tabsize"), 4);
        assert!(!store.global().get_bool("ruler"));
    }

    #[test]
    fn local_override_falls_back_to_global() {
        let store = ConfigStore::with_defaults();
        let mut local = Settings::default();
        local.insert("tabsize", OptionValue::Number(2));
        assert_eq!(
            store.get_option("tabsize", Some(&local)),
            Some(&OptionValue::Number(2))
        );
        assert_eq!(
            store.get_option("ruler", Some(&local)),
            Some(&OptionValue::Bool(true))
        );
        assert_eq!(store.get_option("nope", None), None);
    }

    #[test]
    fn set_option_reports_user_errors() {
        let mut store = ConfigStore::with_defaults();
        let err = store.set_global_option("bogus", "1").unwrap_err();
        assert!(err.is_user_error());
        let err = store.set_global_option("tabsize", "zero").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(store.set_global_option("tabsize", "2").unwrap(), OptionValue::Number(2));
        assert_eq!(store.global().get_usize("tabsize"), 2);
    }

    #[test]
    fn filetype_and_glob_sections_apply() {
        let (_d, store) = store_with(
            "tabsize = 4\n[\"ft:go\"]\ntabsize = 8\n[\"*.md\"]\nsoftwrap = true\n",
        );
        let (go, errs) = store.local_settings_for(Some(Path::new("main.go")), "go");
        assert!(errs.is_empty());
        assert_eq!(go.tabsize(), 8);
        assert!(!go.get_bool("softwrap"));
        let (md, _) = store.local_settings_for(Some(Path::new("README.md")), "markdown");
        assert!(md.get_bool("softwrap"));
        assert_eq!(md.tabsize(), 4);
        assert_eq!(md.get_text("filetype"), "markdown");
    }

    #[test]
    fn bad_glob_reports_error() {
        let (_d, store) = store_with("[\"a[\"]\nsoftwrap = true\n");
        let (_, errs) = store.local_settings_for(Some(Path::new("a")), "Unknown");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ConfigError::InvalidGlob { .. }));
    }

    #[test]
    fn write_then_reload_preserves_sections() {
        let (dir, mut store) = store_with("[\"ft:rust\"]\ntabsize = 2\n");
        store.set_global_option("scrollspeed", "5").unwrap();
        store.write_settings().unwrap();
        let reloaded = ConfigStore::load_from(Some(dir.path().join(SETTINGS_FILE)));
        assert_eq!(reloaded.global().get_usize("scrollspeed"), 5);
        let (local, _) = reloaded.local_settings_for(None, "rust");
        assert_eq!(local.tabsize(), 2);
    }

    #[test]
    fn rendering_settings_leaves_the_disk_alone() {
        let (dir, mut store) = store_with("tabsize = 2\n");
        store.set_global_option("tabsize", "6").unwrap();
        let file = store.settings_file().unwrap().unwrap();
        assert_eq!(file.path, dir.path().join(SETTINGS_FILE));
        assert!(file.contents.contains("tabsize = 6"));
        let on_disk = std::fs::read_to_string(&file.path).unwrap();
        assert_eq!(on_disk, "tabsize = 2\n");
        file.write().unwrap();
        let reloaded = ConfigStore::load_from(Some(file.path.clone()));
        assert_eq!(reloaded.global().get_usize("tabsize"), 6);

        let (_d, latched) = store_with("tabsize = = 3");
        assert!(latched.settings_file().unwrap().is_none());
        assert!(ConfigStore::with_defaults().settings_file().unwrap().is_none());
    }

    #[test]
    fn invalid_settings_log_uses_config_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[[[").unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();
        let store = with_default(subscriber, || ConfigStore::load_from(Some(path)));
        assert!(store.settings_invalid());
        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("settings_invalid"));
    }
}
