//! Loader for search-window settings with YAML + environment overlays.
//!
//! Sources are merged in the order they are added, with `INPAGE__`-prefixed
//! environment variables always taking precedence (`INPAGE__VERBOSE=true`,
//! `INPAGE__LOG__FORMAT=json`). After merging, string values go through
//! `${VAR}` and `~/` expansion so paths can point into the user's home.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// File names the bootstrap looks for inside the assets directory.
pub const SEARCH_WINDOW_HTML: &str = "search-window.html";
pub const SEARCH_WINDOW_SCRIPT: &str = "search-window.js";
pub const DEFAULT_STYLESHEET: &str = "default-style.css";

/// Settings for one in-page search session.
///
/// Every field is optional in the source files; omitted fields keep their
/// documented default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Initialize the session (wire channels, attach the overlay) at
    /// construction instead of on first open. Default: `false`.
    pub preload_search_window: bool,
    /// Stylesheet injected into the overlay instead of `default-style.css`.
    pub custom_css_path: Option<PathBuf>,
    /// Document loaded into the overlay instead of `search-window.html`.
    pub custom_search_window_html_path: Option<PathBuf>,
    /// Open the overlay's devtools once it is ready. Default: `false`.
    pub open_devtools_of_search_window: bool,
    /// Relay overlay console output into the log. Default: `false`.
    pub verbose: bool,
    /// Directory holding the overlay assets. See [`SearchSettings::assets_dir`].
    pub assets_dir: Option<PathBuf>,
    pub log: LogSettings,
}

impl SearchSettings {
    /// Resolved assets directory: explicit setting, then the platform data
    /// dir (`<data_dir>/inpage-search/assets`), then `./assets`.
    pub fn assets_dir(&self) -> PathBuf {
        if let Some(dir) = &self.assets_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("inpage-search").join("assets"))
            .unwrap_or_else(|| PathBuf::from("assets"))
    }

    pub fn search_window_html(&self) -> PathBuf {
        self.custom_search_window_html_path
            .clone()
            .unwrap_or_else(|| self.assets_dir().join(SEARCH_WINDOW_HTML))
    }

    pub fn stylesheet(&self) -> PathBuf {
        self.custom_css_path
            .clone()
            .unwrap_or_else(|| self.assets_dir().join(DEFAULT_STYLESHEET))
    }

    pub fn agent_script(&self) -> PathBuf {
        self.assets_dir().join(SEARCH_WINDOW_SCRIPT)
    }
}

/// Logging knobs consumed by binaries when they initialise tracing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormatSetting,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    #[default]
    Text,
    Json,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') || s.starts_with('~') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::full(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (files + env overrides).
pub struct SettingsLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    sources: Vec<Source>,
}

enum Source {
    File { path: PathBuf, required: bool },
    Yaml(String),
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Start with no files; `INPAGE__` env overrides are applied last.
    ///
    /// ```
    /// use inpage_config::SettingsLoader;
    ///
    /// let settings = SettingsLoader::new()
    ///     .with_yaml_str("preload_search_window: true")
    ///     .load()
    ///     .expect("valid settings");
    ///
    /// assert!(settings.preload_search_window);
    /// assert!(!settings.verbose);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            sources: Vec::new(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Attach a file that may be missing, for deployments driven purely by env.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Merge an inline YAML snippet (tests, embedding applications).
    ///
    /// ```
    /// use inpage_config::{LogFormatSetting, SettingsLoader};
    ///
    /// let settings = SettingsLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// custom_css_path: "/opt/theme/dark.css"
    /// log:
    ///   format: json
    ///   emit_stderr: true
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(settings.stylesheet().to_str(), Some("/opt/theme/dark.css"));
    /// assert_eq!(settings.log.format, LogFormatSetting::Json);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.sources.push(Source::Yaml(yaml.to_string()));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// `${VAR}` placeholders are expanded before the typed structs are built.
    ///
    /// ```
    /// use inpage_config::SettingsLoader;
    ///
    /// unsafe { std::env::set_var("INPAGE_DOC_ASSETS", "/srv/inpage"); }
    ///
    /// let settings = SettingsLoader::new()
    ///     .with_yaml_str("assets_dir: \"${INPAGE_DOC_ASSETS}/assets\"")
    ///     .load()
    ///     .expect("valid settings");
    ///
    /// assert_eq!(
    ///     settings.search_window_html().to_str(),
    ///     Some("/srv/inpage/assets/search-window.html")
    /// );
    ///
    /// unsafe { std::env::remove_var("INPAGE_DOC_ASSETS"); }
    /// ```
    pub fn load(self) -> Result<SearchSettings, ConfigError> {
        let mut builder = self.builder;
        for source in self.sources {
            builder = match source {
                Source::File { path, required } => {
                    builder.add_source(File::from(path.as_path()).required(required))
                }
                Source::Yaml(yaml) => {
                    builder.add_source(File::from_str(&yaml, config::FileFormat::Yaml))
                }
            };
        }
        let cfg = builder
            .add_source(
                Environment::with_prefix("INPAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
