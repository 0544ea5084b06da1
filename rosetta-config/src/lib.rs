//! Loader for Rosetta Robot configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: serde defaults, the YAML file, then
//! `ROSETTA__`-prefixed environment variables (`ROSETTA__HTTP__RETRIES=5`).
//! String values may reference `${VAR}` placeholders which are expanded after
//! the sources are merged. Environment values arrive as text; numeric fields
//! parse them, and text fields accept bare YAML numbers (`password: 123456`).
use config::{Config, ConfigError, Environment, File};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Default origin of the wiki that hosts the tasks.
pub const DEFAULT_SITE_ORIGIN: &str = "http://rosettacode.org";
/// Default heading anchor of the language section we edit.
pub const DEFAULT_LANGUAGE: &str = "Rust";

#[derive(Debug, Default, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub rustdoc: RustdocConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Both the section anchor id on task pages and the header in rendered markup.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_api_path")]
    pub api_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            language: default_language(),
            api_path: default_api_path(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default, deserialize_with = "optional_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub password: Option<String>,
}

impl Credentials {
    /// Username and password, if both are set and fully expanded.
    ///
    /// ```
    /// use rosetta_config::Credentials;
    ///
    /// let creds = Credentials {
    ///     username: Some("robot".into()),
    ///     password: Some("${UNSET_PASSWORD}".into()),
    /// };
    /// assert!(creds.resolved().is_none());
    /// ```
    pub fn resolved(&self) -> Option<(&str, &str)> {
        fn usable(s: &Option<String>) -> Option<&str> {
            s.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty() && !v.contains("${"))
        }
        Some((usable(&self.username)?, usable(&self.password)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct RustdocConfig {
    #[serde(default = "default_rustdoc_program")]
    pub program: String,
    /// Extra arguments placed before `--output-format json`.
    #[serde(default = "default_rustdoc_args")]
    pub args: Vec<String>,
}

impl Default for RustdocConfig {
    fn default() -> Self {
        Self {
            program: default_rustdoc_program(),
            args: default_rustdoc_args(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs", deserialize_with = "number")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries", deserialize_with = "number")]
    pub retries: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub dir: Option<String>,
    /// `text` or `json`.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::UInt(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn optional_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_text))
}

fn number<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<N> {
        Number(N),
        Text(String),
    }

    match NumberOrText::<T>::deserialize(d)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid number {s:?}: {e}"))),
    }
}

fn default_origin() -> String {
    DEFAULT_SITE_ORIGIN.into()
}
fn default_language() -> String {
    DEFAULT_LANGUAGE.into()
}
fn default_api_path() -> String {
    "mw/api.php".into()
}
fn default_rustdoc_program() -> String {
    "rustdoc".into()
}
fn default_rustdoc_args() -> Vec<String> {
    vec!["-Z".into(), "unstable-options".into()]
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_retries() -> usize {
    2
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
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

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct RobotConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for RobotConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotConfigLoader {
    /// Start with no files; `ROSETTA__` env overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use rosetta_config::RobotConfigLoader;
    ///
    /// let config = RobotConfigLoader::new().load().expect("defaults are valid");
    ///
    /// assert_eq!(config.site.origin, "http://rosettacode.org");
    /// assert_eq!(config.site.language, "Rust");
    /// assert_eq!(config.http.retries, 2);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use rosetta_config::RobotConfigLoader;
    ///
    /// let cfg = RobotConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// site:
    ///   origin: "https://rosettacode.org"
    /// rustdoc:
    ///   program: "/opt/rust/bin/rustdoc"
    ///   args: []
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.site.origin, "https://rosettacode.org");
    /// assert_eq!(cfg.site.api_path, "mw/api.php");
    /// assert!(cfg.rustdoc.args.is_empty());
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into [`RobotConfig`].
    ///
    /// ```
    /// use rosetta_config::RobotConfigLoader;
    ///
    /// unsafe { std::env::set_var("RR_DOCTEST_PASSWORD", "hunter2"); }
    ///
    /// let config = RobotConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// credentials:
    ///   username: "robot"
    ///   password: "${RR_DOCTEST_PASSWORD}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.credentials.resolved(), Some(("robot", "hunter2")));
    ///
    /// unsafe { std::env::remove_var("RR_DOCTEST_PASSWORD"); }
    /// ```
    pub fn load(self) -> Result<RobotConfig, ConfigError> {
        // Added last so the environment wins over every file.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("ROSETTA").separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: RobotConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
