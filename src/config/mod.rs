use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::region::{Handle, HandleSet};
use crate::surface::NodeId;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("image should be a valid image element, a collection of image elements or a URL")]
    InvalidImageInput,
    #[error("target node is unavailable for image url {url}")]
    TargetUnavailable { url: String },
    #[error("input dots {rejected:?} do not match current schema; accepted values are {accepted}")]
    InvalidHandleSet {
        rejected: Vec<String>,
        accepted: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "croptag";
const APP_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_IMAGE_ALT: &str = "CropTag image";
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Resize dot configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DotsConfig {
    Disabled,
    #[default]
    Canonical,
    Subset(HandleSet),
}

impl From<bool> for DotsConfig {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Canonical
        } else {
            Self::Disabled
        }
    }
}

impl From<HandleSet> for DotsConfig {
    fn from(set: HandleSet) -> Self {
        Self::Subset(set)
    }
}

impl DotsConfig {
    pub fn handle_set(&self) -> Option<HandleSet> {
        match self {
            Self::Disabled => None,
            Self::Canonical => Some(HandleSet::canonical()),
            Self::Subset(set) => Some(*set),
        }
    }
}

/// Images the engine manages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageInput {
    #[default]
    Missing,
    Element(NodeId),
    Collection(Vec<NodeId>),
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagConfig {
    pub dots: DotsConfig,
    pub edges: bool,
    pub drag: bool,
    pub focused_tags: bool,
    pub image: ImageInput,
    pub image_alt: Option<String>,
    pub target: Option<NodeId>,
    pub load_timeout: Option<Duration>,
    /// Dot class suffixes taken from the string values of a keyed `dots` map.
    pub dot_labels: BTreeMap<Handle, String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            dots: DotsConfig::Canonical,
            edges: true,
            drag: true,
            focused_tags: false,
            image: ImageInput::Missing,
            image_alt: None,
            target: None,
            load_timeout: Some(DEFAULT_LOAD_TIMEOUT),
            dot_labels: BTreeMap::new(),
        }
    }
}

impl TagConfig {
    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = image;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>, target: NodeId) -> Self {
        self.image = ImageInput::Url(url.into());
        self.target = Some(target);
        self
    }

    pub fn with_dots(mut self, dots: impl Into<DotsConfig>) -> Self {
        self.dots = dots.into();
        self
    }

    pub fn with_dot_label(mut self, handle: Handle, label: impl Into<String>) -> Self {
        self.dot_labels.insert(handle, label.into());
        self
    }

    pub fn with_edges(mut self, edges: bool) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_drag(mut self, drag: bool) -> Self {
        self.drag = drag;
        self
    }

    pub fn with_focused_tags(mut self, focused_tags: bool) -> Self {
        self.focused_tags = focused_tags;
        self
    }

    pub fn with_load_timeout(mut self, load_timeout: Option<Duration>) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    pub fn image_alt(&self) -> &str {
        self.image_alt
            .as_deref()
            .filter(|alt| !alt.is_empty())
            .unwrap_or(DEFAULT_IMAGE_ALT)
    }

    /// Applies file settings on top of the defaults, validating the dots subset.
    pub fn from_settings(settings: &EngineSettings) -> ConfigResult<Self> {
        let (dots, dot_labels) = match &settings.dots {
            DotsSetting::Toggle(enabled) => (DotsConfig::from(*enabled), BTreeMap::new()),
            DotsSetting::Keys(keys) => {
                let set = HandleSet::from_keys(keys.keys())?;
                let labels = keys
                    .iter()
                    .filter_map(|(key, value)| {
                        let label = value.as_str().and_then(dot_label)?;
                        Some((Handle::from_key(key)?, label.to_string()))
                    })
                    .collect();
                (DotsConfig::Subset(set), labels)
            }
        };
        Ok(Self {
            dots,
            dot_labels,
            edges: settings.edges,
            drag: settings.drag,
            focused_tags: settings.focused_tags,
            image_alt: settings.image_alt.clone(),
            load_timeout: settings.load_timeout_ms.map(Duration::from_millis),
            ..Self::default()
        })
    }
}

/// `dots` as written in `config.json`: a switch or an object keyed by handle id.
///
/// Only the keys select handles. A string value that is a single class token
/// becomes that dot's class suffix; any other value is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DotsSetting {
    Toggle(bool),
    Keys(BTreeMap<String, serde_json::Value>),
}

fn dot_label(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && !value.contains(char::is_whitespace)).then_some(value)
}

impl Default for DotsSetting {
    fn default() -> Self {
        Self::Toggle(true)
    }
}

/// Engine settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub dots: DotsSetting,
    pub edges: bool,
    pub drag: bool,
    pub focused_tags: bool,
    pub image_alt: Option<String>,
    pub load_timeout_ms: Option<u64>,
    pub debug_logging: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dots: DotsSetting::default(),
            edges: true,
            drag: true,
            focused_tags: false,
            image_alt: None,
            load_timeout_ms: Some(DEFAULT_LOAD_TIMEOUT.as_millis() as u64),
            debug_logging: false,
        }
    }
}

pub fn load_settings() -> EngineSettings {
    let (xdg_config_home, home) = config_env_dirs();
    load_settings_with(xdg_config_home.as_deref(), home.as_deref())
}

pub(crate) fn load_settings_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EngineSettings {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return EngineSettings::default(),
    };
    if !path.exists() {
        return EngineSettings::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_settings(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            EngineSettings::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            EngineSettings::default()
        }
    }
}

pub fn parse_settings(contents: &str) -> serde_json::Result<EngineSettings> {
    serde_json::from_str(contents)
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "croptag",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/croptag/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("croptag", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/croptag/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("croptag", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn defaults_enable_dots_edges_and_drag() {
        let config = TagConfig::default();
        assert_eq!(config.dots, DotsConfig::Canonical);
        assert!(config.edges);
        assert!(config.drag);
        assert!(!config.focused_tags);
        assert_eq!(config.image_alt(), DEFAULT_IMAGE_ALT);
        assert_eq!(config.load_timeout, Some(DEFAULT_LOAD_TIMEOUT));
    }

    #[test]
    fn settings_accept_boolean_or_keyed_dots() {
        let settings = parse_settings(r#"{ "dots": false, "edges": false }"#).expect("valid json");
        let config = TagConfig::from_settings(&settings).expect("valid settings");
        assert_eq!(config.dots, DotsConfig::Disabled);
        assert!(!config.edges);
        assert!(config.drag);

        let settings = parse_settings(r#"{ "dots": { "TL": "top-left", "BR": "bottom-right" } }"#)
            .expect("valid json");
        let config = TagConfig::from_settings(&settings).expect("valid settings");
        assert_eq!(
            config.dots,
            DotsConfig::Subset(HandleSet::from_handles([Handle::TopLeft, Handle::BottomRight]))
        );
    }

    #[test]
    fn settings_with_unknown_dot_key_fail_validation() {
        let settings = parse_settings(r#"{ "dots": { "X": "center" } }"#).expect("valid json");
        let err = TagConfig::from_settings(&settings).expect_err("X is not a handle");
        assert!(matches!(err, ConfigError::InvalidHandleSet { .. }));
    }

    #[test]
    fn keyed_dots_accept_any_value_and_still_reject_unknown_keys() {
        let settings = parse_settings(r#"{ "dots": { "TL": true, "X": 1 }, "edges": false }"#)
            .expect("non-string dot values still parse");
        assert!(!settings.edges);
        let err = TagConfig::from_settings(&settings).expect_err("X is not a handle");
        match err {
            ConfigError::InvalidHandleSet { rejected, accepted } => {
                assert_eq!(rejected, vec!["X".to_string()]);
                assert_eq!(accepted, "TL, T, TR, R, BR, B, BL, L");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_dot_key_in_config_file_is_not_swallowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_dir = dir.path().join(APP_DIR);
        std::fs::create_dir_all(&config_dir).expect("create config dir");
        std::fs::write(
            config_dir.join(APP_CONFIG_FILE),
            r#"{ "dots": { "X": 1 }, "edges": false }"#,
        )
        .expect("write config");

        let settings = load_settings_with(Some(dir.path()), None);
        assert!(!settings.edges);
        assert!(matches!(
            TagConfig::from_settings(&settings),
            Err(ConfigError::InvalidHandleSet { .. })
        ));
    }

    #[test]
    fn string_dot_values_become_class_labels() {
        let settings = parse_settings(
            r#"{ "dots": { "TL": "nw", "T": true, "BR": "bottom right", "L": "" } }"#,
        )
        .expect("valid json");
        let config = TagConfig::from_settings(&settings).expect("valid settings");
        assert_eq!(
            config.dots,
            DotsConfig::Subset(HandleSet::from_handles([
                Handle::TopLeft,
                Handle::Top,
                Handle::BottomRight,
                Handle::Left,
            ]))
        );
        assert_eq!(
            config.dot_labels.into_iter().collect::<Vec<_>>(),
            vec![(Handle::TopLeft, "nw".to_string())]
        );
    }

    #[test]
    fn settings_timeout_maps_to_duration() {
        let settings = parse_settings(r#"{ "load_timeout_ms": 250 }"#).expect("valid json");
        let config = TagConfig::from_settings(&settings).expect("valid settings");
        assert_eq!(config.load_timeout, Some(Duration::from_millis(250)));

        let settings = parse_settings(r#"{ "load_timeout_ms": null }"#).expect("valid json");
        let config = TagConfig::from_settings(&settings).expect("valid settings");
        assert_eq!(config.load_timeout, None);
    }

    #[test]
    fn load_settings_falls_back_to_defaults_on_malformed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_dir = dir.path().join(APP_DIR);
        std::fs::create_dir_all(&config_dir).expect("create config dir");
        std::fs::write(config_dir.join(APP_CONFIG_FILE), "{ not json").expect("write config");

        let settings = load_settings_with(Some(dir.path()), None);
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn load_settings_reads_file_from_xdg_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_dir = dir.path().join(APP_DIR);
        std::fs::create_dir_all(&config_dir).expect("create config dir");
        std::fs::write(
            config_dir.join(APP_CONFIG_FILE),
            r#"{ "focused_tags": true, "image_alt": "product" }"#,
        )
        .expect("write config");

        let settings = load_settings_with(Some(dir.path()), None);
        assert!(settings.focused_tags);
        assert_eq!(settings.image_alt.as_deref(), Some("product"));
        assert_eq!(settings.dots, DotsSetting::Toggle(true));
    }
}
