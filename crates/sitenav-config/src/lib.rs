//! Configuration management for sitenav.
//!
//! Parses `sitenav.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site_root.title`
//! - `breadcrumbs.stop_at_type`

mod expand;

use serde::Deserialize;
use sitenav_source::{CanViewType, NodeId};
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "sitenav.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tree construction settings.
    pub tree: TreeConfig,
    /// Synthetic site root prepended to every build (optional section).
    pub site_root: Option<SiteRootConfig>,
    /// Breadcrumb defaults.
    pub breadcrumbs: BreadcrumbsConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Tree construction configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// URL segment of the home page. A link equal to it collapses to `""`.
    pub home_segment: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            home_segment: "home".to_owned(),
        }
    }
}

/// Site root node for multi-site deployments.
///
/// Pages of a site hang from this node, which is not stored with them.
#[derive(Debug, Deserialize)]
pub struct SiteRootConfig {
    /// Node identifier of the site.
    pub id: NodeId,
    /// Site title.
    pub title: String,
    /// URL segment of the site node.
    #[serde(default)]
    pub url_segment: String,
    /// View-permission classifier of the site node.
    #[serde(default)]
    pub can_view_type: CanViewType,
}

/// Breadcrumb configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BreadcrumbsConfig {
    /// Maximum number of collected pages, 0 for unbounded.
    pub max_depth: usize,
    /// Class name at which the upward walk stops.
    pub stop_at_type: Option<String>,
    /// Include pages hidden from menus.
    pub show_hidden: bool,
}

impl Default for BreadcrumbsConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            stop_at_type: None,
            show_hidden: false,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site_root.title`").
        field: String,
        /// Error message (e.g., "${`SITE_TITLE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL segment to be a single path component.
fn require_segment(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.contains('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must be a single path segment"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `sitenav.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the loaded values are invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd));
        match discovered {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.tree.home_segment, "tree.home_segment")?;
        require_segment(&self.tree.home_segment, "tree.home_segment")?;

        if let Some(site_root) = &self.site_root {
            if site_root.id == 0 {
                return Err(ConfigError::Validation(
                    "site_root.id cannot be 0 (reserved for the virtual root)".to_owned(),
                ));
            }
            require_non_empty(&site_root.title, "site_root.title")?;
            require_segment(&site_root.url_segment, "site_root.url_segment")?;
        }

        if let Some(stop_at_type) = &self.breadcrumbs.stop_at_type {
            require_non_empty(stop_at_type, "breadcrumbs.stop_at_type")?;
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut site_root) = self.site_root {
            site_root.title = expand::expand_env(&site_root.title, "site_root.title")?;
        }

        if let Some(ref stop_at_type) = self.breadcrumbs.stop_at_type {
            self.breadcrumbs.stop_at_type = Some(expand::expand_env(
                stop_at_type,
                "breadcrumbs.stop_at_type",
            )?);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.tree.home_segment, "home");
        assert!(config.site_root.is_none());
        assert_eq!(config.breadcrumbs.max_depth, 20);
        assert!(config.breadcrumbs.stop_at_type.is_none());
        assert!(!config.breadcrumbs.show_hidden);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.tree.home_segment, "home");
        assert_eq!(config.breadcrumbs.max_depth, 20);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[tree]
home_segment = "start"

[site_root]
id = 100
title = "Main Site"
can_view_type = "LoggedInUsers"

[breadcrumbs]
max_depth = 0
stop_at_type = "SectionHolder"
show_hidden = true
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.tree.home_segment, "start");
        let site_root = config.site_root.as_ref().unwrap();
        assert_eq!(site_root.id, 100);
        assert_eq!(site_root.title, "Main Site");
        assert_eq!(site_root.url_segment, "");
        assert_eq!(site_root.can_view_type, CanViewType::LoggedInUsers);
        assert_eq!(config.breadcrumbs.max_depth, 0);
        assert_eq!(
            config.breadcrumbs.stop_at_type,
            Some("SectionHolder".to_owned())
        );
        assert!(config.breadcrumbs.show_hidden);
    }

    #[test]
    fn test_site_root_requires_id_and_title() {
        let toml = r#"
[site_root]
title = "Main Site"
"#;
        let result: Result<Config, _> = toml::from_str(toml);

        assert!(result.is_err());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/sitenav.toml"))).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[tree]\nhome_segment = \"index\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.tree.home_segment, "index");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[tree\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_validates_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[tree]\nhome_segment = \"\"\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("tree.home_segment"));
    }

    #[test]
    fn test_discover_from_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Config::discover_from(&nested).unwrap();

        assert_eq!(found, dir.path().join(CONFIG_FILENAME));
    }

    #[test]
    fn test_expand_env_vars_site_root_title() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("SITENAV_TEST_SITE_TITLE", "Campus");
        }

        let toml = r#"
[site_root]
id = 5
title = "${SITENAV_TEST_SITE_TITLE}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.site_root.unwrap().title, "Campus");

        unsafe {
            std::env::remove_var("SITENAV_TEST_SITE_TITLE");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MISSING_VAR_SITENAV_TEST");
        }

        let toml = r#"
[breadcrumbs]
stop_at_type = "${MISSING_VAR_SITENAV_TEST}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("breadcrumbs.stop_at_type"));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    fn site_root(id: NodeId, title: &str) -> SiteRootConfig {
        SiteRootConfig {
            id,
            title: title.to_owned(),
            url_segment: String::new(),
            can_view_type: CanViewType::Anyone,
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_home_segment_with_slash() {
        let mut config = Config::default();
        config.tree.home_segment = "home/page".to_owned();
        assert_validation_error(&config, &["tree.home_segment", "single path segment"]);
    }

    #[test]
    fn test_validate_site_root_zero_id() {
        let config = Config {
            site_root: Some(site_root(0, "Main")),
            ..Config::default()
        };
        assert_validation_error(&config, &["site_root.id"]);
    }

    #[test]
    fn test_validate_site_root_empty_title() {
        let config = Config {
            site_root: Some(site_root(3, "")),
            ..Config::default()
        };
        assert_validation_error(&config, &["site_root.title", "empty"]);
    }

    #[test]
    fn test_validate_empty_stop_at_type() {
        let mut config = Config::default();
        config.breadcrumbs.stop_at_type = Some(String::new());
        assert_validation_error(&config, &["breadcrumbs.stop_at_type"]);
    }

    #[test]
    fn test_validate_site_root_passes() {
        let config = Config {
            site_root: Some(site_root(3, "Main")),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
