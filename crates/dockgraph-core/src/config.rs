//! Layered configuration.
//!
//! Two TOML files are consulted, lowest precedence first:
//!
//! 1. `<config_dir>/dockgraph/config.toml` (per-user defaults)
//! 2. `dockgraph.toml` in the working directory, or the file passed with
//!    `--config`
//!
//! Tables are merged key by key before deserialising, so a project file that
//! only sets `analysis.parallel` keeps the user's `analysis.top_n`. Each file
//! is type-checked on its own first, so a bad value is reported against the
//! file that holds it. Every field has a default, so an absent file is the
//! same as an empty one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LoadError;

/// File name looked up in the project directory.
pub const PROJECT_CONFIG_FILE: &str = "dockgraph.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockgraphConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Default number of rows for ranking commands.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Use the rayon betweenness implementation.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Preferred output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub format: Option<String>,
}

/// Load the effective configuration.
///
/// `explicit` is the `--config` path; when given it must exist. Otherwise
/// `project_root/dockgraph.toml` is used if present.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the explicit file is missing or any file
/// cannot be read, and [`LoadError::Config`] if it is not valid TOML for
/// [`DockgraphConfig`].
pub fn load_config(
    project_root: &Path,
    explicit: Option<&Path>,
) -> Result<DockgraphConfig, LoadError> {
    load_layers(user_config_path().as_deref(), project_root, explicit)
}

fn load_layers(
    user_path: Option<&Path>,
    project_root: &Path,
    explicit: Option<&Path>,
) -> Result<DockgraphConfig, LoadError> {
    let user = user_path.map(read_table).transpose()?.flatten();

    let project_path = match explicit {
        Some(path) if !path.exists() => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "config file does not exist",
                ),
            });
        }
        Some(path) => path.to_path_buf(),
        None => project_root.join(PROJECT_CONFIG_FILE),
    };
    let project = read_table(&project_path)?;

    let mut merged = user.unwrap_or_default();
    if let Some(project) = project {
        merge_tables(&mut merged, project);
    }

    toml::Value::Table(merged)
        .try_into()
        .map_err(|source| LoadError::Config {
            path: project_path,
            source,
        })
}

/// Normalise an output mode label, accepting the legacy `human`/`table`
/// spellings.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dockgraph/config.toml"))
}

fn read_table(path: &Path) -> Result<Option<toml::Table>, LoadError> {
    if !path.exists() {
        return Ok(None);
    }
    debug!(path = %path.display(), "reading config");

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = toml::from_str::<toml::Table>(&content).map_err(|source| LoadError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    let checked: Result<DockgraphConfig, _> = toml::Value::Table(table.clone()).try_into();
    checked.map_err(|source| LoadError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(table))
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_table) => {
                if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                    merge_tables(base_table, overlay_table);
                } else {
                    base.insert(key, toml::Value::Table(overlay_table));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

const fn default_top_n() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = TempDir::new().expect("temp dir");
        let table = read_table(&root.path().join(PROJECT_CONFIG_FILE)).expect("read");
        assert!(table.is_none());

        let cfg = DockgraphConfig::default();
        assert_eq!(cfg.analysis.top_n, 20);
        assert!(!cfg.analysis.parallel);
        assert_eq!(cfg.output.format, None);
    }

    #[test]
    fn explicit_config_is_parsed() {
        let root = TempDir::new().expect("temp dir");
        let path = root.path().join("custom.toml");
        std::fs::write(&path, "[analysis]\ntop_n = 5\nparallel = true\n").expect("write");

        let cfg = load_config(root.path(), Some(&path)).expect("load");
        assert_eq!(cfg.analysis.top_n, 5);
        assert!(cfg.analysis.parallel);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let root = TempDir::new().expect("temp dir");
        let err = load_config(root.path(), Some(&root.path().join("nope.toml")))
            .expect_err("must fail");
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.error_code().code(), "E1001");
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let root = TempDir::new().expect("temp dir");
        std::fs::write(root.path().join(PROJECT_CONFIG_FILE), "[analysis\n").expect("write");
        let err = read_table(&root.path().join(PROJECT_CONFIG_FILE)).expect_err("must fail");
        assert!(matches!(err, LoadError::Config { .. }));
    }

    #[test]
    fn overlay_keeps_unset_keys_from_base() {
        let mut base: toml::Table =
            toml::from_str("[analysis]\ntop_n = 7\n[output]\nformat = \"json\"\n").expect("base");
        let overlay: toml::Table =
            toml::from_str("[analysis]\nparallel = true\n").expect("overlay");
        merge_tables(&mut base, overlay);

        let cfg: DockgraphConfig = toml::Value::Table(base).try_into().expect("deserialize");
        assert_eq!(cfg.analysis.top_n, 7);
        assert!(cfg.analysis.parallel);
        assert_eq!(cfg.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn user_layer_sits_under_project_layer() {
        let root = TempDir::new().expect("temp dir");
        let user = root.path().join("user.toml");
        std::fs::write(&user, "[analysis]\ntop_n = 7\n[output]\nformat = \"json\"\n")
            .expect("write user");
        std::fs::write(root.path().join(PROJECT_CONFIG_FILE), "[output]\nformat = \"text\"\n")
            .expect("write project");

        let cfg = load_layers(Some(&user), root.path(), None).expect("load");
        assert_eq!(cfg.analysis.top_n, 7);
        assert_eq!(cfg.output.format.as_deref(), Some("text"));
    }

    #[test]
    fn bad_value_in_user_config_names_user_file() {
        let root = TempDir::new().expect("temp dir");
        let user = root.path().join("user.toml");
        std::fs::write(&user, "[analysis]\ntop_n = \"many\"\n").expect("write user");
        std::fs::write(root.path().join(PROJECT_CONFIG_FILE), "[analysis]\nparallel = true\n")
            .expect("write project");

        let err = load_layers(Some(&user), root.path(), None).expect_err("must fail");
        let LoadError::Config { ref path, .. } = err else {
            panic!("expected config error, got {err:?}");
        };
        assert_eq!(path, &user);
        assert_eq!(err.error_code().code(), "E1002");
    }

    #[test]
    fn bad_value_in_project_config_names_project_file() {
        let root = TempDir::new().expect("temp dir");
        let project = root.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&project, "[analysis]\nparallel = \"yes\"\n").expect("write project");

        let err = load_layers(None, root.path(), None).expect_err("must fail");
        assert!(matches!(err, LoadError::Config { ref path, .. } if path == &project));
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        assert_eq!(normalize_output_mode("Human"), Some("pretty"));
        assert_eq!(normalize_output_mode("table"), Some("text"));
        assert_eq!(normalize_output_mode(" json "), Some("json"));
        assert_eq!(normalize_output_mode("yaml"), None);
    }
}
