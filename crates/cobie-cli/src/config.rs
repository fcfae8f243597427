//! Project configuration from `cobie.toml`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use cobie_core::ElementTree;
use cobie_graph::GraphConfig;

pub const CONFIG_FILE: &str = "cobie.toml";
const DEFAULT_STATE_PATH: &str = ".cobie/state.db";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSection,
    pub graph: GraphConfig,
    pub state: StateSection,
    pub tree: TreeSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// COBie intermediary database.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateSection {
    /// Change tracker database.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreeSection {
    /// Element tree replacing the built-in COBie mapping.
    pub path: Option<PathBuf>,
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid cobie.toml")
    }
}

impl Config {
    /// Load `cobie.toml` from the project directory, falling back to defaults
    /// when it does not exist. Environment overrides are applied either way.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        let mut config = if path.is_file() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            contents.parse()?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override graph settings from `NEO4J_URI`, `NEO4J_USER` and
    /// `NEO4J_PASSWORD`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.graph.password = password;
        }
    }

    /// Source database: the command-line value wins over the file.
    pub fn source_path(&self, project_dir: &Path, arg: Option<PathBuf>) -> Result<PathBuf> {
        arg.or_else(|| self.source.path.as_ref().map(|p| project_dir.join(p)))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No source database given. Pass --source or set [source] path in {}.",
                    CONFIG_FILE
                )
            })
    }

    pub fn state_path(&self, project_dir: &Path) -> PathBuf {
        let relative = self
            .state
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));
        project_dir.join(relative)
    }

    /// The configured element tree, or the COBie default.
    pub fn element_tree(&self, project_dir: &Path) -> Result<ElementTree> {
        let Some(path) = &self.tree.path else {
            return Ok(ElementTree::cobie());
        };
        let path = project_dir.join(path);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read element tree {}", path.display()))?;
        ElementTree::from_toml_str(&contents)
            .with_context(|| format!("Invalid element tree {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = r#"
            [source]
            path = "data/site.db"

            [graph]
            uri = "bolt://graph:7687"
            password = "secret"

            [state]
            path = "state/tracker.db"
        "#
        .parse()
        .unwrap();

        let dir = Path::new("/work");
        assert_eq!(config.source_path(dir, None).unwrap(), PathBuf::from("/work/data/site.db"));
        assert_eq!(config.state_path(dir), PathBuf::from("/work/state/tracker.db"));
        assert_eq!(config.graph.uri, "bolt://graph:7687");
        assert_eq!(config.graph.user, "neo4j");
        assert_eq!(config.graph.password, "secret");
    }

    #[test]
    fn test_defaults_and_cli_override() {
        let config = Config::default();
        let dir = Path::new("/work");
        assert!(config.source_path(dir, None).is_err());
        assert_eq!(
            config.source_path(dir, Some(PathBuf::from("other.db"))).unwrap(),
            PathBuf::from("other.db")
        );
        assert_eq!(config.state_path(dir), PathBuf::from("/work/.cobie/state.db"));
        assert_eq!(config.graph, GraphConfig::default());
        assert_eq!(config.element_tree(dir).unwrap(), ElementTree::cobie());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: Config = "[graph]\nuri = \"bolt://file:7687\"\n".parse().unwrap();
        config.apply_env(|key| match key {
            "NEO4J_URI" => Some("bolt://env:7687".to_string()),
            "NEO4J_USER" => Some("admin".to_string()),
            _ => None,
        });
        assert_eq!(config.graph.uri, "bolt://env:7687");
        assert_eq!(config.graph.user, "admin");
        assert_eq!(config.graph.password, "cobie_dev");
    }

    #[test]
    fn test_unknown_value_type_is_error() {
        assert!("[source]\npath = 3\n".parse::<Config>().is_err());
    }
}
