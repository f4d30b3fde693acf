use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::graph::reader::{ReaderOptions, DEFAULT_WORKERS, METADATA_SUFFIX};
use crate::license::classifier::KindOverrides;
use crate::license::condition::{ConditionSet, LicenseCondition};

/// Root configuration structure, deserialized from `.compliance-checkr/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// How license metadata is read.
    #[serde(default)]
    pub reader: ReaderConfig,
    /// How license kinds map to conditions.
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Deserialize)]
pub struct ReaderConfig {
    /// Files read concurrently. Defaults to 5.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Suffix appended to root files that lack it. Defaults to `.meta_lic`.
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_suffix() -> String {
    METADATA_SUFFIX.to_string()
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            workers: default_workers(),
            suffix: default_suffix(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PolicyConfig {
    /// Infer conditions from license kinds for records that declare none.
    #[serde(default = "default_infer")]
    pub infer_conditions: bool,
    /// Per-license-kind condition overrides, keyed by the kind tag
    /// (e.g. `"SPDX-license-identifier-MIT"`).
    #[serde(default)]
    pub kinds: HashMap<String, Vec<String>>,
}

fn default_infer() -> bool {
    true
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            infer_conditions: default_infer(),
            kinds: HashMap::new(),
        }
    }
}

impl Config {
    /// Validate the configuration and turn it into graph reader options.
    pub fn reader_options(&self) -> Result<ReaderOptions> {
        if self.reader.workers == 0 {
            bail!("reader.workers must be at least 1");
        }
        Ok(ReaderOptions {
            workers: self.reader.workers,
            suffix: self.reader.suffix.clone(),
            infer_conditions: self.policy.infer_conditions,
            kind_overrides: self.kind_overrides()?,
        })
    }

    /// Parse `[policy.kinds]`, rejecting condition names outside the
    /// recognized table.
    pub fn kind_overrides(&self) -> Result<KindOverrides> {
        let mut overrides = KindOverrides::new();
        for (kind, names) in &self.policy.kinds {
            let mut conditions = ConditionSet::empty();
            for name in names {
                match LicenseCondition::from_name(name) {
                    Some(lc) => conditions = conditions.plus(lc),
                    None => bail!("unknown condition `{}` for license kind `{}`", name, kind),
                }
            }
            overrides.insert(kind.clone(), conditions);
        }
        Ok(overrides)
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.compliance-checkr/config.toml`
/// 3. `~/.config/compliance-checkr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".compliance-checkr").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("compliance-checkr")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        let options = cfg.reader_options().unwrap();
        assert_eq!(options.workers, 5);
        assert_eq!(options.suffix, ".meta_lic");
        assert!(options.infer_conditions);
        assert!(options.kind_overrides.is_empty());
    }

    #[test]
    fn test_parse_partial_config() {
        let cfg: Config = toml::from_str(
            r#"
[reader]
workers = 2

[policy.kinds]
"SPDX-license-identifier-MIT" = ["notice"]
"legacy_vendor" = ["proprietary", "by_exception_only"]
"#,
        )
        .unwrap();

        let options = cfg.reader_options().unwrap();
        assert_eq!(options.workers, 2);
        assert_eq!(options.suffix, ".meta_lic");
        assert_eq!(
            options.kind_overrides["legacy_vendor"],
            ConditionSet::of(&[LicenseCondition::Proprietary, LicenseCondition::ByExceptionOnly])
        );
    }

    #[test]
    fn test_unknown_condition_rejected() {
        let cfg: Config = toml::from_str(
            r#"
[policy.kinds]
"SPDX-license-identifier-MIT" = ["notise"]
"#,
        )
        .unwrap();
        let err = cfg.reader_options().unwrap_err();
        assert!(err.to_string().contains("unknown condition `notise`"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cfg: Config = toml::from_str("[reader]\nworkers = 0\n").unwrap();
        assert!(cfg.reader_options().is_err());
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".compliance-checkr")).unwrap();
        let mut f =
            std::fs::File::create(dir.path().join(".compliance-checkr").join("config.toml")).unwrap();
        write!(f, "[policy]\ninfer_conditions = false\n").unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert!(!cfg.policy.infer_conditions);
    }

    #[test]
    fn test_load_override_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[reader\n").unwrap();

        let err = load_config(dir.path(), Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }
}
