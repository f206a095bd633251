use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PostureError, Result};
use crate::rules::CustomRuleOverride;

/// Top-level configuration from `.tenant-posture.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Per-rule weight and maturity customisations, applied in order.
    #[serde(default)]
    pub custom_rules: Vec<CustomRuleOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Wall-clock budget for one evaluation run, in milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl ExecutorConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(custom) = self.custom_rules.iter().find(|c| c.risk_id.trim().is_empty()) {
            return Err(PostureError::Config(format!(
                "custom rule with empty risk_id (maturity_level = {})",
                custom.maturity_level
            )));
        }
        Ok(())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# tenant-posture configuration

[logging]
# Log filter used when RUST_LOG is not set (error, warn, info, debug, trace).
level = "warn"

[executor]
# Stop starting new rules after this many milliseconds.
# deadline_ms = 5000

# Per-rule customisations. `computations` replaces the rule's scoring
# entirely; a nonzero `maturity_level` replaces its maturity level.
#
# [[custom_rules]]
# risk_id = "ADConnectVersion"
# maturity_level = 2
# computations = [{ type = "trigger_on_presence", points = 20 }]
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleComputation;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert!(config.custom_rules.is_empty());
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.executor.deadline(), None);
    }

    #[test]
    fn starter_config_parses() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert!(config.custom_rules.is_empty());
    }

    #[test]
    fn loads_custom_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tenant-posture.toml");
        std::fs::write(
            &path,
            r#"
[executor]
deadline_ms = 250

[[custom_rules]]
risk_id = "ADConnectVersion"
maturity_level = 2
computations = [{ type = "trigger_on_presence", points = 20 }]

[[custom_rules]]
risk_id = "UserRegisterApplications"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.executor.deadline(), Some(Duration::from_millis(250)));
        assert_eq!(
            config.custom_rules,
            vec![
                CustomRuleOverride {
                    risk_id: "ADConnectVersion".into(),
                    computations: Some(vec![RuleComputation::TriggerOnPresence { points: 20 }]),
                    maturity_level: 2,
                },
                CustomRuleOverride {
                    risk_id: "UserRegisterApplications".into(),
                    computations: None,
                    maturity_level: 0,
                },
            ]
        );
    }

    #[test]
    fn empty_risk_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[[custom_rules]]\nrisk_id = \"\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(PostureError::Config(_))));
    }
}
