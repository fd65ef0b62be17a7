//! Config command - View and manage Frontdesk configuration
//!
//! Provides the `frontdesk config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Writes a default configuration file

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use frontdesk_core::config::Config;
use tracing::info;

use super::{CommandContext, Reported};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "conflicts.default_strategy")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx).await,
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value).await,
            ConfigCommand::Validate => self.execute_validate(ctx).await,
            ConfigCommand::Init { force } => self.execute_init(ctx, *force).await,
        }
    }

    async fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;

        info!(config_path = %config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&ctx.config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            if !config_path.exists() {
                formatter.info("(file not found, showing defaults)");
            }
            formatter.info("");

            let yaml = serde_yaml::to_string(&ctx.config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    async fn execute_set(&self, ctx: &CommandContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();

        info!(key = %key, value = %value, "Setting configuration value");

        let mut config = match load_for_update(&ctx.config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = format!("{:#}", e);
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "key": key,
                        "value": value,
                        "error": message,
                    }));
                } else {
                    formatter.error(&message);
                    formatter.info("Fix the file or run 'frontdesk config init --force'.");
                }
                return Err(Reported(message).into());
            }
        };

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                formatter.info(
                    "  conflicts.default_strategy  - keep-local|keep-remote|merge|manual",
                );
                formatter.info("  logging.level               - trace|debug|info|warn|error");
                formatter.info("  logging.format              - text|json");
            }
            return Err(Reported(format!("Failed to set '{}': {}", key, e)).into());
        }

        let errors: Vec<String> = config.validate().iter().map(|e| e.to_string()).collect();
        if !errors.is_empty() {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": errors,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    errors.join("; ")
                ));
            }
            return Err(Reported(format!("Invalid value for '{}'", key)).into());
        }

        save_config(&config, &ctx.config_path).await?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }

        Ok(())
    }

    async fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;

        // Load explicitly: a broken file must not be masked by defaults
        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let found = config_path.exists();
                let message = if found {
                    format!("Failed to parse configuration: {}", e)
                } else {
                    "Configuration file not found. Using defaults.".to_string()
                };

                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else if config_path.exists() {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                } else {
                    formatter.info(&format!(
                        "Configuration file not found at {}",
                        config_path.display()
                    ));
                    formatter.info("Run 'frontdesk config init' to create one.");
                }
                return if found {
                    Err(Reported(message).into())
                } else {
                    Ok(())
                };
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if !errors.is_empty() {
            let message = format!("Configuration has {} error(s)", errors.len());
            return Err(Reported(message).into());
        }
        Ok(())
    }

    async fn execute_init(&self, ctx: &CommandContext, force: bool) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;

        if config_path.exists() && !force {
            let message = format!(
                "Configuration already exists at {} (use --force to overwrite)",
                config_path.display()
            );
            formatter.error(&message);
            return Err(Reported(message).into());
        }

        save_config(&Config::default(), config_path).await?;
        info!(config_path = %config_path.display(), "Wrote default configuration");

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!(
                "Wrote default configuration to {}",
                config_path.display()
            ));
        }

        Ok(())
    }
}

/// Reads the file `set` edits; defaults are used only when it does not exist
fn load_for_update(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    Config::load(path)
        .with_context(|| format!("Failed to parse configuration at {}", path.display()))
}

async fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create configuration directory")?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    tokio::fs::write(path, yaml)
        .await
        .context("Failed to write configuration file")?;
    Ok(())
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// Preselection rules are a list and can only be edited in the file.
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "conflicts.default_strategy" => {
            config.conflicts.default_strategy = value.to_string();
        }
        "logging.level" => {
            config.logging.level = value.to_string();
        }
        "logging.format" => {
            config.logging.format = value.to_string();
        }
        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::config::ConfigBuilder;

    #[test]
    fn test_apply_conflicts_strategy() {
        let mut config = Config::default();
        apply_config_value(&mut config, "conflicts.default_strategy", "merge").unwrap();
        assert_eq!(config.conflicts.default_strategy, "merge");
    }

    #[test]
    fn test_apply_logging_level() {
        let mut config = Config::default();
        apply_config_value(&mut config, "logging.level", "debug").unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_apply_logging_format() {
        let mut config = Config::default();
        apply_config_value(&mut config, "logging.format", "json").unwrap();
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_apply_unknown_key_fails() {
        let mut config = Config::default();
        assert!(apply_config_value(&mut config, "conflicts.rules", "x").is_err());
        assert!(apply_config_value(&mut config, "sync.root", "/tmp").is_err());
    }

    #[tokio::test]
    async fn test_save_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = ConfigBuilder::new()
            .conflicts_default_strategy("keep-remote")
            .conflicts_rule("invoices", "manual")
            .build();

        save_config(&config, &path).await.unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.conflicts.default_strategy, "keep-remote");
        assert_eq!(loaded.conflicts.rules, config.conflicts.rules);
        assert!(loaded.validate().is_empty());
    }

    fn context_for(path: &Path) -> CommandContext {
        CommandContext {
            format: crate::output::OutputFormat::Json,
            quiet: true,
            config_path: path.to_path_buf(),
            config: Config::default(),
        }
    }

    fn set(key: &str, value: &str) -> ConfigCommand {
        ConfigCommand::Set {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_keeps_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let broken = r#"conflicts:
  default_strategy: merge
  rules:
    - pattern: reservations
      strategy: keep-remote
    - pattern: invoices
"#;
        tokio::fs::write(&path, broken).await.unwrap();

        let err = set("logging.level", "debug")
            .execute(&context_for(&path))
            .await
            .unwrap_err();

        assert!(err.is::<Reported>());
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), broken);
    }

    #[tokio::test]
    async fn test_set_updates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let config = ConfigBuilder::new()
            .conflicts_default_strategy("merge")
            .conflicts_rule("reservations", "keep-remote")
            .build();
        save_config(&config, &path).await.unwrap();

        set("logging.level", "debug")
            .execute(&context_for(&path))
            .await
            .unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.conflicts.default_strategy, "merge");
        assert_eq!(loaded.conflicts.rules, config.conflicts.rules);
    }

    #[tokio::test]
    async fn test_set_creates_missing_file_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frontdesk").join("config.yaml");

        set("conflicts.default_strategy", "keep-remote")
            .execute(&context_for(&path))
            .await
            .unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.conflicts.default_strategy, "keep-remote");
        assert_eq!(loaded.logging.level, "info");
    }

    #[tokio::test]
    async fn test_failures_are_reported_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let ctx = context_for(&path);

        for command in [set("sync.root", "/tmp"), set("logging.level", "loud")] {
            let err = command.execute(&ctx).await.unwrap_err();
            assert!(err.is::<Reported>());
        }
        assert!(!path.exists());

        ConfigCommand::Init { force: false }.execute(&ctx).await.unwrap();
        let err = ConfigCommand::Init { force: false }
            .execute(&ctx)
            .await
            .unwrap_err();
        assert!(err.is::<Reported>());
        ConfigCommand::Validate.execute(&ctx).await.unwrap();

        tokio::fs::write(&path, "logging:\n  format: xml\n").await.unwrap();
        let err = ConfigCommand::Validate.execute(&ctx).await.unwrap_err();
        assert!(err.is::<Reported>());
    }
}
