//! Settings with layered sources
//!
//! Precedence, highest first: CLI flags, environment, config file, defaults.
//! Relative paths in the config file are taken relative to the root
//! directory; paths from flags and the environment are used as given.

use crate::{PacketError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file looked up under the root directory
pub const CONFIG_FILE_NAME: &str = "permit-filler.json";

pub const ENV_ROOT: &str = "PERMIT_FILLER_ROOT";
pub const ENV_DATA_DIR: &str = "PERMIT_FILLER_DATA_DIR";
pub const ENV_OUTPUT_DIR: &str = "PERMIT_FILLER_OUTPUT_DIR";
pub const ENV_COMPRESS: &str = "PERMIT_FILLER_COMPRESS";

/// Resolved runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Base for catalog `template_dir` values
    pub root_dir: PathBuf,
    /// Record stores and overrides
    pub data_dir: PathBuf,
    /// Generated packets and archives
    pub output_dir: PathBuf,
    /// Flate-compress written content streams
    pub compress_streams: bool,
}

impl Settings {
    /// Default settings for a root directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root_dir = root.into();
        Self {
            data_dir: root_dir.join("data"),
            output_dir: root_dir.join("output").join("generated"),
            root_dir,
            compress_streams: true,
        }
    }

    /// Load settings using the process environment
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(cli, &env)
    }

    /// Load settings from explicit CLI overrides and environment
    pub fn load_from(cli: &CliOverrides, env: &HashMap<String, String>) -> Result<Self> {
        let root = cli
            .root_dir
            .clone()
            .or_else(|| env.get(ENV_ROOT).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let mut settings = Self::with_root(root.clone());

        let config_file = match &cli.config_path {
            Some(path) if !path.is_file() => {
                return Err(PacketError::NotFound(format!(
                    "config file {}",
                    path.display()
                )))
            }
            Some(path) => Some(path.clone()),
            None => Some(root.join(CONFIG_FILE_NAME)).filter(|path| path.is_file()),
        };
        if let Some(path) = config_file {
            let contents = std::fs::read_to_string(&path).map_err(PacketError::io(&path))?;
            let patch: SettingsPatch = serde_json::from_str(&contents).map_err(|e| {
                PacketError::InvalidInput(format!("config file {}: {e}", path.display()))
            })?;
            settings.apply_patch(patch);
            tracing::debug!(path = %path.display(), "loaded config file");
        }

        settings.apply_env(env)?;
        settings.apply_cli(cli);
        Ok(settings)
    }

    /// Root of company overrides
    pub fn overrides_dir(&self) -> PathBuf {
        self.data_dir.join("overrides")
    }

    /// Where archives are written
    pub fn zips_dir(&self) -> PathBuf {
        self.output_dir.join("_zips")
    }

    /// Template directory for a catalog `template_dir` value
    pub fn template_dir(&self, template_dir: &str) -> PathBuf {
        let path = Path::new(template_dir);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    fn apply_patch(&mut self, patch: SettingsPatch) {
        if let Some(data_dir) = patch.data_dir {
            self.data_dir = self.root_dir.join(data_dir);
        }
        if let Some(output_dir) = patch.output_dir {
            self.output_dir = self.root_dir.join(output_dir);
        }
        if let Some(compress) = patch.compress_streams {
            self.compress_streams = compress;
        }
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<()> {
        if let Some(value) = env.get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = env.get(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(value);
        }
        if let Some(value) = env.get(ENV_COMPRESS) {
            self.compress_streams = parse_bool(value, ENV_COMPRESS)?;
        }
        Ok(())
    }

    fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir.clone_from(data_dir);
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir.clone_from(output_dir);
        }
        if let Some(compress) = cli.compress_streams {
            self.compress_streams = compress;
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub root_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub compress_streams: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsPatch {
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    compress_streams: Option<bool>,
}

fn parse_bool(value: &str, key: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PacketError::InvalidInput(format!(
            "{key}={value:?}: expected boolean (true/false/1/0/yes/no/on/off)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_follow_root() {
        let settings = Settings::with_root("/srv/permits");
        assert_eq!(settings.data_dir, PathBuf::from("/srv/permits/data"));
        assert_eq!(
            settings.output_dir,
            PathBuf::from("/srv/permits/output/generated")
        );
        assert!(settings.compress_streams);
        assert_eq!(
            settings.overrides_dir(),
            PathBuf::from("/srv/permits/data/overrides")
        );
        assert_eq!(
            settings.zips_dir(),
            PathBuf::from("/srv/permits/output/generated/_zips")
        );
    }

    #[test]
    fn test_template_dir_relative_to_root() {
        let settings = Settings::with_root("/srv/permits");
        assert_eq!(
            settings.template_dir("templates/austin/bp"),
            PathBuf::from("/srv/permits/templates/austin/bp")
        );
        assert_eq!(
            settings.template_dir("/opt/forms/bp"),
            PathBuf::from("/opt/forms/bp")
        );
    }

    #[test]
    fn test_precedence_is_cli_then_env_then_file_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "data_dir": "records", "output_dir": "packets", "compress_streams": false }"#,
        )
        .unwrap();

        let env = HashMap::from([
            (ENV_ROOT.to_string(), dir.path().display().to_string()),
            (ENV_OUTPUT_DIR.to_string(), "/env/out".to_string()),
            (ENV_COMPRESS.to_string(), "yes".to_string()),
        ]);
        let cli = CliOverrides {
            compress_streams: Some(false),
            ..CliOverrides::default()
        };

        let settings = Settings::load_from(&cli, &env).unwrap();
        assert_eq!(settings.root_dir, dir.path());
        assert_eq!(settings.data_dir, dir.path().join("records"));
        assert_eq!(settings.output_dir, PathBuf::from("/env/out"));
        assert!(!settings.compress_streams);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let cli = CliOverrides {
            config_path: Some(PathBuf::from("/definitely/missing/permit-filler.json")),
            ..CliOverrides::default()
        };
        assert!(matches!(
            Settings::load_from(&cli, &HashMap::new()),
            Err(PacketError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_config_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{ "dta_dir": "typo" }"#).unwrap();

        let cli = CliOverrides {
            root_dir: Some(dir.path().to_path_buf()),
            config_path: Some(path),
            ..CliOverrides::default()
        };
        assert!(matches!(
            Settings::load_from(&cli, &HashMap::new()),
            Err(PacketError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_env_boolean_is_rejected() {
        let env = HashMap::from([(ENV_COMPRESS.to_string(), "maybe".to_string())]);
        let cli = CliOverrides {
            root_dir: Some(PathBuf::from("/nonexistent-root")),
            ..CliOverrides::default()
        };
        assert!(matches!(
            Settings::load_from(&cli, &env),
            Err(PacketError::InvalidInput(_))
        ));
    }
}
