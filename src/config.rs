use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub hover: bool,
    pub broken_link_diagnostics: bool,
    /// Watcher poll period; values below 2 are clamped up.
    pub poll_interval_seconds: u64,
}

impl Settings {
    /// Layered settings: the user config dir first, then a `.vaultmark`
    /// file at the workspace root. Both are optional.
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/vaultmark/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.vaultmark",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("hover", true)?
            .set_default("broken_link_diagnostics", true)?
            .set_default("poll_interval_seconds", 2_u64)?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let mut settings = settings.try_deserialize::<Settings>()?;
        settings.poll_interval_seconds = settings.poll_interval_seconds.max(2);

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            hover: true,
            broken_link_diagnostics: true,
            poll_interval_seconds: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_files() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::new(tmp.path()).unwrap();

        assert!(settings.hover);
        assert!(settings.broken_link_diagnostics);
        assert_eq!(settings.poll_interval_seconds, 2);
    }

    #[test]
    fn test_workspace_file_overrides() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(".vaultmark.toml"),
            "hover = false\npoll_interval_seconds = 1\n",
        )
        .unwrap();

        let settings = Settings::new(tmp.path()).unwrap();

        assert!(!settings.hover);
        // sub-floor values are clamped
        assert_eq!(settings.poll_interval_seconds, 2);
    }
}
