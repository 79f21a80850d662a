use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::theme::ThemePreset;

const APP_DIR: &str = "ysm";
const SETTINGS_FILE: &str = "settings.toml";
const DEFAULT_THEME: &str = "default";
const DEFAULT_TITLE: &str = "My Youtube Subscriptions";
const DEFAULT_BACKUP_COPIES: usize = 7;
const MAX_BACKUP_COPIES: usize = 100;
const MIN_MAX_RESULTS: u32 = 1;
const MAX_MAX_RESULTS: u32 = 50;

/// Where ysm keeps its configuration and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> anyhow::Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("unable to determine config directory"))?
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("unable to determine data directory"))?
            .join(APP_DIR);
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Both directories rooted under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            config_dir: root.join("config").join(APP_DIR),
            data_dir: root.join("data").join(APP_DIR),
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.data_dir.join("templates")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.data_dir.join("html")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.data_dir
            .join("credentials")
            .join("ysm-youtube-creds.json")
    }

    pub fn default_template_file(&self) -> PathBuf {
        self.templates_dir().join("default.tmpl")
    }

    pub fn default_output_file(&self) -> PathBuf {
        self.html_dir().join("index.html")
    }

    pub fn default_db_file(&self) -> PathBuf {
        self.data_dir.join("ysm.db")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::discover().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(".").join(APP_DIR),
            data_dir: PathBuf::from(".").join(APP_DIR),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub refresh: bool,
    pub db_file: PathBuf,
    pub backup_copies: usize,
    pub theme: String,
    pub generator: GeneratorSettings,
    pub youtube: YoutubeSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub title: String,
    pub template_file: PathBuf,
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    pub client_id: String,
    pub client_secret: String,
    pub max_results: u32,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            max_results: MAX_MAX_RESULTS,
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::for_paths(&AppPaths::default())
    }
}

impl GeneratorSettings {
    fn for_paths(paths: &AppPaths) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            template_file: paths.default_template_file(),
            output_file: paths.default_output_file(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_paths(&AppPaths::default())
    }
}

impl Settings {
    /// Defaults with every path placed under `paths`.
    pub fn for_paths(paths: &AppPaths) -> Self {
        Self {
            refresh: true,
            db_file: paths.default_db_file(),
            backup_copies: DEFAULT_BACKUP_COPIES,
            theme: DEFAULT_THEME.to_string(),
            generator: GeneratorSettings::for_paths(paths),
            youtube: YoutubeSettings::default(),
        }
    }

    pub fn load(paths: &AppPaths) -> anyhow::Result<Self> {
        Self::load_from_path(&paths.settings_file())
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            bail!(
                "settings file '{}' not found; run `ysm --install` to create it",
                path.display()
            );
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let mut settings = toml::from_str::<Self>(&contents)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        settings.validate();
        Ok(settings)
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("invalid settings config path"))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory '{}'", parent.display()))?;

        let mut validated = self.clone();
        validated.validate();
        let contents =
            toml::to_string_pretty(&validated).context("failed to serialize settings to TOML")?;

        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow!("invalid settings config file name"))?
            .to_string_lossy()
            .to_string();
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

        fs::write(&tmp_path, contents).with_context(|| {
            format!(
                "failed to write temporary settings file '{}'",
                tmp_path.display()
            )
        })?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "failed to atomically rename settings file '{}' to '{}'",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    pub fn theme_preset(&self) -> ThemePreset {
        ThemePreset::from_str(&self.theme).unwrap_or_default()
    }

    fn validate(&mut self) {
        self.backup_copies = self.backup_copies.min(MAX_BACKUP_COPIES);
        self.youtube.max_results = self
            .youtube
            .max_results
            .clamp(MIN_MAX_RESULTS, MAX_MAX_RESULTS);

        if self.generator.title.trim().is_empty() {
            self.generator.title = DEFAULT_TITLE.to_string();
        }

        self.theme = match ThemePreset::from_str(&self.theme) {
            Ok(preset) => preset.as_str().to_string(),
            Err(()) => {
                warn!(
                    "invalid theme '{}' in settings config; falling back to default",
                    self.theme
                );
                DEFAULT_THEME.to_string()
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths() -> (TempDir, AppPaths) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let paths = AppPaths::under(temp_dir.path());
        (temp_dir, paths)
    }

    #[test]
    fn test_default_settings() {
        let (_temp_dir, paths) = temp_paths();
        let settings = Settings::for_paths(&paths);
        assert!(settings.refresh);
        assert_eq!(settings.backup_copies, 7);
        assert_eq!(settings.theme, "default");
        assert_eq!(settings.db_file, paths.data_dir.join("ysm.db"));
        assert_eq!(settings.generator.title, "My Youtube Subscriptions");
        assert!(settings.generator.template_file.ends_with("templates/default.tmpl"));
        assert!(settings.generator.output_file.ends_with("html/index.html"));
        assert_eq!(settings.youtube.max_results, 50);
    }

    #[test]
    fn test_load_missing_file_points_at_install() {
        let (_temp_dir, paths) = temp_paths();
        let err = Settings::load(&paths).expect_err("missing settings should fail");
        assert!(err.to_string().contains("ysm --install"));
    }

    #[test]
    fn test_load_malformed_toml() {
        let (_temp_dir, paths) = temp_paths();
        let path = paths.settings_file();
        fs::create_dir_all(&paths.config_dir).expect("failed to create config dir");
        fs::write(&path, "refresh = [invalid").expect("failed to write malformed settings");

        let err = Settings::load_from_path(&path).expect_err("malformed settings should fail");
        assert!(format!("{err:#}").contains("failed to parse settings file"));
    }

    #[test]
    fn test_load_partial_toml() {
        let (_temp_dir, paths) = temp_paths();
        let path = paths.settings_file();
        fs::create_dir_all(&paths.config_dir).expect("failed to create config dir");
        fs::write(
            &path,
            "refresh = false\n[generator]\ntitle = \"Mine\"\n[youtube]\nmax_results = 500\n",
        )
        .expect("failed to write partial settings");

        let settings = Settings::load_from_path(&path).expect("partial settings should load");
        assert!(!settings.refresh);
        assert_eq!(settings.generator.title, "Mine");
        assert_eq!(settings.youtube.max_results, MAX_MAX_RESULTS);
        assert_eq!(settings.backup_copies, DEFAULT_BACKUP_COPIES);
        assert_eq!(settings.theme, DEFAULT_THEME);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_temp_dir, paths) = temp_paths();
        let path = paths.settings_file();
        let mut expected = Settings::for_paths(&paths);
        expected.refresh = false;
        expected.backup_copies = 3;
        expected.theme = "mono".to_string();
        expected.youtube.client_id = "id.apps.googleusercontent.com".to_string();

        expected
            .save_to_path(&path)
            .expect("failed to save settings for roundtrip test");
        let loaded = Settings::load_from_path(&path).expect("saved settings should load");

        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_validate_clamps_values() {
        let (_temp_dir, paths) = temp_paths();
        let mut settings = Settings::for_paths(&paths);
        settings.backup_copies = 5_000;
        settings.youtube.max_results = 0;
        settings.generator.title = "  ".to_string();

        settings.validate();

        assert_eq!(settings.backup_copies, MAX_BACKUP_COPIES);
        assert_eq!(settings.youtube.max_results, MIN_MAX_RESULTS);
        assert_eq!(settings.generator.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_validate_invalid_theme() {
        let (_temp_dir, paths) = temp_paths();
        let mut settings = Settings {
            theme: "retro-wave".to_string(),
            ..Settings::for_paths(&paths)
        };

        settings.validate();

        assert_eq!(settings.theme, "default");
        assert_eq!(settings.theme_preset(), ThemePreset::Default);
    }

    #[test]
    fn test_atomic_write_creates_dirs() {
        let (_temp_dir, paths) = temp_paths();
        let path = paths.settings_file();

        Settings::for_paths(&paths)
            .save_to_path(&path)
            .expect("failed to save settings to nested path");

        assert!(path.exists());
        assert!(!paths.config_dir.join(".settings.toml.tmp").exists());
    }
}
