use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::backup::backup_stamp;
use crate::settings::{AppPaths, Settings};

/// Template written by `--install`.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/default.tmpl");

/// Human-readable lines describing what `install` did, in order.
pub type InstallReport = Vec<String>;

/// Creates the config and data layout and writes a default settings file.
///
/// An existing settings file is copied aside before it is replaced.
pub fn install(paths: &AppPaths) -> Result<InstallReport> {
    let mut report = InstallReport::new();

    for dir in [
        paths.config_dir.clone(),
        paths.data_dir.clone(),
        paths.templates_dir(),
        paths.html_dir(),
    ] {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    }

    let template = paths.default_template_file();
    fs::write(&template, DEFAULT_TEMPLATE)
        .with_context(|| format!("failed to write template '{}'", template.display()))?;
    report.push(format!("Copied default template to: {}", template.display()));
    report.push(format!(
        "Created html output directory: {}",
        paths.html_dir().display()
    ));

    let settings_file = paths.settings_file();
    if settings_file.exists() {
        let backup = backup_path(&settings_file, &backup_stamp());
        fs::copy(&settings_file, &backup).with_context(|| {
            format!(
                "could not create backup of settings file '{}' to '{}'",
                settings_file.display(),
                backup.display()
            )
        })?;
        report.push(format!(
            "settings.toml already exists. Created backup copy at {}",
            backup.display()
        ));
    }

    Settings::for_paths(paths).save_to_path(&settings_file)?;
    report.push(format!(
        "Created a default settings file at: {}",
        settings_file.display()
    ));

    Ok(report)
}

/// Fails with an `--install` hint when any required file or directory is missing.
pub fn verify_installation(paths: &AppPaths) -> Result<()> {
    let missing: Vec<PathBuf> = [
        paths.settings_file(),
        paths.templates_dir(),
        paths.html_dir(),
    ]
    .into_iter()
    .filter(|path| !path.exists())
    .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let listed = missing
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    bail!(
        "could not find required files ({listed}); please run the program with the --install argument"
    )
}

fn backup_path(settings_file: &std::path::Path, stamp: &str) -> PathBuf {
    let name = settings_file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "settings.toml".to_string());
    settings_file.with_file_name(format!("{name}-backup-{stamp}"))
}
