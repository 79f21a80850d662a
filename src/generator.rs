//! Builds the export snapshot and renders it through a template file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::Local;
use regex::Regex;
use serde::Serialize;
use tera::{Context as TeraContext, Tera};
use tracing::info;

use crate::model::{Channels, Tags};
use crate::types::Tag;

static HIDDEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(hide|hidden)?$").expect("valid hidden tag regex"));

/// Same layout as the classic Unix `date` output.
const GENERATED_AT_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ExportTag {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub fg_colour: String,
    pub bg_colour: String,
}

impl From<&Tag> for ExportTag {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
            description: tag.description.clone(),
            fg_colour: tag.fg_colour.clone(),
            bg_colour: tag.bg_colour.clone(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ExportChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub notes: String,
    pub tags: Vec<ExportTag>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Export {
    pub title: String,
    pub generated_at: String,
    pub channels: Vec<ExportChannel>,
    pub tags: Vec<ExportTag>,
}

/// Whether a tag with this name starts out deselected on the generate page.
pub fn is_hidden_name(name: &str) -> bool {
    HIDDEN_TAG.is_match(name)
}

/// Every tag whose name is not hide/hidden, in name order.
pub fn default_selection(tags: &Tags) -> Vec<i64> {
    tags.sorted()
        .into_iter()
        .filter(|tag| !is_hidden_name(&tag.name))
        .map(|tag| tag.id)
        .collect()
}

/// Channels carrying any unselected tag are left out; untagged channels are kept.
pub fn build_export(channels: &Channels, tags: &Tags, selected: &[i64], title: &str) -> Export {
    let selected: HashSet<i64> = selected.iter().copied().collect();

    let exported_channels = channels
        .sorted()
        .into_iter()
        .filter(|channel| channel.tag_ids.iter().all(|id| selected.contains(id)))
        .map(|channel| ExportChannel {
            id: channel.id.clone(),
            name: channel.name.clone(),
            description: channel.description.clone(),
            notes: channel.notes.clone(),
            tags: tags
                .sorted_subset(&channel.tag_ids)
                .into_iter()
                .map(ExportTag::from)
                .collect(),
        })
        .collect();

    let exported_tags = tags
        .sorted()
        .into_iter()
        .filter(|tag| selected.contains(&tag.id))
        .map(ExportTag::from)
        .collect();

    Export {
        title: title.to_string(),
        generated_at: Local::now().format(GENERATED_AT_FORMAT).to_string(),
        channels: exported_channels,
        tags: exported_tags,
    }
}

/// Renders `export` through the Tera template at `template_path` into `output_path`.
///
/// Values are HTML-escaped unless the template pipes them through `safe`.
pub fn generate(template_path: &Path, output_path: &Path, export: &Export) -> Result<()> {
    let source = fs::read_to_string(template_path)
        .with_context(|| format!("unable to open template '{}'", template_path.display()))?;
    let context = TeraContext::from_serialize(export).context("failed to serialize export data")?;
    let rendered = Tera::one_off(&source, &context, true)
        .with_context(|| format!("unable to render template '{}'", template_path.display()))?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create output directory '{}'", parent.display())
        })?;
    }
    fs::write(output_path, rendered)
        .with_context(|| format!("unable to write output file '{}'", output_path.display()))?;

    info!(
        output = %output_path.display(),
        channels = export.channels.len(),
        tags = export.tags.len(),
        "generated html output"
    );
    Ok(())
}
