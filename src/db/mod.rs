use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::types::{Channel, DEFAULT_BG_COLOUR, DEFAULT_FG_COLOUR, RemoteChannel, Tag};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Editable text columns of the `tags` table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TagField {
    Name,
    Description,
    FgColour,
    BgColour,
}

impl TagField {
    fn column(self) -> &'static str {
        match self {
            TagField::Name => "name",
            TagField::Description => "description",
            TagField::FgColour => "fgColour",
            TagField::BgColour => "bgColour",
        }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();

        if path_ref != Path::new(":memory:")
            && let Some(parent) = path_ref.parent()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create parent directories for {}",
                    path_ref.display()
                )
            })?;
        }

        let conn = Connection::open(path_ref)
            .with_context(|| format!("failed to open sqlite db at {}", path_ref.display()))?;

        conn.execute("PRAGMA foreign_keys = ON", params![])
            .context("failed to enable foreign keys")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("failed to set sqlite busy timeout")?;

        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn list_channels(&self) -> Result<Vec<Channel>> {
        let mut links = self.links_by_channel()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, name, IFNULL(description, ''), IFNULL(notes, '') \
             FROM channels ORDER BY name ASC",
        )?;
        let mut channels = stmt
            .query_map(params![], map_channel_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load channels")?;

        for channel in &mut channels {
            if let Some(mut tag_ids) = links.remove(&channel.id) {
                tag_ids.sort_unstable();
                channel.tag_ids = tag_ids;
            }
        }

        Ok(channels)
    }

    pub fn get_channel(&self, id: &str) -> Result<Option<Channel>> {
        let channel = self
            .conn
            .query_row(
                "SELECT id, name, IFNULL(description, ''), IFNULL(notes, '') \
                 FROM channels WHERE id = ?1",
                params![id],
                map_channel_row,
            )
            .optional()
            .with_context(|| format!("failed to load channel {id}"))?;

        let Some(mut channel) = channel else {
            return Ok(None);
        };
        channel.tag_ids = self.channel_tag_ids(id)?;
        Ok(Some(channel))
    }

    pub fn insert_channel(&self, remote: &RemoteChannel) -> Result<()> {
        debug!(id = %remote.id, name = %remote.name, "inserting channel");
        self.conn
            .execute(
                "INSERT INTO channels (id, name, description) VALUES (?1, ?2, ?3)",
                params![remote.id, remote.name, remote.description],
            )
            .with_context(|| format!("failed to insert channel {}", remote.id))?;
        Ok(())
    }

    pub fn update_channel_details(&self, remote: &RemoteChannel) -> Result<()> {
        debug!(id = %remote.id, name = %remote.name, "updating channel details");
        self.conn
            .execute(
                "UPDATE channels SET name = ?1, description = ?2 WHERE id = ?3",
                params![remote.name, remote.description, remote.id],
            )
            .with_context(|| format!("failed to update channel {}", remote.id))?;
        Ok(())
    }

    pub fn update_channel_notes(&self, id: &str, notes: &str) -> Result<()> {
        debug!(id, "updating channel notes");
        self.conn
            .execute(
                "UPDATE channels SET notes = ?1 WHERE id = ?2",
                params![notes, id],
            )
            .with_context(|| format!("failed to update notes of channel {id}"))?;
        Ok(())
    }

    pub fn delete_channel(&self, id: &str) -> Result<()> {
        debug!(id, "deleting channel");
        self.conn
            .execute("DELETE FROM channels WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete channel {id}"))?;
        Ok(())
    }

    pub fn channel_tag_ids(&self, channel_id: &str) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tagId FROM links WHERE channelId = ?1 ORDER BY tagId ASC")?;
        let ids = stmt
            .query_map(params![channel_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()
            .with_context(|| format!("failed to load tag links of channel {channel_id}"))?;
        Ok(ids)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut links = self.links_by_tag()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, IFNULL(name, ''), IFNULL(description, ''), fgColour, bgColour \
             FROM tags ORDER BY name ASC",
        )?;
        let mut tags = stmt
            .query_map(params![], map_tag_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load tags")?;

        for tag in &mut tags {
            if let Some(mut channel_ids) = links.remove(&tag.id) {
                channel_ids.sort();
                tag.channel_ids = channel_ids;
            }
        }

        Ok(tags)
    }

    pub fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT id, IFNULL(name, ''), IFNULL(description, ''), fgColour, bgColour \
                 FROM tags WHERE id = ?1",
                params![id],
                map_tag_row,
            )
            .optional()
            .with_context(|| format!("failed to load tag {id}"))?;

        let Some(mut tag) = tag else {
            return Ok(None);
        };
        tag.channel_ids = self.tag_channel_ids(id)?;
        Ok(Some(tag))
    }

    pub fn tag_channel_ids(&self, tag_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT channelId FROM links WHERE tagId = ?1 ORDER BY channelId ASC")?;
        let ids = stmt
            .query_map(params![tag_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .with_context(|| format!("failed to load channel links of tag {tag_id}"))?;
        Ok(ids)
    }

    /// Inserts a tag row holding only `name` and returns its generated id.
    pub fn insert_tag(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])
            .with_context(|| format!("failed to insert tag {name}"))?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name, "inserted tag");
        Ok(id)
    }

    pub fn update_tag_field(&self, id: i64, field: TagField, value: &str) -> Result<()> {
        debug!(id, column = field.column(), "updating tag");
        let sql = format!("UPDATE tags SET {} = ?1 WHERE id = ?2", field.column());
        self.conn
            .execute(&sql, params![value, id])
            .with_context(|| format!("failed to update {} of tag {id}", field.column()))?;
        Ok(())
    }

    pub fn delete_tag(&self, id: i64) -> Result<()> {
        debug!(id, "deleting tag");
        self.conn
            .execute("DELETE FROM tags WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete tag {id}"))?;
        Ok(())
    }

    /// Counts tags whose name equals `name` ignoring case, skipping the tag `excluding_id`.
    pub fn count_tags_named(&self, name: &str, excluding_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM tags WHERE lower(name) = lower(?1) AND id != ?2",
                params![name, excluding_id],
                |row| row.get(0),
            )
            .with_context(|| format!("failed to check tag name {name}"))
    }

    pub fn insert_link(&self, channel_id: &str, tag_id: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO links (channelId, tagId) VALUES (?1, ?2)",
                params![channel_id, tag_id],
            )
            .with_context(|| format!("failed to link channel {channel_id} to tag {tag_id}"))?;
        Ok(())
    }

    pub fn delete_link(&self, channel_id: &str, tag_id: i64) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM links WHERE channelId = ?1 AND tagId = ?2",
                params![channel_id, tag_id],
            )
            .with_context(|| format!("failed to unlink channel {channel_id} from tag {tag_id}"))?;
        Ok(())
    }

    pub fn link_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM links", params![], |row| row.get(0))
            .context("failed to count links")
    }

    fn links_by_channel(&self) -> Result<HashMap<String, Vec<i64>>> {
        let mut stmt = self.conn.prepare("SELECT channelId, tagId FROM links")?;
        let rows = stmt
            .query_map(params![], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load links")?;

        let mut grouped: HashMap<String, Vec<i64>> = HashMap::new();
        for (channel_id, tag_id) in rows {
            grouped.entry(channel_id).or_default().push(tag_id);
        }
        Ok(grouped)
    }

    fn links_by_tag(&self) -> Result<HashMap<i64, Vec<String>>> {
        let mut stmt = self.conn.prepare("SELECT channelId, tagId FROM links")?;
        let rows = stmt
            .query_map(params![], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load links")?;

        let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
        for (channel_id, tag_id) in rows {
            grouped.entry(tag_id).or_default().push(channel_id);
        }
        Ok(grouped)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS channels (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    description TEXT,
                    notes TEXT
                );

                CREATE TABLE IF NOT EXISTS tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT,
                    description TEXT,
                    bgColour TEXT,
                    fgColour TEXT
                );

                CREATE TABLE IF NOT EXISTS links (
                    channelId TEXT,
                    tagId INTEGER,
                    PRIMARY KEY (channelId, tagId),
                    FOREIGN KEY (channelId) REFERENCES channels(id) ON DELETE CASCADE,
                    FOREIGN KEY (tagId) REFERENCES tags(id) ON DELETE CASCADE
                );",
            )
            .context("failed to run sqlite migrations")?;
        Ok(())
    }
}

fn map_channel_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        notes: row.get(3)?,
        tag_ids: Vec::new(),
    })
}

fn map_tag_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    let fg_colour: Option<String> = row.get(3)?;
    let bg_colour: Option<String> = row.get(4)?;
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        fg_colour: fg_colour.unwrap_or_else(|| DEFAULT_FG_COLOUR.to_string()),
        bg_colour: bg_colour.unwrap_or_else(|| DEFAULT_BG_COLOUR.to_string()),
        channel_ids: Vec::new(),
    })
}
