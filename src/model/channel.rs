use tracing::debug;

use crate::db::Database;
use crate::diff::SetChanges;
use crate::types::Channel;

use super::{Listable, ModelError};

impl Channel {
    /// Writes `notes` through to the store, then updates the in-memory copy.
    pub fn set_notes(&mut self, db: &Database, notes: &str) -> Result<(), ModelError> {
        db.update_channel_notes(&self.id, notes)?;
        self.notes = notes.to_string();
        Ok(())
    }

    /// Rewrites the channel's tag links to exactly `tag_ids`.
    ///
    /// Only the difference against the current links is written. A failure part way
    /// through leaves the earlier statements applied.
    pub fn set_tags(
        &mut self,
        db: &Database,
        tag_ids: &[i64],
    ) -> Result<SetChanges<i64>, ModelError> {
        let changes = SetChanges::between(&self.tag_ids, tag_ids);

        for tag_id in &changes.added {
            db.insert_link(&self.id, *tag_id)?;
        }
        for tag_id in &changes.removed {
            db.delete_link(&self.id, *tag_id)?;
        }

        debug!(
            channel = %self.id,
            added = changes.added.len(),
            removed = changes.removed.len(),
            "updated channel tags"
        );

        let mut updated = tag_ids.to_vec();
        updated.sort_unstable();
        updated.dedup();
        self.tag_ids = updated;
        Ok(changes)
    }

    pub fn first_description_line(&self) -> &str {
        self.description.lines().next().unwrap_or("")
    }

    pub fn is_untagged(&self) -> bool {
        self.tag_ids.is_empty()
    }
}

impl Listable for Channel {
    fn title(&self) -> &str {
        &self.name
    }

    fn filter_value(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::db::Database;
    use crate::types::RemoteChannel;

    fn setup() -> Result<(Database, Vec<i64>)> {
        let db = Database::open(":memory:")?;
        db.insert_channel(&RemoteChannel::new("a", "Alpha", "line one\nline two"))?;
        let ids = vec![
            db.insert_tag("one")?,
            db.insert_tag("two")?,
            db.insert_tag("three")?,
        ];
        Ok((db, ids))
    }

    #[test]
    fn set_notes_writes_through() -> Result<()> {
        let (db, _) = setup()?;
        let mut channel = db.get_channel("a")?.expect("channel should exist");
        channel.set_notes(&db, "great for cooking")?;
        assert_eq!(channel.notes, "great for cooking");
        let stored = db.get_channel("a")?.expect("channel should exist");
        assert_eq!(stored.notes, "great for cooking");
        Ok(())
    }

    #[test]
    fn set_tags_is_idempotent() -> Result<()> {
        let (db, ids) = setup()?;
        let mut channel = db.get_channel("a")?.expect("channel should exist");

        let first = channel.set_tags(&db, &[ids[2], ids[0]])?;
        assert_eq!(first.added, vec![ids[2], ids[0]]);
        assert!(first.removed.is_empty());
        assert_eq!(channel.tag_ids, vec![ids[0], ids[2]]);

        let second = channel.set_tags(&db, &[ids[0], ids[2]])?;
        assert!(second.is_empty());
        assert_eq!(db.link_count()?, 2);

        let third = channel.set_tags(&db, &[ids[1]])?;
        assert_eq!(third.added, vec![ids[1]]);
        assert_eq!(third.removed, vec![ids[0], ids[2]]);
        assert_eq!(db.channel_tag_ids("a")?, vec![ids[1]]);
        Ok(())
    }

    #[test]
    fn set_tags_surfaces_store_failures() -> Result<()> {
        let (db, ids) = setup()?;
        let mut channel = db.get_channel("a")?.expect("channel should exist");
        let err = channel
            .set_tags(&db, &[ids[0], 999])
            .expect_err("linking a missing tag should fail");
        assert!(matches!(err, super::ModelError::Store(_)));
        assert!(channel.tag_ids.is_empty());
        assert_eq!(db.channel_tag_ids("a")?, vec![ids[0]]);
        Ok(())
    }

    #[test]
    fn first_description_line_skips_rest() -> Result<()> {
        let (db, _) = setup()?;
        let channel = db.get_channel("a")?.expect("channel should exist");
        assert_eq!(channel.first_description_line(), "line one");
        Ok(())
    }
}
