use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{Database, TagField};
use crate::diff::SetChanges;
use crate::types::Tag;

use super::{Listable, ModelError};

const PLACEHOLDER_NAME_LEN: usize = 10;
pub const MAX_NAME_ATTEMPTS: usize = 100;
const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

impl Tag {
    /// Inserts a tag under a random placeholder name and returns it.
    pub fn create(db: &Database) -> Result<Tag, ModelError> {
        let draft = Tag::default();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = placeholder_name();
            match draft.validate_name(db, 0, &name) {
                Ok(()) => {
                    let id = db.insert_tag(&name)?;
                    info!(id, name = %name, "created tag");
                    return Ok(Tag {
                        id,
                        name,
                        ..Tag::default()
                    });
                }
                Err(ModelError::DuplicateName { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(ModelError::NameGenerationExhausted {
            attempts: MAX_NAME_ATTEMPTS,
        })
    }

    /// Checks that exactly `expected` other tags already use `name`, ignoring case.
    ///
    /// The tag's own row is excluded, so renaming a tag to a case variant of itself passes.
    pub fn validate_name(&self, db: &Database, expected: i64, name: &str) -> Result<(), ModelError> {
        if name.trim().is_empty() {
            return Err(ModelError::EmptyName);
        }

        let count = db.count_tags_named(name, self.id)?;
        if count != expected {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn set_name(&mut self, db: &Database, name: &str) -> Result<(), ModelError> {
        self.ensure_persisted()?;
        self.validate_name(db, 0, name)?;
        db.update_tag_field(self.id, TagField::Name, name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn set_description(&mut self, db: &Database, description: &str) -> Result<(), ModelError> {
        self.ensure_persisted()?;
        db.update_tag_field(self.id, TagField::Description, description)?;
        self.description = description.to_string();
        Ok(())
    }

    pub fn set_fg_colour(&mut self, db: &Database, colour: &str) -> Result<(), ModelError> {
        self.ensure_persisted()?;
        db.update_tag_field(self.id, TagField::FgColour, colour)?;
        self.fg_colour = colour.to_string();
        Ok(())
    }

    pub fn set_bg_colour(&mut self, db: &Database, colour: &str) -> Result<(), ModelError> {
        self.ensure_persisted()?;
        db.update_tag_field(self.id, TagField::BgColour, colour)?;
        self.bg_colour = colour.to_string();
        Ok(())
    }

    /// Rewrites which channels carry this tag, writing only the difference.
    pub fn set_channels(
        &mut self,
        db: &Database,
        channel_ids: &[String],
    ) -> Result<SetChanges<String>, ModelError> {
        self.ensure_persisted()?;
        let changes = SetChanges::between(&self.channel_ids, channel_ids);

        for channel_id in &changes.added {
            db.insert_link(channel_id, self.id)?;
        }
        for channel_id in &changes.removed {
            db.delete_link(channel_id, self.id)?;
        }

        debug!(
            tag = self.id,
            added = changes.added.len(),
            removed = changes.removed.len(),
            "updated tag channels"
        );

        let mut updated = channel_ids.to_vec();
        updated.sort();
        updated.dedup();
        self.channel_ids = updated;
        Ok(changes)
    }

    /// Removes the tag. Its links go with it through the foreign-key cascade.
    pub fn delete(self, db: &Database) -> Result<(), ModelError> {
        self.ensure_persisted()?;
        db.delete_tag(self.id)?;
        info!(id = self.id, name = %self.name, "deleted tag");
        Ok(())
    }

    fn ensure_persisted(&self) -> Result<(), ModelError> {
        if self.id <= 0 {
            return Err(ModelError::NotPersisted);
        }
        Ok(())
    }
}

impl Listable for Tag {
    fn title(&self) -> &str {
        &self.name
    }

    fn filter_value(&self) -> &str {
        &self.name
    }
}

fn placeholder_name() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    bytes
        .iter()
        .take(PLACEHOLDER_NAME_LEN)
        .map(|byte| NAME_ALPHABET[usize::from(*byte) % NAME_ALPHABET.len()] as char)
        .collect()
}
