//! In-memory snapshots of the store, rebuilt wholesale after every mutation.

mod channel;
mod error;
mod tag;

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use crate::db::Database;
use crate::types::{Channel, Tag};

pub use error::ModelError;
pub use tag::MAX_NAME_ATTEMPTS;

/// Something a list screen can show and filter.
pub trait Listable {
    fn title(&self) -> &str;
    fn filter_value(&self) -> &str;
}

/// All channels, keyed by id, with a name index derived from that map.
#[derive(Debug, Clone, Default)]
pub struct Channels {
    by_id: HashMap<String, Channel>,
    by_name: BTreeMap<String, String>,
}

impl Channels {
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self::from_vec(db.list_channels()?))
    }

    pub fn from_vec(channels: Vec<Channel>) -> Self {
        let by_name = channels
            .iter()
            .map(|channel| (channel.name.clone(), channel.id.clone()))
            .collect();
        let by_id = channels
            .into_iter()
            .map(|channel| (channel.id.clone(), channel))
            .collect();
        Self { by_id, by_name }
    }

    pub fn get(&self, id: &str) -> Option<&Channel> {
        self.by_id.get(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Channel> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Channels in lexicographic name order.
    pub fn sorted(&self) -> Vec<&Channel> {
        self.by_name
            .values()
            .filter_map(|id| self.by_id.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// All tags, keyed by id, with a name index derived from that map.
#[derive(Debug, Clone, Default)]
pub struct Tags {
    by_id: HashMap<i64, Tag>,
    by_name: BTreeMap<String, i64>,
}

impl Tags {
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self::from_vec(db.list_tags()?))
    }

    pub fn from_vec(tags: Vec<Tag>) -> Self {
        let by_name = tags.iter().map(|tag| (tag.name.clone(), tag.id)).collect();
        let by_id = tags.into_iter().map(|tag| (tag.id, tag)).collect();
        Self { by_id, by_name }
    }

    pub fn get(&self, id: i64) -> Option<&Tag> {
        self.by_id.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Tag> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Tags in lexicographic name order.
    pub fn sorted(&self) -> Vec<&Tag> {
        self.by_name
            .values()
            .filter_map(|id| self.by_id.get(id))
            .collect()
    }

    /// Tags referenced by `ids`, in name order. Unknown ids are skipped.
    pub fn sorted_subset(&self, ids: &[i64]) -> Vec<&Tag> {
        let mut subset: Vec<&Tag> = ids.iter().filter_map(|id| self.by_id.get(id)).collect();
        subset.sort_by(|left, right| left.name.cmp(&right.name));
        subset
    }

    /// Width of the longest tag name, at least one.
    pub fn longest_name(&self) -> usize {
        self.by_name
            .keys()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0)
            .max(1)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            ..Tag::default()
        }
    }

    fn channel(id: &str, name: &str) -> Channel {
        Channel {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            notes: String::new(),
            tag_ids: Vec::new(),
        }
    }

    #[test]
    fn channels_sort_by_name() {
        let channels = Channels::from_vec(vec![
            channel("1", "zeta"),
            channel("2", "Alpha"),
            channel("3", "beta"),
        ]);
        let names: Vec<&str> = channels.sorted().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
        assert_eq!(channels.get_by_name("beta").map(|c| c.id.as_str()), Some("3"));
        assert_eq!(channels.len(), 3);
    }

    #[test]
    fn tags_index_both_ways() {
        let tags = Tags::from_vec(vec![tag(2, "music"), tag(1, "funny"), tag(3, "a")]);
        assert_eq!(tags.get(2).map(|t| t.name.as_str()), Some("music"));
        assert_eq!(tags.get_by_name("funny").map(|t| t.id), Some(1));
        let ids: Vec<i64> = tags.sorted().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        let subset: Vec<i64> = tags.sorted_subset(&[2, 1, 99]).iter().map(|t| t.id).collect();
        assert_eq!(subset, vec![1, 2]);
        assert_eq!(tags.longest_name(), 5);
    }

    #[test]
    fn longest_name_is_at_least_one() {
        assert_eq!(Tags::default().longest_name(), 1);
    }
}
