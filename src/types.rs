use serde::{Deserialize, Serialize};

pub const DEFAULT_FG_COLOUR: &str = "FFFFFF";
pub const DEFAULT_BG_COLOUR: &str = "FF0000";

/// A subscribed channel as stored locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub notes: String,
    /// Sorted ascending.
    pub tag_ids: Vec<i64>,
}

/// A user-defined label. Colours are six hex digits without the leading `#`.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub fg_colour: String,
    pub bg_colour: String,
    /// Sorted ascending.
    pub channel_ids: Vec<String>,
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: String::new(),
            fg_colour: DEFAULT_FG_COLOUR.to_string(),
            bg_colour: DEFAULT_BG_COLOUR.to_string(),
            channel_ids: Vec::new(),
        }
    }
}

/// The remotely sourced part of a channel, as returned by a subscription fetch.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct RemoteChannel {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl RemoteChannel {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tag_uses_white_on_red() {
        let tag = Tag::default();
        assert_eq!(tag.id, 0);
        assert_eq!(tag.fg_colour, "FFFFFF");
        assert_eq!(tag.bg_colour, "FF0000");
        assert!(tag.channel_ids.is_empty());
    }

    #[test]
    fn channel_serializes_with_snake_case_fields() {
        let channel = Channel {
            id: "UC1".to_string(),
            name: "Foo".to_string(),
            description: "desc".to_string(),
            notes: String::new(),
            tag_ids: vec![1, 2],
        };
        let json = serde_json::to_value(&channel).expect("channel should serialize");
        assert_eq!(json["tag_ids"], serde_json::json!([1, 2]));
        assert_eq!(json["name"], "Foo");
    }
}
