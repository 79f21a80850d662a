pub mod dialogs;
pub mod forms;
pub mod lists;
pub mod messages;
pub mod state;
pub mod text_input;

use std::fmt::Display;
use std::mem;

use anyhow::Result;
use crossterm::event::{KeyEvent, KeyEventKind};
use tracing::{debug, warn};

pub use self::messages::Message;
pub use self::state::{
    ChannelModifyField, ChannelModifyState, ColourPickerState, ColourTarget, ConfirmDeleteField,
    ConfirmDeleteState, ErrorDialogState, GenerateField, GeneratePageState, ListKind, ListView,
    Screen, TagEntryField, TagEntryMode, TagEntryState, VerifyGenerateState,
};
pub use self::text_input::TextInput;

use crate::db::Database;
use crate::filter;
use crate::grid::column_count;
use crate::keybindings::{KeyAction, KeyContext, Keybindings};
use crate::model::{Channels, Tags};
use crate::settings::Settings;
use crate::theme::Theme;
use crate::types::{Channel, Tag};

/// Rows taken by one list entry, including the gap below it.
pub const LIST_ITEM_HEIGHT: u16 = 4;
/// Title bar, the gap under it and the filter line.
pub const LIST_CHROME_HEIGHT: u16 = 3;
pub const HELP_HEIGHT: u16 = 2;
/// Columns lost to the form border and padding around a tag grid.
pub const GRID_MARGIN: u16 = 4;

/// How many list entries fit on one page.
pub fn list_page_size(height: u16, show_pagination: bool, show_help: bool) -> usize {
    let mut chrome = LIST_CHROME_HEIGHT;
    if show_pagination {
        chrome += 1;
    }
    if show_help {
        chrome += HELP_HEIGHT;
    }
    usize::from((height.saturating_sub(chrome) / LIST_ITEM_HEIGHT).max(1))
}

pub struct App {
    pub should_quit: bool,
    pub theme: Theme,
    pub keybindings: Keybindings,
    pub viewport: (u16, u16),
    pub db: Database,
    pub settings: Settings,
    pub channels: Channels,
    pub tags: Tags,
    pub screen: Screen,
    pub channel_list: ListView,
    pub tag_list: ListView,
    pub show_help: bool,
    pub show_pagination: bool,
    pub untagged_only: bool,
    /// Tag selection of the last generate run; re-derived when empty.
    pub generate_selection: Vec<i64>,
    pub error_dialog: Option<ErrorDialogState>,
}

impl App {
    pub fn new(db: Database, settings: Settings, keybindings: Keybindings) -> Result<Self> {
        let channels = Channels::load(&db)?;
        let tags = Tags::load(&db)?;
        let theme = Theme::from_preset(settings.theme_preset());

        Ok(Self {
            should_quit: false,
            theme,
            keybindings,
            viewport: (80, 24),
            db,
            settings,
            channels,
            tags,
            screen: Screen::Channel,
            channel_list: ListView::default(),
            tag_list: ListView::default(),
            show_help: true,
            show_pagination: true,
            untagged_only: false,
            generate_selection: Vec::new(),
            error_dialog: None,
        })
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Resize(width, height) => {
                self.viewport = (width, height);
                let columns = self.grid_columns();
                match &mut self.screen {
                    Screen::ChannelModify(state) => state.grid.set_columns(columns),
                    Screen::GeneratePage(state) => state.grid.set_columns(columns),
                    _ => {}
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        if self.keybindings.action_for_key(KeyContext::Global, key) == Some(KeyAction::ForceQuit) {
            self.should_quit = true;
            return;
        }

        if self.error_dialog.is_some() {
            self.handle_error_dialog_key(key);
            return;
        }

        let screen = mem::replace(&mut self.screen, Screen::Channel);
        let from = screen.name();
        let next = match screen {
            Screen::Channel => self.handle_list_key(ListKind::Channel, key),
            Screen::Tag => self.handle_list_key(ListKind::Tag, key),
            Screen::TagEntry(state) => self.handle_tag_entry_key(state, key),
            Screen::ChannelModify(state) => self.handle_channel_modify_key(state, key),
            Screen::ConfirmDelete(state) => self.handle_confirm_delete_key(state, key),
            Screen::ColourPicker(state) => self.handle_colour_picker_key(state, key),
            Screen::GeneratePage(state) => self.handle_generate_page_key(state, key),
            Screen::VerifyGenerate(state) => self.handle_verify_generate_key(state, key),
        };
        if next.name() != from {
            debug!(from, to = next.name(), "screen change");
        }
        self.screen = next;
    }

    /// Rebuilds the channel and tag snapshots from the store.
    pub fn reload(&mut self) -> Result<()> {
        self.channels = Channels::load(&self.db)?;
        self.tags = Tags::load(&self.db)?;
        let channel_count = self.visible_channels().len();
        self.channel_list.clamp(channel_count);
        let tag_count = self.visible_tags().len();
        self.tag_list.clamp(tag_count);
        Ok(())
    }

    /// Channels as the channel screen shows them: name order, then filter rank.
    pub fn visible_channels(&self) -> Vec<&Channel> {
        let channels: Vec<&Channel> = self
            .channels
            .sorted()
            .into_iter()
            .filter(|channel| !self.untagged_only || channel.is_untagged())
            .collect();
        filter::rank(self.channel_list.query(), &channels)
            .into_iter()
            .map(|idx| channels[idx])
            .collect()
    }

    pub fn visible_tags(&self) -> Vec<&Tag> {
        let tags = self.tags.sorted();
        filter::rank(self.tag_list.query(), &tags)
            .into_iter()
            .map(|idx| tags[idx])
            .collect()
    }

    pub fn selected_channel(&self) -> Option<&Channel> {
        self.visible_channels()
            .get(self.channel_list.selected)
            .copied()
    }

    pub fn selected_tag(&self) -> Option<&Tag> {
        self.visible_tags().get(self.tag_list.selected).copied()
    }

    pub fn list_view(&self, kind: ListKind) -> &ListView {
        match kind {
            ListKind::Channel => &self.channel_list,
            ListKind::Tag => &self.tag_list,
        }
    }

    fn list_view_mut(&mut self, kind: ListKind) -> &mut ListView {
        match kind {
            ListKind::Channel => &mut self.channel_list,
            ListKind::Tag => &mut self.tag_list,
        }
    }

    pub fn visible_len(&self, kind: ListKind) -> usize {
        match kind {
            ListKind::Channel => self.visible_channels().len(),
            ListKind::Tag => self.visible_tags().len(),
        }
    }

    pub fn page_size(&self) -> usize {
        list_page_size(self.viewport.1, self.show_pagination, self.show_help)
    }

    /// Chip columns for a tag grid at the current terminal width.
    pub fn grid_columns(&self) -> usize {
        column_count(
            self.viewport.0.saturating_sub(GRID_MARGIN),
            self.tags.longest_name(),
        )
    }

    /// Tag ids in the order tag grids lay them out.
    pub fn grid_tag_ids(&self) -> Vec<i64> {
        self.tags.sorted().into_iter().map(|tag| tag.id).collect()
    }

    pub fn show_error(&mut self, title: &str, err: impl Display) {
        let detail = err.to_string();
        warn!(title, detail = %detail, "operation failed");
        self.error_dialog = Some(ErrorDialogState {
            title: title.to_string(),
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    use crate::types::RemoteChannel;

    pub(crate) fn test_app() -> App {
        let db = Database::open(":memory:").expect("in-memory db");
        db.insert_channel(&RemoteChannel::new("b", "Beta", "second\nmore"))
            .expect("insert");
        db.insert_channel(&RemoteChannel::new("a", "Alpha", "first"))
            .expect("insert");
        db.insert_channel(&RemoteChannel::new("g", "Gamma", ""))
            .expect("insert");
        let funny = db.insert_tag("funny").expect("insert tag");
        db.insert_link("a", funny).expect("link");
        App::new(db, Settings::default(), Keybindings::default()).expect("app")
    }

    pub(crate) fn press(app: &mut App, code: KeyCode) {
        app.update(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    pub(crate) fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn starts_on_the_channel_screen_in_name_order() {
        let app = test_app();
        assert_eq!(app.screen, Screen::Channel);
        let names: Vec<&str> = app
            .visible_channels()
            .iter()
            .map(|channel| channel.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn ctrl_c_quits_from_any_screen() {
        let mut app = test_app();
        app.screen = Screen::TagEntry(TagEntryState::create());
        app.update(Message::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit);
    }

    #[test]
    fn error_dialog_swallows_keys_until_dismissed() {
        let mut app = test_app();
        app.show_error("Could not save tag", "boom");
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.screen, Screen::Channel);
        assert!(app.error_dialog.is_some());
        press(&mut app, KeyCode::Esc);
        assert!(app.error_dialog.is_none());
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.screen, Screen::Tag);
    }

    #[test]
    fn page_size_accounts_for_chrome() {
        assert_eq!(list_page_size(24, true, true), 4);
        assert_eq!(list_page_size(24, false, false), 5);
        assert_eq!(list_page_size(3, true, true), 1);
    }

    #[test]
    fn resize_updates_grid_columns() {
        let mut app = test_app();
        let channel = app.channels.get("a").cloned().expect("channel a");
        let tag_ids = app.grid_tag_ids();
        app.screen = Screen::ChannelModify(ChannelModifyState::new(
            &channel,
            tag_ids,
            app.grid_columns(),
        ));
        app.update(Message::Resize(18, 24));
        let Screen::ChannelModify(state) = &app.screen else {
            panic!("expected channel modify screen");
        };
        assert_eq!(state.grid.columns(), 2);
        assert_eq!(app.viewport, (18, 24));
    }
}
