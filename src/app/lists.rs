//! Key handling for the channel and tag list screens

use crossterm::event::{KeyCode, KeyEvent};

use crate::generator::default_selection;
use crate::keybindings::{KeyAction, KeyContext};

use super::App;
use super::state::{
    ChannelModifyState, ConfirmDeleteField, ConfirmDeleteState, GeneratePageState, ListKind,
    Screen, TagEntryState,
};

impl App {
    pub(super) fn handle_list_key(&mut self, kind: ListKind, key: KeyEvent) -> Screen {
        if self.list_view(kind).filtering {
            self.handle_filter_key(kind, key);
            return kind.screen();
        }

        let Some(action) = self.keybindings.action_for_key(KeyContext::List, key) else {
            if key.code == KeyCode::Esc && self.list_view(kind).is_filtered() {
                let view = self.list_view_mut(kind);
                view.filter.clear();
                view.selected = 0;
            }
            return kind.screen();
        };

        let len = self.visible_len(kind);
        let last = len.saturating_sub(1);
        let page = self.page_size();

        match action {
            KeyAction::CursorUp => {
                let view = self.list_view_mut(kind);
                view.selected = view.selected.saturating_sub(1);
            }
            KeyAction::CursorDown => {
                let view = self.list_view_mut(kind);
                view.selected = (view.selected + 1).min(last);
            }
            KeyAction::PrevPage => {
                let view = self.list_view_mut(kind);
                view.selected = view.selected.saturating_sub(page);
            }
            KeyAction::NextPage => {
                let view = self.list_view_mut(kind);
                view.selected = (view.selected + page).min(last);
            }
            KeyAction::FirstItem => self.list_view_mut(kind).selected = 0,
            KeyAction::LastItem => self.list_view_mut(kind).selected = last,
            KeyAction::StartFilter => self.list_view_mut(kind).filtering = true,
            KeyAction::ChannelView => return Screen::Channel,
            KeyAction::TagView => return Screen::Tag,
            KeyAction::TogglePagination => self.show_pagination = !self.show_pagination,
            KeyAction::ToggleHelp => self.show_help = !self.show_help,
            KeyAction::ToggleUntagged if kind == ListKind::Channel => {
                self.untagged_only = !self.untagged_only;
                self.channel_list.selected = 0;
            }
            KeyAction::Modify => {
                if let Some(screen) = self.open_modify(kind) {
                    return screen;
                }
            }
            KeyAction::NewEntry if kind == ListKind::Tag => {
                return Screen::TagEntry(TagEntryState::create());
            }
            KeyAction::DeleteEntry if kind == ListKind::Tag => {
                if let Some(tag) = self.selected_tag() {
                    return Screen::ConfirmDelete(ConfirmDeleteState {
                        tag_id: tag.id,
                        name: tag.name.clone(),
                        description: tag.description.clone(),
                        focused_field: ConfirmDeleteField::Cancel,
                    });
                }
            }
            KeyAction::Generate => return Screen::GeneratePage(self.open_generate(kind)),
            KeyAction::Quit => self.should_quit = true,
            _ => {}
        }

        kind.screen()
    }

    fn handle_filter_key(&mut self, kind: ListKind, key: KeyEvent) {
        let view = self.list_view_mut(kind);
        match key.code {
            KeyCode::Esc => {
                view.filter.clear();
                view.filtering = false;
                view.selected = 0;
            }
            KeyCode::Enter => view.filtering = false,
            _ => {
                if view.filter.handle_key(key) {
                    view.selected = 0;
                }
            }
        }
    }

    fn open_modify(&self, kind: ListKind) -> Option<Screen> {
        match kind {
            ListKind::Channel => {
                let channel = self.selected_channel()?;
                Some(Screen::ChannelModify(ChannelModifyState::new(
                    channel,
                    self.grid_tag_ids(),
                    self.grid_columns(),
                )))
            }
            ListKind::Tag => {
                let tag = self.selected_tag()?;
                Some(Screen::TagEntry(TagEntryState::modify(tag)))
            }
        }
    }

    fn open_generate(&mut self, previous: ListKind) -> GeneratePageState {
        let tag_ids = self.grid_tag_ids();
        self.generate_selection.retain(|id| tag_ids.contains(id));
        if self.generate_selection.is_empty() {
            self.generate_selection = default_selection(&self.tags);
        }

        GeneratePageState::new(
            &self.settings.generator,
            tag_ids,
            self.generate_selection.clone(),
            self.grid_columns(),
            previous,
        )
    }

    /// Points the tag list at `tag_id` if it is visible.
    pub(super) fn select_tag(&mut self, tag_id: i64) {
        if let Some(position) = self.visible_tags().iter().position(|tag| tag.id == tag_id) {
            self.tag_list.selected = position;
        }
    }
}
