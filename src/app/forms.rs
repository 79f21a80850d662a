//! Key handling and commits for the tag, channel and generate forms

use anyhow::anyhow;
use crossterm::event::KeyEvent;
use tracing::{info, warn};

use crate::db::Database;
use crate::diff::toggle_all;
use crate::generator::{build_export, generate};
use crate::grid::GridExit;
use crate::keybindings::{KeyAction, KeyContext};
use crate::model::ModelError;
use crate::palette::{PickerCursor, is_complete_hex};
use crate::types::Tag;

use super::App;
use super::state::{
    ChannelModifyField, ChannelModifyState, ColourPickerState, ColourTarget, GenerateField,
    GeneratePageState, Screen, TagEntryField, TagEntryMode, TagEntryState, VerifyGenerateState,
    cycle_field,
};

impl App {
    pub(super) fn handle_tag_entry_key(&mut self, mut state: TagEntryState, key: KeyEvent) -> Screen {
        let order = TagEntryField::ORDER;

        if let Some(action) = self.keybindings.action_for_key(KeyContext::Form, key) {
            match action {
                KeyAction::NextField => {
                    state.focused_field = cycle_field(&order, state.focused_field, 1, |_| false);
                }
                KeyAction::PrevField => {
                    state.focused_field = cycle_field(&order, state.focused_field, -1, |_| false);
                }
                KeyAction::Back => return Screen::Tag,
                KeyAction::Activate => match state.focused_field {
                    TagEntryField::FgPicker => {
                        return open_picker(state, ColourTarget::Foreground);
                    }
                    TagEntryField::BgPicker => {
                        return open_picker(state, ColourTarget::Background);
                    }
                    TagEntryField::Submit => return self.submit_tag_entry(state),
                    _ => {
                        state.focused_field =
                            cycle_field(&order, state.focused_field, 1, |_| false);
                    }
                },
                _ => {}
            }
            return Screen::TagEntry(state);
        }

        if let Some(input) = state.focused_input() {
            input.handle_key(key);
        }
        Screen::TagEntry(state)
    }

    fn submit_tag_entry(&mut self, mut state: TagEntryState) -> Screen {
        if let Some(field) = invalid_colour_field(&state) {
            state.focused_field = field;
            return Screen::TagEntry(state);
        }

        match self.commit_tag_entry(&mut state) {
            Ok(tag_id) => {
                self.select_tag(tag_id);
                Screen::Tag
            }
            Err(err) => {
                let title = if err.is_validation() {
                    "Invalid tag"
                } else {
                    "Could not save tag"
                };
                self.show_error(title, &err);
                Screen::TagEntry(state)
            }
        }
    }

    fn commit_tag_entry(&mut self, state: &mut TagEntryState) -> Result<i64, ModelError> {
        let (mut tag, created) = match state.mode {
            TagEntryMode::Create => {
                Tag::default().validate_name(&self.db, 0, state.name.value())?;
                (Tag::create(&self.db)?, true)
            }
            TagEntryMode::Modify(id) => (
                self.db.get_tag(id)?.ok_or(ModelError::NotPersisted)?,
                false,
            ),
        };

        if let Err(err) = apply_tag_fields(&self.db, &mut tag, state) {
            if created {
                let id = tag.id;
                if let Err(cleanup) = tag.delete(&self.db) {
                    warn!(id, error = %cleanup, "failed to remove unsaved tag");
                    // a retry must update this row rather than create a second tag
                    state.mode = TagEntryMode::Modify(id);
                }
            }
            if let Err(reload) = self.reload() {
                warn!(error = %reload, "failed to reload after tag save error");
            }
            return Err(err);
        }
        info!(id = tag.id, name = %tag.name, "saved tag");

        self.reload()?;
        Ok(tag.id)
    }

    pub(super) fn handle_colour_picker_key(
        &mut self,
        mut state: ColourPickerState,
        key: KeyEvent,
    ) -> Screen {
        match self.keybindings.action_for_key(KeyContext::Picker, key) {
            Some(KeyAction::PickerUp) => state.cursor.up(),
            Some(KeyAction::PickerDown) => state.cursor.down(),
            Some(KeyAction::PickerLeft) => state.cursor.left(),
            Some(KeyAction::PickerRight) => state.cursor.right(),
            Some(KeyAction::PickerChoose) => {
                let mut form = *state.form;
                form.colour_mut(state.target)
                    .set_value(&state.cursor.field_value());
                return Screen::TagEntry(form);
            }
            Some(KeyAction::PickerBack) => return Screen::TagEntry(*state.form),
            _ => {}
        }
        Screen::ColourPicker(state)
    }

    pub(super) fn handle_channel_modify_key(
        &mut self,
        mut state: ChannelModifyState,
        key: KeyEvent,
    ) -> Screen {
        let order = ChannelModifyField::ORDER;
        let no_tags = state.tag_ids.is_empty();
        let skip = |field: ChannelModifyField| field == ChannelModifyField::Tags && no_tags;

        if state.focused_field == ChannelModifyField::Tags
            && let Some(action) = self.keybindings.action_for_key(KeyContext::Grid, key)
        {
            match action {
                KeyAction::GridUp => {
                    if state.grid.up() == GridExit::Above {
                        state.focused_field = cycle_field(&order, state.focused_field, -1, skip);
                    }
                }
                KeyAction::GridDown => {
                    if state.grid.down() == GridExit::Below {
                        state.focused_field = cycle_field(&order, state.focused_field, 1, skip);
                    }
                }
                KeyAction::GridLeft => state.grid.left(),
                KeyAction::GridRight => state.grid.right(),
                KeyAction::ToggleChip => state.toggle_focused(),
                _ => {}
            }
            return Screen::ChannelModify(state);
        }

        if let Some(action) = self.keybindings.action_for_key(KeyContext::Form, key) {
            match action {
                KeyAction::NextField => {
                    state.focused_field = cycle_field(&order, state.focused_field, 1, skip);
                }
                KeyAction::PrevField => {
                    state.focused_field = cycle_field(&order, state.focused_field, -1, skip);
                }
                KeyAction::Back => return Screen::Channel,
                KeyAction::Activate => match state.focused_field {
                    ChannelModifyField::Submit => return self.submit_channel_modify(state),
                    ChannelModifyField::Tags => state.toggle_focused(),
                    ChannelModifyField::Notes => {
                        state.focused_field = cycle_field(&order, state.focused_field, 1, skip);
                    }
                },
                _ => {}
            }
            return Screen::ChannelModify(state);
        }

        if state.focused_field == ChannelModifyField::Notes {
            state.notes.handle_key(key);
        }
        Screen::ChannelModify(state)
    }

    fn submit_channel_modify(&mut self, state: ChannelModifyState) -> Screen {
        match self.commit_channel_modify(&state) {
            Ok(()) => Screen::Channel,
            Err(err) => {
                self.show_error("Could not save channel", &err);
                Screen::ChannelModify(state)
            }
        }
    }

    fn commit_channel_modify(&mut self, state: &ChannelModifyState) -> Result<(), ModelError> {
        let mut channel = self
            .channels
            .get(&state.channel_id)
            .cloned()
            .ok_or_else(|| {
                ModelError::Store(anyhow!("channel '{}' no longer exists", state.channel_name))
            })?;

        let target = toggle_all(&channel.tag_ids, &state.toggled);
        channel.set_tags(&self.db, &target)?;
        if state.notes_dirty() {
            channel.set_notes(&self.db, state.notes.value())?;
        }
        info!(id = %channel.id, tags = channel.tag_ids.len(), "saved channel");

        self.reload()?;
        Ok(())
    }

    pub(super) fn handle_generate_page_key(
        &mut self,
        mut state: GeneratePageState,
        key: KeyEvent,
    ) -> Screen {
        let order = GenerateField::ORDER;
        let no_tags = state.tag_ids.is_empty();
        let skip = |field: GenerateField| field == GenerateField::Tags && no_tags;

        if state.focused_field == GenerateField::Tags
            && let Some(action) = self.keybindings.action_for_key(KeyContext::Grid, key)
        {
            match action {
                KeyAction::GridUp => {
                    if state.grid.up() == GridExit::Above {
                        state.focused_field = cycle_field(&order, state.focused_field, -1, skip);
                    }
                }
                KeyAction::GridDown => {
                    if state.grid.down() == GridExit::Below {
                        state.focused_field = cycle_field(&order, state.focused_field, 1, skip);
                    }
                }
                KeyAction::GridLeft => state.grid.left(),
                KeyAction::GridRight => state.grid.right(),
                KeyAction::ToggleChip => state.toggle_focused(),
                _ => {}
            }
            return Screen::GeneratePage(state);
        }

        if let Some(action) = self.keybindings.action_for_key(KeyContext::Form, key) {
            match action {
                KeyAction::NextField => {
                    state.focused_field = cycle_field(&order, state.focused_field, 1, skip);
                }
                KeyAction::PrevField => {
                    state.focused_field = cycle_field(&order, state.focused_field, -1, skip);
                }
                KeyAction::Back => return state.previous.screen(),
                KeyAction::Activate => match state.focused_field {
                    GenerateField::Generate => return self.submit_generate(state),
                    GenerateField::Tags => state.toggle_focused(),
                    _ => {
                        state.focused_field = cycle_field(&order, state.focused_field, 1, skip);
                    }
                },
                _ => {}
            }
            return Screen::GeneratePage(state);
        }

        if let Some(input) = state.focused_input() {
            input.handle_key(key);
        }
        Screen::GeneratePage(state)
    }

    fn submit_generate(&mut self, state: GeneratePageState) -> Screen {
        self.generate_selection = state.selected.clone();
        let export = build_export(
            &self.channels,
            &self.tags,
            &state.selected,
            state.title.value(),
        );
        let output = state.output_path();

        match generate(&state.template_path(), &output, &export) {
            Ok(()) => Screen::VerifyGenerate(VerifyGenerateState {
                output,
                previous: state.previous,
            }),
            Err(err) => {
                self.show_error("Could not generate page", format!("{err:#}"));
                Screen::GeneratePage(state)
            }
        }
    }
}

fn open_picker(form: TagEntryState, target: ColourTarget) -> Screen {
    let cursor = PickerCursor::seeded(form.colour(target).value());
    Screen::ColourPicker(ColourPickerState {
        form: Box::new(form),
        target,
        cursor,
    })
}

fn invalid_colour_field(state: &TagEntryState) -> Option<TagEntryField> {
    if !is_complete_hex(state.fg_colour.value()) {
        Some(TagEntryField::FgColour)
    } else if !is_complete_hex(state.bg_colour.value()) {
        Some(TagEntryField::BgColour)
    } else {
        None
    }
}

fn apply_tag_fields(db: &Database, tag: &mut Tag, state: &TagEntryState) -> Result<(), ModelError> {
    tag.set_name(db, state.name.value())?;
    tag.set_description(db, state.description.value())?;
    tag.set_fg_colour(db, state.fg_colour.value())?;
    tag.set_bg_colour(db, state.bg_colour.value())?;
    Ok(())
}
