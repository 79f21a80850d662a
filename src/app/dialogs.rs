//! Dialog handling for delete confirmation, generate verification and errors

use crossterm::event::KeyEvent;

use crate::keybindings::{KeyAction, KeyContext};
use crate::model::ModelError;

use super::App;
use super::state::{ConfirmDeleteField, ConfirmDeleteState, Screen, VerifyGenerateState};

impl App {
    pub(super) fn handle_error_dialog_key(&mut self, key: KeyEvent) {
        if matches!(
            self.keybindings.action_for_key(KeyContext::Dialog, key),
            Some(KeyAction::DialogConfirm | KeyAction::DialogBack)
        ) {
            self.error_dialog = None;
        }
    }

    pub(super) fn handle_confirm_delete_key(
        &mut self,
        mut state: ConfirmDeleteState,
        key: KeyEvent,
    ) -> Screen {
        match self.keybindings.action_for_key(KeyContext::Dialog, key) {
            Some(KeyAction::DialogPrev | KeyAction::DialogNext) => {
                state.focused_field = match state.focused_field {
                    ConfirmDeleteField::Cancel => ConfirmDeleteField::Delete,
                    ConfirmDeleteField::Delete => ConfirmDeleteField::Cancel,
                };
            }
            Some(KeyAction::DialogBack) => return Screen::Tag,
            Some(KeyAction::DialogConfirm) => match state.focused_field {
                ConfirmDeleteField::Cancel => return Screen::Tag,
                ConfirmDeleteField::Delete => return self.confirm_delete(state),
            },
            _ => {}
        }
        Screen::ConfirmDelete(state)
    }

    fn confirm_delete(&mut self, state: ConfirmDeleteState) -> Screen {
        match self.delete_tag(state.tag_id) {
            Ok(()) => Screen::Tag,
            Err(err) => {
                self.show_error("Could not delete tag", &err);
                Screen::ConfirmDelete(state)
            }
        }
    }

    fn delete_tag(&mut self, tag_id: i64) -> Result<(), ModelError> {
        let tag = self.db.get_tag(tag_id)?.ok_or(ModelError::NotPersisted)?;
        tag.delete(&self.db)?;
        // channels referencing the tag lose it through the cascade
        self.reload()?;
        Ok(())
    }

    pub(super) fn handle_verify_generate_key(
        &mut self,
        state: VerifyGenerateState,
        key: KeyEvent,
    ) -> Screen {
        match self.keybindings.action_for_key(KeyContext::Dialog, key) {
            Some(KeyAction::DialogConfirm | KeyAction::DialogBack) => state.previous.screen(),
            _ => Screen::VerifyGenerate(state),
        }
    }
}
