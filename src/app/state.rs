//! Screen and form state for the interactive views

use std::path::PathBuf;

use crate::grid::GridCursor;
use crate::palette::PickerCursor;
use crate::settings::GeneratorSettings;
use crate::types::{Channel, DEFAULT_BG_COLOUR, DEFAULT_FG_COLOUR, Tag};

use super::text_input::TextInput;

pub const NAME_LIMIT: usize = 64;
pub const DESCRIPTION_LIMIT: usize = 4000;
pub const NOTES_LIMIT: usize = 4000;
pub const PATH_LIMIT: usize = 256;
pub const TITLE_LIMIT: usize = 512;

/// Which list a screen was opened from, and returns to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ListKind {
    Channel,
    Tag,
}

impl ListKind {
    pub fn screen(self) -> Screen {
        match self {
            ListKind::Channel => Screen::Channel,
            ListKind::Tag => Screen::Tag,
        }
    }
}

/// The active screen. Form screens own their in-progress edits.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Screen {
    Channel,
    Tag,
    TagEntry(TagEntryState),
    ChannelModify(ChannelModifyState),
    ConfirmDelete(ConfirmDeleteState),
    ColourPicker(ColourPickerState),
    GeneratePage(GeneratePageState),
    VerifyGenerate(VerifyGenerateState),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Channel => "channel",
            Screen::Tag => "tag",
            Screen::TagEntry(_) => "tagEntry",
            Screen::ChannelModify(_) => "channelModify",
            Screen::ConfirmDelete(_) => "confirmDelete",
            Screen::ColourPicker(_) => "colourPicker",
            Screen::GeneratePage(_) => "generatePage",
            Screen::VerifyGenerate(_) => "verifyGenerate",
        }
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        match self {
            Screen::Channel => Some(ListKind::Channel),
            Screen::Tag => Some(ListKind::Tag),
            _ => None,
        }
    }
}

/// Selection and filter of one list screen. Kept across screen switches.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ListView {
    pub selected: usize,
    pub filter: TextInput,
    pub filtering: bool,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            selected: 0,
            filter: TextInput::new("", NAME_LIMIT),
            filtering: false,
        }
    }
}

impl ListView {
    pub fn query(&self) -> &str {
        self.filter.value()
    }

    pub fn is_filtered(&self) -> bool {
        !self.filter.value().trim().is_empty()
    }

    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ErrorDialogState {
    pub title: String,
    pub detail: String,
}

/// Moves `delta` steps through `order` from `current`, wrapping, skipping fields `skip` rejects.
pub fn cycle_field<T: Copy + Eq>(
    order: &[T],
    current: T,
    delta: isize,
    skip: impl Fn(T) -> bool,
) -> T {
    let len = order.len() as isize;
    let mut index = order
        .iter()
        .position(|field| *field == current)
        .unwrap_or(0) as isize;
    for _ in 0..len {
        index = (index + delta).rem_euclid(len);
        let candidate = order[index as usize];
        if !skip(candidate) {
            return candidate;
        }
    }
    current
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TagEntryMode {
    Create,
    Modify(i64),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TagEntryField {
    Name,
    Description,
    FgColour,
    FgPicker,
    BgColour,
    BgPicker,
    Submit,
}

impl TagEntryField {
    pub const ORDER: [Self; 7] = [
        Self::Name,
        Self::Description,
        Self::FgColour,
        Self::FgPicker,
        Self::BgColour,
        Self::BgPicker,
        Self::Submit,
    ];
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ColourTarget {
    Foreground,
    Background,
}

/// Values the form was opened with, for unsaved-change markers.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SavedTag {
    pub name: String,
    pub description: String,
    pub fg_colour: String,
    pub bg_colour: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TagEntryState {
    pub mode: TagEntryMode,
    pub name: TextInput,
    pub description: TextInput,
    pub fg_colour: TextInput,
    pub bg_colour: TextInput,
    pub saved: SavedTag,
    pub focused_field: TagEntryField,
}

impl TagEntryState {
    pub fn create() -> Self {
        Self::with_values(
            TagEntryMode::Create,
            SavedTag {
                name: String::new(),
                description: String::new(),
                fg_colour: DEFAULT_FG_COLOUR.to_string(),
                bg_colour: DEFAULT_BG_COLOUR.to_string(),
            },
        )
    }

    pub fn modify(tag: &Tag) -> Self {
        Self::with_values(
            TagEntryMode::Modify(tag.id),
            SavedTag {
                name: tag.name.clone(),
                description: tag.description.clone(),
                fg_colour: tag.fg_colour.clone(),
                bg_colour: tag.bg_colour.clone(),
            },
        )
    }

    fn with_values(mode: TagEntryMode, saved: SavedTag) -> Self {
        Self {
            mode,
            name: TextInput::new(&saved.name, NAME_LIMIT).with_placeholder("funny"),
            description: TextInput::new(&saved.description, DESCRIPTION_LIMIT)
                .with_placeholder("channels that are funny"),
            fg_colour: TextInput::hex(&saved.fg_colour),
            bg_colour: TextInput::hex(&saved.bg_colour),
            saved,
            focused_field: TagEntryField::Name,
        }
    }

    pub fn colour(&self, target: ColourTarget) -> &TextInput {
        match target {
            ColourTarget::Foreground => &self.fg_colour,
            ColourTarget::Background => &self.bg_colour,
        }
    }

    pub fn colour_mut(&mut self, target: ColourTarget) -> &mut TextInput {
        match target {
            ColourTarget::Foreground => &mut self.fg_colour,
            ColourTarget::Background => &mut self.bg_colour,
        }
    }

    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focused_field {
            TagEntryField::Name => Some(&mut self.name),
            TagEntryField::Description => Some(&mut self.description),
            TagEntryField::FgColour => Some(&mut self.fg_colour),
            TagEntryField::BgColour => Some(&mut self.bg_colour),
            _ => None,
        }
    }

    pub fn is_dirty(&self, field: TagEntryField) -> bool {
        match field {
            TagEntryField::Name => self.name.value() != self.saved.name,
            TagEntryField::Description => self.description.value() != self.saved.description,
            TagEntryField::FgColour => !same_hex(self.fg_colour.value(), &self.saved.fg_colour),
            TagEntryField::BgColour => !same_hex(self.bg_colour.value(), &self.saved.bg_colour),
            _ => false,
        }
    }
}

fn same_hex(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ColourPickerState {
    /// The suspended tag form, restored on return.
    pub form: Box<TagEntryState>,
    pub target: ColourTarget,
    pub cursor: PickerCursor,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ChannelModifyField {
    Notes,
    Tags,
    Submit,
}

impl ChannelModifyField {
    pub const ORDER: [Self; 3] = [Self::Notes, Self::Tags, Self::Submit];
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChannelModifyState {
    pub channel_id: String,
    pub channel_name: String,
    pub notes: TextInput,
    pub saved_notes: String,
    pub saved_tag_ids: Vec<i64>,
    /// Every tag id in grid order.
    pub tag_ids: Vec<i64>,
    /// Tags whose membership flips on submit.
    pub toggled: Vec<i64>,
    pub grid: GridCursor,
    pub focused_field: ChannelModifyField,
}

impl ChannelModifyState {
    pub fn new(channel: &Channel, tag_ids: Vec<i64>, columns: usize) -> Self {
        Self {
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
            notes: TextInput::new(&channel.notes, NOTES_LIMIT),
            saved_notes: channel.notes.clone(),
            saved_tag_ids: channel.tag_ids.clone(),
            grid: GridCursor::new(tag_ids.len(), columns),
            tag_ids,
            toggled: Vec::new(),
            focused_field: ChannelModifyField::Notes,
        }
    }

    pub fn toggle_focused(&mut self) {
        if let Some(tag_id) = self.tag_ids.get(self.grid.index()).copied() {
            toggle_membership(&mut self.toggled, tag_id);
        }
    }

    pub fn is_selected(&self, tag_id: i64) -> bool {
        self.saved_tag_ids.contains(&tag_id) != self.toggled.contains(&tag_id)
    }

    pub fn is_toggled(&self, tag_id: i64) -> bool {
        self.toggled.contains(&tag_id)
    }

    pub fn notes_dirty(&self) -> bool {
        self.notes.value() != self.saved_notes
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConfirmDeleteField {
    Cancel,
    Delete,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConfirmDeleteState {
    pub tag_id: i64,
    pub name: String,
    pub description: String,
    pub focused_field: ConfirmDeleteField,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GenerateField {
    Template,
    Output,
    Title,
    Tags,
    Generate,
}

impl GenerateField {
    pub const ORDER: [Self; 5] = [
        Self::Template,
        Self::Output,
        Self::Title,
        Self::Tags,
        Self::Generate,
    ];
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GeneratePageState {
    pub template: TextInput,
    pub output: TextInput,
    pub title: TextInput,
    /// Every tag id in grid order.
    pub tag_ids: Vec<i64>,
    pub selected: Vec<i64>,
    pub grid: GridCursor,
    pub focused_field: GenerateField,
    pub previous: ListKind,
}

impl GeneratePageState {
    pub fn new(
        generator: &GeneratorSettings,
        tag_ids: Vec<i64>,
        selected: Vec<i64>,
        columns: usize,
        previous: ListKind,
    ) -> Self {
        Self {
            template: TextInput::new(&generator.template_file.to_string_lossy(), PATH_LIMIT)
                .with_placeholder(
                    "location of template file relative to running directory (or absolute path)",
                ),
            output: TextInput::new(&generator.output_file.to_string_lossy(), PATH_LIMIT)
                .with_placeholder(
                    "location of output file relative to running directory (or absolute path)",
                ),
            title: TextInput::new(&generator.title, TITLE_LIMIT)
                .with_placeholder("title for the page"),
            grid: GridCursor::new(tag_ids.len(), columns),
            tag_ids,
            selected,
            focused_field: GenerateField::Template,
            previous,
        }
    }

    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focused_field {
            GenerateField::Template => Some(&mut self.template),
            GenerateField::Output => Some(&mut self.output),
            GenerateField::Title => Some(&mut self.title),
            _ => None,
        }
    }

    pub fn toggle_focused(&mut self) {
        if let Some(tag_id) = self.tag_ids.get(self.grid.index()).copied() {
            toggle_membership(&mut self.selected, tag_id);
        }
    }

    pub fn is_selected(&self, tag_id: i64) -> bool {
        self.selected.contains(&tag_id)
    }

    pub fn template_path(&self) -> PathBuf {
        PathBuf::from(self.template.value().trim())
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(self.output.value().trim())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VerifyGenerateState {
    pub output: PathBuf,
    pub previous: ListKind,
}

fn toggle_membership(ids: &mut Vec<i64>, id: i64) {
    if let Some(position) = ids.iter().position(|existing| *existing == id) {
        ids.remove(position);
    } else {
        ids.push(id);
    }
}
