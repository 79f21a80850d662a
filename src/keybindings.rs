use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum KeyContext {
    Global,
    List,
    Form,
    Grid,
    Picker,
    Dialog,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum KeyAction {
    ForceQuit,
    CursorUp,
    CursorDown,
    PrevPage,
    NextPage,
    FirstItem,
    LastItem,
    StartFilter,
    ChannelView,
    TagView,
    TogglePagination,
    ToggleHelp,
    ToggleUntagged,
    Modify,
    NewEntry,
    DeleteEntry,
    Generate,
    Quit,
    NextField,
    PrevField,
    Activate,
    Back,
    GridUp,
    GridDown,
    GridLeft,
    GridRight,
    ToggleChip,
    PickerUp,
    PickerDown,
    PickerLeft,
    PickerRight,
    PickerChoose,
    PickerBack,
    DialogPrev,
    DialogNext,
    DialogConfirm,
    DialogBack,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    fn matches(&self, key: KeyEvent) -> bool {
        match (&self.code, key.code) {
            (KeyCode::Char(left), KeyCode::Char(right)) => {
                let left = normalize_char(*left, self.modifiers);
                let right = normalize_char(right, key.modifiers);
                if left != right {
                    return false;
                }
                normalize_modifiers(self.modifiers) == normalize_modifiers(key.modifiers)
            }
            (KeyCode::BackTab, KeyCode::BackTab) => true,
            _ => self.code == key.code && self.modifiers == key.modifiers,
        }
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("alt".to_string());
        }

        parts.push(match self.code {
            KeyCode::Enter => "<enter>".to_string(),
            KeyCode::Esc => "<esc>".to_string(),
            KeyCode::Tab => "<tab>".to_string(),
            KeyCode::BackTab => "<shift-tab>".to_string(),
            KeyCode::Backspace => "<backspace>".to_string(),
            KeyCode::Left => "<left>".to_string(),
            KeyCode::Right => "<right>".to_string(),
            KeyCode::Up => "<up>".to_string(),
            KeyCode::Down => "<down>".to_string(),
            KeyCode::Home => "<home>".to_string(),
            KeyCode::End => "<end>".to_string(),
            KeyCode::PageUp => "<pgup>".to_string(),
            KeyCode::PageDown => "<pgdn>".to_string(),
            KeyCode::Delete => "<delete>".to_string(),
            KeyCode::F(n) => format!("<f{n}>"),
            KeyCode::Char(' ') => "<space>".to_string(),
            KeyCode::Char(ch) => ch.to_string(),
            _ => "?".to_string(),
        });

        write!(f, "{}", parts.join("+"))
    }
}

#[derive(Debug, Clone)]
pub struct ActionBinding {
    pub id: &'static str,
    pub action: KeyAction,
    pub description: &'static str,
    pub bindings: Vec<KeyBinding>,
}

#[derive(Debug, Clone)]
pub struct Keybindings {
    global: Vec<ActionBinding>,
    list: Vec<ActionBinding>,
    form: Vec<ActionBinding>,
    grid: Vec<ActionBinding>,
    picker: Vec<ActionBinding>,
    dialog: Vec<ActionBinding>,
}

#[derive(Debug, Deserialize, Default)]
struct KeybindingsFile {
    #[serde(default)]
    global: HashMap<String, Vec<String>>,
    #[serde(default)]
    list: HashMap<String, Vec<String>>,
    #[serde(default)]
    form: HashMap<String, Vec<String>>,
    #[serde(default)]
    grid: HashMap<String, Vec<String>>,
    #[serde(default)]
    picker: HashMap<String, Vec<String>>,
    #[serde(default)]
    dialog: HashMap<String, Vec<String>>,
}

struct ActionDef {
    id: &'static str,
    action: KeyAction,
    description: &'static str,
    defaults: &'static [&'static str],
}

const GLOBAL_DEFS: &[ActionDef] = &[ActionDef {
    id: "force_quit",
    action: KeyAction::ForceQuit,
    description: "quit immediately",
    defaults: &["Ctrl+C"],
}];

const LIST_DEFS: &[ActionDef] = &[
    ActionDef {
        id: "up",
        action: KeyAction::CursorUp,
        description: "up",
        defaults: &["Up", "k"],
    },
    ActionDef {
        id: "down",
        action: KeyAction::CursorDown,
        description: "down",
        defaults: &["Down", "j"],
    },
    ActionDef {
        id: "prev_page",
        action: KeyAction::PrevPage,
        description: "previous page",
        defaults: &["PageUp", "Left"],
    },
    ActionDef {
        id: "next_page",
        action: KeyAction::NextPage,
        description: "next page",
        defaults: &["PageDown", "Right"],
    },
    ActionDef {
        id: "first",
        action: KeyAction::FirstItem,
        description: "go to start",
        defaults: &["Home"],
    },
    ActionDef {
        id: "last",
        action: KeyAction::LastItem,
        description: "go to end",
        defaults: &["End"],
    },
    ActionDef {
        id: "filter",
        action: KeyAction::StartFilter,
        description: "filter",
        defaults: &["/"],
    },
    ActionDef {
        id: "channel_view",
        action: KeyAction::ChannelView,
        description: "channel view",
        defaults: &["c"],
    },
    ActionDef {
        id: "tag_view",
        action: KeyAction::TagView,
        description: "tag view",
        defaults: &["t"],
    },
    ActionDef {
        id: "toggle_pagination",
        action: KeyAction::TogglePagination,
        description: "toggle pagination",
        defaults: &["p"],
    },
    ActionDef {
        id: "toggle_help",
        action: KeyAction::ToggleHelp,
        description: "toggle help",
        defaults: &["h"],
    },
    ActionDef {
        id: "toggle_untagged",
        action: KeyAction::ToggleUntagged,
        description: "toggle to show only untagged channels",
        defaults: &["u"],
    },
    ActionDef {
        id: "modify",
        action: KeyAction::Modify,
        description: "modify entry",
        defaults: &["Enter", "m"],
    },
    ActionDef {
        id: "new",
        action: KeyAction::NewEntry,
        description: "new entry",
        defaults: &["n"],
    },
    ActionDef {
        id: "delete",
        action: KeyAction::DeleteEntry,
        description: "delete entry",
        defaults: &["d"],
    },
    ActionDef {
        id: "generate",
        action: KeyAction::Generate,
        description: "generate html output of channels and tags",
        defaults: &["g"],
    },
    ActionDef {
        id: "quit",
        action: KeyAction::Quit,
        description: "quit",
        defaults: &["q"],
    },
];

const FORM_DEFS: &[ActionDef] = &[
    ActionDef {
        id: "next_field",
        action: KeyAction::NextField,
        description: "next option",
        defaults: &["Tab", "Down"],
    },
    ActionDef {
        id: "prev_field",
        action: KeyAction::PrevField,
        description: "previous option",
        defaults: &["BackTab", "Up"],
    },
    ActionDef {
        id: "activate",
        action: KeyAction::Activate,
        description: "select",
        defaults: &["Enter"],
    },
    ActionDef {
        id: "back",
        action: KeyAction::Back,
        description: "back out",
        defaults: &["Esc"],
    },
];

const GRID_DEFS: &[ActionDef] = &[
    ActionDef {
        id: "up",
        action: KeyAction::GridUp,
        description: "move up a row",
        defaults: &["Up"],
    },
    ActionDef {
        id: "down",
        action: KeyAction::GridDown,
        description: "move down a row",
        defaults: &["Down"],
    },
    ActionDef {
        id: "left",
        action: KeyAction::GridLeft,
        description: "previous tag",
        defaults: &["Left"],
    },
    ActionDef {
        id: "right",
        action: KeyAction::GridRight,
        description: "next tag",
        defaults: &["Right"],
    },
    ActionDef {
        id: "toggle",
        action: KeyAction::ToggleChip,
        description: "toggle tag",
        defaults: &["Space"],
    },
];

const PICKER_DEFS: &[ActionDef] = &[
    ActionDef {
        id: "up",
        action: KeyAction::PickerUp,
        description: "move selector up",
        defaults: &["Up", "BackTab"],
    },
    ActionDef {
        id: "down",
        action: KeyAction::PickerDown,
        description: "move selector down",
        defaults: &["Down", "Tab"],
    },
    ActionDef {
        id: "left",
        action: KeyAction::PickerLeft,
        description: "move selector left",
        defaults: &["Left"],
    },
    ActionDef {
        id: "right",
        action: KeyAction::PickerRight,
        description: "move selector right",
        defaults: &["Right"],
    },
    ActionDef {
        id: "choose",
        action: KeyAction::PickerChoose,
        description: "choose colour",
        defaults: &["Enter"],
    },
    ActionDef {
        id: "back",
        action: KeyAction::PickerBack,
        description: "back out to tag editor",
        defaults: &["Esc"],
    },
];

const DIALOG_DEFS: &[ActionDef] = &[
    ActionDef {
        id: "prev",
        action: KeyAction::DialogPrev,
        description: "previous button",
        defaults: &["Left", "BackTab", "Up"],
    },
    ActionDef {
        id: "next",
        action: KeyAction::DialogNext,
        description: "next button",
        defaults: &["Right", "Tab", "Down"],
    },
    ActionDef {
        id: "confirm",
        action: KeyAction::DialogConfirm,
        description: "press button",
        defaults: &["Enter", "Space"],
    },
    ActionDef {
        id: "back",
        action: KeyAction::DialogBack,
        description: "back out",
        defaults: &["Esc"],
    },
];

const ALL_CONTEXTS: [KeyContext; 6] = [
    KeyContext::Global,
    KeyContext::List,
    KeyContext::Form,
    KeyContext::Grid,
    KeyContext::Picker,
    KeyContext::Dialog,
];

impl Default for Keybindings {
    fn default() -> Self {
        Self::from_file(&KeybindingsFile::default())
    }
}

impl Keybindings {
    pub fn load() -> Self {
        Self::from_file(&load_file())
    }

    fn from_file(file: &KeybindingsFile) -> Self {
        let mut keybindings = Self {
            global: build_section(KeyContext::Global, GLOBAL_DEFS, &file.global),
            list: build_section(KeyContext::List, LIST_DEFS, &file.list),
            form: build_section(KeyContext::Form, FORM_DEFS, &file.form),
            grid: build_section(KeyContext::Grid, GRID_DEFS, &file.grid),
            picker: build_section(KeyContext::Picker, PICKER_DEFS, &file.picker),
            dialog: build_section(KeyContext::Dialog, DIALOG_DEFS, &file.dialog),
        };

        keybindings.validate_conflicts();
        keybindings
    }

    pub fn action_for_key(&self, context: KeyContext, key: KeyEvent) -> Option<KeyAction> {
        self.bindings_for(context)
            .iter()
            .find(|binding| {
                binding
                    .bindings
                    .iter()
                    .any(|candidate| candidate.matches(key))
            })
            .map(|binding| binding.action)
    }

    /// `(keys, description)` pairs for the given actions, in the order asked for.
    pub fn help_entries(
        &self,
        context: KeyContext,
        actions: &[KeyAction],
    ) -> Vec<(String, &'static str)> {
        actions
            .iter()
            .filter_map(|action| {
                let binding = self
                    .bindings_for(context)
                    .iter()
                    .find(|binding| binding.action == *action)?;
                Some((join_bindings(&binding.bindings), binding.description))
            })
            .collect()
    }

    fn bindings_for(&self, context: KeyContext) -> &[ActionBinding] {
        match context {
            KeyContext::Global => &self.global,
            KeyContext::List => &self.list,
            KeyContext::Form => &self.form,
            KeyContext::Grid => &self.grid,
            KeyContext::Picker => &self.picker,
            KeyContext::Dialog => &self.dialog,
        }
    }

    fn validate_conflicts(&mut self) {
        for context in ALL_CONTEXTS {
            let mut seen: HashMap<String, &'static str> = HashMap::new();
            for binding in self.bindings_for(context) {
                for key in &binding.bindings {
                    let key_name = key.to_string();
                    if let Some(first_action) = seen.get(&key_name) {
                        warn!(
                            "keybinding conflict in {:?}: '{}' used by '{}' and '{}' (first wins)",
                            context, key_name, first_action, binding.id
                        );
                    } else {
                        seen.insert(key_name, binding.id);
                    }
                }
            }
        }
    }
}

fn join_bindings(bindings: &[KeyBinding]) -> String {
    bindings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

fn build_section(
    context: KeyContext,
    defs: &[ActionDef],
    overrides: &HashMap<String, Vec<String>>,
) -> Vec<ActionBinding> {
    let mut output = Vec::new();
    for def in defs {
        let source = overrides.get(def.id).cloned().unwrap_or_else(|| {
            def.defaults
                .iter()
                .map(|binding| binding.to_string())
                .collect()
        });

        let mut parsed = Vec::new();
        for raw in source {
            match parse_binding(&raw) {
                Some(binding) => parsed.push(binding),
                None => warn!(
                    "invalid keybinding '{}' for action '{}' in {:?}; ignoring",
                    raw, def.id, context
                ),
            }
        }

        if parsed.is_empty() {
            warn!(
                "no valid keybindings for action '{}' in {:?}; falling back to defaults",
                def.id, context
            );
            parsed = def
                .defaults
                .iter()
                .filter_map(|raw| parse_binding(raw))
                .collect();
        }

        output.push(ActionBinding {
            id: def.id,
            action: def.action,
            description: def.description,
            bindings: parsed,
        });
    }
    output
}

fn load_file() -> KeybindingsFile {
    let Some(path) = config_path() else {
        return KeybindingsFile::default();
    };

    if !path.exists() {
        return KeybindingsFile::default();
    }

    match fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str::<KeybindingsFile>(&contents) {
            Ok(file) => file,
            Err(error) => {
                warn!(
                    "failed to parse keybindings config '{}': {}",
                    path.display(),
                    error
                );
                KeybindingsFile::default()
            }
        },
        Err(error) => {
            warn!(
                "failed to read keybindings config '{}': {}",
                path.display(),
                error
            );
            KeybindingsFile::default()
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("ysm");
    path.push("keybindings.toml");
    Some(path)
}

fn normalize_modifiers(mut modifiers: KeyModifiers) -> KeyModifiers {
    modifiers.remove(KeyModifiers::SHIFT);
    modifiers
}

fn normalize_char(ch: char, modifiers: KeyModifiers) -> char {
    if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        ch.to_ascii_lowercase()
    } else {
        ch
    }
}

fn parse_binding(raw: &str) -> Option<KeyBinding> {
    let mut modifiers = KeyModifiers::empty();
    let mut key: Option<&str> = None;

    for part in raw.split('+').map(str::trim).filter(|s| !s.is_empty()) {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.insert(KeyModifiers::CONTROL),
            "alt" => modifiers.insert(KeyModifiers::ALT),
            "shift" => modifiers.insert(KeyModifiers::SHIFT),
            _ => {
                if key.is_some() {
                    return None;
                }
                key = Some(part);
            }
        }
    }

    let key = key?;
    let lower = key.to_ascii_lowercase();
    let code = match lower.as_str() {
        "enter" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" if modifiers.contains(KeyModifiers::SHIFT) => {
            modifiers.remove(KeyModifiers::SHIFT);
            KeyCode::BackTab
        }
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "backspace" => KeyCode::Backspace,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        "delete" => KeyCode::Delete,
        "space" => KeyCode::Char(' '),
        _ if lower.starts_with('f') && lower.len() > 1 && lower.len() <= 3 => {
            let n = lower[1..].parse::<u8>().ok()?;
            KeyCode::F(n)
        }
        _ if key.chars().count() == 1 => {
            let ch = normalize_char(key.chars().next()?, modifiers);
            KeyCode::Char(ch)
        }
        _ => return None,
    };

    Some(KeyBinding { code, modifiers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn parse_ctrl_binding() {
        let binding = parse_binding("Ctrl+C").expect("binding");
        assert_eq!(binding.code, KeyCode::Char('c'));
        assert!(binding.modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn shift_tab_parses_as_backtab() {
        let binding = parse_binding("shift+tab").expect("binding");
        assert_eq!(binding.code, KeyCode::BackTab);
        assert!(binding.matches(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)));
    }

    #[test]
    fn space_and_function_keys_parse() {
        assert_eq!(
            parse_binding("Space").map(|b| b.code),
            Some(KeyCode::Char(' '))
        );
        assert_eq!(parse_binding("F5").map(|b| b.code), Some(KeyCode::F(5)));
        assert!(parse_binding("f").is_some_and(|b| b.code == KeyCode::Char('f')));
    }

    #[test]
    fn invalid_binding_returns_none() {
        assert!(parse_binding("Ctrl+Alt+Left+Extra").is_none());
        assert!(parse_binding("").is_none());
    }

    #[test]
    fn list_defaults_resolve_actions() {
        let keys = Keybindings::default();
        assert_eq!(
            keys.action_for_key(KeyContext::List, press(KeyCode::Char('q'))),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            keys.action_for_key(KeyContext::List, press(KeyCode::Enter)),
            Some(KeyAction::Modify)
        );
        assert_eq!(
            keys.action_for_key(KeyContext::List, press(KeyCode::Char('m'))),
            Some(KeyAction::Modify)
        );
        assert_eq!(
            keys.action_for_key(KeyContext::List, press(KeyCode::Char('u'))),
            Some(KeyAction::ToggleUntagged)
        );
    }

    #[test]
    fn form_keys_do_not_capture_letters() {
        let keys = Keybindings::default();
        assert_eq!(
            keys.action_for_key(KeyContext::Form, press(KeyCode::Char('q'))),
            None
        );
        assert_eq!(
            keys.action_for_key(KeyContext::Form, press(KeyCode::Down)),
            Some(KeyAction::NextField)
        );
    }

    #[test]
    fn global_force_quit_needs_control() {
        let keys = Keybindings::default();
        assert_eq!(
            keys.action_for_key(
                KeyContext::Global,
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
            ),
            Some(KeyAction::ForceQuit)
        );
        assert_eq!(
            keys.action_for_key(KeyContext::Global, press(KeyCode::Char('c'))),
            None
        );
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut file = KeybindingsFile::default();
        file.list
            .insert("quit".to_string(), vec!["x".to_string(), "bogus-key".to_string()]);
        let keys = Keybindings::from_file(&file);
        assert_eq!(
            keys.action_for_key(KeyContext::List, press(KeyCode::Char('x'))),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            keys.action_for_key(KeyContext::List, press(KeyCode::Char('q'))),
            None
        );
    }

    #[test]
    fn help_entries_follow_requested_order() {
        let keys = Keybindings::default();
        let entries = keys.help_entries(
            KeyContext::Picker,
            &[KeyAction::PickerChoose, KeyAction::PickerBack],
        );
        assert_eq!(
            entries,
            vec![
                ("<enter>".to_string(), "choose colour"),
                ("<esc>".to_string(), "back out to tag editor"),
            ]
        );
    }
}
