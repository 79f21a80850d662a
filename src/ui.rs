use tuirealm::ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{
    App, ChannelModifyField, ChannelModifyState, ColourPickerState, ColourTarget,
    ConfirmDeleteField, ConfirmDeleteState, ErrorDialogState, GenerateField, GeneratePageState,
    HELP_HEIGHT, ListKind, Screen, TagEntryField, TagEntryMode, TagEntryState, TextInput,
    VerifyGenerateState,
};
use crate::grid::GridCursor;
use crate::keybindings::{KeyAction, KeyContext};
use crate::palette::{COLUMNS, PALETTE, ROWS, contrast_text, is_complete_hex, to_color};
use crate::types::{Channel, DEFAULT_BG_COLOUR, DEFAULT_FG_COLOUR, Tag};

const CHANNEL_HELP: &[KeyAction] = &[
    KeyAction::CursorUp,
    KeyAction::CursorDown,
    KeyAction::PrevPage,
    KeyAction::NextPage,
    KeyAction::StartFilter,
    KeyAction::Modify,
    KeyAction::TagView,
    KeyAction::ToggleHelp,
    KeyAction::TogglePagination,
    KeyAction::ToggleUntagged,
    KeyAction::Generate,
    KeyAction::Quit,
];

const TAG_HELP: &[KeyAction] = &[
    KeyAction::CursorUp,
    KeyAction::CursorDown,
    KeyAction::PrevPage,
    KeyAction::NextPage,
    KeyAction::StartFilter,
    KeyAction::Modify,
    KeyAction::NewEntry,
    KeyAction::DeleteEntry,
    KeyAction::ChannelView,
    KeyAction::ToggleHelp,
    KeyAction::TogglePagination,
    KeyAction::Generate,
    KeyAction::Quit,
];

const FORM_HELP: &[KeyAction] = &[
    KeyAction::NextField,
    KeyAction::PrevField,
    KeyAction::Activate,
    KeyAction::Back,
];

const GRID_HELP: &[KeyAction] = &[
    KeyAction::GridUp,
    KeyAction::GridDown,
    KeyAction::GridLeft,
    KeyAction::GridRight,
    KeyAction::ToggleChip,
];

const PICKER_HELP: &[KeyAction] = &[
    KeyAction::PickerUp,
    KeyAction::PickerDown,
    KeyAction::PickerLeft,
    KeyAction::PickerRight,
    KeyAction::PickerChoose,
    KeyAction::PickerBack,
];

const DIALOG_HELP: &[KeyAction] = &[
    KeyAction::DialogPrev,
    KeyAction::DialogNext,
    KeyAction::DialogConfirm,
    KeyAction::DialogBack,
];

/// Width of one palette cell on the picker screen.
const PICKER_CELL: &str = "    ";
const PICKER_CURSOR: &str = "XXXX";

pub fn render(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    match &app.screen {
        Screen::Channel => render_list(frame, area, app, ListKind::Channel),
        Screen::Tag => render_list(frame, area, app, ListKind::Tag),
        Screen::TagEntry(state) => render_tag_entry(frame, area, app, state),
        Screen::ChannelModify(state) => render_channel_modify(frame, area, app, state),
        Screen::ConfirmDelete(state) => render_confirm_delete(frame, area, app, state),
        Screen::ColourPicker(state) => render_colour_picker(frame, area, app, state),
        Screen::GeneratePage(state) => render_generate_page(frame, area, app, state),
        Screen::VerifyGenerate(state) => render_verify_generate(frame, area, app, state),
    }

    if let Some(dialog) = &app.error_dialog {
        render_error_dialog(frame, area, app, dialog);
    }
}

fn render_list(frame: &mut Frame<'_>, area: Rect, app: &App, kind: ListKind) {
    let mut constraints = vec![
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ];
    if app.show_pagination {
        constraints.push(Constraint::Length(1));
    }
    if app.show_help {
        constraints.push(Constraint::Length(HELP_HEIGHT));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let title = match kind {
        ListKind::Channel if app.untagged_only => "YSM - Channel View (untagged only)",
        ListKind::Channel => "YSM - Channel View",
        ListKind::Tag => "YSM - Tag View",
    };
    frame.render_widget(Paragraph::new(title_line(app, title)), chunks[0]);

    let view = app.list_view(kind);
    let len = app.visible_len(kind);
    frame.render_widget(
        Paragraph::new(filter_line(app, kind, len)),
        chunks[2],
    );

    let page_size = app.page_size();
    let start = (view.selected / page_size) * page_size;
    let end = (start + page_size).min(len);
    let mut lines: Vec<Line<'static>> = Vec::new();
    match kind {
        ListKind::Channel => {
            let channels = app.visible_channels();
            for (idx, channel) in channels.iter().enumerate().take(end).skip(start) {
                lines.extend(channel_item(app, channel, idx == view.selected));
            }
        }
        ListKind::Tag => {
            let tags = app.visible_tags();
            for (idx, tag) in tags.iter().enumerate().take(end).skip(start) {
                lines.extend(tag_item(app, tag, idx == view.selected));
            }
        }
    }
    if len == 0 {
        lines.push(Line::from(Span::styled(
            "  No items.",
            Style::default().fg(app.theme.base.text_muted),
        )));
    }
    frame.render_widget(Paragraph::new(lines), chunks[3]);

    let mut next = 4;
    if app.show_pagination {
        let pages = len.div_ceil(page_size).max(1);
        let page = view.selected / page_size + 1;
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("  page {page}/{pages}"),
                Style::default().fg(app.theme.base.text_muted),
            ))),
            chunks[next],
        );
        next += 1;
    }
    if app.show_help {
        let help = if view.filtering {
            Line::from(Span::styled(
                "  enter apply filter • esc clear filter",
                Style::default().fg(app.theme.base.text_muted),
            ))
        } else {
            let actions = match kind {
                ListKind::Channel => CHANNEL_HELP,
                ListKind::Tag => TAG_HELP,
            };
            help_line(app, KeyContext::List, actions)
        };
        frame.render_widget(
            Paragraph::new(help).wrap(Wrap { trim: true }),
            chunks[next],
        );
    }
}

fn title_line(app: &App, title: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(app.theme.base.title_fg)
                .bg(app.theme.base.title_bg)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

fn filter_line(app: &App, kind: ListKind, len: usize) -> Line<'static> {
    let view = app.list_view(kind);
    let muted = Style::default().fg(app.theme.base.text_muted);
    if view.filtering {
        let mut spans = vec![Span::styled(
            "  Filter: ",
            Style::default().fg(app.theme.interactive.focus),
        )];
        spans.extend(input_spans(app, &view.filter, true));
        return Line::from(spans);
    }
    if view.is_filtered() {
        return Line::from(vec![
            Span::styled(format!("  “{}” ", view.query()), muted),
            Span::styled(format!("{len} matching"), muted),
        ]);
    }
    let noun = match kind {
        ListKind::Channel => "channels",
        ListKind::Tag => "tags",
    };
    Line::from(Span::styled(format!("  {len} {noun}"), muted))
}

fn item_prefix(app: &App, selected: bool) -> Span<'static> {
    if selected {
        Span::styled("│ ", Style::default().fg(app.theme.interactive.selected_text))
    } else {
        Span::raw("  ")
    }
}

fn channel_item(app: &App, channel: &Channel, selected: bool) -> Vec<Line<'static>> {
    let title_style = if selected {
        Style::default()
            .fg(app.theme.interactive.selected_text)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.base.text)
    };
    let muted = Style::default().fg(app.theme.base.text_muted);

    let mut tags_line = vec![item_prefix(app, selected), Span::styled("tags: ", muted)];
    let tags = app.tags.sorted_subset(&channel.tag_ids);
    if tags.is_empty() {
        tags_line.push(Span::styled("<none>", muted));
    } else {
        for (idx, tag) in tags.iter().enumerate() {
            if idx > 0 {
                tags_line.push(Span::raw(" "));
            }
            tags_line.push(tag_chip(tag));
        }
    }

    vec![
        Line::from(vec![
            item_prefix(app, selected),
            Span::styled(channel.name.clone(), title_style),
        ]),
        Line::from(vec![
            item_prefix(app, selected),
            Span::styled(channel.first_description_line().to_string(), muted),
        ]),
        Line::from(tags_line),
        Line::default(),
    ]
}

fn tag_item(app: &App, tag: &Tag, selected: bool) -> Vec<Line<'static>> {
    let muted = Style::default().fg(app.theme.base.text_muted);
    let description = tag.description.lines().next().unwrap_or("").to_string();
    vec![
        Line::from(vec![item_prefix(app, selected), tag_chip(tag)]),
        Line::from(vec![item_prefix(app, selected), Span::styled(description, muted)]),
        Line::from(vec![
            item_prefix(app, selected),
            Span::styled(format!("channels: {}", tag.channel_ids.len()), muted),
        ]),
        Line::default(),
    ]
}

fn chip_style(fg: &str, bg: &str) -> Style {
    let mut style = Style::default();
    if let Some(colour) = to_color(fg) {
        style = style.fg(colour);
    }
    if let Some(colour) = to_color(bg) {
        style = style.bg(colour);
    }
    style
}

fn tag_chip(tag: &Tag) -> Span<'static> {
    Span::styled(
        format!(" {} ", tag.name),
        chip_style(&tag.fg_colour, &tag.bg_colour),
    )
}

fn help_line(app: &App, context: KeyContext, actions: &[KeyAction]) -> Line<'static> {
    let key_style = Style::default().fg(app.theme.base.text);
    let muted = Style::default().fg(app.theme.base.text_muted);
    let mut spans = vec![Span::raw("  ")];
    for (idx, (keys, description)) in app
        .keybindings
        .help_entries(context, actions)
        .into_iter()
        .enumerate()
    {
        if idx > 0 {
            spans.push(Span::styled(" • ", muted));
        }
        spans.push(Span::styled(keys, key_style));
        spans.push(Span::styled(format!(" {description}"), muted));
    }
    Line::from(spans)
}

/// Value (or placeholder) of an input, with a block cursor when focused.
fn input_spans(app: &App, input: &TextInput, focused: bool) -> Vec<Span<'static>> {
    let text_style = Style::default().fg(app.theme.base.text);
    if input.is_empty() && !focused {
        return vec![Span::styled(
            input.placeholder().to_string(),
            Style::default().fg(app.theme.base.text_muted),
        )];
    }
    if !focused {
        return vec![Span::styled(input.value().to_string(), text_style)];
    }

    let chars: Vec<char> = input.value().chars().collect();
    let cursor = input.cursor().min(chars.len());
    let before: String = chars[..cursor].iter().collect();
    let at = chars.get(cursor).map(char::to_string).unwrap_or_else(|| " ".to_string());
    let after: String = chars.get(cursor + 1..).map(|rest| rest.iter().collect()).unwrap_or_default();

    let mut spans = vec![
        Span::styled(before, text_style),
        Span::styled(at, text_style.add_modifier(Modifier::REVERSED)),
        Span::styled(after, text_style),
    ];
    if input.is_empty() {
        spans.push(Span::styled(
            input.placeholder().to_string(),
            Style::default().fg(app.theme.base.text_muted),
        ));
    }
    spans
}

fn field_label(app: &App, label: &str, dirty: bool, invalid: bool) -> Line<'static> {
    let style = if dirty {
        Style::default().fg(app.theme.interactive.unsaved)
    } else {
        Style::default().fg(app.theme.base.text)
    };
    let mut spans = vec![Span::styled(label.to_string(), style)];
    if invalid {
        spans.push(Span::styled(
            "  (needs six hex digits)",
            Style::default().fg(app.theme.base.danger),
        ));
    }
    Line::from(spans)
}

fn input_line(app: &App, prompt: &str, input: &TextInput, focused: bool) -> Vec<Span<'static>> {
    let prompt_style = if focused {
        Style::default().fg(app.theme.interactive.focus)
    } else {
        Style::default().fg(app.theme.base.text_muted)
    };
    let mut spans = vec![Span::styled(prompt.to_string(), prompt_style)];
    spans.extend(input_spans(app, input, focused));
    spans
}

fn button(app: &App, label: &str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default()
            .fg(app.theme.interactive.focus_text)
            .bg(app.theme.interactive.focus)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.dialog.button_fg)
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn unsaved_legend(app: &App) -> Line<'static> {
    Line::from(vec![
        Span::styled("■", Style::default().fg(app.theme.interactive.unsaved)),
        Span::styled(
            " unsaved changes",
            Style::default().fg(app.theme.base.text_muted),
        ),
    ])
}

fn form_block(app: &App, title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.interactive.border))
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(app.theme.base.title_fg)
                .bg(app.theme.base.title_bg)
                .add_modifier(Modifier::BOLD),
        ))
}

/// Body and help footer of a bordered form screen.
fn render_form(frame: &mut Frame<'_>, area: Rect, app: &App, title: String, lines: Vec<Line<'static>>, help: Line<'static>) {
    let block = form_block(app, title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(HELP_HEIGHT)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        pad(chunks[0]),
    );
    frame.render_widget(Paragraph::new(help).wrap(Wrap { trim: true }), chunks[1]);
}

fn pad(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    }
}

fn render_tag_entry(frame: &mut Frame<'_>, area: Rect, app: &App, state: &TagEntryState) {
    let focused = |field: TagEntryField| state.focused_field == field;
    let fg_invalid = !is_complete_hex(state.fg_colour.value());
    let bg_invalid = !is_complete_hex(state.bg_colour.value());

    let mut fg_line = input_line(app, " #", &state.fg_colour, focused(TagEntryField::FgColour));
    fg_line.push(Span::raw("   "));
    fg_line.push(button(app, "pick colour", focused(TagEntryField::FgPicker)));
    let mut bg_line = input_line(app, " #", &state.bg_colour, focused(TagEntryField::BgColour));
    bg_line.push(Span::raw("   "));
    bg_line.push(button(app, "pick colour", focused(TagEntryField::BgPicker)));

    let example_fg = if fg_invalid { DEFAULT_FG_COLOUR } else { state.fg_colour.value() };
    let example_bg = if bg_invalid { DEFAULT_BG_COLOUR } else { state.bg_colour.value() };
    let example_name = if state.name.is_empty() { "example" } else { state.name.value() };

    let lines = vec![
        field_label(app, "Name", state.is_dirty(TagEntryField::Name), false),
        Line::from(input_line(app, "> ", &state.name, focused(TagEntryField::Name))),
        Line::default(),
        field_label(
            app,
            "Description",
            state.is_dirty(TagEntryField::Description),
            false,
        ),
        Line::from(input_line(
            app,
            "> ",
            &state.description,
            focused(TagEntryField::Description),
        )),
        Line::default(),
        field_label(
            app,
            "Foreground colour",
            state.is_dirty(TagEntryField::FgColour),
            fg_invalid,
        ),
        Line::from(fg_line),
        Line::default(),
        field_label(
            app,
            "Background colour",
            state.is_dirty(TagEntryField::BgColour),
            bg_invalid,
        ),
        Line::from(bg_line),
        Line::default(),
        Line::from(vec![
            Span::styled("Example: ", Style::default().fg(app.theme.base.text_muted)),
            Span::styled(
                format!(" {example_name} "),
                chip_style(example_fg, example_bg),
            ),
        ]),
        Line::default(),
        Line::from(button(app, "Submit", focused(TagEntryField::Submit))),
        Line::default(),
        unsaved_legend(app),
    ];

    let title = match state.mode {
        TagEntryMode::Create => "YSM - New Tag".to_string(),
        TagEntryMode::Modify(_) => format!("YSM - Modify Tag: {}", state.saved.name),
    };
    render_form(frame, area, app, title, lines, help_line(app, KeyContext::Form, FORM_HELP));
}

/// Rows of tag chips laid out `grid.columns()` across, each cell sized for the longest name.
fn chip_grid_lines(
    app: &App,
    tag_ids: &[i64],
    grid: &GridCursor,
    grid_focused: bool,
    is_selected: impl Fn(i64) -> bool,
    is_unsaved: impl Fn(i64) -> bool,
) -> Vec<Line<'static>> {
    let cell = app.tags.longest_name().max(1) + 2;
    let muted = Style::default().fg(app.theme.base.text_muted);
    let unsaved = Style::default().fg(app.theme.interactive.unsaved);

    tag_ids
        .chunks(grid.columns())
        .enumerate()
        .map(|(row, ids)| {
            let mut spans = Vec::new();
            for (column, id) in ids.iter().enumerate() {
                let Some(tag) = app.tags.get(*id) else {
                    continue;
                };
                let index = row * grid.columns() + column;
                let mut style = if is_selected(*id) {
                    chip_style(&tag.fg_colour, &tag.bg_colour)
                } else {
                    muted
                };
                if grid_focused && index == grid.index() {
                    style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
                }
                let marker = if is_unsaved(*id) {
                    Span::styled("*", unsaved)
                } else {
                    Span::raw(" ")
                };
                spans.push(marker);
                spans.push(Span::styled(
                    format!("{:<width$}", tag.name, width = cell - 2),
                    style,
                ));
                spans.push(Span::raw(" "));
            }
            Line::from(spans)
        })
        .collect()
}

fn render_channel_modify(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &App,
    state: &ChannelModifyState,
) {
    let focused = |field: ChannelModifyField| state.focused_field == field;
    let mut lines = vec![
        field_label(app, "Notes", state.notes_dirty(), false),
        Line::from(input_line(app, "> ", &state.notes, focused(ChannelModifyField::Notes))),
        Line::default(),
        field_label(app, "Tags", !state.toggled.is_empty(), false),
    ];
    if state.tag_ids.is_empty() {
        lines.push(Line::from(Span::styled(
            "no tags yet; create some in the tag view",
            Style::default().fg(app.theme.base.text_muted),
        )));
    } else {
        lines.extend(chip_grid_lines(
            app,
            &state.tag_ids,
            &state.grid,
            focused(ChannelModifyField::Tags),
            |id| state.is_selected(id),
            |id| state.is_toggled(id),
        ));
    }
    lines.push(Line::default());
    lines.push(Line::from(button(app, "Submit", focused(ChannelModifyField::Submit))));
    lines.push(Line::default());
    lines.push(unsaved_legend(app));

    let help = if focused(ChannelModifyField::Tags) {
        help_line(app, KeyContext::Grid, GRID_HELP)
    } else {
        help_line(app, KeyContext::Form, FORM_HELP)
    };
    render_form(
        frame,
        area,
        app,
        format!("YSM - Modify Channel: {}", state.channel_name),
        lines,
        help,
    );
}

fn render_generate_page(frame: &mut Frame<'_>, area: Rect, app: &App, state: &GeneratePageState) {
    let focused = |field: GenerateField| state.focused_field == field;
    let mut lines = vec![
        field_label(app, "Template file", false, false),
        Line::from(input_line(app, "> ", &state.template, focused(GenerateField::Template))),
        Line::default(),
        field_label(app, "Output file", false, false),
        Line::from(input_line(app, "> ", &state.output, focused(GenerateField::Output))),
        Line::default(),
        field_label(app, "Title", false, false),
        Line::from(input_line(app, "> ", &state.title, focused(GenerateField::Title))),
        Line::default(),
        field_label(app, "Tags to include", false, false),
    ];
    if state.tag_ids.is_empty() {
        lines.push(Line::from(Span::styled(
            "no tags; every channel is included",
            Style::default().fg(app.theme.base.text_muted),
        )));
    } else {
        lines.extend(chip_grid_lines(
            app,
            &state.tag_ids,
            &state.grid,
            focused(GenerateField::Tags),
            |id| state.is_selected(id),
            |_| false,
        ));
    }
    lines.push(Line::default());
    lines.push(Line::from(button(app, "Generate", focused(GenerateField::Generate))));

    let help = if focused(GenerateField::Tags) {
        help_line(app, KeyContext::Grid, GRID_HELP)
    } else {
        help_line(app, KeyContext::Form, FORM_HELP)
    };
    render_form(frame, area, app, "YSM - Generate HTML".to_string(), lines, help);
}

fn render_colour_picker(frame: &mut Frame<'_>, area: Rect, app: &App, state: &ColourPickerState) {
    let mut lines: Vec<Line<'static>> = (0..ROWS)
        .map(|row| {
            let spans: Vec<Span<'static>> = (0..COLUMNS)
                .map(|column| {
                    let hex = PALETTE[column][row];
                    let mut style = Style::default();
                    if let Some(colour) = to_color(hex) {
                        style = style.bg(colour);
                    }
                    if column == state.cursor.column && row == state.cursor.row {
                        let text = to_color(contrast_text(hex)).unwrap_or(Color::White);
                        Span::styled(PICKER_CURSOR, style.fg(text).add_modifier(Modifier::BOLD))
                    } else {
                        Span::styled(PICKER_CELL, style)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let selected = state.cursor.hex();
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled(
            format!(
                "column: {}  row: {}  colour: {selected}  ",
                state.cursor.column, state.cursor.row
            ),
            Style::default().fg(app.theme.base.text),
        ),
        Span::styled(
            "  sample  ",
            chip_style(contrast_text(selected), selected),
        ),
    ]));

    let target = match state.target {
        ColourTarget::Foreground => "foreground",
        ColourTarget::Background => "background",
    };
    render_form(
        frame,
        area,
        app,
        format!("YSM - Pick {target} colour"),
        lines,
        help_line(app, KeyContext::Picker, PICKER_HELP),
    );
}

fn dialog_frame(frame: &mut Frame<'_>, area: Rect, app: &App, title: &str, border: Color) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(app.theme.base.text).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    pad(inner)
}

fn render_confirm_delete(frame: &mut Frame<'_>, area: Rect, app: &App, state: &ConfirmDeleteState) {
    let popup = centered_rect(60, 50, area);
    let inner = dialog_frame(frame, popup, app, "Delete tag?", app.theme.base.danger);

    let delete_focused = state.focused_field == ConfirmDeleteField::Delete;
    let delete = if delete_focused {
        Span::styled(
            "[ Delete ]",
            Style::default()
                .fg(app.theme.interactive.focus_text)
                .bg(app.theme.base.danger)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        button(app, "Delete", false)
    };

    let lines = vec![
        Line::from(format!("Name: {}", state.name)),
        Line::from(format!("Description: {}", state.description)),
        Line::default(),
        Line::from(Span::styled(
            "Channels lose this tag when it is deleted.",
            Style::default().fg(app.theme.base.text_muted),
        )),
        Line::default(),
        Line::from(vec![
            button(app, "Cancel", state.focused_field == ConfirmDeleteField::Cancel),
            Span::raw("  "),
            delete,
        ])
        .alignment(Alignment::Center),
        Line::default(),
        help_line(app, KeyContext::Dialog, DIALOG_HELP),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_verify_generate(frame: &mut Frame<'_>, area: Rect, app: &App, state: &VerifyGenerateState) {
    let popup = centered_rect(70, 30, area);
    let inner = dialog_frame(frame, popup, app, "Generated", app.theme.dialog.border);
    let lines = vec![
        Line::from(format!("Created/updated: {}", state.output.display())),
        Line::default(),
        Line::from(button(app, "ok", true)).alignment(Alignment::Center),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_error_dialog(frame: &mut Frame<'_>, area: Rect, app: &App, dialog: &ErrorDialogState) {
    let popup = centered_rect(60, 40, area);
    let inner = dialog_frame(frame, popup, app, &dialog.title, app.theme.base.danger);
    let lines = vec![
        Line::from(Span::styled(
            dialog.detail.clone(),
            Style::default().fg(app.theme.base.text),
        )),
        Line::default(),
        Line::from(button(app, "ok", true)).alignment(Alignment::Center),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Message, TagEntryState};
    use crate::db::Database;
    use crate::keybindings::Keybindings;
    use crate::settings::Settings;
    use crate::types::RemoteChannel;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tuirealm::ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn app() -> App {
        let db = Database::open(":memory:").expect("in-memory db");
        db.insert_channel(&RemoteChannel::new("a", "Alpha", "first line\nsecond"))
            .expect("insert");
        db.insert_channel(&RemoteChannel::new("b", "Beta", ""))
            .expect("insert");
        let tag = db.insert_tag("funny").expect("tag");
        db.insert_link("a", tag).expect("link");
        let mut app = App::new(db, Settings::default(), Keybindings::default()).expect("app");
        app.viewport = (100, 30);
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        app.update(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("test terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        buffer_to_string(terminal.backend().buffer())
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let mut output = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                output.push_str(buffer[(x, y)].symbol());
            }
            output.push('\n');
        }
        output
    }

    #[test]
    fn channel_view_shows_rows_and_footer() {
        let app = app();
        let screen = draw(&app);
        assert!(screen.contains("YSM - Channel View"));
        assert!(screen.contains("Alpha"));
        assert!(screen.contains("first line"));
        assert!(!screen.contains("second"));
        assert!(screen.contains("tags:  funny"));
        assert!(screen.contains("tags: <none>"));
        assert!(screen.contains("page 1/1"));
        assert!(screen.contains("toggle help"));
    }

    #[test]
    fn toggles_hide_pagination_and_help() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('u'));
        let screen = draw(&app);
        assert!(screen.contains("(untagged only)"));
        assert!(!screen.contains("page 1/1"));
        assert!(!screen.contains("toggle help"));
        assert!(!screen.contains("Alpha"));
    }

    #[test]
    fn tag_view_lists_channel_counts() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        let screen = draw(&app);
        assert!(screen.contains("YSM - Tag View"));
        assert!(screen.contains("channels: 1"));
        assert!(screen.contains("new entry"));
    }

    #[test]
    fn tag_form_shows_legend_and_example() {
        let mut app = app();
        app.screen = crate::app::Screen::TagEntry(TagEntryState::create());
        let screen = draw(&app);
        assert!(screen.contains("YSM - New Tag"));
        assert!(screen.contains("funny"));
        assert!(screen.contains("[ Submit ]"));
        assert!(screen.contains("unsaved changes"));
        assert!(screen.contains("Example:  example"));
        assert!(screen.contains("#FFFFFF"));
    }

    #[test]
    fn picker_marks_the_cursor_cell() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('n'));
        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
        }
        press(&mut app, KeyCode::Enter);
        let screen = draw(&app);
        assert!(screen.contains("XXXX"));
        assert!(screen.contains("colour: #"));
        assert!(screen.contains("choose colour"));
    }

    #[test]
    fn delete_dialog_names_the_tag() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('d'));
        let screen = draw(&app);
        assert!(screen.contains("Name: funny"));
        assert!(screen.contains("[ Cancel ]"));
        assert!(screen.contains("[ Delete ]"));
    }

    #[test]
    fn verify_and_error_dialogs_render() {
        let mut app = app();
        app.screen = crate::app::Screen::VerifyGenerate(VerifyGenerateState {
            output: "html/index.html".into(),
            previous: ListKind::Channel,
        });
        let screen = draw(&app);
        assert!(screen.contains("Created/updated: html/index.html"));
        assert!(screen.contains("[ ok ]"));

        app.show_error("Could not save tag", "a tag named 'funny' already exists");
        let screen = draw(&app);
        assert!(screen.contains("Could not save tag"));
        assert!(screen.contains("already exists"));
    }

    #[test]
    fn generate_page_lists_tag_grid() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        let screen = draw(&app);
        assert!(screen.contains("YSM - Generate HTML"));
        assert!(screen.contains("Tags to include"));
        assert!(screen.contains("funny"));
        assert!(screen.contains("[ Generate ]"));
    }
}
