//! Fixed colour grid for the picker screen and hex colour helpers.

use std::sync::LazyLock;

use regex::Regex;
use tuirealm::ratatui::style::Color;

pub const COLUMNS: usize = 18;
pub const ROWS: usize = 12;

/// Indexed `[column][row]`.
pub const PALETTE: [[&str; ROWS]; COLUMNS] = [
    [
        "#CCFF00", "#CCFF33", "#CCFF66", "#CCFF99", "#CCFFCC", "#CCFFFF", "#FFFFFF", "#FFFFCC",
        "#FFFF99", "#FFFF66", "#FFFF33", "#FFFF00",
    ],
    [
        "#CCCC00", "#CCCC33", "#CCCC66", "#CCCC99", "#CCCCCC", "#CCCCFF", "#FFCCFF", "#FFCCCC",
        "#FFCC99", "#FFCC66", "#FFCC33", "#FFCC00",
    ],
    [
        "#CC9900", "#CC9933", "#CC9966", "#CC9999", "#CC99CC", "#CC99FF", "#FF99FF", "#FF99CC",
        "#FF9999", "#FF9966", "#FF9933", "#FF9900",
    ],
    [
        "#CC6600", "#CC6633", "#CC6666", "#CC6699", "#CC66CC", "#CC66FF", "#FF66FF", "#FF66CC",
        "#FF6699", "#FF6666", "#FF6633", "#FF6600",
    ],
    [
        "#CC3300", "#CC3333", "#CC3366", "#CC3399", "#CC33CC", "#CC33FF", "#FF33FF", "#FF33CC",
        "#FF3399", "#FF3366", "#FF3333", "#FF3300",
    ],
    [
        "#CC0000", "#CC0033", "#CC0066", "#CC0099", "#CC00CC", "#CC00FF", "#FF00FF", "#FF00CC",
        "#FF0099", "#FF0066", "#FF0033", "#FF0000",
    ],
    [
        "#660000", "#660033", "#660066", "#660099", "#6600CC", "#6600FF", "#9900FF", "#9900CC",
        "#990099", "#990066", "#990033", "#990000",
    ],
    [
        "#663300", "#663333", "#663366", "#663399", "#6633CC", "#6633FF", "#9933FF", "#9933CC",
        "#993399", "#993366", "#993333", "#993300",
    ],
    [
        "#666600", "#666633", "#666666", "#666699", "#6666CC", "#6666FF", "#9966FF", "#9966CC",
        "#996699", "#996666", "#996633", "#996600",
    ],
    [
        "#669900", "#669933", "#669966", "#669999", "#6699CC", "#6699FF", "#9999FF", "#9999CC",
        "#999999", "#999966", "#999933", "#999900",
    ],
    [
        "#66CC00", "#66CC33", "#66CC66", "#66CC99", "#66CCCC", "#66CCFF", "#99CCFF", "#99CCCC",
        "#99CC99", "#99CC66", "#99CC33", "#99CC00",
    ],
    [
        "#66FF00", "#66FF33", "#66FF66", "#66FF99", "#66FFCC", "#66FFFF", "#99FFFF", "#99FFCC",
        "#99FF99", "#99FF66", "#99FF33", "#99FF00",
    ],
    [
        "#00FF00", "#00FF33", "#00FF66", "#00FF99", "#00FFCC", "#00FFFF", "#33FFFF", "#33FFCC",
        "#33FF99", "#33FF66", "#33FF33", "#33FF00",
    ],
    [
        "#00CC00", "#00CC33", "#00CC66", "#00CC99", "#00CCCC", "#00CCFF", "#33CCFF", "#33CCCC",
        "#33CC99", "#33CC66", "#33CC33", "#33CC00",
    ],
    [
        "#009900", "#009933", "#009966", "#009999", "#0099CC", "#0099FF", "#3399FF", "#3399CC",
        "#339999", "#339966", "#339933", "#339900",
    ],
    [
        "#006600", "#006633", "#006666", "#006699", "#0066CC", "#0066FF", "#3366FF", "#3366CC",
        "#336699", "#336666", "#336633", "#336600",
    ],
    [
        "#003300", "#003333", "#003366", "#003399", "#0033CC", "#0033FF", "#3333FF", "#3333CC",
        "#333399", "#333366", "#333333", "#333300",
    ],
    [
        "#000000", "#000033", "#000066", "#000099", "#0000CC", "#0000FF", "#3300FF", "#3300CC",
        "#330099", "#330066", "#330033", "#330000",
    ],
];

static HEX_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]*$").expect("valid hex input regex"));

/// Whether `value` may sit in a hex colour field while it is being typed.
pub fn is_hex_input(value: &str) -> bool {
    HEX_INPUT.is_match(value)
}

/// Exactly six hex digits, no `#`.
pub fn is_complete_hex(value: &str) -> bool {
    value.len() == 6 && is_hex_input(value)
}

pub fn parse_hex(value: &str) -> Option<(u8, u8, u8)> {
    let digits = value.trim().trim_start_matches('#');
    if !is_complete_hex(digits) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn to_color(value: &str) -> Option<Color> {
    parse_hex(value).map(|(r, g, b)| Color::Rgb(r, g, b))
}

/// HSL lightness of an RGB triple, as a percentage.
pub fn lightness((r, g, b): (u8, u8, u8)) -> f64 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    (f64::from(max) + f64::from(min)) / 2.0 / 255.0 * 100.0
}

pub fn invert((r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
    (255 - r, 255 - g, 255 - b)
}

/// Black or white, whichever reads on top of `background`.
///
/// The background is inverted first; a light inversion means a dark background.
pub fn contrast_text(background: &str) -> &'static str {
    let Some(rgb) = parse_hex(background) else {
        return "#FFFFFF";
    };
    if lightness(invert(rgb)) > 50.0 {
        "#FFFFFF"
    } else {
        "#000000"
    }
}

/// Cursor over the palette. Both axes wrap.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PickerCursor {
    pub column: usize,
    pub row: usize,
}

impl PickerCursor {
    /// Starts on the cell holding `hex` (with or without `#`, any case), or at the origin.
    pub fn seeded(hex: &str) -> Self {
        let wanted = format!("#{}", hex.trim().trim_start_matches('#').to_ascii_uppercase());
        for row in 0..ROWS {
            for column in 0..COLUMNS {
                if PALETTE[column][row] == wanted {
                    return Self { column, row };
                }
            }
        }
        Self::default()
    }

    pub fn up(&mut self) {
        self.row = (self.row + ROWS - 1) % ROWS;
    }

    pub fn down(&mut self) {
        self.row = (self.row + 1) % ROWS;
    }

    pub fn left(&mut self) {
        self.column = (self.column + COLUMNS - 1) % COLUMNS;
    }

    pub fn right(&mut self) {
        self.column = (self.column + 1) % COLUMNS;
    }

    /// The selected colour including its `#`.
    pub fn hex(&self) -> &'static str {
        PALETTE[self.column][self.row]
    }

    /// The selected colour as stored in a tag field.
    pub fn field_value(&self) -> String {
        self.hex().trim_start_matches('#').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_unique_cells() {
        let mut seen = std::collections::HashSet::new();
        for column in PALETTE {
            for cell in column {
                assert!(is_complete_hex(&cell[1..]), "{cell} should be hex");
                assert!(seen.insert(cell), "{cell} repeated");
            }
        }
        assert_eq!(seen.len(), COLUMNS * ROWS);
    }

    #[test]
    fn seed_finds_palette_member() {
        assert_eq!(PickerCursor::seeded("CCFF00"), PickerCursor { column: 0, row: 0 });
        assert_eq!(PickerCursor::seeded("ff0000"), PickerCursor { column: 5, row: 11 });
        assert_eq!(PickerCursor::seeded("#330000"), PickerCursor { column: 17, row: 11 });
    }

    #[test]
    fn seed_defaults_to_origin() {
        assert_eq!(PickerCursor::seeded("123456"), PickerCursor::default());
        assert_eq!(PickerCursor::seeded(""), PickerCursor::default());
    }

    #[test]
    fn cursor_wraps_both_axes() {
        let mut cursor = PickerCursor::default();
        cursor.up();
        assert_eq!(cursor.row, ROWS - 1);
        cursor.down();
        assert_eq!(cursor.row, 0);
        cursor.left();
        assert_eq!(cursor.column, COLUMNS - 1);
        cursor.right();
        assert_eq!(cursor.column, 0);
        assert_eq!(cursor.field_value(), "CCFF00");
    }

    #[test]
    fn contrast_picks_readable_text() {
        assert_eq!(contrast_text("#000000"), "#FFFFFF");
        assert_eq!(contrast_text("FFFFFF"), "#000000");
        assert_eq!(contrast_text("#0000FF"), "#000000");
        assert_eq!(contrast_text("#330000"), "#FFFFFF");
    }

    #[test]
    fn hex_validation() {
        assert!(is_hex_input(""));
        assert!(is_hex_input("aB09"));
        assert!(!is_hex_input("#FF"));
        assert!(!is_hex_input("GG"));
        assert!(is_complete_hex("00ff00"));
        assert!(!is_complete_hex("00ff0"));
        assert_eq!(parse_hex("#0A0B0C"), Some((10, 11, 12)));
        assert_eq!(to_color("nope"), None);
    }
}
