//! ToLiss A3xx MCDU
//!
//! Datarefs are named `AirbusFBW/MCDU<n><kind><line><colour>`, e.g.
//! `AirbusFBW/MCDU1cont3g` or `AirbusFBW/MCDU1label6s`. The final letter is a
//! colour, except `s` which marks a symbol dataref whose characters are codes
//! for arrows, brackets and boxes. The vertical slew indicator is published as
//! a small enum rather than text.

use serde_json::Value;

use super::glyphs::{
    BALLOT_BOX, DEGREES, DOWN_ARROW, GREEK_DELTA, LEFT_ARROW, RIGHT_ARROW, UP_ARROW,
};
use super::layout::{render_lines, LineScheme, RowRole, SCRATCHPAD_LINE};
use super::{AircraftDecoder, AircraftFamily};
use crate::grid::{CellColor, CellGrid, FontSize, Glyph, COLUMNS};
use crate::snapshot::{decode_raw_value, DatarefValue, DecodeError, Snapshot};
use crate::station::Station;

/// Decoder for the ToLiss A319/A320/A321/A340 family
#[derive(Clone, Debug)]
pub struct ToLissDecoder {
    station: Station,
    prefix: String,
    scratchpad: [String; 2],
    slew_keys: String,
}

impl ToLissDecoder {
    /// Create a decoder for a station's MCDU
    #[must_use]
    pub fn new(station: Station) -> Self {
        let prefix = format!("AirbusFBW/MCDU{}", station.unit());
        Self {
            station,
            scratchpad: [format!("{prefix}spa"), format!("{prefix}spw")],
            slew_keys: format!("{prefix}VertSlewKeys"),
            prefix,
        }
    }

    /// Name of the vertical slew indicator dataref
    #[must_use]
    pub fn slew_keys_dataref(&self) -> &str {
        &self.slew_keys
    }

    fn is_symbol(name: &str) -> bool {
        name.ends_with('s')
    }
}

/// Text shown for the vertical slew key state
#[must_use]
pub fn slew_keys_text(state: i64) -> String {
    let arrows = match state {
        1 => format!("{UP_ARROW}{DOWN_ARROW}"),
        2 => format!("{UP_ARROW} "),
        3 => DOWN_ARROW.to_string(),
        _ => String::new(),
    };
    format!("{arrows:>width$}", width = COLUMNS)
}

/// Slew state from a raw feed value; the simulator may publish it as a float
#[allow(clippy::cast_possible_truncation)]
fn slew_state(name: &str, raw: &Value) -> Result<i64, DecodeError> {
    raw.as_i64()
        .or_else(|| raw.as_f64().map(|v| v as i64))
        .ok_or_else(|| DecodeError::UnsupportedValue {
            name: name.to_string(),
            value: raw.to_string(),
        })
}

fn content_char(ch: char) -> char {
    match ch {
        '`' => DEGREES,
        '|' => GREEK_DELTA,
        other => other,
    }
}

fn symbol_char(ch: char) -> char {
    match ch {
        'A' => '[',
        'B' => ']',
        'E' => BALLOT_BOX,
        '0' | '2' | '4' => LEFT_ARROW,
        '1' | '3' | '5' => RIGHT_ARROW,
        'C' => UP_ARROW,
        'D' => DOWN_ARROW,
        other => content_char(other),
    }
}

fn suffix_color(suffix: char) -> CellColor {
    match suffix {
        'b' => CellColor::Cyan,
        other => CellColor::from_code(other).unwrap_or(CellColor::White),
    }
}

impl LineScheme for ToLissDecoder {
    fn line_of(&self, name: &str) -> Option<u8> {
        if name.contains("title") {
            return Some(0);
        }
        if self.scratchpad.iter().any(|s| s == name) || name == self.slew_keys {
            return Some(SCRATCHPAD_LINE);
        }
        let rest = name.strip_prefix(&self.prefix)?;
        rest.chars()
            .rev()
            .find_map(|c| c.to_digit(10))
            .map(|d| d as u8)
    }

    fn fills(&self, name: &str, role: RowRole) -> bool {
        match role {
            RowRole::Single => true,
            RowRole::Label => name.contains("label"),
            RowRole::Content => name.contains("cont"),
        }
    }

    fn glyph(&self, name: &str, ch: char) -> Glyph {
        let symbol = Self::is_symbol(name);

        let color = if (symbol && (name.contains("label") || name.contains("title")))
            || name == self.slew_keys
        {
            CellColor::White
        } else if symbol {
            match ch {
                'E' | '4' | '5' => CellColor::Amber,
                _ => CellColor::Cyan,
            }
        } else {
            name.chars().last().map_or(CellColor::White, suffix_color)
        };

        let size = if name.contains("scont") || (name.contains("label") && !name.contains("labelL")) {
            FontSize::Large
        } else {
            FontSize::Normal
        };

        let ch = if symbol { symbol_char(ch) } else { content_char(ch) };
        Glyph::new(ch, color, size)
    }
}

impl AircraftDecoder for ToLissDecoder {
    fn family(&self) -> AircraftFamily {
        AircraftFamily::ToLiss
    }

    fn station(&self) -> Station {
        self.station
    }

    fn subscribes_to(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    fn decode_value(&self, name: &str, raw: &Value) -> Result<DatarefValue, DecodeError> {
        if name == self.slew_keys {
            return Ok(DatarefValue::Text(slew_keys_text(slew_state(name, raw)?)));
        }
        decode_raw_value(name, raw)
    }

    fn decode(&self, snapshot: &Snapshot) -> CellGrid {
        render_lines(self, snapshot)
    }
}
