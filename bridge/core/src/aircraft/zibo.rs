//! Zibo 737-800X FMC
//!
//! One dataref per logical line and colour: `laminar/B738/fmc1/Line03_L`,
//! `Line03_GX`, `Line_entry`. The text after the last `_` selects colour and
//! row role; label datarefs end in `X`.

use super::glyphs::{BALLOT_BOX, DEGREES};
use super::layout::{render_lines, LineScheme, RowRole, SCRATCHPAD_LINE};
use super::{AircraftDecoder, AircraftFamily};
use crate::grid::{CellColor, CellGrid, FontSize, Glyph};
use crate::snapshot::Snapshot;
use crate::station::Station;

const LABEL_SUFFIXES: [&str; 3] = ["_X", "_LX", "_GX"];
const CONTENT_SUFFIXES: [&str; 6] = ["_G", "_L", "_M", "_S", "_I", "_SI"];

/// Decoder for the Zibo 737
#[derive(Clone, Debug)]
pub struct ZiboDecoder {
    station: Station,
    prefix: String,
}

impl ZiboDecoder {
    /// Create a decoder for a station's FMC
    #[must_use]
    pub fn new(station: Station) -> Self {
        Self {
            station,
            prefix: format!("laminar/B738/fmc{}/", station.unit()),
        }
    }
}

fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn color(name: &str) -> CellColor {
    let suffix = name.rsplit('_').next().unwrap_or_default();
    match suffix {
        "GX" | "G" => CellColor::Green,
        "C" => CellColor::Cyan,
        "I" => CellColor::Grey,
        "M" => CellColor::Magenta,
        _ => CellColor::White,
    }
}

impl LineScheme for ZiboDecoder {
    fn line_of(&self, name: &str) -> Option<u8> {
        let short = short_name(name);
        if short.starts_with("Line_entry") {
            return Some(SCRATCHPAD_LINE);
        }
        short.get(4..6)?.parse().ok()
    }

    fn fills(&self, name: &str, role: RowRole) -> bool {
        match role {
            RowRole::Single => true,
            RowRole::Label => LABEL_SUFFIXES.iter().any(|s| name.ends_with(s)),
            RowRole::Content => CONTENT_SUFFIXES.iter().any(|s| name.ends_with(s)),
        }
    }

    fn glyph(&self, name: &str, ch: char) -> Glyph {
        let ch = match ch {
            '`' => DEGREES,
            '*' => BALLOT_BOX,
            other => other,
        };
        let size = if name.ends_with('X') || name.ends_with('S') {
            FontSize::Large
        } else {
            FontSize::Normal
        };
        Glyph::new(ch, color(name), size)
    }
}

impl AircraftDecoder for ZiboDecoder {
    fn family(&self) -> AircraftFamily {
        AircraftFamily::Zibo
    }

    fn station(&self) -> Station {
        self.station
    }

    fn subscribes_to(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    fn decode(&self, snapshot: &Snapshot) -> CellGrid {
        render_lines(self, snapshot)
    }
}
