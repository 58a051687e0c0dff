//! FlightFactor 757/767 CDU
//!
//! The whole screen arrives as three positional strings of one character per
//! cell: `symbols`, `symbolsSize` and `symbolsColor`, all under
//! `1-sim/cduL/display/` (captain) or `1-sim/cduR/display/` (co-pilot).

use super::glyphs::{BALLOT_BOX, DEGREES};
use super::{AircraftDecoder, AircraftFamily};
use crate::grid::{CellColor, CellGrid, FontSize, Glyph, CELL_COUNT, COLUMNS};
use crate::snapshot::Snapshot;
use crate::station::Station;

/// Decoder for the FlightFactor 757/767
#[derive(Clone, Debug)]
pub struct FlightFactorDecoder {
    station: Station,
    symbols: String,
    sizes: String,
}

impl FlightFactorDecoder {
    /// Create a decoder for a station's CDU
    #[must_use]
    pub fn new(station: Station) -> Self {
        let side = match station {
            Station::CoPilot => 'R',
            _ => 'L',
        };
        let symbols = format!("1-sim/cdu{side}/display/symbols");
        Self {
            station,
            sizes: format!("{symbols}Size"),
            symbols,
        }
    }

    /// Name of the positional symbols dataref
    #[must_use]
    pub fn symbols_dataref(&self) -> &str {
        &self.symbols
    }
}

fn translate(ch: char) -> char {
    match ch {
        '\u{1d}' => BALLOT_BOX,
        '\u{1c}' => DEGREES,
        other => other,
    }
}

impl AircraftDecoder for FlightFactorDecoder {
    fn family(&self) -> AircraftFamily {
        AircraftFamily::FlightFactor
    }

    fn station(&self) -> Station {
        self.station
    }

    fn subscribes_to(&self, name: &str) -> bool {
        name.contains(&self.symbols)
    }

    fn decode(&self, snapshot: &Snapshot) -> CellGrid {
        let mut grid = CellGrid::new();
        let Some(symbols) = snapshot.text(&self.symbols) else {
            return grid;
        };
        let mut sizes = snapshot.text(&self.sizes).unwrap_or_default().chars();

        for (index, ch) in symbols.chars().take(CELL_COUNT).enumerate() {
            let size = match sizes.next() {
                Some(' ' | '0') | None => FontSize::Normal,
                Some(_) => FontSize::Large,
            };
            if ch == ' ' {
                continue;
            }
            grid.set(
                index / COLUMNS,
                index % COLUMNS,
                Glyph::new(translate(ch), CellColor::Green, size),
            );
        }
        grid
    }
}
