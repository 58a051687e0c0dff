//! X-Crafts E-Jets CDU
//!
//! The CDU is a bank of `XCrafts/FMS/CDU_<n>_NN` datarefs. Each value places
//! one run of text at an explicit position through a six digit prefix:
//!
//! ```text
//! 0 1 1 3 1 0 R T E
//! └┬┘ └┬┘ │ │ └─┬─┘
//!  │   │  │ │   └── text
//!  │   │  │ └────── colour digit
//!  │   │  └──────── size digit (1 = large)
//!  │   └─────────── column, 1-based
//!  └─────────────── row, 1-based
//! ```
//!
//! The aircraft never clears these datarefs, so text left by an earlier page
//! can still show through a shorter one. That is rendered as published.

use std::time::Duration;

use super::glyphs::{BALLOT_BOX, DEGREES};
use super::{AircraftDecoder, AircraftFamily};
use crate::grid::{CellColor, CellGrid, FontSize, Glyph, COLUMNS, ROWS};
use crate::snapshot::{DecodeError, Snapshot};
use crate::station::Station;

const PREFIX_LEN: usize = 6;

/// The E-Jets display stops rendering if frames arrive faster than this
const MIN_SEND_INTERVAL: Duration = Duration::from_millis(100);

/// One decoded packed value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedText {
    /// 0-based row
    pub row: usize,
    /// 0-based starting column
    pub col: usize,
    /// Font size
    pub size: FontSize,
    /// Colour
    pub color: CellColor,
    /// Text to place, trailing whitespace removed
    pub text: String,
}

/// Parse a packed `RRCCSK<text>` value
///
/// Returns `Ok(None)` for values with nothing to draw.
///
/// # Errors
///
/// [`DecodeError::MalformedPrefix`] if the first six characters are not
/// digits, [`DecodeError::OutOfGrid`] if the position is off the display.
pub fn parse_packed(name: &str, value: &str) -> Result<Option<PackedText>, DecodeError> {
    if value.trim().is_empty() {
        return Ok(None);
    }

    let malformed = || DecodeError::MalformedPrefix {
        name: name.to_string(),
        value: value.to_string(),
    };
    let prefix = value.get(..PREFIX_LEN).ok_or_else(malformed)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let field = |range: std::ops::Range<usize>| -> i32 {
        prefix[range].bytes().fold(0, |n, b| n * 10 + i32::from(b - b'0'))
    };
    let row = field(0..2) - 1;
    let col = field(2..4) - 1;
    if !(0..ROWS as i32).contains(&row) || !(0..COLUMNS as i32).contains(&col) {
        return Err(DecodeError::OutOfGrid {
            name: name.to_string(),
            row,
            col,
        });
    }

    let size = if &prefix[4..5] == "1" {
        FontSize::Large
    } else {
        FontSize::Normal
    };

    let text = value[PREFIX_LEN..].trim_end();
    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(PackedText {
        row: row as usize,
        col: col as usize,
        size,
        color: color_for_digit(field(5..6)),
        text: text.to_string(),
    }))
}

/// Colour for a packed colour digit
///
/// The digit meanings have not been mapped yet so every one renders white.
#[must_use]
pub fn color_for_digit(_digit: i32) -> CellColor {
    CellColor::White
}

/// Decoder for the X-Crafts E-Jets family
#[derive(Clone, Debug)]
pub struct XCraftsDecoder {
    station: Station,
    filter: String,
}

impl XCraftsDecoder {
    /// Create a decoder for a station's CDU
    #[must_use]
    pub fn new(station: Station) -> Self {
        Self {
            station,
            filter: format!("XCrafts/FMS/CDU_{}_", station.unit()),
        }
    }
}

impl AircraftDecoder for XCraftsDecoder {
    fn family(&self) -> AircraftFamily {
        AircraftFamily::XCrafts
    }

    fn station(&self) -> Station {
        self.station
    }

    fn subscribes_to(&self, name: &str) -> bool {
        name.contains(&self.filter)
    }

    fn decode(&self, snapshot: &Snapshot) -> CellGrid {
        let mut grid = CellGrid::new();

        for (name, value) in snapshot.texts().filter(|(name, _)| self.subscribes_to(name)) {
            let packed = match parse_packed(name, value) {
                Ok(Some(packed)) => packed,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping packed CDU value");
                    continue;
                }
            };

            for (offset, ch) in packed.text.chars().enumerate() {
                let col = packed.col + offset;
                if col >= COLUMNS {
                    break;
                }
                if ch == ' ' {
                    continue;
                }
                let ch = match ch {
                    '#' => BALLOT_BOX,
                    '*' => DEGREES,
                    other => other,
                };
                grid.set(packed.row, col, Glyph::new(ch, packed.color, packed.size));
            }
        }
        grid
    }

    fn min_send_interval(&self) -> Duration {
        MIN_SEND_INTERVAL
    }
}
