//! Aircraft Decoders
//!
//! Every supported aircraft publishes its CDU screen through a different
//! dataref scheme. A decoder turns a [`Snapshot`] of those datarefs into the
//! uniform [`CellGrid`] the display understands.
//!
//! # Families
//!
//! | Family | Scheme |
//! |--------|--------|
//! | [`ZiboDecoder`] | one dataref per line and colour, role in the name suffix |
//! | [`FlightFactorDecoder`] | three positional arrays (symbols, sizes, colours) |
//! | [`XCraftsDecoder`] | packed `RRCCSK` coordinate prefix per value |
//! | [`ToLissDecoder`] | suffix-coded labels, symbol datarefs and a slew-key enum |
//!
//! Decoders are a pure stage: no I/O, no clocks, and the same snapshot always
//! yields the same grid. The family is chosen from configuration at startup.

mod glyphs;
mod layout;

pub mod flightfactor;
pub mod toliss;
pub mod xcrafts;
pub mod zibo;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grid::CellGrid;
use crate::snapshot::{decode_raw_value, DatarefValue, DecodeError, Snapshot};
use crate::station::Station;

pub use flightfactor::FlightFactorDecoder;
pub use toliss::ToLissDecoder;
pub use xcrafts::XCraftsDecoder;
pub use zibo::ZiboDecoder;

/// Per-aircraft translation from datarefs to the display grid
pub trait AircraftDecoder: Send + Sync + fmt::Debug {
    /// Aircraft family this decoder belongs to
    fn family(&self) -> AircraftFamily;

    /// Station whose CDU this decoder reads
    fn station(&self) -> Station;

    /// Whether a catalog entry belongs to this decoder's CDU
    fn subscribes_to(&self, name: &str) -> bool;

    /// Decode one raw subscription value
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the value cannot be decoded. The caller
    /// skips that dataref and keeps the rest of the message.
    fn decode_value(&self, name: &str, raw: &Value) -> Result<DatarefValue, DecodeError> {
        decode_raw_value(name, raw)
    }

    /// Render a snapshot into a grid
    fn decode(&self, snapshot: &Snapshot) -> CellGrid;

    /// Minimum spacing between display frames this aircraft needs
    fn min_send_interval(&self) -> Duration {
        Duration::ZERO
    }
}

/// Closed set of supported aircraft
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AircraftFamily {
    /// ToLiss A319/A320/A321/A340
    ToLiss,
    /// Zibo 737-800X
    Zibo,
    /// FlightFactor 757/767
    FlightFactor,
    /// X-Crafts E-Jets
    XCrafts,
}

impl AircraftFamily {
    /// Every supported family
    pub const ALL: [AircraftFamily; 4] = [
        AircraftFamily::ToLiss,
        AircraftFamily::Zibo,
        AircraftFamily::FlightFactor,
        AircraftFamily::XCrafts,
    ];

    /// Configuration name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ToLiss => "toliss",
            Self::Zibo => "zibo",
            Self::FlightFactor => "flightfactor",
            Self::XCrafts => "xcrafts",
        }
    }

    /// Stations this aircraft drives
    #[must_use]
    pub fn stations(self) -> &'static [Station] {
        &[Station::Captain, Station::CoPilot]
    }

    /// Whether the aircraft drives a station
    #[must_use]
    pub fn supports(self, station: Station) -> bool {
        self.stations().contains(&station)
    }

    /// Build the decoder for one station
    ///
    /// Returns `None` for stations the aircraft does not drive.
    #[must_use]
    pub fn decoder(self, station: Station) -> Option<Arc<dyn AircraftDecoder>> {
        if !self.supports(station) {
            return None;
        }
        let decoder: Arc<dyn AircraftDecoder> = match self {
            Self::ToLiss => Arc::new(ToLissDecoder::new(station)),
            Self::Zibo => Arc::new(ZiboDecoder::new(station)),
            Self::FlightFactor => Arc::new(FlightFactorDecoder::new(station)),
            Self::XCrafts => Arc::new(XCraftsDecoder::new(station)),
        };
        Some(decoder)
    }
}

impl fmt::Display for AircraftFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AircraftFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "toliss" | "a3xx" => Ok(Self::ToLiss),
            "zibo" | "b738" => Ok(Self::Zibo),
            "flightfactor" | "ff" => Ok(Self::FlightFactor),
            "xcrafts" | "ejets" => Ok(Self::XCrafts),
            other => Err(format!("unknown aircraft '{other}'")),
        }
    }
}
