//! Display Stations
//!
//! A station is one physical CDU on the peripheral side. Each station has its
//! own display socket endpoint and gets its own independent pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A physical/logical display unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Station {
    /// Left seat
    Captain,
    /// Right seat
    CoPilot,
    /// Jump seat
    Observer,
}

impl Station {
    /// Every station the peripheral protocol knows about
    pub const ALL: [Station; 3] = [Station::Captain, Station::CoPilot, Station::Observer];

    /// Path segment of the display endpoint (`/winwing/cdu-<segment>`)
    #[must_use]
    pub fn endpoint_name(self) -> &'static str {
        match self {
            Self::Captain => "captain",
            Self::CoPilot => "co-pilot",
            Self::Observer => "observer",
        }
    }

    /// 1-based unit number simulators use in dataref names
    #[must_use]
    pub fn unit(self) -> u8 {
        match self {
            Self::Captain => 1,
            Self::CoPilot => 2,
            Self::Observer => 3,
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint_name())
    }
}

impl FromStr for Station {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "captain" | "capt" | "left" => Ok(Self::Captain),
            "co-pilot" | "copilot" | "fo" | "right" => Ok(Self::CoPilot),
            "observer" | "obs" => Ok(Self::Observer),
            other => Err(format!("unknown station '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_names() {
        assert_eq!(Station::Captain.endpoint_name(), "captain");
        assert_eq!(Station::CoPilot.endpoint_name(), "co-pilot");
        assert_eq!(Station::Observer.endpoint_name(), "observer");
    }

    #[test]
    fn test_parse() {
        assert_eq!("Co-Pilot".parse::<Station>(), Ok(Station::CoPilot));
        assert_eq!("captain".parse::<Station>(), Ok(Station::Captain));
        assert!("purser".parse::<Station>().is_err());
    }

    #[test]
    fn test_serde_uses_endpoint_names() {
        let json = serde_json::to_string(&Station::CoPilot).unwrap();
        assert_eq!(json, "\"co-pilot\"");
    }
}
