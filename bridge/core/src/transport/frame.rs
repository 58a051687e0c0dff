//! Wire Messages
//!
//! JSON shapes exchanged with the simulator's REST/WebSocket API and with the
//! display peripheral.
//!
//! # Simulator
//!
//! ```text
//! GET  /api/v2/datarefs        -> {"data": [{"id": 17, "name": "..."}]}
//! WS   /api/v2  (send)         <- {"type": "dataref_subscribe_values", "req_id": 1,
//!                                  "params": {"datarefs": [{"id": 17}]}}
//! WS   /api/v2  (receive)      -> {"data": {"17": "<base64>" | 3}}
//! ```
//!
//! # Display
//!
//! ```text
//! WS   /winwing/cdu-<station>  <- {"Target": "Display", "Data": [[], ["R", "w", 1], ...]}
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TransportError;
use crate::grid::CellGrid;
use crate::snapshot::Catalog;

/// Request id sent with every subscription
pub const SUBSCRIBE_REQ_ID: u64 = 1;

/// One catalog entry
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Subscription id
    pub id: u64,
    /// Dataref name
    pub name: String,
}

/// Response body of the catalog endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogResponse {
    /// Every dataref the simulator knows
    pub data: Vec<CatalogEntry>,
}

impl CatalogResponse {
    /// Keep only entries accepted by `filter`, trimming names
    pub fn into_catalog(self, filter: impl Fn(&str) -> bool) -> Catalog {
        Catalog::from_entries(
            self.data
                .into_iter()
                .map(|entry| (entry.id, entry.name.trim().to_string()))
                .filter(|(_, name)| filter(name)),
        )
    }
}

/// Dataref reference inside a subscribe request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatarefRef {
    /// Subscription id
    pub id: u64,
}

/// Parameters of a subscribe request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribeParams {
    /// Datarefs to stream
    pub datarefs: Vec<DatarefRef>,
}

/// Subscribe request sent once per feed connection
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribeRequest {
    /// Always `dataref_subscribe_values`
    #[serde(rename = "type")]
    pub kind: String,
    /// Request correlation id
    pub req_id: u64,
    /// Request parameters
    pub params: SubscribeParams,
}

impl SubscribeRequest {
    /// Subscribe to every id in a catalog
    #[must_use]
    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self {
            kind: "dataref_subscribe_values".to_string(),
            req_id: SUBSCRIBE_REQ_ID,
            params: SubscribeParams {
                datarefs: catalog.ids().into_iter().map(|id| DatarefRef { id }).collect(),
            },
        }
    }
}

/// Any message pushed by the simulator socket
///
/// Only messages with a `data` object carry values; acknowledgements and
/// results are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InboundMessage {
    /// Raw values keyed by subscription id
    #[serde(default)]
    pub data: Option<HashMap<String, Value>>,
}

impl InboundMessage {
    /// Parse a text frame
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Serialization`] for malformed JSON.
    pub fn parse(text: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Values with numeric ids, in ascending id order
    ///
    /// Keys that are not numbers are dropped.
    #[must_use]
    pub fn values(&self) -> Vec<(u64, &Value)> {
        let mut values: Vec<(u64, &Value)> = self
            .data
            .iter()
            .flatten()
            .filter_map(|(id, value)| id.parse().ok().map(|id| (id, value)))
            .collect();
        values.sort_unstable_by_key(|(id, _)| *id);
        values
    }
}

/// Frame sent to the display peripheral
#[derive(Debug, Serialize)]
pub struct DisplayFrame<'a> {
    /// Always `Display`
    #[serde(rename = "Target")]
    pub target: &'static str,
    /// The 336 cells
    #[serde(rename = "Data")]
    pub data: &'a CellGrid,
}

impl<'a> DisplayFrame<'a> {
    /// Wrap a grid
    #[must_use]
    pub fn new(grid: &'a CellGrid) -> Self {
        Self {
            target: "Display",
            data: grid,
        }
    }
}

/// Encode a grid as a display text frame
///
/// # Errors
///
/// Returns [`TransportError::Serialization`] if encoding fails.
pub fn encode_display_frame(grid: &CellGrid) -> Result<String, TransportError> {
    Ok(serde_json::to_string(&DisplayFrame::new(grid))?)
}

/// Encode the subscribe request for a catalog
///
/// # Errors
///
/// Returns [`TransportError::Serialization`] if encoding fails.
pub fn encode_subscribe(catalog: &Catalog) -> Result<String, TransportError> {
    Ok(serde_json::to_string(&SubscribeRequest::for_catalog(catalog))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellColor, FontSize, Glyph, CELL_COUNT};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_subscribe_shape() {
        let catalog = Catalog::from_entries([(12, "b".to_string()), (4, "a".to_string())]);
        let encoded: Value = serde_json::from_str(&encode_subscribe(&catalog).unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "dataref_subscribe_values",
                "req_id": 1,
                "params": {"datarefs": [{"id": 4}, {"id": 12}]}
            })
        );
    }

    #[test]
    fn test_display_frame_shape() {
        let mut grid = CellGrid::new();
        grid.set(0, 1, Glyph::new('R', CellColor::White, FontSize::Large));

        let encoded: Value = serde_json::from_str(&encode_display_frame(&grid).unwrap()).unwrap();
        assert_eq!(encoded["Target"], "Display");
        let data = encoded["Data"].as_array().unwrap();
        assert_eq!(data.len(), CELL_COUNT);
        assert_eq!(data[0], json!([]));
        assert_eq!(data[1], json!(["R", "w", 1]));
    }

    #[test]
    fn test_inbound_without_data() {
        let msg = InboundMessage::parse(r#"{"type":"result","req_id":1,"success":true}"#).unwrap();
        assert!(msg.data.is_none());
        assert!(msg.values().is_empty());
    }

    #[test]
    fn test_inbound_values_sorted_and_numeric() {
        let msg = InboundMessage::parse(r#"{"data":{"9":"QQ==","2":3,"x":1}}"#).unwrap();
        let values = msg.values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], (2, &json!(3)));
        assert_eq!(values[1].0, 9);
    }

    #[test]
    fn test_inbound_rejects_garbage() {
        assert!(matches!(
            InboundMessage::parse("not json"),
            Err(TransportError::Serialization(_))
        ));
    }

    #[test]
    fn test_catalog_filter_trims_names() {
        let response: CatalogResponse = serde_json::from_value(json!({
            "data": [
                {"id": 1, "name": "XCrafts/FMS/CDU_1_01 "},
                {"id": 2, "name": "sim/cockpit/radios/com1"}
            ]
        }))
        .unwrap();
        let catalog = response.into_catalog(|name| name.contains("XCrafts/FMS/CDU_1_"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.name(1), Some("XCrafts/FMS/CDU_1_01"));
    }
}
