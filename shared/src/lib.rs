pub mod costing;
pub mod geometry;
pub mod lane;
pub mod registry;

pub use lane::{BusLane, LaneId, MarkerId, MarkerPlacement};
pub use registry::LaneRegistry;

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Geometry plus summary as returned by the directions service. Immutable
/// once built; owned by the lane that requested it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusRoute {
    pub coordinates: Vec<Coordinate>,
    /// Meters.
    pub total_distance: f64,
    /// Seconds.
    pub total_time: f64,
}

impl BusRoute {
    pub fn origin(&self) -> Option<Coordinate> {
        self.coordinates.first().copied()
    }
}

/// Bus propulsion types. `Hybrid` appears in older lane payloads as a
/// synonym for the hydrogen fleet and is accepted on input only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropulsionType {
    #[serde(rename = "IC")]
    Ic,
    #[serde(rename = "EV")]
    Ev,
    #[serde(alias = "Hybrid")]
    Hydrogen,
}

impl PropulsionType {
    pub const ALL: [PropulsionType; 3] =
        [PropulsionType::Ic, PropulsionType::Ev, PropulsionType::Hydrogen];

    pub fn wire_name(self) -> &'static str {
        match self {
            PropulsionType::Ic => "IC",
            PropulsionType::Ev => "EV",
            PropulsionType::Hydrogen => "Hydrogen",
        }
    }

    /// Display color of the bus icon for this type.
    pub fn color(self) -> &'static str {
        match self {
            PropulsionType::Ic => "#fb5607",
            PropulsionType::Ev => "#588157",
            PropulsionType::Hydrogen => "#3a86ff",
        }
    }

    /// Per-type slot used to fan out same-origin markers so they don't
    /// overlap exactly.
    pub fn offset_index(self) -> usize {
        match self {
            PropulsionType::Ic => 0,
            PropulsionType::Ev => 1,
            PropulsionType::Hydrogen => 2,
        }
    }
}

impl fmt::Display for PropulsionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    /// Ordered stops to route through; at least two are required.
    pub waypoints: Vec<Coordinate>,
    pub service_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Serialized shape of a lane: the routing response body, the cache
/// payload, and the `route-data/{serviceCode}.json` seed files all share it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneSnapshot {
    pub service_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub route_data: BusRoute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
