//! A lane is one bus service tied to exactly one computed route, plus the
//! logical bookkeeping for its per-propulsion-type markers.
//!
//! The marker lists here are the single source of truth: every mutation
//! returns the composite [`MarkerId`] involved, and callers use that same id
//! to place or remove the matching visual layer. The map side never has to
//! guess which layer belongs to which list entry.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BusRoute, Coordinate, LaneSnapshot, PropulsionType};

/// Registry-assigned lane identity. Distinct even when two lanes share a
/// service code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LaneId(pub u64);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane-{}", self.0)
    }
}

/// Composite marker identity: propulsion type, owning service code, and a
/// per-(lane, type) sequence number starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId {
    pub ptype: PropulsionType,
    pub service_code: String,
    pub seq: u32,
}

impl MarkerId {
    /// Identifier string carried by the visual layer's icon class. The map
    /// glue keys its layer handles off this exact shape, so it must not
    /// change.
    pub fn css_class(&self) -> String {
        format!("busIcon-{}-{}-{}", self.ptype, self.service_code, self.seq)
    }
}

/// Everything the map surface needs to place a freshly added marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPlacement {
    pub id: MarkerId,
    pub position: Coordinate,
    pub color: &'static str,
}

#[derive(Debug, Clone)]
pub struct BusLane {
    pub id: LaneId,
    pub line: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub service_code: String,
    pub route: BusRoute,
    markers: BTreeMap<PropulsionType, Vec<MarkerId>>,
    next_seq: BTreeMap<PropulsionType, u32>,
}

impl BusLane {
    pub fn from_snapshot(id: LaneId, snapshot: LaneSnapshot) -> Self {
        // Every lane carries all three propulsion keys for its whole life,
        // each starting as an empty list.
        let markers = PropulsionType::ALL.iter().map(|t| (*t, Vec::new())).collect();
        let next_seq = PropulsionType::ALL.iter().map(|t| (*t, 1)).collect();
        Self {
            id,
            line: snapshot.line,
            origin: snapshot.origin,
            destination: snapshot.destination,
            service_code: snapshot.service_code,
            route: snapshot.route_data,
            markers,
            next_seq,
        }
    }

    pub fn snapshot(&self) -> LaneSnapshot {
        LaneSnapshot {
            service_code: self.service_code.clone(),
            line: self.line.clone(),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            route_data: self.route.clone(),
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{} {} - {}",
            self.line.as_deref().unwrap_or("?"),
            self.origin.as_deref().unwrap_or("?"),
            self.destination.as_deref().unwrap_or("?"),
        )
    }

    pub fn coordinates_reverse(&self) -> Vec<Coordinate> {
        let mut coords = self.route.coordinates.clone();
        coords.reverse();
        coords
    }

    pub fn markers(&self, ptype: PropulsionType) -> &[MarkerId] {
        self.markers.get(&ptype).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn marker_count(&self, ptype: PropulsionType) -> usize {
        self.markers(ptype).len()
    }

    /// Appends a marker of the given type and returns where to place it:
    /// the route origin nudged by `offset_index / 5000` degrees on both axes
    /// so same-origin markers of different types stay distinguishable.
    /// Returns `None` when the route has no geometry to anchor to.
    pub fn add_marker(&mut self, ptype: PropulsionType) -> Option<MarkerPlacement> {
        let anchor = self.route.origin()?;
        let offset = ptype.offset_index() as f64 / 5000.0;

        let seq = self.next_seq.entry(ptype).or_insert(1);
        let id = MarkerId {
            ptype,
            service_code: self.service_code.clone(),
            seq: *seq,
        };
        *seq += 1;

        self.markers.entry(ptype).or_default().push(id.clone());
        Some(MarkerPlacement {
            id,
            position: Coordinate {
                lat: anchor.lat + offset,
                lng: anchor.lng + offset,
            },
            color: ptype.color(),
        })
    }

    /// Removes the marker with this exact id from its type's list.
    pub fn remove_marker(&mut self, id: &MarkerId) -> bool {
        let Some(list) = self.markers.get_mut(&id.ptype) else {
            return false;
        };
        match list.iter().position(|m| m == id) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes the most recently added marker of the given type, returning
    /// its id so the caller can drop the matching visual layer.
    pub fn pop_marker(&mut self, ptype: PropulsionType) -> Option<MarkerId> {
        self.markers.get_mut(&ptype)?.pop()
    }

    /// Drains every marker list, keeping the three type keys in place, and
    /// returns the removed ids for visual teardown.
    pub fn remove_all_markers(&mut self) -> Vec<MarkerId> {
        let mut removed = Vec::new();
        for list in self.markers.values_mut() {
            removed.append(list);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_lane() -> BusLane {
        let snapshot = LaneSnapshot {
            service_code: "X59".into(),
            line: Some("59".into()),
            origin: Some("St Andrews".into()),
            destination: Some("Dundee".into()),
            route_data: BusRoute {
                coordinates: vec![
                    Coordinate { lat: 56.0, lng: -3.0 },
                    Coordinate { lat: 56.1, lng: -3.1 },
                    Coordinate { lat: 56.2, lng: -3.0 },
                ],
                total_distance: 24_000.0,
                total_time: 2_100.0,
            },
        };
        BusLane::from_snapshot(LaneId(1), snapshot)
    }

    #[test]
    fn every_lane_starts_with_all_three_marker_keys_empty() {
        let lane = test_lane();
        for ptype in PropulsionType::ALL {
            assert_eq!(lane.marker_count(ptype), 0);
        }
    }

    #[test]
    fn ev_marker_is_offset_from_route_origin() {
        let mut lane = test_lane();
        let placement = lane.add_marker(PropulsionType::Ev).unwrap();
        assert!((placement.position.lat - 56.0002).abs() < 1e-9);
        assert!((placement.position.lng - (-2.9998)).abs() < 1e-9);
        assert_eq!(placement.color, "#588157");
    }

    #[test]
    fn ic_marker_sits_exactly_on_route_origin() {
        let mut lane = test_lane();
        let placement = lane.add_marker(PropulsionType::Ic).unwrap();
        assert_eq!(placement.position, Coordinate { lat: 56.0, lng: -3.0 });
    }

    #[test]
    fn css_class_embeds_type_service_code_and_sequence() {
        let mut lane = test_lane();
        let placement = lane.add_marker(PropulsionType::Hydrogen).unwrap();
        assert_eq!(placement.id.css_class(), "busIcon-Hydrogen-X59-1");
    }

    #[test]
    fn add_then_remove_restores_marker_count() {
        let mut lane = test_lane();
        lane.add_marker(PropulsionType::Ic).unwrap();
        let before = lane.marker_count(PropulsionType::Ic);

        let placement = lane.add_marker(PropulsionType::Ic).unwrap();
        assert_eq!(lane.marker_count(PropulsionType::Ic), before + 1);

        assert!(lane.remove_marker(&placement.id));
        assert_eq!(lane.marker_count(PropulsionType::Ic), before);
    }

    #[test]
    fn remove_marker_is_id_indexed_not_lifo() {
        let mut lane = test_lane();
        let first = lane.add_marker(PropulsionType::Ev).unwrap();
        let second = lane.add_marker(PropulsionType::Ev).unwrap();

        assert!(lane.remove_marker(&first.id));
        assert_eq!(lane.markers(PropulsionType::Ev), &[second.id.clone()]);

        // Removing it again is a no-op.
        assert!(!lane.remove_marker(&first.id));
    }

    #[test]
    fn pop_marker_returns_most_recent_id() {
        let mut lane = test_lane();
        lane.add_marker(PropulsionType::Hydrogen).unwrap();
        let latest = lane.add_marker(PropulsionType::Hydrogen).unwrap();

        assert_eq!(lane.pop_marker(PropulsionType::Hydrogen), Some(latest.id));
        assert_eq!(lane.marker_count(PropulsionType::Hydrogen), 1);
    }

    #[test]
    fn sequence_numbers_are_never_reused() {
        let mut lane = test_lane();
        lane.add_marker(PropulsionType::Ic).unwrap();
        let second = lane.add_marker(PropulsionType::Ic).unwrap();
        lane.pop_marker(PropulsionType::Ic);

        let third = lane.add_marker(PropulsionType::Ic).unwrap();
        assert_eq!(second.id.seq, 2);
        assert_eq!(third.id.seq, 3);
    }

    #[test]
    fn remove_all_markers_returns_ids_and_keeps_keys() {
        let mut lane = test_lane();
        lane.add_marker(PropulsionType::Ic).unwrap();
        lane.add_marker(PropulsionType::Ev).unwrap();
        lane.add_marker(PropulsionType::Ev).unwrap();

        let removed = lane.remove_all_markers();
        assert_eq!(removed.len(), 3);
        for ptype in PropulsionType::ALL {
            assert_eq!(lane.marker_count(ptype), 0);
        }
        // Keys survive the clear, so counts keep answering for all types.
        assert!(lane.add_marker(PropulsionType::Hydrogen).is_some());
    }

    #[test]
    fn add_marker_on_empty_route_is_refused() {
        let snapshot = LaneSnapshot {
            service_code: "void".into(),
            line: None,
            origin: None,
            destination: None,
            route_data: BusRoute {
                coordinates: vec![],
                total_distance: 0.0,
                total_time: 0.0,
            },
        };
        let mut lane = BusLane::from_snapshot(LaneId(7), snapshot);
        assert!(lane.add_marker(PropulsionType::Ev).is_none());
        assert_eq!(lane.marker_count(PropulsionType::Ev), 0);
    }

    #[test]
    fn label_and_reverse_coordinates() {
        let lane = test_lane();
        assert_eq!(lane.label(), "59 St Andrews - Dundee");

        let reversed = lane.coordinates_reverse();
        assert_eq!(reversed.first(), lane.route.coordinates.last());
        assert_eq!(reversed.last(), lane.route.coordinates.first());
    }
}
