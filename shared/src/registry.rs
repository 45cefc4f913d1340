//! Ordered collection of lanes. Insertion order is load-bearing: it is the
//! legend/chart order everywhere lanes are listed.

use crate::lane::{BusLane, LaneId};
use crate::LaneSnapshot;

#[derive(Debug, Default)]
pub struct LaneRegistry {
    lanes: Vec<BusLane>,
    next_id: u64,
}

impl LaneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lane built from a successful routing result and returns its
    /// id. Duplicate service codes are kept as independent lanes.
    pub fn add_lane(&mut self, snapshot: LaneSnapshot) -> LaneId {
        self.next_id += 1;
        let id = LaneId(self.next_id);
        self.lanes.push(BusLane::from_snapshot(id, snapshot));
        id
    }

    /// Clears the registry and hands back the drained lanes so the caller
    /// can tear down their visual layers.
    pub fn remove_all_lanes(&mut self) -> Vec<BusLane> {
        std::mem::take(&mut self.lanes)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lanes(&self) -> &[BusLane] {
        &self.lanes
    }

    pub fn lane(&self, id: LaneId) -> Option<&BusLane> {
        self.lanes.iter().find(|lane| lane.id == id)
    }

    pub fn lane_mut(&mut self, id: LaneId) -> Option<&mut BusLane> {
        self.lanes.iter_mut().find(|lane| lane.id == id)
    }
}
