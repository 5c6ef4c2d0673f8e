//! Track storage
//!
//! Positions are grouped by the client-chosen track id and kept in the order
//! the broker received them. Without a cap, tracks grow for the life of the
//! process.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One position sample. `time` is always the server's receipt time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub track: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: HashMap<String, VecDeque<Position>>,
    /// Per-track cap; 0 means unbounded.
    max_positions: usize,
}

impl TrackStore {
    pub fn new(max_positions: usize) -> Self {
        Self {
            tracks: HashMap::new(),
            max_positions,
        }
    }

    /// Append to the position's track, creating the track if unseen.
    /// Returns the track's length afterwards.
    pub fn append(&mut self, position: Position) -> usize {
        let track = self.tracks.entry(position.track.clone()).or_default();
        track.push_back(position);
        if self.max_positions > 0 {
            while track.len() > self.max_positions {
                track.pop_front();
            }
        }
        track.len()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, track: &str) -> Option<&VecDeque<Position>> {
        self.tracks.get(track)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn position_count(&self) -> usize {
        self.tracks.values().map(VecDeque::len).sum()
    }

    /// Deep copy of every track, ordered by track id.
    pub fn to_map(&self) -> BTreeMap<String, Vec<Position>> {
        self.tracks
            .iter()
            .map(|(id, positions)| (id.clone(), positions.iter().cloned().collect()))
            .collect()
    }
}
