//! Index-addressed storage for tracks.
//!
//! Tracks live in slots; a [`TrackId`] carries the slot index plus the slot
//! generation, so ids and [`PointRef`]s held after a removal resolve to
//! `None` instead of naming whatever track reuses the slot.

use serde::{Deserialize, Serialize};

use super::control::PointRef;
use super::path::Track;
use crate::error::ConfigError;
use crate::sim::Vector2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId {
    index: u32,
    generation: u32,
}

impl TrackId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    track: Option<Track>,
}

/// Maps a path parameter on a track that was merged away onto the merged track.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParamMap {
    pub source: TrackId,
    source_max: f64,
    offset: f64,
    pub reversed: bool,
}

impl ParamMap {
    pub fn apply(&self, u: f64) -> f64 {
        if self.reversed {
            self.offset + (self.source_max - u)
        } else {
            self.offset + u
        }
    }
}

/// Result of merging two tracks.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Join {
    pub merged: TrackId,
    pub maps: [ParamMap; 2],
}

impl Join {
    pub fn map_for(&self, source: TrackId) -> Option<&ParamMap> {
        self.maps.iter().find(|m| m.source == source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, track: Track) -> TrackId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.track = Some(track);
            return TrackId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            track: Some(track),
        });
        TrackId {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let track = slot.track.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(track)
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.track.as_ref())
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.track.as_mut())
    }

    pub fn require(&self, id: TrackId) -> Result<&Track, ConfigError> {
        self.get(id).ok_or(ConfigError::UnknownTrack(id))
    }

    pub fn require_mut(&mut self, id: TrackId) -> Result<&mut Track, ConfigError> {
        self.get_mut(id).ok_or(ConfigError::UnknownTrack(id))
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &Track)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.track.as_ref().map(|track| {
                (
                    TrackId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    track,
                )
            })
        })
    }

    /// Tracks the rider may attach to.
    pub fn traversable(&self) -> impl Iterator<Item = (TrackId, &Track)> {
        self.iter().filter(|(_, track)| track.is_traversable())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.track.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
    }

    /// Position of the referenced control point, if it still exists.
    pub fn resolve(&self, point: PointRef) -> Option<Vector2> {
        self.get(point.track)
            .and_then(|track| track.control_points().get(point.index))
            .map(|p| p.position)
    }

    /// Re-links the end points of `id` with the nearest end point of any other
    /// track within `radius`, in both directions.
    pub fn refresh_snap_targets(&mut self, id: TrackId, radius: f64) -> Result<(), ConfigError> {
        let track = self.require(id)?;
        let last = track.len() - 1;
        let ends = [(0, track.control_points()[0].position), (last, track.control_points()[last].position)];

        let mut updates = Vec::new();
        for (end_index, position) in ends {
            let previous = track.snap_target(end_index);
            let candidate = self
                .iter()
                .filter(|(other, _)| *other != id)
                .flat_map(|(other, other_track)| {
                    let other_last = other_track.len() - 1;
                    [0, other_last].into_iter().map(move |i| {
                        (
                            PointRef::new(other, i),
                            other_track.control_points()[i].position.distance(position),
                        )
                    })
                })
                .filter(|(_, dist)| *dist <= radius)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(point, _)| point);
            updates.push((PointRef::new(id, end_index), previous, candidate));
        }

        for (own, previous, candidate) in updates {
            if let Some(prev) = previous.filter(|p| Some(*p) != candidate) {
                // Drop the back link only if it still points at us.
                if let Some(other) = self.get_mut(prev.track) {
                    if other.snap_target(prev.index) == Some(own) {
                        other.set_snap_target(prev.index, None)?;
                    }
                }
            }
            self.require_mut(own.track)?
                .set_snap_target(own.index, candidate)?;
            if let Some(target) = candidate {
                self.require_mut(target.track)?
                    .set_snap_target(target.index, Some(own))?;
            }
        }
        Ok(())
    }

    /// Merges two tracks whose end points are snapped to each other.
    ///
    /// The joined end points collapse into their midpoint. The merged track
    /// runs from the free end of `a` to the free end of `b`.
    pub fn join(&mut self, a: PointRef, b: PointRef) -> Result<Join, ConfigError> {
        let refuse = |reason| ConfigError::InvalidJoin { a, b, reason };
        if a.track == b.track {
            return Err(refuse("both points are on the same track"));
        }
        let track_a = self.require(a.track)?;
        let track_b = self.require(b.track)?;
        if !track_a.is_end(a.index) || !track_b.is_end(b.index) {
            return Err(refuse("only end points can be joined"));
        }
        if track_a.snap_target(a.index) != Some(b) {
            return Err(refuse("end points are not snapped together"));
        }

        let reverse_a = a.index == 0;
        let reverse_b = b.index != 0;
        let oriented_a = if reverse_a { track_a.reversed() } else { track_a.clone() };
        let oriented_b = if reverse_b { track_b.reversed() } else { track_b.clone() };

        let pa = oriented_a.positions();
        let pb = oriented_b.positions();
        let seam = pa[pa.len() - 1].lerp(pb[0], 0.5);
        let mut positions = Vec::with_capacity(pa.len() + pb.len() - 1);
        positions.extend_from_slice(&pa[..pa.len() - 1]);
        positions.push(seam);
        positions.extend_from_slice(&pb[1..]);

        let merged = Track::new(
            &positions,
            track_a.is_interactive() && track_b.is_interactive(),
            track_a.is_traversable() && track_b.is_traversable(),
        )?;

        let maps = [
            ParamMap {
                source: a.track,
                source_max: (pa.len() - 1) as f64,
                offset: 0.0,
                reversed: reverse_a,
            },
            ParamMap {
                source: b.track,
                source_max: (pb.len() - 1) as f64,
                offset: (pa.len() - 1) as f64,
                reversed: reverse_b,
            },
        ];

        self.remove(a.track);
        self.remove(b.track);
        let merged = self.insert(merged);
        Ok(Join { merged, maps })
    }
}
