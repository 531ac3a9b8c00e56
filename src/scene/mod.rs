//! The simulation as seen from the outside.
//!
//! [`Simulation`] owns the tracks, the rider, the world parameters and the
//! clock. User input arrives through its methods and each frame leaves as a
//! [`RenderFrame`] copy.

mod config;
mod snapshot;

pub use config::SimulationConfig;
pub use snapshot::{RenderFrame, RiderSnapshot, RiderView, TrackView};

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::motion::{
    self, Attachment, EnergyLedger, EnergySnapshot, Motion, RiderState, Side, SimulationClock,
    SpeedFactor, StepContext,
};
use crate::sim::{PhysicsParams, Vector2};
use crate::track::{Join, PointRef, Track, TrackId, TrackPreset, TrackSet};

/// Counters for problems the simulation recovered from on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Sub-steps thrown away because they produced non-finite values.
    pub discarded_steps: u64,
    /// Sub-steps run since construction or the last reset.
    pub substeps: u64,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    tracks: TrackSet,
    rider: RiderState,
    /// Rider as it was at the last release, for [`Simulation::return_rider`].
    release: RiderState,
    params: PhysicsParams,
    clock: SimulationClock,
    diagnostics: Diagnostics,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut tracks = TrackSet::new();
        let mut ids = Vec::with_capacity(config.tracks.len());
        for layout in &config.tracks {
            ids.push(tracks.insert(layout.build()?));
        }
        for id in ids {
            tracks.refresh_snap_targets(id, config.snap_radius)?;
        }

        let params = config.physics;
        let start = RiderState::at_rest(config.initial_mass, config.initial_position);
        let rider = settle(&tracks, &config, start);
        info!(tracks = tracks.len(), regime = ?rider.regime(), "simulation created");

        Ok(Self {
            clock: SimulationClock::new(config.clock_settings()),
            config,
            tracks,
            rider,
            release: rider,
            params,
            diagnostics: Diagnostics::default(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    pub fn rider(&self) -> &RiderState {
        &self.rider
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    // Parameters

    pub fn set_mass(&mut self, mass: f64) -> Result<(), ConfigError> {
        self.config.check_mass(mass)?;
        self.rider = self.rider.with_mass(mass);
        self.release = self.release.with_mass(mass);
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f64) -> Result<(), ConfigError> {
        self.params = self.params.with_friction(friction)?;
        Ok(())
    }

    pub fn set_gravity(&mut self, gravity: f64) -> Result<(), ConfigError> {
        self.params = self.params.with_gravity(gravity)?;
        Ok(())
    }

    /// Moves the zero of potential energy.
    pub fn set_reference_height(&mut self, height: f64) -> Result<(), ConfigError> {
        self.params = self.params.with_reference_height(height)?;
        Ok(())
    }

    // Tracks

    /// Adds a track; points below the ground are lifted onto it.
    pub fn add_track(
        &mut self,
        points: &[Vector2],
        interactive: bool,
        traversable: bool,
    ) -> Result<TrackId, ConfigError> {
        let ground = self.config.ground_level;
        let lifted: Vec<Vector2> = points
            .iter()
            .map(|p| Vector2::new(p.x, p.y.max(ground)))
            .collect();
        let id = self.tracks.insert(Track::new(&lifted, interactive, traversable)?);
        self.tracks.refresh_snap_targets(id, self.config.snap_radius)?;
        info!(track = ?id, points = points.len(), "track added");
        Ok(id)
    }

    pub fn add_preset(&mut self, preset: TrackPreset) -> Result<TrackId, ConfigError> {
        let layout = preset.layout();
        self.add_track(&layout.points, layout.interactive, layout.traversable)
    }

    /// Removes a track. A rider riding it keeps its velocity and falls.
    pub fn remove_track(&mut self, id: TrackId) -> Result<(), ConfigError> {
        self.tracks.remove(id).ok_or(ConfigError::UnknownTrack(id))?;
        if self.rider.attachment().is_some_and(|a| a.track == id) {
            debug!(track = ?id, "track removed under rider");
            self.rider = self.rider.airborne();
        }
        info!(track = ?id, "track removed");
        Ok(())
    }

    /// Drags one control point of an interactive track, clamped above the ground.
    ///
    /// The curve is rebuilt before returning and a rider on the track is moved
    /// onto the new curve at the same path parameter.
    pub fn move_control_point(
        &mut self,
        id: TrackId,
        index: usize,
        position: Vector2,
    ) -> Result<(), ConfigError> {
        if !position.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "control point",
            });
        }
        let track = self.tracks.require_mut(id)?;
        if !track.is_interactive() {
            return Err(ConfigError::NotInteractive(id));
        }
        let clamped = Vector2::new(position.x, position.y.max(self.config.ground_level));
        track.move_point(index, clamped)?;
        if track.is_end(index) {
            self.tracks.refresh_snap_targets(id, self.config.snap_radius)?;
        }

        self.rider = resync(&self.tracks, self.rider);
        Ok(())
    }

    /// Merges two tracks at snapped end points into one.
    pub fn join_tracks(&mut self, a: PointRef, b: PointRef) -> Result<TrackId, ConfigError> {
        let join = self.tracks.join(a, b)?;
        self.tracks
            .refresh_snap_targets(join.merged, self.config.snap_radius)?;
        self.rider = remap(&self.tracks, self.rider, &join);
        self.release = remap(&self.tracks, self.release, &join);
        info!(a = ?a.track, b = ?b.track, merged = ?join.merged, "tracks joined");
        Ok(join.merged)
    }

    // Rider

    /// Picks the rider up and holds it at `position`.
    pub fn drag_rider(&mut self, position: Vector2) -> Result<(), ConfigError> {
        if !position.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "rider position",
            });
        }
        let clamped = Vector2::new(position.x, position.y.max(self.config.ground_level));
        self.rider = self.rider.dragged_to(clamped);
        Ok(())
    }

    /// Lets go of a dragged rider; it attaches at rest to a nearby track or
    /// starts falling from rest.
    pub fn release_rider(&mut self) {
        if self.rider.is_released() {
            return;
        }
        self.rider = settle(&self.tracks, &self.config, self.rider);
        self.release = self.rider;
        debug!(regime = ?self.rider.regime(), "rider released");
    }

    /// Puts the rider back where it was last released. Thermal energy is kept.
    pub fn return_rider(&mut self) {
        let thermal = self.rider.thermal;
        let restored = resync(&self.tracks, self.release);
        self.rider = restored.with_thermal(thermal);
        debug!(regime = ?self.rider.regime(), "rider returned");
    }

    // Playback

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn request_step(&mut self) {
        self.clock.request_step();
    }

    pub fn set_speed(&mut self, speed: SpeedFactor) {
        self.clock.set_speed(speed);
    }

    /// Advances by one frame of `external_dt` seconds; returns the number of
    /// sub-steps run.
    pub fn tick(&mut self, external_dt: f64) -> usize {
        let Self {
            config,
            tracks,
            rider,
            params,
            clock,
            diagnostics,
            ..
        } = self;
        let ctx = StepContext {
            tracks,
            params,
            ground_level: config.ground_level,
            curvature_epsilon: config.curvature_epsilon,
            landing_tolerance: config.landing_tolerance,
        };
        clock.tick(external_dt, |dt| {
            diagnostics.substeps += 1;
            match motion::advance(rider, &ctx, dt) {
                Ok(next) => *rider = next,
                Err(_) => diagnostics.discarded_steps += 1,
            }
        })
    }

    // Energy and lifecycle

    pub fn energy(&self) -> EnergySnapshot {
        EnergyLedger::snapshot(&self.rider, &self.params)
    }

    pub fn clear_thermal(&mut self) {
        EnergyLedger::clear_thermal(&mut self.rider);
    }

    /// Restores the tracks, rider, parameters and clock given at construction.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        *self = Self::new(self.config.clone())?;
        info!("simulation reset");
        Ok(())
    }

    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            rider: RiderView::from(&self.rider),
            energy: self.energy(),
            tracks: self
                .tracks
                .iter()
                .map(|(id, track)| TrackView::new(id, track, self.config.sample_resolution))
                .collect(),
            playing: self.clock.is_playing(),
            speed: self.clock.speed(),
        }
    }

    pub fn snapshot(&self) -> RiderSnapshot {
        RiderSnapshot::from(&self.rider)
    }

    /// Replaces the rider with one rebuilt from `snapshot`.
    ///
    /// A free rider below the ground is refused.
    pub fn restore(&mut self, snapshot: &RiderSnapshot) -> Result<(), ConfigError> {
        self.config.check_mass(snapshot.mass)?;
        let rider = snapshot.to_state(&self.tracks)?;
        if rider.attachment().is_none() && rider.position.y < self.config.ground_level {
            return Err(ConfigError::InvalidConfig {
                field: "snapshot",
                reason: "rider below ground",
            });
        }
        self.rider = rider;
        Ok(())
    }
}

/// Rider at rest at its current position: attached to the closest traversable
/// track within the attach radius, otherwise airborne.
fn settle(tracks: &TrackSet, config: &SimulationConfig, rider: RiderState) -> RiderState {
    let position = rider.position;
    let nearest = tracks
        .traversable()
        .map(|(id, track)| {
            let (u, dist) = track.curve().closest_point(position);
            (id, track, u, dist)
        })
        .filter(|(_, _, _, dist)| *dist <= config.attach_radius)
        .min_by(|a, b| a.3.total_cmp(&b.3));

    match nearest {
        Some((id, track, u, _)) => {
            let curve = track.curve();
            let offset = (position - curve.position(u)).dot(curve.unit_normal(u));
            let attachment = Attachment::new(id, u, Side::from_sign(offset), 0.0);
            RiderState::grounded(rider.mass, curve, attachment, rider.thermal)
        }
        None => RiderState::new(
            rider.mass,
            Motion::Airborne,
            position,
            Vector2::ZERO,
            0.0,
            rider.thermal,
        ),
    }
}

/// Re-derives a grounded rider from its track's current curve; a rider whose
/// track is gone goes airborne.
fn resync(tracks: &TrackSet, rider: RiderState) -> RiderState {
    match rider.attachment() {
        Some(attachment) => match tracks.get(attachment.track) {
            Some(track) => {
                RiderState::grounded(rider.mass, track.curve(), attachment, rider.thermal)
            }
            None => rider.airborne(),
        },
        None => rider,
    }
}

/// Moves a rider attached to either joined track onto the merged one.
fn remap(tracks: &TrackSet, rider: RiderState, join: &Join) -> RiderState {
    let Some(attachment) = rider.attachment() else {
        return rider;
    };
    let Some(map) = join.map_for(attachment.track) else {
        return rider;
    };
    let flip = if map.reversed { -1.0 } else { 1.0 };
    let moved = Attachment {
        track: join.merged,
        u: map.apply(attachment.u),
        speed: flip * attachment.speed,
        ..attachment
    };
    // Reversing the parameter direction flips the left normal too.
    let moved = if map.reversed {
        Attachment {
            side: moved.side.flipped(),
            ..moved
        }
    } else {
        moved
    };
    resync(tracks, rider.with_motion(Motion::Grounded(moved)))
}
