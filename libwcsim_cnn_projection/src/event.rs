use fxhash::FxHashMap;

use super::position::{Direction, Position};

/// A simulated particle, with vertices in meters and times relative to the
/// event trigger time.
#[derive(Debug, Clone)]
pub struct McParticle {
    pub pdg: i32,
    pub start_energy: f64,
    pub stop_energy: f64,
    pub start_vertex: Position,
    pub stop_vertex: Position,
    pub start_time: f64,
    pub stop_time: f64,
    pub direction: Direction,
    pub track_length: f64,
    pub track_id: i32,
    pub parent_pdg: i32,
    pub flag: i32,
    pub parent_id: i32,
}

impl McParticle {
    /// Primary particles have no recorded parent
    pub fn is_primary(&self) -> bool {
        self.parent_pdg == 0
    }
}

/// A digitized hit attached to a readout channel.
#[derive(Debug, Clone)]
pub struct McHit {
    pub channel_key: u64,
    /// Hit time relative to the trigger [ns]
    pub time: f64,
    /// Digitized charge [p.e.]
    pub charge: f64,
    /// Indices into the event particle list of the particles that produced
    /// this digit. A hit can have more than one contributing particle.
    pub parents: Vec<usize>,
}

/// A fully built event: particle list plus the hits keyed by channel.
#[derive(Debug, Clone)]
pub struct McEvent {
    pub event_number: u32,
    pub trigger_time_ns: f64,
    pub particles: Vec<McParticle>,
    pub hits: FxHashMap<u64, Vec<McHit>>,
}

impl McEvent {
    pub fn has_hits(&self) -> bool {
        !self.hits.is_empty()
    }

    pub fn n_hit_channels(&self) -> usize {
        self.hits.len()
    }
}
