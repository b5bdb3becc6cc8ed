use fxhash::FxHashMap;

use super::channel_map::TubeChannelMap;
use super::config::Config;
use super::error::EventBuilderError;
use super::event::{McEvent, McHit, McParticle};
use super::position::{Direction, Position};
use super::sim_file::{DigiHitRecord, SimEvent};

/// EventBuilder turns raw simulation events into McEvents.
///
/// Tracks are filtered by their simulation flag, vertices are converted to
/// meters and times are shifted to be relative to the trigger time. Digitized
/// hits are keyed by channel through the tube map; their parent particles are
/// resolved through the true-photon list.
#[derive(Debug)]
pub struct EventBuilder {
    tube_map: TubeChannelMap,
    use_smeared_digit_time: bool,
    allow_flag_zero: bool,
    trigger_offset_ns: f64,
}

impl EventBuilder {
    /// Create a new EventBuilder.
    ///
    /// Requires the TubeChannelMap produced during geometry construction
    pub fn new(tube_map: TubeChannelMap, config: &Config) -> Self {
        Self {
            tube_map,
            use_smeared_digit_time: config.use_smeared_digit_time,
            allow_flag_zero: config.allow_flag_zero,
            trigger_offset_ns: config.trigger_offset_ns,
        }
    }

    /// Build an McEvent from a raw simulation event
    pub fn build_event(&self, raw: &SimEvent) -> Result<McEvent, EventBuilderError> {
        let trigger_time = raw.trigger_time_ns;

        let mut particles = Vec::new();
        let mut track_index = FxHashMap::<i32, usize>::default();
        for track in &raw.tracks {
            // flag -1 is the neutrino, flag 0 the normal particles
            if !self.allow_flag_zero && track.flag != -1 {
                continue;
            } else if self.allow_flag_zero && track.flag != -1 && track.flag != 0 {
                continue;
            }

            let start = Position::from_cm(track.start);
            let stop = Position::from_cm(track.stop);
            let track_length = (stop - start).mag();
            track_index.insert(track.track_id, particles.len());
            particles.push(McParticle {
                pdg: track.pdg,
                start_energy: track.energy,
                stop_energy: track.stop_energy,
                start_vertex: start,
                stop_vertex: stop,
                start_time: track.time - trigger_time,
                stop_time: track.stop_time - trigger_time,
                direction: Direction::from_triplet(track.dir),
                track_length,
                track_id: track.track_id,
                parent_pdg: track.parent_pdg,
                flag: track.flag,
                parent_id: track.parent_id,
            });
        }

        let mut hits = FxHashMap::<u64, Vec<McHit>>::default();
        for digi in &raw.digi_hits {
            let channel_key = self
                .tube_map
                .channel_for_tube(digi.tube_id)
                .ok_or(EventBuilderError::UnmappedTube(digi.tube_id))?;

            let time = if self.use_smeared_digit_time {
                digi.time - self.trigger_offset_ns
            } else {
                self.earliest_photon_time(digi, raw)?
            };
            let parents = self.hit_parent_indices(digi, raw, &track_index)?;

            hits.entry(channel_key).or_default().push(McHit {
                channel_key,
                time,
                charge: digi.charge,
                parents,
            });
        }

        Ok(McEvent {
            event_number: raw.event_number,
            trigger_time_ns: trigger_time,
            particles,
            hits,
        })
    }

    /// The photon ids belonging to one digit
    fn photon_slice<'a>(
        &self,
        digi: &DigiHitRecord,
        raw: &'a SimEvent,
    ) -> Result<&'a [i32], EventBuilderError> {
        let start = digi.photon_start as usize;
        let end = start + digi.photon_count as usize;
        if digi.photon_start < 0 || digi.photon_count < 0 || end > raw.photon_ids.len() {
            return Err(EventBuilderError::BadPhotonRange(
                digi.photon_start,
                digi.photon_start + digi.photon_count,
                raw.photon_ids.len(),
            ));
        }
        Ok(&raw.photon_ids[start..end])
    }

    /// Earliest true arrival time among the photons of a digit
    fn earliest_photon_time(
        &self,
        digi: &DigiHitRecord,
        raw: &SimEvent,
    ) -> Result<f64, EventBuilderError> {
        let mut earliest = 999999999999.0;
        for photon_id in self.photon_slice(digi, raw)? {
            match raw.hit_times.get(*photon_id as usize) {
                Some(hit_time) => {
                    if hit_time.true_time < earliest {
                        earliest = hit_time.true_time;
                    }
                }
                None => {
                    spdlog::error!(
                        "Retrieval of photon {} from digit on tube {} failed",
                        photon_id,
                        digi.tube_id
                    );
                }
            }
        }
        Ok(earliest)
    }

    /// Get the indices of the McParticles that produced this digit.
    ///
    /// Photons from particles that were not recorded (e.g. secondaries below
    /// threshold) are silently dropped.
    fn hit_parent_indices(
        &self,
        digi: &DigiHitRecord,
        raw: &SimEvent,
        track_index: &FxHashMap<i32, usize>,
    ) -> Result<Vec<usize>, EventBuilderError> {
        let mut parents = Vec::new();
        for photon_id in self.photon_slice(digi, raw)? {
            match raw.hit_times.get(*photon_id as usize) {
                Some(hit_time) => {
                    if let Some(index) = track_index.get(&hit_time.parent_track_id) {
                        parents.push(*index);
                    }
                }
                None => {
                    spdlog::error!(
                        "Retrieval of photon {} from digit on tube {} failed",
                        photon_id,
                        digi.tube_id
                    );
                }
            }
        }
        Ok(parents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_file::{PhotonTimeRecord, TrackRecord};

    fn test_track(track_id: i32, pdg: i32, flag: i32, parent_pdg: i32) -> TrackRecord {
        TrackRecord {
            track_id,
            pdg,
            flag,
            parent_pdg,
            parent_id: 0,
            energy: 10.0,
            stop_energy: 0.0,
            start: [0.0, 0.0, 0.0],
            stop: [300.0, 0.0, 400.0],
            dir: [0.6, 0.0, 0.8],
            time: 150.0,
            stop_time: 160.0,
        }
    }

    fn test_raw_event() -> SimEvent {
        SimEvent {
            event_number: 0,
            trigger_time_ns: 100.0,
            tracks: vec![
                test_track(1, -11, 0, 0),
                test_track(2, 14, -1, 0),
                test_track(3, 22, 7, 0), // dropped by flag in both modes
            ],
            digi_hits: vec![DigiHitRecord {
                tube_id: 5,
                time: 950.0,
                charge: 2.0,
                photon_start: 0,
                photon_count: 2,
            }],
            photon_ids: vec![0, 1],
            hit_times: vec![
                PhotonTimeRecord {
                    true_time: 930.0,
                    parent_track_id: 1,
                },
                PhotonTimeRecord {
                    true_time: 925.0,
                    parent_track_id: 99, // unrecorded parent
                },
            ],
        }
    }

    fn test_builder(config: &Config) -> EventBuilder {
        let mut tube_map = TubeChannelMap::new();
        tube_map.insert(5, 42).unwrap();
        EventBuilder::new(tube_map, config)
    }

    #[test]
    fn test_track_filtering_and_times() {
        let config = Config::default();
        let builder = test_builder(&config);
        let event = builder.build_event(&test_raw_event()).unwrap();
        // flag 7 track dropped, flags 0 and -1 kept
        assert_eq!(event.particles.len(), 2);
        let positron = &event.particles[0];
        assert_eq!(positron.pdg, -11);
        assert_eq!(positron.start_time, 50.0);
        assert_eq!(positron.stop_vertex, Position::new(3.0, 0.0, 4.0));
        assert!((positron.track_length - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_neutrino_only_filtering() {
        let config = Config {
            allow_flag_zero: false,
            ..Default::default()
        };
        let builder = test_builder(&config);
        let event = builder.build_event(&test_raw_event()).unwrap();
        assert_eq!(event.particles.len(), 1);
        assert_eq!(event.particles[0].flag, -1);
    }

    #[test]
    fn test_smeared_digit_time() {
        let config = Config {
            trigger_offset_ns: 50.0,
            ..Default::default()
        };
        let builder = test_builder(&config);
        let event = builder.build_event(&test_raw_event()).unwrap();
        let hits = &event.hits[&42];
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].time, 900.0);
        assert_eq!(hits[0].charge, 2.0);
        // only the recorded parent survives
        assert_eq!(hits[0].parents, vec![0]);
    }

    #[test]
    fn test_true_photon_time() {
        let config = Config {
            use_smeared_digit_time: false,
            ..Default::default()
        };
        let builder = test_builder(&config);
        let event = builder.build_event(&test_raw_event()).unwrap();
        assert_eq!(event.hits[&42][0].time, 925.0);
    }

    #[test]
    fn test_unmapped_tube() {
        let config = Config::default();
        let builder = EventBuilder::new(TubeChannelMap::new(), &config);
        assert!(matches!(
            builder.build_event(&test_raw_event()),
            Err(EventBuilderError::UnmappedTube(5))
        ));
    }

    #[test]
    fn test_bad_photon_range() {
        let config = Config::default();
        let builder = test_builder(&config);
        let mut raw = test_raw_event();
        raw.digi_hits[0].photon_count = 10;
        assert!(matches!(
            builder.build_event(&raw),
            Err(EventBuilderError::BadPhotonRange(0, 10, 2))
        ));
    }
}
