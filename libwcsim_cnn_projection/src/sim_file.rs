use hdf5::H5Type;
use std::path::{Path, PathBuf};

use super::error::SimFileError;

const GEOMETRY_NAME: &str = "geometry";
const PMTS_NAME: &str = "pmts";
const EVENTS_NAME: &str = "events";
const TRACKS_NAME: &str = "tracks";
const DIGI_HITS_NAME: &str = "digi_hits";
const PHOTON_IDS_NAME: &str = "photon_ids";
const HIT_TIMES_NAME: &str = "hit_times";

/// One tank PMT as exported from the simulation geometry tree.
///
/// Positions are in the simulation frame and in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, H5Type)]
#[repr(C)]
pub struct PmtRecord {
    pub tube_no: i32,
    pub cyl_loc: i32,
    pub position: [f64; 3],
    pub orientation: [f64; 3],
}

/// One simulated particle track. Start/stop points are in centimeters, times
/// are absolute nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, H5Type)]
#[repr(C)]
pub struct TrackRecord {
    pub track_id: i32,
    pub pdg: i32,
    pub flag: i32,
    pub parent_pdg: i32,
    pub parent_id: i32,
    pub energy: f64,
    pub stop_energy: f64,
    pub start: [f64; 3],
    pub stop: [f64; 3],
    pub dir: [f64; 3],
    pub time: f64,
    pub stop_time: f64,
}

/// One digitized PMT hit. The photons contributing to the digit are stored as
/// a slice of the event's flattened photon id list.
#[derive(Debug, Clone, Copy, PartialEq, H5Type)]
#[repr(C)]
pub struct DigiHitRecord {
    pub tube_id: i32,
    pub time: f64,
    pub charge: f64,
    pub photon_start: i32,
    pub photon_count: i32,
}

/// One true Cherenkov photon arrival, indexed by the digit photon ids.
#[derive(Debug, Clone, Copy, PartialEq, H5Type)]
#[repr(C)]
pub struct PhotonTimeRecord {
    pub true_time: f64,
    pub parent_track_id: i32,
}

/// The simulation geometry record: tank dimensions plus one record per PMT.
#[derive(Debug, Clone)]
pub struct SimGeometry {
    /// Radius of the cylinder [cm]
    pub cyl_radius: f64,
    /// Half-height of the cylinder [cm]
    pub cyl_length: f64,
    /// Offset of the cylinder centre in global coordinates [cm]
    pub offset: [f64; 3],
    pub pmts: Vec<PmtRecord>,
}

impl SimGeometry {
    pub fn num_pmts(&self) -> usize {
        self.pmts.len()
    }
}

/// One raw simulation event, as stored in the export file.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub event_number: u32,
    /// Trigger time of the event (the header date) [ns]
    pub trigger_time_ns: f64,
    pub tracks: Vec<TrackRecord>,
    pub digi_hits: Vec<DigiHitRecord>,
    pub photon_ids: Vec<i32>,
    pub hit_times: Vec<PhotonTimeRecord>,
}

/// Read access to a WCSim export file.
///
/// The export file is an HDF5 repackaging of the simulation output: a
/// `geometry` group with the tank parameters and PMT records, and an `events`
/// group with one subgroup per event. Events are random-access, so the file
/// is opened once and events are pulled by index.
#[derive(Debug)]
pub struct SimFile {
    file_handle: hdf5::File,
    events_group: hdf5::Group,
    n_events: usize,
    path: PathBuf,
    size_bytes: u64,
}

impl SimFile {
    /// Open an export file for reading
    pub fn open(path: &Path) -> Result<Self, SimFileError> {
        if !path.exists() {
            return Err(SimFileError::BadFilePath(path.to_path_buf()));
        }
        let size_bytes = path.metadata()?.len();
        let file_handle = hdf5::File::open(path)?;
        let events_group = file_handle.group(EVENTS_NAME)?;
        let n_events = events_group.attr("n_events")?.read_scalar::<u64>()? as usize;
        Ok(Self {
            file_handle,
            events_group,
            n_events,
            path: path.to_path_buf(),
            size_bytes,
        })
    }

    /// Read the geometry record.
    ///
    /// A missing geometry group or a geometry without PMTs is an error; there
    /// is nothing useful to be done with such a file.
    pub fn read_geometry(&self) -> Result<SimGeometry, SimFileError> {
        let group = self
            .file_handle
            .group(GEOMETRY_NAME)
            .map_err(|_| SimFileError::EmptyGeometry)?;
        let pmts = group.dataset(PMTS_NAME)?.read_raw::<PmtRecord>()?;
        if pmts.is_empty() {
            return Err(SimFileError::EmptyGeometry);
        }
        Ok(SimGeometry {
            cyl_radius: group.attr("cyl_radius_cm")?.read_scalar::<f64>()?,
            cyl_length: group.attr("cyl_length_cm")?.read_scalar::<f64>()?,
            offset: [
                group.attr("offset_x_cm")?.read_scalar::<f64>()?,
                group.attr("offset_y_cm")?.read_scalar::<f64>()?,
                group.attr("offset_z_cm")?.read_scalar::<f64>()?,
            ],
            pmts,
        })
    }

    pub fn event_count(&self) -> usize {
        self.n_events
    }

    /// Read a single event by index
    pub fn read_event(&self, index: usize) -> Result<SimEvent, SimFileError> {
        let event_group = self
            .events_group
            .group(&format!("event_{}", index))
            .map_err(|_| SimFileError::MissingEvent(index))?;
        Ok(SimEvent {
            event_number: event_group.attr("event_number")?.read_scalar::<u32>()?,
            trigger_time_ns: event_group.attr("trigger_time_ns")?.read_scalar::<f64>()?,
            tracks: event_group.dataset(TRACKS_NAME)?.read_raw::<TrackRecord>()?,
            digi_hits: event_group
                .dataset(DIGI_HITS_NAME)?
                .read_raw::<DigiHitRecord>()?,
            photon_ids: event_group.dataset(PHOTON_IDS_NAME)?.read_raw::<i32>()?,
            hit_times: event_group
                .dataset(HIT_TIMES_NAME)?
                .read_raw::<PhotonTimeRecord>()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_file(path: &Path) {
        let file = hdf5::File::create(path).unwrap();

        let geometry = file.create_group(GEOMETRY_NAME).unwrap();
        geometry
            .new_attr::<f64>()
            .create("cyl_radius_cm")
            .unwrap()
            .write_scalar(&200.0)
            .unwrap();
        geometry
            .new_attr::<f64>()
            .create("cyl_length_cm")
            .unwrap()
            .write_scalar(&300.0)
            .unwrap();
        for name in ["offset_x_cm", "offset_y_cm", "offset_z_cm"] {
            geometry
                .new_attr::<f64>()
                .create(name)
                .unwrap()
                .write_scalar(&0.0)
                .unwrap();
        }
        let pmts = vec![
            PmtRecord {
                tube_no: 1,
                cyl_loc: 1,
                position: [200.0, 0.0, 0.0],
                orientation: [-1.0, 0.0, 0.0],
            },
            PmtRecord {
                tube_no: 2,
                cyl_loc: 0,
                position: [0.0, 0.0, 300.0],
                orientation: [0.0, 0.0, -1.0],
            },
        ];
        geometry
            .new_dataset_builder()
            .with_data(&pmts)
            .create(PMTS_NAME)
            .unwrap();

        let events = file.create_group(EVENTS_NAME).unwrap();
        events
            .new_attr::<u64>()
            .create("n_events")
            .unwrap()
            .write_scalar(&1u64)
            .unwrap();
        let event = events.create_group("event_0").unwrap();
        event
            .new_attr::<u32>()
            .create("event_number")
            .unwrap()
            .write_scalar(&0u32)
            .unwrap();
        event
            .new_attr::<f64>()
            .create("trigger_time_ns")
            .unwrap()
            .write_scalar(&100.0)
            .unwrap();
        let tracks = vec![TrackRecord {
            track_id: 1,
            pdg: 2112,
            flag: 0,
            parent_pdg: 0,
            parent_id: 0,
            energy: 50.0,
            stop_energy: 0.0,
            start: [0.0, 0.0, 0.0],
            stop: [10.0, 0.0, 0.0],
            dir: [1.0, 0.0, 0.0],
            time: 100.0,
            stop_time: 105.0,
        }];
        event
            .new_dataset_builder()
            .with_data(&tracks)
            .create(TRACKS_NAME)
            .unwrap();
        let digi_hits = vec![DigiHitRecord {
            tube_id: 1,
            time: 900.0,
            charge: 1.5,
            photon_start: 0,
            photon_count: 1,
        }];
        event
            .new_dataset_builder()
            .with_data(&digi_hits)
            .create(DIGI_HITS_NAME)
            .unwrap();
        event
            .new_dataset_builder()
            .with_data(&vec![0i32])
            .create(PHOTON_IDS_NAME)
            .unwrap();
        let hit_times = vec![PhotonTimeRecord {
            true_time: 899.0,
            parent_track_id: 1,
        }];
        event
            .new_dataset_builder()
            .with_data(&hit_times)
            .create(HIT_TIMES_NAME)
            .unwrap();
    }

    #[test]
    fn test_round_trip() {
        let path = std::env::temp_dir().join(format!("sim_file_test_{}.h5", std::process::id()));
        write_test_file(&path);

        let sim = SimFile::open(&path).unwrap();
        assert_eq!(sim.event_count(), 1);

        let geometry = sim.read_geometry().unwrap();
        assert_eq!(geometry.num_pmts(), 2);
        assert_eq!(geometry.cyl_radius, 200.0);
        assert_eq!(geometry.pmts[0].tube_no, 1);

        let event = sim.read_event(0).unwrap();
        assert_eq!(event.event_number, 0);
        assert_eq!(event.trigger_time_ns, 100.0);
        assert_eq!(event.tracks.len(), 1);
        assert_eq!(event.digi_hits[0].tube_id, 1);
        assert_eq!(event.hit_times[0].parent_track_id, 1);

        assert!(matches!(
            sim.read_event(1),
            Err(SimFileError::MissingEvent(1))
        ));

        drop(sim);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let result = SimFile::open(Path::new("/not/a/real/file.h5"));
        assert!(matches!(result, Err(SimFileError::BadFilePath(_))));
    }
}
