use std::collections::BTreeMap;

use fxhash::FxHashMap;

use super::channel_map::TubeChannelMap;
use super::constants::*;
use super::error::GeometryError;
use super::position::{Direction, Position};
use super::sim_file::SimGeometry;

/// Location of a PMT on the cylinder, decoded from the simulation code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CylLoc {
    TopCap,
    Barrel,
    BottomCap,
    OuterDetector,
}

impl CylLoc {
    /// WCSim encodes the location as 0 (top endcap), 1 (wall), 2 (bottom
    /// endcap); larger codes are outer-detector PMTs
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => CylLoc::TopCap,
            1 => CylLoc::Barrel,
            2 => CylLoc::BottomCap,
            _ => CylLoc::OuterDetector,
        }
    }

    pub fn is_od(&self) -> bool {
        matches!(self, CylLoc::OuterDetector)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorStatus {
    #[default]
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoStatus {
    #[default]
    FullyOperational,
    TankOnly,
}

/// A single readout channel with its ADC, trigger-card and HV addresses.
///
/// The addresses are filled monotonically at construction time; they carry no
/// meaning for simulated data but keep the bookkeeping identical to real
/// detector channels.
#[derive(Debug, Clone)]
pub struct Channel {
    channel_key: u64,
    pub adc_crate: u32,
    pub adc_card: u32,
    pub adc_channel: u32,
    pub mt_crate: u32,
    pub mt_card: u32,
    pub mt_channel: u32,
    pub hv_crate: u32,
    pub hv_card: u32,
    pub hv_channel: u32,
    pub status: ChannelStatus,
}

impl Channel {
    pub fn new(
        channel_key: u64,
        adc: (u32, u32, u32),
        mt: (u32, u32, u32),
        hv: (u32, u32, u32),
        status: ChannelStatus,
    ) -> Self {
        Self {
            channel_key,
            adc_crate: adc.0,
            adc_card: adc.1,
            adc_channel: adc.2,
            mt_crate: mt.0,
            mt_card: mt.1,
            mt_channel: mt.2,
            hv_crate: hv.0,
            hv_card: hv.1,
            hv_channel: hv.2,
            status,
        }
    }

    pub fn channel_key(&self) -> u64 {
        self.channel_key
    }
}

/// A physical detector element (here: one tank PMT) and its channels.
#[derive(Debug, Clone)]
pub struct Detector {
    detector_key: u64,
    element: String,
    cyl_loc: CylLoc,
    position: Position,
    orientation: Direction,
    detector_type: String,
    status: DetectorStatus,
    channels: BTreeMap<u64, Channel>,
}

impl Detector {
    pub fn new(
        detector_key: u64,
        element: &str,
        cyl_loc: CylLoc,
        position: Position,
        orientation: Direction,
        detector_type: &str,
        status: DetectorStatus,
    ) -> Self {
        Self {
            detector_key,
            element: element.to_string(),
            cyl_loc,
            position,
            orientation,
            detector_type: detector_type.to_string(),
            status,
            channels: BTreeMap::new(),
        }
    }

    pub fn add_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.channel_key(), channel);
    }

    pub fn detector_key(&self) -> u64 {
        self.detector_key
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn cyl_loc(&self) -> CylLoc {
        self.cyl_loc
    }

    pub fn is_od(&self) -> bool {
        self.cyl_loc.is_od()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn orientation(&self) -> Direction {
        self.orientation
    }

    pub fn detector_type(&self) -> &str {
        &self.detector_type
    }

    pub fn status(&self) -> DetectorStatus {
        self.status
    }

    pub fn channels(&self) -> &BTreeMap<u64, Channel> {
        &self.channels
    }
}

/// The reconstructed toolchain geometry: tank dimensions plus the detector
/// sets and their channels.
///
/// Detector and channel keys are handed out monotonically through the
/// `consume_next_free_*` methods, mirroring how the toolchain allocates them
/// when loading a simulation file.
#[derive(Debug, Clone)]
pub struct Geometry {
    version: f64,
    status: GeoStatus,
    tank_centre: Position,
    tank_radius: f64,
    tank_halfheight: f64,
    pmt_enclosed_radius: f64,
    pmt_enclosed_halfheight: f64,
    next_free_detector_key: u64,
    next_free_channel_key: u64,
    detector_sets: BTreeMap<String, BTreeMap<u64, Detector>>,
    set_of_detector: FxHashMap<u64, String>,
    channel_to_detector_key: FxHashMap<u64, u64>,
}

impl Geometry {
    pub fn new(
        version: f64,
        tank_centre: Position,
        tank_radius: f64,
        tank_halfheight: f64,
        pmt_enclosed_radius: f64,
        pmt_enclosed_halfheight: f64,
        status: GeoStatus,
    ) -> Self {
        Self {
            version,
            status,
            tank_centre,
            tank_radius,
            tank_halfheight,
            pmt_enclosed_radius,
            pmt_enclosed_halfheight,
            next_free_detector_key: 0,
            next_free_channel_key: 0,
            detector_sets: BTreeMap::new(),
            set_of_detector: FxHashMap::default(),
            channel_to_detector_key: FxHashMap::default(),
        }
    }

    pub fn consume_next_free_detector_key(&mut self) -> u64 {
        let key = self.next_free_detector_key;
        self.next_free_detector_key += 1;
        key
    }

    pub fn consume_next_free_channel_key(&mut self) -> u64 {
        let key = self.next_free_channel_key;
        self.next_free_channel_key += 1;
        key
    }

    /// Add a detector (and register its channels for lookup).
    ///
    /// Detector and channel keys must be unique across the whole geometry.
    pub fn add_detector(&mut self, detector: Detector) -> Result<(), GeometryError> {
        let det_key = detector.detector_key();
        if self.set_of_detector.contains_key(&det_key) {
            return Err(GeometryError::DuplicateDetectorKey(det_key));
        }
        for chan_key in detector.channels().keys() {
            if self.channel_to_detector_key.contains_key(chan_key) {
                return Err(GeometryError::DuplicateChannelKey(*chan_key));
            }
        }
        for chan_key in detector.channels().keys() {
            self.channel_to_detector_key.insert(*chan_key, det_key);
        }
        self.set_of_detector
            .insert(det_key, detector.element().to_string());
        self.detector_sets
            .entry(detector.element().to_string())
            .or_default()
            .insert(det_key, detector);
        Ok(())
    }

    pub fn detector(&self, detector_key: u64) -> Option<&Detector> {
        let set = self.set_of_detector.get(&detector_key)?;
        self.detector_sets.get(set)?.get(&detector_key)
    }

    pub fn channel_to_detector(&self, channel_key: u64) -> Option<&Detector> {
        let det_key = self.channel_to_detector_key.get(&channel_key)?;
        self.detector(*det_key)
    }

    pub fn detectors_in_set(&self, set: &str) -> Option<&BTreeMap<u64, Detector>> {
        self.detector_sets.get(set)
    }

    pub fn num_detectors_in_set(&self, set: &str) -> usize {
        self.detector_sets.get(set).map(|s| s.len()).unwrap_or(0)
    }

    pub fn num_tank_pmts(&self) -> usize {
        self.num_detectors_in_set("Tank")
    }

    pub fn version(&self) -> f64 {
        self.version
    }

    pub fn status(&self) -> GeoStatus {
        self.status
    }

    pub fn tank_centre(&self) -> Position {
        self.tank_centre
    }

    pub fn tank_radius(&self) -> f64 {
        self.tank_radius
    }

    pub fn tank_halfheight(&self) -> f64 {
        self.tank_halfheight
    }

    pub fn pmt_enclosed_radius(&self) -> f64 {
        self.pmt_enclosed_radius
    }

    pub fn pmt_enclosed_halfheight(&self) -> f64 {
        self.pmt_enclosed_halfheight
    }

    pub fn global_to_tank_centered(&self, pos: Position) -> Position {
        pos - self.tank_centre
    }

    /// Check whether a vertex lies inside the tank volume
    pub fn tank_contained(&self, vertex: Position) -> bool {
        let radial = (vertex.x() * vertex.x()
            + (vertex.z() - self.tank_centre.z()) * (vertex.z() - self.tank_centre.z()))
        .sqrt();
        radial < self.tank_radius
            && (vertex.y() - self.tank_centre.y()).abs() < self.tank_halfheight
    }

    pub fn log_summary(&self) {
        spdlog::info!(
            "Geometry v{}: tank centre ({:.3}, {:.3}, {:.3}) m, radius {:.3} m, halfheight {:.3} m, {} tank PMTs",
            self.version,
            self.tank_centre.x(),
            self.tank_centre.y(),
            self.tank_centre.z(),
            self.tank_radius,
            self.tank_halfheight,
            self.num_tank_pmts()
        );
    }
}

/// Build the toolchain geometry from the raw simulation geometry record.
///
/// One Detector with one Channel is created per tank PMT; electronics
/// addresses are filled monotonically with the cards-per-crate moduli of the
/// real readout. Returns the geometry together with the tube id <-> channel
/// key maps needed to attach hits to channels later.
pub fn build_tank_geometry(sim: &SimGeometry) -> Result<(Geometry, TubeChannelMap), GeometryError> {
    if sim.pmts.is_empty() {
        return Err(GeometryError::NoTankPmts);
    }

    let tank_centre = Position::from_cm(sim.offset);
    let tank_radius = sim.cyl_radius / CM_PER_M;
    let tank_halfheight = sim.cyl_length / CM_PER_M;

    let mut geometry = Geometry::new(
        GEOMETRY_VERSION,
        tank_centre,
        tank_radius,
        tank_halfheight,
        PMT_ENCLOSED_RADIUS,
        PMT_ENCLOSED_HALFHEIGHT,
        GeoStatus::FullyOperational,
    );
    let mut tube_map = TubeChannelMap::new();

    let mut adc_crate = 0;
    let mut adc_card = 0;
    let mut adc_chan = 0;
    let mut mt_crate = 0;
    let mut mt_card = 0;
    let mut mt_chan = 0;
    let mut hv_crate = 0;
    let mut hv_card = 0;
    let mut hv_chan = 0;

    for pmt in &sim.pmts {
        let detector_key = geometry.consume_next_free_detector_key();
        let mut detector = Detector::new(
            detector_key,
            "Tank",
            CylLoc::from_code(pmt.cyl_loc),
            Position::from_cm(pmt.position),
            Direction::from_triplet(pmt.orientation),
            "PMT",
            DetectorStatus::On,
        );

        let channel_key = geometry.consume_next_free_channel_key();
        tube_map.insert(pmt.tube_no, channel_key)?;

        adc_chan += 1;
        if adc_chan >= ADC_CHANNELS_PER_CARD {
            adc_chan = 0;
            adc_card += 1;
            mt_chan += 1;
        }
        if adc_card >= ADC_CARDS_PER_CRATE {
            adc_card = 0;
            adc_crate += 1;
        }
        if mt_chan >= MT_CHANNELS_PER_CARD {
            mt_chan = 0;
            mt_card += 1;
        }
        if mt_card >= MT_CARDS_PER_CRATE {
            mt_card = 0;
            mt_crate += 1;
        }
        hv_chan += 1;
        if hv_chan >= HV_CHANNELS_PER_CARD {
            hv_chan = 0;
            hv_card += 1;
        }
        if hv_card >= HV_CARDS_PER_CRATE {
            hv_card = 0;
            hv_crate += 1;
        }

        detector.add_channel(Channel::new(
            channel_key,
            (adc_crate, adc_card, adc_chan),
            (mt_crate, mt_card, mt_chan),
            (hv_crate, hv_card, hv_chan),
            ChannelStatus::On,
        ));

        geometry.add_detector(detector)?;
    }

    Ok((geometry, tube_map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_file::PmtRecord;

    fn test_sim_geometry() -> SimGeometry {
        let mut pmts = Vec::new();
        for i in 0..10 {
            pmts.push(PmtRecord {
                tube_no: i + 1,
                cyl_loc: 1,
                position: [100.0 * i as f64, 0.0, 150.0],
                orientation: [0.0, 0.0, -1.0],
            });
        }
        SimGeometry {
            cyl_radius: 200.0,
            cyl_length: 300.0,
            offset: [0.0, 0.0, 50.0],
            pmts,
        }
    }

    #[test]
    fn test_key_consumption() {
        let mut geom = Geometry::new(
            1.0,
            Position::default(),
            1.0,
            1.0,
            1.0,
            1.0,
            GeoStatus::FullyOperational,
        );
        assert_eq!(geom.consume_next_free_detector_key(), 0);
        assert_eq!(geom.consume_next_free_detector_key(), 1);
        assert_eq!(geom.consume_next_free_channel_key(), 0);
        assert_eq!(geom.consume_next_free_channel_key(), 1);
    }

    #[test]
    fn test_build_tank_geometry() {
        let sim = test_sim_geometry();
        let (geom, tube_map) = build_tank_geometry(&sim).unwrap();
        assert_eq!(geom.num_tank_pmts(), 10);
        assert_eq!(tube_map.len(), 10);
        assert_eq!(geom.tank_radius(), 2.0);
        assert_eq!(geom.tank_halfheight(), 3.0);
        assert_eq!(geom.tank_centre(), Position::new(0.0, 0.0, 0.5));

        // every tube maps to a channel, and every channel leads back to a detector
        for tube in 1..=10 {
            let chan = tube_map.channel_for_tube(tube).unwrap();
            let det = geom.channel_to_detector(chan).unwrap();
            assert_eq!(det.element(), "Tank");
            assert_eq!(tube_map.tube_for_channel(chan), Some(tube));
        }
    }

    #[test]
    fn test_duplicate_detector_rejected() {
        let mut geom = Geometry::new(
            1.0,
            Position::default(),
            1.0,
            1.0,
            1.0,
            1.0,
            GeoStatus::FullyOperational,
        );
        let det = Detector::new(
            0,
            "Tank",
            CylLoc::Barrel,
            Position::default(),
            Direction::default(),
            "PMT",
            DetectorStatus::On,
        );
        geom.add_detector(det.clone()).unwrap();
        assert!(matches!(
            geom.add_detector(det),
            Err(GeometryError::DuplicateDetectorKey(0))
        ));
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let sim = SimGeometry {
            cyl_radius: 200.0,
            cyl_length: 300.0,
            offset: [0.0; 3],
            pmts: Vec::new(),
        };
        assert!(matches!(
            build_tank_geometry(&sim),
            Err(GeometryError::NoTankPmts)
        ));
    }

    #[test]
    fn test_tank_containment() {
        let sim = test_sim_geometry();
        let (geom, _) = build_tank_geometry(&sim).unwrap();
        assert!(geom.tank_contained(Position::new(0.0, 0.0, 0.5)));
        assert!(!geom.tank_contained(Position::new(5.0, 0.0, 0.5)));
    }

    #[test]
    fn test_cyl_loc_codes() {
        assert_eq!(CylLoc::from_code(0), CylLoc::TopCap);
        assert_eq!(CylLoc::from_code(1), CylLoc::Barrel);
        assert_eq!(CylLoc::from_code(2), CylLoc::BottomCap);
        assert!(CylLoc::from_code(4).is_od());
    }
}
