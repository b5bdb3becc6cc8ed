use fxhash::FxHashMap;

use super::config::{DataMode, SaveMode};
use super::event::McEvent;
use super::geometry::Geometry;
use super::hist::{Hist1D, Hist2D};
use super::projection::{ProjectionPlane, TankRegion};

/// Normalized charge below this threshold is treated as "no light seen" and
/// the time images stay empty for the PMT
const MIN_CHARGE_FRACTION: f64 = 1e-10;

/// Per-PMT accumulation of one event's hits, keyed by detector key.
///
/// Only hits inside the configured time window contribute; the monitoring
/// spectra see every hit.
#[derive(Debug, Clone, Default)]
pub struct PmtTally {
    charge: FxHashMap<u64, f64>,
    time: FxHashMap<u64, f64>,
    first_time: FxHashMap<u64, f64>,
    hit_keys: Vec<u64>,
    total_charge: f64,
}

impl PmtTally {
    pub fn charge(&self, detector_key: u64) -> f64 {
        self.charge.get(&detector_key).copied().unwrap_or(0.0)
    }

    pub fn time(&self, detector_key: u64) -> f64 {
        self.time.get(&detector_key).copied().unwrap_or(0.0)
    }

    pub fn first_time(&self, detector_key: u64) -> f64 {
        self.first_time.get(&detector_key).copied().unwrap_or(0.0)
    }

    /// Detector keys of the PMTs that saw at least one hit
    pub fn hit_keys(&self) -> &[u64] {
        &self.hit_keys
    }

    pub fn total_charge(&self) -> f64 {
        self.total_charge
    }

    /// Min/max bounds of the tallied PMTs for image normalization
    pub fn norm_bounds(&self) -> NormBounds {
        let mut bounds = NormBounds::default();
        for detector_key in &self.hit_keys {
            let charge = self.charge(*detector_key);
            let time = self.time(*detector_key);
            let first = self.first_time(*detector_key);
            if charge > bounds.max_charge {
                bounds.max_charge = charge;
            }
            if time > bounds.max_time {
                bounds.max_time = time;
            }
            if time < bounds.min_time {
                bounds.min_time = time;
            }
            if first > bounds.max_first_time {
                bounds.max_first_time = first;
            }
            if first < bounds.min_first_time {
                bounds.min_first_time = first;
            }
        }
        bounds.guarded()
    }
}

/// Accumulate the hits of an event per PMT.
///
/// Hits on channels outside the tank set or on outer-detector PMTs are
/// ignored. The time per PMT is the plain or charge-weighted mean of its
/// in-window hits depending on the data mode.
pub fn tally_event(
    event: &McEvent,
    geometry: &Geometry,
    data_mode: DataMode,
    window: (f64, f64),
    h_time: &mut Hist1D,
    h_charge: &mut Hist1D,
) -> PmtTally {
    let mut tally = PmtTally::default();

    for (channel_key, hits) in &event.hits {
        let Some(detector) = geometry.channel_to_detector(*channel_key) else {
            spdlog::warn!("Hit on channel {channel_key} has no detector, skipping");
            continue;
        };
        if detector.element() != "Tank" || detector.is_od() {
            continue;
        }
        let detector_key = detector.detector_key();
        tally.hit_keys.push(detector_key);

        let mut hits_pmt = 0u32;
        let mut charge_sum = 0.0;
        let mut time_sum = 0.0;
        let mut first_time = 0.0;
        for hit in hits {
            h_time.fill(hit.time);
            if hit.time > window.0 && hit.time < window.1 {
                charge_sum += hit.charge;
                match data_mode {
                    DataMode::Normal => time_sum += hit.time,
                    DataMode::ChargeWeighted => time_sum += hit.time * hit.charge,
                }
                if hits_pmt == 0 {
                    first_time = hit.time;
                }
                hits_pmt += 1;
            }
        }
        h_charge.fill(charge_sum);

        let mean_time = match data_mode {
            DataMode::Normal if hits_pmt > 0 => time_sum / hits_pmt as f64,
            DataMode::ChargeWeighted if charge_sum > 0.0 => time_sum / charge_sum,
            _ => time_sum,
        };
        tally.charge.insert(detector_key, charge_sum);
        tally.time.insert(detector_key, mean_time);
        tally.first_time.insert(detector_key, first_time);
        tally.total_charge += charge_sum;
    }

    tally
}

/// Normalization bounds over the hit PMTs of one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormBounds {
    pub max_charge: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub min_first_time: f64,
    pub max_first_time: f64,
}

impl Default for NormBounds {
    fn default() -> Self {
        Self {
            max_charge: 0.0,
            min_time: 999999.0,
            max_time: -999999.0,
            min_first_time: 9999999.0,
            max_first_time: -999999.0,
        }
    }
}

impl NormBounds {
    /// Widen degenerate ranges so the normalizations stay finite
    fn guarded(mut self) -> Self {
        if (self.max_time - self.min_time).abs() < 0.01 {
            self.max_time = self.min_time + 1.0;
        }
        if self.max_charge < 0.001 {
            self.max_charge = 1.0;
        }
        if (self.max_first_time - self.min_first_time).abs() < 0.01 {
            self.max_first_time = self.min_first_time + 1.0;
        }
        self
    }
}

/// The twelve per-event images: {charge, time, first-time} x {normalized,
/// absolute} x {geometric, pmt-wise}.
#[derive(Debug, Clone)]
pub struct EventImages {
    pub charge: Hist2D,
    pub time: Hist2D,
    pub first_time: Hist2D,
    pub charge_abs: Hist2D,
    pub time_abs: Hist2D,
    pub first_time_abs: Hist2D,
    pub charge_pmtwise: Hist2D,
    pub time_pmtwise: Hist2D,
    pub first_time_pmtwise: Hist2D,
    pub charge_abs_pmtwise: Hist2D,
    pub time_abs_pmtwise: Hist2D,
    pub first_time_abs_pmtwise: Hist2D,
}

impl EventImages {
    /// Create the (empty) images of one event
    pub fn new(
        event_index: usize,
        plane: &ProjectionPlane,
        dimension_x: usize,
        dimension_y: usize,
        npmts_x: usize,
        npmts_y: usize,
    ) -> Self {
        let x_range = plane.geometric_x_range();
        let y_range = plane.geometric_y_range();
        let geometric = |tag: &str| {
            Hist2D::new(
                format!("cnn_{tag}_{event_index}"),
                dimension_x,
                x_range,
                dimension_y,
                y_range,
            )
        };
        let pmtwise = |tag: &str| {
            Hist2D::new(
                format!("cnn_{tag}_pmtwise_{event_index}"),
                npmts_x,
                (0.0, npmts_x as f64),
                npmts_y,
                (0.0, npmts_y as f64),
            )
        };
        Self {
            charge: geometric("charge"),
            time: geometric("time"),
            first_time: geometric("firsttime"),
            charge_abs: geometric("charge_abs"),
            time_abs: geometric("time_abs"),
            first_time_abs: geometric("firsttime_abs"),
            charge_pmtwise: pmtwise("charge"),
            time_pmtwise: pmtwise("time"),
            first_time_pmtwise: pmtwise("firsttime"),
            charge_abs_pmtwise: pmtwise("charge_abs"),
            time_abs_pmtwise: pmtwise("time_abs"),
            first_time_abs_pmtwise: pmtwise("firsttime_abs"),
        }
    }

    /// Fill all images from the per-PMT tallies.
    ///
    /// Every non-OD tank PMT contributes a pixel, hit or not. Geometric
    /// charge images accumulate (endcap discs overlap in a bin), the time
    /// images overwrite.
    pub fn fill(
        &mut self,
        geometry: &Geometry,
        plane: &ProjectionPlane,
        tally: &PmtTally,
        bounds: &NormBounds,
        include_top_bottom: bool,
    ) {
        let Some(tank) = geometry.detectors_in_set("Tank") else {
            return;
        };
        for detector in tank.values() {
            if detector.is_od() {
                continue;
            }
            let detector_key = detector.detector_key();
            let pos = geometry.global_to_tank_centered(detector.position());
            let (x, y) = plane.project(pos);
            let bin_x = self.charge.bin_x(x);
            let bin_y = self.charge.bin_y(y);

            let charge = tally.charge(detector_key);
            let charge_fill = charge / bounds.max_charge;
            let mut time_fill = 0.0;
            let mut first_time_fill = 0.0;
            if charge_fill > MIN_CHARGE_FRACTION {
                time_fill =
                    (tally.time(detector_key) - bounds.min_time) / (bounds.max_time - bounds.min_time);
                first_time_fill = (tally.first_time(detector_key) - bounds.min_first_time)
                    / (bounds.max_first_time - bounds.min_first_time);
            }

            self.charge.add(bin_x, bin_y, charge_fill);
            self.charge_abs.add(bin_x, bin_y, charge);
            self.time.set(bin_x, bin_y, time_fill);
            self.first_time.set(bin_x, bin_y, first_time_fill);
            self.time_abs.set(bin_x, bin_y, tally.time(detector_key));
            self.first_time_abs
                .set(bin_x, bin_y, tally.first_time(detector_key));

            // pmt-wise image, optionally without the endcaps
            if plane.region(pos.z()) != TankRegion::Barrel && !include_top_bottom {
                continue;
            }
            let Some((index_x, index_y)) = plane.pmtwise_indices(pos) else {
                spdlog::warn!("PMT {detector_key} has no pmt-wise grid position, skipping");
                continue;
            };
            if index_x >= self.charge_pmtwise.nx() || index_y >= self.charge_pmtwise.ny() {
                spdlog::warn!("PMT {detector_key} falls outside the pmt-wise image, skipping");
                continue;
            }
            self.charge_pmtwise.set(index_x, index_y, charge_fill);
            self.time_pmtwise.set(index_x, index_y, time_fill);
            self.first_time_pmtwise.set(index_x, index_y, first_time_fill);
            self.charge_abs_pmtwise.set(index_x, index_y, charge);
            self.time_abs_pmtwise
                .set(index_x, index_y, tally.time(detector_key));
            self.first_time_abs_pmtwise
                .set(index_x, index_y, tally.first_time(detector_key));
        }
    }

    /// The six images that go to the CSV files, in output-file order
    pub fn csv_set(&self, save_mode: SaveMode) -> [&Hist2D; 6] {
        match save_mode {
            SaveMode::Geometric => [
                &self.charge,
                &self.time,
                &self.first_time,
                &self.charge_abs,
                &self.time_abs,
                &self.first_time_abs,
            ],
            SaveMode::PmtWise => [
                &self.charge_pmtwise,
                &self.time_pmtwise,
                &self.first_time_pmtwise,
                &self.charge_abs_pmtwise,
                &self.time_abs_pmtwise,
                &self.first_time_abs_pmtwise,
            ],
        }
    }

    /// All twelve images, for the histogram writer
    pub fn all(&self) -> [&Hist2D; 12] {
        [
            &self.charge,
            &self.time,
            &self.first_time,
            &self.charge_abs,
            &self.time_abs,
            &self.first_time_abs,
            &self.charge_pmtwise,
            &self.time_pmtwise,
            &self.first_time_pmtwise,
            &self.charge_abs_pmtwise,
            &self.time_abs_pmtwise,
            &self.first_time_abs_pmtwise,
        ]
    }
}
