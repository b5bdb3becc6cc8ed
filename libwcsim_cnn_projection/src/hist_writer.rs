use std::path::Path;

use super::error::HistWriterError;
use super::hist::{Hist1D, Hist2D};
use super::images::EventImages;

const EVENTS_NAME: &str = "events";
/// This is the version of the output format
const FORMAT_VERSION: &str = "1.0";

/// A simple struct which wraps around the hdf5-rust library.
///
/// Opens an HDF5 file for writing the per-event histograms of the selected
/// events. One group per event, one 2D dataset per image plus the two 1D
/// monitoring spectra; axis ranges are stored as dataset attributes.
#[derive(Debug)]
pub struct HistWriter {
    file_handle: hdf5::File,
    events_group: hdf5::Group,
    events_written: u64,
}

impl HistWriter {
    /// Create the writer, opening a file at path and creating the events group
    pub fn new(path: &Path) -> Result<Self, HistWriterError> {
        let file_handle = hdf5::File::create(path)?;
        let events_group = file_handle.create_group(EVENTS_NAME)?;
        let version = format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION);
        events_group
            .new_attr::<hdf5::types::VarLenUnicode>()
            .create("version")?;
        events_group.attr("version")?.write_scalar(
            &version
                .parse::<hdf5::types::VarLenUnicode>()
                .unwrap_or_default(),
        )?;
        Ok(Self {
            file_handle,
            events_group,
            events_written: 0,
        })
    }

    /// Write the images and monitors of one selected event
    pub fn write_event(
        &mut self,
        event_number: u32,
        images: &EventImages,
        h_time: &Hist1D,
        h_charge: &Hist1D,
    ) -> Result<(), HistWriterError> {
        let event_group = self
            .events_group
            .create_group(&format!("event_{}", event_number))?;
        for image in images.all() {
            Self::write_hist2(&event_group, image)?;
        }
        Self::write_hist1(&event_group, "hit_times", h_time)?;
        Self::write_hist1(&event_group, "pmt_charges", h_charge)?;
        self.events_written += 1;
        Ok(())
    }

    fn write_hist2(group: &hdf5::Group, hist: &Hist2D) -> Result<(), HistWriterError> {
        let dataset = group
            .new_dataset_builder()
            .with_data(hist.data())
            .create(hist.name())?;
        let (x_lo, x_hi) = hist.x_range();
        let (y_lo, y_hi) = hist.y_range();
        for (name, value) in [
            ("x_lo", x_lo),
            ("x_hi", x_hi),
            ("y_lo", y_lo),
            ("y_hi", y_hi),
        ] {
            dataset
                .new_attr::<f64>()
                .create(name)?
                .write_scalar(&value)?;
        }
        Ok(())
    }

    fn write_hist1(group: &hdf5::Group, name: &str, hist: &Hist1D) -> Result<(), HistWriterError> {
        let dataset = group
            .new_dataset_builder()
            .with_data(hist.counts())
            .create(name)?;
        let (lo, hi) = hist.range();
        dataset.new_attr::<f64>().create("lo")?.write_scalar(&lo)?;
        dataset.new_attr::<f64>().create("hi")?.write_scalar(&hi)?;
        Ok(())
    }

    /// Write the summary attributes, consume the writer
    pub fn close(self, num_triggers: u64) -> Result<(), HistWriterError> {
        self.events_group
            .new_attr::<u64>()
            .create("n_events_written")?
            .write_scalar(&self.events_written)?;
        self.events_group
            .new_attr::<u64>()
            .create("n_triggers")?
            .write_scalar(&num_triggers)?;
        spdlog::info!(
            "{} selected events written, {} triggers observed",
            self.events_written,
            num_triggers
        );
        self.file_handle.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_tank_geometry;
    use crate::projection::{PhiTable, ProjectionPlane};
    use crate::sim_file::{PmtRecord, SimGeometry};

    #[test]
    fn test_write_and_close() {
        let pmts = vec![
            PmtRecord {
                tube_no: 1,
                cyl_loc: 1,
                position: [200.0, 0.0, 0.0],
                orientation: [0.0, 0.0, 0.0],
            },
            PmtRecord {
                tube_no: 2,
                cyl_loc: 1,
                position: [0.0, 200.0, 0.0],
                orientation: [0.0, 0.0, 0.0],
            },
        ];
        let sim = SimGeometry {
            cyl_radius: 200.0,
            cyl_length: 300.0,
            offset: [0.0; 3],
            pmts,
        };
        let (geometry, _) = build_tank_geometry(&sim).unwrap();
        let plane =
            ProjectionPlane::new(&geometry, PhiTable::new(None).unwrap(), true, 101).unwrap();
        let images = EventImages::new(0, &plane, 5, 4, 3, 2);
        let h_time = Hist1D::new("hit_times", 10, 0.0, 2000.0);
        let h_charge = Hist1D::new("pmt_charges", 10, 0.0, 100.0);

        let path = std::env::temp_dir().join(format!("hist_writer_test_{}.h5", std::process::id()));
        let mut writer = HistWriter::new(&path).unwrap();
        writer.write_event(0, &images, &h_time, &h_charge).unwrap();
        writer.close(1).unwrap();

        let file = hdf5::File::open(&path).unwrap();
        let events = file.group("events").unwrap();
        assert_eq!(
            events
                .attr("n_events_written")
                .unwrap()
                .read_scalar::<u64>()
                .unwrap(),
            1
        );
        let event = events.group("event_0").unwrap();
        let charge = event.dataset("cnn_charge_0").unwrap();
        assert_eq!(charge.shape(), [4, 5]);
        assert!(event.dataset("hit_times").is_ok());
        drop(file);
        let _ = std::fs::remove_file(&path);
    }
}
