use std::fs::File;
use std::path::Path;

use super::config::{Config, CsvKind, SaveMode};
use super::error::CsvWriterError;
use super::images::EventImages;

/// Writes the six CSV training files, one row per selected event.
///
/// Each row is the corresponding image flattened row-major with the y loop
/// outermost, which is the layout the CNN training pipeline expects.
pub struct CsvWriter {
    writers: [csv::Writer<File>; 6],
    save_mode: SaveMode,
    rows_written: u64,
}

impl CsvWriter {
    /// Create the writer, opening all six output files
    pub fn new(config: &Config) -> Result<Self, CsvWriterError> {
        let mut writers = Vec::with_capacity(CsvKind::ALL.len());
        for kind in CsvKind::ALL {
            let path = config.get_csv_file_name(kind)?;
            writers.push(Self::open_one(&path)?);
        }
        let writers = match writers.try_into() {
            Ok(array) => array,
            Err(_) => unreachable!("CsvKind::ALL has six entries"),
        };
        Ok(Self {
            writers,
            save_mode: config.save_mode,
            rows_written: 0,
        })
    }

    fn open_one(path: &Path) -> Result<csv::Writer<File>, CsvWriterError> {
        Ok(csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?)
    }

    /// Append one selected event to every output file
    pub fn write_event(&mut self, images: &EventImages) -> Result<(), CsvWriterError> {
        let set = images.csv_set(self.save_mode);
        for (writer, hist) in self.writers.iter_mut().zip(set.iter()) {
            let record: Vec<String> = hist.data().iter().map(|v| v.to_string()).collect();
            writer.write_record(&record)?;
        }
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and close all files, consuming the writer
    pub fn finish(mut self) -> Result<(), CsvWriterError> {
        for writer in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_tank_geometry;
    use crate::projection::{PhiTable, ProjectionPlane};
    use crate::sim_file::{PmtRecord, SimGeometry};
    use std::path::PathBuf;

    fn test_images() -> EventImages {
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
                position: [-200.0, 0.0, 0.0],
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
        EventImages::new(0, &plane, 5, 4, 3, 2)
    }

    #[test]
    fn test_row_layout() {
        let out_dir = std::env::temp_dir().join(format!("csv_writer_test_{}", std::process::id()));
        std::fs::create_dir_all(&out_dir).unwrap();
        let config = Config {
            input_path: PathBuf::from("/data/run.h5"),
            output_path: out_dir.clone(),
            save_mode: SaveMode::PmtWise,
            ..Default::default()
        };

        let mut images = test_images();
        images.charge_pmtwise.set(1, 0, 0.5);
        images.charge_pmtwise.set(2, 1, 0.25);

        let mut writer = CsvWriter::new(&config).unwrap();
        writer.write_event(&images).unwrap();
        writer.write_event(&images).unwrap();
        assert_eq!(writer.rows_written(), 2);
        writer.finish().unwrap();

        let charge_path = config.get_csv_file_name(CsvKind::Charge).unwrap();
        let contents = std::fs::read_to_string(&charge_path).unwrap();
        let rows: Vec<&str> = contents.lines().collect();
        assert_eq!(rows.len(), 2);
        // 3 x 2 pmt-wise image -> 6 values, y-outer order
        assert_eq!(rows[0], "0,0.5,0,0,0,0.25");

        // all six files exist and have the same shape
        for kind in CsvKind::ALL {
            let path = config.get_csv_file_name(kind).unwrap();
            let contents = std::fs::read_to_string(&path).unwrap();
            assert_eq!(contents.lines().count(), 2);
        }

        let _ = std::fs::remove_dir_all(&out_dir);
    }
}
