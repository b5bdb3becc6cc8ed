use std::sync::{Arc, Mutex};

use super::config::Config;
use super::csv_writer::CsvWriter;
use super::error::ProcessorError;
use super::event_builder::EventBuilder;
use super::geometry::build_tank_geometry;
use super::hist::Hist1D;
use super::hist_writer::HistWriter;
use super::images::{tally_event, EventImages};
use super::projection::{PhiTable, ProjectionPlane};
use super::selection::{count_ibd_particles, find_true_vertex};
use super::sim_file::SimFile;

/// The main loop of the projection toolchain.
///
/// Processes one simulation export file top to bottom: reconstruct the
/// geometry, build the drawing plane, then loop the events building, tallying,
/// selecting and writing. The shared fraction is the progress handle for a UI
/// thread; the data path itself is strictly sequential.
pub fn process(config: Config, status: Arc<Mutex<f32>>) -> Result<(), ProcessorError> {
    let sim = SimFile::open(&config.input_path)?;
    spdlog::info!(
        "Opened {} with total size: {}",
        sim.path().to_string_lossy(),
        human_bytes::human_bytes(sim.size_bytes() as f64)
    );

    let geometry_record = sim.read_geometry()?;
    let (geometry, tube_map) = build_tank_geometry(&geometry_record)?;
    geometry.log_summary();

    let phi_table = PhiTable::new(config.phi_positions_path.as_deref())?;
    let plane = ProjectionPlane::new(
        &geometry,
        phi_table,
        config.include_top_bottom,
        config.npmts_y(),
    )?;

    let builder = EventBuilder::new(tube_map, &config);
    let mut csv_writer = CsvWriter::new(&config)?;
    let mut hist_writer = HistWriter::new(&config.get_hist_file_name()?)?;

    let n_events = sim.event_count();
    spdlog::info!("File has {} events", n_events);

    let mut num_triggers: u64 = 0;
    for event_index in 0..n_events {
        let raw = sim.read_event(event_index)?;
        let event = builder.build_event(&raw)?;
        if event.has_hits() {
            num_triggers += 1;
        }

        let mut h_time = Hist1D::new(format!("hit_times_{event_index}"), 2000, 0.0, 2000.0);
        let mut h_charge = Hist1D::new(format!("pmt_charges_{event_index}"), 2000, 0.0, 100.0);
        let tally = tally_event(
            &event,
            &geometry,
            config.data_mode,
            config.time_window(),
            &mut h_time,
            &mut h_charge,
        );
        let bounds = tally.norm_bounds();

        let counts = count_ibd_particles(&event.particles);
        let vertex = find_true_vertex(&event.particles);
        if config.verbose {
            spdlog::debug!(
                "Event {}: {} particles, {} hit PMTs, total charge {:.2}, vertex ({:.2}, {:.2}, {:.2})",
                event_index,
                event.particles.len(),
                tally.hit_keys().len(),
                tally.total_charge(),
                vertex.x(),
                vertex.y(),
                vertex.z()
            );
            spdlog::debug!(
                "Event {}: neutrons {}+{}, gammas {}+{}, positrons {}",
                event_index,
                counts.neutrons,
                counts.secondary_neutrons,
                counts.gammas,
                counts.secondary_gammas,
                counts.positrons
            );
        }

        let mut images = EventImages::new(
            event_index,
            &plane,
            config.dimension_x,
            config.dimension_y,
            config.npmts_x(),
            config.npmts_y(),
        );
        images.fill(&geometry, &plane, &tally, &bounds, config.include_top_bottom);

        if counts.is_ibd_like() {
            hist_writer.write_event(raw.event_number, &images, &h_time, &h_charge)?;
            csv_writer.write_event(&images)?;
        }

        if let Ok(mut fraction) = status.lock() {
            *fraction = (event_index + 1) as f32 / n_events as f32;
        }
    }

    let rows = csv_writer.rows_written();
    csv_writer.finish()?;
    hist_writer.close(num_triggers)?;
    spdlog::info!("Selected {} of {} events", rows, n_events);
    Ok(())
}
