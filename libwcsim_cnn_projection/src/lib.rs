//! # wcsim_cnn_projection
//!
//! wcsim_cnn_projection reads water-Cherenkov detector-simulation (WCSim)
//! output, reconstructs a simplified toolchain geometry, applies an inverse-
//! beta-decay-like (IBD) event selection, projects the PMT hit charge/time
//! information onto 2D images and writes them as CSV and histogram files for
//! downstream convolutional-neural-network training.
//!
//! ## Input
//!
//! The tool consumes a WCSim *export* file: the content of the simulation
//! event and geometry trees repackaged as an HDF5 file. The expected layout
//! is:
//!
//! ```text
//! export.h5
//! geometry - cyl_radius_cm, cyl_length_cm, offset_x/y/z_cm
//! |---- pmts(dset) - tube_no, cyl_loc, position[3], orientation[3]
//! events - n_events
//! |---- event_#  - event_number, trigger_time_ns
//! |    |---- tracks(dset)      one record per simulated particle
//! |    |---- digi_hits(dset)   one record per digitized PMT hit
//! |    |---- photon_ids(dset)  flattened digit -> photon indices
//! |    |---- hit_times(dset)   true photon times and parent track ids
//! ```
//!
//! A missing file or an empty geometry record terminates processing
//! immediately; there is no recovery.
//!
//! ## Configuration
//!
//! Configuration is a YAML file (a template can be generated with the CLI's
//! `new` subcommand):
//!
//! ```yml
//! input_path: None
//! output_path: None
//! output_prefix: atmospheric
//! phi_positions_path: null
//! data_mode: Normal
//! save_mode: PmtWise
//! dimension_x: 151
//! dimension_y: 101
//! include_top_bottom: true
//! use_smeared_digit_time: true
//! allow_flag_zero: true
//! trigger_offset_ns: 0.0
//! time_window_min_ns: 800.0
//! time_window_max_ns: 1200.0
//! verbose: false
//! ```
//!
//! Note that if the `phi_positions_path` field is set to `null`, a snapping
//! table bundled with the library is used.
//!
//! ## Output
//!
//! For every event passing the IBD-like selection (at least one neutron and
//! at least one low-energy positron or gamma) the tool appends one row to
//! each of six CSV files:
//!
//! ```text
//! <prefix>_<input stem>_charge.csv
//! <prefix>_<input stem>_time.csv
//! <prefix>_<input stem>_firsttime.csv
//! <prefix>_<input stem>_charge_abs.csv
//! <prefix>_<input stem>_time_abs.csv
//! <prefix>_<input stem>_firsttime_abs.csv
//! ```
//!
//! Each row is the selected image (geometric or pmt-wise, per `save_mode`)
//! flattened row-major with the y loop outermost. The normalized files scale
//! per event to the brightest PMT and the observed time range; the `_abs`
//! files carry the raw values.
//!
//! The per-event histograms additionally land in `<prefix>_<input stem>.h5`:
//!
//! ```text
//! events - version, n_events_written, n_triggers
//! |---- event_#
//! |    |---- cnn_charge_#(dset) ... cnn_firsttime_abs_pmtwise_#(dset)
//! |    |---- hit_times(dset)
//! |    |---- pmt_charges(dset)
//! ```
pub mod channel_map;
pub mod config;
pub mod constants;
pub mod csv_writer;
pub mod error;
pub mod event;
pub mod event_builder;
pub mod geometry;
pub mod hist;
pub mod hist_writer;
pub mod images;
pub mod position;
pub mod process;
pub mod projection;
pub mod selection;
pub mod sim_file;
