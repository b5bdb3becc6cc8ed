use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum SimFileError {
    #[error("Could not open simulation file because {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Simulation file has an empty geometry record")]
    EmptyGeometry,
    #[error("Simulation file is missing event {0}")]
    MissingEvent(usize),
    #[error("Simulation file failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Simulation file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Geometry was given a detector with non-unique key {0}")]
    DuplicateDetectorKey(u64),
    #[error("Geometry was given a channel with non-unique key {0}")]
    DuplicateChannelKey(u64),
    #[error("Geometry was given a PMT with non-unique tube number {0}")]
    DuplicateTubeId(i32),
    #[error("Geometry contains no tank PMTs")]
    NoTankPmts,
}

#[derive(Debug, Error)]
pub enum PhiTableError {
    #[error("PhiTable failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("PhiTable failed to parse a value: {0}")]
    ParsingError(#[from] std::num::ParseFloatError),
    #[error("PhiTable was given a file with no entries")]
    NoPositions,
}

#[derive(Debug, Error)]
pub enum EventBuilderError {
    #[error("Event contains a digit on tube {0} with no associated channel key")]
    UnmappedTube(i32),
    #[error("Event digit references photons {0}..{1} outside of the photon list (len {2})")]
    BadPhotonRange(i32, i32, usize),
}

#[derive(Debug, Error)]
pub enum CsvWriterError {
    #[error("CsvWriter could not create output as directory {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("CsvWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("CsvWriter failed to write a record: {0}")]
    CsvError(#[from] csv::Error),
    #[error("CsvWriter failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum HistWriterError {
    #[error("HistWriter failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("HistWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to simulation file error: {0}")]
    SimFileError(#[from] SimFileError),
    #[error("Processor failed due to Geometry error: {0}")]
    GeometryError(#[from] GeometryError),
    #[error("Processor failed due to PhiTable error: {0}")]
    PhiTableError(#[from] PhiTableError),
    #[error("Processor failed due to EventBuilder error: {0}")]
    EventBuilderError(#[from] EventBuilderError),
    #[error("Processor failed due to CsvWriter error: {0}")]
    CsvError(#[from] CsvWriterError),
    #[error("Processor failed due to HistWriter error: {0}")]
    HistError(#[from] HistWriterError),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}
