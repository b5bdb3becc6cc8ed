use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{BARREL_ROWS, ENDCAP_ROWS, PMTS_PER_ROW};
use super::error::ConfigError;

/// How hit times are averaged per PMT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataMode {
    /// Plain mean of all in-window hit times on a PMT
    #[default]
    Normal,
    /// Charge-weighted mean of the in-window hit times
    ChargeWeighted,
}

/// Which of the two image layouts ends up in the CSV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveMode {
    /// The fixed-dimension unwrapped-cylinder image
    Geometric,
    /// One image column/row per physical PMT
    #[default]
    PmtWise,
}

/// The kind of per-event CSV product. Each kind gets its own output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvKind {
    Charge,
    Time,
    FirstTime,
    ChargeAbs,
    TimeAbs,
    FirstTimeAbs,
}

impl CsvKind {
    pub const ALL: [CsvKind; 6] = [
        CsvKind::Charge,
        CsvKind::Time,
        CsvKind::FirstTime,
        CsvKind::ChargeAbs,
        CsvKind::TimeAbs,
        CsvKind::FirstTimeAbs,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            CsvKind::Charge => "_charge.csv",
            CsvKind::Time => "_time.csv",
            CsvKind::FirstTime => "_firsttime.csv",
            CsvKind::ChargeAbs => "_charge_abs.csv",
            CsvKind::TimeAbs => "_time_abs.csv",
            CsvKind::FirstTimeAbs => "_firsttime_abs.csv",
        }
    }
}

/// Structure representing the application configuration. Contains pathing and
/// image settings. Configs are serializable and deserializable to YAML using
/// serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub output_prefix: String,
    pub phi_positions_path: Option<PathBuf>,
    pub data_mode: DataMode,
    pub save_mode: SaveMode,
    pub dimension_x: usize,
    pub dimension_y: usize,
    pub include_top_bottom: bool,
    pub use_smeared_digit_time: bool,
    pub allow_flag_zero: bool,
    pub trigger_offset_ns: f64,
    pub time_window_min_ns: f64,
    pub time_window_max_ns: f64,
    pub verbose: bool,
}

impl Default for Config {
    /// Generate a new Config object. Paths will be empty/invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            output_path: PathBuf::from("None"),
            output_prefix: String::from("atmospheric"),
            phi_positions_path: None,
            data_mode: DataMode::Normal,
            save_mode: SaveMode::PmtWise,
            dimension_x: 151,
            dimension_y: 101,
            include_top_bottom: true,
            use_smeared_digit_time: true,
            allow_flag_zero: true,
            trigger_offset_ns: 0.0,
            time_window_min_ns: 800.0,
            time_window_max_ns: 1200.0,
            verbose: false,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Stem shared by every output file: the configured prefix plus the
    /// input file stem
    pub fn output_stem(&self) -> String {
        let stem = self
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("unknown"));
        format!("{}_{}", self.output_prefix, stem)
    }

    /// Get the path to one of the CSV output files
    pub fn get_csv_file_name(&self, kind: CsvKind) -> Result<PathBuf, ConfigError> {
        let csv_path = self
            .output_path
            .join(format!("{}{}", self.output_stem(), kind.suffix()));
        if self.output_path.exists() {
            Ok(csv_path)
        } else {
            Err(ConfigError::BadFilePath(self.output_path.clone()))
        }
    }

    /// Get the path to the histogram output file
    pub fn get_hist_file_name(&self) -> Result<PathBuf, ConfigError> {
        let hist_path = self.output_path.join(format!("{}.h5", self.output_stem()));
        if self.output_path.exists() {
            Ok(hist_path)
        } else {
            Err(ConfigError::BadFilePath(self.output_path.clone()))
        }
    }

    /// Columns of the pmt-wise image; one per PMT in a barrel row
    pub fn npmts_x(&self) -> usize {
        PMTS_PER_ROW
    }

    /// Rows of the pmt-wise image, with or without the endcap rows
    pub fn npmts_y(&self) -> usize {
        if self.include_top_bottom {
            BARREL_ROWS + 2 * ENDCAP_ROWS
        } else {
            BARREL_ROWS
        }
    }

    pub fn time_window(&self) -> (f64, f64) {
        (self.time_window_min_ns, self.time_window_max_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.dimension_x, config.dimension_x);
        assert_eq!(back.data_mode, config.data_mode);
        assert_eq!(back.save_mode, config.save_mode);
        assert_eq!(back.output_prefix, config.output_prefix);
        assert!(back.phi_positions_path.is_none());
    }

    #[test]
    fn test_output_names() {
        let config = Config {
            input_path: PathBuf::from("/data/wcsim_atmospheric_SK.0.0.h5"),
            output_path: std::env::temp_dir(),
            ..Default::default()
        };
        let charge = config.get_csv_file_name(CsvKind::Charge).unwrap();
        assert!(charge
            .to_string_lossy()
            .ends_with("atmospheric_wcsim_atmospheric_SK.0.0_charge.csv"));
        let hist = config.get_hist_file_name().unwrap();
        assert!(hist
            .to_string_lossy()
            .ends_with("atmospheric_wcsim_atmospheric_SK.0.0.h5"));
    }

    #[test]
    fn test_missing_output_dir() {
        let config = Config {
            output_path: PathBuf::from("/definitely/not/a/real/dir"),
            ..Default::default()
        };
        assert!(config.get_csv_file_name(CsvKind::Time).is_err());
        assert!(config.get_hist_file_name().is_err());
    }

    #[test]
    fn test_pmtwise_dimensions() {
        let mut config = Config::default();
        assert_eq!(config.npmts_x(), 150);
        assert_eq!(config.npmts_y(), 101);
        config.include_top_bottom = false;
        assert_eq!(config.npmts_y(), 51);
    }
}
