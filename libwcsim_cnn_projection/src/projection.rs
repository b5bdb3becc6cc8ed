use std::f64::consts::PI;
use std::path::Path;

use super::constants::*;
use super::error::{GeometryError, PhiTableError};
use super::geometry::Geometry;
use super::position::Position;

/// Load the default phi table for windows
#[cfg(target_family = "windows")]
fn load_default_table() -> String {
    String::from(include_str!("data\\default_phi_positions.txt"))
}

/// Load the default phi table for macos and linux
#[cfg(target_family = "unix")]
fn load_default_table() -> String {
    String::from(include_str!("data/default_phi_positions.txt"))
}

/// Round a drawing coordinate to the grid resolution
fn round3(value: f64) -> f64 {
    (1000.0 * value).round() / 1000.0
}

/// Azimuthal angle of a tank-centered position, wrapped into [-pi, pi].
///
/// The angle is assembled quadrant by quadrant from single-argument arctans,
/// with on-axis positions handled explicitly; the result matches the
/// convention of the event display this projection feeds.
pub fn azimuthal_angle(pos: Position) -> f64 {
    let (x, y) = (pos.x(), pos.y());
    let mut phi = if y > 0.0 && x > 0.0 {
        (x / y).atan() + PI / 2.0
    } else if y > 0.0 && x < 0.0 {
        (y / -x).atan()
    } else if y < 0.0 && x < 0.0 {
        3.0 * PI / 2.0 + (x / y).atan()
    } else if y < 0.0 && x > 0.0 {
        PI + (-y / x).atan()
    } else if y.abs() < 0.0001 {
        if x > 0.0 {
            PI
        } else if x < 0.0 {
            2.0 * PI
        } else {
            0.0
        }
    } else if x.abs() < 0.0001 {
        if y > 0.0 {
            0.5 * PI
        } else {
            3.0 * PI / 2.0
        }
    } else {
        0.0
    };
    if phi > 2.0 * PI {
        phi -= 2.0 * PI;
    }
    phi -= PI;
    if phi < -PI {
        phi = -PI;
    }
    if !(-PI..=PI).contains(&phi) {
        spdlog::warn!(
            "Drawing event: phi out of bounds! x={}, y={}, z={}",
            pos.x(),
            pos.y(),
            pos.z()
        );
    }
    phi
}

/// Which part of the cylinder a PMT sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankRegion {
    Barrel,
    TopCap,
    BottomCap,
}

/// The table of azimuthal drawing positions the endcap PMTs snap to.
///
/// One drawing x coordinate per barrel column, one value per line. If no path
/// is given a table bundled with the library is used.
#[derive(Debug, Clone)]
pub struct PhiTable {
    positions: Vec<f64>,
}

impl PhiTable {
    /// Create a new PhiTable
    /// If the path is None, we load the default that is bundled with the library
    pub fn new(path: Option<&Path>) -> Result<Self, PhiTableError> {
        let contents = match path {
            Some(p) => std::fs::read_to_string(p)?,
            None => load_default_table(),
        };

        let mut positions = Vec::new();
        for token in contents.split_whitespace() {
            positions.push(token.parse::<f64>()?);
        }
        if positions.is_empty() {
            return Err(PhiTableError::NoPositions);
        }
        Ok(Self { positions })
    }

    /// Snap a drawing x coordinate to the nearest tabulated position
    pub fn snap(&self, x: f64) -> f64 {
        let mut best = 0.0;
        let mut diff = 100000.0;
        for position in &self.positions {
            let this_diff = (position - x).abs();
            if this_diff < diff {
                best = *position;
                diff = this_diff;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// The unwrapped drawing plane of the tank.
///
/// Built once per input file from the reconstructed geometry: it holds the
/// endcap z limits, the phi table and the per-region grids of rounded PMT
/// drawing coordinates that the pmt-wise images index into.
#[derive(Debug, Clone)]
pub struct ProjectionPlane {
    tank_radius: f64,
    tank_halfheight: f64,
    min_z: f64,
    max_z: f64,
    npmts_y: usize,
    phi_table: PhiTable,
    x_barrel: Vec<f64>,
    x_top: Vec<f64>,
    x_bottom: Vec<f64>,
    y_all: Vec<f64>,
}

impl ProjectionPlane {
    /// Build the drawing plane from the tank PMTs of a geometry.
    ///
    /// Outer-detector PMTs never contribute; endcap PMTs only contribute
    /// when `include_top_bottom` is set.
    pub fn new(
        geometry: &Geometry,
        phi_table: PhiTable,
        include_top_bottom: bool,
        npmts_y: usize,
    ) -> Result<Self, GeometryError> {
        let tank = geometry
            .detectors_in_set("Tank")
            .ok_or(GeometryError::NoTankPmts)?;

        // z limits of the inner detector decide which PMTs are endcap PMTs
        let mut min_z = 1000000.0;
        let mut max_z = -1000000.0;
        for detector in tank.values() {
            if detector.is_od() {
                continue;
            }
            let z = geometry.global_to_tank_centered(detector.position()).z();
            if z > max_z {
                max_z = z;
            }
            if z < min_z {
                min_z = z;
            }
        }
        spdlog::debug!("Tank detector scan finished, max z = {max_z}, min z = {min_z}");

        let mut plane = Self {
            tank_radius: geometry.tank_radius(),
            tank_halfheight: geometry.tank_halfheight(),
            min_z,
            max_z,
            npmts_y,
            phi_table,
            x_barrel: Vec::new(),
            x_top: Vec::new(),
            x_bottom: Vec::new(),
            y_all: Vec::new(),
        };

        // one grid entry per distinct rounded PMT drawing coordinate
        for detector in tank.values() {
            if detector.is_od() {
                continue;
            }
            let pos = geometry.global_to_tank_centered(detector.position());
            let region = plane.region(pos.z());
            if region != TankRegion::Barrel && !include_top_bottom {
                continue;
            }
            let (x, y) = match region {
                TankRegion::TopCap => plane.project_top(pos),
                TankRegion::BottomCap => plane.project_bottom(pos),
                TankRegion::Barrel => plane.project(pos),
            };
            let x = round3(x);
            let y = round3(y);
            match region {
                TankRegion::TopCap => plane.x_top.push(x),
                TankRegion::BottomCap => plane.x_bottom.push(x),
                TankRegion::Barrel => plane.x_barrel.push(x),
            }
            plane.y_all.push(y);
        }

        for grid in [
            &mut plane.x_barrel,
            &mut plane.x_top,
            &mut plane.x_bottom,
            &mut plane.y_all,
        ] {
            grid.sort_by(|a, b| a.partial_cmp(b).unwrap());
            grid.dedup();
        }
        spdlog::debug!(
            "Drawing grids: {} barrel columns, {} top columns, {} bottom columns, {} rows",
            plane.x_barrel.len(),
            plane.x_top.len(),
            plane.x_bottom.len(),
            plane.y_all.len()
        );

        if plane.x_barrel.is_empty() && plane.x_top.is_empty() && plane.x_bottom.is_empty() {
            return Err(GeometryError::NoTankPmts);
        }

        Ok(plane)
    }

    /// Assign a tank-centered z coordinate to a cylinder region
    pub fn region(&self, z: f64) -> TankRegion {
        if z >= self.max_z - ENDCAP_EPS {
            TankRegion::TopCap
        } else if z <= self.min_z + ENDCAP_EPS {
            TankRegion::BottomCap
        } else {
            TankRegion::Barrel
        }
    }

    /// Project a PMT position onto the geometric drawing plane.
    ///
    /// The barrel is unwrapped around the azimuth; the endcaps are drawn as
    /// discs above and below the barrel band.
    pub fn project(&self, pos: Position) -> (f64, f64) {
        let (r, h, s) = (self.tank_radius, self.tank_halfheight, SIZE_TOP_DRAWING);
        if (pos.z() - self.max_z).abs() < ENDCAP_PROJECTION_EPS {
            let x = 0.5 - s * pos.x() / r;
            let y = 0.5 + ((0.45 * h) / r + 1.0) * s - s * pos.y() / r;
            (x, y)
        } else if (pos.z() - self.min_z).abs() < ENDCAP_PROJECTION_EPS {
            let x = 0.5 - s * pos.x() / r;
            let y = 0.5 - (0.45 * h / r + 1.0) * s + s * pos.y() / r;
            (x, y)
        } else {
            let phi = azimuthal_angle(pos);
            let x = 0.5 + phi * s;
            let y = 0.5 + pos.z() / r * s;
            (x, y)
        }
    }

    /// Drawing row of an endcap PMT, counted from the rim inwards
    fn rho_slice(&self, pos: Position) -> usize {
        let rho = pos.perp();
        let mut row = 1;
        for slice in (1..=NUM_RHO_SLICES).rev() {
            if rho > (slice - 1) as f64 * RHO_SLICE_WIDTH {
                row = slice;
                break;
            }
        }
        row
    }

    /// Pmt-wise projection of a top endcap PMT: radial slice row, snapped
    /// azimuthal column
    pub fn project_top(&self, pos: Position) -> (f64, f64) {
        let row = self.rho_slice(pos);
        let y = (BARREL_ROWS + 2 * ENDCAP_ROWS - row) as f64 / self.npmts_y as f64;
        let x = self
            .phi_table
            .snap(0.5 + azimuthal_angle(pos) * SIZE_TOP_DRAWING);
        (x, y)
    }

    /// Pmt-wise projection of a bottom endcap PMT
    pub fn project_bottom(&self, pos: Position) -> (f64, f64) {
        let row = self.rho_slice(pos);
        let y = row as f64 / self.npmts_y as f64;
        let x = self
            .phi_table
            .snap(0.5 + azimuthal_angle(pos) * SIZE_TOP_DRAWING);
        (x, y)
    }

    /// Grid indices of a PMT in the pmt-wise image.
    ///
    /// Returns None when the rounded drawing coordinates are not part of the
    /// grids (the caller skips such PMTs).
    pub fn pmtwise_indices(&self, pos: Position) -> Option<(usize, usize)> {
        let region = self.region(pos.z());
        let (x, y) = match region {
            TankRegion::TopCap => self.project_top(pos),
            TankRegion::BottomCap => self.project_bottom(pos),
            TankRegion::Barrel => self.project(pos),
        };
        let x = round3(x);
        let y = round3(y);
        let xs = match region {
            TankRegion::TopCap => &self.x_top,
            TankRegion::BottomCap => &self.x_bottom,
            TankRegion::Barrel => &self.x_barrel,
        };
        let index_x = xs.iter().position(|v| *v == x)?;
        let index_y = self.y_all.iter().position(|v| *v == y)?;
        Some((index_x, index_y))
    }

    pub fn min_z(&self) -> f64 {
        self.min_z
    }

    pub fn max_z(&self) -> f64 {
        self.max_z
    }

    /// x axis limits of the geometric image
    pub fn geometric_x_range(&self) -> (f64, f64) {
        (
            0.5 - PI * SIZE_TOP_DRAWING,
            0.5 + PI * SIZE_TOP_DRAWING,
        )
    }

    /// y axis limits of the geometric image: the barrel band plus both discs
    pub fn geometric_y_range(&self) -> (f64, f64) {
        let half = (0.45 * self.tank_halfheight / self.tank_radius + 2.0) * SIZE_TOP_DRAWING;
        (0.5 - half, 0.5 + half)
    }
}
