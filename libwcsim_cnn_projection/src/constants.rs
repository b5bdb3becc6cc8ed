//! Constants of the detector readout and of the 2D drawing.

/// PDG code of the neutron
pub const PDG_NEUTRON: i32 = 2112;
/// PDG code of the positron
pub const PDG_POSITRON: i32 = -11;
/// PDG code of the photon
pub const PDG_GAMMA: i32 = 22;
/// Prompt IBD candidates (positrons, gammas) must start below this energy [MeV]
pub const IBD_PROMPT_MAX_ENERGY: f64 = 100.0;

/// WCSim stores lengths in centimeters, the toolchain geometry uses meters
pub const CM_PER_M: f64 = 100.0;

/// Scale of the unwrapped cylinder drawing
pub const SIZE_TOP_DRAWING: f64 = 0.1;
/// Width of one radial slice on the endcaps [m]
pub const RHO_SLICE_WIDTH: f64 = 0.6666666;
/// Number of radial slices on each endcap
pub const NUM_RHO_SLICES: usize = 25;
/// Rows of barrel PMTs
pub const BARREL_ROWS: usize = 51;
/// Extra PMT rows contributed by each endcap
pub const ENDCAP_ROWS: usize = 25;
/// PMTs in a single barrel row
pub const PMTS_PER_ROW: usize = 150;

/// Tolerance for assigning a PMT to an endcap [m]
pub const ENDCAP_EPS: f64 = 0.001;
/// Tolerance used by the geometric endcap projection [m]
pub const ENDCAP_PROJECTION_EPS: f64 = 0.01;

// Electronics addresses are filled monotonically, they're arbitrary for simulation
pub const ADC_CHANNELS_PER_CARD: u32 = 4;
pub const ADC_CARDS_PER_CRATE: u32 = 20;
pub const MT_CHANNELS_PER_CARD: u32 = 4;
pub const MT_CARDS_PER_CRATE: u32 = 20;
pub const HV_CHANNELS_PER_CARD: u32 = 16;
pub const HV_CARDS_PER_CRATE: u32 = 10;

/// Radius of the PMT support structure; measured with a tape measure on the frame
pub const PMT_ENCLOSED_RADIUS: f64 = 1.0;
/// Half-height of the PMT support structure
pub const PMT_ENCLOSED_HALFHEIGHT: f64 = 1.45;
/// Version tag of the reconstructed toolchain geometry
pub const GEOMETRY_VERSION: f64 = 1.0;
