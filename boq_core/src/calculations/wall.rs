//! # Wall Takeoff
//!
//! Derives raw material counts for one wall from its construction type and
//! dimensions. Every count is rounded up (materials are bought whole) and the
//! formulas are evaluated in a fixed left-to-right order so results match the
//! figures already quoted to clients exactly.
//!
//! ## Construction types
//!
//! | `wallType`      | Quantities                                                         |
//! |-----------------|--------------------------------------------------------------------|
//! | `civil`         | bricks, cement bags, sand (cu ft); `subOption` "9 inch" or half brick |
//! | `gypsum`        | boards, rockwool, channels, studs, joint tape, joint compound       |
//! | `plywood`       | plywood sheets, aluminium channels, laminate sheets, rockwool       |
//! | `gypsum-glass`  | boards for the 40% solid part, glass area, aluminium frame          |
//! | `plywood-glass` | sheets for the 50% solid part, glass area, aluminium frame          |
//!
//! A wall with no type, length or height yet is "not yet specified" and
//! produces no takeoff rather than an error.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::calculations::wall::{compute, ComputedMaterials, WallType};
//!
//! let takeoff = compute(Some(WallType::Civil), Some(10.0), Some(8.0), "9 inch", 0.0).unwrap();
//! match takeoff {
//!     ComputedMaterials::Civil(civil) => {
//!         assert_eq!(civil.bricks, 2000);
//!         assert_eq!(civil.cement_bags, 48);
//!         assert_eq!(civil.sand_cubic_ft, 240);
//!     }
//!     _ => unreachable!(),
//! }
//!
//! assert!(compute(Some(WallType::Gypsum), None, Some(8.0), "single", 0.0).is_none());
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{EstimateError, EstimateResult};
use crate::lenient;
use crate::units::{non_negative, CuFt, Feet, Percent, SqFt};

// ============================================================================
// Coverage constants
// ============================================================================

/// Civil: wall thickness for a 9" (full brick) wall
pub const NINE_INCH_THICKNESS_FT: f64 = 0.75;
/// Civil: wall thickness for a 4.5" (half brick) wall
pub const HALF_BRICK_THICKNESS_FT: f64 = 0.375;
/// Civil: face area of one brick
pub const BRICK_FACE_AREA_SQFT: f64 = 0.08;
/// Civil: bricks per face area for a 9" wall relative to half brick
pub const NINE_INCH_BRICK_MULTIPLIER: f64 = 2.0;
/// Civil: masonry volume served by one cement bag
pub const CEMENT_BAG_VOLUME_CUFT: f64 = 1.25;
/// Civil: sand per cubic foot of masonry
pub const SAND_CUFT_PER_CUFT: f64 = 4.0;

/// Boards are fixed on both faces of a drywall partition
pub const FACES_PER_WALL: f64 = 2.0;
/// Gypsum: area of one 4' x 6' board
pub const GYPSUM_BOARD_AREA_SQFT: f64 = 24.0;
/// Rockwool insulation coverage per bag
pub const ROCKWOOL_COVERAGE_SQFT: f64 = 70.0;
/// Gypsum: floor/ceiling channel run length
pub const CHANNEL_LENGTH_FT: f64 = 4.5;
/// Gypsum: channels run along both floor and ceiling
pub const CHANNEL_RUNS: f64 = 2.0;
/// Gypsum: stud spacing along the wall
pub const STUD_SPACING_FT: f64 = 2.0;
/// Gypsum: studs are doubled (one per face frame)
pub const STUDS_PER_POSITION: f64 = 2.0;
/// Gypsum: boards finished per unit of joint compound
pub const BOARDS_PER_COMPOUND_UNIT: f64 = 2.0;

/// Plywood: area of one 8' x 4' sheet
pub const PLYWOOD_SHEET_AREA_SQFT: f64 = 32.0;
/// Plywood: aluminium channel per running foot of wall
pub const ALUMINIUM_CHANNEL_PER_FT: f64 = 1.2;

/// Gypsum-glass: glazed share of the wall
pub const GYPSUM_GLASS_FRACTION: f64 = 0.6;
/// Gypsum-glass: boarded share of the wall
pub const GYPSUM_GLASS_SOLID_FRACTION: f64 = 0.4;
/// Plywood-glass: glazed share of the wall
pub const PLYWOOD_GLASS_FRACTION: f64 = 0.5;
/// Plywood-glass: boarded share of the wall
pub const PLYWOOD_GLASS_SOLID_FRACTION: f64 = 0.5;
/// Glass partitions: glass is double glazed
pub const GLASS_PANES: f64 = 2.0;
/// Glass partitions: perimeter frame is counted on both faces
pub const FRAME_FACES: f64 = 2.0;

/// Civil sub-option selecting a full brick wall
pub const NINE_INCH_SUB_OPTION: &str = "9 inch";
/// Gypsum sub-option marker for double-layer boarding
pub const DOUBLE_LAYER_MARKER: &str = "double";

// ============================================================================
// Input
// ============================================================================

/// Construction method of a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WallType {
    /// Brick masonry
    Civil,
    /// Gypsum drywall partition
    Gypsum,
    /// Plywood partition with laminate finish
    Plywood,
    /// Gypsum partition with a glazed section
    GypsumGlass,
    /// Plywood partition with a glazed section
    PlywoodGlass,
}

impl WallType {
    /// All wall types for UI selection
    pub const ALL: [WallType; 5] = [
        WallType::Civil,
        WallType::Gypsum,
        WallType::Plywood,
        WallType::GypsumGlass,
        WallType::PlywoodGlass,
    ];

    /// Wire code used in stored payloads (e.g. "gypsum-glass")
    pub fn code(&self) -> &'static str {
        match self {
            WallType::Civil => "civil",
            WallType::Gypsum => "gypsum",
            WallType::Plywood => "plywood",
            WallType::GypsumGlass => "gypsum-glass",
            WallType::PlywoodGlass => "plywood-glass",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> EstimateResult<Self> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "civil" | "brick" | "masonry" => Ok(WallType::Civil),
            "gypsum" | "drywall" => Ok(WallType::Gypsum),
            "plywood" | "ply" => Ok(WallType::Plywood),
            "gypsum-glass" | "gypsum+glass" => Ok(WallType::GypsumGlass),
            "plywood-glass" | "plywood+glass" => Ok(WallType::PlywoodGlass),
            _ => Err(EstimateError::invalid_input("wallType", s, "Unknown wall type")),
        }
    }
}

impl std::fmt::Display for WallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A wall as the user specified it.
///
/// ## JSON Example
///
/// ```json
/// { "wallType": "civil", "length": 10, "height": 8, "subOption": "9 inch", "wastagePercent": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallSpec {
    /// Blank or null means "not chosen yet"
    #[serde(default, deserialize_with = "lenient::optional_wall_type")]
    pub wall_type: Option<WallType>,

    /// Wall length in feet
    #[serde(default, deserialize_with = "lenient::optional_feet")]
    pub length: Option<Feet>,

    /// Wall height in feet
    #[serde(default, deserialize_with = "lenient::optional_feet")]
    pub height: Option<Feet>,

    /// Thickness / configuration selector ("9 inch", "single", "double layer", ...)
    #[serde(default)]
    pub sub_option: String,

    /// Wastage allowance (civil only)
    #[serde(default, deserialize_with = "lenient::percent_or_zero")]
    pub wastage_percent: Percent,
}

impl WallSpec {
    /// Create a fully specified wall
    pub fn new(wall_type: WallType, length_ft: f64, height_ft: f64, sub_option: impl Into<String>) -> Self {
        WallSpec {
            wall_type: Some(wall_type),
            length: Some(Feet(length_ft)),
            height: Some(Feet(height_ft)),
            sub_option: sub_option.into(),
            wastage_percent: Percent(0.0),
        }
    }

    /// Set the wastage allowance (builder pattern)
    pub fn with_wastage(mut self, wastage: Percent) -> Self {
        self.wastage_percent = wastage;
        self
    }

    /// Run the takeoff for this wall; `None` when it is not fully specified
    pub fn compute(&self) -> Option<ComputedMaterials> {
        compute(
            self.wall_type,
            self.length.map(Feet::value),
            self.height.map(Feet::value),
            &self.sub_option,
            self.wastage_percent.value(),
        )
    }
}

// ============================================================================
// Results
// ============================================================================

/// Brick masonry quantities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CivilMaterials {
    pub area: SqFt,
    pub bricks: u64,
    pub cement_bags: u64,
    pub sand_cubic_ft: u64,
}

/// Gypsum partition quantities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GypsumMaterials {
    pub area: SqFt,
    pub gypsum_boards: u64,
    pub rockwool_bags: u64,
    pub channels: u64,
    pub studs: u64,
    pub joint_tape: u64,
    pub joint_compound: u64,
}

/// Plywood partition quantities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlywoodMaterials {
    pub area: SqFt,
    pub plywood_sheets: u64,
    pub aluminium_channels: u64,
    pub laminate_sheets: u64,
    pub rockwool_bags: u64,
}

/// Gypsum partition with glazing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GypsumGlassMaterials {
    pub area: SqFt,
    pub gypsum_boards: u64,
    /// Glass in sq ft, rounded up
    pub glass_area: u64,
    pub aluminium_channels: u64,
}

/// Plywood partition with glazing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlywoodGlassMaterials {
    pub area: SqFt,
    pub plywood_sheets: u64,
    /// Glass in sq ft, rounded up
    pub glass_area: u64,
    pub aluminium_channels: u64,
}

/// Takeoff result, one variant per construction type.
///
/// Serializes with a `wallType` discriminator so the JSON matches what the
/// front end renders:
///
/// ```json
/// { "wallType": "gypsum", "area": 80.0, "gypsumBoards": 7, "rockwoolBags": 2,
///   "channels": 5, "studs": 12, "jointTape": 7, "jointCompound": 4 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "wallType", rename_all = "kebab-case")]
pub enum ComputedMaterials {
    Civil(CivilMaterials),
    Gypsum(GypsumMaterials),
    Plywood(PlywoodMaterials),
    GypsumGlass(GypsumGlassMaterials),
    PlywoodGlass(PlywoodGlassMaterials),
}

/// One row of a takeoff as it appears on a schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TakeoffLine {
    pub material: &'static str,
    pub unit: &'static str,
    pub quantity: u64,
}

impl TakeoffLine {
    fn new(material: &'static str, unit: &'static str, quantity: u64) -> Self {
        TakeoffLine { material, unit, quantity }
    }
}

impl ComputedMaterials {
    /// Wall face area
    pub fn area(&self) -> SqFt {
        match self {
            ComputedMaterials::Civil(m) => m.area,
            ComputedMaterials::Gypsum(m) => m.area,
            ComputedMaterials::Plywood(m) => m.area,
            ComputedMaterials::GypsumGlass(m) => m.area,
            ComputedMaterials::PlywoodGlass(m) => m.area,
        }
    }

    /// Construction type this takeoff was computed for
    pub fn wall_type(&self) -> WallType {
        match self {
            ComputedMaterials::Civil(_) => WallType::Civil,
            ComputedMaterials::Gypsum(_) => WallType::Gypsum,
            ComputedMaterials::Plywood(_) => WallType::Plywood,
            ComputedMaterials::GypsumGlass(_) => WallType::GypsumGlass,
            ComputedMaterials::PlywoodGlass(_) => WallType::PlywoodGlass,
        }
    }

    /// Flatten into schedule rows (material, unit, quantity)
    pub fn lines(&self) -> Vec<TakeoffLine> {
        match self {
            ComputedMaterials::Civil(m) => vec![
                TakeoffLine::new("Bricks", "nos", m.bricks),
                TakeoffLine::new("Cement", "bags", m.cement_bags),
                TakeoffLine::new("Sand", "cu ft", m.sand_cubic_ft),
            ],
            ComputedMaterials::Gypsum(m) => vec![
                TakeoffLine::new("Gypsum board", "nos", m.gypsum_boards),
                TakeoffLine::new("Rockwool", "bags", m.rockwool_bags),
                TakeoffLine::new("Channels", "nos", m.channels),
                TakeoffLine::new("Studs", "nos", m.studs),
                TakeoffLine::new("Joint tape", "rolls", m.joint_tape),
                TakeoffLine::new("Joint compound", "bags", m.joint_compound),
            ],
            ComputedMaterials::Plywood(m) => vec![
                TakeoffLine::new("Plywood", "sheets", m.plywood_sheets),
                TakeoffLine::new("Aluminium channel", "nos", m.aluminium_channels),
                TakeoffLine::new("Laminate", "sheets", m.laminate_sheets),
                TakeoffLine::new("Rockwool", "bags", m.rockwool_bags),
            ],
            ComputedMaterials::GypsumGlass(m) => vec![
                TakeoffLine::new("Gypsum board", "nos", m.gypsum_boards),
                TakeoffLine::new("Glass", "sq ft", m.glass_area),
                TakeoffLine::new("Aluminium channel", "nos", m.aluminium_channels),
            ],
            ComputedMaterials::PlywoodGlass(m) => vec![
                TakeoffLine::new("Plywood", "sheets", m.plywood_sheets),
                TakeoffLine::new("Glass", "sq ft", m.glass_area),
                TakeoffLine::new("Aluminium channel", "nos", m.aluminium_channels),
            ],
        }
    }
}

// ============================================================================
// Takeoff
// ============================================================================

/// Round a quantity up to whole purchasable units
fn count(qty: f64) -> u64 {
    let whole = qty.ceil();
    if whole >= u64::MAX as f64 {
        warn!(qty, "quantity beyond countable range, capped");
        return u64::MAX;
    }
    whole as u64
}

/// Treat zero, negative and non-finite dimensions as "not entered yet"
fn dimension(value: Option<f64>) -> Option<Feet> {
    value
        .map(non_negative)
        .filter(|v| *v > 0.0)
        .map(Feet)
}

/// Compute the material takeoff for one wall.
///
/// Returns `None` when `wall_type`, `length` or `height` is missing (or not a
/// positive number): the wall has not been fully specified yet.
/// `wastage_percent` only affects civil walls.
pub fn compute(
    wall_type: Option<WallType>,
    length: Option<f64>,
    height: Option<f64>,
    sub_option: &str,
    wastage_percent: f64,
) -> Option<ComputedMaterials> {
    let wall_type = wall_type?;
    let length = dimension(length)?;
    let height = dimension(height)?;
    let area = length * height;
    let wastage = Percent(wastage_percent).normalized();

    let result = match wall_type {
        WallType::Civil => ComputedMaterials::Civil(civil(area, sub_option, wastage)),
        WallType::Gypsum => ComputedMaterials::Gypsum(gypsum(area, length, sub_option)),
        WallType::Plywood => ComputedMaterials::Plywood(plywood(area, length)),
        WallType::GypsumGlass => ComputedMaterials::GypsumGlass(gypsum_glass(area, length, height)),
        WallType::PlywoodGlass => ComputedMaterials::PlywoodGlass(plywood_glass(area, length, height)),
    };

    debug!(wall_type = %wall_type, area = area.0, sub_option, "computed wall takeoff");
    Some(result)
}

fn civil(area: SqFt, sub_option: &str, wastage: Percent) -> CivilMaterials {
    let wastage_factor = wastage.factor();
    let nine_inch = sub_option == NINE_INCH_SUB_OPTION;
    let thickness = Feet(if nine_inch {
        NINE_INCH_THICKNESS_FT
    } else {
        HALF_BRICK_THICKNESS_FT
    });
    let volume: CuFt = area * thickness;
    let base_bricks = area.0 / BRICK_FACE_AREA_SQFT;
    let multiplier = if nine_inch { NINE_INCH_BRICK_MULTIPLIER } else { 1.0 };

    CivilMaterials {
        area,
        bricks: count(base_bricks * multiplier * wastage_factor),
        cement_bags: count(volume.0 / CEMENT_BAG_VOLUME_CUFT * wastage_factor),
        sand_cubic_ft: count(volume.0 * SAND_CUFT_PER_CUFT * wastage_factor),
    }
}

fn gypsum(area: SqFt, length: Feet, sub_option: &str) -> GypsumMaterials {
    let layers = if sub_option.contains(DOUBLE_LAYER_MARKER) { 2.0 } else { 1.0 };
    let gypsum_boards = count(area.0 / GYPSUM_BOARD_AREA_SQFT * FACES_PER_WALL * layers);

    GypsumMaterials {
        area,
        gypsum_boards,
        rockwool_bags: count(area.0 / ROCKWOOL_COVERAGE_SQFT),
        channels: count(length.0 / CHANNEL_LENGTH_FT * CHANNEL_RUNS),
        studs: count((length.0 / STUD_SPACING_FT + 1.0) * STUDS_PER_POSITION),
        joint_tape: gypsum_boards,
        joint_compound: count(gypsum_boards as f64 / BOARDS_PER_COMPOUND_UNIT),
    }
}

fn plywood(area: SqFt, length: Feet) -> PlywoodMaterials {
    let plywood_sheets = count(area.0 / PLYWOOD_SHEET_AREA_SQFT * FACES_PER_WALL);

    PlywoodMaterials {
        area,
        plywood_sheets,
        aluminium_channels: count(length.0 * ALUMINIUM_CHANNEL_PER_FT),
        laminate_sheets: plywood_sheets,
        rockwool_bags: count(area.0 / ROCKWOOL_COVERAGE_SQFT),
    }
}

/// Perimeter frame shared by both glazed partition types
fn frame_channels(length: Feet, height: Feet) -> u64 {
    count((length.0 + height.0) * FRAME_FACES)
}

fn gypsum_glass(area: SqFt, length: Feet, height: Feet) -> GypsumGlassMaterials {
    GypsumGlassMaterials {
        area,
        gypsum_boards: count(area.0 * GYPSUM_GLASS_SOLID_FRACTION / GYPSUM_BOARD_AREA_SQFT * FACES_PER_WALL),
        glass_area: count(area.0 * GYPSUM_GLASS_FRACTION * GLASS_PANES),
        aluminium_channels: frame_channels(length, height),
    }
}

fn plywood_glass(area: SqFt, length: Feet, height: Feet) -> PlywoodGlassMaterials {
    PlywoodGlassMaterials {
        area,
        plywood_sheets: count(area.0 * PLYWOOD_GLASS_SOLID_FRACTION / PLYWOOD_SHEET_AREA_SQFT * FACES_PER_WALL),
        glass_area: count(area.0 * PLYWOOD_GLASS_FRACTION * GLASS_PANES),
        aluminium_channels: frame_channels(length, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn takeoff(wall_type: WallType, length: f64, height: f64, sub_option: &str, wastage: f64) -> ComputedMaterials {
        compute(Some(wall_type), Some(length), Some(height), sub_option, wastage).unwrap()
    }

    #[test]
    fn test_civil_nine_inch() {
        match takeoff(WallType::Civil, 10.0, 8.0, "9 inch", 0.0) {
            ComputedMaterials::Civil(m) => {
                assert_eq!(m.area, SqFt(80.0));
                assert_eq!(m.bricks, 2000);
                assert_eq!(m.cement_bags, 48);
                assert_eq!(m.sand_cubic_ft, 240);
            }
            other => panic!("expected civil, got {:?}", other),
        }
    }

    #[test]
    fn test_civil_half_brick_with_wastage() {
        match takeoff(WallType::Civil, 10.0, 8.0, "4.5 inch", 5.0) {
            ComputedMaterials::Civil(m) => {
                // 1000 bricks * 1.05, volume 30 cu ft
                assert_eq!(m.bricks, 1050);
                assert_eq!(m.cement_bags, 26);
                assert_eq!(m.sand_cubic_ft, 126);
            }
            other => panic!("expected civil, got {:?}", other),
        }
    }

    #[test]
    fn test_gypsum_single() {
        match takeoff(WallType::Gypsum, 10.0, 8.0, "single", 0.0) {
            ComputedMaterials::Gypsum(m) => {
                assert_eq!(m.gypsum_boards, 7);
                assert_eq!(m.rockwool_bags, 2);
                assert_eq!(m.channels, 5);
                assert_eq!(m.studs, 12);
                assert_eq!(m.joint_tape, 7);
                assert_eq!(m.joint_compound, 4);
            }
            other => panic!("expected gypsum, got {:?}", other),
        }
    }

    #[test]
    fn test_gypsum_double_layer() {
        match takeoff(WallType::Gypsum, 10.0, 8.0, "double layer", 0.0) {
            ComputedMaterials::Gypsum(m) => {
                assert_eq!(m.gypsum_boards, 14);
                assert_eq!(m.joint_tape, 14);
                assert_eq!(m.joint_compound, 7);
            }
            other => panic!("expected gypsum, got {:?}", other),
        }
    }

    #[test]
    fn test_gypsum_ignores_wastage() {
        let plain = takeoff(WallType::Gypsum, 12.5, 9.0, "single", 0.0);
        let wasted = takeoff(WallType::Gypsum, 12.5, 9.0, "single", 25.0);
        assert_eq!(plain, wasted);
        match plain {
            ComputedMaterials::Gypsum(m) => {
                assert_eq!(m.gypsum_boards, 10);
                assert_eq!(m.channels, 6);
                assert_eq!(m.studs, 15);
            }
            other => panic!("expected gypsum, got {:?}", other),
        }
    }

    #[test]
    fn test_plywood() {
        match takeoff(WallType::Plywood, 10.0, 8.0, "", 0.0) {
            ComputedMaterials::Plywood(m) => {
                assert_eq!(m.plywood_sheets, 5);
                assert_eq!(m.aluminium_channels, 12);
                assert_eq!(m.laminate_sheets, 5);
                assert_eq!(m.rockwool_bags, 2);
            }
            other => panic!("expected plywood, got {:?}", other),
        }
    }

    #[test]
    fn test_glass_partitions() {
        match takeoff(WallType::GypsumGlass, 10.0, 8.0, "", 0.0) {
            ComputedMaterials::GypsumGlass(m) => {
                assert_eq!(m.gypsum_boards, 3);
                assert_eq!(m.glass_area, 96);
                assert_eq!(m.aluminium_channels, 36);
            }
            other => panic!("expected gypsum-glass, got {:?}", other),
        }
        match takeoff(WallType::PlywoodGlass, 10.0, 8.0, "", 0.0) {
            ComputedMaterials::PlywoodGlass(m) => {
                assert_eq!(m.plywood_sheets, 3);
                assert_eq!(m.glass_area, 80);
                assert_eq!(m.aluminium_channels, 36);
            }
            other => panic!("expected plywood-glass, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_geometry() {
        assert!(compute(None, Some(10.0), Some(8.0), "9 inch", 0.0).is_none());
        assert!(compute(Some(WallType::Civil), None, Some(8.0), "9 inch", 0.0).is_none());
        assert!(compute(Some(WallType::Civil), Some(10.0), None, "9 inch", 0.0).is_none());
        assert!(compute(Some(WallType::Gypsum), Some(0.0), Some(8.0), "", 0.0).is_none());
        assert!(compute(Some(WallType::Gypsum), Some(f64::NAN), Some(8.0), "", 0.0).is_none());
        assert!(compute(Some(WallType::Gypsum), Some(10.0), Some(-8.0), "", 0.0).is_none());
        assert!(WallSpec::default().compute().is_none());
    }

    #[test]
    fn test_deterministic() {
        for wall_type in WallType::ALL {
            let a = takeoff(wall_type, 13.7, 9.3, "9 inch", 7.5);
            let b = takeoff(wall_type, 13.7, 9.3, "9 inch", 7.5);
            assert_eq!(a, b);
            assert_eq!(a.wall_type(), wall_type);
            assert_eq!(a.area().0.to_bits(), b.area().0.to_bits());
        }
    }

    #[test]
    fn test_spec_json() {
        let json = r#"{ "wallType": "gypsum", "length": "10", "height": 8, "subOption": "single" }"#;
        let spec: WallSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.wall_type, Some(WallType::Gypsum));
        assert_eq!(spec.wastage_percent, Percent(0.0));

        let takeoff = spec.compute().unwrap();
        let out = serde_json::to_value(takeoff).unwrap();
        assert_eq!(out["wallType"], "gypsum");
        assert_eq!(out["gypsumBoards"], 7);
        assert_eq!(out["jointCompound"], 4);
        assert!(out.get("bricks").is_none());
    }

    #[test]
    fn test_spec_json_blank_wall_type_is_unspecified() {
        let json = r#"{ "wallType": "", "length": 10, "height": 8, "subOption": "" }"#;
        let spec: WallSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.wall_type, None);
        assert!(spec.compute().is_none());

        let spec: WallSpec = serde_json::from_str(r#"{ "wallType": null, "length": 10 }"#).unwrap();
        assert_eq!(spec.wall_type, None);
        assert!(serde_json::from_str::<WallSpec>(r#"{ "wallType": "timber" }"#).is_err());
    }

    #[test]
    fn test_large_wall_counts_past_u32() {
        // 2.4e11 sq ft: 1e10 boards per face
        match takeoff(WallType::Gypsum, 2_400_000.0, 100_000.0, "single", 0.0) {
            ComputedMaterials::Gypsum(m) => {
                assert_eq!(m.gypsum_boards, 20_000_000_000);
                assert!(m.gypsum_boards > u32::MAX as u64);
                assert_eq!(m.joint_compound, 10_000_000_000);
            }
            other => panic!("expected gypsum, got {:?}", other),
        }
        match takeoff(WallType::Civil, 200_000.0, 2000.0, "9 inch", 0.0) {
            ComputedMaterials::Civil(m) => {
                assert!(m.bricks >= 10_000_000_000 && m.bricks <= 10_000_000_001);
            }
            other => panic!("expected civil, got {:?}", other),
        }
    }

    #[test]
    fn test_takeoff_lines() {
        let lines = takeoff(WallType::Civil, 10.0, 8.0, "9 inch", 0.0).lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].material, "Bricks");
        assert_eq!(lines[0].quantity, 2000);
    }

    #[test]
    fn test_wall_type_parsing() {
        assert_eq!(WallType::from_str_flexible("Gypsum Glass").unwrap(), WallType::GypsumGlass);
        assert_eq!(WallType::from_str_flexible("plywood_glass").unwrap(), WallType::PlywoodGlass);
        assert_eq!(WallType::from_str_flexible("CIVIL").unwrap(), WallType::Civil);
        assert!(WallType::from_str_flexible("timber").is_err());
    }
}
