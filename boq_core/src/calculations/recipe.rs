//! # Recipe Scaling
//!
//! Scales a material recipe, defined against one reference quantity of
//! installed product (e.g. "per 100 sq ft of partition"), to the quantity
//! actually being installed, and prices every line at supply and install rates.
//!
//! ## Per-line algorithm
//!
//! ```text
//! wastage      = line.wastagePct ?? basis.wastagePctDefault
//! perUnitQty   = baseQty * (1 + wastage/100) / max(ε, baseRequiredQty)
//! scaledQty    = perUnitQty * targetRequiredQty
//! roundOffQty  = purchase rounding of scaledQty (default: ceiling to whole units)
//! supplyAmount = scaledQty * supplyRate
//! installAmount= scaledQty * installRate
//! lineTotal    = supplyAmount + installAmount
//! ```
//!
//! Amounts are priced on `scaledQty`, not on the purchase-rounded quantity.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::calculations::recipe::{scale, ConfigBasis, MaterialLine, RequiredUnitType};
//! use boq_core::units::Percent;
//!
//! let basis = ConfigBasis {
//!     required_unit_type: RequiredUnitType::Sqft,
//!     base_required_qty: 100.0,
//!     wastage_pct_default: Percent(5.0),
//! };
//! let lines = vec![MaterialLine::new("gb", "Gypsum board 12.5mm", "nos", 3.5)
//!     .with_rates(450.0, 120.0)];
//!
//! let result = scale(&basis, &lines, 250.0);
//! assert_eq!(result.computed[0].round_off_qty, 10.0);
//! assert!((result.grand_total - 5236.875).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{EstimateError, EstimateResult};
use crate::lenient;
use crate::units::{non_negative, Percent};

/// Floor applied to `baseRequiredQty` before it is used as a divisor
pub const BASE_QTY_EPSILON: f64 = 1e-9;

/// Float noise tolerated before purchase rounding steps up to the next unit
pub const ROUND_OFF_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Recipe types
// ============================================================================

/// Unit the installed product is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequiredUnitType {
    /// Square feet
    #[default]
    #[serde(alias = "sqft", alias = "SQFT")]
    Sqft,
    /// Numbers (count of units)
    #[serde(alias = "nos", alias = "NOS")]
    Nos,
    /// Running feet
    #[serde(alias = "runningFt", alias = "rft", alias = "RFT")]
    RunningFt,
    /// Square metres
    #[serde(alias = "sqm", alias = "SQM")]
    Sqm,
    /// Running metres
    #[serde(alias = "rmt", alias = "RMT")]
    Rmt,
    /// Cubic feet
    #[serde(alias = "cuft", alias = "CUFT")]
    Cuft,
    /// Lump sum (quantity is always 1 job)
    #[serde(alias = "ls", alias = "LS")]
    LumpSum,
}

impl RequiredUnitType {
    /// All unit variants for UI selection
    pub const ALL: [RequiredUnitType; 7] = [
        RequiredUnitType::Sqft,
        RequiredUnitType::Nos,
        RequiredUnitType::RunningFt,
        RequiredUnitType::Sqm,
        RequiredUnitType::Rmt,
        RequiredUnitType::Cuft,
        RequiredUnitType::LumpSum,
    ];

    /// Short label printed next to quantities on the schedule
    pub fn abbreviation(&self) -> &'static str {
        match self {
            RequiredUnitType::Sqft => "sq ft",
            RequiredUnitType::Nos => "nos",
            RequiredUnitType::RunningFt => "rft",
            RequiredUnitType::Sqm => "sq m",
            RequiredUnitType::Rmt => "rmt",
            RequiredUnitType::Cuft => "cu ft",
            RequiredUnitType::LumpSum => "LS",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> EstimateResult<Self> {
        match s.trim().to_lowercase().replace([' ', '_', '-', '.'], "").as_str() {
            "sqft" | "squarefeet" | "sft" => Ok(RequiredUnitType::Sqft),
            "nos" | "no" | "numbers" | "each" => Ok(RequiredUnitType::Nos),
            "runningft" | "rft" | "runningfeet" => Ok(RequiredUnitType::RunningFt),
            "sqm" | "squaremetres" | "squaremeters" => Ok(RequiredUnitType::Sqm),
            "rmt" | "runningmetres" | "runningmeters" => Ok(RequiredUnitType::Rmt),
            "cuft" | "cft" | "cubicfeet" => Ok(RequiredUnitType::Cuft),
            "ls" | "lumpsum" => Ok(RequiredUnitType::LumpSum),
            _ => Err(EstimateError::invalid_input(
                "requiredUnitType",
                s,
                "Unknown unit type",
            )),
        }
    }
}

impl std::fmt::Display for RequiredUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// The reference frame a recipe's `baseQty` values are written against.
///
/// ## JSON Example
///
/// ```json
/// { "requiredUnitType": "Sqft", "baseRequiredQty": 100, "wastagePctDefault": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigBasis {
    /// Unit the installed product is measured in
    #[serde(default)]
    pub required_unit_type: RequiredUnitType,

    /// Reference quantity (e.g. 100 for "per 100 sq ft")
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub base_required_qty: f64,

    /// Wastage applied to lines that do not carry their own
    #[serde(default)]
    pub wastage_pct_default: Percent,
}

impl ConfigBasis {
    /// Divisor used by the scaling formula; never zero.
    pub fn divisor(&self) -> f64 {
        non_negative(self.base_required_qty).max(BASE_QTY_EPSILON)
    }
}

impl Default for ConfigBasis {
    fn default() -> Self {
        ConfigBasis {
            required_unit_type: RequiredUnitType::Sqft,
            base_required_qty: 1.0,
            wastage_pct_default: Percent(0.0),
        }
    }
}

/// One ingredient of a recipe.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "m-2",
///   "name": "Drywall screws",
///   "unit": "nos",
///   "baseQty": 200,
///   "wastagePct": 10,
///   "supplyRate": 0.5,
///   "installRate": 0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLine {
    #[serde(default, deserialize_with = "lenient::id_string")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Purchasing unit (bags, boards, nos, ...)
    #[serde(default)]
    pub unit: String,

    /// Quantity needed per `baseRequiredQty` of installed product
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub base_qty: f64,

    /// Line-specific wastage; falls back to the basis default when absent
    #[serde(
        default,
        deserialize_with = "lenient::optional_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub wastage_pct: Option<Percent>,

    /// Supply rate, currency per unit
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub supply_rate: f64,

    /// Installation rate, currency per unit
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub install_rate: f64,
}

impl MaterialLine {
    /// Create a line with zero rates and no wastage override
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit: impl Into<String>, base_qty: f64) -> Self {
        MaterialLine {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            base_qty,
            wastage_pct: None,
            supply_rate: 0.0,
            install_rate: 0.0,
        }
    }

    /// Set supply and install rates (builder pattern)
    pub fn with_rates(mut self, supply_rate: f64, install_rate: f64) -> Self {
        self.supply_rate = supply_rate;
        self.install_rate = install_rate;
        self
    }

    /// Override the basis wastage for this line (builder pattern)
    pub fn with_wastage(mut self, wastage: Percent) -> Self {
        self.wastage_pct = Some(wastage);
        self
    }
}

/// Wastage that applies to `line`: its own override, else the basis default.
pub fn effective_wastage(line: &MaterialLine, basis: &ConfigBasis) -> Percent {
    line.wastage_pct
        .unwrap_or(basis.wastage_pct_default)
        .normalized()
}

// ============================================================================
// Purchase rounding
// ============================================================================

/// How `scaledQty` is rounded to something that can actually be bought.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "step", rename_all = "camelCase")]
pub enum RoundOffPolicy {
    /// Ceiling to the next whole unit (bags, boards and sheets are sold whole)
    #[default]
    WholeUnit,
    /// Ceiling to the next multiple of a pack size (e.g. 0.5 for half bags)
    Increment(f64),
    /// Nearest two decimals, for materials sold by measure
    TwoDecimals,
    /// No rounding; `roundOffQty == scaledQty`
    Exact,
}

impl RoundOffPolicy {
    /// Round a non-negative quantity according to this policy.
    pub fn apply(&self, qty: f64) -> f64 {
        let qty = non_negative(qty);
        if qty == 0.0 {
            return 0.0;
        }
        match *self {
            // A positive need always buys at least one unit or pack
            RoundOffPolicy::WholeUnit => (qty - ROUND_OFF_TOLERANCE).ceil().max(1.0),
            RoundOffPolicy::Increment(step) => {
                let step = non_negative(step);
                if step == 0.0 {
                    qty
                } else {
                    (qty / step - ROUND_OFF_TOLERANCE).ceil().max(1.0) * step
                }
            }
            RoundOffPolicy::TwoDecimals => (qty * 100.0).round() / 100.0,
            RoundOffPolicy::Exact => qty,
        }
    }

    /// Parse the CLI / settings form: `whole`, `increment:<step>`, `two-decimals`, `none`
    pub fn from_str_flexible(s: &str) -> EstimateResult<Self> {
        let normalized = s.trim().to_lowercase();
        if let Some(step) = normalized.strip_prefix("increment:") {
            return match step.trim().parse::<f64>() {
                Ok(step) if step.is_finite() && step > 0.0 => Ok(RoundOffPolicy::Increment(step)),
                _ => Err(EstimateError::invalid_input(
                    "roundOffPolicy",
                    s,
                    "Increment must be a positive number",
                )),
            };
        }
        match normalized.as_str() {
            "whole" | "whole-unit" | "ceil" => Ok(RoundOffPolicy::WholeUnit),
            "two-decimals" | "2dp" => Ok(RoundOffPolicy::TwoDecimals),
            "none" | "exact" => Ok(RoundOffPolicy::Exact),
            _ => Err(EstimateError::invalid_input(
                "roundOffPolicy",
                s,
                "Expected whole, increment:<step>, two-decimals or none",
            )),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Engine output for one material line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedLine {
    pub id: String,
    pub name: String,
    pub unit: String,

    /// Wastage actually applied to this line
    pub effective_wastage_pct: Percent,

    /// Material per single unit of installed product
    pub per_unit_qty: f64,

    /// Material for the whole target quantity
    pub scaled_qty: f64,

    /// Purchasable quantity
    pub round_off_qty: f64,

    pub supply_amount: f64,
    pub install_amount: f64,
    pub line_total: f64,
}

/// Scaled recipe with aggregate costs.
///
/// ## JSON Example
///
/// ```json
/// {
///   "computed": [ { "id": "gb", "scaledQty": 9.1875, "roundOffQty": 10, "lineTotal": 5236.875, "...": "..." } ],
///   "totalSupply": 4134.375,
///   "totalInstall": 1102.5,
///   "grandTotal": 5236.875
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledRecipe {
    pub computed: Vec<ComputedLine>,
    pub total_supply: f64,
    pub total_install: f64,
    pub grand_total: f64,
}

// ============================================================================
// Scaling
// ============================================================================

fn compute_line(line: &MaterialLine, basis: &ConfigBasis, target: f64, policy: RoundOffPolicy) -> ComputedLine {
    let wastage = effective_wastage(line, basis);
    let per_unit_qty = non_negative(line.base_qty) * wastage.factor() / basis.divisor();
    let scaled_qty = per_unit_qty * target;
    let supply_amount = scaled_qty * non_negative(line.supply_rate);
    let install_amount = scaled_qty * non_negative(line.install_rate);

    ComputedLine {
        id: line.id.clone(),
        name: line.name.clone(),
        unit: line.unit.clone(),
        effective_wastage_pct: wastage,
        per_unit_qty,
        scaled_qty,
        round_off_qty: policy.apply(scaled_qty),
        supply_amount,
        install_amount,
        line_total: supply_amount + install_amount,
    }
}

/// Scale a recipe to `target_required_qty` with the default purchase rounding.
///
/// Never fails: a non-positive or non-finite target gives zero quantities and
/// amounts, and an empty recipe gives zero totals.
pub fn scale(basis: &ConfigBasis, lines: &[MaterialLine], target_required_qty: f64) -> ScaledRecipe {
    scale_with_policy(basis, lines, target_required_qty, RoundOffPolicy::default())
}

/// Scale a recipe using an explicit purchase rounding policy.
pub fn scale_with_policy(
    basis: &ConfigBasis,
    lines: &[MaterialLine],
    target_required_qty: f64,
    policy: RoundOffPolicy,
) -> ScaledRecipe {
    let target = non_negative(target_required_qty);

    let computed: Vec<ComputedLine> = lines
        .iter()
        .map(|line| compute_line(line, basis, target, policy))
        .collect();

    let total_supply: f64 = computed.iter().map(|c| c.supply_amount).sum();
    let total_install: f64 = computed.iter().map(|c| c.install_amount).sum();
    let grand_total = total_supply + total_install;

    debug!(
        lines = computed.len(),
        target,
        unit = %basis.required_unit_type,
        grand_total,
        "scaled recipe"
    );

    ScaledRecipe {
        computed,
        total_supply,
        total_install,
        grand_total,
    }
}

// ============================================================================
// Stored payload
// ============================================================================

/// Recipe as persisted on a BOQ item.
///
/// The stored document is the recipe, not the result: callers re-run
/// [`RecipePayload::scale`] on every read.
///
/// ## JSON Example
///
/// ```json
/// {
///   "product_name": "Gypsum partition 75mm",
///   "product_id": "p-17",
///   "configBasis": { "requiredUnitType": "Sqft", "baseRequiredQty": 100, "wastagePctDefault": 5 },
///   "materialLines": [
///     { "id": "gb", "name": "Gypsum board", "unit": "nos", "baseQty": 3.5, "supplyRate": 450, "installRate": 120 }
///   ],
///   "targetRequiredQty": 250
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipePayload {
    #[serde(default)]
    pub product_name: String,

    #[serde(default, deserialize_with = "lenient::id_string")]
    pub product_id: String,

    #[serde(rename = "configBasis", default)]
    pub config_basis: ConfigBasis,

    #[serde(rename = "materialLines", default)]
    pub material_lines: Vec<MaterialLine>,

    #[serde(rename = "targetRequiredQty", default, deserialize_with = "lenient::f64_or_zero")]
    pub target_required_qty: f64,
}

impl RecipePayload {
    /// Re-scale the stored recipe with the given purchase rounding policy
    pub fn scale(&self, policy: RoundOffPolicy) -> ScaledRecipe {
        scale_with_policy(
            &self.config_basis,
            &self.material_lines,
            self.target_required_qty,
            policy,
        )
    }

    /// Parse a stored payload from JSON
    pub fn from_json(json: &str) -> EstimateResult<Self> {
        serde_json::from_str(json).map_err(EstimateError::serialization)
    }
}
