//! # Project Data Structures
//!
//! The `Project` struct is the root container for a Bill of Quantities.
//! Projects serialize to `.boq` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, estimator, job info, timestamps)
//! ├── settings: EstimateSettings (tax rates, purchase rounding, currency)
//! └── items: HashMap<Uuid, BoqItem> (stored recipes and walls)
//! ```
//!
//! Items hold what the user specified. [`Project::summarize`] re-runs the
//! calculators over every item on each call, so an edited target quantity or
//! wall dimension is always reflected consistently.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::project::Project;
//!
//! let project = Project::new("Priya Estimator", "FO-2025-014", "Acme Interiors");
//! let summary = project.summarize();
//! assert!(summary.recipes.is_empty());
//! assert!(summary.totals.reconciles());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calculations::financial::{finalize_with, FinalTotals, TaxRates};
use crate::calculations::recipe::{RequiredUnitType, RoundOffPolicy, ScaledRecipe};
use crate::calculations::wall::ComputedMaterials;
use crate::calculations::BoqItem;
use crate::errors::{EstimateError, EstimateResult};
use crate::units::non_negative;

/// Current schema version for .boq files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
///
/// This is the top-level struct that gets serialized to `.boq` files.
/// Items are stored in a flat UUID-keyed map for O(1) lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, estimator, job info)
    pub meta: ProjectMetadata,

    /// Estimate settings (tax, rounding, currency)
    #[serde(default)]
    pub settings: EstimateSettings,

    /// All BOQ items, keyed by UUID
    #[serde(default)]
    pub items: HashMap<Uuid, BoqItem>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Arguments
    ///
    /// * `estimator` - Name of the person preparing the BOQ
    /// * `job_id` - Job/project number (e.g., "FO-2025-014")
    /// * `client` - Client name
    pub fn new(estimator: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                estimator: estimator.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: EstimateSettings::default(),
            items: HashMap::new(),
        }
    }

    /// Add a BOQ item to the project.
    ///
    /// Returns the UUID assigned to the item.
    ///
    /// # Example
    ///
    /// ```rust
    /// use boq_core::project::Project;
    /// use boq_core::calculations::{BoqItem, WallSpec, WallType};
    /// use boq_core::calculations::WallItem;
    ///
    /// let mut project = Project::new("Estimator", "FO-001", "Client");
    /// let id = project.add_item(BoqItem::Wall(WallItem {
    ///     label: "W-1".to_string(),
    ///     wall: WallSpec::new(WallType::Gypsum, 10.0, 8.0, "single"),
    /// }));
    /// assert!(project.items.contains_key(&id));
    /// ```
    pub fn add_item(&mut self, item: BoqItem) -> Uuid {
        let id = Uuid::new_v4();
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove a BOQ item by UUID.
    ///
    /// Returns the removed item if it existed.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<BoqItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    /// Get a BOQ item by UUID.
    pub fn get_item(&self, id: &Uuid) -> Option<&BoqItem> {
        self.items.get(id)
    }

    /// Get a BOQ item by UUID, or an `ItemNotFound` error.
    pub fn require_item(&self, id: &Uuid) -> EstimateResult<&BoqItem> {
        self.items
            .get(id)
            .ok_or_else(|| EstimateError::item_not_found(id.to_string()))
    }

    /// Change the quantity a stored recipe is scaled to.
    ///
    /// The recipe itself is untouched; the next [`Project::summarize`] re-scales
    /// it. Negative and non-finite targets are stored as 0.
    pub fn set_recipe_target(&mut self, id: &Uuid, target_required_qty: f64) -> EstimateResult<()> {
        match self.items.get_mut(id) {
            Some(BoqItem::Recipe(r)) => r.recipe.target_required_qty = non_negative(target_required_qty),
            Some(BoqItem::Wall(w)) => {
                return Err(EstimateError::invalid_input(
                    "targetRequiredQty",
                    w.label.as_str(),
                    "Walls are sized by length and height, not a target quantity",
                ))
            }
            None => return Err(EstimateError::item_not_found(id.to_string())),
        }
        self.touch();
        Ok(())
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Number of items in the project
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items in display order: by label, then by id.
    pub fn ordered_items(&self) -> Vec<(&Uuid, &BoqItem)> {
        let mut items: Vec<_> = self.items.iter().collect();
        items.sort_by(|(a_id, a), (b_id, b)| a.label().cmp(b.label()).then(a_id.cmp(b_id)));
        items
    }

    /// Re-scale every stored recipe, take off every wall and finalize the total.
    ///
    /// Walls carry no rates, so only recipe items contribute to the subtotal.
    pub fn summarize(&self) -> BoqSummary {
        let mut recipes = Vec::new();
        let mut walls = Vec::new();

        for (id, item) in self.ordered_items() {
            match item {
                BoqItem::Recipe(r) => recipes.push(RecipeSummary {
                    id: *id,
                    label: r.label.clone(),
                    product_name: r.recipe.product_name.clone(),
                    required_unit_type: r.recipe.config_basis.required_unit_type,
                    target_required_qty: r.recipe.target_required_qty,
                    scaled: r.recipe.scale(self.settings.round_off_policy),
                }),
                BoqItem::Wall(w) => walls.push(WallSummary {
                    id: *id,
                    label: w.label.clone(),
                    takeoff: w.wall.compute(),
                }),
            }
        }

        let subtotal: f64 = recipes.iter().map(|r| r.scaled.grand_total).sum();
        let totals = finalize_with(subtotal, &self.settings.tax);

        debug!(
            recipes = recipes.len(),
            walls = walls.len(),
            grand_total = %totals.grand_total,
            "summarized project"
        );

        BoqSummary {
            currency: self.settings.currency.clone(),
            recipes,
            walls,
            totals,
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the person preparing the BOQ
    pub estimator: String,

    /// Job/project number
    pub job_id: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Per-project estimate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSettings {
    /// GST rates applied to the BOQ subtotal
    #[serde(default)]
    pub tax: TaxRates,

    /// Purchase rounding for recipe quantities
    #[serde(default)]
    pub round_off_policy: RoundOffPolicy,

    /// ISO currency code shown on schedules
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "INR".to_string()
}

impl Default for EstimateSettings {
    fn default() -> Self {
        EstimateSettings {
            tax: TaxRates::default(),
            round_off_policy: RoundOffPolicy::default(),
            currency: default_currency(),
        }
    }
}

/// Scaled result for one recipe item
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub label: String,
    pub product_name: String,
    pub required_unit_type: RequiredUnitType,
    pub target_required_qty: f64,
    pub scaled: ScaledRecipe,
}

/// Takeoff for one wall item (`None` while the wall is incomplete)
#[derive(Debug, Clone, Serialize)]
pub struct WallSummary {
    pub id: Uuid,
    pub label: String,
    pub takeoff: Option<ComputedMaterials>,
}

/// Whole-project view produced by [`Project::summarize`].
#[derive(Debug, Clone, Serialize)]
pub struct BoqSummary {
    pub currency: String,
    pub recipes: Vec<RecipeSummary>,
    pub walls: Vec<WallSummary>,
    pub totals: FinalTotals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::recipe::{ConfigBasis, MaterialLine, RecipePayload};
    use crate::calculations::wall::{WallSpec, WallType};
    use crate::calculations::{RecipeItem, WallItem};
    use crate::units::Percent;
    use rust_decimal_macros::dec;

    fn partition_recipe(target: f64) -> BoqItem {
        BoqItem::Recipe(RecipeItem {
            label: "Cabin partition".to_string(),
            recipe: RecipePayload {
                product_name: "Gypsum partition 75mm".to_string(),
                product_id: "p-17".to_string(),
                config_basis: ConfigBasis {
                    required_unit_type: RequiredUnitType::Sqft,
                    base_required_qty: 100.0,
                    wastage_pct_default: Percent(5.0),
                },
                material_lines: vec![
                    MaterialLine::new("gb", "Gypsum board", "nos", 3.5).with_rates(450.0, 120.0),
                ],
                target_required_qty: target,
            },
        })
    }

    fn wall(label: &str, length: Option<f64>) -> BoqItem {
        let mut spec = WallSpec::new(WallType::Gypsum, 10.0, 8.0, "single");
        spec.length = length.map(crate::units::Feet);
        BoqItem::Wall(WallItem {
            label: label.to_string(),
            wall: spec,
        })
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("Priya", "FO-001", "Acme Interiors");
        assert_eq!(project.meta.estimator, "Priya");
        assert_eq!(project.meta.job_id, "FO-001");
        assert_eq!(project.meta.client, "Acme Interiors");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings.currency, "INR");
        assert_eq!(project.settings.round_off_policy, RoundOffPolicy::WholeUnit);
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Priya", "FO-042", "Test Client");
        project.add_item(partition_recipe(250.0));
        let json = serde_json::to_string_pretty(&project).unwrap();

        assert!(json.contains("FO-042"));
        assert!(json.contains("\"configBasis\""));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.estimator, "Priya");
        assert_eq!(roundtrip.item_count(), 1);
        assert_eq!(roundtrip.settings, project.settings);
    }

    #[test]
    fn test_add_remove_item() {
        let mut project = Project::new("Estimator", "FO-001", "Client");

        let id = project.add_item(wall("W-1", Some(10.0)));
        assert_eq!(project.item_count(), 1);
        assert!(project.get_item(&id).is_some());
        assert!(project.require_item(&id).is_ok());

        let removed = project.remove_item(&id);
        assert!(removed.is_some());
        assert_eq!(project.item_count(), 0);
        assert_eq!(
            project.require_item(&id).unwrap_err().error_code(),
            "ITEM_NOT_FOUND"
        );
    }

    #[test]
    fn test_summary_rescales_on_read() {
        let mut project = Project::new("Estimator", "FO-001", "Client");
        let id = project.add_item(partition_recipe(250.0));
        project.add_item(wall("W-1", Some(10.0)));
        project.add_item(wall("W-2", None));

        let summary = project.summarize();
        assert_eq!(summary.recipes.len(), 1);
        assert!((summary.recipes[0].scaled.grand_total - 5236.875).abs() < 1e-6);
        // 5236.875 * 1.18 = 6179.5125, no early rounding to cents
        assert!((summary.totals.subtotal - dec!(5236.875)).abs() < dec!(0.000001));
        assert_eq!(summary.totals.grand_total, dec!(6180));
        assert!(summary.totals.reconciles());

        assert_eq!(summary.walls.len(), 2);
        assert_eq!(summary.walls[0].label, "W-1");
        assert!(summary.walls[0].takeoff.is_some());
        assert!(summary.walls[1].takeoff.is_none());

        // Edit the stored target; the next read reflects it
        project.set_recipe_target(&id, 0.0).unwrap();
        let summary = project.summarize();
        assert_eq!(summary.recipes[0].scaled.grand_total, 0.0);
        assert_eq!(summary.totals.grand_total, dec!(0));
    }

    #[test]
    fn test_summary_uses_project_rounding() {
        let mut project = Project::new("Estimator", "FO-001", "Client");
        project.settings.round_off_policy = RoundOffPolicy::Exact;
        project.add_item(partition_recipe(250.0));

        let summary = project.summarize();
        assert!((summary.recipes[0].scaled.computed[0].round_off_qty - 9.1875).abs() < 1e-9);
    }

    #[test]
    fn test_settings_default_when_missing() {
        let json = r#"{
            "meta": {
                "version": "0.1.0",
                "estimator": "Priya",
                "job_id": "FO-9",
                "client": "Acme",
                "created": "2025-01-01T00:00:00Z",
                "modified": "2025-01-01T00:00:00Z"
            }
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.settings, EstimateSettings::default());
        assert_eq!(project.item_count(), 0);
    }

    #[test]
    fn test_set_recipe_target() {
        let mut project = Project::new("Estimator", "FO-001", "Client");
        let recipe = project.add_item(partition_recipe(250.0));
        let wall_id = project.add_item(wall("W-1", Some(10.0)));

        project.set_recipe_target(&recipe, 500.0).unwrap();
        assert!((project.summarize().recipes[0].scaled.grand_total - 10473.75).abs() < 1e-6);

        project.set_recipe_target(&recipe, f64::NAN).unwrap();
        assert_eq!(project.summarize().recipes[0].target_required_qty, 0.0);

        let err = project.set_recipe_target(&wall_id, 10.0).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        let err = project.set_recipe_target(&Uuid::new_v4(), 10.0).unwrap_err();
        assert_eq!(err.error_code(), "ITEM_NOT_FOUND");
    }
}
