//! # Estimation Calculators
//!
//! Three independent, stateless calculators:
//!
//! - [`recipe`] - Scale a per-unit material recipe to a target quantity and price it
//! - [`wall`] - Geometric material takeoff for civil and partition walls
//! - [`financial`] - GST and whole-unit round-off for any subtotal
//!
//! None of them fail on business input. Bad numbers are coerced to zero,
//! a zero reference quantity is clamped, and an unfinished wall simply has no
//! takeoff yet.
//!
//! [`BoqItem`] is what a project stores: the user's specification (a recipe
//! payload or a wall), never the computed result.

pub mod financial;
pub mod recipe;
pub mod wall;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use financial::{finalize, finalize_with, FinalTotals, TaxRates};
pub use recipe::{scale, scale_with_policy, ConfigBasis, MaterialLine, RecipePayload, RoundOffPolicy, ScaledRecipe};
pub use wall::{compute, ComputedMaterials, WallSpec, WallType};

/// A priced product line on the BOQ, stored as its recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItem {
    /// User label (e.g., "Cabin partition", "False ceiling - lobby")
    pub label: String,

    /// Stored recipe, re-scaled on every read
    pub recipe: RecipePayload,
}

/// A wall on the BOQ, stored as the user's dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallItem {
    /// User label (e.g., "W-3", "Conference room east wall")
    pub label: String,

    pub wall: WallSpec,
}

/// Enum wrapper for all BOQ item kinds.
///
/// Serializes with a `type` discriminator so heterogeneous items can live in
/// one project map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoqItem {
    /// Product priced from a material recipe
    Recipe(RecipeItem),
    /// Wall quantified by geometric takeoff
    Wall(WallItem),
}

impl BoqItem {
    /// Get the user-provided label for this item
    pub fn label(&self) -> &str {
        match self {
            BoqItem::Recipe(r) => &r.label,
            BoqItem::Wall(w) => &w.label,
        }
    }

    /// Get the item type as a string
    pub fn item_type(&self) -> &'static str {
        match self {
            BoqItem::Recipe(_) => "Recipe",
            BoqItem::Wall(_) => "Wall",
        }
    }
}
