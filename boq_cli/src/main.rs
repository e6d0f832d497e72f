//! # BOQ CLI
//!
//! Command line front end for the estimation engine: scale a stored recipe,
//! take off a wall, finalize a subtotal, or build and summarize a `.boq`
//! project file.
//!
//! Human-readable output goes to stdout; pass `--json` for machine output.
//! Diagnostics go to stderr and are controlled by `RUST_LOG` or `--verbose`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use boq_core::calculations::financial::{finalize_with, FinalTotals, TaxRates};
use boq_core::calculations::recipe::{RecipePayload, RoundOffPolicy, ScaledRecipe};
use boq_core::calculations::wall::{compute, ComputedMaterials, WallSpec, WallType};
use boq_core::calculations::{BoqItem, RecipeItem, WallItem};
use boq_core::file_io::{create_project, load_project_with_holder, update_project};
use boq_core::project::{BoqSummary, Project};
use boq_core::units::{Feet, Percent};
use boq_core::{EstimateError, EstimateResult};

#[derive(Parser)]
#[command(name = "boq")]
#[command(version)]
#[command(about = "Bill of Quantities estimator", long_about = None)]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Log calculation traces to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scale a stored recipe payload (JSON file) to its target quantity
    Scale {
        /// Recipe payload file
        payload: PathBuf,

        /// Purchase rounding: whole, increment:<step>, two-decimals or none
        #[arg(long, default_value = "whole")]
        rounding: String,
    },

    /// Material takeoff for one wall
    Wall(WallArgs),

    /// Add GST and round a subtotal to a whole currency unit
    Finalize {
        /// Subtotal before tax
        subtotal: f64,

        #[command(flatten)]
        tax: TaxArgs,
    },

    /// Create an empty project file
    New {
        /// Project file to create (.boq)
        project: PathBuf,

        #[arg(long, default_value = "")]
        estimator: String,

        #[arg(long, default_value = "")]
        job: String,

        #[arg(long, default_value = "")]
        client: String,
    },

    /// Add a recipe item to a project
    AddRecipe {
        project: PathBuf,

        /// Recipe payload file
        payload: PathBuf,

        #[arg(long)]
        label: String,

        /// Identifier recorded in the lock file
        #[arg(long, default_value = "boq-cli")]
        user: String,
    },

    /// Add a wall item to a project
    AddWall {
        project: PathBuf,

        #[arg(long)]
        label: String,

        #[command(flatten)]
        wall: WallArgs,

        /// Identifier recorded in the lock file
        #[arg(long, default_value = "boq-cli")]
        user: String,
    },

    /// Change the quantity a stored recipe is scaled to
    SetTarget {
        project: PathBuf,

        /// Item id printed by add-recipe
        item: String,

        /// New target quantity in the recipe's unit
        quantity: f64,

        /// Identifier recorded in the lock file
        #[arg(long, default_value = "boq-cli")]
        user: String,
    },

    /// Re-scale every item in a project and print the totals
    Summary {
        project: PathBuf,
    },
}

#[derive(Args)]
struct WallArgs {
    /// civil, gypsum, plywood, gypsum-glass or plywood-glass
    #[arg(long = "type")]
    wall_type: Option<String>,

    /// Wall length (ft)
    #[arg(long)]
    length: Option<f64>,

    /// Wall height (ft)
    #[arg(long)]
    height: Option<f64>,

    /// Thickness / configuration, e.g. "9 inch" or "double"
    #[arg(long, default_value = "")]
    sub_option: String,

    /// Wastage percent (civil walls)
    #[arg(long, default_value_t = 0.0)]
    wastage: f64,
}

impl WallArgs {
    fn to_spec(&self) -> EstimateResult<WallSpec> {
        let wall_type = self
            .wall_type
            .as_deref()
            .map(WallType::from_str_flexible)
            .transpose()?;
        Ok(WallSpec {
            wall_type,
            length: self.length.map(Feet),
            height: self.height.map(Feet),
            sub_option: self.sub_option.clone(),
            wastage_percent: Percent(self.wastage),
        })
    }
}

#[derive(Args)]
struct TaxArgs {
    /// SGST percent
    #[arg(long, default_value_t = 9.0)]
    sgst: f64,

    /// CGST percent
    #[arg(long, default_value_t = 9.0)]
    cgst: f64,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> EstimateResult<()> {
    match &cli.command {
        Command::Scale { payload, rounding } => {
            let policy = RoundOffPolicy::from_str_flexible(rounding)?;
            let recipe = read_payload(payload)?;
            let scaled = recipe.scale(policy);
            if cli.json {
                print_json(&scaled)
            } else {
                print_recipe(&recipe, &scaled);
                Ok(())
            }
        }
        Command::Wall(args) => {
            let spec = args.to_spec()?;
            let takeoff = compute(
                spec.wall_type,
                spec.length.map(Feet::value),
                spec.height.map(Feet::value),
                &spec.sub_option,
                spec.wastage_percent.value(),
            );
            if cli.json {
                print_json(&takeoff)
            } else {
                print_takeoff(takeoff.as_ref());
                Ok(())
            }
        }
        Command::Finalize { subtotal, tax } => {
            let rates = TaxRates::from_percentages(tax.sgst, tax.cgst);
            let totals = finalize_with(*subtotal, &rates);
            if cli.json {
                print_json(&totals)
            } else {
                print_totals(&totals, "");
                Ok(())
            }
        }
        Command::New {
            project,
            estimator,
            job,
            client,
        } => {
            create_project(&Project::new(estimator.as_str(), job.as_str(), client.as_str()), project)?;
            println!("Created {}", project.display());
            Ok(())
        }
        Command::AddRecipe {
            project,
            payload,
            label,
            user,
        } => {
            let recipe = read_payload(payload)?;
            let item = BoqItem::Recipe(RecipeItem {
                label: label.clone(),
                recipe,
            });
            let id = update_project(project, user.as_str(), |p| Ok(p.add_item(item)))?;
            println!("Added recipe '{}' as {}", label, id);
            Ok(())
        }
        Command::AddWall {
            project,
            label,
            wall,
            user,
        } => {
            let item = BoqItem::Wall(WallItem {
                label: label.clone(),
                wall: wall.to_spec()?,
            });
            let id = update_project(project, user.as_str(), |p| Ok(p.add_item(item)))?;
            println!("Added wall '{}' as {}", label, id);
            Ok(())
        }
        Command::SetTarget {
            project,
            item,
            quantity,
            user,
        } => {
            let id = Uuid::parse_str(item.trim())
                .map_err(|e| EstimateError::invalid_input("item", item.as_str(), e.to_string()))?;
            update_project(project, user.as_str(), |p| p.set_recipe_target(&id, *quantity))?;
            println!("Set target of {} to {}", id, quantity);
            Ok(())
        }
        Command::Summary { project } => {
            let (loaded, holder) = load_project_with_holder(project)?;
            if let Some(holder) = holder {
                eprintln!(
                    "Note: {} is being edited by {} since {}",
                    project.display(),
                    holder.user,
                    holder.since.to_rfc3339()
                );
            }
            let summary = loaded.summarize();
            if cli.json {
                print_json(&summary)
            } else {
                print_summary(&loaded, &summary);
                Ok(())
            }
        }
    }
}

fn read_payload(path: &Path) -> EstimateResult<RecipePayload> {
    let contents = std::fs::read_to_string(path).map_err(EstimateError::io("read", path))?;
    let payload = RecipePayload::from_json(&contents)?;
    debug!(path = %path.display(), lines = payload.material_lines.len(), "read recipe payload");
    Ok(payload)
}

fn print_json<T: Serialize>(value: &T) -> EstimateResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(EstimateError::serialization)?;
    println!("{}", json);
    Ok(())
}

fn rule() {
    println!("═══════════════════════════════════════════════════════════════════════");
}

fn print_recipe(recipe: &RecipePayload, scaled: &ScaledRecipe) {
    rule();
    println!(
        "  {}  ({} {})",
        if recipe.product_name.is_empty() { "Recipe" } else { recipe.product_name.as_str() },
        recipe.target_required_qty,
        recipe.config_basis.required_unit_type
    );
    rule();
    println!(
        "  {:<24} {:>10} {:>8} {:>12} {:>12}",
        "Material", "Qty", "Buy", "Supply", "Install"
    );
    for line in &scaled.computed {
        println!(
            "  {:<24} {:>10.3} {:>8} {:>12.2} {:>12.2}",
            line.name,
            line.scaled_qty,
            format!("{} {}", line.round_off_qty, line.unit),
            line.supply_amount,
            line.install_amount
        );
    }
    println!();
    println!("  Supply:  {:>12.2}", scaled.total_supply);
    println!("  Install: {:>12.2}", scaled.total_install);
    println!("  Total:   {:>12.2}", scaled.grand_total);
}

fn print_takeoff(takeoff: Option<&ComputedMaterials>) {
    match takeoff {
        Some(takeoff) => {
            rule();
            println!("  {} wall, {:.2} sq ft", takeoff.wall_type(), takeoff.area().value());
            rule();
            for line in takeoff.lines() {
                println!("  {:<20} {:>8} {}", line.material, line.quantity, line.unit);
            }
        }
        None => println!("Wall not fully specified (type, length and height are required)"),
    }
}

fn print_totals(totals: &FinalTotals, currency: &str) {
    let totals = totals.for_display();
    println!("  Subtotal:    {:>14} {}", totals.subtotal, currency);
    println!("  SGST:        {:>14} {}", totals.sgst, currency);
    println!("  CGST:        {:>14} {}", totals.cgst, currency);
    println!("  Round off:   {:>14} {}", totals.round_off, currency);
    println!("  Grand total: {:>14} {}", totals.grand_total, currency);
}

fn print_summary(project: &Project, summary: &BoqSummary) {
    rule();
    println!(
        "  BOQ {}  |  {}  |  {}",
        project.meta.job_id, project.meta.client, project.meta.estimator
    );
    rule();
    for recipe in &summary.recipes {
        println!(
            "  {:<30} {:>10} {:<6} {:>14.2}",
            recipe.label,
            recipe.target_required_qty,
            recipe.required_unit_type.to_string(),
            recipe.scaled.grand_total
        );
    }
    if !summary.walls.is_empty() {
        println!();
        println!("  Wall takeoffs:");
        for wall in &summary.walls {
            match &wall.takeoff {
                Some(takeoff) => {
                    let items: Vec<String> = takeoff
                        .lines()
                        .iter()
                        .map(|l| format!("{} {} {}", l.quantity, l.unit, l.material.to_lowercase()))
                        .collect();
                    println!("  {:<20} {}", wall.label, items.join(", "));
                }
                None => println!("  {:<20} (incomplete)", wall.label),
            }
        }
    }
    println!();
    print_totals(&summary.totals, &summary.currency);
}
