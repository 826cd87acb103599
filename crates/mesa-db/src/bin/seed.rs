//! # Seed Data Generator
//!
//! Populates the database with a realistic demo restaurant for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p mesa-db --bin seed
//!
//! # Specify database path
//! cargo run -p mesa-db --bin seed -- --db ./data/mesa.db
//! ```
//!
//! ## Generated Data
//! - Ingredients with stock (pollo, tortilla, queso, papa, refresco, ...)
//! - Simple products (bottled drinks wrapping one ingredient)
//! - Menu items with recipes (tacos, quesadillas)
//! - A menu item with variants (tortas de pollo / de res)
//! - A combo with fixed components and a required drink choice
//! - Dining tables

use std::env;

use mesa_core::{Ingredient, Money, StockQty};
use mesa_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, unit, stock_milli, min_milli, unit_cost_cents)
const INGREDIENTS: &[(&str, &str, i64, i64, i64)] = &[
    ("Pollo", "kg", 10_000, 2_000, 8_900),
    ("Res", "kg", 6_000, 2_000, 12_500),
    ("Tortilla", "pz", 200_000, 40_000, 150),
    ("Queso", "kg", 4_000, 1_000, 9_800),
    ("Papa", "kg", 8_000, 2_000, 2_400),
    ("Refresco", "pz", 48_000, 12_000, 1_200),
    ("Agua", "pz", 36_000, 12_000, 800),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./mesa_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mesa POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./mesa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mesa POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.ingredients().list_active().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} ingredients", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding ingredients...");

    let mut ingredient_ids = std::collections::HashMap::new();
    for (name, unit, stock_milli, min_milli, unit_cost_cents) in INGREDIENTS {
        let ingredient = build_ingredient(name, unit, *stock_milli, *min_milli, *unit_cost_cents);
        ingredient_ids.insert(*name, ingredient.id.clone());
        db.ingredients().insert(&ingredient).await?;
    }
    println!("  {} ingredients", INGREDIENTS.len());

    println!("Seeding catalog...");
    let catalog = db.catalog();

    // Simple products: one ingredient, one unit per sale
    let refresco = catalog
        .insert_simple_product(
            "Refresco 600ml",
            Money::from_cents(2_500),
            &ingredient_ids["Refresco"],
            StockQty::from_units(1),
        )
        .await?;
    catalog
        .insert_simple_product(
            "Agua 600ml",
            Money::from_cents(1_500),
            &ingredient_ids["Agua"],
            StockQty::from_units(1),
        )
        .await?;

    // Menu items with recipes
    let tacos = catalog
        .insert_menu_item("Tacos al pastor (orden)", Money::from_cents(1_800))
        .await?;
    catalog
        .add_recipe_line_for_product(&tacos, &ingredient_ids["Pollo"], StockQty::from_milli(200), "kg")
        .await?;
    catalog
        .add_recipe_line_for_product(&tacos, &ingredient_ids["Tortilla"], StockQty::from_units(3), "pz")
        .await?;

    let quesadilla = catalog
        .insert_menu_item("Quesadilla", Money::from_cents(1_500))
        .await?;
    catalog
        .add_recipe_line_for_product(&quesadilla, &ingredient_ids["Tortilla"], StockQty::from_units(1), "pz")
        .await?;
    catalog
        .add_recipe_line_for_product(&quesadilla, &ingredient_ids["Queso"], StockQty::from_milli(150), "kg")
        .await?;

    // Menu item with variants: availability follows the best variant
    let torta = catalog
        .insert_menu_item("Torta", Money::from_cents(1_200))
        .await?;
    let torta_pollo = catalog
        .insert_variant(&torta, "Torta de pollo", Money::from_cents(1_200))
        .await?;
    catalog
        .add_recipe_line_for_variant(&torta_pollo, &ingredient_ids["Pollo"], StockQty::from_milli(250), "kg")
        .await?;
    let torta_res = catalog
        .insert_variant(&torta, "Torta de res", Money::from_cents(1_400))
        .await?;
    catalog
        .add_recipe_line_for_variant(&torta_res, &ingredient_ids["Res"], StockQty::from_milli(250), "kg")
        .await?;

    // Combo: fixed tacos + papas, required drink choice
    let papas = catalog
        .insert_simple_product(
            "Papas (porción)",
            Money::from_cents(1_000),
            &ingredient_ids["Papa"],
            StockQty::from_milli(500),
        )
        .await?;
    let combo = catalog
        .insert_combo("Combo Mesa", Money::from_cents(4_500))
        .await?;
    catalog.add_combo_component(&combo, &tacos).await?;
    catalog.add_combo_component(&combo, &papas).await?;
    let drinks = catalog.add_choice_group(&combo, "Bebida", true).await?;
    catalog
        .add_choice_option(&drinks, &refresco, Money::zero())
        .await?;

    println!("  7 products (2 simple, 3 menu, 1 combo, 2 variants)");

    println!("Seeding dining tables...");
    for n in 1..=6 {
        db.tables().insert(&format!("Mesa {n}")).await?;
    }
    println!("  6 tables");

    println!();
    println!("Verifying availability...");
    let menu = db.availability().menu().await?;
    for entry in &menu {
        println!("  {:<28} {:>5}", entry.sellable.name(), entry.available);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn build_ingredient(
    name: &str,
    unit: &str,
    stock_milli: i64,
    min_milli: i64,
    unit_cost_cents: i64,
) -> Ingredient {
    let now = chrono::Utc::now();
    Ingredient {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        unit: unit.to_string(),
        quantity_milli: stock_milli,
        min_quantity_milli: min_milli,
        max_quantity_milli: None,
        unit_cost_cents,
        expires_at: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
