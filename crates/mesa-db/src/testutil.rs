//! Shared fixtures for mesa-db tests: an in-memory database seeded with a
//! small taquería catalog.

use chrono::Utc;
use uuid::Uuid;

use crate::pool::{Database, DbConfig};
use mesa_core::{CashSession, Ingredient, Money, StockQty};

/// Seeded ids the tests reference.
pub struct Fixture {
    pub db: Database,
    /// 10.000 kg of pollo.
    pub pollo: String,
    /// 300 tortillas.
    pub tortilla: String,
    /// 3 refrescos.
    pub refresco: String,
    /// 4.000 kg of papa.
    pub papa: String,
    /// Menu item: 0.200 kg pollo + 3 tortillas per order, $18.00.
    pub tacos: String,
    /// Simple product: 1 refresco per unit, $25.00.
    pub refresco_producto: String,
    /// Simple product: 0.500 kg papa per portion, $10.00.
    pub papas_producto: String,
    /// Combo: tacos + papas fixed, required drink choice, $45.00 base.
    pub combo: String,
    /// The combo's only drink option (refresco, no adjustment).
    pub drink_option: String,
}

pub fn ingredient(name: &str, unit: &str, stock_milli: i64) -> Ingredient {
    let now = Utc::now();
    Ingredient {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        unit: unit.to_string(),
        quantity_milli: stock_milli,
        min_quantity_milli: 0,
        max_quantity_milli: None,
        unit_cost_cents: 1_000,
        expires_at: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub async fn fixture() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let pollo = ingredient("Pollo", "kg", 10_000);
    let tortilla = ingredient("Tortilla", "pz", 300_000);
    let refresco = ingredient("Refresco", "pz", 3_000);
    let papa = ingredient("Papa", "kg", 4_000);
    for ing in [&pollo, &tortilla, &refresco, &papa] {
        db.ingredients().insert(ing).await.unwrap();
    }

    let catalog = db.catalog();

    let tacos = catalog
        .insert_menu_item("Tacos al pastor", Money::from_cents(1_800))
        .await
        .unwrap();
    catalog
        .add_recipe_line_for_product(&tacos, &pollo.id, StockQty::from_milli(200), "kg")
        .await
        .unwrap();
    catalog
        .add_recipe_line_for_product(&tacos, &tortilla.id, StockQty::from_units(3), "pz")
        .await
        .unwrap();

    let refresco_producto = catalog
        .insert_simple_product(
            "Refresco 600ml",
            Money::from_cents(2_500),
            &refresco.id,
            StockQty::from_units(1),
        )
        .await
        .unwrap();

    let papas_producto = catalog
        .insert_simple_product(
            "Papas",
            Money::from_cents(1_000),
            &papa.id,
            StockQty::from_milli(500),
        )
        .await
        .unwrap();

    let combo = catalog
        .insert_combo("Combo Mesa", Money::from_cents(4_500))
        .await
        .unwrap();
    catalog.add_combo_component(&combo, &tacos).await.unwrap();
    catalog
        .add_combo_component(&combo, &papas_producto)
        .await
        .unwrap();
    let drinks = catalog
        .add_choice_group(&combo, "Bebida", true)
        .await
        .unwrap();
    let drink_option = catalog
        .add_choice_option(&drinks, &refresco_producto, Money::zero())
        .await
        .unwrap();

    Fixture {
        db,
        pollo: pollo.id,
        tortilla: tortilla.id,
        refresco: refresco.id,
        papa: papa.id,
        tacos,
        refresco_producto,
        papas_producto,
        combo,
        drink_option,
    }
}

impl Fixture {
    /// Opens and persists a cash session (sales reference it by FK).
    pub async fn session(&self) -> CashSession {
        self.db
            .sessions()
            .open(&format!("cashier-{}", Uuid::new_v4()))
            .await
            .unwrap()
    }

    /// Current stock of one ingredient, in milli-units.
    pub async fn stock_milli(&self, ingredient_id: &str) -> i64 {
        self.db
            .ingredients()
            .get_by_id(ingredient_id)
            .await
            .unwrap()
            .unwrap()
            .quantity_milli
    }
}
