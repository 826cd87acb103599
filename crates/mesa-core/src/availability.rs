//! # Availability Resolver
//!
//! Computes the sellable quantity of every product shape from current
//! ingredient stock.
//!
//! ## One Algorithm, Four Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Sellable                    availability                           │
//! │  ───────────────────────     ───────────────────────────────────    │
//! │  Simple product              floor(stock / cost_per_unit)           │
//! │  Menu item (recipe)          min over lines floor(stock / need)     │
//! │  Menu item (with variants)   max over variants' availability        │
//! │  Variant                     min over lines floor(stock / need)     │
//! │  Combo                       fixed components all available AND     │
//! │                              every required choice has an option    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//! Simple products, menu items, and variants all reduce to the same
//! floor-division over `(ingredient, quantity needed)` pairs; the shapes
//! differ only in where those pairs come from.
//!
//! Everything here is a pure function of a [`StockLevels`] snapshot, so the
//! resolver is safe to call at arbitrarily high frequency (digital-menu
//! clients poll it) and trivially safe to re-run inside a checkout
//! transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::quantity::StockQty;
use crate::types::RecipeLine;

/// Bounded ceiling reported for sellables with no recipe lines.
///
/// Not true infinity, so downstream arithmetic stays bounded. Far above the
/// per-line quantity cap, so a valid order can never exhaust it.
pub const UNLIMITED_AVAILABILITY: i64 = 9_999;

// =============================================================================
// Stock snapshot
// =============================================================================

/// Point-in-time view of ingredient stock, keyed by ingredient id.
///
/// Inactive (soft-deleted) ingredients must be inserted as zero or omitted;
/// a missing ingredient reads as zero stock, which zeroes any recipe that
/// depends on it.
#[derive(Debug, Clone, Default)]
pub struct StockLevels {
    levels: HashMap<String, StockQty>,
}

impl StockLevels {
    pub fn new() -> Self {
        StockLevels {
            levels: HashMap::new(),
        }
    }

    pub fn insert(&mut self, ingredient_id: impl Into<String>, qty: StockQty) {
        self.levels.insert(ingredient_id.into(), qty);
    }

    /// Stock for one ingredient; missing means zero.
    pub fn get(&self, ingredient_id: &str) -> StockQty {
        self.levels
            .get(ingredient_id)
            .copied()
            .unwrap_or_else(StockQty::zero)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl FromIterator<(String, StockQty)> for StockLevels {
    fn from_iter<I: IntoIterator<Item = (String, StockQty)>>(iter: I) -> Self {
        StockLevels {
            levels: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Sellable shapes
// =============================================================================

/// A product that wraps one ingredient directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleProduct {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub ingredient_id: String,
    /// Ingredient consumed per unit sold.
    pub cost_per_unit: StockQty,
    pub is_available: bool,
}

/// A recipe-based menu item, optionally carrying variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub recipe: Vec<RecipeLine>,
    pub variants: Vec<VariantItem>,
    pub is_available: bool,
}

/// A variant with its own recipe and price, availability computed
/// independently of its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub recipe: Vec<RecipeLine>,
    pub is_available: bool,
}

/// A combo of fixed components plus customer-choice slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combo {
    pub id: String,
    pub name: String,
    pub base_price: Money,
    /// Sellables always included, resolved at load time.
    pub fixed_components: Vec<Sellable>,
    pub choice_groups: Vec<ChoiceGroup>,
    pub is_available: bool,
}

/// One customer-choice slot in a combo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceGroup {
    pub id: String,
    pub name: String,
    /// A required group must have at least one available option for the
    /// combo to be sellable.
    pub required: bool,
    pub options: Vec<ChoiceOption>,
}

/// One pickable option inside a choice group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub sellable: Sellable,
    pub price_adjustment: Money,
}

/// The closed set of sellable shapes, resolved once at catalog load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Sellable {
    Simple(SimpleProduct),
    Menu(MenuItem),
    Variant(VariantItem),
    Combo(Combo),
}

impl Sellable {
    pub fn id(&self) -> &str {
        match self {
            Sellable::Simple(p) => &p.id,
            Sellable::Menu(m) => &m.id,
            Sellable::Variant(v) => &v.id,
            Sellable::Combo(c) => &c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Sellable::Simple(p) => &p.name,
            Sellable::Menu(m) => &m.name,
            Sellable::Variant(v) => &v.name,
            Sellable::Combo(c) => &c.name,
        }
    }

    /// Catalog price (combos: base price before choice adjustments).
    pub fn unit_price(&self) -> Money {
        match self {
            Sellable::Simple(p) => p.price,
            Sellable::Menu(m) => m.price,
            Sellable::Variant(v) => v.price,
            Sellable::Combo(c) => c.base_price,
        }
    }

    /// Maximum integer quantity currently sellable given `stock`.
    ///
    /// A sellable flagged unavailable is always 0 regardless of stock.
    pub fn available_quantity(&self, stock: &StockLevels) -> i64 {
        match self {
            Sellable::Simple(p) => {
                if !p.is_available {
                    return 0;
                }
                // Degenerate consumption rate guards against division noise.
                stock.get(&p.ingredient_id).units_available(p.cost_per_unit)
            }
            Sellable::Menu(m) => {
                if !m.is_available {
                    return 0;
                }
                if m.variants.is_empty() {
                    recipe_availability(&m.recipe, stock)
                } else {
                    // Customer can buy whichever variant still has stock.
                    m.variants
                        .iter()
                        .map(|v| Sellable::variant_availability(v, stock))
                        .max()
                        .unwrap_or(UNLIMITED_AVAILABILITY)
                }
            }
            Sellable::Variant(v) => Sellable::variant_availability(v, stock),
            Sellable::Combo(c) => c.available_quantity(stock),
        }
    }

    fn variant_availability(v: &VariantItem, stock: &StockLevels) -> i64 {
        if !v.is_available {
            return 0;
        }
        recipe_availability(&v.recipe, stock)
    }
}

/// Floor-division availability over a list of recipe lines.
///
/// - No lines (or only degenerate lines with non-positive need): the
///   [`UNLIMITED_AVAILABILITY`] sentinel.
/// - Otherwise the minimum across lines of `floor(stock / need)`; a missing
///   or empty ingredient zeroes the whole item (hard dependency).
pub fn recipe_availability(lines: &[RecipeLine], stock: &StockLevels) -> i64 {
    let mut min_units: Option<i64> = None;

    for line in lines {
        let needed = line.quantity_needed();
        if !needed.is_positive() {
            continue;
        }
        let units = stock.get(&line.ingredient_id).units_available(needed);
        min_units = Some(match min_units {
            Some(current) => current.min(units),
            None => units,
        });
    }

    min_units.unwrap_or(UNLIMITED_AVAILABILITY)
}

impl Combo {
    /// A combo is fully sellable only if every fixed component is available
    /// and every required choice group has at least one available option.
    pub fn is_fully_available(&self, stock: &StockLevels) -> bool {
        if !self.is_available {
            return false;
        }
        let fixed_ok = self
            .fixed_components
            .iter()
            .all(|c| c.available_quantity(stock) > 0);
        let choices_ok = self.choice_groups.iter().all(|group| {
            !group.required
                || group
                    .options
                    .iter()
                    .any(|opt| opt.sellable.available_quantity(stock) > 0)
        });
        fixed_ok && choices_ok
    }

    /// Integer availability: min across fixed components and, per required
    /// group, the best available option; 0 when not fully available.
    pub fn available_quantity(&self, stock: &StockLevels) -> i64 {
        if !self.is_fully_available(stock) {
            return 0;
        }

        let mut min_units = UNLIMITED_AVAILABILITY;
        for component in &self.fixed_components {
            min_units = min_units.min(component.available_quantity(stock));
        }
        for group in self.choice_groups.iter().filter(|g| g.required) {
            let best = group
                .options
                .iter()
                .map(|opt| opt.sellable.available_quantity(stock))
                .max()
                .unwrap_or(0);
            min_units = min_units.min(best);
        }
        min_units
    }

    /// Price for a concrete selection: base plus each selected option's
    /// adjustment, floored at zero.
    pub fn price_with(&self, selections: &[&ChoiceOption]) -> Money {
        let mut price = self.base_price;
        for option in selections {
            price += option.price_adjustment;
        }
        price.max_zero()
    }
}

// =============================================================================
// Consumption accumulation
// =============================================================================

/// Per-ingredient consumption deltas, accumulated before application so a
/// sellable appearing twice in a sale is debited once for its combined
/// quantity.
pub type ConsumptionMap = HashMap<String, StockQty>;

/// Accumulates the ingredient consumption of selling `quantity` units of a
/// sellable into `acc`.
///
/// Combos consume their fixed components' ingredients; choice selections
/// adjust price at the boundary and are not deducted.
pub fn accumulate_consumption(sellable: &Sellable, quantity: i64, acc: &mut ConsumptionMap) {
    match sellable {
        Sellable::Simple(p) => {
            if p.cost_per_unit.is_positive() {
                add_consumption(acc, &p.ingredient_id, p.cost_per_unit.times(quantity));
            }
        }
        Sellable::Menu(m) => accumulate_recipe(&m.recipe, quantity, acc),
        Sellable::Variant(v) => accumulate_recipe(&v.recipe, quantity, acc),
        Sellable::Combo(c) => {
            for component in &c.fixed_components {
                accumulate_consumption(component, quantity, acc);
            }
        }
    }
}

fn accumulate_recipe(lines: &[RecipeLine], quantity: i64, acc: &mut ConsumptionMap) {
    for line in lines {
        let needed = line.quantity_needed();
        if needed.is_positive() {
            add_consumption(acc, &line.ingredient_id, needed.times(quantity));
        }
    }
}

fn add_consumption(acc: &mut ConsumptionMap, ingredient_id: &str, qty: StockQty) {
    let entry = acc
        .entry(ingredient_id.to_string())
        .or_insert_with(StockQty::zero);
    *entry += qty;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_line(id: &str, ingredient: &str, needed_milli: i64) -> RecipeLine {
        RecipeLine {
            id: id.to_string(),
            ingredient_id: ingredient.to_string(),
            quantity_needed_milli: needed_milli,
            unit: "kg".to_string(),
        }
    }

    fn simple(id: &str, ingredient: &str, cost_per_unit_milli: i64) -> Sellable {
        Sellable::Simple(SimpleProduct {
            id: id.to_string(),
            name: format!("Simple {id}"),
            price: Money::from_cents(2500),
            ingredient_id: ingredient.to_string(),
            cost_per_unit: StockQty::from_milli(cost_per_unit_milli),
            is_available: true,
        })
    }

    fn tacos(stock_pollo_milli: i64) -> (Sellable, StockLevels) {
        let item = Sellable::Menu(MenuItem {
            id: "tacos".to_string(),
            name: "Tacos".to_string(),
            price: Money::from_cents(1800),
            recipe: vec![recipe_line("r1", "pollo", 200)],
            variants: Vec::new(),
            is_available: true,
        });
        let mut stock = StockLevels::new();
        stock.insert("pollo", StockQty::from_milli(stock_pollo_milli));
        (item, stock)
    }

    #[test]
    fn test_simple_product_floors_stock() {
        let mut stock = StockLevels::new();
        stock.insert("refresco", StockQty::from_milli(2_500));

        // cost_per_unit 1.000 → floor(2.5 / 1) = 2
        assert_eq!(simple("coca", "refresco", 1_000).available_quantity(&stock), 2);
    }

    #[test]
    fn test_simple_product_degenerate_cost_is_zero() {
        let mut stock = StockLevels::new();
        stock.insert("refresco", StockQty::from_units(10));

        assert_eq!(simple("coca", "refresco", 0).available_quantity(&stock), 0);
        assert_eq!(simple("coca", "refresco", -5).available_quantity(&stock), 0);
    }

    #[test]
    fn test_recipe_item_takes_minimum_across_lines() {
        let item = Sellable::Menu(MenuItem {
            id: "quesadilla".to_string(),
            name: "Quesadilla".to_string(),
            price: Money::from_cents(1500),
            recipe: vec![
                recipe_line("r1", "tortilla", 1_000), // 1 per unit, 20 in stock
                recipe_line("r2", "queso", 150),      // 0.15 per unit, 0.9 in stock
            ],
            variants: Vec::new(),
            is_available: true,
        });
        let mut stock = StockLevels::new();
        stock.insert("tortilla", StockQty::from_units(20));
        stock.insert("queso", StockQty::from_milli(900));

        // tortilla allows 20, queso allows floor(0.9/0.15) = 6
        assert_eq!(item.available_quantity(&stock), 6);
    }

    #[test]
    fn test_missing_ingredient_zeroes_item() {
        let (item, _) = tacos(10_000);
        let empty = StockLevels::new();
        assert_eq!(item.available_quantity(&empty), 0);
    }

    #[test]
    fn test_no_recipe_is_unlimited_sentinel() {
        let item = Sellable::Menu(MenuItem {
            id: "cafe".to_string(),
            name: "Café".to_string(),
            price: Money::from_cents(800),
            recipe: Vec::new(),
            variants: Vec::new(),
            is_available: true,
        });
        assert_eq!(
            item.available_quantity(&StockLevels::new()),
            UNLIMITED_AVAILABILITY
        );
    }

    #[test]
    fn test_degenerate_recipe_lines_are_skipped() {
        let item = Sellable::Menu(MenuItem {
            id: "sopa".to_string(),
            name: "Sopa".to_string(),
            price: Money::from_cents(900),
            recipe: vec![recipe_line("r1", "agua", 0)],
            variants: Vec::new(),
            is_available: true,
        });
        // Only degenerate lines → behaves like no recipe at all.
        assert_eq!(
            item.available_quantity(&StockLevels::new()),
            UNLIMITED_AVAILABILITY
        );
    }

    #[test]
    fn test_unavailable_flag_wins_over_stock() {
        let (mut item, stock) = tacos(10_000);
        if let Sellable::Menu(m) = &mut item {
            m.is_available = false;
        }
        assert_eq!(item.available_quantity(&stock), 0);
    }

    #[test]
    fn test_item_with_variants_takes_best_variant() {
        let item = Sellable::Menu(MenuItem {
            id: "torta".to_string(),
            name: "Torta".to_string(),
            price: Money::from_cents(1200),
            recipe: Vec::new(),
            variants: vec![
                VariantItem {
                    id: "v-pollo".to_string(),
                    name: "Torta de pollo".to_string(),
                    price: Money::from_cents(1200),
                    recipe: vec![recipe_line("r1", "pollo", 250)],
                    is_available: true,
                },
                VariantItem {
                    id: "v-res".to_string(),
                    name: "Torta de res".to_string(),
                    price: Money::from_cents(1400),
                    recipe: vec![recipe_line("r2", "res", 250)],
                    is_available: true,
                },
            ],
            is_available: true,
        });
        let mut stock = StockLevels::new();
        stock.insert("pollo", StockQty::from_milli(500)); // 2 units
        stock.insert("res", StockQty::from_milli(1_500)); // 6 units

        assert_eq!(item.available_quantity(&stock), 6);
    }

    #[test]
    fn test_scenario_availability_tacos() {
        // 10 kg of pollo at 0.2 kg per unit → 50 sellable tacos
        let (item, stock) = tacos(10_000);
        assert_eq!(item.available_quantity(&stock), 50);
    }

    #[test]
    fn test_availability_is_idempotent() {
        let (item, stock) = tacos(10_000);
        let first = item.available_quantity(&stock);
        let second = item.available_quantity(&stock);
        assert_eq!(first, second);
    }

    fn combo_with_choice(option_stock_milli: i64) -> (Combo, StockLevels) {
        let combo = Combo {
            id: "combo-1".to_string(),
            name: "Combo Familiar".to_string(),
            base_price: Money::from_cents(9900),
            fixed_components: vec![simple("papas", "papa", 500)],
            choice_groups: vec![ChoiceGroup {
                id: "g1".to_string(),
                name: "Bebida".to_string(),
                required: true,
                options: vec![ChoiceOption {
                    id: "o1".to_string(),
                    sellable: simple("refresco", "refresco", 1_000),
                    price_adjustment: Money::from_cents(500),
                }],
            }],
            is_available: true,
        };
        let mut stock = StockLevels::new();
        stock.insert("papa", StockQty::from_units(5)); // 10 portions of papas
        stock.insert("refresco", StockQty::from_milli(option_stock_milli));
        (combo, stock)
    }

    #[test]
    fn test_combo_fully_available() {
        let (combo, stock) = combo_with_choice(3_000);
        assert!(combo.is_fully_available(&stock));
        // papas allow 10, drink option allows 3
        assert_eq!(combo.available_quantity(&stock), 3);
    }

    #[test]
    fn test_combo_required_choice_exhausted() {
        // Fixed components available, but the only drink option has no stock:
        // the combo must not be sellable.
        let (combo, stock) = combo_with_choice(0);
        assert!(!combo.is_fully_available(&stock));
        assert_eq!(combo.available_quantity(&stock), 0);
    }

    #[test]
    fn test_combo_optional_choice_exhausted_is_fine() {
        let (mut combo, stock) = combo_with_choice(0);
        combo.choice_groups[0].required = false;
        assert!(combo.is_fully_available(&stock));
    }

    #[test]
    fn test_combo_price_with_adjustments() {
        let (combo, _) = combo_with_choice(3_000);
        let option = &combo.choice_groups[0].options[0];
        assert_eq!(combo.price_with(&[option]).cents(), 10_400);
        assert_eq!(combo.price_with(&[]).cents(), 9_900);
    }

    #[test]
    fn test_combo_price_floors_at_zero() {
        let mut combo = combo_with_choice(3_000).0;
        combo.base_price = Money::from_cents(100);
        let discount_option = ChoiceOption {
            id: "o2".to_string(),
            sellable: simple("agua", "agua", 1_000),
            price_adjustment: Money::from_cents(-500),
        };
        assert_eq!(combo.price_with(&[&discount_option]).cents(), 0);
    }

    #[test]
    fn test_consumption_accumulates_duplicates() {
        let (item, _) = tacos(10_000);
        let mut acc = ConsumptionMap::new();
        accumulate_consumption(&item, 3, &mut acc);
        accumulate_consumption(&item, 2, &mut acc);

        // 5 tacos × 0.2 kg = 1.0 kg total, one entry
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.get("pollo").unwrap().milli(), 1_000);
    }

    #[test]
    fn test_combo_consumption_covers_fixed_components() {
        let (combo, _) = combo_with_choice(3_000);
        let mut acc = ConsumptionMap::new();
        accumulate_consumption(&Sellable::Combo(combo), 2, &mut acc);

        // 2 combos × 0.5 papa per portion; drink choice not deducted
        assert_eq!(acc.get("papa").unwrap().milli(), 1_000);
        assert!(acc.get("refresco").is_none());
    }
}
