//! # Availability Service
//!
//! Read-only resolution of the menu against current stock: catalog rows are
//! resolved into [`Sellable`] shapes, a stock snapshot is taken, and the pure
//! resolver computes the sellable quantity of every item. This is what the
//! digital menu polls.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{CatalogRepository, IngredientRepository};
use mesa_core::Sellable;

/// One menu entry with its resolved availability.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub sellable: Sellable,
    pub available: i64,
}

impl MenuEntry {
    pub fn is_sellable(&self) -> bool {
        self.available > 0
    }
}

/// Service resolving catalog + stock into per-item availability.
#[derive(Debug, Clone)]
pub struct AvailabilityService {
    catalog: CatalogRepository,
    ingredients: IngredientRepository,
}

impl AvailabilityService {
    pub fn new(pool: SqlitePool) -> Self {
        AvailabilityService {
            catalog: CatalogRepository::new(pool.clone()),
            ingredients: IngredientRepository::new(pool),
        }
    }

    /// The full menu with availability, name order. Items at zero are kept
    /// so the caller can render them greyed out.
    pub async fn menu(&self) -> DbResult<Vec<MenuEntry>> {
        let sellables = self.catalog.list_active_sellables().await?;
        let stock = self.ingredients.stock_levels().await?;

        debug!(items = sellables.len(), "Resolving menu availability");

        Ok(sellables
            .into_iter()
            .map(|sellable| {
                let available = sellable.available_quantity(&stock);
                MenuEntry {
                    sellable,
                    available,
                }
            })
            .collect())
    }

    /// Availability of one product; `None` if it does not exist.
    pub async fn availability_of(&self, product_id: &str) -> DbResult<Option<i64>> {
        let Some(sellable) = self.catalog.load_sellable(product_id).await? else {
            return Ok(None);
        };
        let stock = self.ingredients.stock_levels().await?;

        Ok(Some(sellable.available_quantity(&stock)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixture;
    use mesa_core::StockQty;

    #[tokio::test]
    async fn test_menu_reflects_stock() {
        let f = fixture().await;
        let menu = f.db.availability().menu().await.unwrap();

        // 10 kg pollo / 0.2 per order = 50; tortillas allow 100
        let tacos = menu.iter().find(|e| e.sellable.id() == f.tacos).unwrap();
        assert_eq!(tacos.available, 50);
        assert!(tacos.is_sellable());

        let refresco = menu
            .iter()
            .find(|e| e.sellable.id() == f.refresco_producto)
            .unwrap();
        assert_eq!(refresco.available, 3);
    }

    #[tokio::test]
    async fn test_exhausted_item_stays_listed_at_zero() {
        let f = fixture().await;
        f.db.ingredients()
            .adjust(&f.refresco, StockQty::from_milli(-3_000))
            .await
            .unwrap();

        let menu = f.db.availability().menu().await.unwrap();
        let refresco = menu
            .iter()
            .find(|e| e.sellable.id() == f.refresco_producto)
            .unwrap();
        assert_eq!(refresco.available, 0);
        assert!(!refresco.is_sellable());
    }

    #[tokio::test]
    async fn test_availability_of_single_product() {
        let f = fixture().await;
        let svc = f.db.availability();

        assert_eq!(svc.availability_of(&f.tacos).await.unwrap(), Some(50));
        assert_eq!(svc.availability_of("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_combo_limited_by_scarcest_component() {
        let f = fixture().await;

        // tacos cap 50, papas 4kg / 0.5 = 8, drink choice (refresco) 3;
        // the required choice still has an option in stock so the combo
        // follows the scarcest fixed component vs best option
        let combo = f.db.availability().availability_of(&f.combo).await.unwrap();
        assert_eq!(combo, Some(3));
    }
}
