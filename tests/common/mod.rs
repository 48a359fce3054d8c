// Shared setup for integration tests.
#![allow(dead_code)]

use std::sync::Once;

use moddb::config::{CatalogConfig, DatabaseConfig};
use moddb::{Catalog, Category, Item, Mode, Recipe, Technology};
use tempfile::TempDir;

static LOGGER: Once = Once::new();

pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A catalog on a fresh database file. Keep the `TempDir` alive for the
/// duration of the test.
pub fn open_catalog() -> anyhow::Result<(TempDir, Catalog)> {
    open_catalog_with(|_| {})
}

pub fn open_catalog_with(
    configure: impl FnOnce(&mut CatalogConfig),
) -> anyhow::Result<(TempDir, Catalog)> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let mut config = CatalogConfig {
        database: DatabaseConfig::at(dir.path().join("catalog.db")),
        ..CatalogConfig::default()
    };
    configure(&mut config);
    let catalog = Catalog::open(&config)?;
    Ok((dir, catalog))
}

pub fn iron_plate() -> Item {
    Item::new("item", "iron-plate").with_stack_size(100)
}

pub fn iron_gear() -> Item {
    Item::new("item", "iron-gear-wheel").with_stack_size(100)
}

pub fn crafting() -> Category {
    Category::new("recipe-category", "crafting")
}

pub fn gear_recipe() -> Recipe {
    Recipe::new("iron-gear-wheel", Mode::Normal, 0.5)
        .with_category(crafting())
        .with_ingredient(iron_plate(), 2.0)
        .with_product(iron_gear(), 1.0)
}

pub fn automation() -> Technology {
    Technology::new("automation", Mode::Normal, 10, 10.0)
        .with_ingredient(Item::new("item", "automation-science-pack"), 1.0)
}
