mod common;

use common::{automation, crafting, gear_recipe, iron_gear, iron_plate, open_catalog};
use moddb::{
    AppError, CombinationStatus, ContentBundle, ContentEntity, ContentKind, Item, Mode, Recipe,
};
use rusqlite::TransactionBehavior;
use uuid::Uuid;

fn base_bundle() -> ContentBundle {
    ContentBundle {
        categories: vec![crafting()],
        items: vec![iron_plate(), iron_gear()],
        recipes: vec![gear_recipe()],
        technologies: vec![automation()],
    }
}

#[test]
fn import_associates_referenced_content() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;

    // Items only reachable through the recipe and technology
    let bundle = ContentBundle {
        recipes: vec![gear_recipe()],
        technologies: vec![automation()],
        ..ContentBundle::default()
    };
    let summary = catalog.combinations.import_content(combination.id, bundle)?;

    assert_eq!(summary.categories.distinct, 1);
    assert_eq!(summary.items.distinct, 3);
    assert_eq!(summary.items.created, 3);
    assert_eq!(summary.items.associated, 3);
    assert_eq!(summary.recipes.created, 1);
    assert_eq!(summary.technologies.created, 1);

    let stored = catalog
        .combinations
        .get_combination(combination.id)?
        .expect("combination stored");
    assert_eq!(stored.status, CombinationStatus::Available);
    assert!(stored.imported_at.is_some());

    assert_eq!(catalog.item_repo.list_by_combination(combination.id)?.len(), 3);
    assert_eq!(catalog.recipe_repo.list_by_combination(combination.id)?.len(), 1);
    assert_eq!(
        catalog.technology_repo.list_by_combination(combination.id)?.len(),
        1
    );
    Ok(())
}

#[test]
fn identical_content_is_stored_once() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let base = catalog.combinations.create_combination(vec!["base".into()])?;
    let modded = catalog
        .combinations
        .create_combination(vec!["base".into(), "bobs-plates".into()])?;

    let first = catalog.combinations.import_content(base.id, base_bundle())?;
    let second = catalog.combinations.import_content(modded.id, base_bundle())?;

    assert_eq!(first.items.created, 3);
    assert_eq!(second.items.created, 0);
    assert_eq!(second.items.associated, 3);
    assert_eq!(second.recipes.created, 0);
    assert_eq!(second.recipes.associated, 1);

    let stats = moddb::db::get_database_stats(&*catalog.pool.get()?)?;
    assert_eq!(stats.item_count, 3);
    assert_eq!(stats.recipe_count, 1);
    Ok(())
}

#[test]
fn changed_content_gets_a_new_identity() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let base = catalog.combinations.create_combination(vec!["base".into()])?;
    let modded = catalog
        .combinations
        .create_combination(vec!["base".into(), "faster-gears".into()])?;

    catalog.combinations.import_content(base.id, base_bundle())?;
    let faster = Recipe::new("iron-gear-wheel", Mode::Normal, 0.25)
        .with_category(crafting())
        .with_ingredient(iron_plate(), 2.0)
        .with_product(iron_gear(), 1.0);
    let summary = catalog.combinations.import_content(
        modded.id,
        ContentBundle {
            recipes: vec![faster],
            ..ContentBundle::default()
        },
    )?;

    assert_eq!(summary.recipes.created, 1);
    assert_eq!(summary.items.created, 0);
    let base_recipes = catalog.recipe_repo.list_by_combination(base.id)?;
    let modded_recipes = catalog.recipe_repo.list_by_combination(modded.id)?;
    assert_ne!(base_recipes[0].id, modded_recipes[0].id);
    Ok(())
}

#[test]
fn failed_import_marks_combination_errored() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;

    let bundle = ContentBundle {
        items: vec![Item::new("machine", "assembler")],
        ..ContentBundle::default()
    };
    let result = catalog.combinations.import_content(combination.id, bundle);
    assert!(matches!(result, Err(AppError::Domain(_))));

    let stored = catalog
        .combinations
        .get_combination(combination.id)?
        .expect("combination stored");
    assert_eq!(stored.status, CombinationStatus::Errored);
    let rejected = Item::new("machine", "assembler").id;
    assert!(catalog.item_repo.find_existing_ids(&[rejected])?.is_empty());
    Ok(())
}

#[test]
fn failed_status_save_keeps_the_import_error() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    catalog.pool.get()?.execute_batch(
        "CREATE TRIGGER refuse_errored BEFORE UPDATE ON combinations
         WHEN new.status = 'errored'
         BEGIN SELECT RAISE(ABORT, 'status locked'); END;",
    )?;

    let bundle = ContentBundle {
        items: vec![Item::new("machine", "assembler")],
        ..ContentBundle::default()
    };
    let result = catalog.combinations.import_content(combination.id, bundle);
    assert!(matches!(result, Err(AppError::Domain(_))));
    Ok(())
}

#[test]
fn failed_import_leaves_no_partial_content() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    // Technologies are stored last, so everything before them must roll back.
    catalog
        .pool
        .get()?
        .execute_batch("DROP TABLE technology_ingredients")?;

    let result = catalog.combinations.import_content(combination.id, base_bundle());
    assert!(result.is_err());

    let stored = catalog
        .combinations
        .get_combination(combination.id)?
        .expect("combination stored");
    assert_eq!(stored.status, CombinationStatus::Errored);

    let stats = moddb::db::get_database_stats(&*catalog.pool.get()?)?;
    assert_eq!(stats.item_count, 0);
    assert_eq!(stats.recipe_count, 0);
    assert!(catalog
        .recipe_repo
        .get_by_id(gear_recipe().identified().id)?
        .is_none());
    let items = catalog.cross_references.create(ContentKind::Item)?;
    assert_eq!(items.count(combination.id)?, 0);
    Ok(())
}

#[test]
fn uncommitted_import_rows_are_not_reclaimed() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    let items = catalog.cross_references.create(ContentKind::Item)?;
    let plate = iron_plate();

    let mut conn = catalog.pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    assert!(catalog.item_repo.persist_in(&tx, &plate)?);

    // A reclamation pass from another combination runs in between.
    let report = catalog.reclamation.run()?;
    assert_eq!(report.total_deleted(), 0);

    assert_eq!(items.insert_in(&tx, combination.id, &[plate.id])?, 1);
    tx.commit()?;

    assert_eq!(items.count(combination.id)?, 1);
    assert!(catalog.item_repo.get_by_id(plate.id)?.is_some());
    Ok(())
}

#[test]
fn reimport_replaces_previous_content() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    let heavy_oil = Item::new("fluid", "heavy-oil");

    let first = catalog.combinations.import_content(
        combination.id,
        ContentBundle {
            items: vec![iron_plate(), heavy_oil.clone()],
            ..ContentBundle::default()
        },
    )?;
    assert_eq!(first.released, 0);
    assert!(first.reclaimed.is_none());

    let second = catalog.combinations.import_content(
        combination.id,
        ContentBundle {
            items: vec![iron_plate()],
            ..ContentBundle::default()
        },
    )?;
    assert_eq!(second.released, 2);
    assert_eq!(second.items.associated, 1);
    let reclaimed = second.reclaimed.expect("reclamation after re-import");
    assert_eq!(reclaimed.total_deleted(), 1);

    let items = catalog.cross_references.create(ContentKind::Item)?;
    assert_eq!(items.count(combination.id)?, 1);
    assert!(catalog.item_repo.get_by_id(heavy_oil.id)?.is_none());
    assert!(catalog.item_repo.get_by_id(iron_plate().id)?.is_some());

    let stored = catalog
        .combinations
        .get_combination(combination.id)?
        .expect("combination stored");
    assert_eq!(stored.status, CombinationStatus::Available);
    Ok(())
}

#[test]
fn reimport_keeps_content_shared_with_other_combinations() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let base = catalog.combinations.create_combination(vec!["base".into()])?;
    let modded = catalog
        .combinations
        .create_combination(vec!["base".into(), "extra".into()])?;

    catalog.combinations.import_content(base.id, base_bundle())?;
    catalog.combinations.import_content(modded.id, base_bundle())?;
    let summary = catalog.combinations.import_content(
        modded.id,
        ContentBundle {
            items: vec![iron_plate()],
            ..ContentBundle::default()
        },
    )?;

    assert_eq!(summary.reclaimed.map(|r| r.total_deleted()), Some(0));
    assert_eq!(catalog.item_repo.list_by_combination(modded.id)?.len(), 1);
    assert!(catalog.recipe_repo.list_by_combination(modded.id)?.is_empty());
    assert_eq!(catalog.recipe_repo.list_by_combination(base.id)?.len(), 1);
    Ok(())
}

#[test]
fn retry_after_failed_import_starts_clean() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;

    let broken = ContentBundle {
        items: vec![iron_plate(), Item::new("machine", "assembler")],
        ..ContentBundle::default()
    };
    assert!(catalog
        .combinations
        .import_content(combination.id, broken)
        .is_err());

    let summary = catalog.combinations.import_content(combination.id, base_bundle())?;
    assert_eq!(summary.released, 0);
    assert_eq!(summary.items.created, 3);
    let stored = catalog
        .combinations
        .get_combination(combination.id)?
        .expect("combination stored");
    assert_eq!(stored.status, CombinationStatus::Available);
    Ok(())
}

#[test]
fn import_into_unknown_combination_fails() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let result = catalog
        .combinations
        .import_content(Uuid::new_v4(), base_bundle());
    assert!(matches!(result, Err(AppError::NotFound)));
    Ok(())
}

#[test]
fn deleting_a_combination_keeps_shared_content() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let base = catalog.combinations.create_combination(vec!["base".into()])?;
    let modded = catalog
        .combinations
        .create_combination(vec!["base".into(), "extra".into()])?;

    catalog.combinations.import_content(base.id, base_bundle())?;
    let extra = Item::new("fluid", "heavy-oil");
    let mut bundle = base_bundle();
    bundle.items.push(extra.clone());
    catalog.combinations.import_content(modded.id, bundle)?;

    let report = catalog.combinations.delete_combination(modded.id)?;
    assert_eq!(report.total_deleted(), 1);
    assert!(catalog.item_repo.get_by_id(extra.id)?.is_none());
    assert!(catalog.item_repo.get_by_id(iron_plate().id)?.is_some());
    assert_eq!(catalog.recipe_repo.list_by_combination(base.id)?.len(), 1);
    assert!(catalog.combinations.get_combination(modded.id)?.is_none());

    let items = catalog.cross_references.create(ContentKind::Item)?;
    assert_eq!(items.count(modded.id)?, 0);
    Ok(())
}

#[test]
fn deleting_the_last_combination_empties_the_catalog() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let base = catalog.combinations.create_combination(vec!["base".into()])?;
    catalog.combinations.import_content(base.id, base_bundle())?;

    let report = catalog.combinations.delete_combination(base.id)?;
    assert!(report.is_complete());
    // 1 technology, 1 recipe, 1 category, 3 items
    assert_eq!(report.total_deleted(), 6);
    assert!(catalog.category_repo.get_by_id(crafting().id)?.is_none());

    assert!(matches!(
        catalog.combinations.delete_combination(base.id),
        Err(AppError::NotFound)
    ));
    Ok(())
}
