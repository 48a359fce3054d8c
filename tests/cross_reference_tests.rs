mod common;

use common::{iron_gear, iron_plate, open_catalog};
use moddb::{AppError, ContentKind, CrossReferenceFactory, Item, Relation, RelationRegistry};
use uuid::Uuid;

fn stored_items(catalog: &moddb::Catalog, count: usize) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let item = Item::new("item", format!("item-{}", i));
        catalog.item_repo.persist(&item)?;
        ids.push(item.id);
    }
    Ok(ids)
}

#[test]
fn insert_is_idempotent() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    let items = catalog.cross_references.create(ContentKind::Item)?;

    let plate = iron_plate();
    let gear = iron_gear();
    catalog.item_repo.persist(&plate)?;
    catalog.item_repo.persist(&gear)?;

    assert_eq!(items.insert(combination.id, &[plate.id, gear.id])?, 2);
    assert_eq!(items.insert(combination.id, &[plate.id, gear.id])?, 0);
    assert_eq!(items.insert(combination.id, &[plate.id])?, 0);
    assert_eq!(items.count(combination.id)?, 2);

    let mut associated = items.content_ids(combination.id)?;
    associated.sort();
    let mut expected = vec![plate.id, gear.id];
    expected.sort();
    assert_eq!(associated, expected);
    Ok(())
}

#[test]
fn insert_spans_multiple_statements() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    let ids = stored_items(&catalog, 23)?;

    let factory = CrossReferenceFactory::new(catalog.pool.clone(), RelationRegistry::standard())?
        .with_insert_batch_size(5);
    let items = factory.create(ContentKind::Item)?;

    assert_eq!(items.insert(combination.id, &ids)?, 23);
    assert_eq!(items.count(combination.id)?, 23);
    Ok(())
}

#[test]
fn clear_removes_every_association() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    let ids = stored_items(&catalog, 3)?;
    let items = catalog.cross_references.create(ContentKind::Item)?;

    items.insert(combination.id, &ids)?;
    assert!(catalog.item_repo.find_orphan_ids()?.is_empty());

    assert_eq!(items.clear(combination.id)?, 3);
    assert_eq!(items.count(combination.id)?, 0);

    let mut orphans = catalog.item_repo.find_orphan_ids()?;
    orphans.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(orphans, expected);
    Ok(())
}

#[test]
fn clear_leaves_other_combinations_alone() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let first = catalog.combinations.create_combination(vec!["base".into()])?;
    let second = catalog
        .combinations
        .create_combination(vec!["base".into(), "space-age".into()])?;
    let ids = stored_items(&catalog, 4)?;
    let items = catalog.cross_references.create(ContentKind::Item)?;

    items.insert(first.id, &ids)?;
    items.insert(second.id, &ids[..2])?;
    items.clear(first.id)?;

    assert_eq!(items.count(second.id)?, 2);
    assert_eq!(catalog.item_repo.find_orphan_ids()?.len(), 2);
    Ok(())
}

#[test]
fn count_of_unknown_combination_is_zero() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let recipes = catalog.cross_references.create(ContentKind::Recipe)?;
    assert_eq!(recipes.count(Uuid::new_v4())?, 0);
    assert!(recipes.content_ids(Uuid::new_v4())?.is_empty());
    Ok(())
}

#[test]
fn remove_drops_only_given_pairs() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let combination = catalog.combinations.create_combination(vec!["base".into()])?;
    let ids = stored_items(&catalog, 3)?;
    let items = catalog.cross_references.create(ContentKind::Item)?;

    items.insert(combination.id, &ids)?;
    assert_eq!(items.remove(combination.id, &ids[..1])?, 1);
    assert_eq!(items.count(combination.id)?, 2);
    Ok(())
}

#[test]
fn empty_input_touches_nothing() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;
    let items = catalog.cross_references.create(ContentKind::Item)?;

    // With the table gone any statement would fail.
    catalog.pool.get()?.execute_batch("DROP TABLE combination_item")?;

    assert_eq!(items.insert(Uuid::new_v4(), &[])?, 0);
    assert_eq!(items.remove(Uuid::new_v4(), &[])?, 0);
    assert!(items.count(Uuid::new_v4()).is_err());
    Ok(())
}

#[test]
fn factory_rejects_missing_relation() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;

    let mut registry = RelationRegistry::new();
    registry.register(
        ContentKind::Item,
        Relation::new("combination_item", "combination_id", "item_id"),
    )?;
    let factory = CrossReferenceFactory::new(catalog.pool.clone(), registry)?;

    assert!(factory.create(ContentKind::Item).is_ok());
    assert!(matches!(
        factory.create(ContentKind::Technology),
        Err(AppError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn factory_rejects_relation_missing_from_schema() -> anyhow::Result<()> {
    let (_dir, catalog) = open_catalog()?;

    let mut registry = RelationRegistry::standard();
    registry.register(
        ContentKind::Category,
        Relation::new("combination_categories", "combination_id", "category_id"),
    )?;

    let result = CrossReferenceFactory::new(catalog.pool.clone(), registry);
    assert!(matches!(result, Err(AppError::Configuration(_))));
    Ok(())
}
