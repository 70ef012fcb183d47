//! Food items together with their categories, ingredients and modifiers.
//!
//! Writes here span several tables. With `TransactionMode::PerStatement`
//! every row commits on its own, so a failure part way through leaves the
//! rows written before it. `TransactionMode::Atomic` runs the whole
//! operation in one transaction instead.

use diesel::prelude::*;

use crate::config::TransactionMode;
use crate::db;
use crate::error::ServiceError;
use crate::files::{FileStore, Upload};
use crate::links::{self, LinkIds, Relation};
use crate::models::{Category, Ingredient, Item, ItemAggregate, ItemChanges, Modifier, NewItem};
use crate::query::{self, Record};

pub const UPLOAD_FOLDER: &str = "FoodItem";

fn within<T, F>(conn: &mut SqliteConnection, mode: TransactionMode, f: F) -> Result<T, ServiceError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, ServiceError>,
{
    match mode {
        TransactionMode::PerStatement => f(conn),
        TransactionMode::Atomic => db::write_locked(conn, f),
    }
}

fn link_failure(relation: Relation, item_id: i32, err: ServiceError) -> ServiceError {
    ServiceError::Link {
        relation: relation.as_str(),
        item_id,
        source: Box::new(err),
    }
}

/// Drops the stored upload when the write failed and no committed row
/// points at it.
fn discard_orphan<T>(
    files: &FileStore,
    mode: TransactionMode,
    result: &Result<T, ServiceError>,
    saved: Option<String>,
    row_written: bool,
) {
    if let (Err(_), Some(reference)) = (result, saved) {
        if mode == TransactionMode::Atomic || !row_written {
            files.discard(&reference);
        }
    }
}

fn assemble(conn: &mut SqliteConnection, item: Item) -> Result<ItemAggregate, ServiceError> {
    let category_ids = links::linked_ids(conn, Relation::Category, item.id)?;
    let ingredient_ids = links::linked_ids(conn, Relation::Ingredient, item.id)?;
    let modifier_ids = links::linked_ids(conn, Relation::Modifier, item.id)?;

    Ok(ItemAggregate {
        categories: Category::find_many(conn, &category_ids)?,
        ingredients: Ingredient::find_many(conn, &ingredient_ids)?,
        modifiers: Modifier::find_many(conn, &modifier_ids)?,
        item,
    })
}

pub fn list_all(conn: &mut SqliteConnection) -> Result<Vec<ItemAggregate>, ServiceError> {
    query::list::<Item>(conn)?
        .into_iter()
        .map(|item| assemble(conn, item))
        .collect()
}

pub fn get(conn: &mut SqliteConnection, id: i32) -> Result<ItemAggregate, ServiceError> {
    let item = query::get::<Item>(conn, id)?;
    assemble(conn, item)
}

/// Creates the item row and its initial links. A taken name fails before
/// anything is written, the image included.
pub fn create(
    conn: &mut SqliteConnection,
    files: &FileStore,
    mode: TransactionMode,
    mut new: NewItem,
    ids: &LinkIds,
    image: &Upload,
) -> Result<Item, ServiceError> {
    let mut saved = None;
    let mut inserted = false;

    let result = within(conn, mode, |conn| {
        let item = db::write_locked(conn, |conn| -> Result<Item, ServiceError> {
            query::ensure_unique::<Item>(conn, &new.food_item_name)?;
            let reference = files.save(UPLOAD_FOLDER, image)?;
            saved = Some(reference.clone());
            Item::set_image(&mut new, reference);
            Ok(Item::insert(conn, &new)?)
        })?;
        inserted = true;
        log::info!("created food item {} ({})", item.id, item.food_item_name);

        for relation in Relation::ALL {
            links::insert_links(conn, relation, item.id, ids.get(relation))
                .map_err(|e| link_failure(relation, item.id, e))?;
        }
        Ok(item)
    });

    discard_orphan(files, mode, &result, saved, inserted);
    result
}

/// Applies the given fields and adds the given links. Links that are not
/// listed are kept.
pub fn update(
    conn: &mut SqliteConnection,
    files: &FileStore,
    mode: TransactionMode,
    id: i32,
    mut changes: ItemChanges,
    ids: &LinkIds,
    image: Option<&Upload>,
) -> Result<Item, ServiceError> {
    query::get::<Item>(conn, id)?;
    let mut saved = None;
    if let Some(image) = image {
        let reference = files.save(UPLOAD_FOLDER, image)?;
        saved = Some(reference.clone());
        Item::change_image(&mut changes, reference);
    }
    let mut applied = false;

    let result = within(conn, mode, |conn| {
        let item = query::update::<Item>(conn, id, changes)?;
        applied = true;

        for relation in Relation::ALL {
            let created = links::add_missing_links(conn, relation, item.id, ids.get(relation))
                .map_err(|e| link_failure(relation, item.id, e))?;
            if created > 0 {
                log::debug!("added {created} {relation} link(s) to food item {}", item.id);
            }
        }
        Ok(item)
    });

    discard_orphan(files, mode, &result, saved, applied);
    result
}

/// Deletes the item and all of its links in one transaction.
pub fn delete(conn: &mut SqliteConnection, id: i32) -> Result<(), ServiceError> {
    query::get::<Item>(conn, id)?;
    conn.transaction(|conn| {
        let removed = links::delete_all_for_item(conn, id)?;
        query::delete::<Item>(conn, id)?;
        log::info!("deleted food item {id} and {removed} link(s)");
        Ok(())
    })
}
