//! Bookkeeping for the three item junction tables.
//!
//! The tables carry no uniqueness constraint, so every insert path here checks
//! for an existing `(food_item_id, other_id)` pair and for the existence of
//! both ends before writing. Check and insert share one write-locked
//! transaction per link.

use std::fmt;

use diesel::prelude::*;

use crate::db;
use crate::error::ServiceError;
use crate::models::{now, Category, Ingredient, Item, Link, Modifier};
use crate::query::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Category,
    Ingredient,
    Modifier,
}

impl Relation {
    pub const ALL: [Relation; 3] = [Relation::Category, Relation::Ingredient, Relation::Modifier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Category => "category",
            Relation::Ingredient => "ingredient",
            Relation::Modifier => "modifier",
        }
    }

    fn target_exists(&self, conn: &mut SqliteConnection, id: i32) -> QueryResult<bool> {
        Ok(match self {
            Relation::Category => Category::find(conn, id)?.is_some(),
            Relation::Ingredient => Ingredient::find(conn, id)?.is_some(),
            Relation::Modifier => Modifier::find(conn, id)?.is_some(),
        })
    }

    fn target_kind(&self) -> &'static str {
        match self {
            Relation::Category => Category::KIND,
            Relation::Ingredient => Ingredient::KIND,
            Relation::Modifier => Modifier::KIND,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ids to link, one list per relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIds {
    pub categories: Vec<i32>,
    pub ingredients: Vec<i32>,
    pub modifiers: Vec<i32>,
}

impl LinkIds {
    pub fn get(&self, relation: Relation) -> &[i32] {
        match relation {
            Relation::Category => &self.categories,
            Relation::Ingredient => &self.ingredients,
            Relation::Modifier => &self.modifiers,
        }
    }
}

// Binds `$links` to the junction table module and `$other` to its
// target-id column, then evaluates `$body`.
macro_rules! on_relation {
    ($relation:expr, |$links:ident| $body:expr) => {
        match $relation {
            Relation::Category => {
                use crate::schema::food_item_categories as $links;
                $body
            }
            Relation::Ingredient => {
                use crate::schema::food_item_ingredients as $links;
                $body
            }
            Relation::Modifier => {
                use crate::schema::food_item_modifiers as $links;
                $body
            }
        }
    };
    ($relation:expr, |$links:ident, $other:ident| $body:expr) => {
        match $relation {
            Relation::Category => {
                use crate::schema::food_item_categories as $links;
                use crate::schema::food_item_categories::food_category_id as $other;
                $body
            }
            Relation::Ingredient => {
                use crate::schema::food_item_ingredients as $links;
                use crate::schema::food_item_ingredients::food_ingredient_id as $other;
                $body
            }
            Relation::Modifier => {
                use crate::schema::food_item_modifiers as $links;
                use crate::schema::food_item_modifiers::food_modifier_id as $other;
                $body
            }
        }
    };
}

pub fn links_for_item(conn: &mut SqliteConnection, relation: Relation, item_id: i32) -> QueryResult<Vec<Link>> {
    on_relation!(relation, |links, other| {
        links::table
            .filter(links::food_item_id.eq(item_id))
            .order(links::id)
            .select((links::id, links::food_item_id, other, links::created_at))
            .load::<Link>(conn)
    })
}

pub fn linked_ids(conn: &mut SqliteConnection, relation: Relation, item_id: i32) -> QueryResult<Vec<i32>> {
    Ok(links_for_item(conn, relation, item_id)?
        .into_iter()
        .map(|link| link.other_id)
        .collect())
}

fn link_exists(conn: &mut SqliteConnection, relation: Relation, item_id: i32, other_id: i32) -> QueryResult<bool> {
    on_relation!(relation, |links, other| {
        diesel::select(diesel::dsl::exists(
            links::table.filter(links::food_item_id.eq(item_id).and(other.eq(other_id))),
        ))
        .get_result(conn)
    })
}

fn check_ends(conn: &mut SqliteConnection, relation: Relation, item_id: i32, other_id: i32) -> Result<(), ServiceError> {
    if Item::find(conn, item_id)?.is_none() {
        return Err(ServiceError::NotFound {
            kind: Item::KIND,
            id: item_id,
        });
    }
    if !relation.target_exists(conn, other_id)? {
        return Err(ServiceError::NotFound {
            kind: relation.target_kind(),
            id: other_id,
        });
    }
    Ok(())
}

fn insert_link(conn: &mut SqliteConnection, relation: Relation, item_id: i32, other_id: i32) -> QueryResult<usize> {
    on_relation!(relation, |links, other| {
        diesel::insert_into(links::table)
            .values((
                links::food_item_id.eq(item_id),
                other.eq(other_id),
                links::created_at.eq(now()),
            ))
            .execute(conn)
    })
}

/// Inserts the `(item_id, other_id)` link unless it is already there.
/// Returns whether a row was written.
pub fn ensure_link(
    conn: &mut SqliteConnection,
    relation: Relation,
    item_id: i32,
    other_id: i32,
) -> Result<bool, ServiceError> {
    db::write_locked(conn, |conn| -> Result<bool, ServiceError> {
        if link_exists(conn, relation, item_id, other_id)? {
            return Ok(false);
        }
        check_ends(conn, relation, item_id, other_id)?;
        insert_link(conn, relation, item_id, other_id)?;
        log::debug!("linked food item {item_id} to {relation} {other_id}");
        Ok(true)
    })
}

/// Insert-only linking for a freshly created item. Stops at the first
/// failing id; links written before it stay.
pub fn insert_links(
    conn: &mut SqliteConnection,
    relation: Relation,
    item_id: i32,
    ids: &[i32],
) -> Result<usize, ServiceError> {
    for &other_id in ids {
        db::write_locked(conn, |conn| -> Result<usize, ServiceError> {
            check_ends(conn, relation, item_id, other_id)?;
            Ok(insert_link(conn, relation, item_id, other_id)?)
        })?;
    }
    Ok(ids.len())
}

/// Additive linking for updates: missing links are added, links to ids not
/// in `ids` are left in place. Returns how many rows were written.
pub fn add_missing_links(
    conn: &mut SqliteConnection,
    relation: Relation,
    item_id: i32,
    ids: &[i32],
) -> Result<usize, ServiceError> {
    let mut created = 0;
    for &other_id in ids {
        if ensure_link(conn, relation, item_id, other_id)? {
            created += 1;
        }
    }
    Ok(created)
}

pub fn delete_all_for_item(conn: &mut SqliteConnection, item_id: i32) -> QueryResult<usize> {
    let mut deleted = 0;
    for relation in Relation::ALL {
        deleted += on_relation!(relation, |links| {
            diesel::delete(links::table.filter(links::food_item_id.eq(item_id))).execute(conn)
        })?;
    }
    Ok(deleted)
}

/// Removes every link pointing at a category, ingredient or modifier.
pub fn delete_all_for_target(conn: &mut SqliteConnection, relation: Relation, other_id: i32) -> QueryResult<usize> {
    on_relation!(relation, |links, other| {
        diesel::delete(links::table.filter(other.eq(other_id))).execute(conn)
    })
}
