use diesel::prelude::*;
use serde::Serialize;

use crate::db;
use crate::error::ServiceError;
use crate::models::{
    now, Category, CategoryChanges, Ingredient, IngredientChanges, Item, ItemChanges, Modifier,
    ModifierChanges, NewCategory, NewIngredient, NewItem, NewModifier, Patch,
};

/// Single-table persistence for a catalog row type.
pub trait Record: Sized + Serialize + Send + 'static {
    type New: Send + 'static;
    type Changes: Patch + Send + 'static;

    /// Human name used in error messages.
    const KIND: &'static str;

    fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<Self>>;
    fn find(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Self>>;
    fn find_many(conn: &mut SqliteConnection, ids: &[i32]) -> QueryResult<Vec<Self>>;
    fn find_by_name(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<Self>>;
    fn insert(conn: &mut SqliteConnection, new: &Self::New) -> QueryResult<Self>;
    fn apply(conn: &mut SqliteConnection, id: i32, changes: &Self::Changes) -> QueryResult<Self>;
    fn remove(conn: &mut SqliteConnection, id: i32) -> QueryResult<usize>;

    fn name_of(new: &Self::New) -> &str;
    fn set_image(new: &mut Self::New, reference: String);
    fn change_image(changes: &mut Self::Changes, reference: String);
}

macro_rules! record {
    ($model:ty, $new:ty, $changes:ty, $table:ident, $name:ident, $image:ident, $kind:literal) => {
        impl Record for $model {
            type New = $new;
            type Changes = $changes;

            const KIND: &'static str = $kind;

            fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<Self>> {
                use crate::schema::$table::dsl::*;
                $table.order(id).select(Self::as_select()).load(conn)
            }

            fn find(conn: &mut SqliteConnection, row_id: i32) -> QueryResult<Option<Self>> {
                use crate::schema::$table::dsl::*;
                $table.find(row_id).select(Self::as_select()).first(conn).optional()
            }

            fn find_many(conn: &mut SqliteConnection, ids: &[i32]) -> QueryResult<Vec<Self>> {
                use crate::schema::$table::dsl::*;
                $table
                    .filter(id.eq_any(ids.to_vec()))
                    .order(id)
                    .select(Self::as_select())
                    .load(conn)
            }

            fn find_by_name(conn: &mut SqliteConnection, value: &str) -> QueryResult<Option<Self>> {
                use crate::schema::$table::dsl::*;
                $table.filter($name.eq(value)).select(Self::as_select()).first(conn).optional()
            }

            fn insert(conn: &mut SqliteConnection, new: &Self::New) -> QueryResult<Self> {
                use crate::schema::$table::dsl::*;
                diesel::insert_into($table)
                    .values(new)
                    .returning(Self::as_returning())
                    .get_result(conn)
            }

            fn apply(conn: &mut SqliteConnection, row_id: i32, changes: &Self::Changes) -> QueryResult<Self> {
                use crate::schema::$table::dsl::*;
                diesel::update($table.find(row_id))
                    .set(changes)
                    .returning(Self::as_returning())
                    .get_result(conn)
            }

            fn remove(conn: &mut SqliteConnection, row_id: i32) -> QueryResult<usize> {
                use crate::schema::$table::dsl::*;
                diesel::delete($table.find(row_id)).execute(conn)
            }

            fn name_of(new: &Self::New) -> &str {
                &new.$name
            }

            fn set_image(new: &mut Self::New, reference: String) {
                new.$image = reference;
            }

            fn change_image(changes: &mut Self::Changes, reference: String) {
                changes.$image = Some(reference);
            }
        }
    };
}

record!(Category, NewCategory, CategoryChanges, food_categories, category_name, category_image, "Category");
record!(Ingredient, NewIngredient, IngredientChanges, food_ingredients, ingredient_name, ingredient_image, "Ingredient");
record!(Modifier, NewModifier, ModifierChanges, food_modifiers, modifier_name, modifier_image, "Modifier");
record!(Item, NewItem, ItemChanges, food_items, food_item_name, food_item_image, "Food Item");

pub fn list<R: Record>(conn: &mut SqliteConnection) -> Result<Vec<R>, ServiceError> {
    Ok(R::all(conn)?)
}

pub fn get<R: Record>(conn: &mut SqliteConnection, id: i32) -> Result<R, ServiceError> {
    R::find(conn, id)?.ok_or(ServiceError::NotFound { kind: R::KIND, id })
}

/// Fails with `Conflict` when a row with this name already exists.
pub fn ensure_unique<R: Record>(conn: &mut SqliteConnection, name: &str) -> Result<(), ServiceError> {
    match R::find_by_name(conn, name)? {
        Some(_) => Err(ServiceError::Conflict {
            kind: R::KIND,
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

/// Name check and insert under one write lock.
pub fn create<R: Record>(conn: &mut SqliteConnection, new: &R::New) -> Result<R, ServiceError> {
    db::write_locked(conn, |conn| -> Result<R, ServiceError> {
        ensure_unique::<R>(conn, R::name_of(new))?;
        Ok(R::insert(conn, new)?)
    })
}

/// Applies the fields present in `changes`. An empty change set writes
/// nothing and returns the row as it is.
pub fn update<R: Record>(conn: &mut SqliteConnection, id: i32, mut changes: R::Changes) -> Result<R, ServiceError> {
    let current = get::<R>(conn, id)?;
    if changes.is_empty() {
        return Ok(current);
    }
    changes.touch(now());
    Ok(R::apply(conn, id, &changes)?)
}

pub fn delete<R: Record>(conn: &mut SqliteConnection, id: i32) -> Result<(), ServiceError> {
    match R::remove(conn, id)? {
        0 => Err(ServiceError::NotFound { kind: R::KIND, id }),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn category(conn: &mut SqliteConnection, name: &str) -> Category {
        create::<Category>(
            conn,
            &NewCategory {
                category_name: name.to_string(),
                category_image: format!("FoodCategory/{name}.png"),
                category_status: "active".to_string(),
                category_description: format!("{name} dishes"),
                created_at: now(),
            },
        )
        .unwrap()
    }

    pub fn ingredient(conn: &mut SqliteConnection, name: &str) -> Ingredient {
        create::<Ingredient>(
            conn,
            &NewIngredient {
                ingredient_name: name.to_string(),
                ingredient_image: format!("FoodIngredient/{name}.png"),
                ingredient_status: "active".to_string(),
                ingredient_description: format!("fresh {name}"),
                created_at: now(),
            },
        )
        .unwrap()
    }

    pub fn modifier(conn: &mut SqliteConnection, name: &str) -> Modifier {
        create::<Modifier>(
            conn,
            &NewModifier {
                modifier_name: name.to_string(),
                modifier_image: format!("FoodModifier/{name}.png"),
                modifier_description: format!("extra {name}"),
                modifier_price: Some("1.00".to_string()),
                created_at: now(),
            },
        )
        .unwrap()
    }

    pub fn new_item(name: &str) -> NewItem {
        NewItem {
            food_item_name: name.to_string(),
            food_item_image: String::new(),
            food_item_description: format!("house {name}"),
            food_item_price: "10.00".to_string(),
            food_item_status: "active".to_string(),
            food_item_type: "main".to_string(),
            is_featured: false,
            created_at: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::db::test_connection;

    #[test]
    fn create_rejects_duplicate_names() {
        let mut conn = test_connection();
        category(&mut conn, "Pizza");

        let duplicate = NewCategory {
            category_name: "Pizza".to_string(),
            category_image: "x.png".to_string(),
            category_status: "active".to_string(),
            category_description: "again".to_string(),
            created_at: now(),
        };
        let err = create::<Category>(&mut conn, &duplicate).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { kind: "Category", .. }));
        assert_eq!(list::<Category>(&mut conn).unwrap().len(), 1);
    }

    #[test]
    fn get_missing_row_is_not_found() {
        let mut conn = test_connection();
        let err = get::<Modifier>(&mut conn, 42).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { kind: "Modifier", id: 42 }));
    }

    #[test]
    fn partial_update_touches_only_given_fields() {
        let mut conn = test_connection();
        let before = ingredient(&mut conn, "Basil");
        assert_eq!(before.updated_at, None);

        let changes = IngredientChanges {
            ingredient_status: Some("archived".to_string()),
            ..Default::default()
        };
        let after = update::<Ingredient>(&mut conn, before.id, changes).unwrap();

        assert_eq!(after.ingredient_status, "archived");
        assert_eq!(after.ingredient_name, before.ingredient_name);
        assert_eq!(after.ingredient_description, before.ingredient_description);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at.is_some());
    }

    #[test]
    fn empty_update_writes_nothing() {
        let mut conn = test_connection();
        let before = modifier(&mut conn, "Cheese");
        let after = update::<Modifier>(&mut conn, before.id, ModifierChanges::default()).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn update_and_delete_missing_rows_fail() {
        let mut conn = test_connection();
        let changes = CategoryChanges {
            category_name: Some("Soup".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update::<Category>(&mut conn, 9, changes),
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(delete::<Category>(&mut conn, 9), Err(ServiceError::NotFound { .. })));
    }

    #[test]
    fn find_many_resolves_in_id_order_and_skips_missing() {
        let mut conn = test_connection();
        let a = category(&mut conn, "A");
        let b = category(&mut conn, "B");
        let found = Category::find_many(&mut conn, &[b.id, 99, a.id]).unwrap();
        assert_eq!(found, vec![a, b]);
    }
}
