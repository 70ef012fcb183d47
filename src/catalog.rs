//! Categories, ingredients and modifiers: plain rows with an image.

use diesel::prelude::*;

use crate::db;
use crate::error::ServiceError;
use crate::files::{FileStore, Upload};
use crate::forms::FormData;
use crate::links::{self, Relation};
use crate::models::{
    now, Category, CategoryChanges, Ingredient, IngredientChanges, Modifier, ModifierChanges, NewCategory,
    NewIngredient, NewModifier,
};
use crate::query::{self, Record};

pub trait Catalog: Record {
    /// Path prefix of the HTTP resource, e.g. `/food_category`.
    const PATH: &'static str;
    const UPLOAD_FOLDER: &'static str;
    const IMAGE_FIELD: &'static str;
    const RELATION: Relation;

    /// Reads the row to insert; the image reference is filled in later.
    fn new_from_form(form: &FormData) -> Result<Self::New, ServiceError>;
    fn changes_from_form(form: &FormData) -> Result<Self::Changes, ServiceError>;
}

impl Catalog for Category {
    const PATH: &'static str = "/food_category";
    const UPLOAD_FOLDER: &'static str = "FoodCategory";
    const IMAGE_FIELD: &'static str = "category_image";
    const RELATION: Relation = Relation::Category;

    fn new_from_form(form: &FormData) -> Result<NewCategory, ServiceError> {
        Ok(NewCategory {
            category_name: form.required("category_name")?,
            category_image: String::new(),
            category_status: form.required("category_status")?,
            category_description: form.required("category_description")?,
            created_at: now(),
        })
    }

    fn changes_from_form(form: &FormData) -> Result<CategoryChanges, ServiceError> {
        Ok(CategoryChanges {
            category_name: form.text("category_name"),
            category_status: form.text("category_status"),
            category_description: form.text("category_description"),
            ..Default::default()
        })
    }
}

impl Catalog for Ingredient {
    const PATH: &'static str = "/food_ingredient";
    const UPLOAD_FOLDER: &'static str = "FoodIngredient";
    const IMAGE_FIELD: &'static str = "ingredient_image";
    const RELATION: Relation = Relation::Ingredient;

    fn new_from_form(form: &FormData) -> Result<NewIngredient, ServiceError> {
        Ok(NewIngredient {
            ingredient_name: form.required("ingredient_name")?,
            ingredient_image: String::new(),
            ingredient_status: form.required("ingredient_status")?,
            ingredient_description: form.required("ingredient_description")?,
            created_at: now(),
        })
    }

    fn changes_from_form(form: &FormData) -> Result<IngredientChanges, ServiceError> {
        Ok(IngredientChanges {
            ingredient_name: form.text("ingredient_name"),
            ingredient_status: form.text("ingredient_status"),
            ingredient_description: form.text("ingredient_description"),
            ..Default::default()
        })
    }
}

impl Catalog for Modifier {
    const PATH: &'static str = "/food_modifier";
    const UPLOAD_FOLDER: &'static str = "FoodModifier";
    const IMAGE_FIELD: &'static str = "modifier_image";
    const RELATION: Relation = Relation::Modifier;

    fn new_from_form(form: &FormData) -> Result<NewModifier, ServiceError> {
        Ok(NewModifier {
            modifier_name: form.required("modifier_name")?,
            modifier_image: String::new(),
            modifier_description: form.required("modifier_description")?,
            modifier_price: form.text("modifier_price"),
            created_at: now(),
        })
    }

    fn changes_from_form(form: &FormData) -> Result<ModifierChanges, ServiceError> {
        Ok(ModifierChanges {
            modifier_name: form.text("modifier_name"),
            modifier_description: form.text("modifier_description"),
            modifier_price: form.text("modifier_price"),
            ..Default::default()
        })
    }
}

/// Name check, image, then insert under one write lock; a taken name
/// stores nothing.
pub fn create<C: Catalog>(
    conn: &mut SqliteConnection,
    files: &FileStore,
    mut new: C::New,
    image: &Upload,
) -> Result<C, ServiceError> {
    let mut saved = None;
    let result = db::write_locked(conn, |conn| -> Result<C, ServiceError> {
        query::ensure_unique::<C>(conn, C::name_of(&new))?;
        let reference = files.save(C::UPLOAD_FOLDER, image)?;
        saved = Some(reference.clone());
        C::set_image(&mut new, reference);
        Ok(C::insert(conn, &new)?)
    });
    match result {
        Ok(row) => {
            log::info!("created {} {}", C::KIND, C::name_of(&new));
            Ok(row)
        }
        Err(e) => {
            if let Some(reference) = saved {
                files.discard(&reference);
            }
            Err(e)
        }
    }
}

pub fn update<C: Catalog>(
    conn: &mut SqliteConnection,
    files: &FileStore,
    id: i32,
    mut changes: C::Changes,
    image: Option<&Upload>,
) -> Result<C, ServiceError> {
    query::get::<C>(conn, id)?;
    let mut saved = None;
    if let Some(image) = image {
        let reference = files.save(C::UPLOAD_FOLDER, image)?;
        saved = Some(reference.clone());
        C::change_image(&mut changes, reference);
    }
    let result = query::update::<C>(conn, id, changes);
    if let (Err(_), Some(reference)) = (&result, saved) {
        files.discard(&reference);
    }
    result
}

/// Deletes the row and every item link that points at it.
pub fn delete<C: Catalog>(conn: &mut SqliteConnection, id: i32) -> Result<(), ServiceError> {
    query::get::<C>(conn, id)?;
    conn.transaction(|conn| {
        let removed = links::delete_all_for_target(conn, C::RELATION, id)?;
        query::delete::<C>(conn, id)?;
        log::info!("deleted {} {id} and {removed} item link(s)", C::KIND);
        Ok(())
    })
}
