use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{food_categories, food_ingredients, food_items, food_modifiers};

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// A set of changes where `None` means "leave the column alone".
pub trait Patch {
    fn is_empty(&self) -> bool;
    fn touch(&mut self, at: NaiveDateTime);
}

macro_rules! patch {
    ($changes:ident { $($field:ident),+ $(,)? }) => {
        impl Patch for $changes {
            fn is_empty(&self) -> bool {
                $(self.$field.is_none())&&+
            }

            fn touch(&mut self, at: NaiveDateTime) {
                self.updated_at = Some(at);
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = food_categories)]
pub struct Category {
    pub id: i32,
    pub category_name: String,
    pub category_image: String,
    pub category_status: String,
    pub category_description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = food_categories)]
pub struct NewCategory {
    pub category_name: String,
    pub category_image: String,
    pub category_status: String,
    pub category_description: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = food_categories)]
pub struct CategoryChanges {
    pub category_name: Option<String>,
    pub category_image: Option<String>,
    pub category_status: Option<String>,
    pub category_description: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

patch!(CategoryChanges {
    category_name,
    category_image,
    category_status,
    category_description,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = food_ingredients)]
pub struct Ingredient {
    pub id: i32,
    pub ingredient_name: String,
    pub ingredient_image: String,
    pub ingredient_status: String,
    pub ingredient_description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = food_ingredients)]
pub struct NewIngredient {
    pub ingredient_name: String,
    pub ingredient_image: String,
    pub ingredient_status: String,
    pub ingredient_description: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = food_ingredients)]
pub struct IngredientChanges {
    pub ingredient_name: Option<String>,
    pub ingredient_image: Option<String>,
    pub ingredient_status: Option<String>,
    pub ingredient_description: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

patch!(IngredientChanges {
    ingredient_name,
    ingredient_image,
    ingredient_status,
    ingredient_description,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = food_modifiers)]
pub struct Modifier {
    pub id: i32,
    pub modifier_name: String,
    pub modifier_image: String,
    pub modifier_description: String,
    pub modifier_price: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = food_modifiers)]
pub struct NewModifier {
    pub modifier_name: String,
    pub modifier_image: String,
    pub modifier_description: String,
    pub modifier_price: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = food_modifiers)]
pub struct ModifierChanges {
    pub modifier_name: Option<String>,
    pub modifier_image: Option<String>,
    pub modifier_description: Option<String>,
    pub modifier_price: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

patch!(ModifierChanges {
    modifier_name,
    modifier_image,
    modifier_description,
    modifier_price,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = food_items)]
pub struct Item {
    pub id: i32,
    pub food_item_name: String,
    pub food_item_image: String,
    pub food_item_description: String,
    pub food_item_price: String, // kept as entered, e.g. "12.50"
    pub food_item_status: String,
    pub food_item_type: String,
    #[serde(rename = "isFeatured")]
    pub is_featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = food_items)]
pub struct NewItem {
    pub food_item_name: String,
    pub food_item_image: String,
    pub food_item_description: String,
    pub food_item_price: String,
    pub food_item_status: String,
    pub food_item_type: String,
    pub is_featured: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = food_items)]
pub struct ItemChanges {
    pub food_item_name: Option<String>,
    pub food_item_image: Option<String>,
    pub food_item_description: Option<String>,
    pub food_item_price: Option<String>,
    pub food_item_status: Option<String>,
    pub food_item_type: Option<String>,
    pub is_featured: Option<bool>,
    pub updated_at: Option<NaiveDateTime>,
}

patch!(ItemChanges {
    food_item_name,
    food_item_image,
    food_item_description,
    food_item_price,
    food_item_status,
    food_item_type,
    is_featured,
});

/// A row of one of the three junction tables.
#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Link {
    pub id: i32,
    pub food_item_id: i32,
    pub other_id: i32,
    pub created_at: NaiveDateTime,
}

/// An item together with everything it is linked to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAggregate {
    pub item: Item,
    pub categories: Vec<Category>,
    pub ingredients: Vec<Ingredient>,
    pub modifiers: Vec<Modifier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_is_empty_until_a_field_is_set() {
        let mut changes = ItemChanges::default();
        assert!(changes.is_empty());

        changes.touch(now());
        assert!(changes.is_empty(), "updated_at alone is not a change");

        changes.food_item_price = Some("9.99".to_string());
        assert!(!changes.is_empty());
    }

    #[test]
    fn item_serializes_featured_flag_as_camel_case() {
        let item = Item {
            id: 1,
            food_item_name: "Burger".to_string(),
            food_item_image: "FoodItem/a.png".to_string(),
            food_item_description: "beef".to_string(),
            food_item_price: "8.00".to_string(),
            food_item_status: "active".to_string(),
            food_item_type: "main".to_string(),
            is_featured: true,
            created_at: now(),
            updated_at: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["isFeatured"], serde_json::Value::Bool(true));
        assert!(json.get("is_featured").is_none());
    }
}
