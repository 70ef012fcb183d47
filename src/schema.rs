table! {
    food_categories (id) {
        id -> Integer,
        category_name -> Text,
        category_image -> Text,
        category_status -> Text,
        category_description -> Text,
        created_at -> Timestamp,
        updated_at -> Nullable<Timestamp>,
    }
}

table! {
    food_ingredients (id) {
        id -> Integer,
        ingredient_name -> Text,
        ingredient_image -> Text,
        ingredient_status -> Text,
        ingredient_description -> Text,
        created_at -> Timestamp,
        updated_at -> Nullable<Timestamp>,
    }
}

table! {
    food_modifiers (id) {
        id -> Integer,
        modifier_name -> Text,
        modifier_image -> Text,
        modifier_description -> Text,
        modifier_price -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Nullable<Timestamp>,
    }
}

table! {
    food_items (id) {
        id -> Integer,
        food_item_name -> Text,
        food_item_image -> Text,
        food_item_description -> Text,
        food_item_price -> Text,
        food_item_status -> Text,
        food_item_type -> Text,
        is_featured -> Bool,
        created_at -> Timestamp,
        updated_at -> Nullable<Timestamp>,
    }
}

// junction tables carry a surrogate id; (food_item_id, other) pairs are kept
// unique by links::ensure_link, not by the database
table! {
    food_item_categories (id) {
        id -> Integer,
        food_item_id -> Integer,
        food_category_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    food_item_ingredients (id) {
        id -> Integer,
        food_item_id -> Integer,
        food_ingredient_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    food_item_modifiers (id) {
        id -> Integer,
        food_item_id -> Integer,
        food_modifier_id -> Integer,
        created_at -> Timestamp,
    }
}

joinable!(food_item_categories -> food_items (food_item_id));
joinable!(food_item_categories -> food_categories (food_category_id));
joinable!(food_item_ingredients -> food_items (food_item_id));
joinable!(food_item_ingredients -> food_ingredients (food_ingredient_id));
joinable!(food_item_modifiers -> food_items (food_item_id));
joinable!(food_item_modifiers -> food_modifiers (food_modifier_id));

allow_tables_to_appear_in_same_query!(
    food_categories,
    food_ingredients,
    food_modifiers,
    food_items,
    food_item_categories,
    food_item_ingredients,
    food_item_modifiers,
);
