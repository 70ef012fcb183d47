use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse, Scope};
use serde_json::json;

use crate::aggregate;
use crate::catalog::{self, Catalog};
use crate::error::ServiceError;
use crate::forms::FormData;
use crate::links::LinkIds;
use crate::models::{now, Category, Ingredient, Item, ItemAggregate, ItemChanges, Modifier, NewItem};
use crate::query;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root)
        .service(
            web::scope("/food_item")
                .service(get_all_items)
                .service(create_item)
                .service(update_item)
                .service(delete_item)
                // last, so "/all" never reaches the id matcher
                .service(get_item),
        )
        .service(catalog_scope::<Category>())
        .service(catalog_scope::<Ingredient>())
        .service(catalog_scope::<Modifier>());
}

#[get("/")]
async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Hello World" }))
}

fn new_item_from_form(form: &FormData) -> Result<NewItem, ServiceError> {
    Ok(NewItem {
        food_item_name: form.required("food_item_name")?,
        food_item_image: String::new(),
        food_item_description: form.required("food_item_description")?,
        food_item_price: form.required("food_item_price")?,
        food_item_status: form.required("food_item_status")?,
        food_item_type: form.required("food_item_type")?,
        is_featured: form.flag("isFeatured")?.unwrap_or(false),
        created_at: now(),
    })
}

fn item_changes_from_form(form: &FormData) -> Result<ItemChanges, ServiceError> {
    Ok(ItemChanges {
        food_item_name: form.text("food_item_name"),
        food_item_description: form.text("food_item_description"),
        food_item_price: form.text("food_item_price"),
        food_item_status: form.text("food_item_status"),
        food_item_type: form.text("food_item_type"),
        is_featured: form.flag("isFeatured")?,
        ..Default::default()
    })
}

fn link_ids_from_form(form: &FormData) -> Result<LinkIds, ServiceError> {
    Ok(LinkIds {
        categories: form.ids("food_category_id")?,
        ingredients: form.ids("food_ingredient_id")?,
        modifiers: form.ids("food_modifier_id")?,
    })
}

#[get("/all")]
async fn get_all_items(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let items = web::block(move || -> Result<Vec<ItemAggregate>, ServiceError> {
        // read before the store, so a write landing in between retires this entry
        let generation = state.cache.generation();
        if let Some(items) = generation.and_then(|g| state.cache.load(g)) {
            log::debug!("serving food item list from cache");
            return Ok(items);
        }
        let items = state.with_store(aggregate::list_all)?;
        if let Some(generation) = generation {
            state.cache.store(generation, &items);
        }
        Ok(items)
    })
    .await??;
    Ok(HttpResponse::Ok().json(items))
}

#[get("/{id}")]
async fn get_item(state: web::Data<AppState>, path: web::Path<i32>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    let item = web::block(move || state.with_store(|conn| aggregate::get(conn, id))).await??;
    Ok(HttpResponse::Ok().json(item))
}

#[post("/create")]
async fn create_item(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ServiceError> {
    let mut form = FormData::read(payload).await?;
    let new = new_item_from_form(&form)?;
    let ids = link_ids_from_form(&form)?;
    let image = form.require_file("food_item_image")?;

    let item = web::block(move || -> Result<Item, ServiceError> {
        let result = state.with_store(|conn| {
            aggregate::create(conn, &state.files, state.transactions, new, &ids, &image)
        });
        // a failed create may still have committed rows
        state.cache.invalidate();
        result
    })
    .await??;

    Ok(HttpResponse::Created().json(json!({
        "message": "Food Item created successfully",
        "data": item,
    })))
}

#[put("/update/{id}")]
async fn update_item(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    let mut form = FormData::read(payload).await?;
    let changes = item_changes_from_form(&form)?;
    let ids = link_ids_from_form(&form)?;
    let image = form.take_file("food_item_image");

    web::block(move || -> Result<Item, ServiceError> {
        let result = state.with_store(|conn| {
            aggregate::update(conn, &state.files, state.transactions, id, changes, &ids, image.as_ref())
        });
        state.cache.invalidate();
        result
    })
    .await??;

    Ok(HttpResponse::Accepted().json(json!({ "message": "Food Item updated successfully" })))
}

#[delete("/delete/{id}")]
async fn delete_item(state: web::Data<AppState>, path: web::Path<i32>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    web::block(move || -> Result<(), ServiceError> {
        state.with_store(|conn| aggregate::delete(conn, id))?;
        state.cache.invalidate();
        Ok(())
    })
    .await??;
    Ok(HttpResponse::Accepted().json(json!({ "message": "Food Item deleted successfully" })))
}

fn catalog_scope<C: Catalog>() -> Scope {
    web::scope(C::PATH)
        .route("/all", web::get().to(list_rows::<C>))
        .route("/create", web::post().to(create_row::<C>))
        .route("/update/{id}", web::put().to(update_row::<C>))
        .route("/delete/{id}", web::delete().to(delete_row::<C>))
        .route("/{id}", web::get().to(get_row::<C>))
}

async fn list_rows<C: Catalog>(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let rows = web::block(move || state.with_store(query::list::<C>)).await??;
    Ok(HttpResponse::Ok().json(rows))
}

async fn get_row<C: Catalog>(state: web::Data<AppState>, path: web::Path<i32>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    let row = web::block(move || state.with_store(|conn| query::get::<C>(conn, id))).await??;
    Ok(HttpResponse::Ok().json(row))
}

async fn create_row<C: Catalog>(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ServiceError> {
    let mut form = FormData::read(payload).await?;
    let new = C::new_from_form(&form)?;
    let image = form.require_file(C::IMAGE_FIELD)?;

    let row = web::block(move || -> Result<C, ServiceError> {
        let row = state.with_store(|conn| catalog::create::<C>(conn, &state.files, new, &image))?;
        state.cache.invalidate();
        Ok(row)
    })
    .await??;

    Ok(HttpResponse::Created().json(json!({
        "message": format!("{} created successfully", C::KIND),
        "data": row,
    })))
}

async fn update_row<C: Catalog>(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    let mut form = FormData::read(payload).await?;
    let changes = C::changes_from_form(&form)?;
    let image = form.take_file(C::IMAGE_FIELD);

    web::block(move || -> Result<C, ServiceError> {
        let row = state.with_store(|conn| catalog::update::<C>(conn, &state.files, id, changes, image.as_ref()))?;
        state.cache.invalidate();
        Ok(row)
    })
    .await??;

    Ok(HttpResponse::Accepted().json(json!({ "message": format!("{} updated successfully", C::KIND) })))
}

async fn delete_row<C: Catalog>(state: web::Data<AppState>, path: web::Path<i32>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    web::block(move || -> Result<(), ServiceError> {
        state.with_store(|conn| catalog::delete::<C>(conn, id))?;
        state.cache.invalidate();
        Ok(())
    })
    .await??;
    Ok(HttpResponse::Accepted().json(json!({ "message": format!("{} deleted successfully", C::KIND) })))
}
