use diesel::connection::{AnsiTransactionManager, SimpleConnection, TransactionManager};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS food_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    category_name TEXT NOT NULL,
    category_image TEXT NOT NULL,
    category_status TEXT NOT NULL,
    category_description TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS food_ingredients (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    ingredient_name TEXT NOT NULL,
    ingredient_image TEXT NOT NULL,
    ingredient_status TEXT NOT NULL,
    ingredient_description TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS food_modifiers (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    modifier_name TEXT NOT NULL,
    modifier_image TEXT NOT NULL,
    modifier_description TEXT NOT NULL,
    modifier_price TEXT,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS food_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    food_item_name TEXT NOT NULL,
    food_item_image TEXT NOT NULL,
    food_item_description TEXT NOT NULL,
    food_item_price TEXT NOT NULL,
    food_item_status TEXT NOT NULL,
    food_item_type TEXT NOT NULL,
    is_featured BOOLEAN NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS food_item_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    food_item_id INTEGER NOT NULL,
    food_category_id INTEGER NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS food_item_ingredients (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    food_item_id INTEGER NOT NULL,
    food_ingredient_id INTEGER NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS food_item_modifiers (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    food_item_id INTEGER NOT NULL,
    food_modifier_id INTEGER NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS food_item_categories_item ON food_item_categories (food_item_id);
CREATE INDEX IF NOT EXISTS food_item_ingredients_item ON food_item_ingredients (food_item_id);
CREATE INDEX IF NOT EXISTS food_item_modifiers_item ON food_item_modifiers (food_item_id);
"#;

/// Creates every table that does not exist yet.
pub fn init_schema(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(SCHEMA)
}

/// Runs `f` in a transaction that takes the write lock up front
/// (`BEGIN IMMEDIATE`), so a read-then-write inside `f` cannot interleave
/// with another writer. Inside an open transaction `f` runs in a savepoint
/// of the enclosing one.
pub fn write_locked<T, E, F>(conn: &mut SqliteConnection, f: F) -> Result<T, E>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, E>,
    E: From<diesel::result::Error>,
{
    let depth = <AnsiTransactionManager as TransactionManager<SqliteConnection>>::transaction_manager_status_mut(conn)
        .transaction_depth()?;
    match depth {
        Some(_) => conn.transaction(f),
        None => conn.immediate_transaction(f),
    }
}

#[derive(Debug, Clone, Copy)]
struct BusyTimeout;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for BusyTimeout {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        // concurrent writers wait for the lock instead of failing with SQLITE_BUSY
        conn.batch_execute("PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub fn build_pool(database_url: &str, max_size: u32) -> Result<DbPool, r2d2::PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(BusyTimeout))
        .build(manager)
}

#[cfg(test)]
pub(crate) fn test_connection() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").unwrap();
    init_schema(&mut conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_bootstrap_is_repeatable() {
        let mut conn = test_connection();
        init_schema(&mut conn).unwrap();
    }

    #[test]
    fn write_locked_nests_inside_an_open_transaction() {
        let mut conn = test_connection();
        let inner: QueryResult<i32> = conn.transaction(|conn| write_locked(conn, |_| Ok(7)));
        assert_eq!(inner.unwrap(), 7);
        let outer: QueryResult<i32> = write_locked(&mut conn, |conn| write_locked(conn, |_| Ok(8)));
        assert_eq!(outer.unwrap(), 8);
    }
}
