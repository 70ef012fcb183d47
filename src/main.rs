use std::io;

use actix_web::{middleware, web, App, HttpServer};

use food_catalog::cache::ListCache;
use food_catalog::config::Config;
use food_catalog::files::FileStore;
use food_catalog::{db, handlers, AppState};

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    // set up database connection pool
    let pool = db::build_pool(&config.database_url, config.pool_size).map_err(startup_error)?;
    {
        let mut conn = pool.get().map_err(startup_error)?;
        db::init_schema(&mut conn).map_err(startup_error)?;
    }

    let cache = match config.redis_url.as_deref() {
        Some(url) => ListCache::connect(url).unwrap_or_else(|e| {
            log::warn!("redis unavailable, running without list cache: {}", e);
            ListCache::disabled()
        }),
        None => ListCache::disabled(),
    };

    std::fs::create_dir_all(&config.upload_dir)?;
    let state = web::Data::new(AppState::new(
        pool,
        cache,
        FileStore::new(&config.upload_dir),
        config.transactions,
    ));

    log::info!(
        "starting HTTP server at http://{}:{} ({:?} transactions)",
        config.host,
        config.port,
        config.transactions
    );

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
