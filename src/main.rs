use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use taskforge::{
    auth::{AuthMiddleware, KeyMaterialProvider, LogResetNotifier, Sha512PasswordHasher},
    clock::SystemClock,
    config::Config,
    routes,
    store::{PgTaskStore, PgUserStore},
    AppSettings, AppState,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Signing configuration problems are fatal at startup, never per request.
    let config = Config::from_env().unwrap_or_else(|e| {
        log::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    let signing_key = KeyMaterialProvider::new()
        .resolve(&config.jwt.signing)
        .unwrap_or_else(|e| {
            log::error!("Cannot load JWT signing key: {}", e);
            std::process::exit(1);
        });
    log::info!("Access tokens signed with {:?}", signing_key.algorithm());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let user_store = Arc::new(PgUserStore::new(pool.clone()));
    let state = web::Data::new(AppState::new(
        user_store.clone(),
        user_store,
        Arc::new(PgTaskStore::new(pool)),
        Arc::new(Sha512PasswordHasher),
        Arc::new(SystemClock),
        Arc::new(LogResetNotifier),
        signing_key,
        AppSettings::from(&config),
    ));

    log::info!("Starting TaskForge server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
