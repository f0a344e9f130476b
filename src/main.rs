mod config;
mod error;
mod handlers;
mod models;
mod services;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::time::Duration;

use config::Config;
use services::{BackendClient, MemorySessionStore, SelectionStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("🚀 Starting HR Analytics Gateway");

    // Load configuration from environment variables
    let config = Config::from_env();
    log::info!("🔗 Backend base URL: {}", config.backend_base_url);

    let backend = BackendClient::new(&config);
    log::info!("💾 Using in-memory session and chart-selection stores");
    let sessions = MemorySessionStore::new();
    let selections = SelectionStore::new(config.selection_ttl_minutes);

    // Sweep expired chart selections in the background
    let sweeper = selections.clone();
    tokio::spawn(async move {
        log::info!("🧹 Selection sweeper started (60s interval)");
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            if let Err(e) = sweeper.sweep_expired() {
                log::error!("❌ Selection sweep failed: {}", e);
            }
        }
    });

    // Start HTTP server
    let server_url = format!("http://127.0.0.1:{}", config.server_port);
    log::info!("🌐 Starting server at {}", server_url);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(backend.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(selections.clone()))
            .service(
                web::resource("/ask")
                    .route(web::post().to(handlers::ask::ask::<MemorySessionStore>)),
            )
            .service(web::resource("/health").route(web::get().to(handlers::info::health)))
            .service(web::resource("/user/role").route(web::get().to(handlers::info::user_role)))
            .service(
                web::resource("/sessions/")
                    .route(web::get().to(handlers::sessions::list_sessions::<MemorySessionStore>)),
            )
            .service(
                web::resource("/history/{id}")
                    .route(web::get().to(handlers::sessions::get_history::<MemorySessionStore>)),
            )
            .service(
                web::resource("/sessions/{id}/pin")
                    .route(web::post().to(handlers::sessions::toggle_pin::<MemorySessionStore>)),
            )
            .service(
                web::resource("/sessions/{id}").route(
                    web::delete().to(handlers::sessions::delete_session::<MemorySessionStore>),
                ),
            )
            .service(
                web::resource("/speech/text-to-speech")
                    .route(web::post().to(handlers::speech::text_to_speech)),
            )
            .service(
                web::resource("/api/viz/chart-types")
                    .route(web::get().to(handlers::viz::chart_types)),
            )
            .service(
                web::resource("/api/viz/recommend").route(web::post().to(handlers::viz::recommend)),
            )
            .service(web::resource("/api/viz/select").route(web::post().to(handlers::viz::select)))
            .service(web::resource("/api/viz/sort").route(web::post().to(handlers::viz::sort)))
            .service(
                web::resource("/api/viz/rendered")
                    .route(web::post().to(handlers::viz::render_complete)),
            )
            .service(
                web::resource("/api/viz/change-type")
                    .route(web::post().to(handlers::viz::change_type)),
            )
            .service(web::resource("/api/viz/cancel").route(web::post().to(handlers::viz::cancel)))
    })
    .bind(format!("127.0.0.1:{}", config.server_port))
    .map_err(|e| {
        log::error!("❌ Failed to bind to port {}: {}", config.server_port, e);
        e
    })?
    .run()
    .await
}
