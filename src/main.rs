use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use clip_service::db::{create_pool, PoolConfig};
use clip_service::handlers::{
    comments, dashboard, health, likes, playlists, subscriptions, tweets, users, videos,
};
use clip_service::middleware::JwtAuthMiddleware;
use clip_service::security::jwt;
use clip_service::services::{AggregationService, MediaStore, ToggleService};
use clip_service::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting clip-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    if let Err(e) = jwt::initialize_keys(
        &config.auth.access_token_secret,
        &config.auth.refresh_token_secret,
    ) {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to initialize JWT keys: {e}"),
        ));
    }

    // Database pool and schema
    let pool = match create_pool(PoolConfig::from(&config.database)).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");

    let media = MediaStore::connect(&config.media).await;
    let aggregation = AggregationService::new(pool.clone());
    let toggles = ToggleService::new(pool.clone());
    let health_state = web::Data::new(health::HealthState::new(pool.clone()));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(media.clone()))
            .app_data(web::Data::new(aggregation.clone()))
            .app_data(web::Data::new(toggles.clone()))
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            // Health check endpoints
            .route("/health", web::get().to(health::summary))
            .route("/health/ready", web::get().to(health::readiness))
            .route("/health/live", web::get().to(health::liveness))
            .service(
                web::scope("/api/v1")
                    .service(
                        // Mixed public/protected scopes: protected handlers
                        // authenticate through the UserId extractor.
                        web::scope("/users")
                            .route("/register", web::post().to(users::register))
                            .route("/login", web::post().to(users::login))
                            .route("/logout", web::post().to(users::logout))
                            .route("/refresh-token", web::post().to(users::refresh_token))
                            .route("/change-password", web::post().to(users::change_password))
                            .service(
                                web::resource("/me")
                                    .route(web::get().to(users::current_user))
                                    .route(web::patch().to(users::update_account)),
                            )
                            .route("/avatar", web::patch().to(users::update_avatar))
                            .route("/cover-image", web::patch().to(users::update_cover_image))
                            .route("/c/{username}", web::get().to(users::channel_profile))
                            .route("/history", web::get().to(users::watch_history)),
                    )
                    .service(
                        web::scope("/videos")
                            .service(
                                web::resource("")
                                    .route(web::get().to(videos::search))
                                    .route(web::post().to(videos::publish)),
                            )
                            .service(
                                web::resource("/{videoId}")
                                    .route(web::get().to(videos::get_by_id))
                                    .route(web::patch().to(videos::update))
                                    .route(web::delete().to(videos::delete)),
                            )
                            .route(
                                "/{videoId}/publish",
                                web::patch().to(videos::toggle_publish),
                            )
                            .route("/{videoId}/like", web::post().to(videos::toggle_like))
                            .service(
                                web::resource("/{videoId}/comments")
                                    .route(web::get().to(comments::list))
                                    .route(web::post().to(comments::add)),
                            ),
                    )
                    .service(
                        web::scope("/comments")
                            .service(
                                web::resource("/{commentId}")
                                    .route(web::patch().to(comments::update))
                                    .route(web::delete().to(comments::delete)),
                            )
                            .route(
                                "/{commentId}/like",
                                web::post().to(comments::toggle_like),
                            ),
                    )
                    .service(
                        web::scope("/subscriptions")
                            .route("/{channelId}", web::post().to(subscriptions::toggle))
                            .route(
                                "/{channelId}/subscribers",
                                web::get().to(subscriptions::subscribers),
                            )
                            .route(
                                "/{channelId}/subscribed",
                                web::get().to(subscriptions::subscribed_channels),
                            ),
                    )
                    .service(
                        web::scope("/playlists")
                            .service(web::resource("").route(web::post().to(playlists::create)))
                            .route("/user/{userId}", web::get().to(playlists::list_by_user))
                            .service(
                                web::resource("/{playlistId}")
                                    .route(web::get().to(playlists::get_by_id))
                                    .route(web::patch().to(playlists::update))
                                    .route(web::delete().to(playlists::delete)),
                            )
                            .service(
                                web::resource("/{playlistId}/videos/{videoId}")
                                    .route(web::post().to(playlists::add_video))
                                    .route(web::delete().to(playlists::remove_video)),
                            ),
                    )
                    .service(
                        web::scope("/tweets")
                            .wrap(JwtAuthMiddleware)
                            .service(
                                web::resource("")
                                    .route(web::post().to(tweets::create))
                                    .route(web::get().to(tweets::list_mine)),
                            )
                            .service(
                                web::resource("/{tweetId}")
                                    .route(web::patch().to(tweets::update))
                                    .route(web::delete().to(tweets::delete)),
                            )
                            .route("/{tweetId}/like", web::post().to(tweets::toggle_like)),
                    )
                    .service(
                        web::scope("/likes")
                            .wrap(JwtAuthMiddleware)
                            .route("/videos", web::get().to(likes::liked_videos)),
                    )
                    .service(
                        web::scope("/dashboard")
                            .wrap(JwtAuthMiddleware)
                            .route("/stats", web::get().to(dashboard::stats))
                            .route("/videos", web::get().to(dashboard::videos)),
                    ),
            )
    })
    .bind(&bind_address)?
    .run();

    let handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping server");
    handle.stop(true).await;

    match server_task.await {
        Ok(result) => result,
        Err(e) => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("Server task failed: {e}"),
        )),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
