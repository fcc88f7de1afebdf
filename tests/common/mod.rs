/// Shared test harness: JWT key setup and a service instance backed by a
/// lazy pool that never opens a connection, so everything asserted here
/// happens before any database access.
use actix_web::web;
use sqlx::PgPool;
use std::sync::Once;
use uuid::Uuid;

use clip_service::handlers::{comments, subscriptions, tweets, users};
use clip_service::middleware::JwtAuthMiddleware;
use clip_service::security::jwt;
use clip_service::services::{AggregationService, ToggleService};

static INIT: Once = Once::new();

pub fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("APP_ENV", "test");
        jwt::initialize_keys("test-access-secret", "test-refresh-secret")
            .expect("Failed to initialize JWT keys");
    });
}

pub fn bearer_for(user_id: Uuid) -> String {
    let token = jwt::generate_access_token(user_id, "tester").expect("token generation");
    format!("Bearer {token}")
}

/// Register a representative slice of the route tree against a pool that
/// cannot connect. Handlers that reach the database will fail there; the
/// tests only exercise paths that reject earlier.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let pool = PgPool::connect_lazy("postgresql://127.0.0.1:9/unreachable")
        .expect("lazy pool construction");

    cfg.app_data(web::Data::new(pool.clone()))
        .app_data(web::Data::new(AggregationService::new(pool.clone())))
        .app_data(web::Data::new(ToggleService::new(pool)))
        .service(
            web::scope("/api/v1")
                .service(web::scope("/users").route("/me", web::get().to(users::current_user)))
                .service(
                    web::scope("/comments").service(
                        web::resource("/{commentId}").route(web::delete().to(comments::delete)),
                    ),
                )
                .service(
                    web::scope("/subscriptions")
                        .route("/{channelId}", web::post().to(subscriptions::toggle))
                        .route(
                            "/{channelId}/subscribers",
                            web::get().to(subscriptions::subscribers),
                        ),
                )
                .service(
                    web::scope("/tweets")
                        .wrap(JwtAuthMiddleware)
                        .route("", web::get().to(tweets::list_mine)),
                ),
        );
}
