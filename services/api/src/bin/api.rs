//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, google::GoogleIdentity},
    config::Config,
    error::ApiError,
    token::TokenAuthenticator,
    web::{
        auth::{google_callback_handler, login_handler, register_handler},
        bookings::{
            cancel_booking_handler, create_booking_handler, get_booking_handler,
            list_bookings_handler, provider_bookings_handler, update_booking_status_handler,
        },
        notifications::{
            create_notification_handler, delete_notification_handler, list_notifications_handler,
            mark_all_read_handler, mark_read_handler, unread_count_handler,
        },
        providers::{
            add_break_handler, add_holiday_handler, add_slot_handler, create_provider_handler,
            delete_break_handler, delete_holiday_handler, delete_slot_handler,
            get_availability_handler, my_provider_handler, provider_profile_handler,
            provider_services_handler, update_availability_handler,
            update_provider_profile_handler,
        },
        reviews::{create_review_handler, delete_review_handler, my_reviews_handler},
        root_handler,
        services::{
            create_service_handler, delete_service_handler, get_service_handler,
            list_services_handler, search_services_handler, service_reviews_handler,
            update_service_handler,
        },
        state::AppState,
        users::{me_handler, set_role_handler},
        ApiDoc, require_auth,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use nearserve_core::ports::{IdentityProvider, Store};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let tokens = TokenAuthenticator::new(&config.jwt_secret, config.jwt_expiry_hours);

    let identity: Option<Arc<dyn IdentityProvider>> = match (
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_redirect_uri.clone(),
    ) {
        (Some(client_id), Some(client_secret), Some(redirect_uri)) => {
            info!("Google sign-in enabled");
            Some(Arc::new(GoogleIdentity::new(
                client_id,
                client_secret,
                redirect_uri,
            )))
        }
        _ => {
            info!("Google sign-in disabled (credentials not configured)");
            None
        }
    };

    // --- 4. Build the Shared AppState ---
    let store: Arc<dyn Store> = db_adapter;
    let app_state = Arc::new(AppState {
        store,
        config: config.clone(),
        tokens,
        identity,
    });

    let mut origins = Vec::with_capacity(config.cors_origins.len());
    for origin in &config.cors_origins {
        let value = origin
            .parse::<HeaderValue>()
            .map_err(|_| ApiError::Internal(format!("Invalid CORS origin: '{origin}'")))?;
        origins.push(value);
    }
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required). The notification create endpoint is
    // guarded by the x-system-key header instead of a bearer token.
    let public_routes = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/google/callback", post(google_callback_handler))
        .route("/services", get(list_services_handler))
        .route("/services/search", get(search_services_handler))
        .route("/services/{id}", get(get_service_handler))
        .route("/services/{id}/reviews", get(service_reviews_handler))
        .route("/providers/{id}/availability", get(get_availability_handler))
        .route("/notifications", post(create_notification_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/users/me", get(me_handler))
        .route("/users/set-role", put(set_role_handler))
        .route("/services", post(create_service_handler))
        .route(
            "/services/{id}",
            put(update_service_handler).delete(delete_service_handler),
        )
        .route(
            "/bookings",
            post(create_booking_handler).get(list_bookings_handler),
        )
        .route("/bookings/provider/bookings", get(provider_bookings_handler))
        .route(
            "/bookings/{id}",
            get(get_booking_handler).delete(cancel_booking_handler),
        )
        .route("/bookings/{id}/status", put(update_booking_status_handler))
        .route("/reviews", post(create_review_handler))
        .route("/reviews/my-reviews", get(my_reviews_handler))
        .route("/reviews/{id}", delete(delete_review_handler))
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/unread-count", get(unread_count_handler))
        .route("/notifications/read-all", put(mark_all_read_handler))
        .route("/notifications/{id}/read", put(mark_read_handler))
        .route("/notifications/{id}", delete(delete_notification_handler))
        .route("/providers", post(create_provider_handler))
        .route("/providers/me", get(my_provider_handler))
        .route(
            "/providers/profile",
            get(provider_profile_handler).put(update_provider_profile_handler),
        )
        .route("/providers/services", get(provider_services_handler))
        .route("/providers/{id}/availability", put(update_availability_handler))
        .route("/providers/{id}/availability/slot", post(add_slot_handler))
        .route(
            "/providers/{id}/availability/slot/{slotId}",
            delete(delete_slot_handler),
        )
        .route("/providers/{id}/availability/holiday", post(add_holiday_handler))
        .route(
            "/providers/{id}/availability/holiday/{holidayId}",
            delete(delete_holiday_handler),
        )
        .route("/providers/{id}/availability/break", post(add_break_handler))
        .route(
            "/providers/{id}/availability/break/{breakId}",
            delete(delete_break_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/api", api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
