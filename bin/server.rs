// Home Energy Tracker - Web Server
// REST API over the same library the CLI uses

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use home_energy::{
    aggregate, auth, catalog::ApplianceCategory, default_month_ranges, load_registrations,
    recommend, register, registration::RegistrationError, rooms::Room, setup_database, usage_log,
    CatalogEntry, CatalogRegistry, RegisteredAppliance, SqliteRegistrations, UsageEntry,
    AVERAGE_USAGE_KWH, RECOMMENDATION_LIMIT,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    catalogs: Arc<CatalogRegistry>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<Value> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterRequest {
    unique_id: String,
}

/// Recommendations response, including the baseline the popup displays
#[derive(Serialize)]
struct RecommendationsResponse {
    reference: RegisteredAppliance,
    average_usage: f64,
    recommendations: Vec<CatalogEntry>,
}

#[derive(Serialize)]
struct RoomResponse {
    name: &'static str,
    appliances: Vec<&'static str>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/signup - Create an account and sign in
async fn signup(State(state): State<AppState>, Json(req): Json<Credentials>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match auth::signup(&conn, &req.email, &req.password) {
        Ok(user_id) => {
            (StatusCode::OK, Json(ApiResponse::ok(json!({ "user_id": user_id })))).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))).into_response(),
    }
}

/// POST /api/login - Sign in
async fn login(State(state): State<AppState>, Json(req): Json<Credentials>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match auth::login(&conn, &req.email, &req.password) {
        Ok(user_id) => {
            (StatusCode::OK, Json(ApiResponse::ok(json!({ "user_id": user_id })))).into_response()
        }
        Err(e) => {
            (StatusCode::UNAUTHORIZED, Json(ApiResponse::err(e.to_string()))).into_response()
        }
    }
}

/// POST /api/logout - Sign out
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match auth::logout(&conn) {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok("OK"))).into_response(),
        Err(e) => {
            eprintln!("Error clearing session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to sign out")),
            )
                .into_response()
        }
    }
}

/// GET /api/session - Current signed-in identity or none
async fn session(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match auth::current_user(&conn) {
        Ok(user_id) => {
            (StatusCode::OK, Json(ApiResponse::ok(json!({ "user_id": user_id })))).into_response()
        }
        Err(e) => {
            eprintln!("Error reading session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to read session")),
            )
                .into_response()
        }
    }
}

/// GET /api/rooms - Rooms and the appliances their screens offer
async fn get_rooms() -> impl IntoResponse {
    let rooms: Vec<RoomResponse> = Room::all()
        .iter()
        .map(|room| RoomResponse {
            name: room.name(),
            appliances: room.appliances().iter().map(|a| a.name()).collect(),
        })
        .collect();

    Json(ApiResponse::ok(rooms))
}

/// GET /api/catalog/:category - Bundled catalog for a category
async fn get_catalog(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> impl IntoResponse {
    let category = match ApplianceCategory::from_name(&category) {
        Some(category) => category,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::err(format!("Unknown category: {}", category))),
            )
                .into_response()
        }
    };

    let entries: Vec<CatalogEntry> = state.catalogs.entries(category).to_vec();
    (StatusCode::OK, Json(ApiResponse::ok(entries))).into_response()
}

/// GET /api/appliances/:category - The signed-in user's registered appliances
async fn get_appliances(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    let category = match ApplianceCategory::from_name(&category) {
        Some(category) => category,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::err(format!("Unknown category: {}", category))),
            )
                .into_response()
        }
    };

    let user_id = match auth::current_user(&conn) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::err("No logged-in user")),
            )
                .into_response()
        }
        Err(e) => {
            eprintln!("Error reading session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to read session")),
            )
                .into_response();
        }
    };

    let repo = SqliteRegistrations::new(&conn);
    let store = load_registrations(&repo, &user_id);
    let saved: Vec<RegisteredAppliance> = store.appliances(category).to_vec();

    (StatusCode::OK, Json(ApiResponse::ok(saved))).into_response()
}

/// POST /api/appliances/:category - Register a catalog entry
async fn register_appliance(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    let category = match ApplianceCategory::from_name(&category) {
        Some(category) => category,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::err(format!("Unknown category: {}", category))),
            )
                .into_response()
        }
    };

    let current = match auth::current_user(&conn) {
        Ok(current) => current,
        Err(e) => {
            eprintln!("Error reading session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to read session")),
            )
                .into_response();
        }
    };

    let selection = state.catalogs.find(category, &req.unique_id);
    let repo = SqliteRegistrations::new(&conn);

    match register(&repo, current.as_deref(), category, selection) {
        Ok(appliance) => (StatusCode::OK, Json(ApiResponse::ok(appliance))).into_response(),
        Err(RegistrationError::Authentication) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::err(RegistrationError::Authentication.to_string())),
        )
            .into_response(),
        Err(RegistrationError::SelectionMissing) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err(format!(
                "No {} with id {} in the catalog",
                category.name(),
                req.unique_id
            ))),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error registering appliance: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /api/appliances/:category/:aid/recommendations - Lower-usage picks
async fn get_recommendations(
    State(state): State<AppState>,
    Path((category, aid)): Path<(String, String)>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    let category = match ApplianceCategory::from_name(&category) {
        Some(category) => category,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::err(format!("Unknown category: {}", category))),
            )
                .into_response()
        }
    };

    let user_id = match auth::current_user(&conn) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::err("No logged-in user")),
            )
                .into_response()
        }
        Err(e) => {
            eprintln!("Error reading session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to read session")),
            )
                .into_response();
        }
    };

    let repo = SqliteRegistrations::new(&conn);
    let store = load_registrations(&repo, &user_id);

    let reference = match store.appliances(category).iter().find(|a| a.aid == aid) {
        Some(reference) => reference.clone(),
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::err(format!(
                    "{} {} is not registered",
                    category.name(),
                    aid
                ))),
            )
                .into_response()
        }
    };

    let recommendations: Vec<CatalogEntry> =
        recommend(state.catalogs.entries(category), &reference, RECOMMENDATION_LIMIT)
            .into_iter()
            .cloned()
            .collect();

    let response = RecommendationsResponse {
        reference,
        average_usage: AVERAGE_USAGE_KWH,
        recommendations,
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/summary - Per-category usage totals for the chart
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    let user_id = match auth::current_user(&conn) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::err("No logged-in user")),
            )
                .into_response()
        }
        Err(e) => {
            eprintln!("Error reading session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to read session")),
            )
                .into_response();
        }
    };

    let repo = SqliteRegistrations::new(&conn);
    let store = load_registrations(&repo, &user_id);

    (StatusCode::OK, Json(ApiResponse::ok(aggregate(&store)))).into_response()
}

/// GET /api/months - Month ranges the usage screens offer
async fn get_months() -> impl IntoResponse {
    Json(ApiResponse::ok(default_month_ranges()))
}

/// GET /api/usage/:range - Logged entries for a month range
async fn get_usage(
    State(state): State<AppState>,
    Path(range): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let range = decode_range(&range);

    match usage_log::load_usage(&conn, &range) {
        Ok(entries) => (StatusCode::OK, Json(ApiResponse::ok(entries))).into_response(),
        Err(e) => {
            eprintln!("Error loading usage for {}: {}", range, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to load usage entries")),
            )
                .into_response()
        }
    }
}

/// POST /api/usage/:range - Append one logged entry
async fn post_usage(
    State(state): State<AppState>,
    Path(range): Path<String>,
    Json(entry): Json<UsageEntry>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let range = decode_range(&range);

    match usage_log::log_usage(&conn, &range, entry) {
        Ok(entries) => (StatusCode::OK, Json(ApiResponse::ok(entries))).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))).into_response(),
    }
}

/// PUT /api/usage/:range - Replace a month's logged entries
async fn put_usage(
    State(state): State<AppState>,
    Path(range): Path<String>,
    Json(entries): Json<Vec<UsageEntry>>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let range = decode_range(&range);

    match usage_log::save_usage(&conn, &range, &entries) {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(entries.len()))).into_response(),
        Err(e) => {
            eprintln!("Error saving usage for {}: {}", range, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Failed to save usage entries")),
            )
                .into_response()
        }
    }
}

/// Month-range labels carry slashes and spaces, so they arrive URL-encoded
fn decode_range(raw: &str) -> String {
    urlencoding::decode(raw)
        .unwrap_or_else(|_| raw.into())
        .into_owned()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🏠 Home Energy Tracker - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("HOME_ENERGY_DB").unwrap_or_else(|_| "home-energy.db".to_string());

    let conn = Connection::open(&db_path).expect("Failed to open database");
    setup_database(&conn).expect("Failed to set up database");
    println!("✓ Database ready: {}", db_path);

    let catalogs = CatalogRegistry::load().expect("Failed to load bundled catalogs");
    println!("✓ Catalogs loaded");

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        catalogs: Arc::new(catalogs),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
        .route("/rooms", get(get_rooms))
        .route("/catalog/:category", get(get_catalog))
        .route("/appliances/:category", get(get_appliances).post(register_appliance))
        .route(
            "/appliances/:category/:aid/recommendations",
            get(get_recommendations),
        )
        .route("/summary", get(get_summary))
        .route("/months", get(get_months))
        .route("/usage/:range", get(get_usage).post(post_usage).put(put_usage))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/catalog/tv");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
