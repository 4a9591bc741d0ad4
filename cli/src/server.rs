use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use larder_core::models::{
    NewProduct, NewRecipe, NewStore, Product, ProductFilter, RecentItem, RecipeDetail,
    RecipeFilter, ShoppingListEntry, Store, Suggestion,
};
use larder_core::reconcile::SearchBuckets;
use larder_core::shopping::{AddedEntry, RECENT_ITEMS_PAGE};
use larder_core::{CoreError, MealPeriod, PlannerService};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<PlannerService>>,
    api_key: Option<String>,
}

impl AppState {
    fn service(&self) -> MutexGuard<'_, PlannerService> {
        self.service
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct ProductQuery {
    search: Option<String>,
    /// Comma-separated store ids; a product sold at any of them matches.
    store_id: Option<String>,
    in_stock: Option<bool>,
}

#[derive(Deserialize)]
struct RecipeQuery {
    search: Option<String>,
    meal_type: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Deserialize)]
struct AddToListRequest {
    #[serde(alias = "productId")]
    product_id: i64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// --- Error handling ---

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoRecipesForPeriod(_) | CoreError::NotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            CoreError::Invalid(msg) => Self::BadRequest(msg),
            CoreError::StorageUnavailable(_) => Self::Internal(err.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

fn parse_store_ids(raw: Option<&str>) -> Result<Vec<i64>, ApiError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .map(|id| {
                    id.trim()
                        .parse::<i64>()
                        .map_err(|_| ApiError::BadRequest(format!("Invalid store_id '{id}'")))
                })
                .collect::<Result<Vec<i64>, ApiError>>()
        })
        .transpose()
        .map(Option::unwrap_or_default)
}

// --- Handlers ---

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// Stores

async fn list_stores(State(state): State<AppState>) -> Result<Json<Vec<Store>>, ApiError> {
    Ok(Json(state.service().db().list_stores()?))
}

async fn create_store(
    State(state): State<AppState>,
    Json(req): Json<NewStore>,
) -> Result<(StatusCode, Json<Store>), ApiError> {
    let store = state.service().db().insert_store(&req)?;
    Ok((StatusCode::CREATED, Json(store)))
}

async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Store>, ApiError> {
    Ok(Json(state.service().db().get_store(id)?))
}

async fn update_store(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewStore>,
) -> Result<Json<Store>, ApiError> {
    Ok(Json(state.service().db().update_store(id, &req)?))
}

async fn delete_store(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.service().db().delete_store(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Store {id} not found")))
    }
}

// Products

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let filter = ProductFilter {
        search: query.search,
        store_ids: parse_store_ids(query.store_id.as_deref())?,
        in_stock: query.in_stock,
    };
    Ok(Json(state.service().db().list_products(&filter)?))
}

async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.service().db().insert_product(&req)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.service().db().get_product(id)?))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewProduct>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.service().db().update_product(id, &req)?))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.service().db().delete_product(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Product {id} not found")))
    }
}

// Recipes

async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
) -> Result<Json<Vec<RecipeDetail>>, ApiError> {
    let meal_type = query
        .meal_type
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(str::parse::<MealPeriod>)
        .transpose()?;
    let filter = RecipeFilter {
        search: query.search,
        meal_type,
    };
    Ok(Json(state.service().db().list_recipes(&filter)?))
}

async fn create_recipe(
    State(state): State<AppState>,
    Json(req): Json<NewRecipe>,
) -> Result<(StatusCode, Json<RecipeDetail>), ApiError> {
    let recipe = state.service().db().insert_recipe(&req)?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    Ok(Json(state.service().db().get_recipe_detail(id)?))
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewRecipe>,
) -> Result<Json<RecipeDetail>, ApiError> {
    Ok(Json(state.service().db().update_recipe(id, &req)?))
}

async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.service().db().delete_recipe(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Recipe {id} not found")))
    }
}

// Suggestion, shopping list, recent items

async fn meal_suggestion(State(state): State<AppState>) -> Result<Json<Suggestion>, ApiError> {
    Ok(Json(state.service().suggest()?))
}

async fn get_shopping_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShoppingListEntry>>, ApiError> {
    Ok(Json(state.service().shopping_list()?))
}

async fn add_to_shopping_list(
    State(state): State<AppState>,
    Json(req): Json<AddToListRequest>,
) -> Result<(StatusCode, Json<AddedEntry>), ApiError> {
    let added = state.service().add_to_list(req.product_id)?;
    let status = if added.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(added)))
}

async fn remove_from_shopping_list(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service().remove_from_list(product_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recent_items(State(state): State<AppState>) -> Result<Json<Vec<RecentItem>>, ApiError> {
    Ok(Json(state.service().recent_items(RECENT_ITEMS_PAGE)?))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchBuckets>, ApiError> {
    Ok(Json(state.service().search(&query.q)?))
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/stores", get(list_stores).post(create_store))
        .route(
            "/api/stores/{id}",
            get(get_store).put(update_store).delete(delete_store),
        )
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/api/meal-suggestion", get(meal_suggestion))
        .route(
            "/api/shopping-list",
            get(get_shopping_list).post(add_to_shopping_list),
        )
        .route(
            "/api/shopping-list/{product_id}",
            delete(remove_from_shopping_list),
        )
        .route("/api/recent-items", get(recent_items))
        .route("/api/search", get(search))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        // Registered after the auth layer, so it stays open
        .route("/api/health", get(health))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    service: PlannerService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    match api_key {
        Some(ref key) if new_api_key => {
            eprintln!("Generated new API key: {key}");
            eprintln!("Include in requests: Authorization: Bearer {key}");
        }
        Some(ref key) => {
            let head = key.get(..4).unwrap_or_default();
            let tail = key.get(key.len().saturating_sub(4)..).unwrap_or_default();
            eprintln!("API key: {head}...{tail} (see api_key file in data directory)");
        }
        None => {
            tracing::warn!("authentication disabled (--no-auth), the API is open to anyone");
        }
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        tracing::warn!(
            "listening on {bind} with no authentication, any device on your network can access this API"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use chrono::{Local, TimeZone};
    use http_body_util::BodyExt;
    use larder_core::clock::FixedClock;
    use tower::ServiceExt;

    fn test_state(api_key: Option<String>) -> AppState {
        let noon = Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let service = PlannerService::new_in_memory()
            .unwrap()
            .with_clock(FixedClock(noon))
            .with_seed(1);
        AppState {
            service: Arc::new(Mutex::new(service)),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key))
    }

    fn seeded_app() -> Router {
        let state = test_state(None);
        state.service().seed().unwrap();
        build_router(state)
    }

    async fn send(
        app: &Router,
        request: axum::http::Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn get_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: &serde_json::Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::delete(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn add_to_list(app: &Router, product_id: i64) -> StatusCode {
        let body = serde_json::json!({ "product_id": product_id });
        let (status, _) = send(app, json_req("POST", "/api/shopping-list", &body)).await;
        status
    }

    fn product_id(products: &serde_json::Value, name: &str) -> i64 {
        products
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == name)
            .unwrap()["id"]
            .as_i64()
            .unwrap()
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let (status, json) = send(&app, get_req("/api/stores")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/stores")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/stores")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_open_with_auth_enabled() {
        let app = test_app(Some("secret".to_string()));

        let (status, json) = send(&app, get_req("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app.oneshot(get_req("/api/stores")).await.unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn security_headers_on_auth_failure() {
        let app = test_app(Some("secret".to_string()));

        let response = app.oneshot(get_req("/api/stores")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app(None);

        let big_body = vec![0u8; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post("/api/products")
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let error = ApiError::Internal(anyhow::anyhow!(
            "secret database path /home/user/.larder/db"
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert!(!json["error"].as_str().unwrap().contains("secret"));
    }

    #[test]
    fn core_errors_map_to_status() {
        let status = |e: CoreError| ApiError::from(e).into_response().status();
        assert_eq!(
            status(CoreError::NoRecipesForPeriod(MealPeriod::Lunch)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(CoreError::NotFound {
                kind: "Product",
                id: 1,
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(CoreError::Invalid("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn parse_store_ids_accepts_lists() {
        assert_eq!(parse_store_ids(None).unwrap(), Vec::<i64>::new());
        assert_eq!(parse_store_ids(Some("")).unwrap(), Vec::<i64>::new());
        assert_eq!(parse_store_ids(Some("1, 2,3")).unwrap(), vec![1, 2, 3]);
        assert!(parse_store_ids(Some("1,x")).is_err());
    }

    #[tokio::test]
    async fn store_crud() {
        let app = test_app(None);

        let body = serde_json::json!({
            "name": "Walmart",
            "maps_url": "https://maps.google.com/?q=Walmart"
        });
        let (status, store) = send(&app, json_req("POST", "/api/stores", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = store["id"].as_i64().unwrap();

        let uri = format!("/api/stores/{id}");
        let body = serde_json::json!({ "name": "Walmart Supercenter" });
        let (status, updated) = send(&app, json_req("PUT", &uri, &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Walmart Supercenter");

        let (status, _) = send(&app, delete_req(&format!("/api/stores/{id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, json) = send(&app, get_req(&format!("/api/stores/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], format!("Store {id} not found"));
    }

    #[tokio::test]
    async fn create_store_rejects_blank_name() {
        let app = test_app(None);
        let body = serde_json::json!({ "name": "  " });
        let (status, json) = send(&app, json_req("POST", "/api/stores", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Store name must not be empty");
    }

    #[tokio::test]
    async fn product_filters() {
        let app = seeded_app();

        let (_, stores) = send(&app, get_req("/api/stores")).await;
        let costco = stores
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["name"] == "Costco")
            .unwrap()["id"]
            .as_i64()
            .unwrap();

        let uri = format!("/api/products?store_id={costco}&in_stock=false");
        let (status, products) = send(&app, get_req(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = products
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Pasta", "Sugar"]);

        let (_, chicken) = send(&app, get_req("/api/products?search=CHICK")).await;
        assert_eq!(chicken.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, get_req("/api/products?store_id=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recipe_crud_and_meal_type_filter() {
        let app = seeded_app();
        let (_, products) = send(&app, get_req("/api/products")).await;
        let bread = product_id(&products, "Bread");

        let (status, recipe) = send(
            &app,
            json_req(
                "POST",
                "/api/recipes",
                &serde_json::json!({
                    "name": "Toast",
                    "prep_time": 2,
                    "cook_time": 3,
                    "meal_type": "breakfast",
                    "ingredients": [{ "product_id": bread, "quantity": 2, "unit": "slices" }]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recipe["ingredients"][0]["product_name"], "Bread");
        assert_eq!(recipe["ingredients"][0]["in_stock"], false);
        let id = recipe["id"].as_i64().unwrap();

        let (_, breakfast) = send(&app, get_req("/api/recipes?meal_type=breakfast")).await;
        assert_eq!(breakfast.as_array().unwrap().len(), 3);

        let (status, json) = send(&app, get_req("/api/recipes?meal_type=brunch")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("brunch"));

        let (status, _) = send(&app, delete_req(&format!("/api/recipes/{id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, delete_req(&format!("/api/recipes/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn recipe_with_unknown_product_is_404() {
        let app = test_app(None);
        let (status, json) = send(
            &app,
            json_req(
                "POST",
                "/api/recipes",
                &serde_json::json!({
                    "name": "Ghost Soup",
                    "meal_type": "dinner",
                    "ingredients": [{ "product_id": 404 }]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Product 404 not found");
    }

    #[tokio::test]
    async fn meal_suggestion_without_recipes_is_404() {
        let app = test_app(None);
        let (status, json) = send(&app, get_req("/api/meal-suggestion")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "No recipes found for lunch");
    }

    #[tokio::test]
    async fn meal_suggestion_rotates_then_repeats() {
        let app = seeded_app();

        let (status, first) = send(&app, get_req("/api/meal-suggestion")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["meal_period"], "lunch");
        assert_eq!(first["meal_type"], "lunch");
        assert_eq!(first["repeated"], false);
        assert!(first["ingredients"].as_array().unwrap().len() >= 3);

        let (_, second) = send(&app, get_req("/api/meal-suggestion")).await;
        assert_ne!(second["id"], first["id"]);
        assert_eq!(second["repeated"], false);

        let (_, third) = send(&app, get_req("/api/meal-suggestion")).await;
        assert_eq!(third["meal_type"], "lunch");
        assert_eq!(third["repeated"], true);
    }

    #[tokio::test]
    async fn shopping_list_add_is_idempotent() {
        let app = seeded_app();
        let (_, products) = send(&app, get_req("/api/products")).await;
        let sugar = product_id(&products, "Sugar");
        let body = serde_json::json!({ "product_id": sugar });

        let (status, first) = send(&app, json_req("POST", "/api/shopping-list", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["product"]["name"], "Sugar");

        let (status, second) = send(&app, json_req("POST", "/api/shopping-list", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["id"], first["id"]);

        let (_, list) = send(&app, get_req("/api/shopping-list")).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shopping_list_add_accepts_camel_case_product_id() {
        let app = seeded_app();
        let (_, products) = send(&app, get_req("/api/products")).await;
        let milk = product_id(&products, "Milk");

        let body = serde_json::json!({ "productId": milk });
        let (status, entry) = send(&app, json_req("POST", "/api/shopping-list", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["product_id"], milk);

        let body = serde_json::json!({ "product_id": milk });
        let (status, _) = send(&app, json_req("POST", "/api/shopping-list", &body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn shopping_list_remove_keeps_recent() {
        let app = seeded_app();
        let (_, products) = send(&app, get_req("/api/products")).await;
        let pasta = product_id(&products, "Pasta");

        assert_eq!(add_to_list(&app, pasta).await, StatusCode::CREATED);

        let (status, _) = send(&app, delete_req(&format!("/api/shopping-list/{pasta}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        // Removing again is still a success
        let (status, _) = send(&app, delete_req(&format!("/api/shopping-list/{pasta}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, list) = send(&app, get_req("/api/shopping-list")).await;
        assert!(list.as_array().unwrap().is_empty());
        let (_, recent) = send(&app, get_req("/api/recent-items")).await;
        let recent = recent.as_array().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0]["product"]["name"], "Pasta");
    }

    #[tokio::test]
    async fn shopping_list_unknown_product_is_404() {
        let app = test_app(None);
        assert_eq!(add_to_list(&app, 9).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn recent_items_capped_at_page_size() {
        let app = seeded_app();
        let (_, products) = send(&app, get_req("/api/products")).await;
        for p in products.as_array().unwrap() {
            let body = serde_json::json!({ "product_id": p["id"] });
            send(&app, json_req("POST", "/api/shopping-list", &body)).await;
        }
        let (_, recent) = send(&app, get_req("/api/recent-items")).await;
        assert_eq!(recent.as_array().unwrap().len(), RECENT_ITEMS_PAGE);
    }

    #[tokio::test]
    async fn search_buckets_are_exclusive() {
        let app = seeded_app();
        let (_, products) = send(&app, get_req("/api/products")).await;
        let cheese = product_id(&products, "Cheese");
        let chicken = product_id(&products, "Chicken Breast");

        add_to_list(&app, cheese).await;
        add_to_list(&app, chicken).await;
        send(&app, delete_req(&format!("/api/shopping-list/{chicken}"))).await;

        let (status, buckets) = send(&app, get_req("/api/search?q=ch")).await;
        assert_eq!(status, StatusCode::OK);
        let names = |key: &str| -> Vec<String> {
            buckets[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|p| p["name"].as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(names("in_list"), vec!["Cheese"]);
        assert_eq!(names("recent"), vec!["Chicken Breast"]);
        assert!(names("new").is_empty());
    }
}
