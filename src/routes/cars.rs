use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        car::{CarRequest, CarResponse, CarSearchQuery},
        page::{CarPageResponse, PageRequest},
    },
    error::{AppError, messages},
    routes::extract::{ApiJson, ApiQuery},
    services::{intake_service, lookup_service},
    state::SharedState,
};

/// Car registry endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route("/cars/search", get(search_car))
        .route("/cars/{id}", get(get_car))
}

/// List cars page by page, in registration order.
#[utoipa::path(
    get,
    path = "/cars",
    tag = "cars",
    params(PageRequest),
    responses(
        (status = 200, description = "Requested page of cars", body = CarPageResponse),
        (status = 400, description = "Invalid or undecodable page or size")
    )
)]
pub async fn list_cars(
    State(state): State<SharedState>,
    ApiQuery(paging): ApiQuery<PageRequest>,
) -> Result<Json<CarPageResponse>, AppError> {
    let (page, size) = paging.bounds()?;
    Ok(Json(lookup_service::list_cars(&state, page, size).await?))
}

/// Retrieve a car by its identifier.
#[utoipa::path(
    get,
    path = "/cars/{id}",
    tag = "cars",
    params(("id" = String, Path, description = "Identifier of the car")),
    responses(
        (status = 200, description = "Car", body = CarResponse),
        (status = 404, description = "No car with this identifier")
    )
)]
pub async fn get_car(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<CarResponse>, AppError> {
    // Identifiers that cannot exist are reported like unknown ones.
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::NotFound(messages::CAR_NOT_FOUND.into()))?;
    Ok(Json(lookup_service::get_car(&state, id).await?))
}

/// Find a car by registration number or VIN, both matched ignoring case.
#[utoipa::path(
    get,
    path = "/cars/search",
    tag = "cars",
    params(CarSearchQuery),
    responses(
        (status = 200, description = "Matching car", body = CarResponse),
        (status = 400, description = "Neither license-plate nor vin given"),
        (status = 404, description = "No matching car, or the VIN is malformed")
    )
)]
pub async fn search_car(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<CarSearchQuery>,
) -> Result<Json<CarResponse>, AppError> {
    let search = query
        .into_search()
        .ok_or_else(|| AppError::BadRequest(vec![messages::SEARCH_CRITERIA_MISSING.into()]))?;
    Ok(Json(lookup_service::search_car(&state, search).await?))
}

/// Register a new car. The created resource is referenced by the `Location` header.
#[utoipa::path(
    post,
    path = "/cars",
    tag = "cars",
    request_body = CarRequest,
    responses(
        (
            status = 201,
            description = "Car registered",
            headers(("Location" = String, description = "Path of the new car"))
        ),
        (status = 400, description = "Missing or malformed body, or broken field rules"),
        (status = 409, description = "VIN or registration number already registered")
    )
)]
pub async fn create_car(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<CarRequest>,
) -> Result<impl IntoResponse, AppError> {
    let car = intake_service::create_car(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/cars/{}", car.id))],
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, Response, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{
        config::AppConfig,
        dao::car_store::{CarStore, memory::MemoryCarStore},
        routes,
        services::storage_supervisor::seed_categories,
        state::{AppState, SharedState},
    };

    async fn ready_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        let store: Arc<dyn CarStore> = Arc::new(MemoryCarStore::new());
        seed_categories(store.as_ref(), state.config().categories())
            .await
            .unwrap();
        state.install_car_store(store).await;
        state
    }

    async fn send(state: &SharedState, request: Request<Body>) -> Response<Body> {
        routes::router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn get(state: &SharedState, uri: &str) -> Response<Body> {
        send(state, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_car(state: &SharedState, payload: Value) -> Response<Body> {
        let request = Request::post("/cars")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        send(state, request).await
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn car_payload(vin: &str, registration_number: &str) -> Value {
        json!({
            "vin": vin,
            "registrationNumber": registration_number,
            "brand": "Opel",
            "model": "Astra",
            "productionYear": 1951,
            "mileage": 1,
            "description": "",
            "category": { "name": "" }
        })
    }

    #[tokio::test]
    async fn created_car_can_be_found_by_vin() {
        let state = ready_state().await;

        let created = post_car(&state, car_payload("azwsxedc123456789", "KR12345")).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let location = created.headers()["location"].to_str().unwrap().to_owned();
        assert!(location.starts_with("/cars/"));
        let body = to_bytes(created.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        let found = get(&state, "/cars/search?vin=AZWSXEDC123456789").await;
        assert_eq!(found.status(), StatusCode::OK);
        let car = json_body(found).await;
        assert_eq!(car["vin"], "azwsxedc123456789");
        assert_eq!(car["registrationNumber"], "KR12345");
        assert_eq!(car["productionYear"], 1951);
        assert_eq!(car["category"]["name"], "Other");
        assert_eq!(format!("/cars/{}", car["id"].as_str().unwrap()), location);

        let by_id = get(&state, &location).await;
        assert_eq!(by_id.status(), StatusCode::OK);
        assert_eq!(json_body(by_id).await, car);

        let by_plate = get(&state, "/cars/search?license-plate=kr12345").await;
        assert_eq!(json_body(by_plate).await, car);
    }

    #[tokio::test]
    async fn empty_payload_lists_every_violation() {
        let state = ready_state().await;
        let response = post_car(&state, json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        let found: Vec<&str> = body["message"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for expected in [
            "Car vin cannot be null or blank",
            "Car brand cannot be null or blank",
            "Car model cannot be null or blank",
            "Car production year cannot be null or blank",
            "Car mileage cannot be null or blank",
            "Car type cannot be null",
        ] {
            assert!(found.contains(&expected), "missing `{expected}`");
        }
    }

    #[tokio::test]
    async fn malformed_vins_are_rejected_on_creation() {
        let state = ready_state().await;

        let short = json_body(post_car(&state, car_payload("V6789654", "KR12345")).await).await;
        assert_eq!(short["message"], json!(["Car vin cannot be null or blank"]));

        let illegal =
            json_body(post_car(&state, car_payload("VFTOQ123456789654", "KR12345")).await).await;
        assert_eq!(
            illegal["message"],
            json!(["Car vin must consist of letters and digits only, excluding I, O and Q"])
        );
    }

    #[tokio::test]
    async fn duplicates_are_conflicts() {
        let state = ready_state().await;
        let first = post_car(&state, car_payload("JT3Z123KBW1589043", "KR12345")).await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let again = post_car(&state, car_payload("JT3Z123KBW1589043", "WE12345")).await;
        assert_eq!(again.status(), StatusCode::CONFLICT);
        assert_eq!(
            json_body(again).await["message"],
            json!(["Car with given vin already exists"])
        );
    }

    #[tokio::test]
    async fn listing_pages_through_cars() {
        let state = ready_state().await;
        for (vin, plate) in [
            ("JT3Z123KBW1589041", "KR00001"),
            ("JT3Z123KBW1589042", "KR00002"),
            ("JT3Z123KBW1589043", "KR00003"),
        ] {
            let created = post_car(&state, car_payload(vin, plate)).await;
            assert_eq!(created.status(), StatusCode::CREATED);
        }

        let first = json_body(get(&state, "/cars").await).await;
        assert_eq!(first["content"].as_array().unwrap().len(), 3);
        assert_eq!(first["pageable"], json!({ "pageNumber": 0, "pageSize": 20 }));
        assert_eq!(first["totalElements"], 3);
        assert_eq!(first["totalPages"], 1);

        let second = json_body(get(&state, "/cars?page=1&size=1").await).await;
        let content = second["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["registrationNumber"], "KR00002");
        assert_eq!(second["totalPages"], 3);
    }

    #[tokio::test]
    async fn invalid_paging_is_a_bad_request() {
        let state = ready_state().await;
        let response = get(&state, "/cars?page=-1&size=0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            json!([
                "Page has to be greater or equal to 0",
                "Size has to be greater or equal to 1"
            ])
        );
    }

    #[tokio::test]
    async fn lookups_report_not_found() {
        let state = ready_state().await;
        for uri in [
            "/cars/search?license-plate=KR",
            "/cars/search?license-plate=",
            "/cars/search?vin=JT3Z123",
            "/cars/search?vin=OT3Z123KBW1589043",
            "/cars/search?vin=JT3Z123KBW1589043",
            "/cars/0192b1c0-7c1e-7000-8000-000000000000",
            "/cars/not-a-car",
        ] {
            let status = get(&state, uri).await.status();
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }

        let status = get(&state, "/cars/search").await.status();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn degraded_mode_is_service_unavailable() {
        let state = AppState::new(AppConfig::default());
        let response = get(&state, "/cars").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await["message"],
            json!(["Car storage is currently unavailable"])
        );
    }

    fn single_message(body: &Value) -> &str {
        let messages = body["message"].as_array().unwrap();
        assert_eq!(messages.len(), 1, "{body}");
        messages[0].as_str().unwrap()
    }

    #[tokio::test]
    async fn missing_body_is_a_bad_request() {
        let state = ready_state().await;
        let bare = Request::post("/cars").body(Body::empty()).unwrap();
        let response = send(&state, bare).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!single_message(&json_body(response).await).is_empty());

        let empty_json = Request::post("/cars")
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap();
        let response = send(&state, empty_json).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!single_message(&json_body(response).await).is_empty());
    }

    #[tokio::test]
    async fn wrongly_typed_field_is_a_bad_request() {
        let state = ready_state().await;
        let mut payload = car_payload("JT3Z123KBW1589043", "KR12345");
        payload["productionYear"] = json!("abc");

        let response = post_car(&state, payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(single_message(&body).contains("productionYear"), "{body}");

        let listing = json_body(get(&state, "/cars").await).await;
        assert_eq!(listing["totalElements"], 0);
    }

    #[tokio::test]
    async fn undecodable_paging_is_a_bad_request() {
        let state = ready_state().await;
        let response = get(&state, "/cars?page=abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(single_message(&body).contains("page"), "{body}");
    }
}
