use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the car registry.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::cars::list_cars,
        crate::routes::cars::get_car,
        crate::routes::cars::search_car,
        crate::routes::cars::create_car,
    ),
    components(
        schemas(
            crate::dto::health::HealthStatus,
            crate::dto::health::HealthResponse,
            crate::dto::car::CarRequest,
            crate::dto::car::CategoryInput,
            crate::dto::car::CarResponse,
            crate::dto::car::CategoryResponse,
            crate::dto::page::Pageable,
            crate::dto::page::CarPageResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "cars", description = "Car registration and lookup"),
    )
)]
pub struct ApiDoc;
