/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Car creation: field rules, duplicate checks and category resolution.
pub mod intake_service;
/// Car lookups and paged listing.
pub mod lookup_service;
/// Storage connection supervisor with backoff and category seeding.
pub mod storage_supervisor;
/// Structural VIN check run before lookups.
pub mod vin_checker;
