/// Car persistence backends behind a common trait.
pub mod car_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
