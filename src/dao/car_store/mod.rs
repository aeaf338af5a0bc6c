#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{CarCategoryEntity, CarEntity, CarPageEntity, NewCarEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for cars and their categories.
///
/// Lookups by VIN, registration number and category name match ignoring case.
/// `save_car` assigns the identifier and rejects duplicates with
/// [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict).
pub trait CarStore: Send + Sync {
    fn find_car(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CarEntity>>>;
    fn find_car_by_registration_number(
        &self,
        registration_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<CarEntity>>>;
    fn find_car_by_vin(&self, vin: String) -> BoxFuture<'static, StorageResult<Option<CarEntity>>>;
    fn find_category_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<CarCategoryEntity>>>;
    fn save_car(&self, car: NewCarEntity) -> BoxFuture<'static, StorageResult<CarEntity>>;
    fn list_cars(
        &self,
        page_index: u64,
        page_size: u64,
    ) -> BoxFuture<'static, StorageResult<CarPageEntity>>;
    fn ensure_category(&self, name: String) -> BoxFuture<'static, StorageResult<CarCategoryEntity>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
