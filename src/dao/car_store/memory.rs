//! Process-local car store, used when no database is configured and by tests.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    car_store::CarStore,
    models::{
        CarCategoryEntity, CarEntity, CarPageEntity, NewCarEntity, lookup_key, new_record_id,
    },
    storage::{StorageError, StorageResult, UniqueField},
};

#[derive(Clone, Default)]
pub struct MemoryCarStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    cars: IndexMap<Uuid, CarEntity>,
    categories: IndexMap<Uuid, CarCategoryEntity>,
}

impl Tables {
    fn car_by_vin(&self, key: &str) -> Option<&CarEntity> {
        self.cars.values().find(|car| lookup_key(&car.vin) == key)
    }

    fn car_by_registration(&self, key: &str) -> Option<&CarEntity> {
        self.cars
            .values()
            .find(|car| lookup_key(&car.registration_number) == key)
    }

    fn category_by_name(&self, key: &str) -> Option<&CarCategoryEntity> {
        self.categories
            .values()
            .find(|category| lookup_key(&category.name) == key)
    }
}

impl MemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn save_car(&self, car: NewCarEntity) -> StorageResult<CarEntity> {
        let mut tables = self.tables.write().await;

        if tables.car_by_vin(&lookup_key(&car.vin)).is_some() {
            return Err(StorageError::conflict(UniqueField::Vin));
        }
        if tables
            .car_by_registration(&lookup_key(&car.registration_number))
            .is_some()
        {
            return Err(StorageError::conflict(UniqueField::RegistrationNumber));
        }

        let entity = car.into_entity(new_record_id());
        tables.cars.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn list_cars(&self, page_index: u64, page_size: u64) -> CarPageEntity {
        let tables = self.tables.read().await;
        let offset = page_index.saturating_mul(page_size);
        let items = tables
            .cars
            .values()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page_size).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        CarPageEntity::new(items, tables.cars.len() as u64, page_size)
    }

    async fn ensure_category(&self, name: String) -> CarCategoryEntity {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.category_by_name(&lookup_key(&name)) {
            return existing.clone();
        }

        let category = CarCategoryEntity {
            id: new_record_id(),
            name,
        };
        tables.categories.insert(category.id, category.clone());
        category
    }
}

impl CarStore for MemoryCarStore {
    fn find_car(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.tables.read().await.cars.get(&id).cloned()) })
    }

    fn find_car_by_registration_number(
        &self,
        registration_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let key = lookup_key(&registration_number);
            Ok(store.tables.read().await.car_by_registration(&key).cloned())
        })
    }

    fn find_car_by_vin(&self, vin: String) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let key = lookup_key(&vin);
            Ok(store.tables.read().await.car_by_vin(&key).cloned())
        })
    }

    fn find_category_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<CarCategoryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let key = lookup_key(&name);
            Ok(store.tables.read().await.category_by_name(&key).cloned())
        })
    }

    fn save_car(&self, car: NewCarEntity) -> BoxFuture<'static, StorageResult<CarEntity>> {
        let store = self.clone();
        Box::pin(async move { store.save_car(car).await })
    }

    fn list_cars(
        &self,
        page_index: u64,
        page_size: u64,
    ) -> BoxFuture<'static, StorageResult<CarPageEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_cars(page_index, page_size).await) })
    }

    fn ensure_category(&self, name: String) -> BoxFuture<'static, StorageResult<CarCategoryEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ensure_category(name).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
