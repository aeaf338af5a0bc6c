use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoCarDocument, MongoCategoryDocument, doc_id},
};
use crate::dao::{
    car_store::CarStore,
    models::{
        CarCategoryEntity, CarEntity, CarPageEntity, NewCarEntity, lookup_key, new_record_id,
    },
    storage::{StorageResult, UniqueField},
};

const CAR_COLLECTION_NAME: &str = "cars";
const CATEGORY_COLLECTION_NAME: &str = "car_categories";
const VIN_INDEX_NAME: &str = "car_vin_key_idx";
const REGISTRATION_INDEX_NAME: &str = "car_registration_key_idx";
const CATEGORY_INDEX_NAME: &str = "category_name_key_idx";
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoCarStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoCarStore {
    /// Establish a connection to MongoDB and ensure the unique indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let cars = database.collection::<Document>(CAR_COLLECTION_NAME);
        for (key, index) in [
            ("vin_key", VIN_INDEX_NAME),
            ("registration_key", REGISTRATION_INDEX_NAME),
        ] {
            cars.create_index(unique_index(key, index))
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: CAR_COLLECTION_NAME,
                    index,
                    source,
                })?;
        }

        database
            .collection::<Document>(CATEGORY_COLLECTION_NAME)
            .create_index(unique_index("name_key", CATEGORY_INDEX_NAME))
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: CATEGORY_COLLECTION_NAME,
                index: CATEGORY_INDEX_NAME,
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn car_collection(&self) -> Collection<MongoCarDocument> {
        self.database()
            .await
            .collection::<MongoCarDocument>(CAR_COLLECTION_NAME)
    }

    async fn category_collection(&self) -> Collection<MongoCategoryDocument> {
        self.database()
            .await
            .collection::<MongoCategoryDocument>(CATEGORY_COLLECTION_NAME)
    }

    async fn find_car_matching(
        &self,
        filter: Document,
        by: &'static str,
    ) -> MongoResult<Option<CarEntity>> {
        let document = self
            .car_collection()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::LoadCar { by, source })?;

        document.map(CarEntity::try_from).transpose()
    }

    async fn save_car(&self, car: NewCarEntity) -> MongoResult<CarEntity> {
        let entity = car.into_entity(new_record_id());
        let document = MongoCarDocument::from(entity.clone());

        self.car_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| match duplicate_field(&source) {
                Some(field) => MongoDaoError::Duplicate { field, source },
                None => MongoDaoError::SaveCar {
                    id: entity.id,
                    source,
                },
            })?;

        Ok(entity)
    }

    async fn list_cars(&self, page_index: u64, page_size: u64) -> MongoResult<CarPageEntity> {
        let collection = self.car_collection().await;

        let total_elements = collection
            .count_documents(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListCars { source })?;

        // Identifiers are time-ordered, so sorting on `_id` keeps insertion order.
        let documents: Vec<MongoCarDocument> = collection
            .find(doc! {})
            .sort(doc! {"_id": 1})
            .skip(page_index.saturating_mul(page_size))
            .limit(i64::try_from(page_size).unwrap_or(i64::MAX))
            .await
            .map_err(|source| MongoDaoError::ListCars { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListCars { source })?;

        let items = documents
            .into_iter()
            .map(CarEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;

        Ok(CarPageEntity::new(items, total_elements, page_size))
    }

    async fn find_category_by_name(&self, name: &str) -> MongoResult<Option<CarCategoryEntity>> {
        let document = self
            .category_collection()
            .await
            .find_one(doc! {"name_key": lookup_key(name)})
            .await
            .map_err(|source| MongoDaoError::LoadCategory {
                name: name.to_owned(),
                source,
            })?;

        document.map(CarCategoryEntity::try_from).transpose()
    }

    async fn ensure_category(&self, name: String) -> MongoResult<CarCategoryEntity> {
        if let Some(existing) = self.find_category_by_name(&name).await? {
            return Ok(existing);
        }

        let category = CarCategoryEntity {
            id: new_record_id(),
            name,
        };
        let document = MongoCategoryDocument::from(category.clone());

        match self.category_collection().await.insert_one(&document).await {
            Ok(_) => Ok(category),
            // Another instance seeded the same name first.
            Err(err) if is_duplicate_key(&err) => self
                .find_category_by_name(&category.name)
                .await?
                .ok_or_else(|| MongoDaoError::SaveCategory {
                    name: category.name.clone(),
                    source: err,
                }),
            Err(source) => Err(MongoDaoError::SaveCategory {
                name: category.name,
                source,
            }),
        }
    }
}

fn unique_index(key: &str, name: &str) -> IndexModel {
    let mut keys = Document::new();
    keys.insert(key, 1);

    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(Some(name.to_owned()))
                .unique(Some(true))
                .build(),
        )
        .build()
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

/// Map a duplicate-key failure to the unique car attribute it violated.
fn duplicate_field(err: &MongoError) -> Option<UniqueField> {
    let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() else {
        return None;
    };
    if write_error.code != DUPLICATE_KEY_CODE {
        return None;
    }

    if write_error.message.contains(VIN_INDEX_NAME) {
        Some(UniqueField::Vin)
    } else if write_error.message.contains(REGISTRATION_INDEX_NAME) {
        Some(UniqueField::RegistrationNumber)
    } else {
        None
    }
}

impl CarStore for MongoCarStore {
    fn find_car(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_car_matching(doc_id(id), "id")
                .await
                .map_err(Into::into)
        })
    }

    fn find_car_by_registration_number(
        &self,
        registration_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {"registration_key": lookup_key(&registration_number)};
            store
                .find_car_matching(filter, "registration number")
                .await
                .map_err(Into::into)
        })
    }

    fn find_car_by_vin(&self, vin: String) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {"vin_key": lookup_key(&vin)};
            store
                .find_car_matching(filter, "vin")
                .await
                .map_err(Into::into)
        })
    }

    fn find_category_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<CarCategoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_category_by_name(&name).await.map_err(Into::into) })
    }

    fn save_car(&self, car: NewCarEntity) -> BoxFuture<'static, StorageResult<CarEntity>> {
        let store = self.clone();
        Box::pin(async move { store.save_car(car).await.map_err(Into::into) })
    }

    fn list_cars(
        &self,
        page_index: u64,
        page_size: u64,
    ) -> BoxFuture<'static, StorageResult<CarPageEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_cars(page_index, page_size)
                .await
                .map_err(Into::into)
        })
    }

    fn ensure_category(&self, name: String) -> BoxFuture<'static, StorageResult<CarCategoryEntity>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_category(name).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
