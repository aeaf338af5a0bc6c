use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::warn;
use uuid::Uuid;

use crate::dao::{
    car_store::CarStore,
    models::{CarCategoryEntity, CarEntity, CarPageEntity, NewCarEntity, new_record_id},
    storage::{StorageResult, UniqueField},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CAR_PREFIX, CouchCarDocument, CouchCategoryDocument, END_SUFFIX,
        UniqueMarker, WriteResponse, car_doc_id, category_doc_id, category_marker_id,
        registration_marker_id, vin_marker_id,
    },
};

const ALL_DOCS: &str = "_all_docs";

#[derive(Clone)]
pub struct CouchCarStore {
    client: Client,
    database_url: Arc<Url>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

/// Result of creating a document under a caller-chosen ID.
enum CreateOutcome {
    Created { rev: String },
    Conflict,
}

impl CouchCarStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let invalid_url = || CouchDaoError::InvalidBaseUrl {
            url: config.base_url.clone(),
        };
        let mut database_url = Url::parse(&config.base_url).map_err(|_| invalid_url())?;
        database_url
            .path_segments_mut()
            .map_err(|_| invalid_url())?
            .pop_if_empty()
            .push(&config.database);

        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            database_url: Arc::new(database_url),
            database: Arc::<str>::from(config.database),
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    /// URL of a document (or special endpoint) inside the database. The ID is
    /// percent-encoded as a single path segment.
    fn document_url(&self, doc_id: &str) -> Url {
        let mut url = Url::clone(&self.database_url);
        // `connect` already proved the base URL accepts path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(doc_id);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = Url::clone(&self.database_url);

        let response = self
            .request(Method::GET, url.clone())
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self.request(Method::PUT, url).send().await.map_err(|source| {
                    CouchDaoError::Transport {
                        target: database.clone(),
                        source,
                    }
                })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::UnexpectedStatus {
                        target: database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::UnexpectedStatus {
                target: database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, self.document_url(doc_id))
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::Decode {
                        target: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::UnexpectedStatus {
                target: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Create a document; CouchDB answers 409 when the ID is already taken.
    async fn create_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<CreateOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, self.document_url(doc_id))
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(CreateOutcome::Conflict),
            status if status.is_success() => {
                let written = response.json::<WriteResponse>().await.map_err(|source| {
                    CouchDaoError::Decode {
                        target: doc_id.to_string(),
                        source,
                    }
                })?;
                Ok(CreateOutcome::Created { rev: written.rev })
            }
            other => Err(CouchDaoError::UnexpectedStatus {
                target: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .request(Method::DELETE, self.document_url(doc_id))
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::UnexpectedStatus {
                target: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    /// Best-effort rollback of a document written earlier in a failed save.
    async fn discard(&self, doc_id: &str, rev: &str) {
        if let Err(err) = self.delete_document(doc_id, rev).await {
            warn!(doc_id, error = %err, "failed to roll back CouchDB document");
        }
    }

    async fn all_docs(&self, prefix: &str, query: &[(&str, String)]) -> CouchResult<AllDocsResponse> {
        let mut params = vec![
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];
        params.extend(query.iter().map(|(key, value)| (*key, value.clone())));

        let response = self
            .request(Method::GET, self.document_url(ALL_DOCS))
            .query(&params)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::UnexpectedStatus {
                target: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        response
            .json::<AllDocsResponse>()
            .await
            .map_err(|source| CouchDaoError::Decode {
                target: ALL_DOCS.to_string(),
                source,
            })
    }

    async fn find_car(&self, id: Uuid) -> CouchResult<Option<CarEntity>> {
        self.get_document::<CouchCarDocument>(&car_doc_id(id))
            .await?
            .map(CouchCarDocument::into_entity)
            .transpose()
    }

    /// Follow a uniqueness marker to the car that owns it.
    async fn find_car_by_marker(&self, marker_id: &str) -> CouchResult<Option<CarEntity>> {
        match self.get_document::<UniqueMarker>(marker_id).await? {
            Some(marker) => self.find_car(marker.target).await,
            None => Ok(None),
        }
    }

    async fn find_category_by_name(&self, name: &str) -> CouchResult<Option<CarCategoryEntity>> {
        let Some(marker) = self
            .get_document::<UniqueMarker>(&category_marker_id(name))
            .await?
        else {
            return Ok(None);
        };

        self.get_document::<CouchCategoryDocument>(&category_doc_id(marker.target))
            .await?
            .map(CouchCategoryDocument::into_entity)
            .transpose()
    }

    /// Claim the VIN and registration markers, then write the car document.
    /// Markers claimed before a failure are released again.
    async fn save_car(&self, car: NewCarEntity) -> CouchResult<CarEntity> {
        let entity = car.into_entity(new_record_id());

        let vin_marker = vin_marker_id(&entity.vin);
        let vin_rev = match self
            .create_document(&vin_marker, &UniqueMarker::new(vin_marker.clone(), entity.id))
            .await?
        {
            CreateOutcome::Created { rev } => rev,
            CreateOutcome::Conflict => {
                return Err(CouchDaoError::Duplicate {
                    field: UniqueField::Vin,
                });
            }
        };

        let registration_marker = registration_marker_id(&entity.registration_number);
        let registration_rev = match self
            .create_document(
                &registration_marker,
                &UniqueMarker::new(registration_marker.clone(), entity.id),
            )
            .await
        {
            Ok(CreateOutcome::Created { rev }) => rev,
            Ok(CreateOutcome::Conflict) => {
                self.discard(&vin_marker, &vin_rev).await;
                return Err(CouchDaoError::Duplicate {
                    field: UniqueField::RegistrationNumber,
                });
            }
            Err(err) => {
                self.discard(&vin_marker, &vin_rev).await;
                return Err(err);
            }
        };

        let doc_id = car_doc_id(entity.id);
        let outcome = self
            .create_document(&doc_id, &CouchCarDocument::from_entity(entity.clone()))
            .await;

        match outcome {
            Ok(CreateOutcome::Created { .. }) => Ok(entity),
            failed => {
                self.discard(&registration_marker, &registration_rev).await;
                self.discard(&vin_marker, &vin_rev).await;
                Err(match failed {
                    Err(err) => err,
                    _ => CouchDaoError::UnexpectedStatus {
                        target: doc_id,
                        status: StatusCode::CONFLICT,
                    },
                })
            }
        }
    }

    async fn list_cars(&self, page_index: u64, page_size: u64) -> CouchResult<CarPageEntity> {
        let total_elements = self.all_docs(CAR_PREFIX, &[]).await?.rows.len() as u64;

        let page = self
            .all_docs(
                CAR_PREFIX,
                &[
                    ("include_docs", "true".to_string()),
                    ("skip", page_index.saturating_mul(page_size).to_string()),
                    ("limit", page_size.to_string()),
                ],
            )
            .await?;

        let mut items = Vec::with_capacity(page.rows.len());
        for row in page.rows {
            if let Some(doc) = row.doc {
                let document: CouchCarDocument =
                    from_value(doc).map_err(|source| CouchDaoError::MalformedDocument {
                        target: ALL_DOCS.to_string(),
                        source,
                    })?;
                items.push(document.into_entity()?);
            }
        }

        Ok(CarPageEntity::new(items, total_elements, page_size))
    }

    async fn ensure_category(&self, name: String) -> CouchResult<CarCategoryEntity> {
        if let Some(existing) = self.find_category_by_name(&name).await? {
            return Ok(existing);
        }

        let category = CarCategoryEntity {
            id: new_record_id(),
            name,
        };
        let doc_id = category_doc_id(category.id);
        let CreateOutcome::Created { rev } = self
            .create_document(&doc_id, &CouchCategoryDocument::from_entity(category.clone()))
            .await?
        else {
            return Err(CouchDaoError::CategoryClaim {
                name: category.name,
            });
        };

        let marker = category_marker_id(&category.name);
        match self
            .create_document(&marker, &UniqueMarker::new(marker.clone(), category.id))
            .await?
        {
            CreateOutcome::Created { .. } => Ok(category),
            CreateOutcome::Conflict => {
                // Another instance seeded the same name first.
                self.discard(&doc_id, &rev).await;
                self.find_category_by_name(&category.name)
                    .await?
                    .ok_or(CouchDaoError::CategoryClaim {
                        name: category.name,
                    })
            }
        }
    }

    async fn health_check(&self) -> CouchResult<()> {
        let url = Url::clone(&self.database_url);
        let response = self
            .request(Method::GET, url.clone())
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: url.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::UnexpectedStatus {
                target: url.to_string(),
                status: response.status(),
            })
        }
    }
}

impl CarStore for CouchCarStore {
    fn find_car(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_car(id).await.map_err(Into::into) })
    }

    fn find_car_by_registration_number(
        &self,
        registration_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let marker = registration_marker_id(&registration_number);
            store.find_car_by_marker(&marker).await.map_err(Into::into)
        })
    }

    fn find_car_by_vin(&self, vin: String) -> BoxFuture<'static, StorageResult<Option<CarEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let marker = vin_marker_id(&vin);
            store.find_car_by_marker(&marker).await.map_err(Into::into)
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
        Box::pin(async move { store.health_check().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
