//! Read side of the car registry: single-car lookups and paged listing.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        car_store::CarStore,
        models::{CarEntity, CarPageEntity},
    },
    dto::{
        car::{CarResponse, CarSearch},
        page::CarPageResponse,
    },
    error::{ServiceError, messages},
    services::vin_checker::VinChecker,
    state::SharedState,
};

/// Lookups over a car store.
pub struct CarLookup {
    store: Arc<dyn CarStore>,
    vin_checker: VinChecker,
}

impl CarLookup {
    pub fn new(store: Arc<dyn CarStore>, vin_checker: VinChecker) -> Self {
        Self { store, vin_checker }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<CarEntity, ServiceError> {
        self.store
            .find_car(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::CAR_NOT_FOUND))
    }

    /// Exact match ignoring case. An empty value never reaches storage.
    pub async fn get_by_registration_number(
        &self,
        registration_number: &str,
    ) -> Result<CarEntity, ServiceError> {
        if registration_number.is_empty() {
            return Err(ServiceError::not_found(
                messages::REGISTRATION_NUMBER_NOT_FOUND,
            ));
        }

        self.store
            .find_car_by_registration_number(registration_number.to_owned())
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::REGISTRATION_NUMBER_NOT_FOUND))
    }

    /// Runs the VIN checker first; its rejections are reported as not found.
    pub async fn get_by_vin(&self, vin: &str) -> Result<CarEntity, ServiceError> {
        if let Err(violation) = self.vin_checker.check(vin) {
            debug!(code = violation.code(), "vin rejected before lookup");
            return Err(ServiceError::NotFound(violation.to_string()));
        }

        self.store
            .find_car_by_vin(vin.to_owned())
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::VIN_NOT_FOUND))
    }

    pub async fn list_paged(
        &self,
        page_index: u64,
        page_size: u64,
    ) -> Result<CarPageEntity, ServiceError> {
        Ok(self.store.list_cars(page_index, page_size).await?)
    }
}

async fn lookup(state: &SharedState) -> Result<CarLookup, ServiceError> {
    let store = state.require_car_store().await?;
    Ok(CarLookup::new(
        store,
        VinChecker::new(state.config().vin_length()),
    ))
}

pub async fn get_car(state: &SharedState, id: Uuid) -> Result<CarResponse, ServiceError> {
    debug!(%id, "looking up car by id");
    let car = lookup(state).await?.get_by_id(id).await?;
    Ok(car.into())
}

/// Resolve a `/cars/search` request.
pub async fn search_car(
    state: &SharedState,
    search: CarSearch,
) -> Result<CarResponse, ServiceError> {
    let lookup = lookup(state).await?;
    let car = match search {
        CarSearch::RegistrationNumber(registration_number) => {
            debug!(%registration_number, "looking up car by registration number");
            lookup
                .get_by_registration_number(&registration_number)
                .await?
        }
        CarSearch::Vin(vin) => {
            debug!(%vin, "looking up car by vin");
            lookup.get_by_vin(&vin).await?
        }
    };
    Ok(car.into())
}

pub async fn list_cars(
    state: &SharedState,
    page_index: u64,
    page_size: u64,
) -> Result<CarPageResponse, ServiceError> {
    debug!(page_index, page_size, "listing cars");
    let page = lookup(state)
        .await?
        .list_paged(page_index, page_size)
        .await?;
    Ok(CarPageResponse::from_page(page, page_index, page_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        car_store::memory::MemoryCarStore,
        models::{CarCategoryEntity, NewCarEntity},
    };

    async fn seeded_lookup() -> (CarLookup, CarEntity) {
        let store = MemoryCarStore::new();
        let category = CarStore::ensure_category(&store, "Combi".into())
            .await
            .unwrap();
        let car = CarStore::save_car(&store, new_car("JT3Z123KBW1589043", "KR12PR", category))
            .await
            .unwrap();
        (CarLookup::new(Arc::new(store), VinChecker::new(17)), car)
    }

    fn new_car(vin: &str, registration_number: &str, category: CarCategoryEntity) -> NewCarEntity {
        NewCarEntity {
            vin: vin.into(),
            registration_number: registration_number.into(),
            brand: "Toyota".into(),
            model: "Avensis".into(),
            production_year: 2014,
            mileage: 123456,
            description: None,
            category,
        }
    }

    fn not_found_message(err: ServiceError) -> String {
        match err {
            ServiceError::NotFound(message) => message,
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn finds_by_id() {
        let (lookup, car) = seeded_lookup().await;
        assert_eq!(lookup.get_by_id(car.id).await.unwrap(), car);

        let missing = lookup.get_by_id(Uuid::nil()).await.unwrap_err();
        assert_eq!(not_found_message(missing), messages::CAR_NOT_FOUND);
    }

    #[tokio::test]
    async fn registration_number_matches_ignoring_case() {
        let (lookup, car) = seeded_lookup().await;
        assert_eq!(lookup.get_by_registration_number("kr12pr").await.unwrap(), car);

        for unknown in ["", "KR"] {
            let err = lookup.get_by_registration_number(unknown).await.unwrap_err();
            assert_eq!(
                not_found_message(err),
                messages::REGISTRATION_NUMBER_NOT_FOUND
            );
        }
    }

    #[tokio::test]
    async fn vin_is_checked_before_lookup() {
        let (lookup, car) = seeded_lookup().await;
        assert_eq!(lookup.get_by_vin("jt3z123kbw1589043").await.unwrap(), car);

        let too_short = lookup.get_by_vin("JT3Z123").await.unwrap_err();
        assert_eq!(
            not_found_message(too_short),
            "Vin must be exactly 17 characters long"
        );

        let illegal = lookup.get_by_vin("JT3Z123KBW158904O").await.unwrap_err();
        assert_eq!(
            not_found_message(illegal),
            "Vin cannot contain letters O, I or Q"
        );

        let unknown = lookup.get_by_vin("WBA86H90021859321").await.unwrap_err();
        assert_eq!(not_found_message(unknown), messages::VIN_NOT_FOUND);
    }

    #[tokio::test]
    async fn lists_requested_page() {
        let (lookup, _) = seeded_lookup().await;
        let page = lookup.list_paged(0, 20).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.total_pages, 1);

        let empty = lookup.list_paged(1, 20).await.unwrap();
        assert!(empty.items.is_empty());
    }
}
