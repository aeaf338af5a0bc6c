//! Creation of new cars: field rules, duplicate checks and category resolution.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    dao::{
        car_store::CarStore,
        models::{CarCategoryEntity, CarEntity, NewCarEntity},
        storage::UniqueField,
    },
    dto::{
        car::{CarRequest, CategoryInput},
        validation::{CarRules, car_request_violations},
    },
    error::{ServiceError, messages},
    state::SharedState,
};

/// Registers new cars in a car store.
pub struct CarIntake {
    store: Arc<dyn CarStore>,
    rules: CarRules,
    default_category: String,
}

impl CarIntake {
    pub fn new(
        store: Arc<dyn CarStore>,
        rules: CarRules,
        default_category: impl Into<String>,
    ) -> Self {
        Self {
            store,
            rules,
            default_category: default_category.into(),
        }
    }

    /// Validate `request`, reject duplicates, resolve the category and persist the car.
    ///
    /// VIN and registration number are stored as submitted; uniqueness ignores case.
    pub async fn create(&self, request: CarRequest) -> Result<CarEntity, ServiceError> {
        let violations = car_request_violations(&request, &self.rules);
        if !violations.is_empty() {
            let codes: Vec<_> = violations.iter().map(|violation| violation.code()).collect();
            debug!(?codes, "car request rejected");
            return Err(ServiceError::RequestInvalid(
                violations.iter().map(ToString::to_string).collect(),
            ));
        }

        let CarRequest {
            vin: Some(vin),
            registration_number: Some(registration_number),
            brand: Some(brand),
            model: Some(model),
            production_year: Some(production_year),
            mileage: Some(mileage),
            description,
            category: Some(category),
        } = request
        else {
            return Err(ServiceError::Internal(
                "validated car request is missing fields".into(),
            ));
        };

        if self.store.find_car_by_vin(vin.clone()).await?.is_some() {
            return Err(ServiceError::duplicate(UniqueField::Vin));
        }
        if self
            .store
            .find_car_by_registration_number(registration_number.clone())
            .await?
            .is_some()
        {
            return Err(ServiceError::duplicate(UniqueField::RegistrationNumber));
        }

        let category = self.resolve_category(&category).await?;

        let car = self
            .store
            .save_car(NewCarEntity {
                vin,
                registration_number,
                brand,
                model,
                production_year,
                mileage,
                description,
                category,
            })
            .await?;
        Ok(car)
    }

    async fn resolve_category(
        &self,
        input: &CategoryInput,
    ) -> Result<CarCategoryEntity, ServiceError> {
        match input.requested_name() {
            Some(name) => self
                .store
                .find_category_by_name(name.to_owned())
                .await?
                .ok_or_else(|| {
                    ServiceError::RequestInvalid(vec![messages::CAR_TYPE_NOT_FOUND.to_owned()])
                }),
            None => {
                debug!(category = %self.default_category, "no category requested; using default");
                self.store
                    .find_category_by_name(self.default_category.clone())
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Internal(format!(
                            "default category `{}` is missing from storage",
                            self.default_category
                        ))
                    })
            }
        }
    }
}

/// Register a car on behalf of the HTTP layer.
pub async fn create_car(
    state: &SharedState,
    request: CarRequest,
) -> Result<CarEntity, ServiceError> {
    let store = state.require_car_store().await?;
    let config = state.config();
    let intake = CarIntake::new(store, config.car_rules(), config.default_category());

    let car = intake.create(request).await?;
    info!(
        id = %car.id,
        vin = %car.vin,
        category = %car.category.name,
        "car registered"
    );
    Ok(car)
}
