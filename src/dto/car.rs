//! DTO definitions for the car REST API.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dao::models::{CarCategoryEntity, CarEntity};

/// Payload used to register a new car.
///
/// Every field is optional on the wire so that missing values surface as
/// validation messages instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarRequest {
    #[schema(example = "JT3Z123KBW1589043")]
    pub vin: Option<String>,
    #[schema(example = "KR12PR")]
    pub registration_number: Option<String>,
    #[schema(example = "Toyota")]
    pub brand: Option<String>,
    #[schema(example = "Avensis")]
    pub model: Option<String>,
    #[schema(example = 2016)]
    pub production_year: Option<i32>,
    #[schema(example = 50000)]
    pub mileage: Option<i32>,
    pub description: Option<String>,
    /// Category to attach. A blank name selects the default category.
    pub category: Option<CategoryInput>,
}

/// Category reference supplied on creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CategoryInput {
    #[schema(example = "Sedan")]
    pub name: Option<String>,
}

impl CategoryInput {
    /// Requested category name, or `None` when it is missing or blank.
    pub fn requested_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Car representation returned by every read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    pub id: Uuid,
    pub vin: String,
    pub registration_number: String,
    pub brand: String,
    pub model: String,
    pub production_year: i32,
    pub mileage: i32,
    pub description: Option<String>,
    pub category: CategoryResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<CarCategoryEntity> for CategoryResponse {
    fn from(category: CarCategoryEntity) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

impl From<CarEntity> for CarResponse {
    fn from(car: CarEntity) -> Self {
        Self {
            id: car.id,
            vin: car.vin,
            registration_number: car.registration_number,
            brand: car.brand,
            model: car.model,
            production_year: car.production_year,
            mileage: car.mileage,
            description: car.description,
            category: car.category.into(),
        }
    }
}

/// Query string of `GET /cars/search`: exactly one selector is expected.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CarSearchQuery {
    /// Registration number, matched ignoring case.
    #[serde(rename = "license-plate")]
    pub license_plate: Option<String>,
    /// Vehicle identification number, matched ignoring case.
    pub vin: Option<String>,
}

/// Lookup selected by [`CarSearchQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarSearch {
    RegistrationNumber(String),
    Vin(String),
}

impl CarSearchQuery {
    /// Pick the lookup to run, preferring the registration number when both are given.
    pub fn into_search(self) -> Option<CarSearch> {
        match (self.license_plate, self.vin) {
            (Some(plate), _) => Some(CarSearch::RegistrationNumber(plate)),
            (None, Some(vin)) => Some(CarSearch::Vin(vin)),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_category_name_is_not_a_request() {
        let blank = CategoryInput {
            name: Some("   ".into()),
        };
        assert_eq!(blank.requested_name(), None);
        assert_eq!(CategoryInput::default().requested_name(), None);

        let sedan = CategoryInput {
            name: Some(" Sedan ".into()),
        };
        assert_eq!(sedan.requested_name(), Some("Sedan"));
    }

    #[test]
    fn request_uses_camel_case_fields() {
        let request: CarRequest = serde_json::from_str(
            r#"{"vin":"JT3Z123KBW1589043","registrationNumber":"KR12PR","productionYear":2014,"category":{"name":"Combi"}}"#,
        )
        .unwrap();

        assert_eq!(request.registration_number.as_deref(), Some("KR12PR"));
        assert_eq!(request.production_year, Some(2014));
        assert_eq!(request.mileage, None);
        assert_eq!(
            request.category.and_then(|c| c.name),
            Some("Combi".to_string())
        );
    }

    #[test]
    fn search_prefers_license_plate() {
        let query = CarSearchQuery {
            license_plate: Some("KR12PR".into()),
            vin: Some("JT3Z123KBW1589043".into()),
        };
        assert_eq!(
            query.into_search(),
            Some(CarSearch::RegistrationNumber("KR12PR".into()))
        );
        assert_eq!(CarSearchQuery::default().into_search(), None);
    }
}
