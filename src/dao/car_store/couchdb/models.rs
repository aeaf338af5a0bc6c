use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{CouchDaoError, CouchResult};
use crate::dao::models::{CarCategoryEntity, CarEntity, lookup_key};

pub const CAR_PREFIX: &str = "car::";
pub const CATEGORY_PREFIX: &str = "category::";
pub const END_SUFFIX: &str = "\u{ffff}";
const VIN_MARKER_PREFIX: &str = "unique-vin::";
const REGISTRATION_MARKER_PREFIX: &str = "unique-registration::";
const CATEGORY_MARKER_PREFIX: &str = "unique-category::";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Body returned by CouchDB after a successful document write.
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchCarDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub car: CarBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarBody {
    pub vin: String,
    pub registration_number: String,
    pub brand: String,
    pub model: String,
    pub production_year: i32,
    pub mileage: i32,
    #[serde(default)]
    pub description: Option<String>,
    pub category: CarCategoryEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchCategoryDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
}

/// Document whose ID encodes a case-folded unique value; CouchDB refuses a
/// second document with the same ID, which is what enforces uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueMarker {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub target: Uuid,
}

impl UniqueMarker {
    pub fn new(id: String, target: Uuid) -> Self {
        Self {
            id,
            rev: None,
            target,
        }
    }
}

impl CouchCarDocument {
    pub fn from_entity(car: CarEntity) -> Self {
        Self {
            id: car_doc_id(car.id),
            rev: None,
            car: CarBody {
                vin: car.vin,
                registration_number: car.registration_number,
                brand: car.brand,
                model: car.model,
                production_year: car.production_year,
                mileage: car.mileage,
                description: car.description,
                category: car.category,
            },
        }
    }

    pub fn into_entity(self) -> CouchResult<CarEntity> {
        let id = parse_doc_id(&self.id, CAR_PREFIX)?;
        let CarBody {
            vin,
            registration_number,
            brand,
            model,
            production_year,
            mileage,
            description,
            category,
        } = self.car;

        Ok(CarEntity {
            id,
            vin,
            registration_number,
            brand,
            model,
            production_year,
            mileage,
            description,
            category,
        })
    }
}

impl CouchCategoryDocument {
    pub fn from_entity(category: CarCategoryEntity) -> Self {
        Self {
            id: category_doc_id(category.id),
            rev: None,
            name: category.name,
        }
    }

    pub fn into_entity(self) -> CouchResult<CarCategoryEntity> {
        Ok(CarCategoryEntity {
            id: parse_doc_id(&self.id, CATEGORY_PREFIX)?,
            name: self.name,
        })
    }
}

pub fn car_doc_id(id: Uuid) -> String {
    format!("{CAR_PREFIX}{id}")
}

pub fn category_doc_id(id: Uuid) -> String {
    format!("{CATEGORY_PREFIX}{id}")
}

pub fn vin_marker_id(vin: &str) -> String {
    format!("{VIN_MARKER_PREFIX}{}", lookup_key(vin))
}

pub fn registration_marker_id(registration_number: &str) -> String {
    format!("{REGISTRATION_MARKER_PREFIX}{}", lookup_key(registration_number))
}

pub fn category_marker_id(name: &str) -> String {
    format!("{CATEGORY_MARKER_PREFIX}{}", lookup_key(name))
}

fn parse_doc_id(doc_id: &str, prefix: &str) -> CouchResult<Uuid> {
    doc_id
        .strip_prefix(prefix)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_owned(),
        })
}
