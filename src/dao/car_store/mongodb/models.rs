use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{CarCategoryEntity, CarEntity, lookup_key};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCarDocument {
    #[serde(rename = "_id")]
    id: String,
    vin: String,
    vin_key: String,
    registration_number: String,
    registration_key: String,
    brand: String,
    model: String,
    production_year: i32,
    mileage: i32,
    #[serde(default)]
    description: Option<String>,
    category: MongoCategoryRef,
}

/// Category copy embedded in each car document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCategoryRef {
    id: String,
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCategoryDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    name_key: String,
}

impl From<CarEntity> for MongoCarDocument {
    fn from(value: CarEntity) -> Self {
        Self {
            id: value.id.to_string(),
            vin_key: lookup_key(&value.vin),
            vin: value.vin,
            registration_key: lookup_key(&value.registration_number),
            registration_number: value.registration_number,
            brand: value.brand,
            model: value.model,
            production_year: value.production_year,
            mileage: value.mileage,
            description: value.description,
            category: MongoCategoryRef {
                id: value.category.id.to_string(),
                name: value.category.name,
            },
        }
    }
}

impl TryFrom<MongoCarDocument> for CarEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCarDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            vin: value.vin,
            registration_number: value.registration_number,
            brand: value.brand,
            model: value.model,
            production_year: value.production_year,
            mileage: value.mileage,
            description: value.description,
            category: CarCategoryEntity {
                id: parse_id(&value.category.id)?,
                name: value.category.name,
            },
        })
    }
}

impl From<CarCategoryEntity> for MongoCategoryDocument {
    fn from(value: CarCategoryEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name_key: lookup_key(&value.name),
            name: value.name,
        }
    }
}

impl TryFrom<MongoCategoryDocument> for CarCategoryEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCategoryDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            name: value.name,
        })
    }
}

fn parse_id(raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::MalformedDocument {
        id: raw.to_owned(),
        reason: err.to_string(),
    })
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
