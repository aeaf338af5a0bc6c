use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification label attached to every car (e.g. "Sedan", "Other").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarCategoryEntity {
    /// Stable identifier for the category.
    pub id: Uuid,
    /// Display name, unique ignoring case.
    pub name: String,
}

/// Car record as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarEntity {
    /// Identifier assigned by storage on first insert.
    pub id: Uuid,
    /// Vehicle identification number, unique ignoring case.
    pub vin: String,
    /// License plate, unique ignoring case.
    pub registration_number: String,
    pub brand: String,
    pub model: String,
    pub production_year: i32,
    pub mileage: i32,
    pub description: Option<String>,
    /// Category resolved during intake.
    pub category: CarCategoryEntity,
}

/// Car awaiting its first insert. Storage assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCarEntity {
    pub vin: String,
    pub registration_number: String,
    pub brand: String,
    pub model: String,
    pub production_year: i32,
    pub mileage: i32,
    pub description: Option<String>,
    pub category: CarCategoryEntity,
}

impl NewCarEntity {
    /// Attach the identifier chosen by the storage backend.
    pub fn into_entity(self, id: Uuid) -> CarEntity {
        CarEntity {
            id,
            vin: self.vin,
            registration_number: self.registration_number,
            brand: self.brand,
            model: self.model,
            production_year: self.production_year,
            mileage: self.mileage,
            description: self.description,
            category: self.category,
        }
    }
}

/// One page of cars, in storage order, with the totals of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarPageEntity {
    pub items: Vec<CarEntity>,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl CarPageEntity {
    /// Assemble a page, deriving the page count from the collection size.
    pub fn new(items: Vec<CarEntity>, total_elements: u64, page_size: u64) -> Self {
        Self {
            items,
            total_elements,
            total_pages: total_elements.div_ceil(page_size.max(1)),
        }
    }
}

/// Normalised form used by every backend for case-insensitive matching.
pub fn lookup_key(value: &str) -> String {
    value.to_uppercase()
}

/// Identifier for a freshly inserted record. Time-ordered so that sorting by
/// identifier preserves insertion order.
pub fn new_record_id() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(CarPageEntity::new(Vec::new(), 0, 20).total_pages, 0);
        assert_eq!(CarPageEntity::new(Vec::new(), 20, 20).total_pages, 1);
        assert_eq!(CarPageEntity::new(Vec::new(), 21, 20).total_pages, 2);
        assert_eq!(CarPageEntity::new(Vec::new(), 7, 1).total_pages, 7);
    }

    #[test]
    fn lookup_key_ignores_case() {
        assert_eq!(lookup_key("kR12pr"), lookup_key("KR12PR"));
    }

    #[test]
    fn record_ids_sort_in_creation_order() {
        let first = new_record_id();
        let second = new_record_id();
        assert!(first.to_string() < second.to_string());
    }
}
