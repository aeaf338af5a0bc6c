//! Field rules applied to incoming car payloads.
//!
//! Every rule is evaluated independently so a single response can report
//! all problems of a payload at once.

use thiserror::Error;

use crate::dto::car::CarRequest;

/// VIN length mandated by ISO 3779.
pub const DEFAULT_VIN_LENGTH: usize = 17;
/// Letters never used in a VIN, to avoid confusion with 0, 1 and 9.
pub const FORBIDDEN_VIN_LETTERS: [char; 3] = ['I', 'O', 'Q'];

const REGISTRATION_NUMBER_LENGTH: (usize, usize) = (3, 10);
const BRAND_LENGTH: (usize, usize) = (3, 30);
const MODEL_MAX_LENGTH: usize = 30;
const DESCRIPTION_MAX_LENGTH: usize = 250;
const MIN_PRODUCTION_YEAR: i32 = 1950;

/// Tunable part of the car rules, read from the application configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarRules {
    pub vin_length: usize,
}

impl Default for CarRules {
    fn default() -> Self {
        Self {
            vin_length: DEFAULT_VIN_LENGTH,
        }
    }
}

/// A single broken field rule. The display text is surfaced verbatim to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CarViolation {
    #[error("Car vin cannot be null or blank")]
    VinInvalid,
    #[error("Car vin must consist of letters and digits only, excluding I, O and Q")]
    VinFormatInvalid,
    #[error("Car registration Number cannot be null or blank")]
    RegistrationNumberInvalid,
    #[error("Car registration number length must be between 3 and 10 characters")]
    RegistrationNumberLength,
    #[error("Car registration number must consist of letters and digits only")]
    RegistrationNumberFormat,
    #[error("Car brand cannot be null or blank")]
    BrandInvalid,
    #[error("Car brand length must be between 3 and 30 characters")]
    BrandLength,
    #[error("Car model cannot be null or blank")]
    ModelInvalid,
    #[error("Car model length cannot be greater than 30 characters")]
    ModelLength,
    #[error("Car production year cannot be null or blank")]
    ProductionYearInvalid,
    #[error("Car mileage cannot be null or blank")]
    MileageInvalid,
    #[error("Car description length cannot be greater than 250 characters")]
    DescriptionLength,
    #[error("Car type cannot be null")]
    CategoryMissing,
}

impl CarViolation {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::VinInvalid => "CAR_VIN_INVALID",
            Self::VinFormatInvalid => "VIN_FORMAT_INVALID",
            Self::RegistrationNumberInvalid => "CAR_REGISTRATION_NUMBER_INVALID",
            Self::RegistrationNumberLength => "REGISTRATION_NUMBER_LENGTH_MUST_BETWEEN",
            Self::RegistrationNumberFormat => "REGISTRATION_NUMBER_FORMAT_INVALID",
            Self::BrandInvalid => "CAR_BRAND_INVALID",
            Self::BrandLength => "BRAND_LENGTH_MUST_BETWEEN",
            Self::ModelInvalid => "CAR_MODEL_INVALID",
            Self::ModelLength => "MODEL_LENGTH_NOT_GREATER_THAN",
            Self::ProductionYearInvalid => "CAR_PRODUCTION_YEAR_INVALID",
            Self::MileageInvalid => "CAR_MILEAGE_INVALID",
            Self::DescriptionLength => "DESCRIPTION_LENGTH_NOT_GREATER_THAN",
            Self::CategoryMissing => "CAR_TYPE_INVALID",
        }
    }
}

/// Collect every rule broken by `request`. An empty result means the payload is valid.
pub fn car_request_violations(request: &CarRequest, rules: &CarRules) -> Vec<CarViolation> {
    let mut violations = Vec::new();

    match present(&request.vin) {
        None => violations.push(CarViolation::VinInvalid),
        Some(vin) if vin.chars().count() != rules.vin_length => {
            violations.push(CarViolation::VinInvalid)
        }
        Some(vin) if !is_vin_alphabet(vin) => violations.push(CarViolation::VinFormatInvalid),
        Some(_) => {}
    }

    match present(&request.registration_number) {
        None => violations.push(CarViolation::RegistrationNumberInvalid),
        Some(registration_number) => {
            if !within(registration_number, REGISTRATION_NUMBER_LENGTH) {
                violations.push(CarViolation::RegistrationNumberLength);
            }
            if !registration_number
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
            {
                violations.push(CarViolation::RegistrationNumberFormat);
            }
        }
    }

    match present(&request.brand) {
        None => violations.push(CarViolation::BrandInvalid),
        Some(brand) if !within(brand, BRAND_LENGTH) => violations.push(CarViolation::BrandLength),
        Some(_) => {}
    }

    match present(&request.model) {
        None => violations.push(CarViolation::ModelInvalid),
        Some(model) if model.chars().count() > MODEL_MAX_LENGTH => {
            violations.push(CarViolation::ModelLength)
        }
        Some(_) => {}
    }

    if !request
        .production_year
        .is_some_and(|year| year >= MIN_PRODUCTION_YEAR)
    {
        violations.push(CarViolation::ProductionYearInvalid);
    }

    if !request.mileage.is_some_and(|mileage| mileage >= 0) {
        violations.push(CarViolation::MileageInvalid);
    }

    if request
        .description
        .as_deref()
        .is_some_and(|description| description.chars().count() > DESCRIPTION_MAX_LENGTH)
    {
        violations.push(CarViolation::DescriptionLength);
    }

    if request.category.is_none() {
        violations.push(CarViolation::CategoryMissing);
    }

    violations
}

/// Whitespace-only text counts as missing.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

fn within(value: &str, (min, max): (usize, usize)) -> bool {
    (min..=max).contains(&value.chars().count())
}

/// Letters and digits, excluding I, O and Q in either case.
fn is_vin_alphabet(vin: &str) -> bool {
    vin.chars().all(|c| {
        c.is_ascii_alphanumeric() && !FORBIDDEN_VIN_LETTERS.contains(&c.to_ascii_uppercase())
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::dto::car::CategoryInput;

    fn valid_request() -> CarRequest {
        CarRequest {
            vin: Some("azwsxedc123456789".into()),
            registration_number: Some("KR12345".into()),
            brand: Some("Opel".into()),
            model: Some("Astra".into()),
            production_year: Some(1951),
            mileage: Some(1),
            description: Some(String::new()),
            category: Some(CategoryInput {
                name: Some("Sedan".into()),
            }),
        }
    }

    fn violations(request: &CarRequest) -> Vec<CarViolation> {
        car_request_violations(request, &CarRules::default())
    }

    #[test]
    fn valid_request_has_no_violations() {
        assert!(violations(&valid_request()).is_empty());
    }

    #[test]
    fn empty_request_reports_every_missing_field() {
        let found: HashSet<_> = violations(&CarRequest::default()).into_iter().collect();
        let expected: HashSet<_> = [
            CarViolation::VinInvalid,
            CarViolation::RegistrationNumberInvalid,
            CarViolation::BrandInvalid,
            CarViolation::ModelInvalid,
            CarViolation::ProductionYearInvalid,
            CarViolation::MileageInvalid,
            CarViolation::CategoryMissing,
        ]
        .into_iter()
        .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn vin_rules() {
        let mut request = valid_request();

        request.vin = Some(String::new());
        assert_eq!(violations(&request), vec![CarViolation::VinInvalid]);

        request.vin = Some("V6789654".into());
        assert_eq!(violations(&request), vec![CarViolation::VinInvalid]);

        request.vin = Some("VFTOQ123456789654".into());
        assert_eq!(violations(&request), vec![CarViolation::VinFormatInvalid]);

        request.vin = Some("vftq1234567890-54".into());
        assert_eq!(violations(&request), vec![CarViolation::VinFormatInvalid]);
    }

    #[test]
    fn vin_length_follows_configuration() {
        let mut request = valid_request();
        request.vin = Some("ABC12".into());
        let short_rules = CarRules { vin_length: 5 };
        assert!(car_request_violations(&request, &short_rules).is_empty());
    }

    #[test]
    fn registration_number_rules() {
        let mut request = valid_request();

        request.registration_number = Some("KR".into());
        assert_eq!(
            violations(&request),
            vec![CarViolation::RegistrationNumberLength]
        );

        request.registration_number = Some("KR123456789".into());
        assert_eq!(
            violations(&request),
            vec![CarViolation::RegistrationNumberLength]
        );

        request.registration_number = Some("KR@1234".into());
        assert_eq!(
            violations(&request),
            vec![CarViolation::RegistrationNumberFormat]
        );

        request.registration_number = Some("K@".into());
        assert_eq!(
            violations(&request),
            vec![
                CarViolation::RegistrationNumberLength,
                CarViolation::RegistrationNumberFormat
            ]
        );
    }

    #[test]
    fn brand_and_model_rules() {
        let mut request = valid_request();

        request.brand = Some("Se".into());
        request.model = Some("AstraAstraAstraAstraAstraAstraA".into());
        assert_eq!(
            violations(&request),
            vec![CarViolation::BrandLength, CarViolation::ModelLength]
        );

        request.brand = Some("SedanSedanSedanSedanSedanSedanS".into());
        request.model = Some(String::new());
        assert_eq!(
            violations(&request),
            vec![CarViolation::BrandLength, CarViolation::ModelInvalid]
        );

        request.brand = Some("   ".into());
        request.model = Some("M".into());
        assert_eq!(violations(&request), vec![CarViolation::BrandInvalid]);
    }

    #[test]
    fn numeric_rules() {
        let mut request = valid_request();
        request.production_year = Some(1949);
        request.mileage = Some(-1);
        assert_eq!(
            violations(&request),
            vec![
                CarViolation::ProductionYearInvalid,
                CarViolation::MileageInvalid
            ]
        );

        request.production_year = Some(1950);
        request.mileage = Some(0);
        assert!(violations(&request).is_empty());
    }

    #[test]
    fn description_and_category_rules() {
        let mut request = valid_request();
        request.description = Some("a".repeat(251));
        request.category = None;
        assert_eq!(
            violations(&request),
            vec![CarViolation::DescriptionLength, CarViolation::CategoryMissing]
        );

        request.description = Some("a".repeat(250));
        request.category = Some(CategoryInput::default());
        assert!(violations(&request).is_empty());
    }
}
