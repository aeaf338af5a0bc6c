use thiserror::Error;

use crate::dto::validation::FORBIDDEN_VIN_LETTERS;

/// Reason a VIN was rejected before a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VinViolation {
    #[error("Vin must be exactly {expected} characters long")]
    InvalidLength { expected: usize },
    #[error("Vin cannot contain letters O, I or Q")]
    IllegalCharacters,
}

impl VinViolation {
    pub fn code(self) -> &'static str {
        match self {
            VinViolation::InvalidLength { .. } => "VIN_INVALID_LENGTH",
            VinViolation::IllegalCharacters => "VIN_ILLEGAL_CHARACTERS",
        }
    }
}

/// Cheap structural check run on VINs before they reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VinChecker {
    vin_length: usize,
}

impl VinChecker {
    pub fn new(vin_length: usize) -> Self {
        Self { vin_length }
    }

    /// Length is checked first, then the forbidden letters, ignoring case.
    pub fn check(&self, vin: &str) -> Result<(), VinViolation> {
        if vin.chars().count() != self.vin_length {
            return Err(VinViolation::InvalidLength {
                expected: self.vin_length,
            });
        }
        if vin
            .chars()
            .any(|c| FORBIDDEN_VIN_LETTERS.contains(&c.to_ascii_uppercase()))
        {
            return Err(VinViolation::IllegalCharacters);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_vin() {
        let checker = VinChecker::new(17);
        assert_eq!(checker.check("JT3Z123KBW1589043"), Ok(()));
        assert_eq!(checker.check("jt3z123kbw1589043"), Ok(()));
    }

    #[test]
    fn rejects_wrong_length() {
        let checker = VinChecker::new(17);
        for vin in ["", "JT3Z123KBW158904", "JT3Z123KBW15890433"] {
            assert_eq!(
                checker.check(vin),
                Err(VinViolation::InvalidLength { expected: 17 })
            );
        }
    }

    #[test]
    fn rejects_o_i_q_in_any_case() {
        let checker = VinChecker::new(17);
        for vin in ["OT3Z123KBW1589043", "jt3z123kbw158904i", "JT3Z123qBW1589043"] {
            assert_eq!(checker.check(vin), Err(VinViolation::IllegalCharacters));
        }
    }

    #[test]
    fn length_is_reported_before_letters() {
        let checker = VinChecker::new(17);
        let violation = checker.check("QQQ").unwrap_err();
        assert_eq!(violation.code(), "VIN_INVALID_LENGTH");
        assert_eq!(violation.to_string(), "Vin must be exactly 17 characters long");
    }
}
