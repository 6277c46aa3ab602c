//! # Document Key: 44-Digit Access Key
//!
//! Every BP-e is identified by a 44-digit access key (`chBPe`) derived from
//! its header fields:
//!
//! | Positions | Width | Field                         |
//! |-----------|-------|-------------------------------|
//! | 1–2       | 2     | UF IBGE code (`cUF`)          |
//! | 3–6       | 4     | Emission year and month (YYMM)|
//! | 7–20      | 14    | Issuer CNPJ                   |
//! | 21–22     | 2     | Model (`mod`, 63)             |
//! | 23–25     | 3     | Series (`serie`)              |
//! | 26–34     | 9     | Number (`nBP`)                |
//! | 35        | 1     | Emission type (`tpEmis`)      |
//! | 36–43     | 8     | Numeric code (`cBP`)          |
//! | 44        | 1     | Check digit (`cDV`)           |
//!
//! The check digit is modulo 11 over the first 43 digits with weights
//! 2 through 9 cycling from the rightmost digit; remainders yielding 10 or
//! 11 map to 0.
//!
//! ## Invariant
//!
//! `DocumentKey` can only be built by [`KeyFields::derive()`] or by
//! [`DocumentKey::new()`], which rejects wrong lengths, non-digits, and bad
//! check digits. A `DocumentKey` in hand is always self-consistent.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::width;
use crate::error::KeyError;

/// Header fields that determine a document key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFields {
    /// UF IBGE code.
    pub uf_code: u8,
    /// Two-digit emission year.
    pub year: u8,
    /// Emission month (1–12).
    pub month: u8,
    /// Issuer CNPJ (left-padded to 14 digits).
    pub tax_id: String,
    /// Document model.
    pub model: u8,
    /// Series.
    pub series: u32,
    /// Document number.
    pub number: u64,
    /// Emission type.
    pub emission_type: u8,
    /// Eight-digit numeric code.
    pub numeric_code: u32,
}

impl KeyFields {
    /// Derive the 44-digit key, check digit included.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::FieldOutOfRange`] when a field does not fit its
    /// fixed width.
    pub fn derive(&self) -> Result<DocumentKey, KeyError> {
        check_range("cUF", u64::from(self.uf_code), 99)?;
        check_range("ano", u64::from(self.year), 99)?;
        check_range("mes", u64::from(self.month), 12)?;
        check_range("mod", u64::from(self.model), 99)?;
        check_range("serie", u64::from(self.series), 999)?;
        check_range("nBP", self.number, 999_999_999)?;
        check_range("tpEmis", u64::from(self.emission_type), 9)?;
        check_range("cBP", u64::from(self.numeric_code), 99_999_999)?;

        let tax_id = self.tax_id.trim();
        if tax_id.is_empty()
            || tax_id.len() > width::KEY_TAX_ID
            || !tax_id.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(KeyError::FieldOutOfRange {
                field: "CNPJ",
                value: self.tax_id.clone(),
            });
        }

        let base = format!(
            "{:02}{:02}{:02}{:0>14}{:02}{:03}{:09}{:01}{:08}",
            self.uf_code,
            self.year,
            self.month,
            tax_id,
            self.model,
            self.series,
            self.number,
            self.emission_type,
            self.numeric_code,
        );
        let digit = check_digit(&base)?;
        Ok(DocumentKey(format!("{base}{digit}")))
    }
}

fn check_range(field: &'static str, value: u64, max: u64) -> Result<(), KeyError> {
    if value > max {
        return Err(KeyError::FieldOutOfRange {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Compute the modulo-11 check digit of a 43-digit key prefix.
///
/// # Errors
///
/// Returns [`KeyError::InvalidLength`] unless `base` has exactly 43
/// characters and [`KeyError::NonNumeric`] if any of them is not a digit.
pub fn check_digit(base: &str) -> Result<u8, KeyError> {
    if base.len() != width::KEY - 1 {
        return Err(KeyError::InvalidLength(base.len()));
    }
    if !base.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::NonNumeric(base.to_string()));
    }
    let sum: u32 = base
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * (2 + (i as u32 % 8)))
        .sum();
    let digit = 11 - (sum % 11);
    Ok(if digit > 9 { 0 } else { digit as u8 })
}

/// Generate a random eight-digit numeric code distinct from the document
/// number, for tickets issued without an explicit `cBP`.
pub fn random_numeric_code(number: u64) -> u32 {
    let mut rng = rand::thread_rng();
    loop {
        let code: u32 = rng.gen_range(0..=99_999_999);
        if u64::from(code) != number % 100_000_000 {
            return code;
        }
    }
}

/// A validated 44-digit BP-e access key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl<'de> Deserialize<'de> for DocumentKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl DocumentKey {
    /// Validate an existing key string.
    ///
    /// Surrounding whitespace is ignored. Anything else that is not a digit
    /// is rejected: callers holding an `Id` attribute strip its prefix first.
    pub fn new(value: impl Into<String>) -> Result<Self, KeyError> {
        let raw = value.into();
        let s = raw.trim();
        if s.len() != width::KEY {
            return Err(KeyError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyError::NonNumeric(s.to_string()));
        }
        let expected = check_digit(&s[..width::KEY - 1])?;
        let found = s.as_bytes()[width::KEY - 1] - b'0';
        if expected != found {
            return Err(KeyError::CheckDigitMismatch { expected, found });
        }
        Ok(Self(s.to_string()))
    }

    /// The 44 digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UF IBGE code (positions 1–2).
    pub fn uf_code(&self) -> u8 {
        self.digits(0, 2) as u8
    }

    /// Emission year and month as `YYMM` (positions 3–6).
    pub fn year_month(&self) -> &str {
        &self.0[2..6]
    }

    /// Issuer CNPJ (positions 7–20).
    pub fn tax_id(&self) -> &str {
        &self.0[6..20]
    }

    /// Document model (positions 21–22).
    pub fn model(&self) -> u8 {
        self.digits(20, 22) as u8
    }

    /// Series (positions 23–25).
    pub fn series(&self) -> u32 {
        self.digits(22, 25) as u32
    }

    /// Document number (positions 26–34).
    pub fn number(&self) -> u64 {
        self.digits(25, 34)
    }

    /// Emission type (position 35).
    pub fn emission_type(&self) -> u8 {
        self.digits(34, 35) as u8
    }

    /// Numeric code (positions 36–43).
    pub fn numeric_code(&self) -> u32 {
        self.digits(35, 43) as u32
    }

    /// Check digit (position 44).
    pub fn check_digit(&self) -> u8 {
        self.digits(43, 44) as u8
    }

    // The constructor guarantees every byte is an ASCII digit.
    fn digits(&self, from: usize, to: usize) -> u64 {
        self.0.as_bytes()[from..to]
            .iter()
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> KeyFields {
        KeyFields {
            uf_code: 35,
            year: 19,
            month: 1,
            tax_id: "12345678000195".to_string(),
            model: 63,
            series: 1,
            number: 123,
            emission_type: 1,
            numeric_code: 45_678_901,
        }
    }

    #[test]
    fn derive_layout() {
        let key = sample_fields().derive().unwrap();
        assert_eq!(key.as_str().len(), 44);
        assert!(key.as_str().starts_with("351901123456780001956300100000012314567890"));
        assert_eq!(key.uf_code(), 35);
        assert_eq!(key.year_month(), "1901");
        assert_eq!(key.tax_id(), "12345678000195");
        assert_eq!(key.model(), 63);
        assert_eq!(key.series(), 1);
        assert_eq!(key.number(), 123);
        assert_eq!(key.emission_type(), 1);
        assert_eq!(key.numeric_code(), 45_678_901);
    }

    #[test]
    fn known_check_digit() {
        // Weighted sum 734; 734 % 11 = 8; 11 - 8 = 3.
        let base = "3519011234567800019563001000000123145678901";
        assert_eq!(check_digit(base).unwrap(), 3);
        let key = sample_fields().derive().unwrap();
        assert_eq!(key.as_str(), format!("{base}3"));
        assert_eq!(key.check_digit(), 3);
    }

    #[test]
    fn check_digit_maps_ten_and_eleven_to_zero() {
        // All zeros: sum 0, 11 - 0 = 11 -> 0.
        assert_eq!(check_digit(&"0".repeat(43)).unwrap(), 0);
        // A single 1 in the rightmost position: sum 2, 11 - 2 = 9.
        let mut base = "0".repeat(42);
        base.push('1');
        assert_eq!(check_digit(&base).unwrap(), 9);
    }

    #[test]
    fn check_digit_rejects_bad_input() {
        assert_eq!(check_digit("123"), Err(KeyError::InvalidLength(3)));
        let bad = format!("{}a", "0".repeat(42));
        assert!(matches!(check_digit(&bad), Err(KeyError::NonNumeric(_))));
    }

    #[test]
    fn short_tax_id_is_left_padded() {
        let mut fields = sample_fields();
        fields.tax_id = "12345678901".to_string();
        let key = fields.derive().unwrap();
        assert_eq!(key.tax_id(), "00012345678901");
    }

    #[test]
    fn derive_rejects_out_of_range_fields() {
        let mut fields = sample_fields();
        fields.number = 1_000_000_000;
        assert!(matches!(
            fields.derive(),
            Err(KeyError::FieldOutOfRange { field: "nBP", .. })
        ));

        let mut fields = sample_fields();
        fields.month = 13;
        assert!(fields.derive().is_err());

        let mut fields = sample_fields();
        fields.tax_id = "12.345.678/0001-95".to_string();
        assert!(matches!(
            fields.derive(),
            Err(KeyError::FieldOutOfRange { field: "CNPJ", .. })
        ));
    }

    #[test]
    fn new_validates_check_digit() {
        let key = sample_fields().derive().unwrap();
        assert_eq!(DocumentKey::new(key.as_str()).unwrap(), key);

        let mut broken = key.as_str()[..43].to_string();
        broken.push(if key.check_digit() == 9 { '0' } else { '9' });
        assert!(matches!(
            DocumentKey::new(broken),
            Err(KeyError::CheckDigitMismatch { .. })
        ));
    }

    #[test]
    fn new_rejects_prefix_and_length() {
        let key = sample_fields().derive().unwrap();
        assert!(DocumentKey::new(format!("BPe{key}")).is_err());
        assert_eq!(DocumentKey::new("123"), Err(KeyError::InvalidLength(3)));
    }

    #[test]
    fn random_code_differs_from_number() {
        for _ in 0..100 {
            let code = random_numeric_code(7);
            assert_ne!(code, 7);
            assert!(code <= 99_999_999);
        }
    }

    #[test]
    fn serde_validates() {
        let key = sample_fields().derive().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{key}\""));
        let back: DocumentKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<DocumentKey>("\"1234\"").is_err());
    }
}
