//! # Federative Units
//!
//! The 27 Brazilian federative units (UF) with their IBGE numeric codes.
//! The numeric code opens every document key and is the `cOrgao` of
//! event requests; the acronym selects the authorizing SEFAZ.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Brazilian federative unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Uf {
    AC,
    AL,
    AP,
    AM,
    BA,
    CE,
    DF,
    ES,
    GO,
    MA,
    MT,
    MS,
    MG,
    PA,
    PB,
    PR,
    PE,
    PI,
    RJ,
    RN,
    RS,
    RO,
    RR,
    SC,
    SP,
    SE,
    TO,
}

impl Uf {
    /// All units in alphabetical order of their names.
    pub fn all() -> &'static [Uf] {
        &[
            Self::AC,
            Self::AL,
            Self::AP,
            Self::AM,
            Self::BA,
            Self::CE,
            Self::DF,
            Self::ES,
            Self::GO,
            Self::MA,
            Self::MT,
            Self::MS,
            Self::MG,
            Self::PA,
            Self::PB,
            Self::PR,
            Self::PE,
            Self::PI,
            Self::RJ,
            Self::RN,
            Self::RS,
            Self::RO,
            Self::RR,
            Self::SC,
            Self::SP,
            Self::SE,
            Self::TO,
        ]
    }

    /// IBGE numeric code.
    pub fn code(&self) -> u8 {
        match self {
            Self::AC => 12,
            Self::AL => 27,
            Self::AP => 16,
            Self::AM => 13,
            Self::BA => 29,
            Self::CE => 23,
            Self::DF => 53,
            Self::ES => 32,
            Self::GO => 52,
            Self::MA => 21,
            Self::MT => 51,
            Self::MS => 50,
            Self::MG => 31,
            Self::PA => 15,
            Self::PB => 25,
            Self::PR => 41,
            Self::PE => 26,
            Self::PI => 22,
            Self::RJ => 33,
            Self::RN => 24,
            Self::RS => 43,
            Self::RO => 11,
            Self::RR => 14,
            Self::SC => 42,
            Self::SP => 35,
            Self::SE => 28,
            Self::TO => 17,
        }
    }

    /// Two-letter acronym.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AC => "AC",
            Self::AL => "AL",
            Self::AP => "AP",
            Self::AM => "AM",
            Self::BA => "BA",
            Self::CE => "CE",
            Self::DF => "DF",
            Self::ES => "ES",
            Self::GO => "GO",
            Self::MA => "MA",
            Self::MT => "MT",
            Self::MS => "MS",
            Self::MG => "MG",
            Self::PA => "PA",
            Self::PB => "PB",
            Self::PR => "PR",
            Self::PE => "PE",
            Self::PI => "PI",
            Self::RJ => "RJ",
            Self::RN => "RN",
            Self::RS => "RS",
            Self::RO => "RO",
            Self::RR => "RR",
            Self::SC => "SC",
            Self::SP => "SP",
            Self::SE => "SE",
            Self::TO => "TO",
        }
    }

    /// Look up a unit by IBGE code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::all().iter().copied().find(|uf| uf.code() == code)
    }
}

impl std::fmt::Display for Uf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown UF acronym.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown federative unit: {0:?}")]
pub struct UnknownUf(pub String);

impl FromStr for Uf {
    type Err = UnknownUf;

    /// Parse a unit from its acronym, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|uf| uf.as_str() == upper)
            .ok_or_else(|| UnknownUf(s.to_string()))
    }
}
