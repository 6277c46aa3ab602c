//! # ICMS Tax Block
//!
//! The `ICMS` group under `imp` holds exactly one of five sub-blocks chosen
//! by the tax situation code (`CST`):
//!
//! | CST          | Element  | Fields                                      |
//! |--------------|----------|---------------------------------------------|
//! | `00`         | `ICMS00` | CST, vBC, pICMS, vICMS                      |
//! | `20`         | `ICMS20` | CST, pRedBC, vBC, pICMS, vICMS              |
//! | `40`/`41`/`51` | `ICMS45` | CST                                       |
//! | `90`         | `ICMS90` | CST, pRedBC?, vBC, pICMS, vICMS, vCred?     |
//! | `SN`         | `ICMSSN` | CST (always `90`), indSN (always `1`)       |
//!
//! Any other code is rejected with
//! [`AssemblyError::UnknownTaxSituation`](crate::AssemblyError::UnknownTaxSituation).

use serde::{Deserialize, Serialize};

use crate::error::AssemblyError;
use crate::group::Group;
use bpe_core::Element;

/// Raw ICMS input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcmsRecord {
    #[serde(rename = "CST")]
    pub cst: Option<String>,
    #[serde(rename = "pRedBC")]
    pub base_reduction: Option<String>,
    #[serde(rename = "vBC")]
    pub base: Option<String>,
    #[serde(rename = "pICMS")]
    pub rate: Option<String>,
    #[serde(rename = "vICMS")]
    pub amount: Option<String>,
    #[serde(rename = "vCred")]
    pub credit: Option<String>,
}

/// Situations of the `ICMS45` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exemption {
    /// `40`: exempt.
    Exempt,
    /// `41`: not taxed.
    NotTaxed,
    /// `51`: deferred.
    Deferred,
}

impl Exemption {
    /// `CST` text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exempt => "40",
            Self::NotTaxed => "41",
            Self::Deferred => "51",
        }
    }
}

/// ICMS block selected by `CST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icms {
    /// `00`: fully taxed.
    Taxed {
        base: Option<String>,
        rate: Option<String>,
        amount: Option<String>,
    },
    /// `20`: taxed with base reduction.
    ReducedBase {
        base_reduction: Option<String>,
        base: Option<String>,
        rate: Option<String>,
        amount: Option<String>,
    },
    /// `40`, `41`, `51`.
    Exempt(Exemption),
    /// `90`: other situations.
    Other {
        base_reduction: Option<String>,
        base: Option<String>,
        rate: Option<String>,
        amount: Option<String>,
        credit: Option<String>,
    },
    /// `SN`: issuer under the Simples Nacional regime.
    SimpleNational,
}

impl Icms {
    /// Select the block for `record.cst`.
    ///
    /// # Errors
    ///
    /// [`AssemblyError::MissingRequiredField`] without a `CST`,
    /// [`AssemblyError::UnknownTaxSituation`] for an unknown one.
    pub fn from_record(record: &IcmsRecord) -> Result<Self, AssemblyError> {
        let cst = record
            .cst
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AssemblyError::missing("CST", "ICMS"))?;
        let icms = match cst {
            "00" => Self::Taxed {
                base: record.base.clone(),
                rate: record.rate.clone(),
                amount: record.amount.clone(),
            },
            "20" => Self::ReducedBase {
                base_reduction: record.base_reduction.clone(),
                base: record.base.clone(),
                rate: record.rate.clone(),
                amount: record.amount.clone(),
            },
            "40" => Self::Exempt(Exemption::Exempt),
            "41" => Self::Exempt(Exemption::NotTaxed),
            "51" => Self::Exempt(Exemption::Deferred),
            "90" => Self::Other {
                base_reduction: record.base_reduction.clone(),
                base: record.base.clone(),
                rate: record.rate.clone(),
                amount: record.amount.clone(),
                credit: record.credit.clone(),
            },
            "SN" => Self::SimpleNational,
            other => {
                return Err(AssemblyError::UnknownTaxSituation {
                    code: other.to_string(),
                })
            }
        };
        Ok(icms)
    }

    /// Name of the emitted sub-block.
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::Taxed { .. } => "ICMS00",
            Self::ReducedBase { .. } => "ICMS20",
            Self::Exempt(_) => "ICMS45",
            Self::Other { .. } => "ICMS90",
            Self::SimpleNational => "ICMSSN",
        }
    }

    /// Build the sub-block, recording missing required values in `errors`.
    pub(crate) fn to_element(&self, errors: &mut Vec<AssemblyError>) -> Element {
        let mut g = Group::new(self.element_name(), errors);
        match self {
            Self::Taxed { base, rate, amount } => {
                g.required("CST", Some("00"));
                g.required("vBC", base.as_deref());
                g.required("pICMS", rate.as_deref());
                g.required("vICMS", amount.as_deref());
            }
            Self::ReducedBase {
                base_reduction,
                base,
                rate,
                amount,
            } => {
                g.required("CST", Some("20"));
                g.required("pRedBC", base_reduction.as_deref());
                g.required("vBC", base.as_deref());
                g.required("pICMS", rate.as_deref());
                g.required("vICMS", amount.as_deref());
            }
            Self::Exempt(exemption) => {
                g.required("CST", Some(exemption.code()));
            }
            Self::Other {
                base_reduction,
                base,
                rate,
                amount,
                credit,
            } => {
                g.required("CST", Some("90"));
                g.optional("pRedBC", base_reduction.as_deref());
                g.required("vBC", base.as_deref());
                g.required("pICMS", rate.as_deref());
                g.required("vICMS", amount.as_deref());
                g.optional("vCred", credit.as_deref());
            }
            Self::SimpleNational => {
                g.required("CST", Some("90"));
                g.required("indSN", Some("1"));
            }
        }
        g.finish()
    }
}
