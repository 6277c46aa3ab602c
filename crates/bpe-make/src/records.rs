//! # Input Records
//!
//! One plain record per tag group. Every field is an optional string: the
//! assembler decides which are required, and values are emitted exactly as
//! given (after trimming) so decimal formatting such as `"10.00"` survives.
//!
//! Serde names are the layout element names, so a ticket description in
//! JSON or YAML uses the same vocabulary as the XML it produces.

use serde::{Deserialize, Serialize};

use crate::tax::IcmsRecord;

/// `infBPe` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfBpeRecord {
    /// Document key; non-digits are dropped and `BPe` is prefixed.
    #[serde(rename = "Id")]
    pub id: Option<String>,
    /// Layout version.
    #[serde(rename = "versao")]
    pub version: Option<String>,
}

/// `ide`: identification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationRecord {
    #[serde(rename = "cUF")]
    pub uf_code: Option<String>,
    #[serde(rename = "tpAmb")]
    pub environment: Option<String>,
    #[serde(rename = "mod")]
    pub model: Option<String>,
    #[serde(rename = "serie")]
    pub series: Option<String>,
    #[serde(rename = "nBP")]
    pub number: Option<String>,
    /// Numeric code; random when absent.
    #[serde(rename = "cBP")]
    pub numeric_code: Option<String>,
    #[serde(rename = "cDV")]
    pub check_digit: Option<String>,
    #[serde(rename = "modal")]
    pub modal: Option<String>,
    #[serde(rename = "dhEmi")]
    pub issued_at: Option<String>,
    #[serde(rename = "tpEmis")]
    pub emission_type: Option<String>,
    #[serde(rename = "verProc")]
    pub app_version: Option<String>,
    #[serde(rename = "tpBPe")]
    pub ticket_type: Option<String>,
    #[serde(rename = "indPres")]
    pub presence: Option<String>,
    #[serde(rename = "UFIni")]
    pub origin_uf: Option<String>,
    #[serde(rename = "cMunIni")]
    pub origin_city: Option<String>,
    #[serde(rename = "UFFim")]
    pub destination_uf: Option<String>,
    #[serde(rename = "cMunFim")]
    pub destination_city: Option<String>,
    #[serde(rename = "dhCont")]
    pub contingency_at: Option<String>,
    #[serde(rename = "xJust")]
    pub contingency_reason: Option<String>,
}

/// `emit`: issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerRecord {
    #[serde(rename = "CNPJ")]
    pub cnpj: Option<String>,
    #[serde(rename = "IE")]
    pub state_registration: Option<String>,
    #[serde(rename = "IEST")]
    pub substitute_registration: Option<String>,
    #[serde(rename = "xNome")]
    pub name: Option<String>,
    #[serde(rename = "xFant")]
    pub trade_name: Option<String>,
    #[serde(rename = "IM")]
    pub municipal_registration: Option<String>,
    #[serde(rename = "CNAE")]
    pub cnae: Option<String>,
    #[serde(rename = "CRT")]
    pub tax_regime: Option<String>,
    /// Transport authorization; written after `enderEmit`.
    #[serde(rename = "TAR")]
    pub tar: Option<String>,
}

/// `enderEmit`, `enderComp`, `enderAgencia`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(rename = "xLgr")]
    pub street: Option<String>,
    #[serde(rename = "nro")]
    pub number: Option<String>,
    #[serde(rename = "xCpl")]
    pub complement: Option<String>,
    #[serde(rename = "xBairro")]
    pub district: Option<String>,
    #[serde(rename = "cMun")]
    pub city_code: Option<String>,
    #[serde(rename = "xMun")]
    pub city: Option<String>,
    #[serde(rename = "CEP")]
    pub postal_code: Option<String>,
    #[serde(rename = "UF")]
    pub uf: Option<String>,
    /// Required for buyer and agency addresses only.
    #[serde(rename = "cPais")]
    pub country_code: Option<String>,
    #[serde(rename = "xPais")]
    pub country: Option<String>,
    #[serde(rename = "fone")]
    pub phone: Option<String>,
    #[serde(rename = "email")]
    pub email: Option<String>,
}

/// `comp`: buyer. One of CPF, foreign id, CNPJ is used, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerRecord {
    #[serde(rename = "xNome")]
    pub name: Option<String>,
    #[serde(rename = "CPF")]
    pub cpf: Option<String>,
    #[serde(rename = "idEstrangeiro")]
    pub foreign_id: Option<String>,
    #[serde(rename = "CNPJ")]
    pub cnpj: Option<String>,
    #[serde(rename = "IE")]
    pub state_registration: Option<String>,
}

/// `agencia`: selling agency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyRecord {
    #[serde(rename = "xNome")]
    pub name: Option<String>,
    #[serde(rename = "CNPJ")]
    pub cnpj: Option<String>,
}

/// `infBPeSub`: substituted ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    #[serde(rename = "chBPe")]
    pub key: Option<String>,
    #[serde(rename = "tpSub")]
    pub kind: Option<String>,
}

/// `infPassagem`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageRecord {
    #[serde(rename = "cLocOrig")]
    pub origin_code: Option<String>,
    #[serde(rename = "xLocOrig")]
    pub origin: Option<String>,
    #[serde(rename = "cLocDest")]
    pub destination_code: Option<String>,
    #[serde(rename = "xLocDest")]
    pub destination: Option<String>,
    #[serde(rename = "dhEmb")]
    pub boarding_at: Option<String>,
    #[serde(rename = "dhValidade")]
    pub valid_until: Option<String>,
}

/// `infPassageiro`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerRecord {
    #[serde(rename = "xNome")]
    pub name: Option<String>,
    #[serde(rename = "CPF")]
    pub cpf: Option<String>,
    /// Identity document type; `nDoc` is required with it.
    #[serde(rename = "tpDoc")]
    pub document_type: Option<String>,
    #[serde(rename = "nDoc")]
    pub document_number: Option<String>,
    #[serde(rename = "xDoc")]
    pub document_description: Option<String>,
    #[serde(rename = "dNasc")]
    pub birth_date: Option<String>,
    #[serde(rename = "fone")]
    pub phone: Option<String>,
    #[serde(rename = "email")]
    pub email: Option<String>,
}

/// `infViagem`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyRecord {
    #[serde(rename = "cPercurso")]
    pub route_code: Option<String>,
    #[serde(rename = "xPercurso")]
    pub route: Option<String>,
    #[serde(rename = "tpViagem")]
    pub trip_type: Option<String>,
    #[serde(rename = "tpServ")]
    pub service_type: Option<String>,
    #[serde(rename = "tpAcomodacao")]
    pub accommodation: Option<String>,
    #[serde(rename = "tpTrecho")]
    pub leg_type: Option<String>,
    #[serde(rename = "dhViagem")]
    pub departs_at: Option<String>,
    #[serde(rename = "dhConexao")]
    pub connection_at: Option<String>,
    #[serde(rename = "prefixo")]
    pub line_prefix: Option<String>,
    #[serde(rename = "poltrona")]
    pub seat: Option<String>,
    #[serde(rename = "plataforma")]
    pub platform: Option<String>,
}

/// `infTravessia`: ferry crossing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingRecord {
    #[serde(rename = "tpVeiculo")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "sitVeiculo")]
    pub vehicle_status: Option<String>,
}

/// `infValorBPe`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    #[serde(rename = "vBP")]
    pub ticket: Option<String>,
    #[serde(rename = "vDesconto")]
    pub discount: Option<String>,
    #[serde(rename = "vPgto")]
    pub paid: Option<String>,
    #[serde(rename = "vTroco")]
    pub change: Option<String>,
    /// Discount type; `xDesconto` is required with it.
    #[serde(rename = "tpDesconto")]
    pub discount_type: Option<String>,
    #[serde(rename = "xDesconto")]
    pub discount_description: Option<String>,
    #[serde(rename = "cDesconto")]
    pub discount_code: Option<String>,
}

/// `Comp` under `infValorBPe`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueComponentRecord {
    #[serde(rename = "tpComp")]
    pub kind: Option<String>,
    #[serde(rename = "vComp")]
    pub value: Option<String>,
}

/// `imp` besides the ICMS block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRecord {
    #[serde(rename = "vTotTrib")]
    pub total_taxes: Option<String>,
    #[serde(rename = "infAdFisco")]
    pub fiscal_info: Option<String>,
}

/// `card` under `pag`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(rename = "tpIntegra")]
    pub integration: Option<String>,
    #[serde(rename = "CNPJ")]
    pub cnpj: Option<String>,
    #[serde(rename = "tBand")]
    pub brand: Option<String>,
    #[serde(rename = "xBand")]
    pub brand_name: Option<String>,
    #[serde(rename = "cAut")]
    pub authorization: Option<String>,
    #[serde(rename = "nsuTrans")]
    pub transaction_nsu: Option<String>,
    #[serde(rename = "nsuHost")]
    pub host_nsu: Option<String>,
    /// Installments, zero-padded to three digits.
    #[serde(rename = "nParcelas")]
    pub installments: Option<String>,
    #[serde(rename = "infAdCard")]
    pub extra: Option<String>,
}

/// `pag`: one payment method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(rename = "tPag")]
    pub method: Option<String>,
    #[serde(rename = "xPag")]
    pub description: Option<String>,
    #[serde(rename = "nDocPag")]
    pub document: Option<String>,
    #[serde(rename = "vPag")]
    pub amount: Option<String>,
    #[serde(rename = "card")]
    pub card: Option<CardRecord>,
}

/// `autXML`: party authorized to download the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloaderRecord {
    #[serde(rename = "CNPJ")]
    pub cnpj: Option<String>,
    #[serde(rename = "CPF")]
    pub cpf: Option<String>,
}

/// `infAdic`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInfoRecord {
    #[serde(rename = "infAdFisco")]
    pub fiscal: Option<String>,
    #[serde(rename = "infCpl")]
    pub complementary: Option<String>,
}

/// `infBPeSupl`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementRecord {
    #[serde(rename = "qrCodBPe")]
    pub qr_code: Option<String>,
}

/// A whole ticket description, one entry per group.
///
/// Feeding it to [`TicketAssembler::assemble`](crate::TicketAssembler::assemble)
/// calls every tag operation for the groups present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInput {
    #[serde(rename = "infBPe", default)]
    pub inf_bpe: InfBpeRecord,
    #[serde(rename = "ide")]
    pub ide: Option<IdentificationRecord>,
    #[serde(rename = "emit")]
    pub emit: Option<IssuerRecord>,
    #[serde(rename = "enderEmit")]
    pub emit_address: Option<AddressRecord>,
    #[serde(rename = "comp")]
    pub buyer: Option<BuyerRecord>,
    #[serde(rename = "enderComp")]
    pub buyer_address: Option<AddressRecord>,
    #[serde(rename = "agencia")]
    pub agency: Option<AgencyRecord>,
    #[serde(rename = "enderAgencia")]
    pub agency_address: Option<AddressRecord>,
    #[serde(rename = "infBPeSub")]
    pub substitution: Option<SubstitutionRecord>,
    #[serde(rename = "infPassagem")]
    pub passage: Option<PassageRecord>,
    #[serde(rename = "infPassageiro")]
    pub passenger: Option<PassengerRecord>,
    #[serde(rename = "infViagem")]
    pub journey: Option<JourneyRecord>,
    #[serde(rename = "infTravessia")]
    pub crossing: Option<CrossingRecord>,
    #[serde(rename = "infValorBPe")]
    pub value: Option<ValueRecord>,
    #[serde(rename = "Comp", default)]
    pub components: Vec<ValueComponentRecord>,
    #[serde(rename = "imp")]
    pub taxes: Option<TaxRecord>,
    #[serde(rename = "ICMS")]
    pub icms: Option<IcmsRecord>,
    #[serde(rename = "pag", default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(rename = "autXML", default)]
    pub downloaders: Vec<DownloaderRecord>,
    #[serde(rename = "infAdic")]
    pub additional: Option<AdditionalInfoRecord>,
    #[serde(rename = "infBPeSupl")]
    pub supplement: Option<SupplementRecord>,
}
