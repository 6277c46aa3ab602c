//! # Event Requests
//!
//! Builds the unsigned `eventoBPe` document for the three BP-e events.
//! Names and descriptions come from [`EventKind`]; this module only adds
//! the per-event payload.
//!
//! ```text
//! eventoBPe[xmlns, versao]
//!   infEvento[Id = "ID" + tpEvento + chBPe + nSeqEvento(2)]
//!     cOrgao tpAmb CNPJ chBPe dhEvento tpEvento nSeqEvento
//!     detEvento[versaoEvento]
//!       evCancBPe | evNaoEmbBPe | evAlteracaoPoltrona
//! ```

use bpe_core::constants::{limit, root, width, PORTAL_NAMESPACE};
use bpe_core::strings::{pad_left, sanitize};
use bpe_core::{DocumentKey, Element, EventKind};
use chrono::{DateTime, FixedOffset};

use crate::config::SefazConfig;
use crate::error::SefazError;

/// Largest `nSeqEvento` that fits the two-digit `Id` suffix.
pub const MAX_SEQUENCE: u32 = 99;

/// Event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDetail {
    /// Cancel an authorized ticket.
    Cancellation {
        /// Authorization protocol of the ticket.
        protocol: String,
        /// Free-text reason.
        justification: String,
    },
    /// Passenger did not board.
    NoBoarding {
        /// Authorization protocol of the ticket.
        protocol: String,
        /// Free-text reason.
        justification: String,
    },
    /// Passenger moved to another seat.
    SeatChange {
        /// Authorization protocol of the ticket.
        protocol: String,
        /// New seat number.
        seat: String,
    },
}

impl EventDetail {
    /// Event this payload belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Cancellation { .. } => EventKind::Cancellation,
            Self::NoBoarding { .. } => EventKind::NoBoarding,
            Self::SeatChange { .. } => EventKind::SeatChange,
        }
    }

    fn to_element(&self) -> Element {
        let kind = self.kind();
        let mut el = Element::new(kind.detail_element());
        el.push_text("descEvento", kind.description());
        match self {
            Self::Cancellation {
                protocol,
                justification,
            }
            | Self::NoBoarding {
                protocol,
                justification,
            } => {
                el.push_text("nProt", protocol.trim());
                el.push_text("xJust", sanitize(justification, limit::EVENT_JUSTIFICATION));
            }
            Self::SeatChange { protocol, seat } => {
                el.push_text("nProt", protocol.trim());
                el.push_text("poltrona", seat.trim());
            }
        }
        el
    }
}

/// `infEvento/@Id` for an event.
pub fn event_id(kind: EventKind, key: &DocumentKey, sequence: u32) -> String {
    format!(
        "ID{}{}{}",
        kind.code(),
        key,
        pad_left(&sequence.to_string(), width::EVENT_SEQUENCE)
    )
}

/// Unsigned `eventoBPe` for `key`, stamped with `issued_at`.
///
/// # Errors
///
/// [`SefazError::InvalidSequence`] outside `1..=99`.
pub fn build_event_request(
    config: &SefazConfig,
    key: &DocumentKey,
    detail: &EventDetail,
    sequence: u32,
    issued_at: &DateTime<FixedOffset>,
) -> Result<String, SefazError> {
    if !(1..=MAX_SEQUENCE).contains(&sequence) {
        return Err(SefazError::InvalidSequence(sequence));
    }
    let kind = detail.kind();

    let mut inf = Element::new("infEvento").with_attr("Id", event_id(kind, key, sequence));
    inf.push_text("cOrgao", format!("{:02}", key.uf_code()));
    inf.push_text("tpAmb", config.environment.to_string());
    inf.push_text("CNPJ", config.cnpj.as_str());
    inf.push_text("chBPe", key.as_str());
    inf.push_text("dhEvento", issued_at.format("%Y-%m-%dT%H:%M:%S%:z").to_string());
    inf.push_text("tpEvento", kind.to_string());
    inf.push_text("nSeqEvento", sequence.to_string());
    let mut det = Element::new("detEvento").with_attr("versaoEvento", config.version.as_str());
    det.push(detail.to_element());
    inf.push(det);

    let mut event = Element::new(root::EVENTO_BPE)
        .with_attr("xmlns", PORTAL_NAMESPACE)
        .with_attr("versao", config.version.as_str());
    event.push(inf);

    tracing::debug!(event = %kind, key = %key, sequence, "event request built");
    Ok(event.to_xml()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use bpe_core::Uf;
    use chrono::TimeZone;

    const KEY: &str = "35190112345678000195630010000001231456789013";

    fn config() -> SefazConfig {
        SefazConfig::new(Environment::Homologation, Uf::SP, "12345678000195")
    }

    fn at() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2019, 1, 10, 14, 5, 9)
            .unwrap()
    }

    fn key() -> DocumentKey {
        DocumentKey::new(KEY).unwrap()
    }

    #[test]
    fn cancellation_request() {
        let detail = EventDetail::Cancellation {
            protocol: "135190000000001".to_string(),
            justification: "  Passageiro desistiu da viagem  ".to_string(),
        };
        let xml = build_event_request(&config(), &key(), &detail, 1, &at()).unwrap();
        assert_eq!(
            xml,
            format!(
                concat!(
                    r#"<eventoBPe xmlns="http://www.portalfiscal.inf.br/bpe" versao="1.00">"#,
                    r#"<infEvento Id="ID110111{key}01"><cOrgao>35</cOrgao><tpAmb>2</tpAmb>"#,
                    r#"<CNPJ>12345678000195</CNPJ><chBPe>{key}</chBPe>"#,
                    r#"<dhEvento>2019-01-10T14:05:09-03:00</dhEvento><tpEvento>110111</tpEvento>"#,
                    r#"<nSeqEvento>1</nSeqEvento><detEvento versaoEvento="1.00"><evCancBPe>"#,
                    r#"<descEvento>Cancelamento</descEvento><nProt>135190000000001</nProt>"#,
                    r#"<xJust>Passageiro desistiu da viagem</xJust></evCancBPe></detEvento>"#,
                    r#"</infEvento></eventoBPe>"#
                ),
                key = KEY
            )
        );
    }

    #[test]
    fn justification_sanitized_and_truncated() {
        let detail = EventDetail::NoBoarding {
            protocol: "1".to_string(),
            justification: format!("Ônibus <quebrado> & {}", "x".repeat(300)),
        };
        let xml = build_event_request(&config(), &key(), &detail, 1, &at()).unwrap();
        let start = xml.find("<xJust>").unwrap() + "<xJust>".len();
        let end = xml.find("</xJust>").unwrap();
        let just = &xml[start..end];
        assert!(just.starts_with("Onibus quebrado e x"));
        assert!(just.chars().count() <= 255);
        assert!(xml.contains("<descEvento>Não Embarque</descEvento>"));
        assert!(xml.contains("<evNaoEmbBPe>"));
    }

    #[test]
    fn seat_change_with_sequence() {
        let detail = EventDetail::SeatChange {
            protocol: "9".to_string(),
            seat: "42".to_string(),
        };
        let xml = build_event_request(&config(), &key(), &detail, 3, &at()).unwrap();
        assert!(xml.contains(&format!(r#"Id="ID110116{KEY}03""#)));
        assert!(xml.contains("<nSeqEvento>3</nSeqEvento>"));
        assert!(xml.contains(
            "<evAlteracaoPoltrona><descEvento>Alteração Poltrona</descEvento><nProt>9</nProt><poltrona>42</poltrona></evAlteracaoPoltrona>"
        ));
    }

    #[test]
    fn sequence_bounds() {
        let detail = EventDetail::SeatChange {
            protocol: "9".to_string(),
            seat: "1".to_string(),
        };
        for bad in [0, 100] {
            assert!(matches!(
                build_event_request(&config(), &key(), &detail, bad, &at()),
                Err(SefazError::InvalidSequence(n)) if n == bad
            ));
        }
        assert!(build_event_request(&config(), &key(), &detail, 99, &at()).is_ok());
    }

    #[test]
    fn id_layout() {
        let id = event_id(EventKind::Cancellation, &key(), 7);
        assert_eq!(id.len(), 2 + 6 + 44 + 2);
        assert!(id.ends_with("07"));
    }
}
