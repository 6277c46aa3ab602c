//! # Protocol Merger
//!
//! Joins a signed request with the SEFAZ outcome that answers it:
//!
//! | Request root | Response element | Accepted `cStat` | Composed root |
//! |--------------|------------------|------------------|---------------|
//! | `BPe`        | `protBPe`        | 100              | `bpeProc`     |
//! | `eventoBPe`  | `retEventoBPe`   | 135              | per event type, see [`EventKind::proc_element`] |
//!
//! The composed document is plain concatenation of the two source
//! fragments, cut out of their documents by byte span. The signed request
//! is therefore carried over byte for byte.

use bpe_core::constants::{root, status, KEY_ID_PREFIX, PORTAL_NAMESPACE, XML_DECLARATION};
use bpe_core::{EventKind, ParsedElement, XmlDocument};

use crate::error::ProtocolError;
use crate::fragment::ProtocolFragment;

/// Kind of request that can receive a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `BPe`.
    Ticket,
    /// `eventoBPe`.
    Event,
}

impl RequestKind {
    /// Classify by root element name.
    pub fn classify(root_name: &str) -> Result<Self, ProtocolError> {
        match root_name {
            root::BPE => Ok(Self::Ticket),
            root::EVENTO_BPE => Ok(Self::Event),
            other => Err(ProtocolError::UnsupportedDocument {
                root: other.to_string(),
            }),
        }
    }
}

/// Wrap two serialized fragments under `node`.
pub fn join(node: &str, version: &str, first: &str, second: &str) -> String {
    format!(
        r#"{XML_DECLARATION}<{node} versao="{version}" xmlns="{PORTAL_NAMESPACE}">{first}{second}</{node}>"#
    )
}

/// Merge a signed request with its SEFAZ response.
///
/// # Errors
///
/// See [`ProtocolError`]: unsupported request root, absent protocol,
/// non-accepting status, digest mismatch, unknown event type.
pub fn merge_authorization(request: &str, response: &str) -> Result<String, ProtocolError> {
    let req = XmlDocument::parse(request)?;
    let resp = XmlDocument::parse(response)?;
    match RequestKind::classify(req.root().name())? {
        RequestKind::Ticket => merge_ticket(&req, &resp),
        RequestKind::Event => merge_event(&req, &resp),
    }
}

fn missing(element: &'static str, document: &ParsedElement) -> ProtocolError {
    ProtocolError::MissingElement {
        element,
        document: document.name().to_string(),
    }
}

/// The `protBPe` answering `key`, or the first one.
fn select_protocol<'a>(resp: &'a XmlDocument, key: &str) -> Result<&'a ParsedElement, ProtocolError> {
    let candidates = resp.find_all(root::PROT_BPE);
    let first = candidates.first().copied().ok_or(ProtocolError::MissingProtocol {
        element: root::PROT_BPE,
    })?;
    let matching = candidates.iter().copied().find(|prot| {
        prot.find("chBPe")
            .map(|k| k.text().trim() == key)
            .unwrap_or(false)
    });
    Ok(matching.unwrap_or(first))
}

fn merge_ticket(req: &XmlDocument, resp: &XmlDocument) -> Result<String, ProtocolError> {
    let bpe = req.root();
    let inf = bpe
        .find(root::INF_BPE)
        .ok_or_else(|| missing(root::INF_BPE, bpe))?;
    let version = inf
        .attr("versao")
        .ok_or_else(|| missing("versao", inf))?;
    let key = inf
        .attr("Id")
        .map(|id| id.trim_start_matches(KEY_ID_PREFIX))
        .unwrap_or_default();
    let digest = bpe
        .find("DigestValue")
        .map(ParsedElement::text)
        .ok_or_else(|| missing("DigestValue", bpe))?;

    let prot = select_protocol(resp, key)?;
    let fragment = ProtocolFragment::from_protocol(prot)?;
    fragment.require_status(status::AUTHORIZED)?;
    if digest != fragment.digest {
        return Err(ProtocolError::DigestMismatch {
            request: digest.to_string(),
            response: fragment.digest,
        });
    }

    tracing::info!(
        key = %key,
        protocol = fragment.protocol_number.as_deref().unwrap_or_default(),
        "ticket authorization merged"
    );
    Ok(join(root::BPE_PROC, version, req.raw(bpe), resp.raw(prot)))
}

fn merge_event(req: &XmlDocument, resp: &XmlDocument) -> Result<String, ProtocolError> {
    let event = req.root();
    let version = event
        .attr("versao")
        .ok_or_else(|| missing("versao", event))?;
    let ret = resp
        .find(root::RET_EVENTO_BPE)
        .ok_or(ProtocolError::MissingProtocol {
            element: root::RET_EVENTO_BPE,
        })?;
    let fragment = ProtocolFragment::from_event_result(ret)?;

    let code = fragment
        .event_code
        .clone()
        .or_else(|| event.find("tpEvento").map(|t| t.text().trim().to_string()))
        .unwrap_or_default();
    let kind = EventKind::from_code(&code).ok_or(ProtocolError::UnsupportedEvent { code })?;
    fragment.require_status(status::EVENT_REGISTERED)?;

    tracing::info!(
        event = %kind,
        protocol = fragment.protocol_number.as_deref().unwrap_or_default(),
        "event result merged"
    );
    Ok(join(kind.proc_element(), version, req.raw(event), resp.raw(ret)))
}
