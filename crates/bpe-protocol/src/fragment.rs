//! # Protocol Fragments
//!
//! Typed views over the SEFAZ outcome elements: `protBPe/infProt` for a
//! ticket and `retEventoBPe/infEvento` for an event. Values are read as
//! text exactly as returned; the digest in particular is compared byte for
//! byte, without normalization.

use bpe_core::constants::{root, MISSING_DIGEST};
use bpe_core::{EventKind, ParsedElement};

use crate::error::ProtocolError;

/// Outcome issued by SEFAZ for a ticket or an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolFragment {
    /// `cStat`.
    pub status: String,
    /// `xMotivo`.
    pub reason: String,
    /// `nProt`, absent on rejections.
    pub protocol_number: Option<String>,
    /// `digVal`, [`MISSING_DIGEST`] when absent.
    pub digest: String,
    /// `chBPe` the outcome refers to.
    pub key: Option<String>,
    /// `tpEvento` text, for event results.
    pub event_code: Option<String>,
}

fn text(group: &ParsedElement, name: &str) -> Option<String> {
    group.find(name).map(|e| e.text().trim().to_string())
}

fn raw_text(group: &ParsedElement, name: &str) -> Option<String> {
    group.find(name).map(|e| e.text().to_string())
}

fn required(group: &ParsedElement, name: &'static str) -> Result<String, ProtocolError> {
    text(group, name).ok_or_else(|| ProtocolError::MissingElement {
        element: name,
        document: group.name().to_string(),
    })
}

impl ProtocolFragment {
    /// Read from a `protBPe` element.
    pub fn from_protocol(prot: &ParsedElement) -> Result<Self, ProtocolError> {
        let inf = prot.find(root::INF_PROT).unwrap_or(prot);
        Ok(Self {
            status: required(inf, "cStat")?,
            reason: text(inf, "xMotivo").unwrap_or_default(),
            protocol_number: text(inf, "nProt"),
            digest: raw_text(inf, "digVal").unwrap_or_else(|| MISSING_DIGEST.to_string()),
            key: text(inf, "chBPe"),
            event_code: None,
        })
    }

    /// Read from a `retEventoBPe` element.
    pub fn from_event_result(ret: &ParsedElement) -> Result<Self, ProtocolError> {
        let inf = ret.find("infEvento").unwrap_or(ret);
        Ok(Self {
            status: required(inf, "cStat")?,
            reason: text(inf, "xMotivo").unwrap_or_default(),
            protocol_number: text(inf, "nProt"),
            digest: raw_text(inf, "digVal").unwrap_or_else(|| MISSING_DIGEST.to_string()),
            key: text(inf, "chBPe"),
            event_code: text(inf, "tpEvento"),
        })
    }

    /// Known event this result refers to, if any.
    pub fn event(&self) -> Option<EventKind> {
        self.event_code.as_deref().and_then(EventKind::from_code)
    }

    /// `Err(Rejected)` unless the status equals `expected`.
    pub fn require_status(&self, expected: &str) -> Result<(), ProtocolError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(ProtocolError::Rejected {
                code: self.status.clone(),
                reason: self.reason.clone(),
            })
        }
    }
}
