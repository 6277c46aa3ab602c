//! # Cancellation Register
//!
//! Marks an authorized ticket (`bpeProc`) as canceled once an accepted
//! cancellation event for its key turns up among event results. The
//! protocol's `cStat`, `nProt`, and `xMotivo` are rewritten in place by
//! splicing new text over their byte ranges; the signed `BPe` is left as is.
//!
//! This is a convenience for keeping a local copy in sync. SEFAZ holds the
//! authoritative status, so when no matching event is found the document is
//! returned unchanged rather than reported as an error.

use std::ops::Range;

use bpe_core::constants::{root, status};
use bpe_core::strings::clear_protocoled_xml;
use bpe_core::xml::escape_text;
use bpe_core::{EventKind, ParsedElement, XmlDocument};

use crate::error::ProtocolError;
use crate::fragment::ProtocolFragment;

/// A qualifying cancellation found among event results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationMatch {
    /// Protocol number of the cancellation event.
    pub protocol_number: String,
    /// Status under which it was accepted.
    pub status: String,
}

/// First accepted cancellation of `key` among `event_responses`.
pub fn find_cancellation<S: AsRef<str>>(
    key: &str,
    event_responses: &[S],
) -> Result<Option<CancellationMatch>, ProtocolError> {
    for response in event_responses {
        let doc = XmlDocument::parse(response.as_ref())?;
        for ret in doc.find_all(root::RET_EVENTO_BPE) {
            let fragment = ProtocolFragment::from_event_result(ret)?;
            let accepted = status::CANCELLATION_ACCEPTED.contains(&fragment.status.as_str());
            let is_cancellation = fragment.event() == Some(EventKind::Cancellation);
            let same_key = fragment.key.as_deref() == Some(key);
            if accepted && is_cancellation && same_key {
                return Ok(Some(CancellationMatch {
                    protocol_number: fragment.protocol_number.unwrap_or_default(),
                    status: fragment.status,
                }));
            }
        }
    }
    Ok(None)
}

/// Replacement that sets the text of `el` to `text`.
fn set_text(doc: &XmlDocument, el: &ParsedElement, text: &str) -> (Range<usize>, String) {
    let escaped = escape_text(text);
    if doc.raw(el).ends_with("/>") {
        let name = el.name();
        (el.span(), format!("<{name}>{escaped}</{name}>"))
    } else {
        (el.content(), escaped)
    }
}

/// Apply the first accepted cancellation found in `event_responses`.
///
/// # Errors
///
/// [`ProtocolError::NotAuthorized`] when the document has no `protBPe`.
pub fn apply_cancellation<S: AsRef<str>>(
    composed: &str,
    event_responses: &[S],
) -> Result<String, ProtocolError> {
    let doc = XmlDocument::parse(composed)?;
    let prot = doc.find(root::PROT_BPE).ok_or(ProtocolError::NotAuthorized)?;
    let key = prot
        .find("chBPe")
        .map(|k| k.text().trim().to_string())
        .ok_or_else(|| ProtocolError::MissingElement {
            element: "chBPe",
            document: root::PROT_BPE.to_string(),
        })?;

    let Some(found) = find_cancellation(&key, event_responses)? else {
        tracing::warn!(key = %key, "no accepted cancellation event for ticket; document unchanged");
        return Ok(composed.to_string());
    };

    let field = |name: &'static str| {
        prot.find(name).ok_or_else(|| ProtocolError::MissingElement {
            element: name,
            document: root::PROT_BPE.to_string(),
        })
    };
    let mut edits = vec![
        set_text(&doc, field("cStat")?, status::CANCELED),
        set_text(&doc, field("nProt")?, &found.protocol_number),
        set_text(&doc, field("xMotivo")?, status::CANCELED_REASON),
    ];
    edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));

    let mut patched = doc.source().to_string();
    for (range, text) in edits {
        patched.replace_range(range, &text);
    }

    tracing::info!(
        key = %key,
        protocol = %found.protocol_number,
        event_status = %found.status,
        "ticket marked as canceled"
    );
    Ok(clear_protocoled_xml(&patched))
}
