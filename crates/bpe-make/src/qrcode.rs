//! # QR-Code Supplement
//!
//! After signing, a BP-e receives `infBPeSupl/qrCodBPe` holding the public
//! consultation URL. The group sits between `infBPe` and `Signature`. The
//! signature covers `infBPe` only, so the supplement is spliced into the
//! signed text right before `<Signature`; every other byte is kept.

use bpe_core::constants::{root, KEY_ID_PREFIX, QRCODE_BASE_URL};
use bpe_core::{DocumentKey, Element, XmlDocument};
use url::Url;

use crate::error::AssemblyError;

/// Consultation endpoint used when no other is configured.
pub const DEFAULT_QRCODE_URL: &str = QRCODE_BASE_URL;

/// Consultation URL for a key and environment (`tpAmb`).
pub fn qrcode_url(base: &str, key: &DocumentKey, environment: &str) -> Result<String, AssemblyError> {
    let url = Url::parse_with_params(base, &[("chBPe", key.as_str()), ("tpAmb", environment)])
        .map_err(|e| AssemblyError::invalid("qrCodBPe", e.to_string()))?;
    Ok(url.to_string())
}

/// Insert the QR-code supplement into a signed BP-e.
///
/// # Errors
///
/// Fails when the document has no `infBPe/@Id`, no `ide/tpAmb`, no
/// `Signature`, or already carries an `infBPeSupl`.
pub fn put_qr_tag(signed_xml: &str, base_url: &str) -> Result<String, AssemblyError> {
    let doc = XmlDocument::parse(signed_xml)?;
    if doc.find(root::INF_BPE_SUPL).is_some() {
        return Err(AssemblyError::invalid(root::INF_BPE_SUPL, "already present"));
    }
    let inf = doc
        .find(root::INF_BPE)
        .ok_or_else(|| AssemblyError::missing(root::INF_BPE, root::BPE))?;
    let id = inf
        .attr("Id")
        .ok_or_else(|| AssemblyError::missing("Id", root::INF_BPE))?;
    let key = DocumentKey::new(id.trim_start_matches(KEY_ID_PREFIX))?;
    let environment = inf
        .find("ide")
        .and_then(|ide| ide.child_text("tpAmb"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AssemblyError::missing("tpAmb", "ide"))?;
    let signature = doc
        .find(root::SIGNATURE)
        .ok_or_else(|| AssemblyError::invalid(root::SIGNATURE, "document is not signed"))?;

    let mut supplement = Element::new(root::INF_BPE_SUPL);
    supplement.push_cdata("qrCodBPe", qrcode_url(base_url, &key, environment)?);
    let fragment = supplement.to_xml()?;

    let at = signature.span().start;
    let source = doc.source();
    tracing::debug!(key = %key, "inserting QR-code supplement");
    Ok(format!("{}{}{}", &source[..at], fragment, &source[at..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "35190112345678000195630010000001231456789013";

    fn signed() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><BPe xmlns="http://www.portalfiscal.inf.br/bpe"><infBPe Id="BPe{KEY}" versao="1.00"><ide><tpAmb>2</tpAmb></ide></infBPe><Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo/></Signature></BPe>"#
        )
    }

    #[test]
    fn url_shape() {
        let key = DocumentKey::new(KEY).unwrap();
        assert_eq!(
            qrcode_url(DEFAULT_QRCODE_URL, &key, "2").unwrap(),
            format!("https://dfe-portal.svrs.rs.gov.br/bpe/qrCode?chBPe={KEY}&tpAmb=2")
        );
    }

    #[test]
    fn inserted_before_signature() {
        let out = put_qr_tag(&signed(), DEFAULT_QRCODE_URL).unwrap();
        let expected = format!(
            "</infBPe><infBPeSupl><qrCodBPe><![CDATA[https://dfe-portal.svrs.rs.gov.br/bpe/qrCode?chBPe={KEY}&tpAmb=2]]></qrCodBPe></infBPeSupl><Signature"
        );
        assert!(out.contains(&expected));
        // Everything else untouched.
        let removed = out.replace(
            &expected,
            "</infBPe><Signature",
        );
        assert_eq!(removed, signed());
    }

    #[test]
    fn unsigned_rejected() {
        let xml = signed().replace(r#"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo/></Signature>"#, "");
        assert!(matches!(
            put_qr_tag(&xml, DEFAULT_QRCODE_URL),
            Err(AssemblyError::InvalidField { .. })
        ));
    }

    #[test]
    fn second_insert_rejected() {
        let once = put_qr_tag(&signed(), DEFAULT_QRCODE_URL).unwrap();
        assert!(put_qr_tag(&once, DEFAULT_QRCODE_URL).is_err());
    }
}
