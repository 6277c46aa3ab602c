//! # Layout Constants
//!
//! Process-wide immutable data for the BP-e 1.00 layout: namespace, root
//! element names, SEFAZ status sentinels, fixed numeric widths, and text
//! length limits.

/// Namespace of every BP-e document and wrapper.
pub const PORTAL_NAMESPACE: &str = "http://www.portalfiscal.inf.br/bpe";

/// Layout version targeted by this crate (`versao` attribute).
pub const LAYOUT_VERSION: &str = "1.00";

/// Fiscal document model of the BP-e.
pub const MODEL_BPE: u8 = 63;

/// Declaration prepended to complete documents.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Prefix of the `infBPe/@Id` attribute.
pub const KEY_ID_PREFIX: &str = "BPe";

/// Public consultation endpoint embedded in `qrCodBPe` by default.
pub const QRCODE_BASE_URL: &str = "https://dfe-portal.svrs.rs.gov.br/bpe/qrCode";

/// Placeholder digest used when a protocol carries no `digVal`.
pub const MISSING_DIGEST: &str = "000";

/// SEFAZ status codes (`cStat`) the core reacts to.
pub mod status {
    /// Ticket authorized for use.
    pub const AUTHORIZED: &str = "100";
    /// Ticket canceled (written by the cancellation register).
    pub const CANCELED: &str = "101";
    /// Event registered and linked to the ticket.
    pub const EVENT_REGISTERED: &str = "135";
    /// Statuses under which a cancellation event counts as accepted.
    pub const CANCELLATION_ACCEPTED: [&str; 3] = ["135", "136", "155"];
    /// Reason text written alongside [`CANCELED`].
    pub const CANCELED_REASON: &str = "Cancelamento de BP-e homologado";
}

/// Root and wrapper element names.
pub mod root {
    /// Signed ticket document.
    pub const BPE: &str = "BPe";
    /// Ticket information group carrying `Id` and `versao`.
    pub const INF_BPE: &str = "infBPe";
    /// Signed event request.
    pub const EVENTO_BPE: &str = "eventoBPe";
    /// Event result returned by SEFAZ.
    pub const RET_EVENTO_BPE: &str = "retEventoBPe";
    /// Authorization protocol returned by SEFAZ.
    pub const PROT_BPE: &str = "protBPe";
    /// Protocol information group.
    pub const INF_PROT: &str = "infProt";
    /// Authorized ticket wrapper.
    pub const BPE_PROC: &str = "bpeProc";
    /// Supplementary information group (QR code).
    pub const INF_BPE_SUPL: &str = "infBPeSupl";
    /// XML-DSig signature element.
    pub const SIGNATURE: &str = "Signature";
}

/// Fixed zero-padded widths.
pub mod width {
    /// `cBP` numeric code.
    pub const NUMERIC_CODE: usize = 8;
    /// Series inside the document key.
    pub const KEY_SERIES: usize = 3;
    /// Document number inside the document key.
    pub const KEY_NUMBER: usize = 9;
    /// Issuer tax id inside the document key.
    pub const KEY_TAX_ID: usize = 14;
    /// Card installment count (`nParcelas`).
    pub const INSTALLMENTS: usize = 3;
    /// Event sequence number inside the event `Id`.
    pub const EVENT_SEQUENCE: usize = 2;
    /// Complete document key.
    pub const KEY: usize = 44;
}

/// Maximum text lengths, in characters.
pub mod limit {
    /// Contingency justification in `ide/xJust`.
    pub const CONTINGENCY_JUSTIFICATION: usize = 256;
    /// Event justification (cancellation, boarding denial).
    pub const EVENT_JUSTIFICATION: usize = 255;
    /// `infAdic/infAdFisco`.
    pub const FISCAL_INFO: usize = 2000;
    /// `infAdic/infCpl`.
    pub const COMPLEMENTARY_INFO: usize = 5000;
}
