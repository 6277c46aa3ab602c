//! # External Collaborators
//!
//! Certificate signing, SOAP transport, and XSD validation live outside
//! this workspace. [`SefazTools`](crate::SefazTools) reaches them only
//! through these traits, so deployments wire real implementations and
//! tests wire the recording mocks below.

use parking_lot::Mutex;

use crate::config::SigningProfile;
use crate::error::SefazError;
use crate::service::ServiceCall;

/// XML-DSig enveloped signer holding the issuer certificate.
pub trait Signer: Send + Sync {
    /// Sign the element named `tag` whose identifier attribute is `id_attr`
    /// with the algorithm and canonicalization in `profile`, returning the
    /// document with its `Signature` appended.
    fn sign(
        &self,
        xml: &str,
        tag: &str,
        id_attr: &str,
        profile: &SigningProfile,
    ) -> Result<String, SefazError>;
}

/// Delivers a request body to a SEFAZ web service.
pub trait Transport: Send + Sync {
    /// Send `body` (the `bpeDadosMsg` envelope) and return the raw response.
    /// `params` carries the uncompressed message under `bpeDadosMsg`.
    fn send(
        &self,
        call: &ServiceCall,
        body: &str,
        params: &[(&str, &str)],
    ) -> Result<String, SefazError>;
}

/// Validates a request against its XSD.
pub trait SchemaValidator: Send + Sync {
    /// Validate `xml` against the schema of `schema` for layout `version`.
    fn validate(&self, version: &str, xml: &str, schema: &str) -> Result<(), SefazError>;
}

// ─── Mocks ──────────────────────────────────────────────────────────────

/// One call seen by [`MockSigner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignCall {
    /// Signed element.
    pub tag: String,
    /// Identifier attribute of the signed element.
    pub id_attr: String,
    /// Algorithm and canonicalization requested.
    pub profile: SigningProfile,
}

/// Signer that appends a placeholder `Signature` carrying a fixed digest.
#[derive(Debug)]
pub struct MockSigner {
    digest: String,
    calls: Mutex<Vec<SignCall>>,
}

impl MockSigner {
    /// Signer whose `DigestValue` is `digest`.
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<SignCall> {
        self.calls.lock().clone()
    }
}

impl Signer for MockSigner {
    fn sign(
        &self,
        xml: &str,
        tag: &str,
        id_attr: &str,
        profile: &SigningProfile,
    ) -> Result<String, SefazError> {
        self.calls.lock().push(SignCall {
            tag: tag.to_string(),
            id_attr: id_attr.to_string(),
            profile: *profile,
        });
        let close = xml.rfind("</").ok_or_else(|| SefazError::Signing {
            reason: "document has no closing root tag".to_string(),
        })?;
        let signature = format!(
            "\n<Signature xmlns=\"http://www.w3.org/2000/09/xmldsig#\"><SignedInfo><CanonicalizationMethod Algorithm=\"{}\"/><SignatureMethod Algorithm=\"{}\"/><DigestMethod Algorithm=\"{}\"/><DigestValue>{}</DigestValue></SignedInfo><SignatureValue>bW9jaw==</SignatureValue></Signature>\n",
            profile.canonicalization.uri(),
            profile.algorithm.signature_uri(),
            profile.algorithm.digest_uri(),
            self.digest
        );
        let mut signed = xml.to_string();
        signed.insert_str(close, &signature);
        Ok(signed)
    }
}

/// One request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    /// Target service.
    pub call: ServiceCall,
    /// Envelope body.
    pub body: String,
    /// Parameter map as owned pairs.
    pub params: Vec<(String, String)>,
}

/// Transport that records requests and answers with a canned response.
#[derive(Debug)]
pub struct MockTransport {
    response: String,
    sent: Mutex<Vec<SentRequest>>,
}

impl MockTransport {
    /// Transport answering every request with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Requests sent so far.
    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().clone()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        call: &ServiceCall,
        body: &str,
        params: &[(&str, &str)],
    ) -> Result<String, SefazError> {
        self.sent.lock().push(SentRequest {
            call: call.clone(),
            body: body.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Ok(self.response.clone())
    }
}

/// Validator that accepts everything and remembers the schema names.
#[derive(Debug, Default)]
pub struct MockValidator {
    reject: Option<String>,
    schemas: Mutex<Vec<String>>,
}

impl MockValidator {
    /// Validator accepting every document.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Validator rejecting every document with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            reject: Some(reason.into()),
            schemas: Mutex::new(Vec::new()),
        }
    }

    /// Schemas validated so far.
    pub fn schemas(&self) -> Vec<String> {
        self.schemas.lock().clone()
    }
}

impl SchemaValidator for MockValidator {
    fn validate(&self, _version: &str, _xml: &str, schema: &str) -> Result<(), SefazError> {
        self.schemas.lock().push(schema.to_string());
        match &self.reject {
            Some(reason) => Err(SefazError::Validation {
                schema: schema.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}
