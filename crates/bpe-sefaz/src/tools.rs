//! # SEFAZ Request Facade
//!
//! `SefazTools` turns issuer intentions (submit a ticket, query a receipt or
//! key, register an event) into `bpeDadosMsg` requests and hands them to
//! the configured [`Transport`]. The last request and response are kept for
//! the caller; merging them into a processed document is the job of
//! `bpe-protocol`.
//!
//! Ticket submission is compressed:
//!
//! ```text
//! strip <?xml?> → gzip (level 9) → base64 → <bpeDadosMsg xmlns=wsdl>…</bpeDadosMsg>
//! ```
//!
//! Every other message is sent as plain XML inside the envelope.

use std::io::Write;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bpe_core::constants::PORTAL_NAMESPACE;
use bpe_core::strings::{clear_xml_string, strip_declaration};
use bpe_core::{DocumentKey, Element, Uf};
use chrono::{DateTime, FixedOffset, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;

use crate::collaborator::{SchemaValidator, Signer, Transport};
use crate::config::{Environment, SefazConfig};
use crate::error::SefazError;
use crate::events::{build_event_request, EventDetail};
use crate::service::{Service, ServiceCall};

/// Name of the single request parameter.
pub const MESSAGE_PARAM: &str = "bpeDadosMsg";

/// Builds, signs, validates, and sends SEFAZ requests.
pub struct SefazTools {
    config: SefazConfig,
    signer: Arc<dyn Signer>,
    transport: Arc<dyn Transport>,
    validator: Arc<dyn SchemaValidator>,
    last_request: Mutex<Option<String>>,
    last_response: Mutex<Option<String>>,
}

impl std::fmt::Debug for SefazTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SefazTools")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SefazTools {
    /// Wire the collaborators.
    pub fn new(
        config: SefazConfig,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn Transport>,
        validator: Arc<dyn SchemaValidator>,
    ) -> Self {
        Self {
            config,
            signer,
            transport,
            validator,
            last_request: Mutex::new(None),
            last_response: Mutex::new(None),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SefazConfig {
        &self.config
    }

    /// Last message sent, uncompressed and without envelope.
    pub fn last_request(&self) -> Option<String> {
        self.last_request.lock().clone()
    }

    /// Last raw response.
    pub fn last_response(&self) -> Option<String> {
        self.last_response.lock().clone()
    }

    fn call(&self, service: Service, uf: Uf, environment: Environment) -> ServiceCall {
        ServiceCall {
            service,
            uf,
            environment,
        }
    }

    fn dispatch(
        &self,
        call: &ServiceCall,
        message: String,
        body: String,
    ) -> Result<String, SefazError> {
        *self.last_request.lock() = Some(message.clone());
        let response = self
            .transport
            .send(call, &body, &[(MESSAGE_PARAM, message.as_str())])?;
        *self.last_response.lock() = Some(response.clone());
        tracing::info!(service = %call.service, uf = %call.uf, "request sent");
        Ok(response)
    }

    /// UF of `key`, which must be the configured one.
    pub fn key_uf(&self, key: &DocumentKey) -> Result<Uf, SefazError> {
        let uf = Uf::from_code(key.uf_code()).ok_or(SefazError::UnknownKeyUf(key.uf_code()))?;
        if uf != self.config.uf {
            return Err(SefazError::KeyUfMismatch {
                key_uf: key.uf_code(),
                configured: self.config.uf.to_string(),
            });
        }
        Ok(uf)
    }

    /// Submit a signed ticket for authorization.
    pub fn send_batch(&self, signed_xml: &str) -> Result<String, SefazError> {
        let message = strip_declaration(signed_xml).to_string();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(message.as_bytes())?;
        let compressed = STANDARD.encode(encoder.finish()?);

        let call = self.call(Service::Recepcao, self.config.uf, self.config.environment);
        let body = call.envelope(&compressed);
        tracing::debug!(bytes = message.len(), compressed = compressed.len(), "batch compressed");
        self.dispatch(&call, message, body)
    }

    fn plain(
        &self,
        service: Service,
        uf: Uf,
        environment: Environment,
        message: String,
    ) -> Result<String, SefazError> {
        if let Some(schema) = service.schema() {
            self.validator.validate(&self.config.version, &message, schema)?;
        }
        let call = self.call(service, uf, environment);
        let body = call.envelope(&message);
        self.dispatch(&call, message, body)
    }

    fn consult_root(&self, name: &str, environment: Environment) -> Element {
        let mut el = Element::new(name)
            .with_attr("xmlns", PORTAL_NAMESPACE)
            .with_attr("versao", self.config.version.as_str());
        el.push_text("tpAmb", environment.to_string());
        el
    }

    /// Status of a submission by receipt number.
    pub fn consult_receipt(
        &self,
        receipt: &str,
        environment: Option<Environment>,
    ) -> Result<String, SefazError> {
        let environment = environment.unwrap_or(self.config.environment);
        let mut request = self.consult_root("consReciBPe", environment);
        request.push_text("nRec", receipt.trim());
        self.plain(
            Service::RetRecepcao,
            self.config.uf,
            environment,
            request.to_xml()?,
        )
    }

    /// Status of a ticket by key, asked to the UF the key belongs to.
    pub fn consult_key(
        &self,
        key: &DocumentKey,
        environment: Option<Environment>,
    ) -> Result<String, SefazError> {
        let uf = Uf::from_code(key.uf_code()).ok_or(SefazError::UnknownKeyUf(key.uf_code()))?;
        let environment = environment.unwrap_or(self.config.environment);
        let mut request = self.consult_root("consSitBPe", environment);
        request.push_text("xServ", "CONSULTAR");
        request.push_text("chBPe", key.as_str());
        self.plain(Service::Consulta, uf, environment, request.to_xml()?)
    }

    /// Register an event stamped with `issued_at`.
    pub fn event_at(
        &self,
        key: &DocumentKey,
        detail: &EventDetail,
        sequence: u32,
        issued_at: &DateTime<FixedOffset>,
    ) -> Result<String, SefazError> {
        let uf = self.key_uf(key)?;
        let request = build_event_request(&self.config, key, detail, sequence, issued_at)?;
        let signed = self
            .signer
            .sign(&request, "infEvento", "Id", &self.config.signing)?;
        let cleaned = clear_xml_string(&signed, true);
        self.plain(Service::RecepcaoEvento, uf, self.config.environment, cleaned)
    }

    /// Register an event stamped with the local time.
    pub fn event(
        &self,
        key: &DocumentKey,
        detail: &EventDetail,
        sequence: u32,
    ) -> Result<String, SefazError> {
        let now = Local::now();
        self.event_at(key, detail, sequence, &now.with_timezone(now.offset()))
    }

    /// Cancel an authorized ticket.
    pub fn cancel(
        &self,
        key: &DocumentKey,
        justification: &str,
        protocol: &str,
    ) -> Result<String, SefazError> {
        let detail = EventDetail::Cancellation {
            protocol: protocol.to_string(),
            justification: justification.to_string(),
        };
        self.event(key, &detail, 1)
    }

    /// Report that the passenger did not board.
    pub fn no_boarding(
        &self,
        key: &DocumentKey,
        justification: &str,
        protocol: &str,
    ) -> Result<String, SefazError> {
        let detail = EventDetail::NoBoarding {
            protocol: protocol.to_string(),
            justification: justification.to_string(),
        };
        self.event(key, &detail, 1)
    }

    /// Report a seat change; each change of the same ticket takes the next
    /// `sequence`.
    pub fn seat_change(
        &self,
        key: &DocumentKey,
        seat: &str,
        protocol: &str,
        sequence: u32,
    ) -> Result<String, SefazError> {
        let detail = EventDetail::SeatChange {
            protocol: protocol.to_string(),
            seat: seat.to_string(),
        };
        self.event(key, &detail, sequence)
    }
}
