//! SEFAZ web services used for BP-e.

use std::fmt;

use bpe_core::constants::PORTAL_NAMESPACE;
use bpe_core::Uf;

use crate::config::Environment;

/// A BP-e web service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Ticket submission.
    Recepcao,
    /// Submission receipt status.
    RetRecepcao,
    /// Ticket status by key.
    Consulta,
    /// Event submission.
    RecepcaoEvento,
}

impl Service {
    /// Service name as published in the WSDL.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recepcao => "BPeRecepcao",
            Self::RetRecepcao => "BPeRetRecepcao",
            Self::Consulta => "BPeConsulta",
            Self::RecepcaoEvento => "BPeRecepcaoEvento",
        }
    }

    /// Namespace of the `bpeDadosMsg` envelope.
    pub fn namespace(&self) -> String {
        format!("{PORTAL_NAMESPACE}/wsdl/{}", self.name())
    }

    /// Root element checked by the schema validator, when the request has one.
    pub fn schema(&self) -> Option<&'static str> {
        match self {
            Self::Recepcao => None,
            Self::RetRecepcao => Some("consReciBPe"),
            Self::Consulta => Some("consSitBPe"),
            Self::RecepcaoEvento => Some("eventoBPe"),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Routing data handed to the transport with each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    /// Target service.
    pub service: Service,
    /// UF whose authorizer receives the call.
    pub uf: Uf,
    /// Environment of the call.
    pub environment: Environment,
}

impl ServiceCall {
    /// Envelope wrapping `message` for this service.
    pub fn envelope(&self, message: &str) -> String {
        format!(
            r#"<bpeDadosMsg xmlns="{}">{message}</bpeDadosMsg>"#,
            self.service.namespace()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wsdl_namespace() {
        assert_eq!(
            Service::RecepcaoEvento.namespace(),
            "http://www.portalfiscal.inf.br/bpe/wsdl/BPeRecepcaoEvento"
        );
    }

    #[test]
    fn envelope_wraps_message() {
        let call = ServiceCall {
            service: Service::Consulta,
            uf: Uf::SP,
            environment: Environment::Homologation,
        };
        assert_eq!(
            call.envelope("<x/>"),
            r#"<bpeDadosMsg xmlns="http://www.portalfiscal.inf.br/bpe/wsdl/BPeConsulta"><x/></bpeDadosMsg>"#
        );
    }
}
