//! Configuration files and event requests through the public API.

use std::io::Write;
use std::sync::Arc;

use bpe_core::{DocumentKey, KeyFields, Uf, XmlDocument};
use bpe_sefaz::{
    build_event_request, ConfigError, Environment, EventDetail, MockSigner, MockTransport,
    MockValidator, SefazConfig, SefazTools,
};
use chrono::{FixedOffset, TimeZone};
use proptest::prelude::*;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn load_yaml_file() {
    let file = write_temp(
        ".yaml",
        "environment: production\nuf: BA\ncnpj: \"12345678000195\"\nqrcode_url: https://example.test/qr\n",
    );
    let config = SefazConfig::load(file.path()).unwrap();
    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.uf, Uf::BA);
    assert_eq!(config.version, "1.00");
    assert_eq!(config.qrcode_url, "https://example.test/qr");
}

#[test]
fn load_json_file() {
    let file = write_temp(".json", r#"{"uf": "PE", "cnpj": "12345678000195"}"#);
    let config = SefazConfig::load(file.path()).unwrap();
    assert_eq!(config.uf, Uf::PE);
    assert_eq!(config.environment, Environment::Homologation);
}

#[test]
fn load_rejects_invalid_cnpj() {
    let file = write_temp(".yml", "uf: SP\ncnpj: \"1234\"\n");
    assert!(matches!(
        SefazConfig::load(file.path()),
        Err(ConfigError::Invalid { name: "cnpj", .. })
    ));
}

#[test]
fn load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SefazConfig::load(&dir.path().join("absent.yaml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn signed_event_parses_and_keeps_id() {
    let key = KeyFields {
        uf_code: 31,
        year: 23,
        month: 5,
        tax_id: "12345678000195".to_string(),
        model: 63,
        series: 1,
        number: 77,
        emission_type: 1,
        numeric_code: 12345678,
    }
    .derive()
    .unwrap();
    let transport = Arc::new(MockTransport::new("<retEnvEvento/>"));
    let tools = SefazTools::new(
        SefazConfig::new(Environment::Homologation, Uf::MG, "12345678000195"),
        Arc::new(MockSigner::new("abc")),
        transport.clone(),
        Arc::new(MockValidator::accepting()),
    );
    tools.cancel(&key, "Viagem cancelada", "131230000000001").unwrap();

    let request = tools.last_request().unwrap();
    let doc = XmlDocument::parse(request.as_str()).unwrap();
    let inf = doc.find("infEvento").unwrap();
    assert_eq!(inf.attr("Id"), Some(format!("ID110111{key}01").as_str()));
    assert_eq!(inf.child_text("cOrgao"), Some("31"));
    assert!(doc.find("DigestValue").is_some());
    assert_eq!(tools.last_response().as_deref(), Some("<retEnvEvento/>"));
}

proptest! {
    /// Any justification yields a parseable request whose xJust is bounded
    /// and made of the allowed alphabet.
    #[test]
    fn justification_always_safe(just in "\\PC{0,400}") {
        let config = SefazConfig::new(Environment::Homologation, Uf::SP, "12345678000195");
        let key = DocumentKey::new("35190112345678000195630010000001231456789013").unwrap();
        let at = FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2019, 1, 10, 10, 0, 0)
            .unwrap();
        let detail = EventDetail::Cancellation { protocol: "1".to_string(), justification: just };
        let xml = build_event_request(&config, &key, &detail, 1, &at).unwrap();
        let doc = XmlDocument::parse(xml.as_str()).unwrap();
        let text = doc.find("xJust").map(|e| e.text().to_string()).unwrap_or_default();
        prop_assert!(text.chars().count() <= 255);
        prop_assert!(text.chars().all(|c| c.is_ascii_alphanumeric()
            || c == ' '
            || bpe_core::strings::ALLOWED_PUNCTUATION.contains(c)));
    }
}
