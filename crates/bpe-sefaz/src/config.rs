//! # Issuer Configuration
//!
//! Settings shared by every SEFAZ request: environment (`tpAmb`), issuer
//! UF and CNPJ, layout version, and the QR-code consultation URL.
//!
//! Sources, in the order the binary tries them:
//!
//! - a YAML or JSON file ([`SefazConfig::load`]);
//! - environment variables ([`SefazConfig::from_env`]):
//!
//! | Variable         | Field         | Default            |
//! |------------------|---------------|--------------------|
//! | `BPE_TP_AMB`     | `environment` | `2` (homologation) |
//! | `BPE_UF`         | `uf`          | required           |
//! | `BPE_CNPJ`       | `cnpj`        | required           |
//! | `BPE_VERSION`    | `version`     | `1.00`             |
//! | `BPE_QRCODE_URL` | `qrcode_url`  | SVRS portal        |
//! | `BPE_SIGNATURE_ALGORITHM` | `signing.algorithm` | `sha1` |
//! | `BPE_CANONICALIZATION` | `signing.canonicalization` | `c14n` |

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bpe_core::constants::{width, LAYOUT_VERSION, QRCODE_BASE_URL};
use bpe_core::Uf;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// SEFAZ environment (`tpAmb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// `1`: documents with fiscal effect.
    Production,
    /// `2`: testing, no fiscal effect.
    #[default]
    Homologation,
}

impl Environment {
    /// `tpAmb` code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Production => 1,
            Self::Homologation => 2,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    /// Accepts `1`/`2` or `production`/`homologation`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "production" => Ok(Self::Production),
            "2" | "homologation" => Ok(Self::Homologation),
            other => Err(ConfigError::Invalid {
                name: "BPE_TP_AMB",
                reason: format!("expected 1 or 2, got {other:?}"),
            }),
        }
    }
}

/// Digest and signature algorithm of the XML-DSig signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// RSA-SHA1, required by the BP-e 1.00 layout.
    #[default]
    Sha1,
    /// RSA-SHA256.
    Sha256,
}

impl SignatureAlgorithm {
    /// `SignatureMethod/@Algorithm`.
    pub fn signature_uri(&self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            Self::Sha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
        }
    }

    /// `DigestMethod/@Algorithm`.
    pub fn digest_uri(&self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            Self::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(ConfigError::Invalid {
                name: "BPE_SIGNATURE_ALGORITHM",
                reason: format!("expected sha1 or sha256, got {other:?}"),
            }),
        }
    }
}

/// Canonicalization applied to `SignedInfo` and the signed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Canonicalization {
    /// Inclusive C14N 1.0 without comments.
    #[default]
    #[serde(rename = "c14n")]
    Inclusive,
    /// Inclusive C14N 1.0 with comments.
    #[serde(rename = "c14n-with-comments")]
    InclusiveWithComments,
    /// Exclusive C14N without comments.
    #[serde(rename = "exc-c14n")]
    Exclusive,
    /// Exclusive C14N with comments.
    #[serde(rename = "exc-c14n-with-comments")]
    ExclusiveWithComments,
}

impl Canonicalization {
    /// `CanonicalizationMethod/@Algorithm`.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => "http://www.w3.org/TR/2001/REC-xml-c14n-20010315",
            Self::InclusiveWithComments => {
                "http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments"
            }
            Self::Exclusive => "http://www.w3.org/2001/10/xml-exc-c14n#",
            Self::ExclusiveWithComments => "http://www.w3.org/2001/10/xml-exc-c14n#WithComments",
        }
    }

    /// Whether the canonical form is exclusive.
    pub fn exclusive(&self) -> bool {
        matches!(self, Self::Exclusive | Self::ExclusiveWithComments)
    }

    /// Whether comments survive canonicalization.
    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments | Self::ExclusiveWithComments)
    }
}

impl FromStr for Canonicalization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c14n" => Ok(Self::Inclusive),
            "c14n-with-comments" => Ok(Self::InclusiveWithComments),
            "exc-c14n" => Ok(Self::Exclusive),
            "exc-c14n-with-comments" => Ok(Self::ExclusiveWithComments),
            other => Err(ConfigError::Invalid {
                name: "BPE_CANONICALIZATION",
                reason: format!("unknown canonicalization {other:?}"),
            }),
        }
    }
}

/// How the [`Signer`](crate::Signer) signs requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningProfile {
    /// `sha1` or `sha256`.
    #[serde(default)]
    pub algorithm: SignatureAlgorithm,
    /// `c14n`, `c14n-with-comments`, `exc-c14n` or `exc-c14n-with-comments`.
    #[serde(default)]
    pub canonicalization: Canonicalization,
}

fn default_version() -> String {
    LAYOUT_VERSION.to_string()
}

fn default_qrcode_url() -> String {
    QRCODE_BASE_URL.to_string()
}

/// Issuer-wide settings for SEFAZ requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SefazConfig {
    /// `tpAmb` of every request.
    #[serde(default)]
    pub environment: Environment,
    /// Issuer UF; events are refused for keys of other units.
    pub uf: Uf,
    /// Issuer CNPJ, 14 digits.
    pub cnpj: String,
    /// Layout version written to `versao`.
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL of the QR-code consultation page.
    #[serde(default = "default_qrcode_url")]
    pub qrcode_url: String,
    /// Algorithm and canonicalization handed to the signer.
    #[serde(default)]
    pub signing: SigningProfile,
}

impl SefazConfig {
    /// Configuration with default version and QR-code URL.
    pub fn new(environment: Environment, uf: Uf, cnpj: impl Into<String>) -> Self {
        Self {
            environment,
            uf,
            cnpj: cnpj.into(),
            version: default_version(),
            qrcode_url: default_qrcode_url(),
            signing: SigningProfile::default(),
        }
    }

    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match value("BPE_TP_AMB") {
            Some(v) => v.parse()?,
            None => Environment::default(),
        };
        let uf_text = value("BPE_UF").ok_or(ConfigError::Missing { name: "BPE_UF" })?;
        let uf = uf_text.parse::<Uf>().map_err(|e| {
            ConfigError::Invalid {
                name: "BPE_UF",
                reason: e.to_string(),
            }
        })?;
        let cnpj = value("BPE_CNPJ").ok_or(ConfigError::Missing { name: "BPE_CNPJ" })?;
        let signing = SigningProfile {
            algorithm: match value("BPE_SIGNATURE_ALGORITHM") {
                Some(v) => v.parse()?,
                None => SignatureAlgorithm::default(),
            },
            canonicalization: match value("BPE_CANONICALIZATION") {
                Some(v) => v.parse()?,
                None => Canonicalization::default(),
            },
        };

        let config = Self {
            environment,
            uf,
            cnpj: cnpj.trim().to_string(),
            version: value("BPE_VERSION").unwrap_or_else(default_version),
            qrcode_url: value("BPE_QRCODE_URL").unwrap_or_else(default_qrcode_url),
            signing,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            let config: Self = serde_json::from_str(&text)?;
            config.validate()?;
            Ok(config)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Check field formats.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cnpj_ok = self.cnpj.len() == width::KEY_TAX_ID
            && self.cnpj.bytes().all(|b| b.is_ascii_digit());
        if !cnpj_ok {
            return Err(ConfigError::Invalid {
                name: "cnpj",
                reason: format!("expected 14 digits, got {:?}", self.cnpj),
            });
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "version",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
