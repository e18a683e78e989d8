// ── Certificate authority and user certificate records ──
//
// Only the records are modelled here. Key generation and signing belong to
// the certificate subsystem behind `CertificateIssuer`.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::entity_id::EntityId;

/// RSA key lengths offered when creating a user certificate.
pub const RSA_KEY_LENGTHS: &[u32] = &[1024, 2048, 3072, 4096, 6144, 7680, 8192, 15360, 16384];

/// Elliptic curves offered when creating a user certificate.
pub const EC_CURVES: &[&str] = &[
    "prime256v1",
    "secp384r1",
    "secp521r1",
    "secp224r1",
    "secp256k1",
    "brainpoolP256r1",
    "brainpoolP384r1",
    "brainpoolP512r1",
];

pub const DEFAULT_KEY_LENGTH: u32 = 2048;
pub const DEFAULT_CURVE: &str = "prime256v1";
pub const DEFAULT_LIFETIME_DAYS: u32 = 3650;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum KeyType {
    #[default]
    Rsa,
    Ecdsa,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DigestAlgorithm {
    Sha1,
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

/// Private key parameters of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KeySpec {
    Rsa { bits: u32 },
    Ecdsa { curve: String },
}

/// Distinguished-name parts; empty parts are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistinguishedName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_alt_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateAuthority {
    pub refid: EntityId,
    pub descr: String,
    /// Whether the CA holds its private key and can therefore sign.
    #[serde(default)]
    pub has_private_key: bool,
    #[serde(default)]
    pub subject: DistinguishedName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub refid: EntityId,
    pub descr: String,
    pub caref: EntityId,
    /// Certificate purpose, `user` for user certificates.
    pub kind: String,
    pub key: KeySpec,
    pub digest: DigestAlgorithm,
    pub lifetime_days: u32,
    pub subject: DistinguishedName,
    /// PEM body, filled in once the CA subsystem has signed the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crt: Option<String>,
    #[serde(default)]
    pub revoked: bool,
}

/// Subject alternative name for a common name: IP literals become `IP:`,
/// anything else is treated as `DNS:`.
pub fn alt_name_for(common_name: &str) -> Option<String> {
    if common_name.is_empty() {
        return None;
    }
    if common_name.parse::<std::net::IpAddr>().is_ok() {
        Some(format!("IP:{common_name}"))
    } else if common_name.contains('@') {
        Some(format!("email:{common_name}"))
    } else {
        Some(format!("DNS:{common_name}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn key_type_parses_case_insensitively() {
        assert_eq!("ecdsa".parse::<KeyType>().unwrap(), KeyType::Ecdsa);
        assert_eq!(KeyType::Rsa.to_string(), "RSA");
    }

    #[test]
    fn digest_defaults_to_sha256() {
        assert_eq!(DigestAlgorithm::default().to_string(), "sha256");
    }

    #[test]
    fn alt_name_kinds() {
        assert_eq!(alt_name_for("alice").as_deref(), Some("DNS:alice"));
        assert_eq!(alt_name_for("10.0.0.1").as_deref(), Some("IP:10.0.0.1"));
        assert_eq!(alt_name_for("a@b.c").as_deref(), Some("email:a@b.c"));
        assert_eq!(alt_name_for(""), None);
    }
}
