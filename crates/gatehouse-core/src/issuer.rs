// ── Certificate issuing ──

use tracing::info;

use crate::error::CoreError;
use crate::model::cert::alt_name_for;
use crate::model::{
    Certificate, CertificateAuthority, DigestAlgorithm, DistinguishedName, EntityId, KeySpec,
};

/// Validated parameters for a new user certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueParams {
    pub descr: String,
    pub key: KeySpec,
    pub digest: DigestAlgorithm,
    pub lifetime_days: u32,
}

/// Creates user certificates signed by an internal CA.
pub trait CertificateIssuer: Send + Sync {
    fn issue(
        &self,
        ca: &CertificateAuthority,
        common_name: &str,
        params: &IssueParams,
    ) -> Result<Certificate, CoreError>;
}

/// Subject for a user certificate: location and organization from the CA,
/// common name and alternative name from the user.
pub fn user_subject(ca: &CertificateAuthority, common_name: &str) -> DistinguishedName {
    let inherit = |part: &Option<String>| part.clone().filter(|v| !v.is_empty());
    DistinguishedName {
        country: inherit(&ca.subject.country),
        state: inherit(&ca.subject.state),
        locality: inherit(&ca.subject.locality),
        organization: inherit(&ca.subject.organization),
        organizational_unit: inherit(&ca.subject.organizational_unit),
        common_name: Some(common_name.to_owned()),
        subject_alt_name: alt_name_for(common_name),
    }
}

/// Records the certificate request in the configuration. The PEM body is
/// filled in later by the CA subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalIssuer;

impl CertificateIssuer for LocalIssuer {
    fn issue(
        &self,
        ca: &CertificateAuthority,
        common_name: &str,
        params: &IssueParams,
    ) -> Result<Certificate, CoreError> {
        if !ca.has_private_key {
            return Err(CoreError::Internal(format!(
                "certificate authority {} cannot sign",
                ca.descr
            )));
        }
        let cert = Certificate {
            refid: EntityId::new(),
            descr: params.descr.clone(),
            caref: ca.refid,
            kind: "user".into(),
            key: params.key.clone(),
            digest: params.digest,
            lifetime_days: params.lifetime_days,
            subject: user_subject(ca, common_name),
            crt: None,
            revoked: false,
        };
        info!(cert = %cert.refid, ca = %ca.descr, cn = common_name, "certificate requested");
        Ok(cert)
    }
}
