use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use x509_parser::der_parser::asn1_rs::{oid, Oid};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::anchors::TrustAnchors;

const OID_BASIC_CONSTRAINTS: Oid<'static> = oid!(2.5.29.19);
const OID_KEY_USAGE: Oid<'static> = oid!(2.5.29.15);
const OID_EXT_KEY_USAGE: Oid<'static> = oid!(2.5.29.37);
const OID_NAME_CONSTRAINTS: Oid<'static> = oid!(2.5.29.30);

/// Zincir doğrulaması sırasında oluşabilecek hatalar.
#[derive(Debug, Error)]
pub enum ChainVerifyError {
    /// Zincirdeki bir sertifika ayrıştırılamadı.
    #[error("sertifika ayrıştırılamadı: {0}")]
    Parse(String),
    /// İmza doğrulaması başarısız oldu.
    #[error("imza doğrulaması başarısız ({subject}): {message}")]
    Signature {
        /// İmzası doğrulanamayan sertifikanın subject değeri.
        subject: String,
        /// Kaynak hata mesajı.
        message: String,
    },
    /// Sertifikanın issuer adı, imzalayanın subject adıyla eşleşmiyor.
    #[error("issuer eşleşmiyor: {subject} sertifikasını {issuer} imzalamamış")]
    IssuerMismatch {
        /// Doğrulanan sertifikanın subject değeri.
        subject: String,
        /// Beklenen imzalayanın subject değeri.
        issuer: String,
    },
    /// Sertifika doğrulama anında geçerli değil.
    #[error("sertifika doğrulama anında geçerli değil: {subject}")]
    NotValidAt {
        /// Geçersiz sertifikanın subject değeri.
        subject: String,
    },
    /// Sertifika, doğrulayıcının işlemediği kritik bir uzantı taşıyor.
    #[error("işlenmeyen kritik uzantı {oid}: {subject}")]
    UnhandledCriticalExtension {
        /// Uzantıyı taşıyan sertifikanın subject değeri.
        subject: String,
        /// Kritik uzantının OID değeri.
        oid: String,
    },
    /// Zincir yapılandırılmış köklerden hiçbirine ulaşmıyor.
    #[error("zincir hiçbir kök sertifikaya ulaşmıyor")]
    NoMatchingAnchor,
}

/// Verifies an ordered certificate chain against a trust-anchor pool.
///
/// The chain is `leaf`, followed by zero or more intermediates in signing
/// order. Every certificate must be valid at `at`, every signature must
/// verify against its issuer, and the last element must be issued by (or be
/// identical to) one of the anchors. Extended key usage is deliberately not
/// constrained; attestation chains carry vendor-specific EKUs.
///
/// Critical extensions outside the handled set (basic constraints, key
/// usage, extended key usage, name constraints) are rejected unless their
/// OID appears in `allowed_critical`.
///
/// # Errors
///
/// Returns [`ChainVerifyError`] describing the first failing link.
pub fn verify_chain(
    leaf_der: &[u8],
    intermediates: &[Vec<u8>],
    anchors: &TrustAnchors,
    at: OffsetDateTime,
    allowed_critical: &[Oid<'_>],
) -> Result<(), ChainVerifyError> {
    let mut path: Vec<&[u8]> = Vec::with_capacity(intermediates.len() + 1);
    path.push(leaf_der);
    for der in intermediates {
        path.push(der.as_slice());
    }

    for der in &path {
        let (_, cert) = parse_certificate(der)?;
        check_validity(&cert, at)?;
        check_critical_extensions(&cert, allowed_critical)?;
    }

    for index in 0..path.len() - 1 {
        let (_, subject) = parse_certificate(path[index])?;
        let (_, issuer) = parse_certificate(path[index + 1])?;
        if subject.issuer() != issuer.subject() {
            return Err(ChainVerifyError::IssuerMismatch {
                subject: subject.subject().to_string(),
                issuer: issuer.subject().to_string(),
            });
        }
        subject
            .verify_signature(Some(issuer.public_key()))
            .map_err(|err| ChainVerifyError::Signature {
                subject: subject.subject().to_string(),
                message: err.to_string(),
            })?;
    }

    let last_der = path[path.len() - 1];
    let (_, last) = parse_certificate(last_der)?;
    for anchor_der in anchors.certs() {
        if anchor_der.as_slice() == last_der {
            // x5c zinciri kökün kendisiyle bitiyor.
            return last
                .verify_signature(None)
                .map_err(|err| ChainVerifyError::Signature {
                    subject: last.subject().to_string(),
                    message: err.to_string(),
                });
        }
        let (_, anchor) = parse_certificate(anchor_der)?;
        if anchor.subject() != last.issuer() {
            continue;
        }
        if last.verify_signature(Some(anchor.public_key())).is_ok() {
            check_validity(&anchor, at)?;
            return Ok(());
        }
    }

    Err(ChainVerifyError::NoMatchingAnchor)
}

/// Computes the lowercase hex SHA-256 fingerprint of a DER encoded
/// `SubjectPublicKeyInfo` structure.
#[must_use]
pub fn key_fingerprint(spki_der: &[u8]) -> String {
    hex::encode(Sha256::digest(spki_der))
}

fn parse_certificate(
    der: &[u8],
) -> Result<(&[u8], X509Certificate<'_>), ChainVerifyError> {
    X509Certificate::from_der(der).map_err(|err| ChainVerifyError::Parse(err.to_string()))
}

fn check_validity(cert: &X509Certificate<'_>, at: OffsetDateTime) -> Result<(), ChainVerifyError> {
    let validity = cert.validity();
    let not_before = validity.not_before.to_datetime();
    let not_after = validity.not_after.to_datetime();
    if at < not_before || at > not_after {
        return Err(ChainVerifyError::NotValidAt {
            subject: cert.subject().to_string(),
        });
    }
    Ok(())
}

fn check_critical_extensions(
    cert: &X509Certificate<'_>,
    allowed: &[Oid<'_>],
) -> Result<(), ChainVerifyError> {
    for ext in cert.extensions() {
        if !ext.critical {
            continue;
        }
        let handled = ext.oid == OID_BASIC_CONSTRAINTS
            || ext.oid == OID_KEY_USAGE
            || ext.oid == OID_EXT_KEY_USAGE
            || ext.oid == OID_NAME_CONSTRAINTS;
        if handled || allowed.iter().any(|oid| *oid == ext.oid) {
            continue;
        }
        return Err(ChainVerifyError::UnhandledCriticalExtension {
            subject: cert.subject().to_string(),
            oid: ext.oid.to_id_string(),
        });
    }
    Ok(())
}
