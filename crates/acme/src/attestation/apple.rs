//! Apple enterprise attestation doğrulayıcısı.
//!
//! `attStmt.x5c` zinciri Apple Enterprise Attestation Root CA'ya (veya
//! yapılandırılmış köklere) bağlanır; cihaz kimlikleri ve nonce yaprak
//! sertifikanın özel uzantılarından okunur.

use serde::Deserialize;
use x509_parser::der_parser::asn1_rs::{oid, Oid};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer as _;

use ostiary_x509::{key_fingerprint, verify_chain, TrustAnchors};

use crate::attestation::{
    split_x5c, AttestationData, AttestationObject, APPLE_ENTERPRISE_ATTESTATION_ROOT_CA,
};
use crate::error::{AcmeError, ProblemType};
use crate::validation::ValidationContext;

const OID_APPLE_SERIAL_NUMBER: Oid<'static> = oid!(1.2.840.113635.100.8.9.1);
const OID_APPLE_UDID: Oid<'static> = oid!(1.2.840.113635.100.8.9.2);
const OID_APPLE_SEP_OS_VERSION: Oid<'static> = oid!(1.2.840.113635.100.8.10.2);
const OID_APPLE_NONCE: Oid<'static> = oid!(1.2.840.113635.100.8.11.1);

/// Apple attestation'dan çıkarılan cihaz verileri.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleAttestationData {
    /// Challenge token özetine bağlanan nonce.
    pub nonce: Option<Vec<u8>>,
    /// Cihaz seri numarası.
    pub serial_number: Option<String>,
    /// Apple Unique Device Identifier.
    pub udid: Option<String>,
    /// Secure Enclave işlemcisinin OS sürümü.
    pub sep_version: Option<String>,
    /// Yaprak anahtarın hex SHA-256 parmak izi.
    pub fingerprint: String,
}

#[derive(Debug, Deserialize)]
struct AppleStatement {
    x5c: Vec<Vec<u8>>,
}

pub(crate) fn verify(
    ctx: &ValidationContext<'_>,
    attestation: &AttestationObject,
) -> Result<AttestationData, AcmeError> {
    let roots = match ctx.provisioner.attestation_roots() {
        Some(roots) => roots,
        None => TrustAnchors::from_pem(APPLE_ENTERPRISE_ATTESTATION_ROOT_CA).map_err(|err| {
            AcmeError::server_internal(format!("error parsing apple enterprise ca: {err}"))
        })?,
    };

    let statement: AppleStatement = attestation.statement()?;
    let (leaf_der, intermediates) = split_x5c(&statement.x5c)?;

    verify_chain(
        leaf_der,
        intermediates,
        &roots,
        ctx.clock.now_truncated(),
        &[],
    )
    .map_err(|err| {
        AcmeError::new(
            ProblemType::BadAttestationStatement,
            format!("x5c is not valid: {err}"),
        )
    })?;

    let (_, leaf) = X509Certificate::from_der(leaf_der).map_err(|err| {
        AcmeError::new(
            ProblemType::BadAttestationStatement,
            format!("x5c is malformed: {err}"),
        )
    })?;

    let mut data = AppleAttestationData {
        nonce: None,
        serial_number: None,
        udid: None,
        sep_version: None,
        fingerprint: key_fingerprint(leaf.public_key().raw),
    };
    for ext in leaf.extensions() {
        // Apple bu uzantıların değerlerini ham bayt olarak yazar; DER
        // sarmalaması yoktur.
        if ext.oid == OID_APPLE_SERIAL_NUMBER {
            data.serial_number = Some(String::from_utf8_lossy(ext.value).into_owned());
        } else if ext.oid == OID_APPLE_UDID {
            data.udid = Some(String::from_utf8_lossy(ext.value).into_owned());
        } else if ext.oid == OID_APPLE_SEP_OS_VERSION {
            data.sep_version = Some(String::from_utf8_lossy(ext.value).into_owned());
        } else if ext.oid == OID_APPLE_NONCE {
            data.nonce = Some(ext.value.to_vec());
        }
    }

    Ok(AttestationData::Apple(data))
}
