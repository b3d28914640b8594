//! YubiKey PIV attestation doğrulayıcısı (`step` formatı).
//!
//! Zincir Yubico PIV Root CA Serial 263751'e (veya yapılandırılmış köklere)
//! bağlanır. Anahtar sahipliği, key authorization değeri üzerindeki imzayla
//! kanıtlanır; imza WebAuthn önerisine uygun olarak CBOR kodludur.

use p256::ecdsa::signature::Verifier as _;
use rsa::BigUint;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use x509_parser::der_parser::asn1_rs::{oid, Oid};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer as _;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use ostiary_x509::{key_fingerprint, verify_chain, TrustAnchors};

use crate::attestation::{split_x5c, AttestationData, AttestationObject, YUBICO_PIV_ROOT_CA};
use crate::challenge::Challenge;
use crate::error::{AcmeError, ProblemType};
use crate::jwk::AccountJwk;
use crate::validation::{key_authorization, ValidationContext};

/// YubiKey seri numarasını taşıyan uzantı.
/// <https://developers.yubico.com/PIV/Introduction/PIV_attestation.html>
const OID_YUBICO_SERIAL_NUMBER: Oid<'static> = oid!(1.3.6.1.4.1.41482.3.7);

const OID_EC_PRIME256V1: Oid<'static> = oid!(1.2.840.10045.3.1.7);
const OID_ED25519: Oid<'static> = oid!(1.3.101.112);

/// Step attestation'dan çıkarılan veriler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepAttestationData {
    /// YubiKey seri numarası, ondalık gösterim.
    pub serial_number: Option<String>,
    /// Yaprak anahtarın hex SHA-256 parmak izi.
    pub fingerprint: String,
}

#[derive(Debug, Deserialize)]
struct StepStatement {
    x5c: Vec<Vec<u8>>,
    sig: Vec<u8>,
}

pub(crate) fn verify(
    ctx: &ValidationContext<'_>,
    challenge: &Challenge,
    jwk: &AccountJwk,
    attestation: &AttestationObject,
) -> Result<AttestationData, AcmeError> {
    let roots = match ctx.provisioner.attestation_roots() {
        Some(roots) => roots,
        None => TrustAnchors::from_pem(YUBICO_PIV_ROOT_CA)
            .map_err(|err| AcmeError::server_internal(format!("error parsing root ca: {err}")))?,
    };

    let statement: StepStatement = attestation.statement()?;
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

    // İmza CBOR byte-string olarak sarılıdır.
    // https://w3c.github.io/webauthn/#sctn-signature-attestation-types
    let sig: Vec<u8> = ciborium::de::from_reader(statement.sig.as_slice()).map_err(|_| {
        AcmeError::new(ProblemType::BadAttestationStatement, "sig is malformed")
    })?;

    let (_, leaf) = X509Certificate::from_der(leaf_der).map_err(|err| {
        AcmeError::new(
            ProblemType::BadAttestationStatement,
            format!("x5c is malformed: {err}"),
        )
    })?;

    let key_auth = key_authorization(&challenge.token, jwk);
    verify_key_authorization_signature(leaf.public_key(), key_auth.as_bytes(), &sig)?;

    let mut data = StepAttestationData {
        serial_number: None,
        fingerprint: key_fingerprint(leaf.public_key().raw),
    };
    for ext in leaf.extensions() {
        if ext.oid != OID_YUBICO_SERIAL_NUMBER {
            continue;
        }
        let serial = parse_der_integer_u64(ext.value).ok_or_else(|| {
            AcmeError::new(
                ProblemType::BadAttestationStatement,
                "error parsing serial number",
            )
        })?;
        data.serial_number = Some(serial.to_string());
        break;
    }

    Ok(AttestationData::Step(data))
}

/// Yaprak anahtar türüne göre key authorization imzasını doğrular:
/// ECDSA yalnızca P-256 ile, RSA PKCS#1 v1.5 SHA-256 ile, Ed25519 ön özet
/// olmadan.
fn verify_key_authorization_signature(
    spki: &SubjectPublicKeyInfo<'_>,
    message: &[u8],
    sig: &[u8],
) -> Result<(), AcmeError> {
    let signature_failed = || {
        AcmeError::new(
            ProblemType::BadAttestationStatement,
            "failed to validate signature",
        )
    };
    match spki.parsed() {
        Ok(PublicKey::EC(point)) => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|params| params.as_oid().ok());
            if curve != Some(OID_EC_PRIME256V1) {
                return Err(AcmeError::new(
                    ProblemType::BadAttestationStatement,
                    "unsupported elliptic curve",
                ));
            }
            let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point.data())
                .map_err(|_| signature_failed())?;
            let signature =
                p256::ecdsa::DerSignature::try_from(sig).map_err(|_| signature_failed())?;
            verifying_key
                .verify(message, &signature)
                .map_err(|_| signature_failed())
        }
        Ok(PublicKey::RSA(rsa_key)) => {
            let public_key = rsa::RsaPublicKey::new(
                BigUint::from_bytes_be(rsa_key.modulus),
                BigUint::from_bytes_be(rsa_key.exponent),
            )
            .map_err(|_| signature_failed())?;
            let digest: [u8; 32] = Sha256::digest(message).into();
            public_key
                .verify(rsa::Pkcs1v15Sign::new::<Sha256>(), &digest, sig)
                .map_err(|_| signature_failed())
        }
        _ if spki.algorithm.algorithm == OID_ED25519 => {
            let key_bytes: [u8; 32] = spki
                .subject_public_key
                .data
                .as_ref()
                .try_into()
                .map_err(|_| signature_failed())?;
            let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes)
                .map_err(|_| signature_failed())?;
            let signature =
                ed25519_dalek::Signature::from_slice(sig).map_err(|_| signature_failed())?;
            ed25519_dalek::Verifier::verify(&verifying_key, message, &signature)
                .map_err(|_| signature_failed())
        }
        _ => Err(AcmeError::new(
            ProblemType::BadAttestationStatement,
            "unsupported public key type",
        )),
    }
}

/// DER kodlu, negatif olmayan, u64'e sığan bir INTEGER çözer; artık bayt
/// kabul edilmez.
fn parse_der_integer_u64(value: &[u8]) -> Option<u64> {
    if value.len() < 3 || value[0] != 0x02 {
        return None;
    }
    let len = usize::from(value[1]);
    if len == 0 || len > 0x7f || value.len() != 2 + len {
        return None;
    }
    let mut bytes = &value[2..];
    if bytes[0] & 0x80 != 0 {
        // Negatif seri numarası olmaz.
        return None;
    }
    if bytes[0] == 0 && bytes.len() > 1 {
        bytes = &bytes[1..];
    }
    if bytes.len() > 8 {
        return None;
    }
    let mut out: u64 = 0;
    for byte in bytes {
        out = (out << 8) | u64::from(*byte);
    }
    Some(out)
}
