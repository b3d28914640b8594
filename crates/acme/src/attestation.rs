//! Device attestation formatları ve ortak doğrulama yardımcıları.
//!
//! `device-attest-01` payload'ındaki CBOR attestation nesnesi buradaki
//! format doğrulayıcılarına dağıtılır. Her format kendi şema struct'ına
//! çözülür; tip hataları `badAttestationStatement` olarak raporlanır.

#![allow(clippy::module_name_repetitions)]

pub mod apple;
pub mod step;
pub mod tpm;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer as _;

use crate::error::{AcmeError, Identifier, ProblemType, Subproblem};

pub use apple::AppleAttestationData;
pub use step::StepAttestationData;
pub use tpm::TpmAttestationData;

/// CBOR kodlu attestation nesnesi: `{"fmt": string, "attStmt": map}`.
#[derive(Debug, Deserialize)]
pub(crate) struct AttestationObject {
    /// Attestation format adı.
    #[serde(rename = "fmt")]
    pub format: String,
    /// Format'a özgü attestation ifadesi.
    #[serde(rename = "attStmt")]
    pub att_stmt: ciborium::Value,
}

impl AttestationObject {
    /// `attStmt` alanını format şemasına çözer.
    pub(crate) fn statement<T: DeserializeOwned>(&self) -> Result<T, AcmeError> {
        let malformed = |err: &dyn std::fmt::Display| {
            AcmeError::new(
                ProblemType::BadAttestationStatement,
                format!("attestation statement is malformed: {err}"),
            )
        };
        let mut encoded = Vec::new();
        ciborium::ser::into_writer(&self.att_stmt, &mut encoded)
            .map_err(|err| malformed(&err))?;
        ciborium::de::from_reader(encoded.as_slice()).map_err(|err| malformed(&err))
    }
}

/// The verified result of a format-specific attestation check.
///
/// Each variant carries what its format can attest: the fingerprint of the
/// attested key, the hardware identifier(s), and a challenge-bound nonce
/// when the format supplies one. The dispatcher consumes this uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationData {
    /// Apple enterprise attestation sonucu.
    Apple(AppleAttestationData),
    /// YubiKey PIV attestation sonucu.
    Step(StepAttestationData),
    /// TPM key certification sonucu.
    Tpm(TpmAttestationData),
}

impl AttestationData {
    /// Attest edilen anahtarın hex SHA-256 parmak izini döndürür.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        match self {
            Self::Apple(data) => &data.fingerprint,
            Self::Step(data) => &data.fingerprint,
            Self::Tpm(data) => &data.fingerprint,
        }
    }

    /// Format bir nonce taşıyorsa döndürür; `SHA256(token)` ile sabit
    /// zamanlı karşılaştırılır.
    #[must_use]
    pub fn nonce(&self) -> Option<&[u8]> {
        match self {
            Self::Apple(data) => data.nonce.as_deref(),
            Self::Step(_) | Self::Tpm(_) => None,
        }
    }

    /// Challenge identifier'ı bu formatın attest ettiği donanım kimliğiyle
    /// eşleşiyor mu kontrol eder. `tpm` formatı kimlik bağlamaz ve her
    /// değeri kabul eder.
    #[must_use]
    pub fn matches_identifier(&self, value: &str) -> bool {
        match self {
            Self::Apple(data) => {
                data.udid.as_deref() == Some(value) || data.serial_number.as_deref() == Some(value)
            }
            Self::Step(data) => data.serial_number.as_deref() == Some(value),
            Self::Tpm(_) => true,
        }
    }

    /// Identifier eşleşmediğinde kaydedilecek hatayı üretir.
    #[must_use]
    pub fn identifier_mismatch_error(&self, value: &str) -> AcmeError {
        let err = AcmeError::new(
            ProblemType::BadAttestationStatement,
            "permanent identifier does not match",
        );
        match self {
            Self::Step(data) => {
                let attested = data.serial_number.as_deref().unwrap_or_default();
                err.with_subproblem(Subproblem::with_identifier(
                    ProblemType::Malformed,
                    Identifier::new("permanent-identifier", value),
                    format!(
                        "challenge identifier {value:?} doesn't match the attested hardware identifier {attested:?}"
                    ),
                ))
            }
            Self::Apple(_) | Self::Tpm(_) => err,
        }
    }
}

/// `x5c` dizisini yaprak + ara sertifikalar olarak böler ve yaprağın
/// ayrıştırılabildiğini doğrular.
pub(crate) fn split_x5c(x5c: &[Vec<u8>]) -> Result<(&[u8], &[Vec<u8>]), AcmeError> {
    let (leaf, intermediates) = x5c.split_first().ok_or_else(|| {
        AcmeError::new(ProblemType::RejectedIdentifier, "x5c is empty")
    })?;
    X509Certificate::from_der(leaf).map_err(|err| {
        AcmeError::new(
            ProblemType::BadAttestationStatement,
            format!("x5c is malformed: {err}"),
        )
    })?;
    Ok((leaf.as_slice(), intermediates))
}

/// Apple Enterprise Attestation Root CA.
/// <https://www.apple.com/certificateauthority/private/>
pub(crate) const APPLE_ENTERPRISE_ATTESTATION_ROOT_CA: &str = "-----BEGIN CERTIFICATE-----
MIICJDCCAamgAwIBAgIUQsDCuyxyfFxeq/bxpm8frF15hzcwCgYIKoZIzj0EAwMw
UTEtMCsGA1UEAwwkQXBwbGUgRW50ZXJwcmlzZSBBdHRlc3RhdGlvbiBSb290IENB
MRMwEQYDVQQKDApBcHBsZSBJbmMuMQswCQYDVQQGEwJVUzAeFw0yMjAyMTYxOTAx
MjRaFw00NzAyMjAwMDAwMDBaMFExLTArBgNVBAMMJEFwcGxlIEVudGVycHJpc2Ug
QXR0ZXN0YXRpb24gUm9vdCBDQTETMBEGA1UECgwKQXBwbGUgSW5jLjELMAkGA1UE
BhMCVVMwdjAQBgcqhkjOPQIBBgUrgQQAIgNiAAT6Jigq+Ps9Q4CoT8t8q+UnOe2p
oT9nRaUfGhBTbgvqSGXPjVkbYlIWYO+1zPk2Sz9hQ5ozzmLrPmTBgEWRcHjA2/y7
7GEicps9wn2tj+G89l3INNDKETdxSPPIZpPj8VmjQjBAMA8GA1UdEwEB/wQFMAMB
Af8wHQYDVR0OBBYEFPNqTQGd8muBpV5du+UIbVbi+d66MA4GA1UdDwEB/wQEAwIB
BjAKBggqhkjOPQQDAwNpADBmAjEA1xpWmTLSpr1VH4f8Ypk8f3jMUKYz4QPG8mL5
8m9sX/b2+eXpTv2pH4RZgJjucnbcAjEA4ZSB6S45FlPuS/u4pTnzoz632rA+xW/T
ZwFEh9bhKjJ+5VQ9/Do1os0u3LEkgN/r
-----END CERTIFICATE-----";

/// Yubico PIV Root CA Serial 263751.
/// <https://developers.yubico.com/PIV/Introduction/piv-attestation-ca.pem>
pub(crate) const YUBICO_PIV_ROOT_CA: &str = "-----BEGIN CERTIFICATE-----
MIIDFzCCAf+gAwIBAgIDBAZHMA0GCSqGSIb3DQEBCwUAMCsxKTAnBgNVBAMMIFl1
YmljbyBQSVYgUm9vdCBDQSBTZXJpYWwgMjYzNzUxMCAXDTE2MDMxNDAwMDAwMFoY
DzIwNTIwNDE3MDAwMDAwWjArMSkwJwYDVQQDDCBZdWJpY28gUElWIFJvb3QgQ0Eg
U2VyaWFsIDI2Mzc1MTCCASIwDQYJKoZIhvcNAQEBBQADggEPADCCAQoCggEBAMN2
cMTNR6YCdcTFRxuPy31PabRn5m6pJ+nSE0HRWpoaM8fc8wHC+Tmb98jmNvhWNE2E
ilU85uYKfEFP9d6Q2GmytqBnxZsAa3KqZiCCx2LwQ4iYEOb1llgotVr/whEpdVOq
joU0P5e1j1y7OfwOvky/+AXIN/9Xp0VFlYRk2tQ9GcdYKDmqU+db9iKwpAzid4oH
BVLIhmD3pvkWaRA2H3DA9t7H/HNq5v3OiO1jyLZeKqZoMbPObrxqDg+9fOdShzgf
wCqgT3XVmTeiwvBSTctyi9mHQfYd2DwkaqxRnLbNVyK9zl+DzjSGp9IhVPiVtGet
X02dxhQnGS7K6BO0Qe8CAwEAAaNCMEAwHQYDVR0OBBYEFMpfyvLEojGc6SJf8ez0
1d8Cv4O/MA8GA1UdEwQIMAYBAf8CAQEwDgYDVR0PAQH/BAQDAgEGMA0GCSqGSIb3
DQEBCwUAA4IBAQBc7Ih8Bc1fkC+FyN1fhjWioBCMr3vjneh7MLbA6kSoyWF70N3s
XhbXvT4eRh0hvxqvMZNjPU/VlRn6gLVtoEikDLrYFXN6Hh6Wmyy1GTnspnOvMvz2
lLKuym9KYdYLDgnj3BeAvzIhVzzYSeU77/Cupofj093OuAswW0jYvXsGTyix6B3d
bW5yWvyS9zNXaqGaUmP3U9/b6DlHdDogMLu3VLpBB9bm5bjaKWWJYgWltCVgUbFq
Fqyi4+JE014cSgR57Jcu3dZiehB6UtAPgad9L5cNvua/IWRmm+ANy3O2LH++Pyl8
SREzU8onbBsjMg9QDiSf5oJLKvd/Ren+zGY7
-----END CERTIFICATE-----";
