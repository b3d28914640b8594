//! TPM 2.0 key certification doğrulayıcısı (`tpm` formatı).
//!
//! AK zinciri provisioner'ın yapılandırdığı köklere bağlanır; gömülü bir
//! varsayılan kök yoktur. Attest edilen anahtarın `pubArea` tanımı,
//! AK imzalı `certInfo` yapısına ad (name) üzerinden bağlanır ve
//! `certInfo.extraData` key authorization özetini taşımak zorundadır.
//!
//! Zincir için CRL/OCSP kontrolü yapılmaz; bilinen bir sınırlamadır.

use p256::ecdsa::signature::hazmat::PrehashVerifier as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq as _;
use thiserror::Error;
use x509_parser::der_parser::asn1_rs::{oid, Oid};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer as _;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use ostiary_x509::{key_fingerprint, verify_chain};

use crate::attestation::{AttestationData, AttestationObject};
use crate::challenge::Challenge;
use crate::error::{AcmeError, ProblemType};
use crate::jwk::AccountJwk;
use crate::validation::{key_auth_digest, ValidationContext};

const OID_SUBJECT_ALTERNATIVE_NAME: Oid<'static> = oid!(2.5.29.17);

const TPM_GENERATED_VALUE: u32 = 0xFF54_4347;
const TPM_ST_ATTEST_CERTIFY: u16 = 0x8017;
const TPM_ALG_RSA: u16 = 0x0001;
const TPM_ALG_SHA256: u16 = 0x000B;
const TPM_ALG_NULL: u16 = 0x0010;
const TPM_ALG_RSASSA: u16 = 0x0014;
const TPM_ALG_ECDSA: u16 = 0x0018;
const TPM_ALG_ECC: u16 = 0x0023;
const TPM_ECC_NIST_P256: u16 = 0x0003;

/// TPM attestation'dan çıkarılan veriler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmAttestationData {
    /// Attest edilen anahtarın hex SHA-256 parmak izi.
    pub fingerprint: String,
}

#[derive(Debug, Deserialize)]
struct TpmStatement {
    ver: String,
    alg: i64,
    x5c: Vec<Vec<u8>>,
    sig: Vec<u8>,
    #[serde(rename = "certInfo")]
    cert_info: Vec<u8>,
    #[serde(rename = "pubArea")]
    pub_area: Vec<u8>,
}

/// COSE `alg` değerinden seçilen sertifikasyon imza özeti.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CertificationHash {
    Sha256,
    /// EdDSA ön özet kullanmaz; TPMT_SIGNATURE düzeyinde desteklenmez.
    None,
}

pub(crate) fn verify(
    ctx: &ValidationContext<'_>,
    challenge: &Challenge,
    jwk: &AccountJwk,
    attestation: &AttestationObject,
) -> Result<AttestationData, AcmeError> {
    let bad = |detail: String| AcmeError::new(ProblemType::BadAttestationStatement, detail);

    let Some(roots) = ctx.provisioner.attestation_roots() else {
        return Err(AcmeError::server_internal(
            "failed getting tpm attestation root CAs",
        ));
    };

    let statement: TpmStatement = attestation.statement()?;
    if statement.ver != "2.0" {
        return Err(bad(format!("{:?} is not supported", statement.ver)));
    }
    let (leaf_der, intermediates) = match statement.x5c.split_first() {
        Some((leaf, rest)) => (leaf.as_slice(), rest),
        None => return Err(bad("x5c is empty".to_owned())),
    };

    // Yaprak, permanent-identifier / hardware-module-name taşıyan kritik bir
    // SAN içerebilir; zincir doğrulaması bunu reddetmemeli.
    verify_chain(
        leaf_der,
        intermediates,
        &roots,
        ctx.clock.now_truncated(),
        &[OID_SUBJECT_ALTERNATIVE_NAME],
    )
    .map_err(|err| bad(format!("x5c is not valid: {err}")))?;

    let hash = match statement.alg {
        -257 | -7 => CertificationHash::Sha256, // RS256 / ES256
        -8 => CertificationHash::None,          // EdDSA
        alg => {
            return Err(bad(format!("invalid alg {alg} in attestation statement")));
        }
    };

    let (_, leaf) = X509Certificate::from_der(leaf_der)
        .map_err(|err| bad(format!("x5c is malformed: {err}")))?;

    // Üretilen anahtarın sertifikasyon parametreleri AK public anahtarıyla
    // yeniden doğrulanır.
    verify_certification(
        leaf.public_key(),
        &statement.pub_area,
        &statement.cert_info,
        &statement.sig,
        hash,
    )
    .map_err(|err| bad(format!("invalid certification parameters: {err}")))?;

    let cert_info = TpmsAttest::parse(&statement.cert_info)
        .map_err(|err| bad(format!("failed decoding attestation data: {err}")))?;

    let expected_digest = key_auth_digest(&challenge.token, jwk);
    if !bool::from(expected_digest.ct_eq(&cert_info.extra_data)) {
        return Err(bad("key authorization does not match".to_owned()));
    }

    let public = TpmtPublic::parse(&statement.pub_area)
        .map_err(|err| bad(format!("failed decoding pubArea: {err}")))?;
    let spki = public
        .to_spki_der()
        .map_err(|err| bad(format!("failed getting public key: {err}")))?;

    Ok(AttestationData::Tpm(TpmAttestationData {
        fingerprint: key_fingerprint(&spki),
    }))
}

/// `(pubArea, certInfo, sig)` üçlüsünü AK public anahtarıyla doğrular:
/// certInfo'nun attest ettiği ad pubArea'nın adı olmalı ve imza certInfo
/// üzerinde geçerli olmalıdır.
fn verify_certification(
    ak: &SubjectPublicKeyInfo<'_>,
    pub_area: &[u8],
    cert_info: &[u8],
    sig: &[u8],
    hash: CertificationHash,
) -> Result<(), TpmWireError> {
    let signature = TpmtSignature::parse(sig)?;
    let attest = TpmsAttest::parse(cert_info)?;
    let public = TpmtPublic::parse(pub_area)?;

    if public.name_alg != TPM_ALG_SHA256 {
        return Err(TpmWireError::UnsupportedAlgorithm(public.name_alg));
    }
    let pub_area_digest: [u8; 32] = Sha256::digest(pub_area).into();
    let mut expected_name = Vec::with_capacity(34);
    expected_name.extend_from_slice(&TPM_ALG_SHA256.to_be_bytes());
    expected_name.extend_from_slice(&pub_area_digest);
    if attest.attested_name != expected_name {
        return Err(TpmWireError::NameMismatch);
    }

    let digest: [u8; 32] = match hash {
        CertificationHash::Sha256 => Sha256::digest(cert_info).into(),
        CertificationHash::None => return Err(TpmWireError::UnsupportedSignatureHash),
    };

    match signature {
        TpmtSignature::RsaSsa { signature } => {
            let Ok(PublicKey::RSA(rsa_key)) = ak.parsed() else {
                return Err(TpmWireError::SignatureKeyMismatch);
            };
            let public_key = rsa::RsaPublicKey::new(
                rsa::BigUint::from_bytes_be(rsa_key.modulus),
                rsa::BigUint::from_bytes_be(rsa_key.exponent),
            )
            .map_err(|err| TpmWireError::InvalidKey(err.to_string()))?;
            public_key
                .verify(rsa::Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
                .map_err(|_| TpmWireError::SignatureInvalid)
        }
        TpmtSignature::Ecdsa { r, s } => {
            let Ok(PublicKey::EC(point)) = ak.parsed() else {
                return Err(TpmWireError::SignatureKeyMismatch);
            };
            let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point.data())
                .map_err(|err| TpmWireError::InvalidKey(err.to_string()))?;
            let r = left_pad_32(&r).ok_or(TpmWireError::SignatureInvalid)?;
            let s = left_pad_32(&s).ok_or(TpmWireError::SignatureInvalid)?;
            let signature = p256::ecdsa::Signature::from_scalars(r, s)
                .map_err(|_| TpmWireError::SignatureInvalid)?;
            verifying_key
                .verify_prehash(&digest, &signature)
                .map_err(|_| TpmWireError::SignatureInvalid)
        }
    }
}

fn left_pad_32(bytes: &[u8]) -> Option<[u8; 32]> {
    let bytes = if bytes.len() > 32 && bytes[..bytes.len() - 32].iter().all(|b| *b == 0) {
        &bytes[bytes.len() - 32..]
    } else {
        bytes
    };
    if bytes.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Some(out)
}

/// TPM wire yapıları çözülürken oluşabilecek hatalar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
enum TpmWireError {
    #[error("truncated structure")]
    Truncated,
    #[error("trailing bytes after structure")]
    TrailingBytes,
    #[error("wrong TPM_GENERATED magic")]
    InvalidMagic,
    #[error("attestation type is not TPM_ST_ATTEST_CERTIFY")]
    NotCertify,
    #[error("unsupported TPM algorithm {0:#06x}")]
    UnsupportedAlgorithm(u16),
    #[error("unsupported TPM curve {0:#06x}")]
    UnsupportedCurve(u16),
    #[error("certified name does not match pubArea")]
    NameMismatch,
    #[error("unsupported signature hash")]
    UnsupportedSignatureHash,
    #[error("signature key type does not match signature algorithm")]
    SignatureKeyMismatch,
    #[error("signature verification failed")]
    SignatureInvalid,
    #[error("invalid public key: {0}")]
    InvalidKey(String),
}

/// Big-endian TPM wire formatı üzerinde ilerleyen okuyucu.
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TpmWireError> {
        if self.data.len() < n {
            return Err(TpmWireError::Truncated);
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, TpmWireError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, TpmWireError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32, TpmWireError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn u64(&mut self) -> Result<u64, TpmWireError> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// u16 uzunluk önekli TPM2B alanını okur.
    fn tpm2b(&mut self) -> Result<&'a [u8], TpmWireError> {
        let len = usize::from(self.u16()?);
        self.take(len)
    }

    fn finish(&self) -> Result<(), TpmWireError> {
        if self.data.is_empty() {
            Ok(())
        } else {
            Err(TpmWireError::TrailingBytes)
        }
    }
}

/// TPMT_PUBLIC'in bu doğrulamanın ihtiyaç duyduğu kesiti.
#[derive(Debug)]
struct TpmtPublic {
    name_alg: u16,
    key: TpmPublicKey,
}

#[derive(Debug)]
enum TpmPublicKey {
    Rsa { exponent: u32, modulus: Vec<u8> },
    Ecc { curve_id: u16, x: Vec<u8>, y: Vec<u8> },
}

impl TpmtPublic {
    fn parse(data: &[u8]) -> Result<Self, TpmWireError> {
        let mut reader = Reader::new(data);
        let type_alg = reader.u16()?;
        let name_alg = reader.u16()?;
        let _object_attributes = reader.u32()?;
        let _auth_policy = reader.tpm2b()?;

        let key = match type_alg {
            TPM_ALG_RSA => {
                let symmetric = reader.u16()?;
                if symmetric != TPM_ALG_NULL {
                    return Err(TpmWireError::UnsupportedAlgorithm(symmetric));
                }
                let scheme = reader.u16()?;
                if scheme != TPM_ALG_NULL {
                    let _scheme_hash = reader.u16()?;
                }
                let _key_bits = reader.u16()?;
                let exponent = reader.u32()?;
                let modulus = reader.tpm2b()?.to_vec();
                TpmPublicKey::Rsa {
                    // TPM, varsayılan exponent'i 0 olarak kodlar.
                    exponent: if exponent == 0 { 65537 } else { exponent },
                    modulus,
                }
            }
            TPM_ALG_ECC => {
                let symmetric = reader.u16()?;
                if symmetric != TPM_ALG_NULL {
                    return Err(TpmWireError::UnsupportedAlgorithm(symmetric));
                }
                let scheme = reader.u16()?;
                if scheme != TPM_ALG_NULL {
                    let _scheme_hash = reader.u16()?;
                }
                let curve_id = reader.u16()?;
                let kdf = reader.u16()?;
                if kdf != TPM_ALG_NULL {
                    let _kdf_hash = reader.u16()?;
                }
                let x = reader.tpm2b()?.to_vec();
                let y = reader.tpm2b()?.to_vec();
                TpmPublicKey::Ecc { curve_id, x, y }
            }
            other => return Err(TpmWireError::UnsupportedAlgorithm(other)),
        };
        reader.finish()?;
        Ok(Self { name_alg, key })
    }

    /// Attest edilen anahtarı SubjectPublicKeyInfo DER'ine dönüştürür;
    /// parmak izi bu kodlama üzerinden hesaplanır.
    fn to_spki_der(&self) -> Result<Vec<u8>, TpmWireError> {
        match &self.key {
            TpmPublicKey::Ecc { curve_id, x, y } => {
                if *curve_id != TPM_ECC_NIST_P256 {
                    return Err(TpmWireError::UnsupportedCurve(*curve_id));
                }
                let x = left_pad_32(x)
                    .ok_or_else(|| TpmWireError::InvalidKey("ECC coordinate too long".to_owned()))?;
                let y = left_pad_32(y)
                    .ok_or_else(|| TpmWireError::InvalidKey("ECC coordinate too long".to_owned()))?;
                let mut sec1 = Vec::with_capacity(65);
                sec1.push(0x04);
                sec1.extend_from_slice(&x);
                sec1.extend_from_slice(&y);
                let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                    .map_err(|err| TpmWireError::InvalidKey(err.to_string()))?;
                let document = p256::pkcs8::EncodePublicKey::to_public_key_der(&verifying_key)
                    .map_err(|err| TpmWireError::InvalidKey(err.to_string()))?;
                Ok(document.as_bytes().to_vec())
            }
            TpmPublicKey::Rsa { exponent, modulus } => {
                let public_key = rsa::RsaPublicKey::new(
                    rsa::BigUint::from_bytes_be(modulus),
                    rsa::BigUint::from(*exponent),
                )
                .map_err(|err| TpmWireError::InvalidKey(err.to_string()))?;
                let document = rsa::pkcs8::EncodePublicKey::to_public_key_der(&public_key)
                    .map_err(|err| TpmWireError::InvalidKey(err.to_string()))?;
                Ok(document.as_bytes().to_vec())
            }
        }
    }
}

/// TPMS_ATTEST'in bu doğrulamanın ihtiyaç duyduğu kesiti.
#[derive(Debug)]
struct TpmsAttest {
    extra_data: Vec<u8>,
    attested_name: Vec<u8>,
}

impl TpmsAttest {
    fn parse(data: &[u8]) -> Result<Self, TpmWireError> {
        let mut reader = Reader::new(data);
        if reader.u32()? != TPM_GENERATED_VALUE {
            return Err(TpmWireError::InvalidMagic);
        }
        if reader.u16()? != TPM_ST_ATTEST_CERTIFY {
            return Err(TpmWireError::NotCertify);
        }
        let _qualified_signer = reader.tpm2b()?;
        let extra_data = reader.tpm2b()?.to_vec();
        let _clock = reader.u64()?;
        let _reset_count = reader.u32()?;
        let _restart_count = reader.u32()?;
        let _safe = reader.u8()?;
        let _firmware_version = reader.u64()?;
        let attested_name = reader.tpm2b()?.to_vec();
        let _qualified_name = reader.tpm2b()?;
        reader.finish()?;
        Ok(Self {
            extra_data,
            attested_name,
        })
    }
}

/// TPMT_SIGNATURE: imza algoritması ve imza değeri. Gömülü özet alanı
/// okunur ama COSE `alg` seçimi esas alınır.
#[derive(Debug)]
enum TpmtSignature {
    RsaSsa { signature: Vec<u8> },
    Ecdsa { r: Vec<u8>, s: Vec<u8> },
}

impl TpmtSignature {
    fn parse(data: &[u8]) -> Result<Self, TpmWireError> {
        let mut reader = Reader::new(data);
        let sig_alg = reader.u16()?;
        let parsed = match sig_alg {
            TPM_ALG_RSASSA => {
                let _hash_alg = reader.u16()?;
                Self::RsaSsa {
                    signature: reader.tpm2b()?.to_vec(),
                }
            }
            TPM_ALG_ECDSA => {
                let _hash_alg = reader.u16()?;
                Self::Ecdsa {
                    r: reader.tpm2b()?.to_vec(),
                    s: reader.tpm2b()?.to_vec(),
                }
            }
            other => return Err(TpmWireError::UnsupportedAlgorithm(other)),
        };
        reader.finish()?;
        Ok(parsed)
    }
}
