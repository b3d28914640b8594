//! ACME hesap anahtarının RFC 7638 thumbprint hesabı.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// JWK ayrıştırma hataları.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwkError {
    /// JWK belgesi JSON objesi değil.
    #[error("JWK belgesi JSON objesi olmalıdır")]
    NotAnObject,
    /// Zorunlu alan eksik veya string değil.
    #[error("JWK alanı eksik: {0}")]
    MissingField(&'static str),
    /// `kty` değeri desteklenmiyor.
    #[error("desteklenmeyen JWK anahtar türü: {0}")]
    UnsupportedKeyType(String),
}

/// The account public key, reduced to the members that participate in the
/// RFC 7638 canonical thumbprint.
///
/// The challenge core never verifies signatures with this key; it only binds
/// the challenge token to the account via the thumbprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountJwk {
    /// Elliptic curve key (`kty: EC`).
    Ec {
        /// Eğri adı, örneğin `P-256`.
        crv: String,
        /// Base64url kodlu x koordinatı.
        x: String,
        /// Base64url kodlu y koordinatı.
        y: String,
    },
    /// Octet key pair (`kty: OKP`), tipik olarak Ed25519.
    Okp {
        /// Eğri adı, örneğin `Ed25519`.
        crv: String,
        /// Base64url kodlu public anahtar.
        x: String,
    },
    /// RSA key (`kty: RSA`).
    Rsa {
        /// Base64url kodlu modulus.
        n: String,
        /// Base64url kodlu public exponent.
        e: String,
    },
}

impl AccountJwk {
    /// P-256 anahtarından JWK oluşturur.
    #[must_use]
    pub fn ec(crv: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self::Ec {
            crv: crv.into(),
            x: x.into(),
            y: y.into(),
        }
    }

    /// OKP anahtarından JWK oluşturur.
    #[must_use]
    pub fn okp(crv: impl Into<String>, x: impl Into<String>) -> Self {
        Self::Okp {
            crv: crv.into(),
            x: x.into(),
        }
    }

    /// RSA anahtarından JWK oluşturur.
    #[must_use]
    pub fn rsa(n: impl Into<String>, e: impl Into<String>) -> Self {
        Self::Rsa {
            n: n.into(),
            e: e.into(),
        }
    }

    /// JSON değerinden JWK üretir.
    ///
    /// # Errors
    ///
    /// Belge obje değilse, `kty` bilinmiyorsa veya zorunlu üyeler eksikse
    /// [`JwkError`] döner.
    pub fn from_json_value(value: &Value) -> Result<Self, JwkError> {
        let Value::Object(object) = value else {
            return Err(JwkError::NotAnObject);
        };
        let field = |name: &'static str| -> Result<String, JwkError> {
            match object.get(name) {
                Some(Value::String(value)) => Ok(value.clone()),
                _ => Err(JwkError::MissingField(name)),
            }
        };
        match field("kty")?.as_str() {
            "EC" => Ok(Self::Ec {
                crv: field("crv")?,
                x: field("x")?,
                y: field("y")?,
            }),
            "OKP" => Ok(Self::Okp {
                crv: field("crv")?,
                x: field("x")?,
            }),
            "RSA" => Ok(Self::Rsa {
                n: field("n")?,
                e: field("e")?,
            }),
            other => Err(JwkError::UnsupportedKeyType(other.to_owned())),
        }
    }

    /// JSON metninden JWK üretir.
    ///
    /// # Errors
    ///
    /// JSON ayrıştırması veya alan doğrulaması başarısız olursa [`JwkError`]
    /// döner.
    pub fn from_json_str(text: &str) -> Result<Self, JwkError> {
        let value: Value = serde_json::from_str(text).map_err(|_| JwkError::NotAnObject)?;
        Self::from_json_value(&value)
    }

    /// RFC 7638 canonical JSON representation: required members only, keys
    /// in lexicographic order, no whitespace.
    fn canonical_json(&self) -> String {
        match self {
            Self::Ec { crv, x, y } => {
                format!("{{\"crv\":\"{crv}\",\"kty\":\"EC\",\"x\":\"{x}\",\"y\":\"{y}\"}}")
            }
            Self::Okp { crv, x } => {
                format!("{{\"crv\":\"{crv}\",\"kty\":\"OKP\",\"x\":\"{x}\"}}")
            }
            Self::Rsa { n, e } => format!("{{\"e\":\"{e}\",\"kty\":\"RSA\",\"n\":\"{n}\"}}"),
        }
    }

    /// RFC 7638 SHA-256 thumbprint değerini döndürür.
    #[must_use]
    pub fn thumbprint(&self) -> [u8; 32] {
        Sha256::digest(self.canonical_json().as_bytes()).into()
    }

    /// Base64url (padding'siz) kodlu thumbprint değerini döndürür.
    #[must_use]
    pub fn thumbprint_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.thumbprint())
    }
}
