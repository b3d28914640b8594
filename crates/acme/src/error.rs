//! RFC 8555 problem belgeleri ve hata sınıflandırması.
//!
//! Doğrulayıcılar her başarısızlığı bir [`AcmeError`] olarak üretir;
//! controller bu hatayı challenge üzerine kaydeder (geçici/kalıcı) ya da
//! çağırana iletir (`serverInternal`). Kaydedilen hata, challenge kaynağı
//! üzerinde istemciye gösterilir.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// ACME problem types recorded on challenges or bubbled to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType {
    /// Transient network failure while reaching the prover.
    Connection,
    /// Transient DNS resolution failure.
    Dns,
    /// Malformed request data; used to tag subproblem identifiers.
    Malformed,
    /// Terminal protocol-level rejection for http-01 / dns-01 / tls-alpn-01.
    RejectedIdentifier,
    /// Terminal rejection of a device attestation statement.
    BadAttestationStatement,
    /// Internal failure; never recorded on the challenge.
    ServerInternal,
}

impl ProblemType {
    /// RFC 8555 hata URN değerini döndürür.
    #[must_use]
    pub const fn as_urn(self) -> &'static str {
        match self {
            Self::Connection => "urn:ietf:params:acme:error:connection",
            Self::Dns => "urn:ietf:params:acme:error:dns",
            Self::Malformed => "urn:ietf:params:acme:error:malformed",
            Self::RejectedIdentifier => "urn:ietf:params:acme:error:rejectedIdentifier",
            Self::BadAttestationStatement => {
                "urn:ietf:params:acme:error:badAttestationStatement"
            }
            Self::ServerInternal => "urn:ietf:params:acme:error:serverInternal",
        }
    }

    /// Bu problem türü için varsayılan HTTP durum kodunu döndürür.
    #[must_use]
    pub const fn default_status(self) -> u16 {
        match self {
            Self::ServerInternal => 500,
            _ => 400,
        }
    }
}

impl Serialize for ProblemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_urn())
    }
}

/// ACME identifier olarak serileştirilen ad/değer çifti.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    /// Identifier türü, örneğin `permanent-identifier`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Identifier değeri.
    pub value: String,
}

impl Identifier {
    /// Yeni bir identifier oluşturur.
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// A subproblem entry attached to a problem document (RFC 8555 §6.7.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subproblem {
    #[serde(rename = "type")]
    kind: ProblemType,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<Identifier>,
}

impl Subproblem {
    /// Identifier taşımayan bir subproblem oluşturur.
    #[must_use]
    pub fn new(kind: ProblemType, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            identifier: None,
        }
    }

    /// Belirli bir identifier'a bağlı subproblem oluşturur.
    #[must_use]
    pub fn with_identifier(
        kind: ProblemType,
        identifier: Identifier,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            detail: detail.into(),
            identifier: Some(identifier),
        }
    }

    /// Subproblem türünü döndürür.
    #[must_use]
    pub const fn kind(&self) -> ProblemType {
        self.kind
    }

    /// Açıklama metnini döndürür.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Varsa identifier değerini döndürür.
    #[must_use]
    pub const fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }
}

/// An ACME problem document.
///
/// Serializes to the RFC 8555 wire shape (`type`, `detail`, `subproblems`);
/// the HTTP status is transport metadata and is not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{detail}")]
pub struct AcmeError {
    #[serde(rename = "type")]
    kind: ProblemType,
    detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subproblems: Vec<Subproblem>,
    #[serde(skip)]
    status: u16,
}

impl AcmeError {
    /// Verilen problem türüyle yeni bir hata oluşturur.
    #[must_use]
    pub fn new(kind: ProblemType, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            subproblems: Vec::new(),
            status: kind.default_status(),
        }
    }

    /// `serverInternal` hatası oluşturur; challenge durumuna kaydedilmez,
    /// çağırana iletilir.
    #[must_use]
    pub fn server_internal(detail: impl Into<String>) -> Self {
        Self::new(ProblemType::ServerInternal, detail)
    }

    /// Hataya bir subproblem ekler.
    #[must_use]
    pub fn with_subproblem(mut self, subproblem: Subproblem) -> Self {
        self.subproblems.push(subproblem);
        self
    }

    /// Problem türünü döndürür.
    #[must_use]
    pub const fn kind(&self) -> ProblemType {
        self.kind
    }

    /// Açıklama metnini döndürür.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Subproblem listesini döndürür.
    #[must_use]
    pub fn subproblems(&self) -> &[Subproblem] {
        &self.subproblems
    }

    /// HTTP durum kodunu döndürür.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Hata 5xx sınıfında mı kontrol eder. Bu sınıftaki hatalar challenge
    /// durumunu değiştirmeden yukarı iletilir.
    #[must_use]
    pub const fn is_server_internal(&self) -> bool {
        self.status >= 500
    }
}
