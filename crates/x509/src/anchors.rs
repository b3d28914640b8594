use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

/// Kök sertifika havuzu yüklenirken oluşabilecek hatalar.
#[derive(Debug, Error)]
pub enum TrustAnchorsError {
    /// PEM verisi ayrıştırılamadı.
    #[error("kök sertifika PEM verisi ayrıştırılamadı: {0}")]
    Pem(String),
    /// PEM bloğu CERTIFICATE etiketi taşımıyor.
    #[error("beklenen CERTIFICATE etiketi, bulundu {0}")]
    UnexpectedTag(String),
    /// DER verisi geçerli bir X.509 sertifikası değil.
    #[error("kök sertifika DER verisi ayrıştırılamadı: {0}")]
    Der(String),
    /// Havuz en az bir sertifika içermelidir.
    #[error("kök sertifika havuzu boş olamaz")]
    Empty,
}

/// A set of root certificates that terminate attestation chains.
///
/// Certificates are held in DER form and re-parsed on demand; the set is
/// immutable after construction and safe to share between validations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchors {
    certs: Vec<Vec<u8>>,
}

impl TrustAnchors {
    /// Builds a pool from one or more concatenated PEM certificate blocks.
    ///
    /// # Errors
    ///
    /// Returns [`TrustAnchorsError`] when the PEM input cannot be parsed,
    /// contains a non-certificate block, or yields no certificates.
    pub fn from_pem(pem_data: &str) -> Result<Self, TrustAnchorsError> {
        let blocks =
            pem::parse_many(pem_data).map_err(|err| TrustAnchorsError::Pem(err.to_string()))?;
        let mut certs = Vec::with_capacity(blocks.len());
        for block in blocks {
            if block.tag() != "CERTIFICATE" {
                return Err(TrustAnchorsError::UnexpectedTag(block.tag().to_owned()));
            }
            certs.push(block.into_contents());
        }
        Self::from_der_certs(certs)
    }

    /// Builds a pool from raw DER certificates.
    ///
    /// # Errors
    ///
    /// Returns [`TrustAnchorsError`] when the set is empty or any entry is
    /// not a parseable certificate.
    pub fn from_der_certs(certs: Vec<Vec<u8>>) -> Result<Self, TrustAnchorsError> {
        if certs.is_empty() {
            return Err(TrustAnchorsError::Empty);
        }
        for der in &certs {
            X509Certificate::from_der(der)
                .map_err(|err| TrustAnchorsError::Der(err.to_string()))?;
        }
        Ok(Self { certs })
    }

    /// Havuzdaki DER sertifikalarını döndürür.
    #[must_use]
    pub fn certs(&self) -> &[Vec<u8>] {
        &self.certs
    }

    /// Havuzdaki sertifika sayısını döndürür.
    #[must_use]
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Havuz boş mu kontrol eder. Kurucular boş havuzu reddettiği için
    /// normalde her zaman `false` döner.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}
