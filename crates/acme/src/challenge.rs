//! Challenge veri modeli ve doğrulama denetleyicisi.
//!
//! Durum makinesi tekdüzedir: `pending → valid` ve `pending → invalid`
//! dışında geçiş yoktur. Terminal bir challenge üzerinde `validate`
//! çağrısı protokolü yeniden çalıştırmadan başarı döndürür.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use time::OffsetDateTime;

use crate::client::ValidationClient;
use crate::clock::{Clock, SystemClock};
use crate::error::AcmeError;
use crate::jwk::AccountJwk;
use crate::provisioner::Provisioner;
use crate::store::ChallengeStore;
use crate::validation::{deviceattest01, dns01, http01, tlsalpn01, ValidationContext};

/// ACME challenge türleri.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeType {
    /// `http-01` challenge.
    Http01,
    /// `dns-01` challenge.
    Dns01,
    /// `tls-alpn-01` challenge.
    TlsAlpn01,
    /// `device-attest-01` challenge.
    DeviceAttest01,
}

impl ChallengeType {
    /// Wire formatındaki adı döndürür.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http01 => "http-01",
            Self::Dns01 => "dns-01",
            Self::TlsAlpn01 => "tls-alpn-01",
            Self::DeviceAttest01 => "device-attest-01",
        }
    }

    /// Wire formatındaki addan tür üretir. Depolama katmanı bilinmeyen bir
    /// tür okursa `None` alır ve kaydı `serverInternal` ile reddeder.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "http-01" => Some(Self::Http01),
            "dns-01" => Some(Self::Dns01),
            "tls-alpn-01" => Some(Self::TlsAlpn01),
            "device-attest-01" => Some(Self::DeviceAttest01),
            _ => None,
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChallengeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Challenge lifecycle states. This core only commits `pending → valid` and
/// `pending → invalid`; `processing` and `deactivated` exist in RFC 8555 but
/// are never entered here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    /// Doğrulama bekleniyor.
    Pending,
    /// RFC 8555 ara durumu; bu çekirdek tarafından üretilmez.
    Processing,
    /// Doğrulama başarılı.
    Valid,
    /// Doğrulama kalıcı olarak başarısız.
    Invalid,
    /// Authorization devre dışı bırakıldı; bu çekirdek tarafından üretilmez.
    Deactivated,
}

impl ChallengeStatus {
    /// Wire formatındaki adı döndürür.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Deactivated => "deactivated",
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChallengeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An ACME challenge record.
///
/// `value`, `token`, `kind` and the back references are immutable after
/// creation; only the controller mutates `status`, `error` and
/// `validated_at`. Serialization matches the RFC 8555 challenge resource;
/// storage-only fields are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    /// Kayıt kimliği.
    #[serde(skip)]
    pub id: String,
    /// Hesap geri referansı.
    #[serde(skip)]
    pub account_id: String,
    /// Authorization geri referansı.
    #[serde(skip)]
    pub authorization_id: String,
    /// Kanıtlanan identifier: DNS adı, IP literal'i veya cihaz kimliği.
    #[serde(skip)]
    pub value: String,
    /// Challenge türü.
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    /// Challenge durumu.
    pub status: ChallengeStatus,
    /// Challenge başına üretilen rastgele token, base64url kodlu.
    pub token: String,
    /// Başarılı doğrulama anı; yalnızca `status == valid` iken doludur.
    #[serde(
        rename = "validated",
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub validated_at: Option<OffsetDateTime>,
    /// Challenge kaynağının kendi URL'i.
    pub url: String,
    /// Kaydedilmiş doğrulama hatası.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AcmeError>,
}

/// Test harness port overrides for http-01 and tls-alpn-01.
///
/// Production deployments must leave both unset; the defaults of 80 and 443
/// are fixed by RFC 8555 and RFC 8737.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsecurePorts {
    /// http-01 GET isteğine eklenecek port.
    pub http01: Option<u16>,
    /// tls-alpn-01 bağlantısında 443 yerine kullanılacak port.
    pub tls_alpn01: Option<u16>,
}

/// The challenge validation controller.
///
/// Loads the challenge, refuses non-pending records, dispatches to the
/// protocol verifier for the challenge type and commits the outcome through
/// the store. A returned error is always `serverInternal` class (or an
/// HTTP-500-class attestation error) and leaves the challenge untouched;
/// protocol failures are recorded on the challenge and reported as success.
pub struct ChallengeValidator {
    store: Arc<dyn ChallengeStore>,
    client: Arc<dyn ValidationClient>,
    provisioner: Arc<dyn Provisioner>,
    clock: Arc<dyn Clock>,
    ports: InsecurePorts,
}

impl ChallengeValidator {
    /// Sistem saatiyle yeni bir denetleyici oluşturur.
    #[must_use]
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        client: Arc<dyn ValidationClient>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Self {
        Self {
            store,
            client,
            provisioner,
            clock: Arc::new(SystemClock),
            ports: InsecurePorts::default(),
        }
    }

    /// Zaman kaynağını değiştirir.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Test portlarını ayarlar. Üretimde kullanılmamalıdır.
    #[must_use]
    pub const fn with_insecure_ports(mut self, ports: InsecurePorts) -> Self {
        self.ports = ports;
        self
    }

    /// Attempts to validate the challenge and returns its committed state.
    ///
    /// Idempotent once terminal: a `valid` or `invalid` challenge is
    /// returned as-is without re-running the protocol.
    ///
    /// # Errors
    ///
    /// Returns [`AcmeError`] only for internal failures (store faults,
    /// malformed stored data, HTTP-500-class attestation errors); the
    /// challenge state is left untouched in that case.
    pub async fn validate(
        &self,
        challenge_id: &str,
        jwk: &AccountJwk,
        payload: &[u8],
    ) -> Result<Challenge, AcmeError> {
        let mut challenge = self
            .store
            .get_challenge(challenge_id)
            .await
            .map_err(|err| AcmeError::server_internal(format!("error loading challenge: {err}")))?;

        if challenge.status != ChallengeStatus::Pending {
            return Ok(challenge);
        }

        let ctx = ValidationContext {
            store: self.store.as_ref(),
            client: self.client.as_ref(),
            provisioner: self.provisioner.as_ref(),
            clock: self.clock.as_ref(),
            ports: self.ports,
        };

        match challenge.kind {
            ChallengeType::Http01 => http01::validate(&ctx, &mut challenge, jwk).await?,
            ChallengeType::Dns01 => dns01::validate(&ctx, &mut challenge, jwk).await?,
            ChallengeType::TlsAlpn01 => tlsalpn01::validate(&ctx, &mut challenge, jwk).await?,
            ChallengeType::DeviceAttest01 => {
                deviceattest01::validate(&ctx, &mut challenge, jwk, payload).await?;
            }
        }

        tracing::debug!(
            challenge = %challenge.id,
            kind = %challenge.kind,
            status = %challenge.status,
            "challenge doğrulama denemesi tamamlandı",
        );
        Ok(challenge)
    }
}
