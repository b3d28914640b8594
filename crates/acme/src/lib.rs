//! ACME challenge doğrulama çekirdeği.
//!
//! Bu crate, bekleyen bir ACME challenge'ı için istemcinin identifier
//! üzerindeki kontrolünü kanıtlayıp kanıtlamadığına karar verir ve kararı
//! kalıcı olarak işler. Dört kanıt protokolü desteklenir: `http-01`,
//! `dns-01`, `tls-alpn-01` ve üç formatlı (`apple`, `step`, `tpm`)
//! `device-attest-01`.
//!
//! Dış dünya dar arayüzlerle temsil edilir: ağ erişimi
//! [`ValidationClient`], kalıcılık [`ChallengeStore`], yapılandırma
//! [`Provisioner`], zaman [`Clock`]. [`ChallengeValidator`] bu parçaları
//! tek bir `validate` operasyonunda birleştirir.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod attestation;
mod challenge;
mod client;
mod clock;
mod error;
mod jwk;
mod provisioner;
mod store;
mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use attestation::{
    AppleAttestationData, AttestationData, StepAttestationData, TpmAttestationData,
};
pub use challenge::{
    Challenge, ChallengeStatus, ChallengeType, ChallengeValidator, InsecurePorts,
};
pub use client::{
    ClientError, HttpResponse, StandardValidationClient, TlsDialConfig, TlsProbe,
    ValidationClient, ALERT_NO_APPLICATION_PROTOCOL,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AcmeError, Identifier, ProblemType, Subproblem};
pub use jwk::{AccountJwk, JwkError};
pub use provisioner::{AttestationFormat, Provisioner, StaticProvisioner};
pub use store::{AuthorizationRecord, ChallengeStore, MemoryChallengeStore, StoreError};
pub use validation::tlsalpn01::ACME_TLS_ALPN_PROTOCOL;
pub use validation::{key_auth_digest, key_authorization};
