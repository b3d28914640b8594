//! Challenge doğrulama protokollerinin ortak yapı taşları.
//!
//! Key authorization (RFC 8555 §8.1) her challenge türünün bağlandığı
//! değerdir: `token.base64url(SHA256(JWK thumbprint))`. dns-01 ve `tpm`
//! attestation bunun SHA-256 özetini kullanır.

#![allow(clippy::module_name_repetitions)]

pub mod deviceattest01;
pub mod dns01;
pub mod http01;
pub mod tlsalpn01;

use std::net::IpAddr;

use sha2::{Digest, Sha256};

use crate::challenge::{Challenge, ChallengeStatus, InsecurePorts};
use crate::client::ValidationClient;
use crate::clock::Clock;
use crate::error::AcmeError;
use crate::jwk::AccountJwk;
use crate::provisioner::Provisioner;
use crate::store::ChallengeStore;

/// Computes the ACME key authorization for a token and account key.
///
/// Deterministic and side-effect free; callers that compare the result in a
/// security-relevant position are responsible for constant-time comparison.
#[must_use]
pub fn key_authorization(token: &str, jwk: &AccountJwk) -> String {
    format!("{token}.{}", jwk.thumbprint_b64())
}

/// Key authorization değerinin SHA-256 özetini döndürür; dns-01 kaydı ve
/// `tpm` attestation `extraData` alanı bu özeti taşır.
#[must_use]
pub fn key_auth_digest(token: &str, jwk: &AccountJwk) -> [u8; 32] {
    Sha256::digest(key_authorization(token, jwk).as_bytes()).into()
}

/// Tek bir `validate` çağrısı boyunca doğrulayıcıların gördüğü bağımlılık
/// kümesi; tamamı salt okunur kullanılır.
pub(crate) struct ValidationContext<'a> {
    pub store: &'a dyn ChallengeStore,
    pub client: &'a dyn ValidationClient,
    pub provisioner: &'a dyn Provisioner,
    pub clock: &'a dyn Clock,
    pub ports: InsecurePorts,
}

/// Records a validation failure on the challenge. `mark_invalid` decides
/// whether the failure is terminal; transient failures leave the status
/// `pending` so the client can retry.
pub(crate) async fn store_error(
    ctx: &ValidationContext<'_>,
    challenge: &mut Challenge,
    mark_invalid: bool,
    err: AcmeError,
) -> Result<(), AcmeError> {
    tracing::debug!(
        challenge = %challenge.id,
        kind = %challenge.kind,
        terminal = mark_invalid,
        detail = err.detail(),
        "challenge doğrulaması başarısız",
    );
    challenge.error = Some(err);
    if mark_invalid {
        challenge.status = ChallengeStatus::Invalid;
    }
    ctx.store.update_challenge(challenge).await.map_err(|err| {
        AcmeError::server_internal(format!("failure saving error to acme challenge: {err}"))
    })
}

/// Challenge'ı geçerli olarak işaretler ve kaydeder.
pub(crate) async fn commit_valid(
    ctx: &ValidationContext<'_>,
    challenge: &mut Challenge,
) -> Result<(), AcmeError> {
    challenge.status = ChallengeStatus::Valid;
    challenge.error = None;
    challenge.validated_at = Some(ctx.clock.now_truncated());
    ctx.store
        .update_challenge(challenge)
        .await
        .map_err(|err| AcmeError::server_internal(format!("error updating challenge: {err}")))?;
    tracing::info!(challenge = %challenge.id, kind = %challenge.kind, "challenge doğrulandı");
    Ok(())
}

/// IPv6 literal değerleri köşeli paranteze alır; diğer değerler olduğu gibi
/// host olarak kullanılır.
pub(crate) fn challenge_host(value: &str) -> String {
    match value.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{value}]"),
        _ => value.to_owned(),
    }
}

/// `host:port` hedefi üretir; IPv6 literalleri köşeli paranteze alınır.
pub(crate) fn join_host_port(value: &str, port: u16) -> String {
    format!("{}:{port}", challenge_host(value))
}

/// tls-alpn-01 için SNI değerini belirler. RFC 8738 §6: IP identifier'lar
/// için ters DNS adı kullanılır, DNS identifier'lar olduğu gibi gönderilir.
pub(crate) fn tls_server_name(value: &str) -> String {
    value
        .parse::<IpAddr>()
        .map_or_else(|_| value.to_owned(), reverse_addr)
}

/// Returns the in-addr.arpa. or ip6.arpa. name for an IP address, the form
/// used for rDNS lookups.
pub(crate) fn reverse_addr(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            format!(
                "{}.{}.{}.{}.in-addr.arpa.",
                octets[3], octets[2], octets[1], octets[0]
            )
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(v6.octets().len() * 4 + "ip6.arpa.".len());
            for octet in v6.octets().iter().rev() {
                let low = char::from_digit(u32::from(octet & 0x0f), 16).unwrap_or('0');
                let high = char::from_digit(u32::from(octet >> 4), 16).unwrap_or('0');
                name.push(low);
                name.push('.');
                name.push(high);
                name.push('.');
            }
            name.push_str("ip6.arpa.");
            name
        }
    }
}
