//! device-attest-01 doğrulayıcısı.
//!
//! Payload'daki CBOR attestation nesnesini çözer, formatı provisioner'ın
//! izin listesiyle karşılaştırır ve format doğrulayıcısına dağıtır. Başarı
//! halinde önce authorization'a anahtar parmak izi, ardından challenge'a
//! `valid` durumu yazılır; ikinci yazım başarısız olursa challenge
//! `pending` kaldığından yeniden doğrulama güvenlidir.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq as _;

use crate::attestation::{apple, step, tpm, AttestationObject};
use crate::challenge::Challenge;
use crate::error::{AcmeError, ProblemType};
use crate::jwk::AccountJwk;
use crate::provisioner::AttestationFormat;
use crate::validation::{commit_valid, store_error, ValidationContext};

/// İstemcinin gönderdiği payload: `{"attObj": base64url, "error": string}`.
#[derive(Debug, Deserialize)]
struct AttestationPayload {
    #[serde(rename = "attObj", default)]
    att_obj: String,
    #[serde(default)]
    error: String,
}

pub(crate) async fn validate(
    ctx: &ValidationContext<'_>,
    challenge: &mut Challenge,
    jwk: &AccountJwk,
    payload: &[u8],
) -> Result<(), AcmeError> {
    // Authorization şimdi yüklenir; başarı yolunda parmak izi buraya yazılır.
    let mut authorization = ctx
        .store
        .get_authorization(&challenge.authorization_id)
        .await
        .map_err(|err| AcmeError::server_internal(format!("error loading authorization: {err}")))?;

    let payload: AttestationPayload = serde_json::from_slice(payload)
        .map_err(|err| AcmeError::server_internal(format!("error unmarshalling JSON: {err}")))?;
    if !payload.error.is_empty() {
        return store_error(
            ctx,
            challenge,
            true,
            AcmeError::new(
                ProblemType::RejectedIdentifier,
                format!("payload contained error: {}", payload.error),
            ),
        )
        .await;
    }

    let att_obj_bytes = URL_SAFE_NO_PAD.decode(payload.att_obj).map_err(|err| {
        AcmeError::server_internal(format!("error base64 decoding attObj: {err}"))
    })?;
    let attestation: AttestationObject = ciborium::de::from_reader(att_obj_bytes.as_slice())
        .map_err(|err| AcmeError::server_internal(format!("error unmarshalling CBOR: {err}")))?;

    let format = AttestationFormat::parse(&attestation.format).filter(|format| {
        ctx.provisioner.is_attestation_format_enabled(*format)
    });
    let Some(format) = format else {
        return store_error(
            ctx,
            challenge,
            true,
            AcmeError::new(
                ProblemType::BadAttestationStatement,
                format!("attestation format {:?} is not enabled", attestation.format),
            ),
        )
        .await;
    };
    tracing::debug!(challenge = %challenge.id, %format, "attestation formatı dağıtılıyor");

    let result = match format {
        AttestationFormat::Apple => apple::verify(ctx, &attestation),
        AttestationFormat::Step => step::verify(ctx, challenge, jwk, &attestation),
        AttestationFormat::Tpm => tpm::verify(ctx, challenge, jwk, &attestation),
    };
    let data = match result {
        Ok(data) => data,
        // HTTP-500 sınıfı hatalar challenge durumuna dokunmadan yukarı
        // iletilir; geri kalan her doğrulama hatası kalıcıdır.
        Err(err) if err.is_server_internal() => return Err(err),
        Err(err) => return store_error(ctx, challenge, true, err).await,
    };

    if let Some(nonce) = data.nonce() {
        let expected: [u8; 32] = Sha256::digest(challenge.token.as_bytes()).into();
        if !bool::from(expected.ct_eq(nonce)) {
            return store_error(
                ctx,
                challenge,
                true,
                AcmeError::new(
                    ProblemType::BadAttestationStatement,
                    "challenge token does not match",
                ),
            )
            .await;
        }
    }

    if !data.matches_identifier(&challenge.value) {
        let err = data.identifier_mismatch_error(&challenge.value);
        return store_error(ctx, challenge, true, err).await;
    }

    // Önce parmak izi, sonra challenge; sıralama kısmi yazımda yeniden
    // doğrulamanın güvenli kalmasını sağlar.
    authorization.fingerprint = Some(data.fingerprint().to_owned());
    ctx.store
        .update_authorization(&authorization)
        .await
        .map_err(|err| {
            AcmeError::server_internal(format!("error updating authorization: {err}"))
        })?;

    commit_valid(ctx, challenge).await
}
