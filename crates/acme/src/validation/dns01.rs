//! dns-01 doğrulayıcısı.
//!
//! `_acme-challenge.<domain>` adresindeki TXT kayıtlarında key
//! authorization özetinin base64url kodunu arar. Wildcard identifier'lar
//! için sorgu taban domain üzerinden yapılır.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::challenge::Challenge;
use crate::error::{AcmeError, ProblemType};
use crate::jwk::AccountJwk;
use crate::validation::{
    commit_valid, key_auth_digest, key_authorization, store_error, ValidationContext,
};

pub(crate) async fn validate(
    ctx: &ValidationContext<'_>,
    challenge: &mut Challenge,
    jwk: &AccountJwk,
) -> Result<(), AcmeError> {
    // Wildcard authorization, TXT sorgusunu taban domain üzerinden yapar;
    // `_acme-challenge.*.example.com` diye bir ad sorgulanmaz.
    let domain = challenge
        .value
        .strip_prefix("*.")
        .unwrap_or(&challenge.value);

    let records = match ctx.client.lookup_txt(&format!("_acme-challenge.{domain}")).await {
        Ok(records) => records,
        Err(err) => {
            let detail = format!("error looking up TXT records for domain {domain}: {err}");
            return store_error(ctx, challenge, false, AcmeError::new(ProblemType::Dns, detail))
                .await;
        }
    };

    let expected = URL_SAFE_NO_PAD.encode(key_auth_digest(&challenge.token, jwk));
    if !records.iter().any(|record| record == &expected) {
        let expected_key_auth = key_authorization(&challenge.token, jwk);
        return store_error(
            ctx,
            challenge,
            true,
            AcmeError::new(
                ProblemType::RejectedIdentifier,
                format!(
                    "keyAuthorization does not match; expected {expected_key_auth}, but got {records:?}"
                ),
            ),
        )
        .await;
    }

    commit_valid(ctx, challenge).await
}
