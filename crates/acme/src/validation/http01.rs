//! http-01 doğrulayıcısı.
//!
//! `http://<host>/.well-known/acme-challenge/<token>` adresinden key
//! authorization değerini okur. Ulaşım hataları ve 4xx/5xx yanıtlar geçici
//! sayılır; yalnızca içerik uyuşmazlığı challenge'ı `invalid` yapar.

use crate::challenge::Challenge;
use crate::error::{AcmeError, ProblemType};
use crate::jwk::AccountJwk;
use crate::validation::{
    challenge_host, commit_valid, key_authorization, store_error, ValidationContext,
};

pub(crate) async fn validate(
    ctx: &ValidationContext<'_>,
    challenge: &mut Challenge,
    jwk: &AccountJwk,
) -> Result<(), AcmeError> {
    let host = challenge_host(&challenge.value);
    let url = match ctx.ports.http01 {
        Some(port) => format!(
            "http://{host}:{port}/.well-known/acme-challenge/{}",
            challenge.token
        ),
        None => format!("http://{host}/.well-known/acme-challenge/{}", challenge.token),
    };

    let response = match ctx.client.http_get(&url).await {
        Ok(response) => response,
        Err(err) => {
            return store_error(
                ctx,
                challenge,
                false,
                AcmeError::new(
                    ProblemType::Connection,
                    format!("error doing http GET for url {url}: {err}"),
                ),
            )
            .await;
        }
    };

    if response.status >= 400 {
        return store_error(
            ctx,
            challenge,
            false,
            AcmeError::new(
                ProblemType::Connection,
                format!(
                    "error doing http GET for url {url} with status code {}",
                    response.status
                ),
            ),
        )
        .await;
    }

    let body = String::from_utf8_lossy(&response.body);
    let key_auth = body.trim();
    let expected = key_authorization(&challenge.token, jwk);
    if key_auth != expected {
        return store_error(
            ctx,
            challenge,
            true,
            AcmeError::new(
                ProblemType::RejectedIdentifier,
                format!("keyAuthorization does not match; expected {expected}, but got {key_auth}"),
            ),
        )
        .await;
    }

    commit_valid(ctx, challenge).await
}
