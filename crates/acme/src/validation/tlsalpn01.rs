//! tls-alpn-01 doğrulayıcısı (RFC 8737 / RFC 8738).
//!
//! Sunucuya `acme-tls/1` ALPN'i ile bağlanır ve sunulan self-signed
//! sertifikadaki kritik `id-pe-acmeIdentifier` uzantısını key authorization
//! özetiyle karşılaştırır. ALPN müzakeresinin reddi (alert 120) ve
//! sertifika şekil hataları kalıcıdır; diğer bağlantı hataları geçicidir.

use std::net::IpAddr;

use subtle::ConstantTimeEq as _;
use x509_parser::der_parser::asn1_rs::{oid, Oid};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::FromDer as _;

use crate::challenge::Challenge;
use crate::client::{ClientError, TlsDialConfig, ALERT_NO_APPLICATION_PROTOCOL};
use crate::error::{AcmeError, ProblemType};
use crate::jwk::AccountJwk;
use crate::validation::{
    commit_valid, join_host_port, key_auth_digest, store_error, tls_server_name, ValidationContext,
};

/// RFC 8737'nin tanımladığı ALPN protokol adı.
pub const ACME_TLS_ALPN_PROTOCOL: &str = "acme-tls/1";

const OID_PE_ACME_IDENTIFIER: Oid<'static> = oid!(1.3.6.1.5.5.7.1.31);
const OID_PE_ACME_IDENTIFIER_V1_OBSOLETE: Oid<'static> = oid!(1.3.6.1.5.5.7.1.30.1);

pub(crate) async fn validate(
    ctx: &ValidationContext<'_>,
    challenge: &mut Challenge,
    jwk: &AccountJwk,
) -> Result<(), AcmeError> {
    let config = TlsDialConfig {
        server_name: tls_server_name(&challenge.value),
        alpn_protocols: vec![ACME_TLS_ALPN_PROTOCOL.to_owned()],
    };
    let host_port = join_host_port(
        &challenge.value,
        ctx.ports.tls_alpn01.unwrap_or(443),
    );

    let probe = match ctx.client.tls_dial(&host_port, &config).await {
        Ok(probe) => probe,
        Err(ClientError::TlsAlert {
            alert: ALERT_NO_APPLICATION_PROTOCOL,
        }) => {
            return store_error(ctx, challenge, true, cannot_negotiate_alpn()).await;
        }
        Err(err) => {
            return store_error(
                ctx,
                challenge,
                false,
                AcmeError::new(
                    ProblemType::Connection,
                    format!("error doing TLS dial for {host_port}: {err}"),
                ),
            )
            .await;
        }
    };

    if probe.peer_certificates.is_empty() {
        let detail = format!(
            "{} challenge for {} resulted in no certificates",
            challenge.kind, challenge.value
        );
        return store_error(
            ctx,
            challenge,
            true,
            AcmeError::new(ProblemType::RejectedIdentifier, detail),
        )
        .await;
    }

    if probe.negotiated_alpn.as_deref() != Some(ACME_TLS_ALPN_PROTOCOL) {
        return store_error(ctx, challenge, true, cannot_negotiate_alpn()).await;
    }

    let leaf_der = &probe.peer_certificates[0];
    let Ok((_, leaf)) = X509Certificate::from_der(leaf_der) else {
        return store_error(
            ctx,
            challenge,
            false,
            AcmeError::new(
                ProblemType::Connection,
                format!("error parsing peer certificate for {host_port}"),
            ),
        )
        .await;
    };

    if !leaf_identifies(&leaf, &challenge.value) {
        let err = incorrect_certificate(format!(
            "leaf certificate must contain a single IP address or DNS name, {}",
            challenge.value
        ));
        return store_error(ctx, challenge, true, err).await;
    }

    let hashed_key_auth = key_auth_digest(&challenge.token, jwk);
    let mut found_obsolete_oid = false;
    for ext in leaf.extensions() {
        if ext.oid == OID_PE_ACME_IDENTIFIER {
            if !ext.critical {
                return store_error(
                    ctx,
                    challenge,
                    true,
                    incorrect_certificate("acmeValidationV1 extension not critical"),
                )
                .await;
            }

            // Değer, 32 baytlık bir DER OCTET STRING olmalı: 0x04 0x20 + özet.
            let Some(ext_value) = unwrap_octet_string(ext.value) else {
                return store_error(
                    ctx,
                    challenge,
                    true,
                    incorrect_certificate("malformed acmeValidationV1 extension value"),
                )
                .await;
            };

            if !bool::from(hashed_key_auth.ct_eq(ext_value)) {
                return store_error(
                    ctx,
                    challenge,
                    true,
                    incorrect_certificate(format!(
                        "expected acmeValidationV1 extension value {} for this challenge but got {}",
                        hex::encode(hashed_key_auth),
                        hex::encode(ext_value)
                    )),
                )
                .await;
            }

            return commit_valid(ctx, challenge).await;
        }

        if ext.oid == OID_PE_ACME_IDENTIFIER_V1_OBSOLETE {
            found_obsolete_oid = true;
        }
    }

    if found_obsolete_oid {
        return store_error(
            ctx,
            challenge,
            true,
            incorrect_certificate("obsolete id-pe-acmeIdentifier in acmeValidationV1 extension"),
        )
        .await;
    }

    store_error(
        ctx,
        challenge,
        true,
        incorrect_certificate("missing acmeValidationV1 extension"),
    )
    .await
}

fn cannot_negotiate_alpn() -> AcmeError {
    AcmeError::new(
        ProblemType::RejectedIdentifier,
        "cannot negotiate ALPN acme-tls/1 protocol for tls-alpn-01 challenge",
    )
}

fn incorrect_certificate(detail: impl AsRef<str>) -> AcmeError {
    AcmeError::new(
        ProblemType::RejectedIdentifier,
        format!(
            "incorrect certificate for tls-alpn-01 challenge: {}",
            detail.as_ref()
        ),
    )
}

/// RFC 8737 §3 / RFC 8738 §3: yaprak sertifika tam olarak bir DNS SAN ya da
/// tam olarak bir IP SAN taşımalı ve identifier değeriyle eşleşmelidir.
fn leaf_identifies(leaf: &X509Certificate<'_>, value: &str) -> bool {
    let mut dns_names: Vec<&str> = Vec::new();
    let mut ip_addresses: Vec<&[u8]> = Vec::new();
    for ext in leaf.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                match name {
                    GeneralName::DNSName(dns) => dns_names.push(dns),
                    GeneralName::IPAddress(bytes) => ip_addresses.push(bytes),
                    _ => {}
                }
            }
        }
    }

    if dns_names.is_empty() {
        let Ok(expected) = value.parse::<IpAddr>() else {
            return false;
        };
        let expected_octets = match expected {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        ip_addresses.len() == 1 && ip_addresses[0] == expected_octets.as_slice()
    } else {
        dns_names.len() == 1 && dns_names[0].eq_ignore_ascii_case(value)
    }
}

fn unwrap_octet_string(value: &[u8]) -> Option<&[u8]> {
    if value.len() == 34 && value[0] == 0x04 && value[1] == 0x20 {
        Some(&value[2..])
    } else {
        None
    }
}
