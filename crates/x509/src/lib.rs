//! Certificate chain verification for attestation trust evaluation.
//!
//! Bu crate, ACME device attestation doğrulamasının ihtiyaç duyduğu X.509
//! zincir doğrulamasını sağlar: yaprak sertifika, sıralı ara sertifikalar ve
//! yapılandırılmış kök havuzu (trust anchors) üzerinden imza, geçerlilik ve
//! kritik uzantı kontrolleri yapılır.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod anchors;
mod chain;

pub use anchors::{TrustAnchors, TrustAnchorsError};
pub use chain::{key_fingerprint, verify_chain, ChainVerifyError};

pub use x509_parser::oid_registry::Oid;
