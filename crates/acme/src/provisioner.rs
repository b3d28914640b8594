//! Provisioner yapılandırmasının doğrulama çekirdeğine açılan kesiti.

use std::collections::HashSet;
use std::fmt;

use ostiary_x509::TrustAnchors;

/// `device-attest-01` payload'ında taşınan attestation formatları.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttestationFormat {
    /// Apple enterprise attestation.
    Apple,
    /// YubiKey PIV attestation.
    Step,
    /// TPM 2.0 key certification.
    Tpm,
}

impl AttestationFormat {
    /// Wire formatındaki adı döndürür.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apple => "apple",
            Self::Step => "step",
            Self::Tpm => "tpm",
        }
    }

    /// Wire formatındaki addan format üretir.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "apple" => Some(Self::Apple),
            "step" => Some(Self::Step),
            "tpm" => Some(Self::Tpm),
            _ => None,
        }
    }
}

impl fmt::Display for AttestationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only provisioner configuration consumed during validation.
///
/// The trust-anchor pool and the enabled-format set are fixed for the
/// duration of a `validate` call.
pub trait Provisioner: Send + Sync {
    /// Verilen attestation formatı etkin mi kontrol eder.
    fn is_attestation_format_enabled(&self, format: AttestationFormat) -> bool;

    /// Yapılandırılmış attestation köklerini döndürür. `None` dönerse
    /// format doğrulayıcıları gömülü varsayılan kökleri kullanır; `tpm`
    /// için yapılandırılmış kök zorunludur.
    fn attestation_roots(&self) -> Option<TrustAnchors>;
}

/// Sabit yapılandırmalı [`Provisioner`] implementasyonu.
#[derive(Debug, Clone, Default)]
pub struct StaticProvisioner {
    enabled_formats: HashSet<AttestationFormat>,
    attestation_roots: Option<TrustAnchors>,
}

impl StaticProvisioner {
    /// Verilen formatları etkinleştiren bir provisioner oluşturur.
    #[must_use]
    pub fn new(enabled_formats: impl IntoIterator<Item = AttestationFormat>) -> Self {
        Self {
            enabled_formats: enabled_formats.into_iter().collect(),
            attestation_roots: None,
        }
    }

    /// Attestation köklerini ayarlar.
    #[must_use]
    pub fn with_attestation_roots(mut self, roots: TrustAnchors) -> Self {
        self.attestation_roots = Some(roots);
        self
    }
}

impl Provisioner for StaticProvisioner {
    fn is_attestation_format_enabled(&self, format: AttestationFormat) -> bool {
        self.enabled_formats.contains(&format)
    }

    fn attestation_roots(&self) -> Option<TrustAnchors> {
        self.attestation_roots.clone()
    }
}
