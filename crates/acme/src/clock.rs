//! Doğrulama akışının zaman kaynağı soyutlaması.
//!
//! Doğrulayıcılar duvar saatini doğrudan okumaz; `validated` zaman damgası
//! ve zincir doğrulama anı buradan gelir, testler sabit saat enjekte eder.

use time::OffsetDateTime;

/// Wall-clock source used for `validated` timestamps and chain verification.
pub trait Clock: Send + Sync {
    /// Şu anki UTC zamanını döndürür.
    fn now_utc(&self) -> OffsetDateTime;

    /// Returns the current time truncated to whole seconds. Certificate
    /// verification uses this so results are reproducible against fixtures
    /// with second precision.
    fn now_truncated(&self) -> OffsetDateTime {
        let now = self.now_utc();
        now.replace_nanosecond(0).unwrap_or(now)
    }
}

/// Sistem saatini kullanan varsayılan kaynak.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Sabit bir anı döndüren saat; testlerde kullanılır.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(OffsetDateTime);

impl FixedClock {
    /// Verilen anda sabitlenmiş bir saat oluşturur.
    #[must_use]
    pub const fn new(at: OffsetDateTime) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}
