//! Challenge ve authorization kayıtlarının kalıcı katman arayüzü.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::challenge::Challenge;

/// Depolama katmanı hataları.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// İstenen kayıt bulunamadı.
    #[error("{kind} kaydı bulunamadı: {id}")]
    NotFound {
        /// Kayıt türü.
        kind: &'static str,
        /// Aranan kimlik.
        id: String,
    },
    /// Arka uç işlem hatası.
    #[error("depolama katmanı hatası: {0}")]
    Backend(String),
}

/// Authorization kaydının bu çekirdeğin dokunduğu kesiti.
///
/// `fingerprint` yalnızca başarılı bir `device-attest-01` doğrulamasıyla
/// birlikte yazılır; sonraki CSR imzalama adımı aynı anahtarı şart koşar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRecord {
    /// Authorization kimliği.
    pub id: String,
    /// Attest edilen anahtarın hex SHA-256 parmak izi.
    pub fingerprint: Option<String>,
}

impl AuthorizationRecord {
    /// Parmak izi olmayan yeni bir kayıt oluşturur.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fingerprint: None,
        }
    }
}

/// Persistence surface consumed by the challenge controller.
///
/// Both update operations must be atomic per record. Cross-record atomicity
/// is not required: the controller orders the authorization write before the
/// challenge write, and a failure in between leaves the challenge `pending`
/// so a retry re-runs the protocol. The authorization update must therefore
/// be idempotent for an identical fingerprint.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Challenge kaydını yükler.
    async fn get_challenge(&self, id: &str) -> Result<Challenge, StoreError>;

    /// Authorization kaydını yükler.
    async fn get_authorization(&self, id: &str) -> Result<AuthorizationRecord, StoreError>;

    /// Authorization kaydını günceller.
    async fn update_authorization(
        &self,
        authorization: &AuthorizationRecord,
    ) -> Result<(), StoreError>;

    /// Challenge kaydını günceller.
    async fn update_challenge(&self, challenge: &Challenge) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryState {
    challenges: HashMap<String, Challenge>,
    authorizations: HashMap<String, AuthorizationRecord>,
}

/// In-memory [`ChallengeStore`]; tests and embedders without a durable
/// backend use this.
#[derive(Default)]
pub struct MemoryChallengeStore {
    state: RwLock<MemoryState>,
}

impl MemoryChallengeStore {
    /// Boş bir depo oluşturur.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Challenge kaydı ekler.
    ///
    /// # Errors
    ///
    /// Kilit zehirlenmişse [`StoreError::Backend`] döner.
    pub fn insert_challenge(&self, challenge: Challenge) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        state.challenges.insert(challenge.id.clone(), challenge);
        Ok(())
    }

    /// Authorization kaydı ekler.
    ///
    /// # Errors
    ///
    /// Kilit zehirlenmişse [`StoreError::Backend`] döner.
    pub fn insert_authorization(
        &self,
        authorization: AuthorizationRecord,
    ) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        state
            .authorizations
            .insert(authorization.id.clone(), authorization);
        Ok(())
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn get_challenge(&self, id: &str) -> Result<Challenge, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        state
            .challenges
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "challenge",
                id: id.to_owned(),
            })
    }

    async fn get_authorization(&self, id: &str) -> Result<AuthorizationRecord, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        state
            .authorizations
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "authorization",
                id: id.to_owned(),
            })
    }

    async fn update_authorization(
        &self,
        authorization: &AuthorizationRecord,
    ) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        state
            .authorizations
            .insert(authorization.id.clone(), authorization.clone());
        Ok(())
    }

    async fn update_challenge(&self, challenge: &Challenge) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        state
            .challenges
            .insert(challenge.id.clone(), challenge.clone());
        Ok(())
    }
}
