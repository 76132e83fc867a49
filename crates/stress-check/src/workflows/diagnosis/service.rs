use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as SessionLock, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use super::answers::AnswerSet;
use super::domain::{DiagnosisError, QuestionId, ScoringVariant};
use super::export::{CapturedPage, ExportArtifact, ExportComposer, RegionKind};
use super::gateway::{DeliveryChannel, Scorer};
use super::questionnaire::Questionnaire;
use super::session::{DiagnosisSession, SessionView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Diagnosis(#[from] DiagnosisError),
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("session {0} is busy with another operation")]
    SessionBusy(SessionId),
    #[error("scorer is still initializing")]
    ScorerNotReady,
}

struct SessionSlot {
    session: Arc<SessionLock<DiagnosisSession>>,
    touched: Instant,
}

/// Live sessions. Each session sits behind its own lock, taken with
/// `try_lock` so overlapping operations on one session are refused rather
/// than queued. Sessions leave the registry when closed or when idle past
/// the sweep threshold.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl SessionRegistry {
    pub fn insert(&self, id: SessionId, session: DiagnosisSession) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                SessionSlot {
                    session: Arc::new(SessionLock::new(session)),
                    touched: Instant::now(),
                },
            );
    }

    pub fn acquire(&self, id: SessionId) -> Result<OwnedMutexGuard<DiagnosisSession>, ServiceError> {
        let session = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = sessions
                .get_mut(&id)
                .ok_or(ServiceError::SessionNotFound(id))?;
            slot.touched = Instant::now();
            Arc::clone(&slot.session)
        };
        session
            .try_lock_owned()
            .map_err(|_| ServiceError::SessionBusy(id))
    }

    /// Drops a session. A session with an operation in flight is kept.
    pub fn remove(&self, id: SessionId) -> Result<(), ServiceError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let busy = sessions
            .get(&id)
            .ok_or(ServiceError::SessionNotFound(id))?
            .session
            .try_lock()
            .is_err();
        if busy {
            return Err(ServiceError::SessionBusy(id));
        }
        sessions.remove(&id);
        Ok(())
    }

    /// Removes every idle session untouched for at least `max_idle`.
    /// Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, slot| {
            slot.touched.elapsed() < max_idle || slot.session.try_lock().is_err()
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Coordinates sessions against the scorer, delivery channel, and export
/// composer shared by every respondent.
pub struct DiagnosisService<S, D> {
    questionnaire: Arc<Questionnaire>,
    scorer: Arc<S>,
    delivery: Arc<D>,
    composer: ExportComposer,
    sessions: SessionRegistry,
    scorer_ready: Arc<AtomicBool>,
}

impl<S, D> DiagnosisService<S, D>
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    pub fn new(
        questionnaire: Arc<Questionnaire>,
        scorer: Arc<S>,
        delivery: Arc<D>,
        composer: ExportComposer,
    ) -> Self {
        Self {
            questionnaire,
            scorer,
            delivery,
            composer,
            sessions: SessionRegistry::default(),
            scorer_ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Gate new intakes on an externally maintained readiness flag.
    pub fn with_readiness(mut self, scorer_ready: Arc<AtomicBool>) -> Self {
        self.scorer_ready = scorer_ready;
        self
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn is_ready(&self) -> bool {
        self.scorer_ready.load(Ordering::Acquire)
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn create_session(&self) -> (SessionId, SessionView) {
        let id = SessionId::generate();
        let session = DiagnosisSession::new(Arc::clone(&self.questionnaire));
        let view = session.view();
        self.sessions.insert(id, session);
        debug!(session_id = %id, "session created");
        (id, view)
    }

    pub fn close_session(&self, id: SessionId) -> Result<(), ServiceError> {
        self.sessions.remove(id)?;
        debug!(session_id = %id, "session closed");
        Ok(())
    }

    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let evicted = self.sessions.evict_idle(max_idle);
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    pub fn view(&self, id: SessionId) -> Result<SessionView, ServiceError> {
        Ok(self.sessions.acquire(id)?.view())
    }

    pub fn start(&self, id: SessionId, variant: ScoringVariant) -> Result<SessionView, ServiceError> {
        if !self.is_ready() {
            return Err(ServiceError::ScorerNotReady);
        }
        let mut session = self.sessions.acquire(id)?;
        session.start(variant)?;
        Ok(session.view())
    }

    pub fn select_answer(
        &self,
        id: SessionId,
        question_id: QuestionId,
        score: i32,
    ) -> Result<SessionView, ServiceError> {
        let mut session = self.sessions.acquire(id)?;
        session.select_answer(question_id, score)?;
        Ok(session.view())
    }

    pub fn next(&self, id: SessionId) -> Result<SessionView, ServiceError> {
        let mut session = self.sessions.acquire(id)?;
        session.next()?;
        Ok(session.view())
    }

    pub fn previous(&self, id: SessionId) -> Result<SessionView, ServiceError> {
        let mut session = self.sessions.acquire(id)?;
        session.previous()?;
        Ok(session.view())
    }

    /// The session lock is held across the scorer call, so a second submit
    /// on the same session is refused while this one is in flight.
    pub async fn submit(
        &self,
        id: SessionId,
        cohort: &[AnswerSet],
    ) -> Result<SessionView, ServiceError> {
        let mut session = self.sessions.acquire(id)?;
        session.submit(self.scorer.as_ref(), cohort).await?;
        info!(session_id = %id, "session scored");
        Ok(session.view())
    }

    pub fn restart(&self, id: SessionId) -> Result<SessionView, ServiceError> {
        let mut session = self.sessions.acquire(id)?;
        session.restart();
        Ok(session.view())
    }

    pub fn export(&self, id: SessionId, now: NaiveDateTime) -> Result<ExportArtifact, ServiceError> {
        let session = self.sessions.acquire(id)?;
        Ok(session.export(&self.composer, now)?)
    }

    pub fn render_region(
        &self,
        id: SessionId,
        region: RegionKind,
        viewport_width_px: u32,
        viewport_height_px: u32,
    ) -> Result<CapturedPage, ServiceError> {
        let session = self.sessions.acquire(id)?;
        Ok(session.render_region(
            &self.composer,
            region,
            viewport_width_px,
            viewport_height_px,
        )?)
    }

    pub async fn deliver(&self, id: SessionId, address: &str) -> Result<(), ServiceError> {
        let session = self.sessions.acquire(id)?;
        session.deliver(self.delivery.as_ref(), address).await?;
        info!(session_id = %id, "diagnosis delivered");
        Ok(())
    }
}
