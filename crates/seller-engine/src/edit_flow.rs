//! Edit session for the selected lead and the optimistic save protocol.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    console::SellerConsole,
    error::{Result, SellerError},
    lead::{Lead, LeadId, LeadStatus},
    remote_write::{PendingWrite, WriteOutcome},
};

pub const INVALID_EMAIL_MESSAGE: &str = "Invalid email format.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save. Changes were reverted.";

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles");
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Clamps user-entered amounts to a finite, non-negative value.
pub fn sanitize_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Input fields for the selected lead, tracked apart from the stored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditSession {
    pub(crate) session_id: u64,
    pub(crate) lead_id: LeadId,
    pub(crate) email: String,
    pub(crate) status: LeadStatus,
    pub(crate) amount: f64,
    pub(crate) error: Option<String>,
    pub(crate) saving: bool,
}

impl EditSession {
    pub(crate) fn for_lead(session_id: u64, lead: &Lead) -> Self {
        Self {
            session_id,
            lead_id: lead.id,
            email: lead.email.clone(),
            status: lead.status,
            amount: 0.0,
            error: None,
            saving: false,
        }
    }

    pub fn lead_id(&self) -> LeadId {
        self.lead_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn status(&self) -> LeadStatus {
        self.status
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a save for this lead is in flight; inputs are disabled.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn email_is_valid(&self) -> bool {
        is_valid_email(&self.email)
    }
}

impl SellerConsole {
    fn with_editable_session<T>(&self, f: impl FnOnce(&mut EditSession) -> T) -> Result<T> {
        let mut state = self.state.lock();
        let session = state.session.as_mut().ok_or(SellerError::NoSelection)?;
        if session.saving {
            return Err(SellerError::WritePending(session.lead_id));
        }
        Ok(f(session))
    }

    pub fn set_email(&self, email: &str) -> Result<()> {
        self.with_editable_session(|session| session.email = email.to_string())
    }

    pub fn set_status(&self, status: LeadStatus) -> Result<()> {
        self.with_editable_session(|session| session.status = status)
    }

    pub fn set_amount(&self, amount: f64) -> Result<()> {
        self.with_editable_session(|session| session.amount = sanitize_amount(amount))
    }

    /// Validates the session's email, then writes email/status to the lead
    /// optimistically. The lead stays locked until the write settles; a failed
    /// write restores the previous record and keeps the panel open.
    pub fn save(&self) -> Result<PendingWrite> {
        let (lead_id, session_id, generation, previous, edited) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let session = state.session.as_mut().ok_or(SellerError::NoSelection)?;
            let lead_id = session.lead_id;
            if state.locked_leads.contains(&lead_id) {
                return Err(SellerError::WritePending(lead_id));
            }

            session.error = None;
            if !is_valid_email(&session.email) {
                session.error = Some(INVALID_EMAIL_MESSAGE.to_string());
                return Err(SellerError::Validation(INVALID_EMAIL_MESSAGE.to_string()));
            }

            let previous = state
                .leads
                .get(lead_id)
                .cloned()
                .ok_or(SellerError::LeadNotFound(lead_id))?;
            let edited = previous.with_contact(&session.email, session.status);
            let session_id = session.session_id;
            let generation = state.load_generation;
            state.locked_leads.insert(lead_id);
            state.sync_session_lock();
            (lead_id, session_id, generation, previous, edited)
        };

        let apply_state = Arc::clone(&self.state);
        let rollback_state = Arc::clone(&self.state);
        let settle_state = Arc::clone(&self.state);
        let notify = self.settle_notifier();

        tracing::info!(lead_id, "saving lead");
        let pending = self.writer.attempt_write(
            move || {
                if let Err(e) = apply_state.lock().leads.replace(edited) {
                    tracing::warn!(lead_id, error = %e, "optimistic lead update had no target");
                }
            },
            move || {
                let mut state = rollback_state.lock();
                if state.load_generation != generation {
                    tracing::debug!(lead_id, "leads reloaded since save, skipping rollback");
                    return;
                }
                if let Err(e) = state.leads.replace(previous) {
                    tracing::warn!(lead_id, error = %e, "lead rollback had no target");
                }
            },
            move |outcome| {
                {
                    let mut state = settle_state.lock();
                    if state.load_generation == generation {
                        state.locked_leads.remove(&lead_id);
                        let current = state
                            .session
                            .as_ref()
                            .is_some_and(|s| s.session_id == session_id);
                        match outcome {
                            WriteOutcome::Succeeded => {
                                tracing::info!(lead_id, "lead saved");
                                if current {
                                    state.close_session();
                                }
                            }
                            WriteOutcome::Failed { .. } => {
                                tracing::warn!(lead_id, "lead save failed, changes reverted");
                                if current {
                                    if let Some(session) = state.session.as_mut() {
                                        session.error = Some(SAVE_FAILED_MESSAGE.to_string());
                                    }
                                }
                            }
                        }
                        state.sync_session_lock();
                    }
                }
                notify();
            },
        );
        Ok(pending)
    }
}
