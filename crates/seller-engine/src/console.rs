use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;
use serde::Serialize;

use crate::{
    edit_flow::EditSession,
    error::{Result, SellerError},
    lead::{Lead, LeadId},
    lead_query::{LeadPage, LeadQuery},
    lead_source::LeadSource,
    lead_store::LeadStore,
    opportunity::{Opportunity, OpportunityId},
    opportunity_store::OpportunityStore,
    remote_write::WriteSimulator,
};

pub type NoticeId = u64;

/// A message the user has to acknowledge before it goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: NoticeId,
    pub message: String,
}

#[derive(Debug, Default)]
pub(crate) struct ConsoleState {
    pub(crate) leads: LeadStore,
    pub(crate) opportunities: OpportunityStore,
    pub(crate) session: Option<EditSession>,
    /// Leads with an edit write in flight.
    pub(crate) locked_leads: HashSet<LeadId>,
    pub(crate) notices: Vec<Notice>,
    /// Bumped on every lead load. Writes started against an older list neither
    /// roll back nor unlock.
    pub(crate) load_generation: u64,
    session_counter: u64,
    notice_counter: NoticeId,
}

impl ConsoleState {
    /// Selecting the lead that is already open keeps its session, so a save in
    /// flight still settles into it.
    pub(crate) fn open_session(&mut self, id: LeadId) -> Result<&EditSession> {
        let lead = self.leads.select(id)?.clone();
        if self.session.as_ref().is_some_and(|s| s.lead_id == id) {
            self.sync_session_lock();
            return self.session.as_ref().ok_or(SellerError::NoSelection);
        }
        self.session_counter += 1;
        let mut session = EditSession::for_lead(self.session_counter, &lead);
        session.saving = self.locked_leads.contains(&id);
        Ok(&*self.session.insert(session))
    }

    pub(crate) fn close_session(&mut self) {
        self.leads.clear_selection();
        self.session = None;
    }

    pub(crate) fn sync_session_lock(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.saving = self.locked_leads.contains(&session.lead_id);
        }
    }

    pub(crate) fn raise_notice(&mut self, message: &str) -> NoticeId {
        self.notice_counter += 1;
        self.notices.push(Notice {
            id: self.notice_counter,
            message: message.to_string(),
        });
        self.notice_counter
    }
}

/// Everything a front-end needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleSnapshot {
    pub leads: Vec<Lead>,
    pub load_error: Option<String>,
    pub selected_lead: Option<Lead>,
    pub session: Option<EditSession>,
    pub opportunities: Vec<Opportunity>,
    pub notices: Vec<Notice>,
}

type SettleHook = Arc<dyn Fn() + Send + Sync>;

/// Cloneable handle over the lead store, opportunity store and edit session.
#[derive(Clone)]
pub struct SellerConsole {
    pub(crate) state: Arc<Mutex<ConsoleState>>,
    pub(crate) writer: WriteSimulator,
    settle_hook: Arc<Mutex<Option<SettleHook>>>,
}

impl SellerConsole {
    pub fn new(writer: WriteSimulator) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConsoleState::default())),
            writer,
            settle_hook: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_leads(writer: WriteSimulator, leads: Vec<Lead>) -> Result<Self> {
        let console = Self::new(writer);
        console.state.lock().leads = LeadStore::from_leads(leads)?;
        Ok(console)
    }

    pub fn writer(&self) -> &WriteSimulator {
        &self.writer
    }

    /// Called after every write settles, once the console state is updated.
    pub fn set_settle_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.settle_hook.lock() = Some(Arc::new(hook));
    }

    pub(crate) fn settle_notifier(&self) -> impl Fn() + Send + 'static {
        let hook = Arc::clone(&self.settle_hook);
        move || {
            let hook = hook.lock().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
    }

    pub fn load_leads(&self, source: &dyn LeadSource) -> Result<usize> {
        let mut state = self.state.lock();
        state.session = None;
        state.load_generation += 1;
        state.locked_leads.clear();
        state.leads.load_from(source)
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        let state = self.state.lock();
        ConsoleSnapshot {
            leads: state.leads.leads().to_vec(),
            load_error: state.leads.load_error().map(str::to_string),
            selected_lead: state.leads.selected().cloned(),
            session: state.session.clone(),
            opportunities: state.opportunities.list().to_vec(),
            notices: state.notices.clone(),
        }
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.state.lock().leads.leads().to_vec()
    }

    pub fn lead(&self, id: LeadId) -> Option<Lead> {
        self.state.lock().leads.get(id).cloned()
    }

    pub fn load_error(&self) -> Option<String> {
        self.state.lock().leads.load_error().map(str::to_string)
    }

    pub fn lead_page(&self, query: &LeadQuery, page: usize, page_size: usize) -> LeadPage {
        let state = self.state.lock();
        query.page(state.leads.leads(), page, page_size)
    }

    pub fn selected_lead(&self) -> Option<Lead> {
        self.state.lock().leads.selected().cloned()
    }

    pub fn edit_session(&self) -> Option<EditSession> {
        self.state.lock().session.clone()
    }

    /// Opens an edit session for `id`. A session for another lead is discarded.
    pub fn select_lead(&self, id: LeadId) -> Result<EditSession> {
        let mut state = self.state.lock();
        let session = state.open_session(id)?.clone();
        tracing::debug!(lead_id = id, "lead selected");
        Ok(session)
    }

    pub fn cancel(&self) {
        self.state.lock().close_session();
    }

    pub fn is_lead_locked(&self, id: LeadId) -> bool {
        self.state.lock().locked_leads.contains(&id)
    }

    pub fn opportunities(&self) -> Vec<Opportunity> {
        self.state.lock().opportunities.list().to_vec()
    }

    pub fn opportunity(&self, id: OpportunityId) -> Option<Opportunity> {
        self.state.lock().opportunities.get(id).cloned()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.state.lock().notices.clone()
    }

    pub fn acknowledge_notice(&self, id: NoticeId) -> Result<()> {
        let mut state = self.state.lock();
        let pos = state
            .notices
            .iter()
            .position(|notice| notice.id == id)
            .ok_or_else(|| SellerError::InvalidInput(format!("No notice with id {id}")))?;
        state.notices.remove(pos);
        Ok(())
    }
}

impl std::fmt::Debug for SellerConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SellerConsole")
            .field("state", &*self.state.lock())
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}
