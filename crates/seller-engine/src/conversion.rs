use std::sync::Arc;

use crate::{
    console::SellerConsole,
    edit_flow::{EditSession, sanitize_amount},
    error::{Result, SellerError},
    lead::Lead,
    opportunity::{Opportunity, OpportunityId, Stage},
    remote_write::{PendingWrite, WriteOutcome},
};

pub const CONVERSION_FAILED_MESSAGE: &str = "Failed to save opportunity. Rolled back.";

/// Opportunity seeded from the lead's identity and the session's in-progress edits.
pub fn build_opportunity(id: OpportunityId, lead: &Lead, session: &EditSession) -> Opportunity {
    Opportunity {
        id,
        name: lead.name.clone(),
        stage: Stage::from(session.status()),
        amount: sanitize_amount(session.amount()),
        account_name: lead.company.clone(),
    }
}

impl SellerConsole {
    /// Inserts an opportunity for the selected lead and closes the panel right
    /// away. A failed write removes the opportunity again and raises a notice;
    /// the panel stays closed either way.
    pub fn convert(&self) -> Result<PendingWrite> {
        let opportunity = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let session = state.session.as_ref().ok_or(SellerError::NoSelection)?;
            let lead_id = session.lead_id();
            if state.locked_leads.contains(&lead_id) {
                return Err(SellerError::WritePending(lead_id));
            }
            let lead = state
                .leads
                .get(lead_id)
                .ok_or(SellerError::LeadNotFound(lead_id))?;
            let id = state.opportunities.next_id();
            build_opportunity(id, lead, session)
        };
        let opportunity_id = opportunity.id;

        let apply_state = Arc::clone(&self.state);
        let rollback_state = Arc::clone(&self.state);
        let settle_state = Arc::clone(&self.state);
        let notify = self.settle_notifier();

        tracing::info!(opportunity_id, name = %opportunity.name, "converting lead");
        let pending = self.writer.attempt_write(
            move || {
                let mut state = apply_state.lock();
                state.opportunities.insert(opportunity);
                state.close_session();
            },
            move || {
                if rollback_state.lock().opportunities.remove(opportunity_id).is_none() {
                    tracing::warn!(opportunity_id, "opportunity rollback had nothing to remove");
                }
            },
            move |outcome| {
                match outcome {
                    WriteOutcome::Succeeded => {
                        tracing::info!(opportunity_id, "opportunity saved");
                    }
                    WriteOutcome::Failed { .. } => {
                        tracing::warn!(opportunity_id, "opportunity save failed, rolled back");
                        settle_state.lock().raise_notice(CONVERSION_FAILED_MESSAGE);
                    }
                }
                notify();
            },
        );
        Ok(pending)
    }

    /// Direct stage change; not routed through the write simulator.
    pub fn update_stage(&self, id: OpportunityId, stage: Stage) -> Result<()> {
        self.state.lock().opportunities.update_stage(id, stage)?;
        tracing::debug!(opportunity_id = id, stage = %stage, "opportunity stage updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lead::LeadStatus,
        remote_write::{FixedOutcome, OutcomeSource, ScriptedOutcomes, WriteSimulator},
    };
    use std::time::Duration;

    fn alice() -> Lead {
        Lead {
            id: 1,
            name: "Alice".to_string(),
            company: "TechCorp".to_string(),
            email: "a@x.com".to_string(),
            score: 90,
            status: LeadStatus::New,
        }
    }

    fn console_with(outcomes: Arc<dyn OutcomeSource>) -> SellerConsole {
        let writer = WriteSimulator::new(
            Duration::from_millis(1000),
            outcomes,
            tokio::runtime::Handle::current(),
        );
        SellerConsole::with_leads(writer, vec![alice()]).expect("console")
    }

    #[test]
    fn opportunity_copies_lead_identity_and_session_edits() {
        let lead = alice();
        let mut session = EditSession::for_lead(1, &lead);
        session.status = LeadStatus::Contacted;
        session.amount = 500.0;
        let opp = build_opportunity(7, &lead, &session);
        assert_eq!(opp.id, 7);
        assert_eq!(opp.name, "Alice");
        assert_eq!(opp.account_name, "TechCorp");
        assert_eq!(opp.stage, Stage::Contacted);
        assert_eq!(opp.amount, 500.0);

        let untouched = build_opportunity(8, &lead, &EditSession::for_lead(2, &lead));
        assert_eq!(untouched.stage, Stage::New);
        assert_eq!(untouched.amount, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn convert_inserts_and_closes_panel_before_outcome() {
        let console = console_with(Arc::new(FixedOutcome::success()));
        console.select_lead(1).unwrap();
        console.set_amount(120.0).unwrap();

        let pending = console.convert().unwrap();
        let opportunities = console.opportunities();
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].amount, 120.0);
        assert!(console.selected_lead().is_none());
        assert!(!pending.is_settled());

        assert!(pending.settled().await.is_success());
        assert_eq!(console.opportunities(), opportunities);
        assert!(console.notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_convert_removes_opportunity_and_raises_notice() {
        let console = console_with(Arc::new(FixedOutcome::failure()));
        console.select_lead(1).unwrap();
        console.set_status(LeadStatus::Contacted).unwrap();
        console.set_amount(500.0).unwrap();

        let pending = console.convert().unwrap();
        assert!(console.opportunities().iter().any(|o| o.name == "Alice"));

        assert!(!pending.settled().await.is_success());
        assert!(console.opportunities().iter().all(|o| o.name != "Alice"));
        let notices = console.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, CONVERSION_FAILED_MESSAGE);
        // the panel is not reopened after a failed conversion
        assert!(console.selected_lead().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_only_removes_its_own_opportunity() {
        let console = console_with(Arc::new(ScriptedOutcomes::new([true, false], true)));
        console.select_lead(1).unwrap();
        let first = console.convert().unwrap();
        console.select_lead(1).unwrap();
        console.set_amount(42.0).unwrap();
        let second = console.convert().unwrap();
        assert_eq!(console.opportunities().len(), 2);

        assert!(first.settled().await.is_success());
        assert!(!second.settled().await.is_success());
        let remaining = console.opportunities();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].amount, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn convert_uses_unsaved_edits_and_leaves_lead_untouched() {
        let console = console_with(Arc::new(FixedOutcome::success()));
        console.select_lead(1).unwrap();
        console.set_email("unsaved@x.com").unwrap();
        console.set_status(LeadStatus::Lost).unwrap();
        console.convert().unwrap().settled().await;

        assert_eq!(console.opportunities()[0].stage, Stage::Lost);
        assert_eq!(console.lead(1).unwrap(), alice());
    }

    #[tokio::test(start_paused = true)]
    async fn convert_requires_selection_and_idle_lead() {
        let console = console_with(Arc::new(FixedOutcome::success()));
        assert!(matches!(console.convert(), Err(SellerError::NoSelection)));

        console.select_lead(1).unwrap();
        let save = console.save().unwrap();
        assert!(matches!(console.convert(), Err(SellerError::WritePending(1))));
        assert!(console.opportunities().is_empty());
        save.settled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stage_update_is_synchronous() {
        let console = console_with(Arc::new(FixedOutcome::success()));
        console.select_lead(1).unwrap();
        console.convert().unwrap().settled().await;
        let id = console.opportunities()[0].id;

        console.update_stage(id, Stage::InProgress).unwrap();
        assert_eq!(console.opportunity(id).unwrap().stage, Stage::InProgress);

        let before = console.opportunity(id).unwrap();
        console.update_stage(id, Stage::InProgress).unwrap();
        assert_eq!(console.opportunity(id).unwrap(), before);

        assert!(matches!(
            console.update_stage(id + 100, Stage::Won),
            Err(SellerError::OpportunityNotFound(_))
        ));
    }
}
