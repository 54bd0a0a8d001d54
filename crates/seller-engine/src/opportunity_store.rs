use crate::{
    error::{Result, SellerError},
    opportunity::{Opportunity, OpportunityId, Stage},
};

/// Opportunities created during this session, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct OpportunityStore {
    opportunities: Vec<Opportunity>,
    id_counter: OpportunityId,
}

impl OpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are never reused, even after a rolled-back insert.
    pub fn next_id(&mut self) -> OpportunityId {
        self.id_counter += 1;
        self.id_counter
    }

    pub fn list(&self) -> &[Opportunity] {
        &self.opportunities
    }

    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }

    pub fn get(&self, id: OpportunityId) -> Option<&Opportunity> {
        self.opportunities.iter().find(|opp| opp.id == id)
    }

    pub fn contains(&self, id: OpportunityId) -> bool {
        self.get(id).is_some()
    }

    pub fn insert(&mut self, opportunity: Opportunity) {
        self.opportunities.push(opportunity);
    }

    pub fn remove(&mut self, id: OpportunityId) -> Option<Opportunity> {
        let pos = self.opportunities.iter().position(|opp| opp.id == id)?;
        Some(self.opportunities.remove(pos))
    }

    pub fn update_stage(&mut self, id: OpportunityId, stage: Stage) -> Result<()> {
        let opportunity = self
            .opportunities
            .iter_mut()
            .find(|opp| opp.id == id)
            .ok_or(SellerError::OpportunityNotFound(id))?;
        opportunity.stage = stage;
        Ok(())
    }
}
