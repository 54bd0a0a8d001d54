use std::collections::HashSet;

use crate::{
    error::{Result, SellerError},
    lead::{Lead, LeadId, MAX_SCORE},
    lead_source::LeadSource,
};

pub const LOAD_FAILURE_MESSAGE: &str = "Could not load leads. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct LeadStore {
    leads: Vec<Lead>,
    selected: Option<LeadId>,
    load_error: Option<String>,
}

impl LeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_leads(leads: Vec<Lead>) -> Result<Self> {
        validate_leads(&leads)?;
        Ok(Self {
            leads,
            ..Self::default()
        })
    }

    /// Replaces the working set with whatever the source yields. A failed load
    /// leaves the store empty with a user-facing error; there is no retry.
    pub fn load_from(&mut self, source: &dyn LeadSource) -> Result<usize> {
        self.selected = None;
        let loaded = source.load().and_then(|leads| {
            validate_leads(&leads)?;
            Ok(leads)
        });
        match loaded {
            Ok(leads) => {
                tracing::info!(count = leads.len(), source = %source.describe(), "leads loaded");
                self.leads = leads;
                self.load_error = None;
                Ok(self.leads.len())
            }
            Err(e) => {
                tracing::warn!(source = %source.describe(), error = %e, "lead load failed");
                self.leads.clear();
                self.load_error = Some(LOAD_FAILURE_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn get(&self, id: LeadId) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    /// Swaps in a new version of a lead, returning the one it replaced.
    pub fn replace(&mut self, lead: Lead) -> Result<Lead> {
        let slot = self
            .leads
            .iter_mut()
            .find(|existing| existing.id == lead.id)
            .ok_or(SellerError::LeadNotFound(lead.id))?;
        Ok(std::mem::replace(slot, lead))
    }

    pub fn select(&mut self, id: LeadId) -> Result<&Lead> {
        let pos = self
            .leads
            .iter()
            .position(|lead| lead.id == id)
            .ok_or(SellerError::LeadNotFound(id))?;
        self.selected = Some(id);
        Ok(&self.leads[pos])
    }

    pub fn selected_id(&self) -> Option<LeadId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Lead> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

pub fn validate_leads(leads: &[Lead]) -> Result<()> {
    let mut seen = HashSet::new();
    for lead in leads {
        if !seen.insert(lead.id) {
            return Err(SellerError::LoadFailure(format!(
                "Duplicate lead id {}",
                lead.id
            )));
        }
        if lead.score > MAX_SCORE {
            return Err(SellerError::LoadFailure(format!(
                "Lead {} has score {} above {MAX_SCORE}",
                lead.id, lead.score
            )));
        }
    }
    Ok(())
}
