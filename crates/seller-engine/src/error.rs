use thiserror::Error;

use crate::{lead::LeadId, opportunity::OpportunityId};

#[derive(Debug, Error)]
pub enum SellerError {
    /// Edit input rejected before any write was attempted.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    LoadFailure(String),

    #[error("No lead is selected")]
    NoSelection,

    #[error("Lead {0} not found")]
    LeadNotFound(LeadId),

    #[error("Opportunity {0} not found")]
    OpportunityNotFound(OpportunityId),

    /// The lead has a write in flight; its inputs are disabled until it settles.
    #[error("Lead {0} has a pending write")]
    WritePending(LeadId),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<String> for SellerError {
    fn from(err: String) -> Self {
        SellerError::InvalidInput(err)
    }
}

pub type Result<T, E = SellerError> = std::result::Result<T, E>;
