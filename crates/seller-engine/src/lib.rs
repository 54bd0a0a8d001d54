//! Lead and opportunity state for the Seller Console, with optimistic
//! writes that settle against a simulated remote.

pub mod config;
pub mod console;
pub mod conversion;
pub mod edit_flow;
pub mod error;
pub mod lead;
pub mod lead_query;
pub mod lead_source;
pub mod lead_store;
pub mod opportunity;
pub mod opportunity_store;
pub mod preferences;
pub mod remote_write;
pub mod shell;

pub use console::{ConsoleSnapshot, Notice, SellerConsole};
pub use error::{Result, SellerError};
pub use lead::{Lead, LeadId, LeadStatus};
pub use opportunity::{Opportunity, OpportunityId, Stage};
pub use remote_write::{PendingWrite, WriteOutcome, WriteSimulator};
