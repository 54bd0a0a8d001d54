use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::lead::LeadStatus;

pub type OpportunityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    New,
    Contacted,
    #[serde(rename = "In Progress")]
    InProgress,
    Won,
    Lost,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::New,
        Stage::Contacted,
        Stage::InProgress,
        Stage::Won,
        Stage::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::InProgress => "In Progress",
            Self::Won => "Won",
            Self::Lost => "Lost",
        }
    }
}

impl From<LeadStatus> for Stage {
    fn from(status: LeadStatus) -> Self {
        match status {
            LeadStatus::New => Stage::New,
            LeadStatus::Contacted => Stage::Contacted,
            LeadStatus::Lost => Stage::Lost,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "inprogress" => Ok(Self::InProgress),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(format!(
                "Unknown stage '{}', expected New, Contacted, In Progress, Won or Lost",
                s.trim()
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub name: String,
    pub stage: Stage,
    pub amount: f64,
    pub account_name: String,
}
