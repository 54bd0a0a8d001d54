use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub type LeadId = u64;

pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 3] = [LeadStatus::New, LeadStatus::Contacted, LeadStatus::Lost];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Lost => "Lost",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "lost" => Ok(Self::Lost),
            other => Err(format!(
                "Unknown lead status '{other}', expected New, Contacted or Lost"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub company: String,
    pub email: String,
    pub score: u8,
    #[serde(default)]
    pub status: LeadStatus,
}

impl Lead {
    /// Copy of this lead with the editable fields replaced.
    pub fn with_contact(&self, email: &str, status: LeadStatus) -> Self {
        Self {
            email: email.to_string(),
            status,
            ..self.clone()
        }
    }

    pub fn score_tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::High
        } else if score >= 60 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("contacted".parse::<LeadStatus>(), Ok(LeadStatus::Contacted));
        assert_eq!(" LOST ".parse::<LeadStatus>(), Ok(LeadStatus::Lost));
        let err = "won".parse::<LeadStatus>().expect_err("not a lead status");
        assert!(err.contains("won"));
    }

    #[test]
    fn missing_status_defaults_to_new() {
        let lead: Lead = serde_json::from_str(
            r#"{"id":7,"name":"Dana","company":"Acme","email":"dana@acme.io","score":55}"#,
        )
        .expect("parse lead");
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.score_tier(), ScoreTier::Low);
    }

    #[test]
    fn with_contact_keeps_identity_fields() {
        let lead = Lead {
            id: 1,
            name: "Alice".to_string(),
            company: "TechCorp".to_string(),
            email: "a@x.com".to_string(),
            score: 90,
            status: LeadStatus::New,
        };
        let edited = lead.with_contact("alice@newcorp.com", LeadStatus::Contacted);
        assert_eq!(edited.id, 1);
        assert_eq!(edited.company, "TechCorp");
        assert_eq!(edited.email, "alice@newcorp.com");
        assert_eq!(edited.status, LeadStatus::Contacted);
        assert_eq!(lead.email, "a@x.com");
    }

    #[test]
    fn score_tier_boundaries() {
        assert_eq!(ScoreTier::from_score(80), ScoreTier::High);
        assert_eq!(ScoreTier::from_score(79), ScoreTier::Medium);
        assert_eq!(ScoreTier::from_score(60), ScoreTier::Medium);
        assert_eq!(ScoreTier::from_score(59), ScoreTier::Low);
    }
}
