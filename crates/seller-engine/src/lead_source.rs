//! Bulk lead loading from files, HTTP endpoints or memory.

use std::fs;

use crate::{
    error::{Result, SellerError},
    lead::Lead,
};

pub trait LeadSource {
    fn load(&self) -> Result<Vec<Lead>>;

    /// Human-readable origin for logs and status lines.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct JsonFileLeadSource {
    path: String,
}

impl JsonFileLeadSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl LeadSource for JsonFileLeadSource {
    fn load(&self) -> Result<Vec<Lead>> {
        let path = &self.path;
        let text = fs::read_to_string(path).map_err(|e| {
            SellerError::LoadFailure(format!("Could not read leads file '{path}': {e}"))
        })?;
        parse_leads_json(&text)
            .map_err(|e| SellerError::LoadFailure(format!("Could not parse leads file '{path}': {e}")))
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

#[derive(Debug, Clone)]
pub struct HttpLeadSource {
    url: String,
}

impl HttpLeadSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl LeadSource for HttpLeadSource {
    fn load(&self) -> Result<Vec<Lead>> {
        let url = &self.url;
        let response = reqwest::blocking::get(url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| SellerError::LoadFailure(format!("Could not fetch leads from '{url}': {e}")))?;
        let leads = response.json::<Vec<Lead>>()?;
        Ok(leads)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticLeadSource {
    leads: Vec<Lead>,
}

impl StaticLeadSource {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self { leads }
    }
}

impl LeadSource for StaticLeadSource {
    fn load(&self) -> Result<Vec<Lead>> {
        Ok(self.leads.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory lead(s)", self.leads.len())
    }
}

pub fn parse_leads_json(text: &str) -> Result<Vec<Lead>> {
    Ok(serde_json::from_str(text)?)
}

/// Picks an HTTP source for `http(s)://` locations and a file source otherwise.
pub fn lead_source_for(location: &str) -> Box<dyn LeadSource> {
    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Box::new(HttpLeadSource::new(location))
    } else {
        Box::new(JsonFileLeadSource::new(location))
    }
}
