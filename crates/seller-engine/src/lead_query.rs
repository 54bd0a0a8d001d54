use serde::{Deserialize, Serialize};

use crate::{
    config::DEFAULT_PAGE_SIZE,
    lead::{Lead, LeadStatus},
    preferences::FilterPreferences,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Descending,
    Ascending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Descending => Self::Ascending,
            Self::Ascending => Self::Descending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Descending => "↓",
            Self::Ascending => "↑",
        }
    }
}

/// Search, status filter and score ordering for the leads table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeadQuery {
    pub search: String,
    pub status: Option<LeadStatus>,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl LeadQuery {
    pub fn matches(&self, lead: &Lead) -> bool {
        let needle = self.search.to_lowercase();
        let text_match = needle.is_empty()
            || lead.name.to_lowercase().contains(&needle)
            || lead.company.to_lowercase().contains(&needle);
        let status_match = self.status.is_none_or(|status| lead.status == status);
        text_match && status_match
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        let mut matched: Vec<&Lead> = leads.iter().filter(|lead| self.matches(lead)).collect();
        match self.sort {
            SortDirection::Descending => matched.sort_by(|a, b| b.score.cmp(&a.score)),
            SortDirection::Ascending => matched.sort_by(|a, b| a.score.cmp(&b.score)),
        }
        matched
    }

    /// One page of matching leads; out-of-range pages clamp to the nearest valid one.
    pub fn page(&self, leads: &[Lead], page: usize, page_size: usize) -> LeadPage {
        let page_size = page_size.max(1);
        let matched = self.apply(leads);
        let total_matches = matched.len();
        let total_pages = total_matches.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);
        let start = (page - 1) * page_size;
        let leads = matched
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();
        LeadPage {
            leads,
            page,
            total_pages,
            total_matches,
            has_prev: page > 1,
            has_next: page * page_size < total_matches,
        }
    }
}

/// Query plus current page. Changing the query goes back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadBrowser {
    query: LeadQuery,
    page: usize,
    page_size: usize,
}

impl Default for LeadBrowser {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl LeadBrowser {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: LeadQuery::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn from_preferences(prefs: &FilterPreferences, page_size: usize) -> Self {
        Self {
            query: prefs.to_query(),
            ..Self::new(page_size)
        }
    }

    pub fn query(&self) -> &LeadQuery {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn preferences(&self) -> FilterPreferences {
        FilterPreferences::from_query(&self.query)
    }

    pub fn set_query(&mut self, query: LeadQuery) {
        if query != self.query {
            self.query = query;
            self.page = 1;
        }
    }

    pub fn set_search(&mut self, search: &str) {
        let query = LeadQuery {
            search: search.to_string(),
            ..self.query.clone()
        };
        self.set_query(query);
    }

    pub fn set_status(&mut self, status: Option<LeadStatus>) {
        let query = LeadQuery {
            status,
            ..self.query.clone()
        };
        self.set_query(query);
    }

    pub fn toggle_sort(&mut self) {
        let query = LeadQuery {
            sort: self.query.sort.toggled(),
            ..self.query.clone()
        };
        self.set_query(query);
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page += 1;
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Renders the current page and pins the stored page number to its clamped value.
    pub fn view(&mut self, leads: &[Lead]) -> LeadPage {
        let page = self.query.page(leads, self.page, self.page_size);
        self.page = page.page;
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(id: u64, name: &str, company: &str, score: u8, status: LeadStatus) -> Lead {
        Lead {
            id,
            name: name.to_string(),
            company: company.to_string(),
            email: format!("lead{id}@example.com"),
            score,
            status,
        }
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead(1, "Alice", "TechCorp", 90, LeadStatus::New),
            lead(2, "Bob", "Initech", 40, LeadStatus::Contacted),
            lead(3, "Carol", "Techno Farms", 75, LeadStatus::Lost),
            lead(4, "Dave", "Globex", 60, LeadStatus::New),
        ]
    }

    #[test]
    fn search_matches_name_or_company_case_insensitively() {
        let leads = sample();
        let query = LeadQuery {
            search: "TECH".to_string(),
            ..LeadQuery::default()
        };
        let ids: Vec<u64> = query.apply(&leads).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let query = LeadQuery {
            search: "bob".to_string(),
            ..LeadQuery::default()
        };
        assert_eq!(query.apply(&leads).len(), 1);
    }

    #[test]
    fn status_filter_and_sort_direction() {
        let leads = sample();
        let query = LeadQuery {
            status: Some(LeadStatus::New),
            sort: SortDirection::Ascending,
            ..LeadQuery::default()
        };
        let ids: Vec<u64> = query.apply(&leads).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![4, 1]);

        let ids: Vec<u64> = LeadQuery::default().apply(&leads).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 2]);
    }

    #[test]
    fn pagination_bounds() {
        let leads: Vec<Lead> = (1..=23)
            .map(|i| lead(i, &format!("L{i}"), "Co", (i % 100) as u8, LeadStatus::New))
            .collect();
        let query = LeadQuery::default();

        let first = query.page(&leads, 1, 10);
        assert_eq!(first.leads.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_prev);
        assert!(first.has_next);

        let last = query.page(&leads, 3, 10);
        assert_eq!(last.leads.len(), 3);
        assert!(last.has_prev);
        assert!(!last.has_next);

        let past_end = query.page(&leads, 9, 10);
        assert_eq!(past_end.page, 3);

        let empty = query.page(&[], 1, 10);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.leads.is_empty());
        assert!(!empty.has_next);
    }

    #[test]
    fn browser_resets_page_when_query_changes() {
        let leads: Vec<Lead> = (1..=30)
            .map(|i| lead(i, &format!("L{i}"), "Co", 50, LeadStatus::New))
            .collect();
        let mut browser = LeadBrowser::new(10);
        browser.next_page();
        browser.next_page();
        assert_eq!(browser.view(&leads).page, 3);

        browser.toggle_sort();
        assert_eq!(browser.page(), 1);

        browser.go_to(2);
        browser.set_search("L1");
        assert_eq!(browser.page(), 1);

        browser.go_to(2);
        browser.set_search("L1");
        assert_eq!(browser.page(), 2, "unchanged query keeps the page");

        browser.prev_page();
        browser.prev_page();
        assert_eq!(browser.page(), 1);
    }
}
