use eframe::egui::{self, Color32, RichText};
use egui_extras::{Column, TableBuilder};
use seller_engine::{
    Lead, LeadId, LeadStatus, SellerConsole,
    lead::ScoreTier,
    lead_query::{LeadBrowser, LeadPage},
};

const ROW_HEIGHT: f32 = 22.0;

pub fn status_filter_label(status: Option<LeadStatus>) -> &'static str {
    match status {
        None => "All Status",
        Some(status) => status.as_str(),
    }
}

pub fn score_color(tier: ScoreTier) -> Color32 {
    match tier {
        ScoreTier::High => Color32::from_rgb(0x2e, 0x9e, 0x44),
        ScoreTier::Medium => Color32::from_rgb(0xd9, 0x9a, 0x06),
        ScoreTier::Low => Color32::from_rgb(0xc0, 0x39, 0x2b),
    }
}

pub fn page_label(page: &LeadPage) -> String {
    format!(
        "Page {} of {} ({} leads)",
        page.page, page.total_pages, page.total_matches
    )
}

/// Filter bar, leads table and pager.
#[derive(Debug, Default, Clone)]
pub struct LeadsPanel {
    search: String,
}

impl LeadsPanel {
    pub fn new(browser: &LeadBrowser) -> Self {
        Self {
            search: browser.query().search.clone(),
        }
    }

    pub fn render(
        &mut self,
        ui: &mut egui::Ui,
        console: &SellerConsole,
        browser: &mut LeadBrowser,
        leads: &[Lead],
        load_error: Option<&str>,
    ) {
        ui.heading("Leads");

        if let Some(error) = load_error {
            ui.colored_label(Color32::RED, error);
            return;
        }

        self.render_filters(ui, browser);
        ui.add_space(4.0);

        let page = browser.view(leads);
        if page.leads.is_empty() {
            ui.label(RichText::new("No leads found.").italics());
            return;
        }

        if let Some(id) = Self::render_table(ui, &page.leads, console) {
            if let Err(e) = console.select_lead(id) {
                tracing::warn!(lead = id, error = %e, "could not open lead");
            }
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(page.has_prev, egui::Button::new("Prev"))
                .clicked()
            {
                browser.prev_page();
            }
            ui.label(page_label(&page));
            if ui
                .add_enabled(page.has_next, egui::Button::new("Next"))
                .clicked()
            {
                browser.next_page();
            }
        });
    }

    fn render_filters(&mut self, ui: &mut egui::Ui, browser: &mut LeadBrowser) {
        ui.horizontal(|ui| {
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search by name or company...")
                    .desired_width(220.0),
            );
            if search.changed() {
                browser.set_search(&self.search);
            }

            let mut status = browser.query().status;
            egui::ComboBox::from_id_salt("lead_status_filter")
                .selected_text(status_filter_label(status))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut status, None, status_filter_label(None));
                    for option in LeadStatus::ALL {
                        ui.selectable_value(&mut status, Some(option), option.as_str());
                    }
                });
            if status != browser.query().status {
                browser.set_status(status);
            }

            let sort = browser.query().sort;
            if ui.button(format!("Score {}", sort.arrow())).clicked() {
                browser.toggle_sort();
            }
        });
    }

    fn render_table(ui: &mut egui::Ui, leads: &[Lead], console: &SellerConsole) -> Option<LeadId> {
        let mut clicked = None;
        ui.push_id("leads_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(140.0))
                .column(Column::auto().at_least(120.0))
                .column(Column::auto().at_least(200.0))
                .column(Column::auto().at_least(50.0))
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    for title in ["Name", "Company", "Email", "Score", "Status"] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for lead in leads {
                        body.row(ROW_HEIGHT, |mut row| {
                            row.col(|ui| {
                                if ui.link(&lead.name).clicked() {
                                    clicked = Some(lead.id);
                                }
                                if console.is_lead_locked(lead.id) {
                                    ui.spinner();
                                }
                            });
                            row.col(|ui| {
                                ui.label(&lead.company);
                            });
                            row.col(|ui| {
                                ui.label(&lead.email);
                            });
                            row.col(|ui| {
                                ui.colored_label(
                                    score_color(lead.score_tier()),
                                    lead.score.to_string(),
                                );
                            });
                            row.col(|ui| {
                                ui.label(lead.status.as_str());
                            });
                        });
                    }
                });
        });
        clicked
    }
}
