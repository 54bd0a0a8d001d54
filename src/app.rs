use eframe::egui::{self, menu, Ui};
use seller_engine::{
    Notice, SellerConsole,
    config::SellerConfig,
    lead_query::LeadBrowser,
    lead_source::lead_source_for,
    preferences::{FilterPreferences, JsonFilePreferenceStore, PreferenceStore},
};

use crate::{
    detail_panel,
    leads_panel::LeadsPanel,
    opportunities_panel,
};

pub struct SellerApp {
    console: SellerConsole,
    browser: LeadBrowser,
    leads_panel: LeadsPanel,
    preferences: Box<dyn PreferenceStore>,
    saved_preferences: FilterPreferences,
    leads_location: String,
}

impl SellerApp {
    pub fn new(ctx: &egui::Context, console: SellerConsole, config: &SellerConfig) -> Self {
        let preferences = Box::new(JsonFilePreferenceStore::new(&config.preferences_path));
        Self::with_preference_store(ctx, console, config, preferences)
    }

    pub fn with_preference_store(
        ctx: &egui::Context,
        console: SellerConsole,
        config: &SellerConfig,
        preferences: Box<dyn PreferenceStore>,
    ) -> Self {
        // Settled writes change state off the UI thread; wake the frame loop.
        let repaint = ctx.clone();
        console.set_settle_hook(move || repaint.request_repaint());

        let saved_preferences = preferences.load();
        let browser = LeadBrowser::from_preferences(&saved_preferences, config.page_size);
        Self {
            console,
            leads_panel: LeadsPanel::new(&browser),
            browser,
            preferences,
            saved_preferences,
            leads_location: config.leads_source.clone(),
        }
    }

    pub fn console(&self) -> &SellerConsole {
        &self.console
    }

    pub fn browser(&self) -> &LeadBrowser {
        &self.browser
    }

    pub fn leads_location(&self) -> &str {
        &self.leads_location
    }

    /// Replaces the lead list. A failed load leaves the error on screen in place of the table.
    pub fn load_leads(&mut self, location: &str) {
        self.leads_location = location.to_string();
        let source = lead_source_for(location);
        match self.console.load_leads(source.as_ref()) {
            Ok(count) => tracing::info!(count, source = %source.describe(), "loaded leads"),
            Err(e) => tracing::warn!(source = %source.describe(), error = %e, "could not load leads"),
        }
    }

    fn persist_preferences(&mut self) {
        let current = self.browser.preferences();
        if current != self.saved_preferences {
            self.preferences.save(&current);
            self.saved_preferences = current;
        }
    }

    pub fn render_menu_bar(&mut self, ui: &mut Ui) {
        menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open leads…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .pick_file()
                    {
                        self.load_leads(&path.display().to_string());
                    }
                }
                if ui.button("Reload").clicked() {
                    let location = self.leads_location.clone();
                    self.load_leads(&location);
                }
            });
        });
    }

    fn render_notice(&self, ctx: &egui::Context, notice: &Notice) {
        egui::Window::new("Save failed")
            .id(egui::Id::new("seller_notice"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&notice.message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    if let Err(e) = self.console.acknowledge_notice(notice.id) {
                        tracing::warn!(notice = notice.id, error = %e, "could not dismiss notice");
                    }
                }
            });
    }
}

impl eframe::App for SellerApp {
    // Required by eframe 0.34; all rendering happens in `update`, which
    // eframe still invokes immediately before `ui` each frame.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snapshot = self.console.snapshot();
        // An unacknowledged notice blocks the rest of the window.
        let interactive = snapshot.notices.is_empty();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_enabled_ui(interactive, |ui| self.render_menu_bar(ui));
        });

        if let (Some(lead), Some(session)) = (&snapshot.selected_lead, &snapshot.session) {
            let mut action = None;
            egui::SidePanel::right("lead_detail")
                .min_width(320.0)
                .show(ctx, |ui| {
                    ui.add_enabled_ui(interactive, |ui| {
                        action = detail_panel::render(ui, &self.console, lead, session);
                    });
                });
            if let Some(action) = action {
                detail_panel::perform(&self.console, action);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_enabled_ui(interactive, |ui| {
                    self.leads_panel.render(
                        ui,
                        &self.console,
                        &mut self.browser,
                        &snapshot.leads,
                        snapshot.load_error.as_deref(),
                    );
                    ui.add_space(12.0);
                    ui.separator();
                    opportunities_panel::render(ui, &self.console, &snapshot.opportunities);
                });
            });
        });

        if let Some(notice) = snapshot.notices.first() {
            self.render_notice(ctx, notice);
        }

        self.persist_preferences();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seller_engine::{LeadStatus, WriteSimulator};

    fn open_app(dir: &tempfile::TempDir) -> SellerApp {
        let config = SellerConfig {
            preferences_path: dir.path().join("filters.json").display().to_string(),
            ..SellerConfig::default()
        };
        let writer = WriteSimulator::from_config(&config.write, tokio::runtime::Handle::current());
        SellerApp::new(&egui::Context::default(), SellerConsole::new(writer), &config)
    }

    #[tokio::test]
    async fn filter_changes_are_written_once() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = open_app(&dir);
        app.browser.set_status(Some(LeadStatus::Contacted));
        app.persist_preferences();

        let reopened = open_app(&dir);
        assert_eq!(reopened.browser().query().status, Some(LeadStatus::Contacted));
        assert_eq!(reopened.browser().page(), 1);
    }

    #[tokio::test]
    async fn missing_leads_file_shows_load_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = open_app(&dir);
        let missing = dir.path().join("nope.json").display().to_string();
        app.load_leads(&missing);
        assert_eq!(app.leads_location(), missing);
        assert!(app.console().leads().is_empty());
        assert!(app.console().load_error().is_some());
    }
}
