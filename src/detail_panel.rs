use eframe::egui::{self, Color32, RichText};
use seller_engine::{
    Lead, LeadStatus, SellerConsole, SellerError,
    edit_flow::{EditSession, INVALID_EMAIL_MESSAGE},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    Save,
    Convert,
    Cancel,
}

pub fn save_button_label(session: &EditSession) -> &'static str {
    if session.is_saving() { "Saving..." } else { "Save" }
}

/// Side panel for the selected lead. Every input is disabled while a save is in flight.
pub fn render(
    ui: &mut egui::Ui,
    console: &SellerConsole,
    lead: &Lead,
    session: &EditSession,
) -> Option<DetailAction> {
    let editable = !session.is_saving();
    let mut action = None;

    ui.heading(&lead.name);
    ui.label(format!("Company: {}", lead.company));
    ui.label(format!("Score: {}", lead.score));
    ui.separator();

    egui::Grid::new("lead_detail_grid")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Email");
            ui.vertical(|ui| {
                let mut email = session.email().to_string();
                let response = ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut email).desired_width(220.0),
                );
                if response.changed() {
                    apply_edit(console.set_email(&email));
                }
                if !session.email().is_empty() && !session.email_is_valid() {
                    ui.small(RichText::new(INVALID_EMAIL_MESSAGE).color(Color32::RED));
                }
            });
            ui.end_row();

            ui.label("Status");
            let mut status = session.status();
            ui.add_enabled_ui(editable, |ui| {
                egui::ComboBox::from_id_salt("lead_detail_status")
                    .selected_text(status.as_str())
                    .show_ui(ui, |ui| {
                        for option in LeadStatus::ALL {
                            ui.selectable_value(&mut status, option, option.as_str());
                        }
                    });
            });
            if status != session.status() {
                apply_edit(console.set_status(status));
            }
            ui.end_row();

            ui.label("Amount");
            let mut amount = session.amount();
            let response = ui.add_enabled(
                editable,
                egui::DragValue::new(&mut amount)
                    .range(0.0..=f64::MAX)
                    .speed(10.0)
                    .prefix("$"),
            );
            if response.changed() {
                apply_edit(console.set_amount(amount));
            }
            ui.end_row();
        });

    if let Some(error) = session.error() {
        ui.add_space(4.0);
        ui.colored_label(Color32::RED, error);
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui
            .add_enabled(editable, egui::Button::new("Convert to Opportunity"))
            .clicked()
        {
            action = Some(DetailAction::Convert);
        }
        if ui.add_enabled(editable, egui::Button::new("Cancel")).clicked() {
            action = Some(DetailAction::Cancel);
        }
        if ui
            .add_enabled(editable, egui::Button::new(save_button_label(session)))
            .clicked()
        {
            action = Some(DetailAction::Save);
        }
        if session.is_saving() {
            ui.spinner();
        }
    });

    action
}

fn apply_edit(result: seller_engine::Result<()>) {
    if let Err(e) = result {
        tracing::debug!(error = %e, "edit ignored");
    }
}

/// Runs a panel action against the console. Pending writes keep running after
/// their handles are dropped.
pub fn perform(console: &SellerConsole, action: DetailAction) {
    match action {
        DetailAction::Cancel => console.cancel(),
        DetailAction::Save => match console.save() {
            Ok(pending) => tracing::debug!(write = pending.id(), "save started"),
            Err(SellerError::Validation(message)) => {
                tracing::debug!(%message, "save rejected");
            }
            Err(e) => tracing::warn!(error = %e, "could not start save"),
        },
        DetailAction::Convert => match console.convert() {
            Ok(pending) => tracing::debug!(write = pending.id(), "conversion started"),
            Err(e) => tracing::warn!(error = %e, "could not convert lead"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seller_engine::{WriteSimulator, remote_write::FixedOutcome};
    use std::{sync::Arc, time::Duration};

    fn console() -> SellerConsole {
        let writer = WriteSimulator::new(
            Duration::from_millis(1000),
            Arc::new(FixedOutcome::failure()),
            tokio::runtime::Handle::current(),
        );
        let lead = Lead {
            id: 1,
            name: "Alice".to_string(),
            company: "TechCorp".to_string(),
            email: "a@x.com".to_string(),
            score: 90,
            status: LeadStatus::New,
        };
        SellerConsole::with_leads(writer, vec![lead]).expect("console")
    }

    #[tokio::test(start_paused = true)]
    async fn save_action_marks_session_saving() {
        let console = console();
        let session = console.select_lead(1).expect("select");
        assert_eq!(save_button_label(&session), "Save");

        perform(&console, DetailAction::Save);
        let session = console.edit_session().expect("session");
        assert_eq!(save_button_label(&session), "Saving...");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_save_keeps_panel_with_error() {
        let console = console();
        console.select_lead(1).expect("select");
        console.set_email("broken").expect("email");

        perform(&console, DetailAction::Save);
        let session = console.edit_session().expect("session");
        assert!(!session.is_saving());
        assert_eq!(session.error(), Some(INVALID_EMAIL_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_action_closes_panel() {
        let console = console();
        console.select_lead(1).expect("select");
        perform(&console, DetailAction::Cancel);
        assert!(console.edit_session().is_none());
    }
}
