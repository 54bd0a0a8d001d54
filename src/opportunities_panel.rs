use eframe::egui::{self, RichText};
use egui_extras::{Column, TableBuilder};
use seller_engine::{Opportunity, OpportunityId, SellerConsole, Stage};

pub fn format_amount(amount: f64) -> String {
    format!("${amount:.2}")
}

pub fn render(ui: &mut egui::Ui, console: &SellerConsole, opportunities: &[Opportunity]) {
    ui.heading("Opportunities");

    if opportunities.is_empty() {
        ui.label(RichText::new("No opportunities yet.").italics());
        return;
    }

    let mut stage_changes: Vec<(OpportunityId, Stage)> = Vec::new();
    ui.push_id("opportunities_table", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(40.0))
            .column(Column::auto().at_least(140.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(90.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["ID", "Name", "Stage", "Amount", "Account"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for opportunity in opportunities {
                    body.row(24.0, |mut row| {
                        row.col(|ui| {
                            ui.label(opportunity.id.to_string());
                        });
                        row.col(|ui| {
                            ui.label(&opportunity.name);
                        });
                        row.col(|ui| {
                            let mut stage = opportunity.stage;
                            egui::ComboBox::from_id_salt(("opportunity_stage", opportunity.id))
                                .selected_text(stage.as_str())
                                .show_ui(ui, |ui| {
                                    for option in Stage::ALL {
                                        ui.selectable_value(&mut stage, option, option.as_str());
                                    }
                                });
                            if stage != opportunity.stage {
                                stage_changes.push((opportunity.id, stage));
                            }
                        });
                        row.col(|ui| {
                            ui.label(format_amount(opportunity.amount));
                        });
                        row.col(|ui| {
                            ui.label(&opportunity.account_name);
                        });
                    });
                }
            });
    });

    for (id, stage) in stage_changes {
        if let Err(e) = console.update_stage(id, stage) {
            tracing::warn!(opportunity = id, error = %e, "could not change stage");
        }
    }
}
