use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CustomerLensApp {
    pub state: AppState,
}

impl CustomerLensApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for CustomerLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: pages and filters ----
        egui::SidePanel::left("navigation")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::navigation(ui, &mut self.state);
            });

        // ---- Central panel: current page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(err) = &self.state.load_error {
                load_failed(ui, err);
                return;
            }
            let Some(session) = &self.state.session else {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open customer data to begin  (File → Open…)");
                });
                return;
            };
            if session.customers.is_empty() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading(format!(
                        "{} has no customer rows",
                        session.customers_path.display()
                    ));
                });
                return;
            }

            panels::kpi_strip(ui, &self.state);
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| pages::show(ui, &mut self.state));
        });
    }
}

fn load_failed(ui: &mut Ui, err: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(40.0);
        ui.heading("Could not load customer data");
        ui.label(RichText::new(err).color(egui::Color32::RED));
        ui.label("Check the input files and use File → Open… to try again.");
    });
}
