use customer_lens::data::export::default_export_name;
use customer_lens::data::model::GroupKey;
use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use crate::color::tier_color;
use crate::state::{AppState, FilterDimension, Page};
use crate::ui::{fmt_count, fmt_money};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.session.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!(
                "{} customers loaded, {} in Explorer",
                fmt_count(session.customers.len()),
                fmt_count(state.visible_indices.len())
            ))
            .on_hover_text(format!(
                "{}\n{}",
                session.customers_path.display(),
                session.statistics_path.display()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(msg);
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – navigation and Explorer filters
// ---------------------------------------------------------------------------

pub fn navigation(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Customer Lens");
    ui.separator();

    for page in Page::ALL {
        if ui.selectable_label(state.page == page, page.title()).clicked() {
            state.page = page;
        }
    }

    if state.page == Page::Explorer && state.session.is_some() {
        ui.add_space(8.0);
        ui.heading("Filters");
        ui.separator();
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| filter_panel(ui, state));
    }
}

fn filter_panel(ui: &mut Ui, state: &mut AppState) {
    for dim in FilterDimension::ALL {
        let values = state.dimension_values(dim);
        let (n_selected, n_total) = state.selected_count(dim);
        let header_text = format!("{}  ({n_selected}/{n_total})", dim.title());

        egui::CollapsingHeader::new(RichText::new(header_text).strong())
            .id_salt(dim.title())
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        state.select_all(dim);
                    }
                    if ui.small_button("None").clicked() {
                        state.select_none(dim);
                    }
                });

                for key in &values {
                    let text = RichText::new(key.to_string()).color(swatch(state, dim, key));
                    let mut checked = state.is_selected(dim, key);
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_value(dim, key);
                    }
                }
            });
    }

    ui.separator();
    ui.strong("Predicted CLV");
    if ui.checkbox(&mut state.clv_limit, "Limit range").changed() {
        state.apply_clv_range();
    }
    let mut changed = false;
    ui.add_enabled_ui(state.clv_limit, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Min");
            changed |= ui
                .add(DragValue::new(&mut state.clv_bounds.0).speed(10.0).prefix("$"))
                .changed();
        });
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Max");
            changed |= ui
                .add(DragValue::new(&mut state.clv_bounds.1).speed(10.0).prefix("$"))
                .changed();
        });
    });
    if changed {
        state.apply_clv_range();
    }
    if let Some(err) = &state.filter_error {
        ui.label(RichText::new(err).color(Color32::RED));
    }

    ui.separator();
    if ui.button("Reset filters").clicked() {
        state.reset_filters();
    }
}

fn swatch(state: &AppState, dim: FilterDimension, key: &GroupKey) -> Color32 {
    match dim {
        FilterDimension::RfmSegment => state.segment_colors.color_for(key),
        FilterDimension::ClvSegment => tier_color(&key.to_string()),
        FilterDimension::Cluster => state.cluster_colors.color_for(key),
    }
}

// ---------------------------------------------------------------------------
// KPI strip
// ---------------------------------------------------------------------------

/// Headline numbers from the statistics document, shown above every page.
pub fn kpi_strip(ui: &mut Ui, state: &AppState) {
    let Some(session) = &state.session else {
        return;
    };
    let stats = &session.statistics;
    ui.columns(4, |cols| {
        metric(&mut cols[0], "Total Customers", &fmt_count(stats.total_customers as usize));
        metric(&mut cols[1], "Total Revenue", &fmt_money(stats.total_revenue));
        metric(&mut cols[2], "Avg Revenue/Customer", &fmt_money(stats.avg_monetary));
        metric(&mut cols[3], "Top Segment", stats.top_segment().unwrap_or("–"));
    });
    ui.separator();
}

pub fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small().weak());
        ui.label(RichText::new(value).heading().strong());
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Ask for a customer table and then its statistics document.
pub fn open_file_dialog(state: &mut AppState) {
    let Some(customers) = rfd::FileDialog::new()
        .set_title("Open customer table")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
    else {
        return;
    };

    let mut dialog = rfd::FileDialog::new()
        .set_title("Open summary statistics")
        .add_filter("JSON", &["json"]);
    if let Some(dir) = customers.parent() {
        dialog = dialog.set_directory(dir);
    }
    let Some(statistics) = dialog.pick_file() else {
        return;
    };

    state.load(&customers, &statistics);
}

/// Save the Explorer result as CSV.
pub fn export_file_dialog(state: &mut AppState) {
    let file_name = default_export_name(chrono::Local::now().naive_local());
    let file = rfd::FileDialog::new()
        .set_title("Export filtered customers")
        .set_file_name(file_name)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_visible(&path);
    }
}
