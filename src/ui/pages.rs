//! The dashboard pages. Every page except the Explorer describes the
//! whole customer base; the Explorer shows the filtered subset.

use std::collections::BTreeMap;

use customer_lens::data::model::{ClvTier, CustomerRecord, GroupField, GroupKey};
use customer_lens::data::summary::{
    box_stats, clv_overview, column_values, group_summary, histogram, integer_histogram,
    key_insights, playbook, revenue_by_group, tier_summary, value_counts, GroupSummary,
};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::{tier_color, ColorMap};
use crate::state::{AppState, Page, RfmAxis};
use crate::ui::panels::{export_file_dialog, metric};
use crate::ui::plot::{
    bar_chart, box_chart, histogram_chart, overlaid_histograms, scatter_chart, ScatterSeries,
};
use crate::ui::{fmt_count, fmt_money, fmt_thousands};

const HISTOGRAM_BINS: usize = 50;
const CUSTOMER_SEGMENT: &str = "Customer_Segment";
const CLUSTER_NAME: &str = "Cluster_Name";
const AOV: &str = "AOV";
const SCORE_COLUMNS: [(&str, Color32); 3] = [
    ("R_Score", Color32::from_rgb(0x1f, 0x77, 0xb4)),
    ("F_Score", Color32::from_rgb(0xff, 0x7f, 0x0e)),
    ("M_Score", Color32::from_rgb(0x2c, 0xa0, 0x2c)),
];

/// Render the current page into the central panel.
pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading(state.page.title());
    ui.add_space(4.0);
    match state.page {
        Page::ExecutiveSummary => executive_summary(ui, state),
        Page::RfmAnalysis => rfm_analysis(ui, state),
        Page::CustomerSegments => customer_segments(ui, state),
        Page::ClvAnalysis => clv_analysis(ui, state),
        Page::Clustering => clustering(ui, state),
        Page::Explorer => explorer(ui, state),
        Page::Recommendations => recommendations(ui, state),
    }
}

/// Bars for `(key, value)` pairs coloured by `color`.
fn bars(groups: &[(GroupKey, f64)], color: impl Fn(&GroupKey) -> Color32) -> Vec<(String, f64, Color32)> {
    groups
        .iter()
        .map(|(key, value)| (key.to_string(), *value, color(key)))
        .collect()
}

fn counts_as_f64(counts: Vec<(GroupKey, usize)>) -> Vec<(GroupKey, f64)> {
    counts.into_iter().map(|(k, n)| (k, n as f64)).collect()
}

fn has_column(state: &AppState, name: &str) -> bool {
    state
        .session
        .as_ref()
        .is_some_and(|s| s.customers.has_column(name))
}

/// Count and RFM means per group of `field`.
fn profile_grid(
    ui: &mut Ui,
    field: &GroupField,
    summaries: &[GroupSummary],
    color: impl Fn(&GroupKey) -> Color32,
) {
    egui::Grid::new(format!("profile_{}", field.column_name()))
        .striped(true)
        .num_columns(6)
        .show(ui, |ui: &mut Ui| {
            for header in [
                field.column_name(),
                "Customers",
                "Share",
                "Avg Recency",
                "Avg Frequency",
                "Avg Monetary",
            ] {
                ui.strong(header);
            }
            ui.end_row();

            for s in summaries {
                ui.label(RichText::new(s.key.to_string()).color(color(&s.key)));
                ui.label(fmt_count(s.count));
                ui.label(format!("{:.1}%", s.share_pct));
                ui.label(format!("{:.1}", s.avg_recency));
                ui.label(format!("{:.1}", s.avg_frequency));
                ui.label(fmt_money(s.avg_monetary));
                ui.end_row();
            }
        });
}

/// Scatter points of every customer, one series per group of `field`.
fn series_by(
    records: &[CustomerRecord],
    field: &GroupField,
    colors: &ColorMap,
    point: impl Fn(&CustomerRecord) -> [f64; 2],
) -> Vec<ScatterSeries> {
    let mut groups: BTreeMap<GroupKey, Vec<[f64; 2]>> = BTreeMap::new();
    for r in records {
        if let Some(key) = r.group_key(field) {
            groups.entry(key).or_default().push(point(r));
        }
    }
    groups
        .into_iter()
        .map(|(key, points)| ScatterSeries {
            name: key.to_string(),
            color: colors.color_for(&key),
            points,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Executive summary
// ---------------------------------------------------------------------------

fn executive_summary(ui: &mut Ui, state: &AppState) {
    let records = state.records();
    let has_business_segments = has_column(state, CUSTOMER_SEGMENT);
    let field = if has_business_segments {
        GroupField::Column(CUSTOMER_SEGMENT.to_string())
    } else {
        GroupField::RfmSegment
    };
    let colors = ColorMap::new(value_counts(records, &field).into_iter().map(|(k, _)| k));

    ui.columns(2, |cols| {
        cols[0].strong("Customer Segment Distribution");
        let counts = counts_as_f64(value_counts(records, &field));
        bar_chart(
            &mut cols[0],
            "segment_distribution",
            "Customers",
            &bars(&counts, |k| colors.color_for(k)),
        );

        cols[1].strong("Revenue by Segment");
        let revenue = revenue_by_group(records, &field);
        bar_chart(
            &mut cols[1],
            "segment_revenue",
            "Revenue ($)",
            &bars(&revenue, |k| colors.color_for(k)),
        );
    });

    if let Some(insights) = key_insights(records) {
        ui.add_space(8.0);
        ui.strong("Key Insights");
        ui.columns(3, |cols| {
            metric(
                &mut cols[0],
                "Diamond customers",
                &format!("{:.1}%", insights.diamond_share_pct),
            );
            metric(
                &mut cols[1],
                "Repeat customers",
                &format!("{:.1}%", insights.repeat_share_pct),
            );
            metric(
                &mut cols[2],
                "Avg purchase frequency",
                &format!("{:.1}", insights.avg_frequency),
            );
        });
    }
}

// ---------------------------------------------------------------------------
// RFM analysis
// ---------------------------------------------------------------------------

fn rfm_analysis(ui: &mut Ui, state: &mut AppState) {
    let counts = counts_as_f64(value_counts(state.records(), &GroupField::RfmSegment));
    ui.strong("RFM Segment Distribution");
    bar_chart(
        ui,
        "rfm_segments",
        "Customers",
        &bars(&counts, |k| state.segment_colors.color_for(k)),
    );

    ui.add_space(8.0);
    ui.columns(3, |cols| {
        for (col, axis) in cols.iter_mut().zip(RfmAxis::ALL) {
            let values: Vec<f64> = state.records().iter().map(|r| axis.value(r)).collect();
            col.strong(format!("{} Distribution", axis.label()));
            histogram_chart(
                col,
                &format!("rfm_hist_{}", axis.label()),
                axis.label(),
                &histogram(&values, HISTOGRAM_BINS),
                Color32::LIGHT_BLUE,
                None,
            );
        }
    });

    ui.add_space(8.0);
    ui.horizontal(|ui: &mut Ui| {
        axis_picker(ui, "scatter_x", "X axis", &mut state.scatter_x);
        axis_picker(ui, "scatter_y", "Y axis", &mut state.scatter_y);
    });

    let (x, y) = (state.scatter_x, state.scatter_y);
    let series = series_by(
        state.records(),
        &GroupField::RfmSegment,
        &state.segment_colors,
        |r| [x.value(r), y.value(r)],
    );
    scatter_chart(ui, "rfm_scatter", x.label(), y.label(), series, false);

    let scores: Vec<(String, Vec<_>, Color32)> = SCORE_COLUMNS
        .iter()
        .filter(|(column, _)| has_column(state, column))
        .map(|&(column, color)| {
            let bins = integer_histogram(&column_values(state.records(), column));
            (column.to_string(), bins, color)
        })
        .collect();
    if !scores.is_empty() {
        ui.add_space(8.0);
        ui.strong("RFM Score Distribution");
        overlaid_histograms(ui, "rfm_scores", "Score", &scores);
    }
}

fn axis_picker(ui: &mut Ui, id: &str, label: &str, axis: &mut RfmAxis) {
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(axis.label())
        .show_ui(ui, |ui: &mut Ui| {
            for option in RfmAxis::ALL {
                ui.selectable_value(axis, option, option.label());
            }
        });
}

// ---------------------------------------------------------------------------
// Customer segments
// ---------------------------------------------------------------------------

fn customer_segments(ui: &mut Ui, state: &AppState) {
    if !has_column(state, CUSTOMER_SEGMENT) {
        ui.label(format!("The customer table has no {CUSTOMER_SEGMENT} column."));
        return;
    }
    let records = state.records();
    let field = GroupField::Column(CUSTOMER_SEGMENT.to_string());
    let summaries = group_summary(records, &field);
    let colors = ColorMap::new(summaries.iter().map(|s| s.key.clone()));

    ui.strong("Segment Profiles");
    profile_grid(ui, &field, &summaries, |k| colors.color_for(k));

    ui.add_space(8.0);
    ui.columns(2, |cols| {
        cols[0].strong("Customers per Segment");
        let counts: Vec<(GroupKey, f64)> = summaries
            .iter()
            .map(|s| (s.key.clone(), s.count as f64))
            .collect();
        bar_chart(
            &mut cols[0],
            "business_segment_counts",
            "Customers",
            &bars(&counts, |k| colors.color_for(k)),
        );

        cols[1].strong("Average Revenue per Segment");
        let revenue: Vec<(GroupKey, f64)> = summaries
            .iter()
            .map(|s| (s.key.clone(), s.avg_monetary))
            .collect();
        bar_chart(
            &mut cols[1],
            "business_segment_revenue",
            "Avg Monetary ($)",
            &bars(&revenue, |k| colors.color_for(k)),
        );
    });
}

// ---------------------------------------------------------------------------
// CLV analysis
// ---------------------------------------------------------------------------

fn clv_analysis(ui: &mut Ui, state: &AppState) {
    let records = state.records();
    let Some(overview) = clv_overview(records) else {
        ui.label("No customers loaded.");
        return;
    };

    ui.columns(3, |cols| {
        metric(&mut cols[0], "Average Predicted CLV", &fmt_money(overview.mean));
        metric(&mut cols[1], "Total Predicted CLV", &fmt_money(overview.total));
        metric(&mut cols[2], "Highest CLV", &fmt_money(overview.max));
    });
    ui.add_space(8.0);

    let clv: Vec<f64> = records.iter().map(|r| r.clv_predicted).collect();
    ui.columns(2, |cols| {
        cols[0].strong("Predicted CLV Distribution");
        histogram_chart(
            &mut cols[0],
            "clv_hist",
            "Predicted CLV ($)",
            &histogram(&clv, HISTOGRAM_BINS),
            Color32::from_rgb(0x1f, 0x77, 0xb4),
            Some(overview.mean),
        );

        cols[1].strong("Customers by CLV Tier");
        let tiers: Vec<(String, f64, Color32)> = ClvTier::ALL
            .iter()
            .filter_map(|&tier| tier_summary(records, tier))
            .map(|s| (s.tier.label().to_string(), s.count as f64, tier_color(s.tier.label())))
            .collect();
        bar_chart(&mut cols[1], "clv_tiers", "Customers", &tiers);
    });

    ui.add_space(8.0);
    ui.strong("Historical Revenue vs Predicted CLV");
    let series: Vec<ScatterSeries> = ClvTier::ALL
        .iter()
        .map(|tier| ScatterSeries {
            name: tier.label().to_string(),
            color: tier_color(tier.label()),
            points: records
                .iter()
                .filter(|r| r.clv_segment == tier.label())
                .map(|r| [r.monetary, r.clv_predicted])
                .collect(),
        })
        .filter(|s| !s.points.is_empty())
        .collect();
    scatter_chart(
        ui,
        "monetary_vs_clv",
        "Historical Revenue ($)",
        "Predicted CLV ($)",
        series,
        true,
    );
}

// ---------------------------------------------------------------------------
// K-Means clustering
// ---------------------------------------------------------------------------

fn clustering(ui: &mut Ui, state: &AppState) {
    let records = state.records();
    let summaries = group_summary(records, &GroupField::Cluster);
    let names = cluster_names(records);

    ui.strong("Cluster Profiles");
    egui::Grid::new("cluster_profiles")
        .striped(true)
        .num_columns(7)
        .show(ui, |ui: &mut Ui| {
            for header in [
                "Cluster",
                "Customers",
                "Share",
                "Avg Recency",
                "Avg Frequency",
                "Avg Monetary",
                "Avg CLV",
            ] {
                ui.strong(header);
            }
            ui.end_row();

            for s in &summaries {
                let label = match names.get(&s.key) {
                    Some(name) => format!("{} – {name}", s.key),
                    None => s.key.to_string(),
                };
                ui.label(RichText::new(label).color(state.cluster_colors.color_for(&s.key)));
                ui.label(fmt_count(s.count));
                ui.label(format!("{:.1}%", s.share_pct));
                ui.label(format!("{:.1}", s.avg_recency));
                ui.label(format!("{:.1}", s.avg_frequency));
                ui.label(fmt_money(s.avg_monetary));
                ui.label(fmt_money(s.avg_clv));
                ui.end_row();
            }
        });

    ui.add_space(8.0);
    ui.columns(2, |cols| {
        cols[0].strong("Cluster Sizes");
        let sizes: Vec<(GroupKey, f64)> = summaries
            .iter()
            .map(|s| (s.key.clone(), s.count as f64))
            .collect();
        bar_chart(
            &mut cols[0],
            "cluster_sizes",
            "Customers",
            &bars(&sizes, |k| state.cluster_colors.color_for(k)),
        );

        cols[1].strong("Predicted CLV by Cluster");
        let boxes: Vec<_> = summaries
            .iter()
            .filter_map(|s| {
                let values: Vec<f64> = records
                    .iter()
                    .filter(|r| GroupKey::Number(r.cluster_id) == s.key)
                    .map(|r| r.clv_predicted)
                    .collect();
                let stats = box_stats(&values)?;
                Some((s.key.to_string(), stats, state.cluster_colors.color_for(&s.key)))
            })
            .collect();
        box_chart(&mut cols[1], "cluster_clv", "Predicted CLV ($)", &boxes);
    });

    if has_column(state, CLUSTER_NAME) {
        let field = GroupField::Column(CLUSTER_NAME.to_string());
        let named = group_summary(records, &field);
        let colors = ColorMap::new(named.iter().map(|s| s.key.clone()));

        ui.add_space(8.0);
        ui.strong("Named Clusters");
        profile_grid(ui, &field, &named, |k| colors.color_for(k));

        ui.add_space(8.0);
        ui.strong("Recency vs Monetary by Cluster Name");
        let series = series_by(records, &field, &colors, |r| [r.recency, r.monetary]);
        scatter_chart(ui, "cluster_name_scatter", "Recency (days)", "Monetary ($)", series, false);
    }
}

/// Most common `Cluster_Name` per cluster, when the column exists.
fn cluster_names(records: &[CustomerRecord]) -> BTreeMap<GroupKey, String> {
    let field = GroupField::Column(CLUSTER_NAME.to_string());
    let mut counts: BTreeMap<GroupKey, BTreeMap<String, usize>> = BTreeMap::new();
    for r in records {
        if let Some(GroupKey::Text(name)) = r.group_key(&field) {
            *counts
                .entry(GroupKey::Number(r.cluster_id))
                .or_default()
                .entry(name)
                .or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter_map(|(cluster, names)| {
            // Alphabetically first name wins a tie.
            let (name, _) = names
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))?;
            Some((cluster, name))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Customer explorer
// ---------------------------------------------------------------------------

fn explorer(ui: &mut Ui, state: &mut AppState) {
    let total = state.records().len();
    let shown = state.visible_indices.len();

    let mut export_clicked = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!(
            "Showing {} customers out of {} total",
            fmt_count(shown),
            fmt_count(total)
        ));
        export_clicked = ui
            .add_enabled(shown > 0, egui::Button::new("Export CSV…"))
            .clicked();
    });
    if export_clicked {
        export_file_dialog(state);
    }
    ui.separator();

    if shown == 0 {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new("No customers match the current filters").weak());
        });
        return;
    }

    let has_aov = state
        .session
        .as_ref()
        .is_some_and(|s| s.customers.has_column(AOV));
    let rows: Vec<&CustomerRecord> = state.visible_records().collect();

    let mut table = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(120.0))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto());
    if has_aov {
        table = table.column(Column::auto());
    }

    table
        .header(20.0, |mut header| {
            let mut titles = vec![
                "CustomerID",
                "Segment",
                "CLV_Segment",
                "KMeans_Cluster",
                "Monetary",
                "CLV_Predictive",
                "Frequency",
                "Recency",
            ];
            if has_aov {
                titles.push(AOV);
            }
            for title in titles {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let r = rows[row.index()];
                row.col(|ui| {
                    ui.label(r.customer_id.as_str());
                });
                row.col(|ui| {
                    ui.label(&r.rfm_segment);
                });
                row.col(|ui| {
                    ui.label(RichText::new(&r.clv_segment).color(tier_color(&r.clv_segment)));
                });
                row.col(|ui| {
                    ui.label(r.cluster_id.to_string());
                });
                row.col(|ui| {
                    ui.label(fmt_thousands(r.monetary, 2));
                });
                row.col(|ui| {
                    ui.label(fmt_thousands(r.clv_predicted, 2));
                });
                row.col(|ui| {
                    ui.label(r.frequency.to_string());
                });
                row.col(|ui| {
                    ui.label(format!("{}", r.recency));
                });
                if has_aov {
                    row.col(|ui| {
                        ui.label(r.extra.get(AOV).map(String::as_str).unwrap_or(""));
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

fn recommendations(ui: &mut Ui, state: &AppState) {
    let records = state.records();
    let mut any = false;
    for tier in ClvTier::ALL {
        let Some(summary) = tier_summary(records, tier) else {
            continue;
        };
        any = true;
        let header = format!(
            "{} customers  ({} · {:.1}% · avg CLV {})",
            tier.label(),
            fmt_count(summary.count),
            summary.share_pct,
            fmt_money(summary.avg_clv)
        );
        egui::CollapsingHeader::new(RichText::new(header).strong().color(tier_color(tier.label())))
            .id_salt(tier.label())
            .default_open(tier == ClvTier::Diamond)
            .show(ui, |ui: &mut Ui| {
                for action in playbook(tier) {
                    ui.label(format!("• {action}"));
                }
            });
    }
    if !any {
        ui.label("No customers carry a known CLV tier.");
    }
}
