use customer_lens::data::summary::{BoxStats, HistogramBin};
use eframe::egui::{Color32, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, LineStyle, Plot, PlotPoints, Points,
    VLine,
};

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

/// One bar per category, placed at x = 0, 1, 2, … in the given order.
///
/// Each bar is its own chart so the legend names the categories.
pub fn bar_chart(ui: &mut Ui, id: &str, y_label: &str, bars: &[(String, f64, Color32)]) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(y_label)
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (label, value, color)) in bars.iter().enumerate() {
                let bar = Bar::new(i as f64, *value).width(0.7).name(label);
                plot_ui.bar_chart(BarChart::new(vec![bar]).color(*color).name(label));
            }
        });
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Histogram bars, optionally with a dashed vertical line at the mean.
pub fn histogram_chart(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    bins: &[HistogramBin],
    color: Color32,
    mean: Option<f64>,
) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|bin| Bar::new(bin.center(), bin.count as f64).width(bin.width()))
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label("Customers")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).name(x_label));
            if let Some(mean) = mean {
                plot_ui.vline(
                    VLine::new(mean)
                        .color(Color32::RED)
                        .style(LineStyle::dashed_loose())
                        .name(format!("Mean: {mean:.2}")),
                );
            }
        });
}

/// Several histograms drawn over each other with translucent fills.
pub fn overlaid_histograms(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    series: &[(String, Vec<HistogramBin>, Color32)],
) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label("Customers")
        .show(ui, |plot_ui| {
            for (name, bins, color) in series {
                let bars: Vec<Bar> = bins
                    .iter()
                    .map(|bin| Bar::new(bin.center(), bin.count as f64).width(bin.width() * 0.9))
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).color(color.gamma_multiply(0.6)).name(name));
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

pub struct ScatterSeries {
    pub name: String,
    pub color: Color32,
    pub points: Vec<[f64; 2]>,
}

/// Point clouds per group. With `diagonal`, a dashed y = x reference line
/// spans the data.
pub fn scatter_chart(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    y_label: &str,
    series: Vec<ScatterSeries>,
    diagonal: bool,
) {
    let extent = series
        .iter()
        .flat_map(|s| s.points.iter())
        .flat_map(|p| p.iter().copied())
        .fold(0.0_f64, f64::max);

    Plot::new(id)
        .height(CHART_HEIGHT * 1.3)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| {
            for s in series {
                let points: PlotPoints = s.points.into_iter().collect();
                plot_ui.points(Points::new(points).radius(2.0).color(s.color).name(&s.name));
            }
            if diagonal && extent > 0.0 {
                let line: PlotPoints = vec![[0.0, 0.0], [extent, extent]].into_iter().collect();
                plot_ui.line(
                    Line::new(line)
                        .color(Color32::RED)
                        .style(LineStyle::dashed_loose())
                        .name("y = x"),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

/// One box per group, placed at x = 0, 1, 2, … in the given order.
pub fn box_chart(ui: &mut Ui, id: &str, y_label: &str, boxes: &[(String, BoxStats, Color32)]) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(y_label)
        .show_x(false)
        .show(ui, |plot_ui| {
            for (i, (label, stats, color)) in boxes.iter().enumerate() {
                let spread = BoxSpread::new(
                    stats.lower_whisker,
                    stats.q1,
                    stats.median,
                    stats.q3,
                    stats.upper_whisker,
                );
                let elem = BoxElem::new(i as f64, spread).box_width(0.6).name(label);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).color(*color).name(label));
            }
        });
}
