//! Chart descriptions built from the dashboard history, and their
//! plotly-compatible wire shape.

use serde::Serialize;

use crate::config::MetricSelection;
use crate::locale::Labels;
use crate::system::aggregator::Aggregator;
use crate::system::history::{Category, Series};

const SMOOTHING: f64 = 0.8;
const LINE_WIDTH: f64 = 3.5;
/// Below this many points each sample also gets a marker.
const MARKER_THRESHOLD: usize = 30;
const FONT_FAMILY: &str = "Open Sans";
const BACKGROUND: &str = "#303030";

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartHints {
    pub smoothing: f64,
    pub line_width: f64,
    pub hover_template: String,
    pub unit: &'static str,
}

/// Renderer-agnostic description of one dashboard chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDescription {
    pub category: Category,
    pub title: String,
    pub series: Vec<ChartSeries>,
    pub hints: ChartHints,
}

/// Charts the dashboard page lays out before any data arrives.
pub fn chart_types(metrics: MetricSelection, gpus_detected: bool) -> Vec<Category> {
    let processes = metrics.processes;
    Category::ALL
        .into_iter()
        .filter(|category| match category {
            Category::Cpu => metrics.cpu || processes,
            Category::Gpu => metrics.gpu && gpus_detected,
            Category::Memory => metrics.memory || processes,
            Category::Network => metrics.network,
        })
        .collect()
}

fn hints(category: Category, labels: &Labels) -> ChartHints {
    let (hover_template, unit) = match category {
        Category::Network => (
            format!("%{{y:.3f}} {}", labels.throughput_unit),
            labels.throughput_unit,
        ),
        _ => (
            format!("%{{y:.2f}} {}", labels.percent_unit),
            labels.percent_unit,
        ),
    };
    ChartHints {
        smoothing: SMOOTHING,
        line_width: LINE_WIDTH,
        hover_template,
        unit,
    }
}

/// Pair `series` with the newest `series.len()` entries of the time axis.
fn pair_with_time(relative_time: &[f64], series: &Series) -> (Vec<f64>, Vec<Option<f64>>) {
    let y = series.to_vec();
    let start = relative_time.len().saturating_sub(y.len());
    let x = relative_time[start..].to_vec();
    let y = y[y.len().saturating_sub(x.len())..].to_vec();
    (x, y)
}

impl Aggregator {
    /// Describe every chart that currently has data: cpu, gpu (once a GPU has
    /// been seen), memory, then network.
    pub fn format(&self, labels: &Labels) -> Vec<ChartDescription> {
        let relative_time = self.relative_time();
        Category::ALL
            .into_iter()
            .filter(|&category| category != Category::Gpu || self.has_gpu())
            .filter_map(|category| {
                let series: Vec<ChartSeries> = self
                    .category_series(category)
                    .map(|(source, series)| {
                        let (x, y) = pair_with_time(relative_time, series);
                        ChartSeries {
                            name: labels.series_name(source).to_string(),
                            x,
                            y,
                        }
                    })
                    .collect();
                if series.is_empty() {
                    return None;
                }
                Some(ChartDescription {
                    category,
                    title: labels.usage(category).to_string(),
                    series,
                    hints: hints(category, labels),
                })
            })
            .collect()
    }
}

/// Body of the dashboard callback: `{"graphs": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPayload {
    pub graphs: Vec<Graph>,
}

impl DashboardPayload {
    pub fn from_charts(charts: &[ChartDescription]) -> Self {
        Self {
            graphs: charts.iter().map(Graph::from_chart).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    pub data: Vec<Trace>,
    pub layout: Layout,
    pub config: PlotConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub cliponaxis: bool,
    pub hovertemplate: String,
    pub line: Line,
    pub mode: &'static str,
    pub name: String,
    pub textfont: TextFont,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub shape: &'static str,
    pub smoothing: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextFont {
    pub family: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub autosize: bool,
    pub font: LayoutFont,
    pub hoverlabel: HoverLabel,
    pub hovermode: &'static str,
    pub legend: Legend,
    pub margin: Margin,
    pub meta: Meta,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
    pub showlegend: bool,
    pub title: String,
    pub uirevision: bool,
    pub xaxis: XAxis,
    pub yaxis: YAxis,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutFont {
    pub color: &'static str,
    pub family: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoverLabel {
    pub bgcolor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub entrywidth: u32,
    pub entrywidthmode: &'static str,
    pub orientation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub b: u32,
    pub l: u32,
    pub r: u32,
    pub t: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    /// Matches the `div` id on the dashboard page.
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct XAxis {
    pub autorange: &'static str,
    pub fixedrange: bool,
    pub layer: &'static str,
    pub showspikes: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct YAxis {
    pub fixedrange: bool,
    pub layer: &'static str,
    pub title: AxisTitle,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisTitle {
    pub standoff: u32,
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotConfig {
    pub display_mode_bar: bool,
    pub editable: bool,
    pub responsive: bool,
    pub scroll_zoom: bool,
}

impl Graph {
    pub fn from_chart(chart: &ChartDescription) -> Self {
        let data = chart
            .series
            .iter()
            .map(|series| Trace {
                cliponaxis: false,
                hovertemplate: chart.hints.hover_template.clone(),
                line: Line {
                    shape: "spline",
                    smoothing: chart.hints.smoothing,
                    width: chart.hints.line_width,
                },
                mode: if series.x.len() < MARKER_THRESHOLD {
                    "lines+markers"
                } else {
                    "lines"
                },
                name: series.name.clone(),
                textfont: TextFont {
                    family: FONT_FAMILY,
                },
                kind: "scatter",
                x: series.x.clone(),
                y: series.y.clone(),
            })
            .collect();

        let layout = Layout {
            autosize: true,
            font: LayoutFont {
                color: "FFF",
                family: FONT_FAMILY,
            },
            hoverlabel: HoverLabel { bgcolor: "252525" },
            hovermode: "x unified",
            legend: Legend {
                entrywidth: 0,
                entrywidthmode: "pixels",
                orientation: "h",
            },
            margin: Margin {
                b: 40,
                l: 60,
                r: 20,
                t: 40,
            },
            meta: Meta {
                id: format!("chart-{}", chart.category),
            },
            paper_bgcolor: BACKGROUND,
            plot_bgcolor: BACKGROUND,
            showlegend: true,
            title: chart.title.clone(),
            uirevision: true,
            xaxis: XAxis {
                // Smaller ages on the right.
                autorange: "reversed",
                fixedrange: true,
                layer: "below traces",
                showspikes: false,
            },
            yaxis: YAxis {
                fixedrange: true,
                layer: "below traces",
                title: AxisTitle {
                    standoff: 10,
                    text: chart.hints.unit,
                },
            },
        };

        Graph {
            data,
            layout,
            config: PlotConfig {
                display_mode_bar: false,
                editable: false,
                responsive: false,
                scroll_zoom: false,
            },
        }
    }
}
