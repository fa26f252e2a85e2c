use std::fmt::Write;

use crate::locale::Labels;
use crate::system::history::Category;

const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";
const POLL_INTERVAL_MS: u32 = 1000;

/// Minimal escaping for text placed inside HTML elements.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Dashboard page: one container per chart, refreshed from
/// `/callback/dashboard`.
pub fn render_home(chart_types: &[Category], labels: &Labels, cpu_name: Option<&str>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>RetroArcher</title>\n<script src=\"{PLOTLY_SRC}\"></script>\n</head>\n\
         <body style=\"background-color:#303030;color:#FFF;font-family:'Open Sans',sans-serif\">\n",
        labels.locale.code()
    );
    if let Some(name) = cpu_name {
        let _ = writeln!(html, "<h3 id=\"cpu-name\">{}</h3>", escape(name));
    }
    for category in chart_types {
        let _ = writeln!(html, "<div id=\"chart-{category}\"></div>");
    }
    let _ = write!(
        html,
        "<script>\n\
         async function updateCharts() {{\n\
         \x20 const response = await fetch('/callback/dashboard');\n\
         \x20 if (!response.ok) return;\n\
         \x20 const payload = await response.json();\n\
         \x20 for (const graph of payload.graphs) {{\n\
         \x20   const el = document.getElementById(graph.layout.meta.id);\n\
         \x20   if (el) Plotly.react(el, graph.data, graph.layout, graph.config);\n\
         \x20 }}\n\
         }}\n\
         updateCharts();\n\
         setInterval(updateCharts, {POLL_INTERVAL_MS});\n\
         </script>\n</body>\n</html>\n"
    );
    html
}
