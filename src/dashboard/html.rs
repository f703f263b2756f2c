use crate::config::DashboardConfig;
use crate::dashboard::{DashboardState, newest_first};
use crate::store;
use crate::types::Observation;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; OpenStreetMap contributors &copy; <a href=\"https://carto.com/\">CARTO</a>";

/// Standalone map artifact: a self-contained document with one marker per
/// aircraft at its latest known position, for offline viewing.
#[must_use]
pub fn render_map_document(latest: &[Observation], config: &DashboardConfig) -> String {
    let mut document = String::new();
    document.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    document.push_str("<title>Perak Flight Radar Map</title>\n");
    document.push_str(&format!("<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\">\n"));
    document.push_str(&format!("<script src=\"{LEAFLET_JS}\"></script>\n"));
    document.push_str("<style>html, body, #map { height: 100%; margin: 0; }</style>\n");
    document.push_str("</head>\n<body>\n<div id=\"map\"></div>\n<script>\n");
    document.push_str(&map_script(latest, config));
    document.push_str("</script>\n</body>\n</html>\n");
    document
}

/// The dashboard document: metrics, embedded map, sortable table and a
/// download button serving the displayed rows as a named CSV file.
pub fn render_dashboard_document(
    state: &DashboardState,
    config: &DashboardConfig,
) -> Result<String, csv::Error> {
    let mut document = String::new();
    document.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    document.push_str("<title>Perak IoT Flight Radar</title>\n");
    document.push_str(&format!("<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\">\n"));
    document.push_str(&format!("<script src=\"{LEAFLET_JS}\"></script>\n"));
    document.push_str(STYLE_BLOCK);
    document.push_str("</head>\n<body>\n");
    document.push_str("<h1>IoT Dashboard: Aircraft in Perak Airspace</h1>\n<hr>\n");

    match state {
        DashboardState::StoreMissing => {
            document.push_str(
                "<p class=\"error\">Database not found. Run the collector first to start capturing data.</p>\n",
            );
        }
        DashboardState::WaitingForData => {
            document.push_str(
                "<p class=\"warning\">Waiting for the collector to gather Perak data...</p>\n",
            );
        }
        DashboardState::Ready(data) => {
            document.push_str("<div class=\"metrics\">\n");
            document.push_str(&metric_card(
                "Data Points Captured",
                &data.metrics.total_observations.to_string(),
            ));
            document.push_str(&metric_card(
                "Unique ICAO24 Identified",
                &data.metrics.unique_aircraft.to_string(),
            ));
            document.push_str(&metric_card(
                "Last Sync Time",
                &data
                    .metrics
                    .last_sync
                    .format(crate::types::timestamp_format::FORMAT)
                    .to_string(),
            ));
            document.push_str("</div>\n");

            document.push_str("<h2>Live Map Visualization</h2>\n");
            document.push_str("<div id=\"map\"></div>\n<script>\n");
            document.push_str(&map_script(&data.latest, config));
            document.push_str("</script>\n");

            document.push_str("<hr>\n<h2>Database Logs (Perak Airspace Only)</h2>\n");
            document.push_str(&table_block(&data.observations));
            document.push_str(&download_block(&data.observations, config)?);
        }
    }

    document.push_str("</body>\n</html>\n");
    Ok(document)
}

fn map_script(latest: &[Observation], config: &DashboardConfig) -> String {
    let mut script = format!(
        "var map = L.map('map').setView([{}, {}], {});\n",
        config.map_center_lat, config.map_center_lon, config.map_zoom
    );
    script.push_str(&format!(
        "L.tileLayer({}, {{ attribution: {} }}).addTo(map);\n",
        js_string(TILE_URL),
        js_string(TILE_ATTRIBUTION)
    ));
    for observation in latest {
        let popup = format!(
            "Callsign: {}<br>Origin: {}",
            escape_html(observation.callsign.trim()),
            escape_html(&observation.origin)
        );
        let tooltip = format!("Alt: {}m", altitude_text(observation.altitude));
        script.push_str(&format!(
            "L.marker([{}, {}]).addTo(map).bindPopup({}).bindTooltip({});\n",
            observation.lat,
            observation.long,
            js_string(&popup),
            js_string(&tooltip)
        ));
    }
    script
}

fn metric_card(label: &str, value: &str) -> String {
    format!(
        "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>\n",
        escape_html(label),
        escape_html(value)
    )
}

fn table_block(observations: &[Observation]) -> String {
    let mut block = String::from("<table id=\"logs\">\n<thead>\n<tr>");
    for column in [
        "icao24", "callsign", "origin", "long", "lat", "altitude", "timestamp",
    ] {
        block.push_str(&format!("<th>{column}</th>"));
    }
    block.push_str("</tr>\n</thead>\n<tbody>\n");

    for observation in newest_first(observations) {
        block.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            observation.icao24,
            escape_html(observation.callsign.trim()),
            escape_html(&observation.origin),
            observation.long,
            observation.lat,
            altitude_text(observation.altitude),
            observation
                .timestamp
                .format(crate::types::timestamp_format::FORMAT)
        ));
    }
    block.push_str("</tbody>\n</table>\n");
    block.push_str(SORT_SCRIPT);
    block
}

fn download_block(
    observations: &[Observation],
    config: &DashboardConfig,
) -> Result<String, csv::Error> {
    let csv_text = store::to_csv_string(observations)?;
    Ok(format!(
        concat!(
            "<button id=\"download\">Download Database (.csv)</button>\n",
            "<script>\n",
            "var csvText = {};\n",
            "document.getElementById('download').addEventListener('click', function () {{\n",
            "  var blob = new Blob([csvText], {{ type: 'text/csv' }});\n",
            "  var link = document.createElement('a');\n",
            "  link.href = URL.createObjectURL(blob);\n",
            "  link.download = {};\n",
            "  link.click();\n",
            "  URL.revokeObjectURL(link.href);\n",
            "}});\n",
            "</script>\n",
        ),
        js_string(&csv_text),
        js_string(&config.download_file_name)
    ))
}

fn altitude_text(altitude: Option<f64>) -> String {
    match altitude {
        Some(meters) => meters.to_string(),
        None => String::new(),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Embeds arbitrary text as a JS string literal. JSON string encoding is a
/// valid JS string literal and handles quotes and control characters.
fn js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| String::from("\"\""))
}

const STYLE_BLOCK: &str = concat!(
    "<style>\n",
    "body { font-family: sans-serif; margin: 2em; }\n",
    "#map { height: 500px; }\n",
    ".metrics { display: flex; gap: 2em; }\n",
    ".metric .label { color: #666; font-size: 0.9em; }\n",
    ".metric .value { font-size: 1.8em; }\n",
    ".error { color: #b00020; font-weight: bold; }\n",
    ".warning { color: #8a6d00; }\n",
    "table { border-collapse: collapse; margin: 1em 0; }\n",
    "th, td { border: 1px solid #ccc; padding: 0.3em 0.6em; }\n",
    "th { cursor: pointer; background: #f0f0f0; }\n",
    "</style>\n",
);

const SORT_SCRIPT: &str = concat!(
    "<script>\n",
    "document.querySelectorAll('#logs th').forEach(function (th, column) {\n",
    "  th.addEventListener('click', function () {\n",
    "    var body = document.querySelector('#logs tbody');\n",
    "    var rows = Array.from(body.querySelectorAll('tr'));\n",
    "    var ascending = th.dataset.ascending !== 'true';\n",
    "    th.dataset.ascending = ascending;\n",
    "    rows.sort(function (a, b) {\n",
    "      var left = a.children[column].textContent;\n",
    "      var right = b.children[column].textContent;\n",
    "      var numeric = parseFloat(left) - parseFloat(right);\n",
    "      var order = isNaN(numeric) ? left.localeCompare(right) : numeric;\n",
    "      return ascending ? order : -order;\n",
    "    });\n",
    "    rows.forEach(function (row) { body.appendChild(row); });\n",
    "  });\n",
    "});\n",
    "</script>\n",
);
