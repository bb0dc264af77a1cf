//! Dashboard document rendering.
//!
//! The pipeline hands an ordered panel list plus [`GlobalSettings`] to a
//! [`Renderer`], which produces the final dashboard document. The shipped
//! [`GrafanaRenderer`] builds a Grafana-style dashboard JSON; anything
//! else can be substituted behind the trait.

use serde::Serialize;
use serde_json::{Value, json};

use crate::panel::Panel;

/// Fixed data source name attached to every dashboard.
const DATASOURCE: &str = "Prometheus";

/// Dashboard title used when the caller does not supply one.
pub const DEFAULT_TITLE: &str = "App Name";

/// Grid width of one panel; two panels share Grafana's 24-unit row.
const PANEL_WIDTH: u32 = 12;
/// Grid height of one panel.
const PANEL_HEIGHT: u32 = 8;

/// Presentation settings that accompany the panel list.
///
/// Serializes with the field names `datasource` and `title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalSettings {
    /// Data source identifier
    pub datasource: String,
    /// Dashboard title
    pub title: String,
}

impl GlobalSettings {
    /// Build the settings record, falling back to the default title.
    #[must_use]
    pub fn new(title: Option<String>) -> Self {
        Self {
            datasource: DATASOURCE.to_string(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        }
    }
}

/// Errors produced by a [`Renderer`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dashboard document could not be encoded
    #[error("failed to encode dashboard document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Renders an ordered panel list and global settings into a dashboard
/// document.
pub trait Renderer {
    /// Produce the dashboard document for `panels` under `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be encoded.
    fn render(&self, panels: &[Panel], settings: &GlobalSettings) -> Result<String, Error>;
}

/// Grafana-style dashboard JSON renderer.
///
/// One timeseries panel per descriptor, two across on the 24-unit grid,
/// with a full-width row marker whenever the group changes. Panels with
/// an empty expression render without a query target.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrafanaRenderer;

impl Renderer for GrafanaRenderer {
    fn render(&self, panels: &[Panel], settings: &GlobalSettings) -> Result<String, Error> {
        let mut specs: Vec<Value> = Vec::with_capacity(panels.len());
        let mut id = 1_u32;
        let mut x = 0_u32;
        let mut y = 0_u32;
        let mut current_group: Option<&str> = None;

        for panel in panels {
            if current_group != Some(panel.group.as_str()) {
                current_group = Some(panel.group.as_str());
                if x != 0 {
                    x = 0;
                    y += PANEL_HEIGHT;
                }
                specs.push(json!({
                    "id": id,
                    "type": "row",
                    "title": panel.group,
                    "gridPos": {"x": 0, "y": y, "w": 24, "h": 1},
                }));
                id += 1;
                y += 1;
            }

            let targets = if panel.expr.is_empty() {
                json!([])
            } else {
                json!([{
                    "refId": "A",
                    "expr": panel.expr,
                    "legendFormat": panel.name,
                }])
            };

            specs.push(json!({
                "id": id,
                "type": "timeseries",
                "title": panel.title,
                "datasource": settings.datasource,
                "gridPos": {"x": x, "y": y, "w": PANEL_WIDTH, "h": PANEL_HEIGHT},
                "fieldConfig": {"defaults": {"unit": panel.format}},
                "targets": targets,
            }));
            id += 1;

            x += PANEL_WIDTH;
            if x >= 24 {
                x = 0;
                y += PANEL_HEIGHT;
            }
        }

        let document = json!({
            "dashboard": {
                "title": settings.title,
                "timezone": "browser",
                "schemaVersion": 30,
                "refresh": "10s",
                "time": {"from": "now-1h", "to": "now"},
                "panels": specs,
            },
            "overwrite": true,
        });

        Ok(serde_json::to_string_pretty(&document)?)
    }
}
