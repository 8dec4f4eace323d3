use crate::signal::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Class colours, cycled when there are more classes than entries.
const PALETTE: [u32; 10] = [
    0x1F77B4, 0xFF7F0E, 0x2CA02C, 0xD62728, 0x9467BD, 0x8C564B, 0xE377C2, 0x7F7F7F, 0xBCBD22,
    0x17BECF,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub color: Color,
    pub radius: u32,
}

/// Matrix rendered cell by cell; `values[i][j]` is row `i`, column `j`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapSeries {
    pub name: String,
    pub values: Vec<Vec<f64>>,
}

impl HeatmapSeries {
    /// Largest absolute value, used to centre a diverging colour scale.
    pub fn max_abs(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Scatter(ScatterSeries),
    Heatmap(HeatmapSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

/// Display name for a 0-based class label; unknown labels fall back to the number.
pub fn class_name(label: i64, class_labels: &[String]) -> String {
    usize::try_from(label)
        .ok()
        .and_then(|idx| class_labels.get(idx))
        .cloned()
        .unwrap_or_else(|| label.to_string())
}

/// Heatmap of one learnt graph captioned with its class.
pub fn figure_from_graph(w: &Matrix, label: i64, class_labels: &[String]) -> Figure {
    let mut fig = Figure::new(Some(format!("Class : {}", class_name(label, class_labels))));
    fig.x.label = Some("channel".into());
    fig.y.label = Some("channel".into());
    fig.add_series(Series::Heatmap(HeatmapSeries {
        name: "W".into(),
        values: w.to_rows(),
    }));
    fig
}

/// Scatter of a 2-D embedding with one series per class, in label order.
pub fn figure_from_embedding(coords: &Matrix, labels: &[i64], class_labels: &[String]) -> Figure {
    let mut groups: BTreeMap<i64, Vec<[f64; 2]>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate().take(coords.rows()) {
        groups
            .entry(*label)
            .or_default()
            .push([coords.get(i, 0), coords.get(i, 1)]);
    }
    let mut fig = Figure::new(Some("Latent Space".to_string()));
    fig.x.label = Some("t-SNE 1".into());
    fig.y.label = Some("t-SNE 2".into());
    for (idx, (label, points)) in groups.into_iter().enumerate() {
        fig.add_series(Series::Scatter(ScatterSeries {
            name: class_name(label, class_labels),
            points,
            color: Color(PALETTE[idx % PALETTE.len()]),
            radius: 4,
        }));
    }
    fig
}
