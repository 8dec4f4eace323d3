use anyhow::Result;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use topo_lib::plot::{Figure, HeatmapSeries, PlotBackend, ScatterSeries, Series};

pub const GRAPH_SIZE: (u32, u32) = (560, 520);
pub const LATENT_SIZE: (u32, u32) = (800, 600);

/// Renders figures to a PNG file with plotters' bitmap backend.
pub struct PngBackend {
    path: PathBuf,
    size: (u32, u32),
}

impl PngBackend {
    pub fn new(path: &Path, size: (u32, u32)) -> Self {
        Self {
            path: path.to_path_buf(),
            size,
        }
    }
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let heatmap = fig.series.iter().find_map(|s| match s {
            Series::Heatmap(h) => Some(h),
            Series::Scatter(_) => None,
        });
        match heatmap {
            Some(h) => self.draw_heatmap(fig, h),
            None => self.draw_scatter(fig),
        }
    }
}

fn rgb(color: topo_lib::plot::Color) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

/// Blue for negative weights, red for positive, white at zero.
fn diverging(value: f64, max_abs: f64) -> RGBColor {
    if max_abs <= 0.0 {
        return WHITE;
    }
    let t = (value / max_abs).clamp(-1.0, 1.0);
    let fade = (255.0 * (1.0 - t.abs())).round() as u8;
    if t >= 0.0 {
        RGBColor(255, fade, fade)
    } else {
        RGBColor(fade, fade, 255)
    }
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        return (-1.0, 1.0);
    }
    let span = hi - lo;
    if span <= 0.0 {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo - 0.05 * span, hi + 0.05 * span)
    }
}

impl PngBackend {
    fn draw_heatmap(&self, fig: &Figure, heatmap: &HeatmapSeries) -> Result<()> {
        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let rows = heatmap.values.len();
        let cols = heatmap.values.first().map(Vec::len).unwrap_or(0);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Graph".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(0.0..cols.max(1) as f64, 0.0..rows.max(1) as f64)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .x_labels(cols.max(1))
            .y_labels(rows.max(1))
            .x_label_formatter(&|x| format!("{}", x.floor() as i64))
            .y_label_formatter(&|y| format!("{}", (rows as f64 - y.ceil()) as i64))
            .draw()?;
        let max_abs = heatmap.max_abs();
        // row 0 is drawn at the top
        chart.draw_series(heatmap.values.iter().enumerate().flat_map(|(i, row)| {
            let top = (rows - i) as f64;
            row.iter().enumerate().map(move |(j, &v)| {
                Rectangle::new(
                    [(j as f64, top - 1.0), (j as f64 + 1.0, top)],
                    diverging(v, max_abs).filled(),
                )
            })
        }))?;
        root.present()?;
        Ok(())
    }

    fn draw_scatter(&self, fig: &Figure) -> Result<()> {
        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let scatters: Vec<&ScatterSeries> = fig
            .series
            .iter()
            .filter_map(|s| match s {
                Series::Scatter(sc) => Some(sc),
                Series::Heatmap(_) => None,
            })
            .collect();
        let points = scatters.iter().flat_map(|s| s.points.iter());
        let (x_lo, x_hi, y_lo, y_hi) = points.fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(a, b, c, d), p| (a.min(p[0]), b.max(p[0]), c.min(p[1]), d.max(p[1])),
        );
        let (x_lo, x_hi) = padded(x_lo, x_hi);
        let (y_lo, y_hi) = padded(y_lo, y_hi);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
        chart
            .configure_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .draw()?;
        for series in &scatters {
            let color = rgb(series.color);
            let radius = series.radius;
            chart
                .draw_series(
                    series
                        .points
                        .iter()
                        .map(move |p| Circle::new((p[0], p[1]), radius, color.filled())),
                )?
                .label(series.name.clone())
                .legend(move |(x, y)| Circle::new((x + 10, y), radius, color.filled()));
        }
        if !scatters.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
        root.present()?;
        Ok(())
    }
}

/// Render `fig` to `path` as PNG.
pub fn save_png(path: &Path, fig: &Figure, size: (u32, u32)) -> Result<()> {
    PngBackend::new(path, size).draw(fig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverging_scale_is_white_at_zero() {
        assert_eq!(diverging(0.0, 1.0), RGBColor(255, 255, 255));
        assert_eq!(diverging(1.0, 1.0), RGBColor(255, 0, 0));
        assert_eq!(diverging(-2.0, 1.0), RGBColor(0, 0, 255));
        assert_eq!(diverging(0.3, 0.0), WHITE);
    }

    #[test]
    fn padding_widens_degenerate_ranges() {
        assert_eq!(padded(2.0, 2.0), (1.0, 3.0));
        assert_eq!(padded(f64::INFINITY, f64::NEG_INFINITY), (-1.0, 1.0));
        let (lo, hi) = padded(0.0, 10.0);
        assert!(lo < 0.0 && hi > 10.0);
    }
}
