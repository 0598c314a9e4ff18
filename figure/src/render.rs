use crate::color::{gray_colormap, Rgba};
use crate::mesh::{place, solid_mesh, DEFAULT_SEGMENTS};
use crate::model::{histogram_counts, Figure, Light, PlotItem};
use crate::FigureError;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;

type Root<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Pixels per logical pixel of the figure size.
    pub scale_factor: u32,
    pub background: Rgba,
    pub show_axes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1,
            background: Rgba::WHITE,
            show_axes: true,
        }
    }
}

/// A rendered figure. The image is `scale_factor` times the figure size.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub image: RgbaImage,
    pub scale_factor: u32,
}

impl Snapshot {
    pub fn logical_size(&self) -> (u32, u32) {
        (
            self.image.width() / self.scale_factor.max(1),
            self.image.height() / self.scale_factor.max(1),
        )
    }

    pub fn to_png(&self) -> Result<Vec<u8>, FigureError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

pub fn render(figure: &Figure, options: &RenderOptions) -> Result<Snapshot, FigureError> {
    let scale = options.scale_factor.max(1);
    let width = figure.width().saturating_mul(scale);
    let height = figure.height().saturating_mul(scale);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_figure(&root, figure, options, scale)?;
        root.present().map_err(draw_err)?;
    }
    let rgb = RgbImage::from_raw(width, height, buffer).ok_or(FigureError::Buffer)?;
    Ok(Snapshot {
        image: DynamicImage::ImageRgb8(rgb).to_rgba8(),
        scale_factor: scale,
    })
}

pub fn save_png(figure: &Figure, path: &Path, options: &RenderOptions) -> Result<(), FigureError> {
    let snapshot = render(figure, options)?;
    snapshot.image.save_with_format(path, ImageFormat::Png)?;
    log::debug!("saved figure to {}", path.display());
    Ok(())
}

/// Per-channel intensity the enabled lights put on 3D wireframes.
pub fn light_factor(lights: &[Light]) -> [f32; 3] {
    let mut factor = [0.0f32; 3];
    for light in lights.iter().filter(|light| light.on) {
        let [x, y, z, _] = light.position;
        let len = (x * x + y * y + z * z).sqrt();
        let facing = if len > 0.0 { 0.5 + 0.5 * z / len } else { 1.0 };
        let ambient = light.ambient.to_array();
        let diffuse = light.diffuse.to_array();
        let specular = light.specular.to_array();
        for (idx, slot) in factor.iter_mut().enumerate() {
            *slot += ambient[idx] + diffuse[idx] * facing + specular[idx] * 0.25 * facing;
        }
    }
    factor
}

fn draw_err(err: impl std::fmt::Display) -> FigureError {
    FigureError::Draw(err.to_string())
}

fn draw_figure(
    root: &Root<'_>,
    figure: &Figure,
    options: &RenderOptions,
    scale: u32,
) -> Result<(), FigureError> {
    let background = options.background.to_plotters();
    root.fill(&background).map_err(draw_err)?;
    if figure.is_empty() {
        return Ok(());
    }

    match draw_chart(root, figure, scale, options.show_axes) {
        // Text needs system fonts; without them keep the plot, drop the labels.
        Err(err) if options.show_axes => {
            log::warn!("labeled render failed ({err}), retrying without text");
            root.fill(&background).map_err(draw_err)?;
            draw_chart(root, figure, scale, false)
        }
        other => other,
    }
}

fn draw_chart(root: &Root<'_>, figure: &Figure, scale: u32, labeled: bool) -> Result<(), FigureError> {
    if figure.is_3d() {
        draw_3d(root, figure, scale, labeled)
    } else {
        draw_2d(root, figure, scale, labeled)
    }
}

fn font_size(base: f64, scale: u32) -> f64 {
    base * f64::from(scale)
}

fn draw_2d(root: &Root<'_>, figure: &Figure, scale: u32, labeled: bool) -> Result<(), FigureError> {
    let (x_range, y_range) = bounds_2d(figure);

    let mut builder = ChartBuilder::on(root);
    builder.margin(10 * scale);
    if labeled {
        if let Some(title) = figure.title() {
            builder.caption(title, ("sans-serif", font_size(18.0, scale)).into_font());
        }
        builder
            .set_label_area_size(LabelAreaPosition::Left, 45 * scale)
            .set_label_area_size(LabelAreaPosition::Bottom, 30 * scale);
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;

    if labeled || figure.grid() {
        let mut mesh = chart.configure_mesh();
        if !figure.grid() {
            mesh.disable_mesh();
        }
        if labeled {
            mesh.label_style(("sans-serif", font_size(12.0, scale)).into_font());
            if let Some(x) = figure.x_label() {
                mesh.x_desc(x);
            }
            if let Some(y) = figure.y_label() {
                mesh.y_desc(y);
            }
        }
        mesh.draw().map_err(draw_err)?;
    }

    for item in figure.items() {
        match item {
            PlotItem::Line {
                points,
                color,
                width,
            } => {
                let style = color.to_plotters().stroke_width(width * scale);
                chart
                    .draw_series(LineSeries::new(finite_2d(points.iter().copied()), style))
                    .map_err(draw_err)?;
            }
            PlotItem::Bars { values, color } => {
                let fill = color.to_plotters().filled();
                chart
                    .draw_series(values.iter().enumerate().filter(|(_, v)| v.is_finite()).map(
                        |(idx, value)| {
                            let x = idx as f64;
                            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *value)], fill)
                        },
                    ))
                    .map_err(draw_err)?;
            }
            PlotItem::Histogram { data, bins, color } => {
                let (min, max, counts) = histogram_counts(data, *bins);
                let bin_width = (max - min) / counts.len().max(1) as f64;
                let fill = color.to_plotters().filled();
                chart
                    .draw_series(counts.iter().enumerate().map(|(idx, count)| {
                        let left = min + bin_width * idx as f64;
                        Rectangle::new([(left, 0.0), (left + bin_width, *count as f64)], fill)
                    }))
                    .map_err(draw_err)?;
            }
            PlotItem::Image {
                width,
                height,
                pixels,
            } => {
                let (w, h) = (*width as usize, *height as usize);
                chart
                    .draw_series((0..h).flat_map(|row| (0..w).map(move |col| (row, col))).map(
                        |(row, col)| {
                            let value = pixels[row * w + col];
                            let x = col as f64;
                            let y = (h - row - 1) as f64;
                            Rectangle::new(
                                [(x, y), (x + 1.0, y + 1.0)],
                                gray_colormap(value).to_plotters().filled(),
                            )
                        },
                    ))
                    .map_err(draw_err)?;
            }
            PlotItem::Polar {
                theta,
                radius,
                color,
            } => {
                let style = color.to_plotters().stroke_width(2 * scale);
                let points = theta
                    .iter()
                    .zip(radius)
                    .map(|(t, r)| (r * t.cos(), r * t.sin()));
                chart
                    .draw_series(LineSeries::new(finite_2d(points), style))
                    .map_err(draw_err)?;
            }
            PlotItem::Surface { .. } | PlotItem::Solid { .. } => {}
        }
    }
    Ok(())
}

fn draw_3d(root: &Root<'_>, figure: &Figure, scale: u32, labeled: bool) -> Result<(), FigureError> {
    let (x_range, y_range, z_range) = bounds_3d(figure);

    let mut builder = ChartBuilder::on(root);
    builder.margin(10 * scale);
    if labeled {
        if let Some(title) = figure.title() {
            builder.caption(title, ("sans-serif", font_size(18.0, scale)).into_font());
        }
    }
    // The model's z axis is up; plotters draws its second axis vertically.
    let mut chart = builder
        .build_cartesian_3d(x_range, z_range, y_range)
        .map_err(draw_err)?;

    let camera = *figure.camera();
    chart.with_projection(|mut pb| {
        pb.yaw = camera.azimuth.to_radians();
        pb.pitch = camera.elevation.to_radians();
        pb.scale = camera.zoom;
        pb.into_matrix()
    });

    if labeled && figure.grid() {
        chart
            .configure_axes()
            .label_style(("sans-serif", font_size(11.0, scale)).into_font())
            .draw()
            .map_err(draw_err)?;
    }

    let factor = light_factor(figure.lights());
    for item in figure.items() {
        match item {
            PlotItem::Surface { z, color } => {
                let style = color.modulate(factor).to_plotters().stroke_width(scale);
                let cols = z.first().map(Vec::len).unwrap_or(0);
                for (row_idx, row) in z.iter().enumerate() {
                    let line = row
                        .iter()
                        .enumerate()
                        .map(|(col, h)| (col as f64, *h, row_idx as f64));
                    chart
                        .draw_series(LineSeries::new(finite_3d(line), style))
                        .map_err(draw_err)?;
                }
                for col in 0..cols {
                    let line = z
                        .iter()
                        .enumerate()
                        .map(|(row_idx, row)| (col as f64, row[col], row_idx as f64));
                    chart
                        .draw_series(LineSeries::new(finite_3d(line), style))
                        .map_err(draw_err)?;
                }
            }
            PlotItem::Solid {
                kind,
                center,
                scale: size,
                color,
            } => {
                let style = color.modulate(factor).to_plotters().stroke_width(scale);
                for line in solid_mesh(*kind, DEFAULT_SEGMENTS) {
                    let placed = place(&line, *center, *size);
                    chart
                        .draw_series(LineSeries::new(
                            placed.into_iter().map(|p| (p[0], p[2], p[1])),
                            style,
                        ))
                        .map_err(draw_err)?;
                }
            }
            other => log::debug!("3D view skips 2D item {:?}", std::mem::discriminant(other)),
        }
    }
    Ok(())
}

fn finite_2d(points: impl Iterator<Item = (f64, f64)>) -> impl Iterator<Item = (f64, f64)> {
    points.filter(|(x, y)| x.is_finite() && y.is_finite())
}

fn finite_3d(
    points: impl Iterator<Item = (f64, f64, f64)>,
) -> impl Iterator<Item = (f64, f64, f64)> {
    points.filter(|(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite())
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min: f64,
    max: f64,
}

impl Extent {
    fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, v: f64) {
        if v.is_finite() {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    /// Pads by 5% of the span; degenerate extents grow to a unit span.
    fn to_range(self) -> Range<f64> {
        if self.min > self.max {
            return 0.0..1.0;
        }
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            return (self.min - 0.5)..(self.max + 0.5);
        }
        let pad = span * 0.05;
        (self.min - pad)..(self.max + pad)
    }
}

fn bounds_2d(figure: &Figure) -> (Range<f64>, Range<f64>) {
    let mut x = Extent::empty();
    let mut y = Extent::empty();
    for item in figure.items() {
        match item {
            PlotItem::Line { points, .. } => {
                for (px, py) in points {
                    x.include(*px);
                    y.include(*py);
                }
            }
            PlotItem::Bars { values, .. } => {
                x.include(-0.5);
                x.include(values.len() as f64 - 0.5);
                y.include(0.0);
                values.iter().for_each(|v| y.include(*v));
            }
            PlotItem::Histogram { data, bins, .. } => {
                let (min, max, counts) = histogram_counts(data, *bins);
                x.include(min);
                x.include(max);
                y.include(0.0);
                y.include(counts.iter().copied().max().unwrap_or(0) as f64);
            }
            PlotItem::Image { width, height, .. } => {
                x.include(0.0);
                x.include(f64::from(*width));
                y.include(0.0);
                y.include(f64::from(*height));
            }
            PlotItem::Polar { theta, radius, .. } => {
                for (t, r) in theta.iter().zip(radius) {
                    x.include(r * t.cos());
                    y.include(r * t.sin());
                }
            }
            PlotItem::Surface { .. } | PlotItem::Solid { .. } => {}
        }
    }
    (x.to_range(), y.to_range())
}

fn bounds_3d(figure: &Figure) -> (Range<f64>, Range<f64>, Range<f64>) {
    let mut x = Extent::empty();
    let mut y = Extent::empty();
    let mut z = Extent::empty();
    for item in figure.items() {
        match item {
            PlotItem::Surface { z: grid, .. } => {
                x.include(0.0);
                x.include(grid.first().map(Vec::len).unwrap_or(1) as f64 - 1.0);
                y.include(0.0);
                y.include(grid.len() as f64 - 1.0);
                grid.iter().flatten().for_each(|h| z.include(*h));
            }
            PlotItem::Solid { center, scale, .. } => {
                for (axis, extent) in [&mut x, &mut y, &mut z].into_iter().enumerate() {
                    extent.include(center[axis] - scale[axis].abs() / 2.0);
                    extent.include(center[axis] + scale[axis].abs() / 2.0);
                }
            }
            _ => {}
        }
    }
    (x.to_range(), y.to_range(), z.to_range())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_extent_grows_to_unit_span() {
        let mut e = Extent::empty();
        e.include(2.0);
        assert_eq!(e.to_range(), 1.5..2.5);
        assert_eq!(Extent::empty().to_range(), 0.0..1.0);
    }

    #[test]
    fn default_light_keeps_base_color() {
        let factor = light_factor(&[Light::camera_light()]);
        assert!(factor.iter().all(|f| *f >= 1.0));
        assert_eq!(light_factor(&[Light::off()]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn bars_bounds_include_zero_baseline() {
        let mut fig = Figure::default();
        fig.add_bars(&[2.0, 4.0]);
        let (x, y) = bounds_2d(&fig);
        assert!(x.start < -0.5 && x.end > 1.5);
        assert!(y.start < 0.0 && y.end > 4.0);
    }
}
