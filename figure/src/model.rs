use crate::color::{palette_color, Rgba};
use crate::FigureError;

pub const DEFAULT_WIDTH: u32 = 560;
pub const DEFAULT_HEIGHT: u32 = 420;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Degrees around the vertical axis.
    pub azimuth: f64,
    /// Degrees above the horizontal plane.
    pub elevation: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            azimuth: 30.0,
            elevation: 30.0,
            zoom: 0.7,
        }
    }
}

impl Camera {
    pub fn rotate(&mut self, d_azimuth: f64, d_elevation: f64) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(360.0);
        self.elevation = (self.elevation + d_elevation).clamp(-90.0, 90.0);
    }

    pub fn zoom_by(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = (self.zoom * factor).clamp(0.05, 20.0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub on: bool,
    pub ambient: Rgba,
    pub diffuse: Rgba,
    pub specular: Rgba,
    /// Homogeneous position; `w == 0` is a directional light.
    pub position: [f32; 4],
}

impl Light {
    pub fn camera_light() -> Self {
        Self {
            on: true,
            ambient: Rgba::gray(0.2),
            diffuse: Rgba::gray(1.0),
            specular: Rgba::gray(0.3),
            position: [0.0, 0.0, 1.0, 0.0],
        }
    }

    pub fn off() -> Self {
        Self {
            on: false,
            ambient: Rgba::gray(0.0),
            diffuse: Rgba::gray(0.8),
            specular: Rgba::gray(0.0),
            position: [0.0, 0.0, 1.0, 0.0],
        }
    }
}

pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidKind {
    Box,
    Sphere,
    Cylinder,
    Cone,
    Ring,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlotItem {
    Line {
        points: Vec<(f64, f64)>,
        color: Rgba,
        width: u32,
    },
    Bars {
        values: Vec<f64>,
        color: Rgba,
    },
    Histogram {
        data: Vec<f64>,
        bins: usize,
        color: Rgba,
    },
    /// Row-major intensities in `0.0..=1.0`, row 0 at the top.
    Image {
        width: u32,
        height: u32,
        pixels: Vec<f64>,
    },
    Polar {
        theta: Vec<f64>,
        radius: Vec<f64>,
        color: Rgba,
    },
    /// Heights sampled on a regular grid, `z[row][col]`.
    Surface {
        z: Vec<Vec<f64>>,
        color: Rgba,
    },
    Solid {
        kind: SolidKind,
        center: [f64; 3],
        scale: [f64; 3],
        color: Rgba,
    },
}

impl PlotItem {
    pub fn is_3d(&self) -> bool {
        matches!(self, PlotItem::Surface { .. } | PlotItem::Solid { .. })
    }

    /// Checks the shape invariants the renderer indexes by.
    pub fn validate(&self) -> Result<(), FigureError> {
        match self {
            PlotItem::Histogram { bins: 0, .. } => Err(FigureError::InvalidArgument(
                "histogram needs at least one bin".into(),
            )),
            PlotItem::Image {
                width,
                height,
                pixels,
            } => {
                let expected = *width as usize * *height as usize;
                if pixels.len() != expected {
                    return Err(FigureError::LengthMismatch {
                        left: pixels.len(),
                        right: expected,
                    });
                }
                Ok(())
            }
            PlotItem::Polar { theta, radius, .. } if theta.len() != radius.len() => {
                Err(FigureError::LengthMismatch {
                    left: theta.len(),
                    right: radius.len(),
                })
            }
            PlotItem::Surface { z, .. } => {
                let cols = z.first().map(Vec::len).unwrap_or(0);
                if cols == 0 {
                    return Err(FigureError::InvalidArgument("surface grid is empty".into()));
                }
                match z.iter().find(|row| row.len() != cols) {
                    Some(row) => Err(FigureError::LengthMismatch {
                        left: row.len(),
                        right: cols,
                    }),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

/// The figure a plotting session draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    width: u32,
    height: u32,
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
    grid: bool,
    camera: Camera,
    lights: Vec<Light>,
    items: Vec<PlotItem>,
    revision: u64,
}

impl Default for Figure {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            title: None,
            x_label: None,
            y_label: None,
            grid: false,
            camera: Camera::default(),
            lights: vec![Light::camera_light()],
            items: Vec::new(),
            revision: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.touch();
    }

    /// Bumped by every mutation; views use it to know when to re-render.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[PlotItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_3d(&self) -> bool {
        self.items.iter().any(PlotItem::is_3d)
    }

    pub fn grid(&self) -> bool {
        self.grid
    }

    pub fn set_grid(&mut self, on: bool) {
        self.grid = on;
        self.touch();
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn x_label(&self) -> Option<&str> {
        self.x_label.as_deref()
    }

    pub fn y_label(&self) -> Option<&str> {
        self.y_label.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
        self.touch();
    }

    pub fn set_labels(&mut self, x: Option<String>, y: Option<String>) {
        self.x_label = x;
        self.y_label = y;
        self.touch();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        self.touch();
        &mut self.camera
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut Vec<Light> {
        self.touch();
        &mut self.lights
    }

    /// Restores the default camera and lighting.
    pub fn reset_view(&mut self) {
        self.camera = Camera::default();
        self.lights = vec![Light::camera_light()];
        self.touch();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.title = None;
        self.x_label = None;
        self.y_label = None;
        self.touch();
    }

    /// Adds an item after checking its shape; rejected items leave the
    /// figure untouched.
    pub fn push(&mut self, item: PlotItem) -> Result<(), FigureError> {
        item.validate()?;
        self.items.push(item);
        self.touch();
        Ok(())
    }

    pub fn next_color(&self) -> Rgba {
        palette_color(self.items.len())
    }

    pub fn add_line(&mut self, xs: &[f64], ys: &[f64]) -> Result<(), FigureError> {
        if xs.len() != ys.len() {
            return Err(FigureError::LengthMismatch {
                left: xs.len(),
                right: ys.len(),
            });
        }
        let points = xs.iter().copied().zip(ys.iter().copied()).collect();
        let color = self.next_color();
        self.push(PlotItem::Line {
            points,
            color,
            width: 2,
        })
    }

    /// `plot(ys)`: x runs over the sample indices.
    pub fn add_series(&mut self, ys: &[f64]) {
        let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
        let points = xs.into_iter().zip(ys.iter().copied()).collect();
        let color = self.next_color();
        self.items.push(PlotItem::Line {
            points,
            color,
            width: 2,
        });
        self.touch();
    }

    pub fn add_bars(&mut self, values: &[f64]) {
        let color = self.next_color();
        self.items.push(PlotItem::Bars {
            values: values.to_vec(),
            color,
        });
        self.touch();
    }

    pub fn add_histogram(&mut self, data: &[f64], bins: usize) -> Result<(), FigureError> {
        let color = self.next_color();
        self.push(PlotItem::Histogram {
            data: data.to_vec(),
            bins,
            color,
        })
    }

    pub fn add_image(&mut self, width: u32, height: u32, pixels: &[f64]) -> Result<(), FigureError> {
        self.push(PlotItem::Image {
            width,
            height,
            pixels: pixels.to_vec(),
        })
    }

    pub fn add_polar(&mut self, theta: &[f64], radius: &[f64]) -> Result<(), FigureError> {
        let color = self.next_color();
        self.push(PlotItem::Polar {
            theta: theta.to_vec(),
            radius: radius.to_vec(),
            color,
        })
    }

    pub fn add_surface(&mut self, z: Vec<Vec<f64>>) -> Result<(), FigureError> {
        let color = self.next_color();
        self.push(PlotItem::Surface { z, color })
    }

    pub fn add_solid(&mut self, kind: SolidKind, center: [f64; 3], scale: [f64; 3]) {
        let color = self.next_color();
        self.items.push(PlotItem::Solid {
            kind,
            center,
            scale,
            color,
        });
        self.touch();
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Counts per equal-width bin over `[min, max]` of the finite samples. The
/// maximum lands in the last bin.
pub fn histogram_counts(data: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let mut counts = vec![0; bins];
    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if bins == 0 || finite.is_empty() {
        return (0.0, 1.0, counts);
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Halved so ranges wider than f64::MAX stay finite.
    let half_span = max / 2.0 - min / 2.0;
    for v in finite {
        let idx = if half_span > 0.0 {
            ((v / 2.0 - min / 2.0) / half_span * bins as f64) as usize
        } else {
            0
        };
        counts[idx.min(bins - 1)] += 1;
    }
    let max = if half_span > 0.0 { max } else { min + 1.0 };
    (min, max, counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_puts_maximum_in_last_bin() {
        let (min, max, counts) = histogram_counts(&[0.0, 0.5, 1.0, 1.0, f64::NAN], 2);
        assert_eq!((min, max), (0.0, 1.0));
        assert_eq!(counts, vec![1, 3]);
    }

    #[test]
    fn histogram_spans_the_whole_f64_range() {
        let (min, max, counts) = histogram_counts(&[-1e308, 0.0, 1e308], 2);
        assert_eq!((min, max), (-1e308, 1e308));
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn title_and_labels_bump_revision() {
        let mut fig = Figure::default();
        fig.set_title("t");
        fig.set_labels(Some("x".into()), None);
        assert_eq!(fig.revision(), 2);
        assert_eq!((fig.title(), fig.x_label(), fig.y_label()), (Some("t"), Some("x"), None));
    }

    #[test]
    fn histogram_of_constant_data_uses_first_bin() {
        let (min, max, counts) = histogram_counts(&[3.0, 3.0], 4);
        assert_eq!((min, max), (3.0, 4.0));
        assert_eq!(counts, vec![2, 0, 0, 0]);
    }

    #[test]
    fn camera_rotation_wraps_and_clamps() {
        let mut camera = Camera::default();
        camera.rotate(350.0, 100.0);
        assert_eq!(camera.azimuth, 20.0);
        assert_eq!(camera.elevation, 90.0);
        camera.zoom_by(-1.0);
        assert_eq!(camera.zoom, Camera::default().zoom);
    }

    #[test]
    fn every_mutation_bumps_revision() {
        let mut fig = Figure::default();
        let start = fig.revision();
        fig.add_series(&[1.0, 2.0]);
        fig.set_grid(true);
        fig.camera_mut().rotate(1.0, 0.0);
        assert_eq!(fig.revision(), start + 3);
    }
}
