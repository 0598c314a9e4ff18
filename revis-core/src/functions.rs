//! Plotting entry points for statements.
//!
//! Every plotting call applies to the current figure. Outside a session the
//! call gets a figure of its own: a default figure is created, a session is
//! opened around the call and closed again, which displays the figure as the
//! statement's result.

use crate::inline::{lock_figures, FigureOptions, InlineFigure};
use crate::settings::settings;
use crate::RevisError;
use figure::{Figure, SolidKind};
use std::sync::Arc;

pub use crate::inline::gcf;

/// A new inline figure sized from the installed settings.
pub fn figure() -> Arc<InlineFigure> {
    figure_with(FigureOptions::from_settings(&settings()))
}

pub fn figure_with(options: FigureOptions) -> Arc<InlineFigure> {
    InlineFigure::new(options)
}

/// Runs `f` on the current figure, or on a fresh figure inside its own
/// session when none is current. The figure lock is held throughout.
pub fn with_auto_figure<R>(f: impl FnOnce(&InlineFigure) -> R) -> R {
    let lock = lock_figures();
    let current = lock.borrow().clone();
    match current {
        Some(current) => f(&current),
        None => {
            let fig = figure();
            log::debug!("no current figure, using auto figure {}", fig.id());
            let session = fig.enter();
            let result = f(&session);
            drop(session);
            result
        }
    }
}

fn apply<F>(f: F) -> Result<(), RevisError>
where
    F: FnOnce(&mut Figure) -> Result<(), figure::FigureError>,
{
    with_auto_figure(|fig| {
        fig.with_figure_mut(f)?;
        fig.draw()
    })
}

/// `plot(ys)` against the sample index.
pub fn plot(ys: &[f64]) -> Result<(), RevisError> {
    apply(|fig| {
        fig.add_series(ys);
        Ok(())
    })
}

pub fn plot_xy(xs: &[f64], ys: &[f64]) -> Result<(), RevisError> {
    apply(|fig| fig.add_line(xs, ys))
}

pub fn bar(values: &[f64]) -> Result<(), RevisError> {
    apply(|fig| {
        fig.add_bars(values);
        Ok(())
    })
}

pub fn hist(data: &[f64], bins: usize) -> Result<(), RevisError> {
    apply(|fig| fig.add_histogram(data, bins))
}

/// Grayscale image, `pixels` row-major in `[0, 1]`.
pub fn imshow(width: u32, height: u32, pixels: &[f64]) -> Result<(), RevisError> {
    apply(|fig| fig.add_image(width, height, pixels))
}

pub fn polarplot(theta: &[f64], radius: &[f64]) -> Result<(), RevisError> {
    apply(|fig| fig.add_polar(theta, radius))
}

pub fn surf(z: Vec<Vec<f64>>) -> Result<(), RevisError> {
    apply(|fig| fig.add_surface(z))
}

pub fn grid(on: bool) -> Result<(), RevisError> {
    apply(|fig| {
        fig.set_grid(on);
        Ok(())
    })
}

pub fn title(text: &str) -> Result<(), RevisError> {
    apply(|fig| {
        fig.set_title(text);
        Ok(())
    })
}

pub fn xlabel(text: &str) -> Result<(), RevisError> {
    apply(|fig| {
        let y = fig.y_label().map(str::to_string);
        fig.set_labels(Some(text.to_string()), y);
        Ok(())
    })
}

pub fn ylabel(text: &str) -> Result<(), RevisError> {
    apply(|fig| {
        let x = fig.x_label().map(str::to_string);
        fig.set_labels(x, Some(text.to_string()));
        Ok(())
    })
}

fn solid(kind: SolidKind, center: [f64; 3], scale: [f64; 3]) -> Result<(), RevisError> {
    apply(|fig| {
        fig.add_solid(kind, center, scale);
        Ok(())
    })
}

pub fn solid_box(center: [f64; 3], scale: [f64; 3]) -> Result<(), RevisError> {
    solid(SolidKind::Box, center, scale)
}

pub fn solid_sphere(center: [f64; 3], scale: [f64; 3]) -> Result<(), RevisError> {
    solid(SolidKind::Sphere, center, scale)
}

pub fn solid_cylinder(center: [f64; 3], scale: [f64; 3]) -> Result<(), RevisError> {
    solid(SolidKind::Cylinder, center, scale)
}

pub fn solid_cone(center: [f64; 3], scale: [f64; 3]) -> Result<(), RevisError> {
    solid(SolidKind::Cone, center, scale)
}

pub fn solid_ring(center: [f64; 3], scale: [f64; 3]) -> Result<(), RevisError> {
    solid(SolidKind::Ring, center, scale)
}

pub fn solid_line(center: [f64; 3], scale: [f64; 3]) -> Result<(), RevisError> {
    solid(SolidKind::Line, center, scale)
}

// Window management and event pumping belong to the notebook; these exist so
// statements written for the standalone library keep running.

pub fn close() {
    log::debug!("close() ignored for inline figures");
}

pub fn close_all() {
    log::debug!("close_all() ignored for inline figures");
}

pub fn ginput(count: usize) -> Option<Vec<(f64, f64)>> {
    log::debug!("ginput({count}) ignored for inline figures");
    None
}

pub fn process_events() {
    log::debug!("process_events() ignored for inline figures");
}

pub fn use_backend(name: &str) {
    log::debug!("use_backend({name:?}) ignored for inline figures");
}
