//! Figure model and raster snapshots.
//!
//! A [`Figure`] collects plot items, camera and lights; [`render`] turns it
//! into an RGBA [`Snapshot`] with `plotters`.

pub mod color;
pub mod mesh;
pub mod model;
pub mod render;

pub use color::{palette_color, ParseColorError, Rgba};
pub use model::{
    histogram_counts, Camera, Figure, Light, PlotItem, SolidKind, DEFAULT_HEIGHT, DEFAULT_WIDTH,
    MAX_LIGHTS,
};
pub use render::{light_factor, render, save_png, RenderOptions, Snapshot};

#[derive(thiserror::Error, Debug)]
pub enum FigureError {
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("pixel buffer does not match the figure size")]
    Buffer,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
