//! Inline figures for a notebook host.
//!
//! A figure session silences the running statement's text output, makes the
//! figure current for the plotting functions and, once closed, hands the
//! figure to the notebook as a rich result that prints itself as an image.

pub mod functions;
pub mod inline;
pub mod notebook;
pub mod settings;
pub mod surface;

pub use functions::{figure, figure_with, gcf, with_auto_figure};
pub use inline::{FigureOptions, FigureSession, InlineFigure, WidgetGeometry};
pub use notebook::{
    silent_hook, CustomResult, OutputHook, RecordedResult, ResultScope, ResultValue, Statement,
    Worksheet,
};
pub use settings::{
    install_settings, load_settings, normalize_settings, reset_settings, save_settings, settings,
    RevisSettings,
};
pub use surface::{DisplaySurface, PrintContext, RasterContext};

#[derive(thiserror::Error, Debug)]
pub enum RevisError {
    #[error("figure error: {0}")]
    Figure(#[from] figure::FigureError),
    #[error("dispatch error: {0}")]
    Dispatch(#[from] dispatch::DispatchError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),
    #[error("settings write error: {0}")]
    SettingsWrite(#[from] toml::ser::Error),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("figure was dropped")]
    FigureGone,
    #[error("surface error: {0}")]
    Surface(String),
}
