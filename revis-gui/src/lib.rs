use eframe::egui;
use figure::RenderOptions;
use revis_core::RecordedResult;
use std::sync::mpsc::Receiver;

mod app;
mod canvas;
pub mod color;
mod lights;

pub use app::ViewerApp;
pub use canvas::FigureCanvas;
pub use lights::LightDialog;

#[derive(Debug, Clone)]
pub struct GuiConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            title: "revis".to_string(),
            width: 960.0,
            height: 720.0,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum GuiError {
    #[error("gui error: {0}")]
    Gui(String),
    #[error("figure error: {0}")]
    Figure(#[from] figure::FigureError),
    #[error(transparent)]
    Revis(#[from] revis_core::RevisError),
    #[error("dispatch error: {0}")]
    Dispatch(#[from] dispatch::DispatchError),
}

/// Runs the viewer on the calling thread, which becomes the UI thread.
///
/// `dispatcher` and `queue` are the two halves of one
/// [`dispatch::channel`]; the dispatcher is installed process-wide so figure
/// widgets created by worker statements are marshaled onto this thread.
/// Results recorded by the worker arrive through `results_rx`.
pub fn run_viewer(
    config: GuiConfig,
    dispatcher: dispatch::UiDispatcher,
    queue: dispatch::IdleQueue,
    results_rx: Receiver<RecordedResult>,
    render_options: RenderOptions,
) -> Result<(), GuiError> {
    queue.bind_to_current_thread()?;
    let previous = dispatch::install_global(dispatcher.clone());
    if previous.is_some() {
        log::warn!("replacing the installed ui dispatcher with the viewer's");
    }

    let mut options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([config.width, config.height]),
        ..Default::default()
    };
    // NOTE: Vsync generates hangs and lag on occluded windows.
    options.vsync = false;

    let result = eframe::run_native(
        &config.title,
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            dispatcher.set_waker(move || ctx.request_repaint());
            Box::new(ViewerApp::new(dispatcher, queue, results_rx, render_options))
        }),
    )
    .map_err(|err| GuiError::Gui(err.to_string()));

    dispatch::clear_global();
    result
}
