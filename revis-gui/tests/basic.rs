use figure::{RenderOptions, Rgba};
use revis_core::{figure_with, FigureOptions, InlineFigure, Worksheet};
use revis_gui::{FigureCanvas, ViewerApp};
use serial_test::serial;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn plain_options() -> RenderOptions {
    RenderOptions {
        scale_factor: 1,
        background: Rgba::WHITE,
        show_axes: false,
    }
}

fn small_figure() -> Arc<InlineFigure> {
    figure_with(FigureOptions {
        disable_output: true,
        size: (60, 40),
    })
}

#[test]
fn gui_config_defaults() {
    let config = revis_gui::GuiConfig::default();
    assert_eq!(config.title, "revis");
    assert_eq!(config.width, 960.0);
    assert_eq!(config.height, 720.0);
}

#[test]
fn dragging_rotates_only_3d_figures() {
    let flat = small_figure();
    flat.with_figure_mut(|f| f.add_bars(&[1.0, 2.0]));
    let canvas = FigureCanvas::new(Arc::clone(&flat), plain_options());
    let before = flat.with_figure(|f| *f.camera());
    canvas.rotate_by(eframe::egui::vec2(20.0, 10.0));
    canvas.zoom_by_scroll(100.0);
    assert_eq!(flat.with_figure(|f| *f.camera()), before);

    let solid = small_figure();
    solid.with_figure_mut(|f| f.add_solid(figure::SolidKind::Sphere, [0.0; 3], [1.0; 3]));
    let canvas = FigureCanvas::new(Arc::clone(&solid), plain_options());
    let before = solid.with_figure(|f| *f.camera());
    canvas.rotate_by(eframe::egui::vec2(20.0, 10.0));
    canvas.zoom_by_scroll(100.0);
    let after = solid.with_figure(|f| *f.camera());
    assert_eq!(after.azimuth, before.azimuth - 10.0);
    assert_eq!(after.elevation, before.elevation + 5.0);
    assert!(after.zoom > before.zoom);
}

#[test]
fn revision_changes_invalidate_texture() {
    let fig = small_figure();
    let canvas = FigureCanvas::new(Arc::clone(&fig), plain_options());
    assert!(canvas.needs_render(1));
    fig.with_figure_mut(|f| f.set_grid(true));
    assert!(canvas.needs_render(1));
    let before = fig.revision();
    fig.with_figure_mut(|f| f.set_title("renamed"));
    assert!(fig.revision() > before);
}

#[test]
fn save_writes_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("figure.png");
    let fig = small_figure();
    fig.with_figure_mut(|f| f.add_series(&[0.0, 1.0, 0.5]));
    let canvas = FigureCanvas::new(fig, plain_options());
    canvas.save_to(&path).expect("save figure");

    let saved = image::open(&path).expect("decode png");
    assert_eq!((saved.width(), saved.height()), (60, 40));
}

#[test]
#[serial]
fn viewer_runs_worker_callbacks_and_collects_results() {
    let (dispatcher, queue) = dispatch::channel(Default::default());
    queue.bind_to_current_thread().expect("bind queue");
    dispatch::install_global(dispatcher.clone());

    let (results_tx, results_rx) = mpsc::channel();
    let mut app = ViewerApp::new(dispatcher, queue, results_rx, plain_options());

    let worker = thread::spawn(move || {
        let mut sheet = Worksheet::with_observer(move |record| {
            let _ = results_tx.send(record.clone());
        });
        sheet
            .run("fig with widget", || {
                let fig = revis_core::figure();
                let session = fig.enter();
                fig.create_widget()?;
                revis_core::functions::plot(&[1.0, 3.0, 2.0])?;
                drop(session);
                Ok(Some("plotted".into()))
            })
            .expect("run statement");
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    while !app.worker_done() && Instant::now() < deadline {
        app.pump();
        thread::sleep(Duration::from_millis(5));
    }
    worker.join().expect("join worker");
    dispatch::clear_global();

    assert!(app.worker_done());
    assert_eq!(app.entry_count(), 2);
    assert_eq!(app.figure_count(), 1);
}
