use crate::commands::Commands;
use crate::demo;
use crate::output::{print_error, print_info, print_text_result};
use revis_core::{
    install_settings, load_settings, normalize_settings, save_settings, CustomResult,
    InlineFigure, RasterContext, ResultValue, RevisError, RevisSettings, Worksheet,
};
use revis_gui::{run_viewer, GuiConfig};
use serde::Serialize;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize)]
struct ManifestEntry {
    statement: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
}

pub fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Render {
            config,
            out_dir,
            scale,
        } => render(config.as_deref(), &out_dir, scale)?,
        Commands::View { config } => view(config.as_deref())?,
        Commands::Config { write } => {
            save_settings(&write, &RevisSettings::default())?;
            print_info(&format!("Default settings written to {}", write.display()));
        }
    }
    Ok(())
}

fn load(config: Option<&Path>) -> Result<RevisSettings, RevisError> {
    match config {
        Some(path) => load_settings(path),
        None => Ok(RevisSettings::default()),
    }
}

/// Evaluates the demo worksheet on a worker thread, then prints every result:
/// text to stdout, figures through a headless UI thread into PNG files.
fn render(
    config: Option<&Path>,
    out_dir: &Path,
    scale: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = load(config)?;
    if let Some(scale) = scale {
        settings.render.scale_factor = scale;
        settings = normalize_settings(settings)?;
    }
    install_settings(settings.clone());
    let background = settings.render_options()?.background;
    std::fs::create_dir_all(out_dir)?;

    let worker = thread::Builder::new()
        .name("revis-worksheet".to_string())
        .spawn(|| {
            let mut sheet = Worksheet::new();
            demo::run(&mut sheet).map(|_| sheet.results())
        })?;
    let records = worker
        .join()
        .map_err(|_| "worksheet thread panicked")??;

    let mut manifest = Vec::new();
    let mut figures = 0usize;
    for record in &records {
        let entry = match &record.value {
            ResultValue::Text(text) => {
                print_text_result(record.statement_id, text);
                ManifestEntry {
                    statement: record.statement_id,
                    text: Some(text.clone()),
                    file: None,
                    height: None,
                }
            }
            value => {
                let Some(fig) = InlineFigure::from_result(value) else {
                    print_error(&format!(
                        "statement {}: unsupported rich result",
                        record.statement_id
                    ));
                    continue;
                };
                figures += 1;
                let file = format!("result_{figures}.png");
                let height = print_figure(&fig, background, &out_dir.join(&file))?;
                print_info(&format!("[{}] figure -> {file}", record.statement_id));
                ManifestEntry {
                    statement: record.statement_id,
                    text: None,
                    file: Some(file),
                    height: Some(height),
                }
            }
        };
        manifest.push(entry);
    }
    dispatch::clear_global();

    let manifest_path = out_dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    print_info(&format!(
        "{} results, {figures} figures written to {}",
        records.len(),
        out_dir.display()
    ));
    Ok(())
}

/// Prints one figure the way the notebook would: measure, then paint onto a
/// surface of that size.
fn print_figure(
    fig: &Arc<InlineFigure>,
    background: figure::Rgba,
    path: &Path,
) -> Result<f64, Box<dyn std::error::Error>> {
    fig.create_widget()?;
    let (width, _) = fig.options().size;
    let mut measure = RasterContext::new(1, 1, background);
    let height = fig.print_result(&mut measure, false)?;

    let mut ctx = RasterContext::new(width, height.ceil() as u32, background);
    fig.print_result(&mut ctx, true)?;
    ctx.image().save(path)?;
    fig.destroy_widget();
    Ok(height)
}

fn view(config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load(config)?;
    install_settings(settings.clone());
    let render_options = settings.render_options()?;

    let (dispatcher, queue) = dispatch::channel(settings.dispatch_options());
    let (results_tx, results_rx) = mpsc::channel();
    let worker = thread::Builder::new()
        .name("revis-worksheet".to_string())
        .spawn(move || {
            let mut sheet = Worksheet::with_observer(move |record| {
                let _ = results_tx.send(record.clone());
            });
            if let Err(err) = demo::run(&mut sheet) {
                log::error!("worksheet stopped: {err}");
            }
        })?;

    run_viewer(
        GuiConfig::default(),
        dispatcher,
        queue,
        results_rx,
        render_options,
    )?;
    if worker.join().is_err() {
        print_error("worksheet thread panicked");
    }
    Ok(())
}
