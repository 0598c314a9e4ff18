use crate::canvas::FigureCanvas;
use dispatch::{IdleQueue, UiDispatcher};
use eframe::egui;
use figure::RenderOptions;
use revis_core::{InlineFigure, RecordedResult, ResultValue};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

enum Entry {
    Text { statement_id: u64, text: String },
    Figure { statement_id: u64, canvas: FigureCanvas },
}

/// The eframe app that owns the UI thread. It drains idle callbacks posted
/// through the dispatcher every frame and lists statement results as they
/// arrive from the worker.
pub struct ViewerApp {
    dispatcher: UiDispatcher,
    queue: IdleQueue,
    results_rx: Receiver<RecordedResult>,
    render_options: RenderOptions,
    entries: Vec<Entry>,
    worker_done: bool,
}

impl ViewerApp {
    pub fn new(
        dispatcher: UiDispatcher,
        queue: IdleQueue,
        results_rx: Receiver<RecordedResult>,
        render_options: RenderOptions,
    ) -> Self {
        Self {
            dispatcher,
            queue,
            results_rx,
            render_options,
            entries: Vec::new(),
            worker_done: false,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn figure_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Figure { .. }))
            .count()
    }

    pub fn worker_done(&self) -> bool {
        self.worker_done
    }

    /// Runs queued idle callbacks and takes in new results. Must be called
    /// on the thread the queue is bound to.
    pub fn pump(&mut self) -> usize {
        let ran = self.queue.run_pending();
        loop {
            match self.results_rx.try_recv() {
                Ok(record) => self.push_result(record),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.worker_done {
                        log::info!("worksheet finished");
                    }
                    self.worker_done = true;
                    break;
                }
            }
        }
        ran
    }

    fn push_result(&mut self, record: RecordedResult) {
        let statement_id = record.statement_id;
        match &record.value {
            ResultValue::Text(text) => self.entries.push(Entry::Text {
                statement_id,
                text: text.clone(),
            }),
            value => match InlineFigure::from_result(value) {
                Some(figure) => {
                    if let Err(err) = figure.create_widget_on(self.dispatcher.clone()) {
                        log::warn!("figure {} has no widget: {err}", figure.id());
                    }
                    self.entries.push(Entry::Figure {
                        statement_id,
                        canvas: FigureCanvas::new(figure, self.render_options),
                    });
                }
                None => log::warn!("statement {statement_id}: unsupported rich result"),
            },
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump();
        if !self.worker_done {
            ctx.request_repaint_after(RESULT_POLL_INTERVAL);
        }

        egui::TopBottomPanel::bottom("revis_status").show(ctx, |ui| {
            let state = if self.worker_done { "done" } else { "running" };
            ui.label(format!(
                "{} results, {} figures, worksheet {state}",
                self.entry_count(),
                self.figure_count()
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for entry in &mut self.entries {
                        match entry {
                            Entry::Text { statement_id, text } => {
                                ui.horizontal(|ui| {
                                    ui.weak(format!("[{statement_id}]"));
                                    ui.monospace(text.as_str());
                                });
                            }
                            Entry::Figure {
                                statement_id,
                                canvas,
                            } => {
                                ui.weak(format!("[{statement_id}]"));
                                canvas.ui(ui);
                            }
                        }
                        ui.separator();
                    }
                });
        });
    }
}

impl Drop for ViewerApp {
    fn drop(&mut self) {
        for entry in &self.entries {
            if let Entry::Figure { canvas, .. } = entry {
                canvas.figure().destroy_widget();
            }
        }
    }
}
