//! Figures that display themselves as rich results.
//!
//! Opening a [`FigureSession`] takes the process-wide figure lock, makes the
//! figure current and silences the statement's text output. Dropping the
//! session undoes all of that and hands the figure to the notebook.

use crate::notebook::{silent_hook, CustomResult, OutputHook, ResultValue, Statement};
use crate::settings::{settings, RevisSettings};
use crate::surface::PrintContext;
use crate::RevisError;
use dispatch::UiDispatcher;
use figure::{Figure, RenderOptions, Snapshot};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::any::Any;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type CurrentFigure = RefCell<Option<Arc<InlineFigure>>>;

static FIGURE_LOCK: ReentrantMutex<CurrentFigure> =
    parking_lot::const_reentrant_mutex(RefCell::new(None));

static NEXT_FIGURE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) type FigureLockGuard = ReentrantMutexGuard<'static, CurrentFigure>;

/// Takes the process-wide figure lock. Reentrant on the owning thread.
pub(crate) fn lock_figures() -> FigureLockGuard {
    FIGURE_LOCK.lock()
}

/// The figure of the innermost open session, if any.
pub fn gcf() -> Option<Arc<InlineFigure>> {
    FIGURE_LOCK.lock().borrow().clone()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureOptions {
    /// Silence the statement's text output while a session is open.
    pub disable_output: bool,
    /// Requested size in logical pixels.
    pub size: (u32, u32),
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self::from_settings(&RevisSettings::default())
    }
}

impl FigureOptions {
    pub fn from_settings(settings: &RevisSettings) -> Self {
        Self {
            disable_output: settings.figure.disable_output,
            size: (settings.figure.width, settings.figure.height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

struct WidgetState {
    dispatcher: UiDispatcher,
    geometry: WidgetGeometry,
}

pub struct InlineFigure {
    id: u64,
    this: Weak<InlineFigure>,
    options: FigureOptions,
    figure: Mutex<Figure>,
    widget: Mutex<Option<WidgetState>>,
}

impl std::fmt::Debug for InlineFigure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineFigure")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("has_widget", &self.has_widget())
            .finish()
    }
}

impl InlineFigure {
    /// Creates the figure without a widget; one is only made when the
    /// notebook asks for it.
    pub fn new(options: FigureOptions) -> Arc<Self> {
        let (width, height) = options.size;
        Arc::new_cyclic(|this| Self {
            id: NEXT_FIGURE_ID.fetch_add(1, Ordering::Relaxed),
            this: this.clone(),
            options,
            figure: Mutex::new(Figure::new(width, height)),
            widget: Mutex::new(None),
        })
    }

    /// The figure behind a rich result, if it is one.
    pub fn from_result(value: &ResultValue) -> Option<Arc<InlineFigure>> {
        value
            .as_custom()?
            .as_any()
            .downcast_ref::<InlineFigure>()?
            .this
            .upgrade()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn options(&self) -> FigureOptions {
        self.options
    }

    /// Opens a session: takes the figure lock, makes `self` current and
    /// swaps out the current statement's output hook.
    pub fn enter(self: &Arc<Self>) -> FigureSession {
        let lock = lock_figures();
        let previous = lock.borrow_mut().replace(Arc::clone(self));

        let statement = Statement::get_current();
        let saved_hook = statement.as_ref().map(|statement| {
            let scope = statement.result_scope();
            if self.options.disable_output {
                scope.set_output_hook(silent_hook())
            } else {
                scope.output_hook()
            }
        });
        log::debug!(
            "figure {} session opened (statement: {:?})",
            self.id,
            statement.as_ref().map(|s| s.id())
        );

        FigureSession {
            figure: Arc::clone(self),
            previous,
            statement,
            saved_hook,
            lock,
        }
    }

    pub fn with_figure<R>(&self, f: impl FnOnce(&Figure) -> R) -> R {
        f(&self.figure.lock())
    }

    pub fn with_figure_mut<R>(&self, f: impl FnOnce(&mut Figure) -> R) -> R {
        f(&mut self.figure.lock())
    }

    pub fn revision(&self) -> u64 {
        self.figure.lock().revision()
    }

    pub fn has_widget(&self) -> bool {
        self.widget.lock().is_some()
    }

    /// `(x, y, width, height)` of the widget, or the requested size at the
    /// origin while no widget exists.
    pub fn position(&self) -> (f64, f64, f64, f64) {
        match self.widget.lock().as_ref() {
            Some(state) => {
                let g = state.geometry;
                (g.x, g.y, g.width, g.height)
            }
            None => {
                let (width, height) = self.options.size;
                (0.0, 0.0, f64::from(width), f64::from(height))
            }
        }
    }

    /// Event pumping is left to the UI loop; doing it from a statement's
    /// thread would touch the toolkit off its thread.
    pub fn process_gui_events(&self) {
        log::trace!("figure {}: process_gui_events ignored", self.id);
    }

    /// Registers the widget that shows this figure. The registration runs on
    /// the UI thread, starting a headless one if no toolkit app exists.
    pub fn create_widget(&self) -> Result<(), RevisError> {
        let dispatcher = dispatch::ensure_app(settings().dispatch_options())?;
        self.create_widget_on(dispatcher)
    }

    pub fn create_widget_on(&self, dispatcher: UiDispatcher) -> Result<(), RevisError> {
        let this = self.this.upgrade().ok_or(RevisError::FigureGone)?;
        let ui = dispatcher.clone();
        dispatcher.invoke_blocking(move || {
            let (width, height) = this.options.size;
            *this.widget.lock() = Some(WidgetState {
                dispatcher: ui,
                geometry: WidgetGeometry {
                    x: 0.0,
                    y: 0.0,
                    width: f64::from(width),
                    height: f64::from(height),
                },
            });
            log::debug!("figure {} widget created", this.id);
        })?;
        Ok(())
    }

    /// Called by the widget when its allocation changes.
    pub fn set_widget_geometry(&self, geometry: WidgetGeometry) {
        if let Some(state) = self.widget.lock().as_mut() {
            state.geometry = geometry;
        }
    }

    pub fn destroy_widget(&self) {
        if self.widget.lock().take().is_some() {
            log::debug!("figure {} widget destroyed", self.id);
        }
    }

    fn widget_dispatcher(&self) -> Option<UiDispatcher> {
        self.widget
            .lock()
            .as_ref()
            .map(|state| state.dispatcher.clone())
    }

    /// Asks the UI thread to repaint the widget. Without a widget there is
    /// nothing to redraw.
    pub fn draw(&self) -> Result<(), RevisError> {
        let Some(dispatcher) = self.widget_dispatcher() else {
            return Ok(());
        };
        let id = self.id;
        dispatcher.invoke_later(move || log::trace!("figure {id} redraw requested"))?;
        Ok(())
    }

    /// Renders the figure. Once a widget exists the figure belongs to the UI
    /// thread, so rendering is marshaled there and this call blocks until it
    /// is done.
    pub fn snapshot(&self, options: RenderOptions) -> Result<Snapshot, RevisError> {
        match self.widget_dispatcher() {
            Some(dispatcher) => {
                let this = self.this.upgrade().ok_or(RevisError::FigureGone)?;
                dispatcher.invoke_blocking(move || this.render_now(&options))?
            }
            None => self.render_now(&options),
        }
    }

    fn render_now(&self, options: &RenderOptions) -> Result<Snapshot, RevisError> {
        let figure = self.figure.lock().clone();
        Ok(figure::render(&figure, options)?)
    }
}

impl CustomResult for InlineFigure {
    fn print_result(&self, ctx: &mut dyn PrintContext, render: bool) -> Result<f64, RevisError> {
        let (_, _, _, height) = self.position();
        if render {
            let options = settings().render_options()?;
            let snapshot = self.snapshot(options)?;
            let sf = f64::from(snapshot.scale_factor);

            let surface = ctx.surface();
            surface.save();
            surface.scale(1.0 / sf, 1.0 / sf);
            let painted = surface.paint_image(&snapshot.image, 0.0, 0.0);
            surface.restore();
            painted?;
        }
        Ok(height)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An open figure-construction transaction. Dropping it closes the session,
/// also while unwinding.
#[must_use = "the session closes as soon as it is dropped"]
pub struct FigureSession {
    figure: Arc<InlineFigure>,
    previous: Option<Arc<InlineFigure>>,
    statement: Option<Arc<Statement>>,
    saved_hook: Option<OutputHook>,
    lock: FigureLockGuard,
}

impl FigureSession {
    pub fn figure(&self) -> &Arc<InlineFigure> {
        &self.figure
    }
}

impl std::ops::Deref for FigureSession {
    type Target = InlineFigure;

    fn deref(&self) -> &InlineFigure {
        &self.figure
    }
}

impl Drop for FigureSession {
    fn drop(&mut self) {
        *self.lock.borrow_mut() = self.previous.take();

        let (Some(statement), Some(hook)) = (self.statement.take(), self.saved_hook.take()) else {
            log::debug!("figure {} session closed", self.figure.id);
            return;
        };
        statement.result_scope().set_output_hook(Arc::clone(&hook));
        if std::thread::panicking() {
            log::warn!(
                "figure {} session unwound; not displaying it",
                self.figure.id
            );
            return;
        }
        let result: Arc<dyn CustomResult> = self.figure.clone();
        hook(ResultValue::Custom(result));
        log::debug!(
            "figure {} session closed, output to statement {}",
            self.figure.id,
            statement.id()
        );
    }
}
