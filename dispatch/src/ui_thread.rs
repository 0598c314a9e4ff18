use crate::{channel, DispatchError, DispatchOptions, UiDispatcher};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

static GLOBAL_DISPATCHER: Mutex<Option<UiDispatcher>> = Mutex::new(None);
static HEADLESS_THREAD: Mutex<Option<UiThread>> = Mutex::new(None);

/// A UI thread without a toolkit: it only runs idle callbacks.
pub struct UiThread {
    dispatcher: UiDispatcher,
    handle: Option<JoinHandle<()>>,
}

pub fn spawn_ui_thread(name: &str, options: DispatchOptions) -> Result<UiThread, DispatchError> {
    let (dispatcher, queue) = channel(options);
    let (ready_tx, ready_rx) = mpsc::channel();
    let thread_name = name.to_string();

    let handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let bound = queue.bind_to_current_thread();
            let ok = bound.is_ok();
            let _ = ready_tx.send(bound);
            if !ok {
                return;
            }
            log::info!("ui thread '{thread_name}' started");
            if let Err(err) = queue.run_until_shutdown() {
                log::warn!("ui thread '{thread_name}' stopped: {err}");
            }
            log::info!("ui thread '{thread_name}' exiting");
        })
        .map_err(|err| DispatchError::Spawn(err.to_string()))?;

    ready_rx
        .recv()
        .map_err(|_| DispatchError::Disconnected)??;

    Ok(UiThread {
        dispatcher,
        handle: Some(handle),
    })
}

impl UiThread {
    pub fn dispatcher(&self) -> UiDispatcher {
        self.dispatcher.clone()
    }

    /// Stops the loop after the tasks already queued and joins the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.dispatcher.shutdown();
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            log::warn!("ui thread panicked while shutting down");
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Makes `dispatcher` the process-wide one. Returns the previous dispatcher.
pub fn install_global(dispatcher: UiDispatcher) -> Option<UiDispatcher> {
    GLOBAL_DISPATCHER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(dispatcher)
}

pub fn global() -> Option<UiDispatcher> {
    GLOBAL_DISPATCHER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Returns the process-wide dispatcher, spawning a headless UI thread when
/// no toolkit application has installed one.
pub fn ensure_app(options: DispatchOptions) -> Result<UiDispatcher, DispatchError> {
    let mut slot = GLOBAL_DISPATCHER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(dispatcher) = slot.as_ref() {
        return Ok(dispatcher.clone());
    }

    let ui_thread = spawn_ui_thread("revis-ui", options)?;
    let dispatcher = ui_thread.dispatcher();
    *slot = Some(dispatcher.clone());
    drop(slot);

    let previous = HEADLESS_THREAD
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(ui_thread);
    drop(previous);
    Ok(dispatcher)
}

/// Forgets the process-wide dispatcher and stops the headless UI thread if
/// [`ensure_app`] started one.
pub fn clear_global() {
    GLOBAL_DISPATCHER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    let headless = HEADLESS_THREAD
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(ui_thread) = headless {
        ui_thread.shutdown();
    }
}
