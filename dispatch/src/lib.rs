//! Marshaling of calls onto a toolkit's single UI thread.
//!
//! A [`UiDispatcher`] queues idle callbacks that an [`IdleQueue`] runs on the
//! thread it is bound to. [`UiDispatcher::invoke_blocking`] is the blocking
//! variant: the caller waits until the callback has run and gets its result
//! back, or runs it inline when it already is the UI thread.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;

mod ui_thread;

pub use ui_thread::{clear_global, ensure_app, global, install_global, spawn_ui_thread, UiThread};

pub type IdleTask = Box<dyn FnOnce() + Send + 'static>;

type Waker = Arc<dyn Fn() + Send + Sync>;

enum IdleMessage {
    Run(IdleTask),
    Shutdown,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("ui thread is gone")]
    Disconnected,
    #[error("idle callback did not finish within {0:?}")]
    Timeout(Duration),
    #[error("idle callback panicked: {0}")]
    CallbackPanicked(String),
    #[error("no ui thread is bound to this dispatcher")]
    NotBound,
    #[error("idle queue is already bound to another thread")]
    AlreadyBound,
    #[error("failed to spawn ui thread: {0}")]
    Spawn(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl DispatchOptions {
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }
}

struct Shared {
    ui_thread: OnceLock<ThreadId>,
    waker: Mutex<Option<Waker>>,
}

/// Sending half. Cheap to clone and usable from any thread.
#[derive(Clone)]
pub struct UiDispatcher {
    sender: Sender<IdleMessage>,
    shared: Arc<Shared>,
    options: DispatchOptions,
}

/// Receiving half, owned by the loop that runs on the UI thread.
pub struct IdleQueue {
    receiver: Receiver<IdleMessage>,
    shared: Arc<Shared>,
    shut_down: Cell<bool>,
}

pub fn channel(options: DispatchOptions) -> (UiDispatcher, IdleQueue) {
    let (sender, receiver) = mpsc::channel();
    let shared = Arc::new(Shared {
        ui_thread: OnceLock::new(),
        waker: Mutex::new(None),
    });
    (
        UiDispatcher {
            sender,
            shared: Arc::clone(&shared),
            options,
        },
        IdleQueue {
            receiver,
            shared,
            shut_down: Cell::new(false),
        },
    )
}

impl std::fmt::Debug for UiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("ui_thread", &self.shared.ui_thread.get())
            .field("options", &self.options)
            .finish()
    }
}

impl UiDispatcher {
    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    pub fn ui_thread_id(&self) -> Option<ThreadId> {
        self.shared.ui_thread.get().copied()
    }

    pub fn is_ui_thread(&self) -> bool {
        self.ui_thread_id() == Some(thread::current().id())
    }

    /// Installs the callback run after every post, typically a repaint
    /// request so an idle event loop notices the new task.
    pub fn set_waker<F>(&self, waker: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.shared.waker.lock() {
            *slot = Some(Arc::new(waker));
        }
    }

    /// Runs `f` on the UI thread and waits for its result.
    ///
    /// Called from the UI thread itself, `f` runs inline. A panic inside `f`
    /// is caught on the UI thread and reported as
    /// [`DispatchError::CallbackPanicked`].
    pub fn invoke_blocking<F, R>(&self, f: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.ui_thread_id().is_none() {
            return Err(DispatchError::NotBound);
        }
        if self.is_ui_thread() {
            return run_guarded(f);
        }

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.post(Box::new(move || {
            let _ = reply_tx.send(run_guarded(f));
        }))?;

        match self.options.timeout {
            Some(timeout) => match reply_rx.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("idle callback still pending after {timeout:?}");
                    Err(DispatchError::Timeout(timeout))
                }
                Err(RecvTimeoutError::Disconnected) => Err(DispatchError::Disconnected),
            },
            None => reply_rx.recv().map_err(|_| DispatchError::Disconnected)?,
        }
    }

    /// Queues `f` without waiting. Panics are logged and swallowed.
    pub fn invoke_later<F>(&self, f: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(Box::new(move || {
            if let Err(err) = run_guarded(f) {
                log::warn!("{err}");
            }
        }))
    }

    /// Asks the loop running the [`IdleQueue`] to stop after the tasks
    /// already queued.
    pub fn shutdown(&self) -> Result<(), DispatchError> {
        self.sender
            .send(IdleMessage::Shutdown)
            .map_err(|_| DispatchError::Disconnected)?;
        self.wake();
        Ok(())
    }

    fn post(&self, task: IdleTask) -> Result<(), DispatchError> {
        self.sender
            .send(IdleMessage::Run(task))
            .map_err(|_| DispatchError::Disconnected)?;
        self.wake();
        Ok(())
    }

    fn wake(&self) {
        let waker = match self.shared.waker.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl IdleQueue {
    /// Declares the calling thread as the UI thread. Binding twice from the
    /// same thread is fine; a different thread gets `AlreadyBound`.
    pub fn bind_to_current_thread(&self) -> Result<(), DispatchError> {
        let current = thread::current().id();
        let bound = *self.shared.ui_thread.get_or_init(|| current);
        if bound == current {
            Ok(())
        } else {
            Err(DispatchError::AlreadyBound)
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.get()
    }

    /// Runs every task queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        while !self.shut_down.get() {
            match self.receiver.try_recv() {
                Ok(IdleMessage::Run(task)) => {
                    task();
                    count += 1;
                }
                Ok(IdleMessage::Shutdown) => self.shut_down.set(true),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.shut_down.set(true),
            }
        }
        count
    }

    /// Runs tasks as they arrive until a shutdown request or until every
    /// dispatcher is gone.
    pub fn run_until_shutdown(&self) -> Result<(), DispatchError> {
        self.bind_to_current_thread()?;
        while !self.shut_down.get() {
            match self.receiver.recv() {
                Ok(IdleMessage::Run(task)) => task(),
                Ok(IdleMessage::Shutdown) | Err(_) => self.shut_down.set(true),
            }
        }
        Ok(())
    }
}

fn run_guarded<F, R>(f: F) -> Result<R, DispatchError>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| DispatchError::CallbackPanicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_zero_timeout_wait_forever() {
        assert_eq!(DispatchOptions::with_timeout_ms(0).timeout, None);
        assert_eq!(
            DispatchOptions::with_timeout_ms(250).timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn panic_message_handles_both_string_kinds() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
    }
}
