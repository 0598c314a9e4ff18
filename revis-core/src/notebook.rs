//! The notebook side of the boundary: statements, their result scope and the
//! output hook that displays results.

use crate::surface::PrintContext;
use crate::RevisError;
use parking_lot::Mutex;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// A result the notebook shows with its own rendering instead of text.
pub trait CustomResult: Send + Sync {
    /// Prints onto `ctx` and returns the height used. With `render == false`
    /// only the height is computed.
    fn print_result(&self, ctx: &mut dyn PrintContext, render: bool) -> Result<f64, RevisError>;

    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone)]
pub enum ResultValue {
    Text(String),
    Custom(Arc<dyn CustomResult>),
}

impl ResultValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultValue::Text(text) => Some(text),
            ResultValue::Custom(_) => None,
        }
    }

    pub fn as_custom(&self) -> Option<&Arc<dyn CustomResult>> {
        match self {
            ResultValue::Custom(result) => Some(result),
            ResultValue::Text(_) => None,
        }
    }
}

impl fmt::Debug for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ResultValue::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub type OutputHook = Arc<dyn Fn(ResultValue) + Send + Sync>;

/// Hook that drops everything.
pub fn silent_hook() -> OutputHook {
    Arc::new(|_| {})
}

pub struct ResultScope {
    output: Mutex<OutputHook>,
}

impl ResultScope {
    pub fn new(output: OutputHook) -> Self {
        Self {
            output: Mutex::new(output),
        }
    }

    pub fn output_hook(&self) -> OutputHook {
        Arc::clone(&self.output.lock())
    }

    /// Replaces the hook and returns the previous one.
    pub fn set_output_hook(&self, hook: OutputHook) -> OutputHook {
        std::mem::replace(&mut *self.output.lock(), hook)
    }

    pub fn emit(&self, value: ResultValue) {
        // Called outside the lock so the hook may swap itself.
        let hook = self.output_hook();
        hook(value);
    }
}

thread_local! {
    static CURRENT_STATEMENT: RefCell<Option<Arc<Statement>>> = const { RefCell::new(None) };
}

pub struct Statement {
    id: u64,
    source: String,
    result_scope: ResultScope,
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("id", &self.id)
            .field("source", &self.source)
            .finish()
    }
}

impl Statement {
    pub fn new(id: u64, source: impl Into<String>, output: OutputHook) -> Arc<Self> {
        Arc::new(Self {
            id,
            source: source.into(),
            result_scope: ResultScope::new(output),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn result_scope(&self) -> &ResultScope {
        &self.result_scope
    }

    /// The statement executing on this thread, if any.
    pub fn get_current() -> Option<Arc<Statement>> {
        CURRENT_STATEMENT.with(|current| current.borrow().clone())
    }

    /// Runs `body` with `self` as the current statement of this thread.
    pub fn execute<R>(self: &Arc<Self>, body: impl FnOnce() -> R) -> R {
        struct Restore(Option<Arc<Statement>>);

        impl Drop for Restore {
            fn drop(&mut self) {
                let previous = self.0.take();
                CURRENT_STATEMENT.with(|current| *current.borrow_mut() = previous);
            }
        }

        let previous = CURRENT_STATEMENT.with(|current| current.replace(Some(Arc::clone(self))));
        let _restore = Restore(previous);
        body()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedResult {
    pub statement_id: u64,
    pub value: ResultValue,
}

type Observer = Arc<dyn Fn(&RecordedResult) + Send + Sync>;

/// Minimal notebook: runs statements one after another and records what
/// they output.
pub struct Worksheet {
    next_id: u64,
    records: Arc<Mutex<Vec<RecordedResult>>>,
    observer: Option<Observer>,
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Worksheet {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            records: Arc::new(Mutex::new(Vec::new())),
            observer: None,
        }
    }

    /// `observer` sees every recorded result, on the thread that emitted it.
    pub fn with_observer<F>(observer: F) -> Self
    where
        F: Fn(&RecordedResult) + Send + Sync + 'static,
    {
        Self {
            observer: Some(Arc::new(observer)),
            ..Self::new()
        }
    }

    /// Executes one statement. A `Some(text)` value is printed as a text
    /// result through the statement's output hook.
    pub fn run<F>(&mut self, source: &str, body: F) -> Result<u64, RevisError>
    where
        F: FnOnce() -> Result<Option<String>, RevisError>,
    {
        let id = self.next_id;
        self.next_id += 1;

        let records = Arc::clone(&self.records);
        let observer = self.observer.clone();
        let hook: OutputHook = Arc::new(move |value| {
            let record = RecordedResult {
                statement_id: id,
                value,
            };
            if let Some(observer) = &observer {
                observer(&record);
            }
            records.lock().push(record);
        });

        let statement = Statement::new(id, source, hook);
        log::debug!("executing statement {id}: {source}");
        let value = statement.execute(body)?;
        if let Some(text) = value {
            statement.result_scope().emit(ResultValue::Text(text));
        }
        Ok(id)
    }

    pub fn results(&self) -> Vec<RecordedResult> {
        self.records.lock().clone()
    }

    pub fn results_for(&self, statement_id: u64) -> Vec<ResultValue> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.statement_id == statement_id)
            .map(|record| record.value.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_restores_previous_statement() {
        let outer = Statement::new(1, "outer", silent_hook());
        let inner = Statement::new(2, "inner", silent_hook());
        assert!(Statement::get_current().is_none());
        outer.execute(|| {
            assert_eq!(Statement::get_current().unwrap().id(), 1);
            inner.execute(|| assert_eq!(Statement::get_current().unwrap().id(), 2));
            assert_eq!(Statement::get_current().unwrap().id(), 1);
        });
        assert!(Statement::get_current().is_none());
    }

    #[test]
    fn set_output_hook_returns_previous() {
        let scope = ResultScope::new(silent_hook());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let previous = scope.set_output_hook(Arc::new(move |value: ResultValue| {
            sink.lock().push(value.as_text().unwrap_or_default().to_string());
        }));
        scope.emit(ResultValue::Text("shown".into()));
        scope.set_output_hook(previous);
        scope.emit(ResultValue::Text("dropped".into()));
        assert_eq!(*seen.lock(), vec!["shown".to_string()]);
    }
}
