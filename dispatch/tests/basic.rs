use dispatch::{channel, ensure_app, spawn_ui_thread, DispatchError, DispatchOptions};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn blocking_call_runs_on_ui_thread() {
    let ui = spawn_ui_thread("test-ui", DispatchOptions::default()).unwrap();
    let dispatcher = ui.dispatcher();
    let ui_id = dispatcher.ui_thread_id().unwrap();

    let ran_on = dispatcher
        .invoke_blocking(|| thread::current().id())
        .unwrap();
    assert_eq!(ran_on, ui_id);
    assert_ne!(ran_on, thread::current().id());
    assert!(!dispatcher.is_ui_thread());
    ui.shutdown();
}

#[test]
fn blocking_call_from_ui_thread_runs_inline() {
    let ui = spawn_ui_thread("test-ui-nested", DispatchOptions::default()).unwrap();
    let dispatcher = ui.dispatcher();
    let inner = dispatcher.clone();

    let value = dispatcher
        .invoke_blocking(move || {
            assert!(inner.is_ui_thread());
            inner.invoke_blocking(|| 21 * 2)
        })
        .unwrap();
    assert_eq!(value, Ok(42));
}

#[test]
fn panicking_callback_is_reported_and_thread_survives() {
    let ui = spawn_ui_thread("test-ui-panic", DispatchOptions::default()).unwrap();
    let dispatcher = ui.dispatcher();

    let err = dispatcher
        .invoke_blocking(|| -> u32 { panic!("boom") })
        .unwrap_err();
    assert_eq!(err, DispatchError::CallbackPanicked("boom".to_string()));

    assert_eq!(dispatcher.invoke_blocking(|| 7).unwrap(), 7);
}

#[test]
fn unbound_dispatcher_refuses_blocking_calls() {
    let (dispatcher, _queue) = channel(DispatchOptions::default());
    assert_eq!(
        dispatcher.invoke_blocking(|| ()).unwrap_err(),
        DispatchError::NotBound
    );
}

#[test]
fn blocking_call_times_out_when_ui_thread_is_busy() {
    let (dispatcher, queue) = channel(DispatchOptions::with_timeout_ms(50));
    let (bound_tx, bound_rx) = std::sync::mpsc::channel();
    let busy = thread::spawn(move || {
        queue.bind_to_current_thread().unwrap();
        bound_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(300));
        queue.run_pending()
    });
    bound_rx.recv().unwrap();

    let err = dispatcher.invoke_blocking(|| 1).unwrap_err();
    assert_eq!(err, DispatchError::Timeout(Duration::from_millis(50)));
    assert_eq!(busy.join().unwrap(), 1);
}

#[test]
fn pending_tasks_run_in_fifo_order() {
    let (dispatcher, queue) = channel(DispatchOptions::default());
    let order = Arc::new(Mutex::new(Vec::new()));
    for idx in 0..5 {
        let order = Arc::clone(&order);
        dispatcher
            .invoke_later(move || order.lock().unwrap().push(idx))
            .unwrap();
    }
    queue.bind_to_current_thread().unwrap();
    assert_eq!(queue.run_pending(), 5);
    assert_eq!(queue.run_pending(), 0);
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn shutdown_stops_run_pending() {
    let (dispatcher, queue) = channel(DispatchOptions::default());
    dispatcher.invoke_later(|| ()).unwrap();
    dispatcher.shutdown().unwrap();
    dispatcher.invoke_later(|| ()).unwrap();
    assert_eq!(queue.run_pending(), 1);
    assert!(queue.is_shut_down());
    assert_eq!(queue.run_pending(), 0);
}

#[test]
fn dropped_queue_disconnects_dispatcher() {
    let (dispatcher, queue) = channel(DispatchOptions::default());
    queue.bind_to_current_thread().unwrap();
    drop(queue);
    assert_eq!(
        dispatcher.invoke_later(|| ()).unwrap_err(),
        DispatchError::Disconnected
    );
}

#[test]
fn queue_cannot_be_rebound_to_another_thread() {
    let (_dispatcher, queue) = channel(DispatchOptions::default());
    queue.bind_to_current_thread().unwrap();
    queue.bind_to_current_thread().unwrap();
    let queue = Arc::new(Mutex::new(Some(queue)));
    let handle = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let guard = queue.lock().unwrap();
            let result = guard.as_ref().unwrap().bind_to_current_thread();
            result
        })
    };
    assert_eq!(handle.join().unwrap(), Err(DispatchError::AlreadyBound));
}

#[test]
fn waker_fires_on_every_post() {
    let (dispatcher, queue) = channel(DispatchOptions::default());
    let wakes = Arc::new(AtomicUsize::new(0));
    {
        let wakes = Arc::clone(&wakes);
        dispatcher.set_waker(move || {
            wakes.fetch_add(1, Ordering::SeqCst);
        });
    }
    dispatcher.invoke_later(|| ()).unwrap();
    dispatcher.invoke_later(|| ()).unwrap();
    assert_eq!(wakes.load(Ordering::SeqCst), 2);
    queue.bind_to_current_thread().unwrap();
    assert_eq!(queue.run_pending(), 2);
}

#[test]
#[serial]
fn ensure_app_reuses_the_global_dispatcher() {
    dispatch::clear_global();
    assert!(dispatch::global().is_none());

    let first = ensure_app(DispatchOptions::default()).unwrap();
    let second = ensure_app(DispatchOptions::default()).unwrap();
    assert_eq!(first.ui_thread_id(), second.ui_thread_id());
    assert_eq!(first.invoke_blocking(|| 3).unwrap(), 3);

    dispatch::clear_global();
    assert!(dispatch::global().is_none());
}

#[test]
#[serial]
fn installed_dispatcher_wins_over_headless_thread() {
    dispatch::clear_global();
    let ui = spawn_ui_thread("test-ui-installed", DispatchOptions::default()).unwrap();
    dispatch::install_global(ui.dispatcher());

    let dispatcher = ensure_app(DispatchOptions::default()).unwrap();
    assert_eq!(dispatcher.ui_thread_id(), ui.dispatcher().ui_thread_id());

    dispatch::clear_global();
    ui.shutdown();
}
