use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use super::*;

#[test]
fn test_inline_executor_runs_synchronously() {
    let counter = Arc::new(AtomicUsize::new(0));
    let executor = InlineExecutor;
    let task_counter = counter.clone();
    executor.schedule(Box::new(move || {
        task_counter.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pool_runs_tasks_off_caller_thread() {
    let executor = ThreadPoolExecutor::new(2);
    let caller = std::thread::current().id();
    let (sender, receiver) = mpsc::channel();

    executor.schedule(Box::new(move || {
        let _ = sender.send(std::thread::current().id());
    }));

    let worker = receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("task should run");
    assert_ne!(worker, caller);
}

#[test]
fn test_pool_runs_all_tasks() {
    let executor = ThreadPoolExecutor::new(4);
    let counter = Arc::new(AtomicUsize::new(0));
    let (sender, receiver) = mpsc::channel();

    for _ in 0..100 {
        let counter = counter.clone();
        let sender = sender.clone();
        executor.schedule(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = sender.send(());
        }));
    }

    for _ in 0..100 {
        receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("all tasks should run");
    }
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_panicking_task_does_not_kill_workers() {
    let executor = ThreadPoolExecutor::new(1);
    let (sender, receiver) = mpsc::channel();

    executor.schedule(Box::new(|| panic!("task blew up")));
    executor.schedule(Box::new(move || {
        let _ = sender.send(());
    }));

    receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("worker should survive the panic");
}

#[test]
fn test_schedule_after_stop_is_dropped() {
    let executor = ThreadPoolExecutor::new(1);
    executor.stop();

    let counter = Arc::new(AtomicUsize::new(0));
    let task_counter = counter.clone();
    executor.schedule(Box::new(move || {
        task_counter.fetch_add(1, Ordering::SeqCst);
    }));

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_stop_drains_queued_tasks() {
    let executor = ThreadPoolExecutor::new(1);
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..10 {
        let counter = counter.clone();
        executor.schedule(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }
    executor.stop();
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

#[test]
fn test_stop_twice_is_harmless() {
    let executor = ThreadPoolExecutor::new(2);
    executor.stop();
    executor.stop();
}
