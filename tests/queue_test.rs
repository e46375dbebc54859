//! Serialized update queue integration tests.

use cookiescope::base::error::EngineError;
use cookiescope::engine::queue::SerializedQueue;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_tasks_complete_in_submission_order() {
    let queue = SerializedQueue::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..20u64 {
        let log = Arc::clone(&log);
        handles.push(queue.submit("append", async move {
            // Later tasks sleep less; order must still hold.
            tokio::time::sleep(Duration::from_millis(20 - i)).await;
            log.lock().unwrap().push(i);
            Ok(())
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*log.lock().unwrap(), (0..20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_tasks_never_overlap() {
    let queue = SerializedQueue::new();
    let active = Arc::new(Mutex::new(0usize));
    let max_seen = Arc::new(Mutex::new(0usize));

    for _ in 0..10 {
        let active = Arc::clone(&active);
        let max_seen = Arc::clone(&max_seen);
        queue.submit("overlap", async move {
            {
                let mut n = active.lock().unwrap();
                *n += 1;
                let mut m = max_seen.lock().unwrap();
                *m = (*m).max(*n);
            }
            tokio::task::yield_now().await;
            *active.lock().unwrap() -= 1;
            Ok(())
        });
    }
    queue.wait_idle().await;

    assert_eq!(*max_seen.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_drain_discards_pending_but_not_running() {
    let queue = SerializedQueue::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (release, gate) = oneshot::channel::<()>();
    let (started_tx, started) = oneshot::channel::<()>();

    let first = {
        let log = Arc::clone(&log);
        queue.submit("gated", async move {
            let _ = started_tx.send(());
            let _ = gate.await;
            log.lock().unwrap().push("first");
            Ok(())
        })
    };
    started.await.unwrap();

    let mut drained = Vec::new();
    for name in ["second", "third"] {
        let log = Arc::clone(&log);
        drained.push(queue.submit("pending", async move {
            log.lock().unwrap().push(name);
            Ok(())
        }));
    }

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.drain_and_reset(), 2);
    assert!(queue.is_empty());

    let later = {
        let log = Arc::clone(&log);
        queue.submit("later", async move {
            log.lock().unwrap().push("later");
            Ok(())
        })
    };

    release.send(()).unwrap();
    assert_eq!(first.await, Ok(()));
    assert_eq!(later.await, Ok(()));
    for handle in drained {
        assert_eq!(handle.await, Err(EngineError::TaskDiscarded));
    }

    assert_eq!(*log.lock().unwrap(), vec!["first", "later"]);
}

#[tokio::test]
async fn test_failure_does_not_stop_queue() {
    let queue = SerializedQueue::new();
    let failed = queue.submit("fails", async { Err(EngineError::store("disk full")) });
    let after = queue.submit("after", async { Ok(()) });

    assert_eq!(failed.await, Err(EngineError::store("disk full")));
    assert_eq!(after.await, Ok(()));
}

#[tokio::test]
async fn test_panic_is_isolated() {
    let queue = SerializedQueue::new();
    let panicked = queue.submit("panics", async {
        if true {
            panic!("task blew up");
        }
        Ok(())
    });
    let after = queue.submit("after", async { Ok(()) });

    assert_eq!(
        panicked.await,
        Err(EngineError::TaskPanicked { label: "panics" })
    );
    assert_eq!(after.await, Ok(()));
}

#[tokio::test]
async fn test_dropped_handle_still_runs() {
    let queue = SerializedQueue::new();
    let ran = Arc::new(Mutex::new(false));
    {
        let ran = Arc::clone(&ran);
        drop(queue.submit("detached", async move {
            *ran.lock().unwrap() = true;
            Ok(())
        }));
    }
    queue.wait_idle().await;
    assert!(*ran.lock().unwrap());
    assert!(queue.is_idle());
}
