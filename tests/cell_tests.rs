use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taskmaster::{ReactiveCell, SubscriberError};

#[test]
fn test_get_and_set() {
    let cell = ReactiveCell::new(1);
    assert_eq!(cell.get(), 1);
    assert_eq!(cell.set(2), Ok(1));
    assert_eq!(cell.get(), 2);
}

#[test]
fn test_update_returns_previous_value() {
    let cell = ReactiveCell::new(10u32);
    assert_eq!(cell.update(|v| v + 5), Ok(10));
    assert_eq!(cell.get(), 15);
}

#[test]
fn test_subscribers_receive_old_and_new_in_order() {
    let cell = ReactiveCell::new(String::from("a"));
    let seen = Arc::new(Mutex::new(Vec::new()));

    for id in 0..2 {
        let seen = Arc::clone(&seen);
        cell.subscribe(move |old: &String, new: &String| {
            seen.lock().unwrap().push(format!("{id}:{old}->{new}"));
            Ok(())
        });
    }

    cell.set("b".into()).unwrap();
    cell.update(|v| format!("{v}c")).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["0:a->b", "1:a->b", "0:b->bc", "1:b->bc"]
    );
}

#[test]
fn test_subscriber_failure_keeps_the_new_value() {
    let cell = ReactiveCell::new(0);
    cell.subscribe(|_, new| {
        if *new < 0 {
            Err(SubscriberError::new("negative"))
        } else {
            Ok(())
        }
    });

    assert_eq!(cell.set(-1), Err(SubscriberError::new("negative")));
    assert_eq!(cell.get(), -1);
    assert_eq!(cell.set(3), Ok(-1));
}

#[test]
fn test_subscriber_may_read_the_cell() {
    let cell = Arc::new(ReactiveCell::new(0));
    let observed = Arc::new(AtomicUsize::new(0));

    let inner = Arc::clone(&cell);
    let sink = Arc::clone(&observed);
    cell.subscribe(move |_, _| {
        sink.store(inner.get(), Ordering::SeqCst);
        Ok(())
    });

    cell.set(7).unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 7);
}

#[test]
fn test_concurrent_updates_are_atomic() {
    let cell = Arc::new(ReactiveCell::new(0usize));
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    cell.update(|v| v + 1).unwrap();
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }
    assert_eq!(cell.get(), 8000);
}

#[test]
fn test_concurrent_writers_notify_in_swap_order() {
    let cell = Arc::new(ReactiveCell::new(0usize));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    cell.subscribe(move |old: &usize, new: &usize| {
        sink.lock().unwrap().push((*old, *new));
        Ok(())
    });

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    cell.update(|v| v + 1).unwrap();
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2000);
    for (index, (old, new)) in seen.iter().enumerate() {
        assert_eq!((*old, *new), (index, index + 1), "notification {index} out of order");
    }
}

#[test]
fn test_subscriber_may_write_the_cell() {
    let cell = Arc::new(ReactiveCell::new(0));
    let inner = Arc::clone(&cell);
    // Clamp negative values back to zero
    cell.subscribe(move |_, new: &i32| {
        if *new < 0 {
            inner.set(0)?;
        }
        Ok(())
    });

    cell.set(-5).unwrap();
    assert_eq!(cell.get(), 0);
}
