//! Integration tests for reserving document additions against a capped writer.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::FakeSegmentWriter;
use lexcap_core::{CapacityReservingWriter, LexcapError, Reservation, ReservationOptions};

#[test]
fn merge_deletes_recovers_room_for_batch() {
    let mut backend = FakeSegmentWriter::new(100, 90);
    backend.after_merge_deletes = Some(50);
    let writer = CapacityReservingWriter::new(backend);

    let reservation = writer.reserve(20).expect("merge deletes frees room");
    assert_eq!(reservation.count(), 20);
    assert_eq!(writer.reserved(), 20);
    reservation.commit();

    let backend = writer.into_inner().unwrap();
    assert_eq!(backend.merge_deletes_calls, 1);
    assert!(backend.force_merge_calls.is_empty());
    assert_eq!(backend.max_doc, 50);
}

#[test]
fn full_index_of_live_documents_cannot_grow() {
    let writer = CapacityReservingWriter::new(FakeSegmentWriter::new(100, 100));

    let err = writer.reserve(1).expect_err("no room left");
    match err {
        LexcapError::CapacityExceeded {
            requested,
            ceiling,
            observed_max_doc,
        } => {
            assert_eq!(requested, 1);
            assert_eq!(ceiling, 100);
            assert_eq!(observed_max_doc, 100);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(writer.reserved(), 0);

    let backend = writer.into_inner().unwrap();
    assert_eq!(backend.merge_deletes_calls, 1);
    assert_eq!(backend.force_merge_calls, vec![1]);
}

#[test]
fn full_merge_is_last_resort() {
    let mut backend = FakeSegmentWriter::new(100, 95);
    backend.after_merge_deletes = Some(92);
    backend.live_docs = 60;
    let writer = CapacityReservingWriter::new(backend);

    writer.reserve(30).expect("full merge frees room").commit();

    let stats = writer.stats().unwrap();
    assert_eq!(stats.reserved, 30);
    assert_eq!(stats.max_doc, 60);
    assert_eq!(stats.headroom, 10);
    assert_eq!(stats.merge_deletes_runs, 1);
    assert_eq!(stats.full_merge_runs, 1);
    assert_eq!(stats.capacity_failures, 0);
}

#[test]
fn zero_reservation_is_a_noop() {
    let writer = CapacityReservingWriter::new(FakeSegmentWriter::new(10, 10));
    let reservation = writer.reserve(0).unwrap();
    assert!(reservation.is_empty());
    drop(reservation);

    assert_eq!(writer.reserved(), 0);
    let backend = writer.into_inner().unwrap();
    assert_eq!(backend.merge_deletes_calls, 0);
    assert!(backend.force_merge_calls.is_empty());
}

#[test]
fn reserved_documents_count_against_ceiling() {
    let writer = CapacityReservingWriter::new(FakeSegmentWriter::new(100, 40));
    let held = writer.reserve(60).unwrap();

    assert!(matches!(
        writer.reserve(1),
        Err(LexcapError::CapacityExceeded {
            observed_max_doc: 40,
            ..
        })
    ));

    held.release();
    writer.reserve(60).unwrap().commit();
    assert_eq!(writer.reserved(), 60);
}

#[test]
fn paired_reserve_and_release_return_to_zero() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let writer = CapacityReservingWriter::new(FakeSegmentWriter::new(1_000_000, 1_000));
    let mut held: Vec<Reservation> = Vec::new();
    let mut expected = 0u64;

    for _ in 0..500 {
        if held.is_empty() || rng.bool() {
            let additions = rng.u64(0..200);
            let before = writer.reserved();
            let reservation = writer.reserve(additions).unwrap();
            assert_eq!(writer.reserved(), before + additions);
            expected += additions;
            held.push(reservation);
        } else {
            let reservation = held.swap_remove(rng.usize(..held.len()));
            expected -= reservation.count();
            reservation.release();
        }
        assert_eq!(writer.reserved(), expected);
    }

    held.clear();
    assert_eq!(writer.reserved(), 0);
}

#[test]
fn failed_reserve_leaves_counter_unchanged() {
    let mut rng = fastrand::Rng::with_seed(42);
    let writer = CapacityReservingWriter::new(FakeSegmentWriter::new(500, 100));
    let mut held = Vec::new();

    for _ in 0..200 {
        let additions = rng.u64(1..80);
        let before = writer.reserved();
        match writer.reserve(additions) {
            Ok(reservation) => {
                assert_eq!(writer.reserved(), before + additions);
                assert!(writer.reserved() + 100 <= 500);
                held.push(reservation);
            }
            Err(LexcapError::CapacityExceeded { requested, .. }) => {
                assert_eq!(requested, additions);
                assert_eq!(writer.reserved(), before);
                assert!(before + 100 + additions > 500);
                if !held.is_empty() {
                    held.swap_remove(rng.usize(..held.len())).release();
                }
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}

#[test]
fn concurrent_reservers_never_oversubscribe() {
    const THREADS: usize = 8;
    const ATTEMPTS: usize = 200;
    const CEILING: u64 = 1_000;

    let writer = Arc::new(CapacityReservingWriter::new(FakeSegmentWriter::new(
        CEILING, 0,
    )));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let writer = Arc::clone(&writer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut held = Vec::new();
                for _ in 0..ATTEMPTS {
                    if let Ok(reservation) = writer.reserve(1) {
                        held.push(reservation);
                    }
                }
                held
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().expect("reserver thread panicked"));
    }

    assert_eq!(all.len() as u64, CEILING);
    assert_eq!(writer.reserved(), CEILING);

    // releases skip the writer lock and can come from any thread
    let releasers: Vec<_> = all
        .into_iter()
        .map(|reservation| thread::spawn(move || reservation.release()))
        .collect();
    for releaser in releasers {
        releaser.join().expect("release thread panicked");
    }
    assert_eq!(writer.reserved(), 0);
}

#[test]
fn doc_limit_option_caps_backend_limit() {
    let options =
        ReservationOptions::from_json(r#"{"doc_limit": 20, "full_merge": false}"#).unwrap();
    let writer =
        CapacityReservingWriter::with_options(FakeSegmentWriter::new(1_000, 10), options).unwrap();
    assert_eq!(writer.ceiling(), 20);

    writer.reserve(10).unwrap().commit();
    assert!(writer.reserve(1).is_err());

    let backend = writer.into_inner().unwrap();
    assert_eq!(backend.merge_deletes_calls, 1);
    assert!(backend.force_merge_calls.is_empty());
}

#[test]
fn apply_reserved_hands_count_to_max_doc() {
    let writer = CapacityReservingWriter::new(FakeSegmentWriter::new(10, 0));
    let reservation = writer.reserve(8).unwrap();

    writer
        .apply_reserved(reservation, |backend| {
            backend.max_doc += 8;
            backend.live_docs += 8;
            Ok(())
        })
        .unwrap();

    assert_eq!(writer.reserved(), 0);
    assert!(writer.reserve(3).is_err());
    writer.reserve(2).unwrap().commit();
}
