use std::thread;

use cits_core::cell::state_cell;
use cits_core::mobility::{Point, Position};
use cits_core::time::TimeS;

#[test]
fn snapshot_reflects_latest_store() {
    let (writer, reader) = state_cell(Position::new(Point::new(0, 0), TimeS::new(0)));
    writer.store(Position::new(Point::new(3, 4), TimeS::new(7)));
    assert_eq!(reader.snapshot(), Position::new(Point::new(3, 4), TimeS::new(7)));
}

#[test]
fn readers_never_observe_a_torn_triple() {
    // The writer always stores (v, v, v); any snapshot with unequal fields
    // would be a torn read.
    let (writer, reader) = state_cell((0u64, 0u64, 0u64));
    let observers: Vec<_> = (0..4)
        .map(|_| {
            let reader = reader.clone();
            thread::spawn(move || {
                for _ in 0..10_000 {
                    let (a, b, c) = reader.snapshot();
                    assert_eq!(a, b);
                    assert_eq!(b, c);
                }
            })
        })
        .collect();

    for v in 1..=10_000u64 {
        writer.store((v, v, v));
    }
    for observer in observers {
        observer.join().expect("observer panicked");
    }
}

#[test]
fn load_returns_what_the_owner_stored() {
    let (writer, _reader) = state_cell(5u32);
    writer.store(writer.load() + 1);
    assert_eq!(writer.load(), 6);
}
