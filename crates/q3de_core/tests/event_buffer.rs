mod common;

use common::event;
use q3de_common::EventId;
use q3de_core::{DecodeError, EventBuffer};

fn ids(buffer: &EventBuffer) -> Vec<u32> {
    buffer.iter().map(|e| e.id.0).collect()
}

#[test]
fn admits_in_order_until_full() {
    let mut buffer = EventBuffer::new(2);
    buffer.admit(event(0, 0, 0, 1, 1)).unwrap();
    buffer.admit(event(1, 0, 0, 2, 1)).unwrap();
    assert!(buffer.is_full());
    assert_eq!(ids(&buffer), vec![0, 1]);

    let err = buffer.admit(event(2, 0, 0, 2, 1)).unwrap_err();
    assert_eq!(
        err,
        DecodeError::BufferOverflow {
            capacity: 2,
            event: EventId(2),
            time: 2,
        }
    );
    assert_eq!(buffer.len(), 2);
}

#[test]
fn eviction_keeps_order_and_moves_floor() {
    let mut buffer = EventBuffer::new(4);
    for (id, z) in [(0, 1), (1, 2), (2, 2), (3, 5)] {
        buffer.admit(event(id, 0, 0, z, 1)).unwrap();
    }
    assert_eq!(buffer.floor_time(), 1);

    let (a, b) = buffer.evict_pair(2, 0);
    assert_eq!((a.id.0, b.id.0), (2, 0));
    assert_eq!(ids(&buffer), vec![1, 3]);
    assert_eq!(buffer.floor_time(), 2);

    buffer.evict(0);
    assert_eq!(buffer.floor_time(), 5);
    buffer.evict(0);
    assert!(buffer.is_empty());
    assert_eq!(buffer.floor_time(), 5);
    assert_eq!(buffer.span(8), 3);
}

#[test]
fn horizon_only_moves_forward() {
    let mut buffer = EventBuffer::new(1);
    assert_eq!(buffer.horizon_time(), 0);
    buffer.advance_horizon();
    buffer.advance_horizon();
    assert_eq!(buffer.horizon_time(), 2);
    assert_eq!(buffer.capacity(), 1);
}
