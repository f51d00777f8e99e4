use super::*;
use std::cell::Cell;

#[test]
fn computes_once_per_key() {
    let table: MemoTable<u32, u32> = MemoTable::new("test");
    let token = CancellationToken::new();
    let runs = Cell::new(0);

    for _ in 0..3 {
        let value = table
            .get_or_compute(
                7,
                &token,
                || {
                    runs.set(runs.get() + 1);
                    Ok(49)
                },
                || 0,
            )
            .unwrap();
        assert_eq!(value, 49);
    }
    assert_eq!(runs.get(), 1);
    assert_eq!(table.state(7), SlotState::Resolved);
    assert_eq!(table.state(8), SlotState::Unstarted);
}

#[test]
fn reentry_yields_sentinel_once() {
    let table: MemoTable<u32, i32> = MemoTable::new("test");
    let token = CancellationToken::new();
    let sentinels = Cell::new(0);

    let value = table
        .get_or_compute(
            1,
            &token,
            || {
                let inner = table.get_or_compute(
                    1,
                    &token,
                    || Ok(100),
                    || {
                        sentinels.set(sentinels.get() + 1);
                        -1
                    },
                )?;
                Ok(inner + 5)
            },
            || {
                sentinels.set(sentinels.get() + 1);
                -1
            },
        )
        .unwrap();

    assert_eq!(value, -1, "the sentinel is the final answer");
    assert_eq!(sentinels.get(), 1);
    assert_eq!(table.state(1), SlotState::Cyclic);

    let again = table
        .get_or_compute(1, &token, || Ok(3), || -2)
        .unwrap();
    assert_eq!(again, -1);
    assert_eq!(sentinels.get(), 1);
}

#[test]
fn collection_reentry_is_empty_and_silent() {
    let table: MemoTable<u32, Vec<u32>> = MemoTable::new("members");
    let token = CancellationToken::new();

    let value = table
        .get_or_default(1, &token, || {
            let inner = table.get_or_default(1, &token, || Ok(vec![99]))?;
            assert!(inner.is_empty());
            Ok(vec![1, 2])
        })
        .unwrap();

    assert_eq!(value, vec![1, 2]);
    assert_eq!(table.state(1), SlotState::Resolved);
}

#[test]
fn errors_roll_back_to_unstarted() {
    let table: MemoTable<u32, u32> = MemoTable::new("test");
    let token = CancellationToken::new();

    let result = table.get_or_compute(1, &token, || Err(ResolveError::Cancelled), || 0);
    assert_eq!(result, Err(ResolveError::Cancelled));
    assert_eq!(table.state(1), SlotState::Unstarted);

    let value = table.get_or_compute(1, &token, || Ok(5), || 0).unwrap();
    assert_eq!(value, 5);
}

#[test]
fn cancellation_during_compute_discards_result() {
    let table: MemoTable<u32, u32> = MemoTable::new("test");
    let token = CancellationToken::new();

    let result = table.get_or_compute(
        1,
        &token,
        || {
            token.cancel();
            Ok(5)
        },
        || 0,
    );
    assert_eq!(result, Err(ResolveError::Cancelled));
    assert_eq!(table.state(1), SlotState::Unstarted);
    assert!(table.peek(1).is_none());
}

#[test]
fn after_polls_trips_deterministically() {
    let token = CancellationToken::after_polls(2);
    assert!(token.check().is_ok());
    assert!(token.check().is_ok());
    assert_eq!(token.check(), Err(ResolveError::Cancelled));
    assert!(token.is_cancelled());
    assert_eq!(token.check(), Err(ResolveError::Cancelled));
}

#[test]
fn invalidate_and_clear() {
    let table: MemoTable<u32, u32> = MemoTable::new("test");
    let token = CancellationToken::new();
    table.get_or_compute(1, &token, || Ok(1), || 0).unwrap();
    table.get_or_compute(2, &token, || Ok(2), || 0).unwrap();
    assert_eq!(table.len(), 2);

    table.invalidate(1);
    assert_eq!(table.state(1), SlotState::Unstarted);
    assert!(!table.is_computing(2));

    table.clear();
    assert!(table.is_empty());
}
