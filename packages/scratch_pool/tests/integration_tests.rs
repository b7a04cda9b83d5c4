//! Replays complete allocation traces against `ScratchPool` through its public API.

use std::collections::HashSet;

use scratch_pool::{DropPolicy, Error, Scope, ScratchPool};

#[test]
fn end_to_end_capacity_four() {
    let mut pool = ScratchPool::new(4);

    let p1 = pool.alloc(1).as_ptr();
    let p2 = pool.alloc(2).as_ptr();
    let p3 = pool.alloc(3).as_ptr();
    let b4 = pool.alloc(4);
    assert_eq!(b4.len(), 4);
    let p4 = b4.as_ptr();

    let distinct: HashSet<_> = [p1, p2, p3, p4].into_iter().collect();
    assert_eq!(distinct.len(), 4);

    pool.free();
    pool.free();
    pool.free();

    let again = pool.alloc(2);
    assert_eq!(again.len(), 2);
    assert_eq!(again.as_ptr(), p2);

    // Free slots now hold 4 and 3 bytes; neither fits, so the 4-byte one is regrown.
    let grown = pool.alloc(5);
    assert_eq!(grown.len(), 5);
    let p5 = grown.as_ptr();
    assert!(![p1, p2, p3, p4].contains(&p5));

    assert_eq!(pool.stats(), 1 + 2 + 3 + 5);

    assert_eq!(pool.alloc(3).as_ptr(), p3);
    assert_eq!(pool.try_alloc(1), Err(Error::CapacityExhausted { capacity: 4 }));
}

#[test]
fn best_fit_trace() {
    let mut pool = ScratchPool::new(4);

    let p10 = pool.alloc(10).as_ptr();
    let p20 = pool.alloc(20).as_ptr();
    let p30 = pool.alloc(30).as_ptr();
    let p40 = pool.alloc(40).as_ptr();

    let distinct: HashSet<_> = [p10, p20, p30, p40].into_iter().collect();
    assert_eq!(distinct.len(), 4);

    pool.free();
    pool.free();
    pool.free();
    // Free: 40, 30, 20. Checked out: 10.

    let x = pool.alloc(20);
    assert_eq!(x.len(), 20);
    assert_eq!(x.as_ptr(), p20);
    pool.free();

    let x = pool.alloc(30);
    assert_eq!(x.len(), 30);
    assert_eq!(x.as_ptr(), p30);
    pool.free();

    let x = pool.alloc(10);
    assert_eq!(x.len(), 10);
    assert_eq!(x.as_ptr(), p20);
    pool.free();

    // Nothing free fits 50, so the 40-byte slot is replaced.
    let x = pool.alloc(50);
    assert_eq!(x.len(), 50);
    let p50 = x.as_ptr();
    assert!(![p10, p20, p30, p40].contains(&p50));
    pool.free();

    let x = pool.alloc(15);
    assert_eq!(x.len(), 15);
    assert_eq!(x.as_ptr(), p20);
    pool.free();

    let x = pool.alloc(25);
    assert_eq!(x.len(), 25);
    assert_eq!(x.as_ptr(), p30);

    // Still holding the 30-byte slot; a zero-length request takes the smallest free one.
    let x = pool.alloc(0);
    assert!(x.is_empty());
    assert_eq!(x.as_ptr(), p20);
    pool.free();

    let x = pool.alloc(1);
    assert_eq!(x.len(), 1);
    assert_eq!(x.as_ptr(), p20);

    assert_eq!(pool.outstanding(), 3);
    assert_eq!(pool.stats(), 10 + 20 + 30 + 50);
}

#[test]
fn excess_free_fails_on_first_extra_call() {
    let mut pool = ScratchPool::new(3);

    pool.alloc(1);
    pool.alloc(1);

    assert_eq!(pool.try_free(), Ok(()));
    assert_eq!(pool.try_free(), Ok(()));
    assert_eq!(pool.try_free(), Err(Error::UnbalancedFree { capacity: 3 }));
}

#[test]
fn stats_independent_of_checkout_state() {
    let mut pool = ScratchPool::new(3);

    pool.alloc(100);
    pool.alloc(200);
    pool.alloc(300);
    let all_out = pool.stats();

    pool.free();
    let two_out = pool.stats();

    pool.free();
    pool.free();
    let none_out = pool.stats();

    assert_eq!(all_out, 600);
    assert_eq!(two_out, 600);
    assert_eq!(none_out, 600);
}

struct Worker {
    buffers: ScratchPool,
    checksums: Vec<u8>,
}

impl Worker {
    const MAX_DEPTH: u8 = 3;

    fn new() -> Self {
        Self {
            buffers: ScratchPool::builder()
                .capacity(usize::from(Self::MAX_DEPTH))
                .drop_policy(DropPolicy::MustNotDropOutstanding)
                .build(),
            checksums: Vec::new(),
        }
    }

    fn process(&mut self, level: u8, len: usize) {
        // Release even if a nested level panics.
        let mut this = scopeguard::guard(self, |this| this.buffers.free());

        this.buffers.alloc(len).fill(level);

        if level + 1 < Self::MAX_DEPTH {
            this.process(level + 1, len / 2);
        }

        // Our buffer is on top again now that the nested level has released its own.
        let buffer = this.buffers.last_mut().expect("own buffer is still checked out");
        assert_eq!(buffer.len(), len);
        let sum = buffer.iter().fold(0_u8, |acc, &b| acc.wrapping_add(b));
        this.checksums.push(sum);
    }
}

#[test]
fn nested_workload_converges_to_fixed_footprint() {
    let mut worker = Worker::new();

    worker.process(0, 1024);
    let footprint = worker.buffers.stats();
    assert_eq!(footprint, 1024 + 512 + 256);

    for _ in 0..100 {
        worker.process(0, 1024);
    }

    assert_eq!(worker.buffers.stats(), footprint);
    assert_eq!(worker.buffers.outstanding(), 0);
    assert_eq!(worker.checksums.len(), 101 * 3);
}

#[test]
fn nested_workload_releases_on_panic() {
    let mut pool = ScratchPool::new(2);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut guarded = scopeguard::guard(&mut pool, |pool| pool.free());
        guarded.alloc(8);

        if guarded.outstanding() == 1 {
            panic!("boom");
        }
    }));

    assert!(result.is_err());
    assert_eq!(pool.outstanding(), 0);
}

fn depth_of(scope: &mut Scope<'_>, len: usize) -> usize {
    match scope.try_alloc(len) {
        Ok((buffer, mut nested)) => {
            buffer.fill(0);
            1 + depth_of(&mut nested, len)
        }
        Err(Error::CapacityExhausted { .. }) => 0,
        Err(error) => panic!("unexpected error: {error}"),
    }
}

#[test]
fn scope_recursion_is_bounded_by_capacity() {
    for capacity in 0..6 {
        let mut pool = ScratchPool::new(capacity);

        assert_eq!(depth_of(&mut pool.scope(), 16), capacity);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.stats(), capacity * 16);
    }
}
