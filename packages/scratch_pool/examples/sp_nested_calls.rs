//! Nested-call usage of `ScratchPool`.
//!
//! A `Decoder` reads framed records: `decode_record()` needs a buffer for the whole record and
//! calls `decode_field()` for each field, which needs a buffer of its own. The nesting depth is
//! two, so a pool of two slots serves every call no matter how many records are decoded.

use scratch_pool::{Scope, ScratchPool};

/// `decode_record()` calls `decode_field()` but not the other way around.
const MAX_DEPTH: usize = 2;

struct Decoder {
    buffers: ScratchPool,
    field_sums: Vec<u32>,
}

impl Decoder {
    fn new() -> Self {
        Self {
            buffers: ScratchPool::new(MAX_DEPTH),
            field_sums: Vec::new(),
        }
    }

    fn decode_record(&mut self, record: &[u8]) {
        // The release runs when `this` goes out of scope, even on panic.
        let mut this = scopeguard::guard(self, |this| this.buffers.free());

        this.buffers.alloc(record.len()).copy_from_slice(record);

        for field in record.chunks(4) {
            this.decode_field(field);
        }
    }

    fn decode_field(&mut self, field: &[u8]) {
        let mut this = scopeguard::guard(self, |this| this.buffers.free());

        let buffer = this.buffers.calloc(field.len());
        buffer.copy_from_slice(field);

        let sum = buffer.iter().map(|&b| u32::from(b)).sum();
        this.field_sums.push(sum);
    }
}

/// The same decoding through a [`Scope`], where the borrow checker enforces the nesting.
fn decode_record_scoped(record: &[u8], mut scope: Scope<'_>, field_sums: &mut Vec<u32>) {
    let (copy, mut nested) = scope.alloc(record.len());
    copy.copy_from_slice(record);

    for field in copy.chunks(4) {
        let (buffer, _) = nested.calloc(field.len());
        buffer.copy_from_slice(field);

        field_sums.push(buffer.iter().map(|&b| u32::from(b)).sum());
    }
}

fn main() {
    let records: Vec<Vec<u8>> = (1..=100_u8)
        .map(|seed| (0..seed).map(|i| i.wrapping_mul(seed)).collect())
        .collect();

    let mut decoder = Decoder::new();

    for record in &records {
        decoder.decode_record(record);
    }

    println!(
        "Decoded {} records into {} fields",
        records.len(),
        decoder.field_sums.len()
    );
    println!(
        "Scratch pool holds {} bytes in {} buffers",
        decoder.buffers.stats(),
        decoder.buffers.capacity()
    );

    let mut scoped_sums = Vec::new();
    let mut pool = ScratchPool::new(MAX_DEPTH);

    for record in &records {
        decode_record_scoped(record, pool.scope(), &mut scoped_sums);
    }

    assert_eq!(scoped_sums, decoder.field_sums);

    println!(
        "Scoped decoding produced the same {} fields using {} bytes",
        scoped_sums.len(),
        pool.stats()
    );
}
