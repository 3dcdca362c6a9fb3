//! Integration tests across the cell modules

use crate::tvm::*;
use num_bigint::BigUint;
use num_traits::One;
use std::sync::Arc;

const BOUNDARY_WIDTHS: [usize; 9] = [1, 4, 16, 32, 64, 96, 256, 512, 1023];

/// Largest value representable in `bits`
fn max_value(bits: usize) -> BigUint {
    (BigUint::one() << bits) - BigUint::one()
}

#[test]
fn test_big_uint_roundtrip_at_boundary_widths() {
    for bits in BOUNDARY_WIDTHS {
        for value in [BigUint::ZERO, BigUint::one(), max_value(bits)] {
            let mut builder = Builder::new();
            builder.store_big_uint(&value, bits).unwrap();
            let mut slice = builder.to_slice().unwrap();

            assert_eq!(slice.load_big_uint(bits).unwrap(), value, "width {bits}");
            assert_eq!(slice.remaining_bits(), 0);
        }
    }
}

#[test]
fn test_small_uint_roundtrip_after_unaligned_prefix() {
    for bits in [1usize, 4, 16, 32, 64] {
        let value = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };

        let mut builder = Builder::new();
        builder.store_uint(0b101, 3).unwrap();
        builder.store_uint(value, bits).unwrap();

        let mut slice = builder.to_slice().unwrap();
        assert_eq!(slice.load_uint(3).unwrap(), 0b101);
        assert_eq!(slice.load_uint(bits).unwrap(), value, "width {bits}");
    }
}

#[test]
fn test_full_cell_rejects_extra_bit() {
    let mut builder = Builder::new();
    builder.store_big_uint(&max_value(1023), 1023).unwrap();
    assert!(matches!(
        builder.store_bit(false).unwrap_err(),
        CellError::CapacityExceeded { .. }
    ));
}

#[test]
fn test_slice_at_end_underflows() {
    let mut builder = Builder::new();
    builder.store_uint(0xABCD, 16).unwrap();
    let mut slice = builder.to_slice().unwrap();
    slice.skip_bits(16).unwrap();

    assert!(matches!(
        slice.load_uint(1),
        Err(CellError::CellUnderflow { requested: 1, remaining: 0 })
    ));
    assert_eq!(slice.load_reference().unwrap_err(), CellError::RefUnderflow);
}

#[test]
fn test_speculative_parse_leaves_original_intact() {
    let mut builder = Builder::new();
    builder.store_uint(0x7362d09c, 32).unwrap();
    builder.store_uint(42, 64).unwrap();
    let body = builder.to_slice().unwrap();

    // First interpretation reads past the end and fails
    let mut attempt = body.clone();
    attempt.load_uint(32).unwrap();
    assert!(attempt.load_big_uint(128).is_err());

    // The original cursor is still at the start
    let mut fallback = body.clone();
    assert_eq!(fallback.load_u32().unwrap(), 0x7362d09c);
    assert_eq!(fallback.load_u64().unwrap(), 42);
    assert_eq!(body.bit_position(), 0);
}

#[test]
fn test_cell_tree_boc_roundtrip_through_store() {
    let mut child = Builder::new();
    child.store_coins(10_000_000).unwrap();
    let child = child.build().unwrap();

    let mut root = Builder::new();
    root.store_address(Some(&Address::new(0, [7u8; 32]))).unwrap();
    for _ in 0..4 {
        root.store_ref(child.clone()).unwrap();
    }
    let root = root.build().unwrap();

    let decoded = deserialize_boc(&serialize_boc(&root, true).unwrap()).unwrap();
    assert_eq!(decoded, root);

    let mut store = CellStore::new();
    let canonical = store.insert(&decoded);
    assert_eq!(store.len(), 2);
    assert!(Arc::ptr_eq(&canonical, &store.insert(&root)));
}

#[test]
fn test_hash_is_pure() {
    let mut a = Builder::new();
    a.store_uint(1, 1).unwrap();
    let mut b = Builder::new();
    b.store_bit(true).unwrap();

    let a = a.build().unwrap();
    let b = b.build().unwrap();
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.hash(), a.hash());
}

fn diamond(levels: usize) -> Arc<Cell> {
    let mut cell = Cell::empty_cell();
    for level in 0..levels {
        let mut builder = Builder::new();
        builder.store_u32(level as u32).unwrap();
        for _ in 0..4 {
            builder.store_ref(cell.clone()).unwrap();
        }
        cell = builder.build().unwrap();
    }
    cell
}

#[test]
fn test_decoded_shared_subtrees_compare_equal() {
    let original = diamond(16);
    let decoded = deserialize_boc(&serialize_boc(&original, true).unwrap()).unwrap();
    assert!(!Arc::ptr_eq(&decoded, &original));
    assert_eq!(decoded, original);
    assert_eq!(decoded.depth(), 16);
}

/// Encodes a chain of `depth` one-ref cells ending in an empty cell
fn chain_boc(depth: usize) -> Vec<u8> {
    let count = depth + 1;
    let mut cells = Vec::new();
    for idx in 0..depth {
        cells.extend_from_slice(&[1, 0]);
        cells.extend_from_slice(&((idx + 1) as u16).to_be_bytes());
    }
    cells.extend_from_slice(&[0, 0]);

    let mut boc = 0xb5ee9c72u32.to_be_bytes().to_vec();
    boc.extend_from_slice(&[0x02, 0x02]);
    boc.extend_from_slice(&(count as u16).to_be_bytes());
    boc.extend_from_slice(&1u16.to_be_bytes());
    boc.extend_from_slice(&0u16.to_be_bytes());
    boc.extend_from_slice(&(cells.len() as u16).to_be_bytes());
    boc.extend_from_slice(&0u16.to_be_bytes());
    boc.extend_from_slice(&cells);
    boc
}

#[test]
fn test_boc_depth_limit() {
    let deepest = deserialize_boc(&chain_boc(MAX_CELL_DEPTH as usize)).unwrap();
    assert_eq!(deepest.depth(), MAX_CELL_DEPTH);

    let reencoded = deserialize_boc(&serialize_boc(&deepest, false).unwrap()).unwrap();
    assert_eq!(reencoded, deepest);

    let err = deserialize_boc(&chain_boc(MAX_CELL_DEPTH as usize + 1)).unwrap_err();
    assert_eq!(
        err.downcast_ref::<CellError>(),
        Some(&CellError::DepthExceeded(MAX_CELL_DEPTH))
    );
}

#[test]
fn test_builder_depth_limit() {
    let mut cell = Cell::empty_cell();
    for _ in 0..MAX_CELL_DEPTH {
        let mut builder = Builder::new();
        builder.store_ref(cell).unwrap();
        cell = builder.build().unwrap();
    }
    assert_eq!(cell.depth(), MAX_CELL_DEPTH);

    let mut builder = Builder::new();
    builder.store_ref(cell).unwrap();
    assert_eq!(
        builder.build().unwrap_err(),
        CellError::DepthExceeded(MAX_CELL_DEPTH)
    );
}
