//! Bag of Cells (BoC) serialization and deserialization
//!
//! BoC encodes a cell tree into a byte array. Identical subtrees are stored
//! once; cells are written parents first, so every reference index points to
//! a later cell.

use crate::crc::CRC32C;
use crate::tvm::cell::{Cell, CellHash, MAX_CELL_REFS};
use anyhow::{Context, Result, bail};
use base64::Engine;
use std::collections::HashMap;
use std::sync::Arc;

/// BoC magic number for the generic format
const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Legacy indexed formats
const BOC_INDEXED_MAGIC: u32 = 0x68ff65f3;
const BOC_INDEXED_CRC32C_MAGIC: u32 = 0xacc3a728;

/// Serializes a cell tree into a Bag of Cells
pub fn serialize_boc(root: &Arc<Cell>, has_crc32: bool) -> Result<Vec<u8>> {
    let cells = collect_cells(root);
    let indices: HashMap<CellHash, usize> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| (cell.hash(), idx))
        .collect();

    let size_bytes = bytes_needed(cells.len());

    let mut cells_data = Vec::new();
    for cell in &cells {
        cells_data.extend_from_slice(&cell.descriptors());
        cells_data.extend_from_slice(&cell.serialize_data());
        for reference in cell.references() {
            let ref_idx = indices
                .get(&reference.hash())
                .context("Reference not found in cell map")?;
            write_uint(&mut cells_data, *ref_idx, size_bytes);
        }
    }

    let offset_bytes = bytes_needed(cells_data.len());

    let mut result = Vec::with_capacity(cells_data.len() + 32);
    result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());

    // has_idx:(## 1) has_crc32c:(## 1) has_cache_bits:(## 1) flags:(## 2) size:(## 3)
    let flags = if has_crc32 { 0x40u8 } else { 0 };
    result.push(flags | size_bytes as u8);
    result.push(offset_bytes as u8);

    write_uint(&mut result, cells.len(), size_bytes);
    write_uint(&mut result, 1, size_bytes); // roots
    write_uint(&mut result, 0, size_bytes); // absent
    write_uint(&mut result, cells_data.len(), offset_bytes);
    write_uint(&mut result, 0, size_bytes); // root index

    result.extend_from_slice(&cells_data);

    if has_crc32 {
        let crc = CRC32C.checksum(&result);
        result.extend_from_slice(&crc.to_le_bytes());
    }

    Ok(result)
}

/// Deserializes a Bag of Cells into its root cell
pub fn deserialize_boc(data: &[u8]) -> Result<Arc<Cell>> {
    if data.len() < 4 {
        bail!("BoC data too short");
    }

    let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);

    match magic {
        BOC_GENERIC_MAGIC => deserialize_boc_generic(data),
        BOC_INDEXED_MAGIC | BOC_INDEXED_CRC32C_MAGIC => {
            bail!("Indexed BoC format is not supported");
        }
        _ => bail!("Invalid BoC magic number: 0x{:08x}", magic),
    }
}

fn deserialize_boc_generic(data: &[u8]) -> Result<Arc<Cell>> {
    let mut pos = 4;

    let flags_and_size = *data.get(pos).context("Unexpected end of BoC data")?;
    pos += 1;

    let has_idx = (flags_and_size & 0x80) != 0;
    let has_crc32 = (flags_and_size & 0x40) != 0;
    let size_bytes = (flags_and_size & 0x07) as usize;

    if size_bytes == 0 || size_bytes > 4 {
        bail!("Invalid size_bytes: {}", size_bytes);
    }

    let offset_bytes = *data.get(pos).context("Unexpected end of BoC data")? as usize;
    pos += 1;

    if offset_bytes == 0 || offset_bytes > 8 {
        bail!("Invalid offset_bytes: {}", offset_bytes);
    }

    let cells_count = read_uint(data, &mut pos, size_bytes)?;
    let roots_count = read_uint(data, &mut pos, size_bytes)?;
    if roots_count != 1 {
        bail!("Expected exactly one root, got {}", roots_count);
    }
    let absent_count = read_uint(data, &mut pos, size_bytes)?;
    if absent_count != 0 {
        bail!("Absent cells are not supported");
    }
    let cells_size = read_uint(data, &mut pos, offset_bytes)?;
    let root_idx = read_uint(data, &mut pos, size_bytes)?;

    // Every cell takes at least its two descriptor bytes
    if cells_count.saturating_mul(2) > cells_size {
        bail!("Cells count {} does not fit into {} bytes", cells_count, cells_size);
    }

    if has_idx {
        pos = cells_count
            .checked_mul(offset_bytes)
            .and_then(|idx_len| pos.checked_add(idx_len))
            .context("Invalid index size")?;
    }

    let crc_len = if has_crc32 { 4 } else { 0 };
    let cells_end = pos
        .checked_add(cells_size)
        .filter(|end| end + crc_len <= data.len())
        .context("Invalid cells size")?;

    if has_crc32 {
        let expected_crc = u32::from_le_bytes([
            data[cells_end],
            data[cells_end + 1],
            data[cells_end + 2],
            data[cells_end + 3],
        ]);
        let actual_crc = CRC32C.checksum(&data[..cells_end]);
        if expected_crc != actual_crc {
            bail!(
                "CRC32C mismatch: expected 0x{:08x}, got 0x{:08x}",
                expected_crc,
                actual_crc
            );
        }
    }

    let cells = parse_cells(&data[pos..cells_end], cells_count, size_bytes)?;
    if root_idx >= cells.len() {
        bail!("Invalid root index: {}", root_idx);
    }

    Ok(cells[root_idx].clone())
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

fn parse_cells(data: &[u8], count: usize, ref_size: usize) -> Result<Vec<Arc<Cell>>> {
    let mut raw_cells = Vec::with_capacity(count);
    let mut pos = 0;

    for idx in 0..count {
        if pos + 2 > data.len() {
            bail!("Unexpected end of cells data");
        }
        let d1 = data[pos];
        let d2 = data[pos + 1];
        pos += 2;

        let ref_count = (d1 & 0x07) as usize;
        if ref_count > MAX_CELL_REFS {
            bail!("Cell #{} has {} references", idx, ref_count);
        }
        if d1 & 0x08 != 0 || d1 >> 5 != 0 {
            bail!("Cell #{} is exotic or has a non-zero level", idx);
        }

        // d2 = floor(b/8) + ceil(b/8)
        let data_size = (d2 as usize).div_ceil(2);
        if pos + data_size > data.len() {
            bail!("Cell data exceeds buffer");
        }
        let cell_data = data[pos..pos + data_size].to_vec();
        pos += data_size;

        let bit_len = if d2 % 2 == 0 {
            data_size * 8
        } else {
            // The last byte carries a completion tag: the lowest set bit
            let last_byte = cell_data[data_size - 1];
            if last_byte == 0 {
                bail!("Cell #{} has no completion tag", idx);
            }
            data_size * 8 - last_byte.trailing_zeros() as usize - 1
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let ref_idx = read_uint(data, &mut pos, ref_size)?;
            if ref_idx <= idx || ref_idx >= count {
                bail!("Invalid reference index {} in cell #{}", ref_idx, idx);
            }
            refs.push(ref_idx);
        }

        raw_cells.push(RawCell {
            data: cell_data,
            bit_len,
            refs,
        });
    }

    // References always point forward, so build from the end
    let mut cells: Vec<Option<Arc<Cell>>> = vec![None; count];
    for (idx, raw) in raw_cells.into_iter().enumerate().rev() {
        let references = raw
            .refs
            .iter()
            .map(|&r| cells[r].clone().context("Unresolved reference"))
            .collect::<Result<Vec<_>>>()?;
        let cell = Cell::new(raw.data, raw.bit_len, references)?;
        cells[idx] = Some(Arc::new(cell));
    }

    Ok(cells.into_iter().flatten().collect())
}

/// Collects unique cells in parents-first order
fn collect_cells(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    let mut post_order = Vec::new();
    let mut visited = HashMap::new();
    collect_cells_recursive(root, &mut post_order, &mut visited);
    post_order.reverse();
    post_order
}

fn collect_cells_recursive(
    cell: &Arc<Cell>,
    cells: &mut Vec<Arc<Cell>>,
    visited: &mut HashMap<CellHash, ()>,
) {
    if visited.contains_key(&cell.hash()) {
        return;
    }
    visited.insert(cell.hash(), ());

    // Visit children in reverse so the reversed order keeps them in reference order
    for reference in cell.references().iter().rev() {
        collect_cells_recursive(reference, cells, visited);
    }

    cells.push(cell.clone());
}

fn bytes_needed(value: usize) -> usize {
    if value == 0 {
        return 1;
    }

    let bits = (usize::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8)
}

fn write_uint(buf: &mut Vec<u8>, value: usize, size: usize) {
    let bytes = (value as u64).to_be_bytes();
    buf.extend_from_slice(&bytes[8 - size..]);
}

fn read_uint(data: &[u8], pos: &mut usize, size: usize) -> Result<usize> {
    if *pos + size > data.len() {
        bail!("Not enough data to read uint");
    }

    let mut result = 0usize;
    for i in 0..size {
        result = (result << 8) | (data[*pos + i] as usize);
    }
    *pos += size;

    Ok(result)
}

/// Decodes a hex encoded BoC
pub fn hex_to_boc(hex: &str) -> Result<Arc<Cell>> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(&hex).context("Failed to decode hex")?;
    deserialize_boc(&bytes)
}

/// Encodes a cell tree as a hex BoC
pub fn boc_to_hex(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    let bytes = serialize_boc(cell, has_crc32)?;
    Ok(hex::encode(bytes))
}

/// Encodes a cell tree as a base64 BoC
pub fn boc_to_base64(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    let bytes = serialize_boc(cell, has_crc32)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Decodes a base64 encoded BoC
pub fn base64_to_boc(b64: &str) -> Result<Arc<Cell>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .context("Failed to decode base64")?;
    deserialize_boc(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::cell::CellBuilder;

    #[test]
    fn test_serialize_deserialize_simple() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        let cell = builder.build().unwrap();

        let boc = serialize_boc(&cell, false).unwrap();
        let deserialized = deserialize_boc(&boc).unwrap();

        assert_eq!(cell, deserialized);
    }

    #[test]
    fn test_known_empty_cell_boc() {
        // Widely used encoding of an empty cell
        let cell = Cell::empty_cell();
        assert_eq!(boc_to_hex(&cell, false).unwrap(), "b5ee9c72010101010002000000");
        assert_eq!(hex_to_boc("b5ee9c72010101010002000000").unwrap(), cell);
    }

    #[test]
    fn test_unaligned_bits_survive() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b10110, 5).unwrap();
        let cell = builder.build().unwrap();

        let decoded = base64_to_boc(&boc_to_base64(&cell, true).unwrap()).unwrap();
        assert_eq!(decoded.bit_len(), 5);
        assert_eq!(decoded, cell);
    }

    #[test]
    fn test_shared_subtree_is_stored_once() {
        let mut leaf = CellBuilder::new();
        leaf.store_byte(0x42).unwrap();
        let leaf = leaf.build().unwrap();

        let mut root = CellBuilder::new();
        root.store_reference(leaf.clone()).unwrap();
        root.store_reference(leaf).unwrap();
        let root = root.build().unwrap();

        let boc = serialize_boc(&root, false).unwrap();
        // cells count sits right after magic, flags and offset size
        assert_eq!(boc[6], 2);
        assert_eq!(deserialize_boc(&boc).unwrap(), root);
    }

    #[test]
    fn test_crc_mismatch_rejected() {
        let mut builder = CellBuilder::new();
        builder.store_u64(0xDEADBEEF).unwrap();
        let cell = builder.build().unwrap();

        let mut boc = serialize_boc(&cell, true).unwrap();
        let last = boc.len() - 1;
        boc[last] ^= 0xFF;
        assert!(deserialize_boc(&boc).is_err());
    }
}
