//! Builders for in-memory chunked assets used across the unit tests.

use bytemuck::Pod;

use crate::asset_pipeline::chunk::Tag;

pub fn write_chunk<T: Pod>(out: &mut Vec<u8>, tag: &Tag, records: &[T]) {
    let payload: &[u8] = bytemuck::cast_slice(records);
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// Accumulates names into a flat table and hands back their byte ranges.
#[derive(Default)]
pub struct NameTable {
    pub bytes: Vec<u8>,
}

impl NameTable {
    pub fn add(&mut self, name: &str) -> (u32, u32) {
        let begin = self.bytes.len() as u32;
        self.bytes.extend_from_slice(name.as_bytes());
        (begin, self.bytes.len() as u32)
    }
}
