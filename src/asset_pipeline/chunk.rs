use std::io::{ErrorKind, Read};

use bytemuck::Pod;

use crate::asset_pipeline::load_error::LoadError;

pub type Tag = [u8; 4];

const HEADER_SIZE: usize = 8;

pub fn tag_name(tag: &Tag) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// Reads one `tag + u32 byte length + payload` section into a vector of
/// fixed-size records.
///
/// Records are reinterpreted in native byte order. Asset files are written
/// little-endian, which matches every target we ship on.
pub fn read_chunk<T: Pod, R: Read>(reader: &mut R, tag: &Tag) -> Result<Vec<T>, LoadError> {
    let mut header = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|e| map_read_error(e, tag))?;

    let found = [header[0], header[1], header[2], header[3]];
    if &found != tag {
        return Err(LoadError::TagMismatch {
            expected: tag_name(tag),
            found: tag_name(&found),
        });
    }

    let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let record_size = std::mem::size_of::<T>();

    if record_size == 0 || size % record_size != 0 {
        return Err(LoadError::MisalignedChunk {
            tag: tag_name(tag),
            size,
            record_size,
        });
    }

    // Read through `take` so a corrupt length can't make us allocate up front.
    let mut payload = Vec::new();
    reader.take(size as u64).read_to_end(&mut payload)?;

    if payload.len() != size {
        return Err(LoadError::Truncated { tag: tag_name(tag) });
    }

    Ok(bytemuck::pod_collect_to_vec(&payload))
}

fn map_read_error(error: std::io::Error, tag: &Tag) -> LoadError {
    match error.kind() {
        ErrorKind::UnexpectedEof => LoadError::Truncated { tag: tag_name(tag) },
        _ => LoadError::Io(error),
    }
}
