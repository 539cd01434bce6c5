use thiserror::Error;

use crate::scene_graph::scene::SceneError;

/// Failures while decoding a chunked asset. All of them are fatal for the
/// mode being constructed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error while reading asset: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected chunk '{expected}', found '{found}'")]
    TagMismatch { expected: String, found: String },

    #[error("chunk '{tag}' ends before its declared length")]
    Truncated { tag: String },

    #[error("chunk '{tag}' is {size} bytes, not a multiple of the {record_size}-byte record")]
    MisalignedChunk {
        tag: String,
        size: usize,
        record_size: usize,
    },

    #[error("name range {begin}..{end} is outside the {len}-byte name table")]
    NameOutOfRange { begin: u32, end: u32, len: usize },

    #[error("name at {begin}..{end} is not valid UTF-8")]
    InvalidUtf8 { begin: u32, end: u32 },

    #[error("mesh record {record} refers to transform {hierarchy_ref}, but only {count} exist")]
    HierarchyRefOutOfRange {
        record: usize,
        hierarchy_ref: i32,
        count: usize,
    },

    #[error("transform {child} refers to parent {parent}, but only {count} exist")]
    ParentRefOutOfRange { child: i32, parent: i32, count: usize },

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("no mesh named '{0}' in the mesh buffer")]
    UnknownMesh(String),

    #[error("mesh '{name}' covers vertices {begin}..{end}, but the buffer holds {len}")]
    MeshOutOfBounds {
        name: String,
        begin: u32,
        end: u32,
        len: usize,
    },
}
