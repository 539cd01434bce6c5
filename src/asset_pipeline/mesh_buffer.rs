use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::asset_pipeline::{chunk::read_chunk, load_error::LoadError, name_ref::NameRef};

/// Handle to a vertex/index buffer pair once the renderer has uploaded it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: [u8; 4],
}

const _: () = assert!(std::mem::size_of::<Vertex>() == 28);

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct IndexEntry {
    name: NameRef,
    vertex_begin: u32,
    vertex_end: u32,
}

const _: () = assert!(std::mem::size_of::<IndexEntry>() == 16);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshRange {
    pub start: u32,
    pub count: u32,
}

/// Named sub-meshes sharing one vertex array.
pub trait MeshCatalog {
    fn lookup(&self, name: &str) -> Option<MeshRange>;
    fn vertex_array(&self) -> VertexArrayId;
}

/// Position/normal/color triangle soup with a table of named sub-ranges.
pub struct MeshBuffer {
    pub vertex_array: VertexArrayId,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    meshes: HashMap<String, MeshRange>,
}

impl MeshBuffer {
    pub fn load(path: &Path, vertex_array: VertexArrayId) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open mesh buffer {}", path.display()))?;
        let buffer = Self::from_reader(&mut BufReader::new(file), vertex_array)
            .with_context(|| format!("Failed to load mesh buffer {}", path.display()))?;

        log::info!(
            "Loaded {} meshes ({} vertices) from {}",
            buffer.meshes.len(),
            buffer.vertices.len(),
            path.display()
        );

        Ok(buffer)
    }

    pub fn from_reader<R: Read>(
        reader: &mut R,
        vertex_array: VertexArrayId,
    ) -> Result<Self, LoadError> {
        let vertices: Vec<Vertex> = read_chunk(reader, b"pnc.")?;
        let names: Vec<u8> = read_chunk(reader, b"str0")?;
        let index: Vec<IndexEntry> = read_chunk(reader, b"idx0")?;

        let mut meshes = HashMap::with_capacity(index.len());

        for entry in &index {
            let name = entry.name.resolve(&names)?;

            if entry.vertex_begin > entry.vertex_end
                || entry.vertex_end as usize > vertices.len()
            {
                return Err(LoadError::MeshOutOfBounds {
                    name: name.to_string(),
                    begin: entry.vertex_begin,
                    end: entry.vertex_end,
                    len: vertices.len(),
                });
            }

            let range = MeshRange {
                start: entry.vertex_begin,
                count: entry.vertex_end - entry.vertex_begin,
            };

            if meshes.insert(name.to_string(), range).is_some() {
                log::warn!("Mesh '{}' appears twice in the index, keeping the last", name);
            }
        }

        // The vertices are unindexed triangles; a sequential index buffer lets the
        // renderer draw every sub-mesh with one indexed call.
        let indices = (0..vertices.len() as u32).collect();

        Ok(Self {
            vertex_array,
            vertices,
            indices,
            meshes,
        })
    }
}

impl MeshCatalog for MeshBuffer {
    fn lookup(&self, name: &str) -> Option<MeshRange> {
        self.meshes.get(name).copied()
    }

    fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }
}
