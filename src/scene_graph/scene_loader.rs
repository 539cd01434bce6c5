//! Builds a [`Scene`] from a `.scene` asset.
//!
//! The file is a sequence of chunks:
//! - `str0`: every name, concatenated without separators
//! - `xfh0`: the transform hierarchy, parents referenced by index (`-1` for roots)
//! - `msh0`: which transform carries which mesh
//! - `cam0`, `lmp0`: cameras and lamps, which this loader leaves unread
//!
//! Transforms are only created when a mesh refers to them, in mesh order.
//! A parent that no earlier mesh record created is left out and the child
//! becomes a root.
//! The single camera is placed from configuration, not from the file.

use std::collections::HashMap;
use std::io::Read;

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

use crate::asset_pipeline::chunk::read_chunk;
use crate::config::CameraConfig;
use crate::asset_pipeline::load_error::LoadError;
use crate::asset_pipeline::mesh_buffer::MeshCatalog;
use crate::asset_pipeline::name_ref::NameRef;
use crate::rendering::program::ProgramHandle;
use crate::scene_graph::camera::CameraId;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::{Transform, TransformId};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TransformInfo {
    pub parent_ref: i32,
    pub name: NameRef,
    pub position: Vec3,
    // x, y, z, w. Kept as an array since glam's Quat is 16-byte aligned.
    pub rotation: [f32; 4],
    pub scale: Vec3,
}

const _: () = assert!(std::mem::size_of::<TransformInfo>() == 52);

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshInfo {
    pub hierarchy_ref: i32,
    pub mesh_name: NameRef,
}

const _: () = assert!(std::mem::size_of::<MeshInfo>() == 12);

pub struct LoadedScene {
    pub scene: Scene,
    pub camera: CameraId,
}

pub fn load_scene<R: Read>(
    reader: &mut R,
    catalog: &dyn MeshCatalog,
    program: ProgramHandle,
    camera: &CameraConfig,
) -> Result<LoadedScene, LoadError> {
    let names: Vec<u8> = read_chunk(reader, b"str0")?;
    let transform_infos: Vec<TransformInfo> = read_chunk(reader, b"xfh0")?;
    let mesh_infos: Vec<MeshInfo> = read_chunk(reader, b"msh0")?;

    let mut scene = Scene::new();
    let mut materialized: HashMap<i32, TransformId> = HashMap::new();

    for (record, mesh_info) in mesh_infos.iter().enumerate() {
        let hierarchy_ref = mesh_info.hierarchy_ref;

        let transform = match materialized.get(&hierarchy_ref) {
            Some(&id) => id,
            None => {
                let info = usize::try_from(hierarchy_ref)
                    .ok()
                    .and_then(|index| transform_infos.get(index))
                    .ok_or(LoadError::HierarchyRefOutOfRange {
                        record,
                        hierarchy_ref,
                        count: transform_infos.len(),
                    })?;

                let id = materialize(
                    &mut scene,
                    &materialized,
                    hierarchy_ref,
                    &transform_infos,
                    info,
                    &names,
                )?;
                materialized.insert(hierarchy_ref, id);
                id
            }
        };

        let mesh_name = mesh_info.mesh_name.resolve(&names)?;
        let range = catalog
            .lookup(mesh_name)
            .ok_or_else(|| LoadError::UnknownMesh(mesh_name.to_string()))?;

        scene.new_object(
            transform,
            program,
            catalog.vertex_array(),
            range.start,
            range.count,
        )?;
    }

    log::info!(
        "Loaded scene: {} name bytes, {} transform records, {} mesh records -> {} transforms, {} objects",
        names.len(),
        transform_infos.len(),
        mesh_infos.len(),
        scene.transform_count(),
        scene.object_count()
    );

    let camera = add_camera(&mut scene, camera)?;

    Ok(LoadedScene { scene, camera })
}

fn add_camera(scene: &mut Scene, config: &CameraConfig) -> Result<CameraId, LoadError> {
    let transform = scene.add_transform(Transform {
        name: "Camera".to_string(),
        position: config.position,
        rotation: config.rotation,
        ..Default::default()
    });

    let id = scene.new_camera(transform)?;
    if let Some(camera) = scene.camera_mut(id) {
        camera.fovy = config.fovy;
        camera.near = config.near;
    }

    Ok(id)
}

fn materialize(
    scene: &mut Scene,
    materialized: &HashMap<i32, TransformId>,
    hierarchy_ref: i32,
    transform_infos: &[TransformInfo],
    info: &TransformInfo,
    names: &[u8],
) -> Result<TransformId, LoadError> {
    let name = info.name.resolve(names)?;

    let parent = match usize::try_from(info.parent_ref) {
        Err(_) => None,
        Ok(index) if index >= transform_infos.len() => {
            return Err(LoadError::ParentRefOutOfRange {
                child: hierarchy_ref,
                parent: info.parent_ref,
                count: transform_infos.len(),
            });
        }
        Ok(_) => {
            let parent = materialized.get(&info.parent_ref).copied();
            if parent.is_none() {
                log::warn!(
                    "Transform '{}' has parent {} which carries no earlier mesh, loading it as a root",
                    name,
                    info.parent_ref
                );
            }
            parent
        }
    };

    let id = scene.add_transform(Transform {
        name: name.to_string(),
        position: info.position,
        rotation: Quat::from_array(info.rotation),
        scale: info.scale,
        ..Default::default()
    });

    scene.set_parent(id, parent)?;

    Ok(id)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::asset_pipeline::mesh_buffer::tests::encode_pnc;
    use crate::asset_pipeline::mesh_buffer::{MeshBuffer, MeshRange, VertexArrayId};
    use crate::test_util::{write_chunk, NameTable};

    pub(crate) struct SceneBuilder {
        names: NameTable,
        transforms: Vec<TransformInfo>,
        meshes: Vec<MeshInfo>,
    }

    impl SceneBuilder {
        pub(crate) fn new() -> Self {
            Self {
                names: NameTable::default(),
                transforms: Vec::new(),
                meshes: Vec::new(),
            }
        }

        pub(crate) fn transform(&mut self, name: &str, parent_ref: i32, position: Vec3) -> i32 {
            let (begin, end) = self.names.add(name);
            self.transforms.push(TransformInfo {
                parent_ref,
                name: NameRef { begin, end },
                position,
                rotation: Quat::IDENTITY.to_array(),
                scale: Vec3::ONE,
            });
            self.transforms.len() as i32 - 1
        }

        pub(crate) fn mesh(&mut self, hierarchy_ref: i32, mesh_name: &str) -> &mut Self {
            let (begin, end) = self.names.add(mesh_name);
            self.meshes.push(MeshInfo {
                hierarchy_ref,
                mesh_name: NameRef { begin, end },
            });
            self
        }

        pub(crate) fn encode(&self) -> Vec<u8> {
            let mut bytes = Vec::new();
            write_chunk(&mut bytes, b"str0", &self.names.bytes);
            write_chunk(&mut bytes, b"xfh0", &self.transforms);
            write_chunk(&mut bytes, b"msh0", &self.meshes);
            bytes
        }
    }

    pub(crate) fn phone_catalog() -> MeshBuffer {
        let bytes = encode_pnc(&[("Phone", 6), ("Bank", 9), ("Handset", 3)]);
        MeshBuffer::from_reader(&mut bytes.as_slice(), VertexArrayId(0)).unwrap()
    }

    fn load(builder: &SceneBuilder) -> Result<Scene, LoadError> {
        load_scene(
            &mut builder.encode().as_slice(),
            &phone_catalog(),
            ProgramHandle::VERTEX_COLOR,
            &CameraConfig::default(),
        )
        .map(|loaded| loaded.scene)
    }

    #[test]
    fn materializes_only_referenced_transforms() {
        let mut builder = SceneBuilder::new();
        let bank = builder.transform("Bank", -1, Vec3::new(0.0, 2.0, 0.0));
        let _empty = builder.transform("Empty", -1, Vec3::ZERO);
        let phone = builder.transform("Phone", bank, Vec3::new(1.0, 0.0, 0.0));
        builder.mesh(bank, "Bank").mesh(phone, "Phone");

        let scene = load(&builder).unwrap();

        // Two referenced transforms plus the camera's.
        assert_eq!(scene.transform_count(), 3);
        assert_eq!(scene.object_count(), 2);
        let names: Vec<&str> = scene.transforms().map(|(_, t)| t.name.as_str()).collect();
        assert_eq!(names, vec!["Bank", "Phone", "Camera"]);
    }

    #[test]
    fn links_children_to_materialized_parents() {
        let mut builder = SceneBuilder::new();
        let bank = builder.transform("Bank", -1, Vec3::new(0.0, 2.0, 0.0));
        let phone = builder.transform("Phone", bank, Vec3::new(1.0, 0.0, 0.0));
        builder.mesh(bank, "Bank").mesh(phone, "Phone");

        let scene = load(&builder).unwrap();

        let (phone_id, phone_transform) = scene
            .transforms()
            .find(|(_, t)| t.name == "Phone")
            .unwrap();
        assert!(phone_transform.parent().is_some());
        let world = scene.world_transform(phone_id);
        assert!(world.w_axis.truncate().abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn shared_hierarchy_ref_reuses_transform() {
        let mut builder = SceneBuilder::new();
        let bank = builder.transform("Bank", -1, Vec3::ZERO);
        builder.mesh(bank, "Bank").mesh(bank, "Handset");

        let scene = load(&builder).unwrap();

        assert_eq!(scene.transform_count(), 2);
        assert_eq!(scene.object_count(), 2);
        let ranges: Vec<MeshRange> = scene
            .objects()
            .map(|(_, o)| MeshRange {
                start: o.start,
                count: o.count,
            })
            .collect();
        assert_eq!(
            ranges,
            vec![
                MeshRange { start: 6, count: 9 },
                MeshRange { start: 15, count: 3 }
            ]
        );
    }

    #[test]
    fn mesh_under_meshless_empty_loads_as_root() {
        let mut builder = SceneBuilder::new();
        let empty = builder.transform("Empty", -1, Vec3::new(0.0, 3.0, 0.0));
        let phone = builder.transform("Phone", empty, Vec3::X);
        builder.mesh(phone, "Phone");

        let scene = load(&builder).unwrap();

        assert_eq!(scene.transform_count(), 2);
        assert_eq!(scene.object_count(), 1);
        let (phone_id, phone_transform) = scene
            .transforms()
            .find(|(_, t)| t.name == "Phone")
            .unwrap();
        assert!(phone_transform.parent().is_none());
        assert!(scene
            .world_transform(phone_id)
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn parent_referenced_later_leaves_child_as_root() {
        let mut builder = SceneBuilder::new();
        let bank = builder.transform("Bank", -1, Vec3::ZERO);
        let phone = builder.transform("Phone", bank, Vec3::X);
        builder.mesh(phone, "Phone").mesh(bank, "Bank");

        let scene = load(&builder).unwrap();

        assert_eq!(scene.transform_count(), 3);
        assert!(scene.transforms().all(|(_, t)| t.parent().is_none()));
    }

    #[test]
    fn out_of_range_parent_ref_is_an_error() {
        let mut builder = SceneBuilder::new();
        let phone = builder.transform("Phone", 7, Vec3::ZERO);
        builder.mesh(phone, "Phone");

        let error = load(&builder).err().unwrap();

        assert!(matches!(
            error,
            LoadError::ParentRefOutOfRange {
                child: 0,
                parent: 7,
                count: 1
            }
        ));
    }

    #[test]
    fn unknown_mesh_name_is_an_error() {
        let mut builder = SceneBuilder::new();
        let bank = builder.transform("Bank", -1, Vec3::ZERO);
        builder.mesh(bank, "Payphone");

        let error = load(&builder).err().unwrap();

        assert!(matches!(error, LoadError::UnknownMesh(name) if name == "Payphone"));
    }

    #[test]
    fn out_of_range_hierarchy_ref_is_an_error() {
        let mut builder = SceneBuilder::new();
        builder.transform("Bank", -1, Vec3::ZERO);
        builder.mesh(4, "Bank");

        let error = load(&builder).err().unwrap();

        assert!(matches!(
            error,
            LoadError::HierarchyRefOutOfRange {
                hierarchy_ref: 4,
                count: 1,
                ..
            }
        ));
    }

    #[test]
    fn missing_mesh_chunk_is_an_error() {
        let mut builder = SceneBuilder::new();
        builder.transform("Bank", -1, Vec3::ZERO);
        let mut bytes = builder.encode();
        // Drop the (empty) msh0 chunk entirely.
        bytes.truncate(bytes.len() - 8);

        let result = load_scene(
            &mut bytes.as_slice(),
            &phone_catalog(),
            ProgramHandle::VERTEX_COLOR,
            &CameraConfig::default(),
        );

        assert!(matches!(result, Err(LoadError::Truncated { .. })));
    }
}
