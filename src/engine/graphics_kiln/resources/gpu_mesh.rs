use super::{Mesh, MeshLifecycler, MeshLoader};
use crate::GpuMemoryBudget;
use egui::Ui;
use nab_kiln::format_binary;
use resource_kiln::{resource, BoxedError, Resource, ResourceLifecycler, ResourceManager, ResourceTypeTag};
use std::sync::Arc;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat
{
    U16,
    U32,
}
impl IndexFormat
{
    /// The narrowest format that can address every vertex
    #[must_use]
    pub fn for_vertex_count(vertex_count: usize) -> Self
    {
        match vertex_count <= u16::MAX as usize + 1
        {
            true => Self::U16,
            false => Self::U32,
        }
    }

    #[inline] #[must_use]
    pub const fn byte_size(self) -> u64
    {
        match self
        {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// A mesh's vertex and index buffers as resident on the device
#[resource(tag = ResourceTypeTag::GPU_MESH)]
#[derive(Debug)]
pub struct GpuMesh
{
    name: String,
    pub mesh: Arc<Mesh>,
    pub index_format: IndexFormat,
    pub vertex_bytes: u64,
    pub index_bytes: u64,
    owns_mesh: bool,
}
impl GpuMesh
{
    #[inline] #[must_use]
    pub fn device_bytes(&self) -> u64 { self.vertex_bytes + self.index_bytes }
}

#[derive(Debug, Clone)]
pub enum GpuMeshLoader
{
    /// Upload a mesh that already exists in the mesh manager
    FromMesh
    {
        mesh: String,
    },
    /// Create the mesh too, under the GPU mesh's name
    Inline
    {
        mesh: MeshLoader,
    },
}

pub struct GpuMeshLifecycler
{
    meshes: Arc<ResourceManager<MeshLifecycler>>,
    budget: Arc<GpuMemoryBudget>,
}
impl GpuMeshLifecycler
{
    #[must_use]
    pub fn new(meshes: Arc<ResourceManager<MeshLifecycler>>, budget: Arc<GpuMemoryBudget>) -> Self
    {
        Self { meshes, budget }
    }

    #[inline] #[must_use]
    pub fn meshes(&self) -> &Arc<ResourceManager<MeshLifecycler>> { &self.meshes }

    #[inline] #[must_use]
    pub fn budget(&self) -> &GpuMemoryBudget { &self.budget }

}
impl ResourceLifecycler for GpuMeshLifecycler
{
    type Resource = GpuMesh;
    type Loader = GpuMeshLoader;

    fn create_impl(&self, name: &str, loader: &GpuMeshLoader) -> Result<GpuMesh, BoxedError>
    {
        let (mesh, owns_mesh) = match loader
        {
            GpuMeshLoader::FromMesh { mesh } => (self.meshes.get(mesh)?, false),
            GpuMeshLoader::Inline { mesh } => self.meshes.create_or_get(name, mesh)?,
        };

        let index_format = IndexFormat::for_vertex_count(mesh.vertices.len());
        let vertex_bytes = mesh.vertex_bytes();
        let index_bytes = mesh.indices.len() as u64 * index_format.byte_size();

        if let Err(err) = self.budget.try_allocate(vertex_bytes + index_bytes)
        {
            if owns_mesh { self.meshes.release_instance(name, &mesh); }
            return Err(Box::new(err));
        }

        Ok(GpuMesh { name: name.to_string(), mesh, index_format, vertex_bytes, index_bytes, owns_mesh })
    }

    fn free_impl(&self, resource: Arc<GpuMesh>)
    {
        self.budget.free(resource.device_bytes());
        if resource.owns_mesh
        {
            self.meshes.release_instance(resource.name(), &resource.mesh);
        }
    }

    fn debug_gui(&self, ui: &mut Ui)
    {
        ui.label(format!("Device memory: {:#.2}B / {:#.2}B",
            format_binary!(self.budget.used()),
            format_binary!(self.budget.capacity())));
    }
}
