use crate::ResourcesConfig;
use bitcode::{Decode, Encode};
use egui::Ui;
use glam::{Vec2, Vec3};
use nab_kiln::format_binary;
use resource_kiln::{resource, BoxedError, ResourceLifecycler, ResourceTypeTag};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use unicase::UniCase;

pub const MESH_FILE_EXTENSION: &str = "kmesh";

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Encode, Decode)]
pub struct Vertex
{
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}
impl Vertex
{
    #[inline] #[must_use]
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self
    {
        Self { position: position.to_array(), normal: normal.to_array(), uv: uv.to_array() }
    }
}

/// On-disk mesh, bitcode encoded
#[derive(Debug, Default, Clone, PartialEq, Encode, Decode)]
pub struct MeshFile
{
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>, // triangle list
}
impl MeshFile
{
    #[must_use]
    pub fn encode(&self) -> Vec<u8> { bitcode::encode(self) }

    pub fn decode(bytes: &[u8]) -> Result<Self, MeshError> { bitcode::decode(bytes).map_err(MeshError::Decode) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb
{
    pub min: Vec3,
    pub max: Vec3,
}
impl Aabb
{
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self>
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |aabb, p| Self { min: aabb.min.min(p), max: aabb.max.max(p) }))
    }

    #[inline] #[must_use] pub fn center(&self) -> Vec3 { (self.min + self.max) * 0.5 }
    #[inline] #[must_use] pub fn extents(&self) -> Vec3 { self.max - self.min }
}

#[resource(tag = ResourceTypeTag::MESH)]
#[derive(Debug)]
pub struct Mesh
{
    name: String,
    pub vertices: Box<[Vertex]>,
    pub indices: Box<[u32]>,
    pub bounds: Aabb,
}
impl Mesh
{
    #[inline] #[must_use] pub fn triangle_count(&self) -> usize { self.indices.len() / 3 }
    #[inline] #[must_use] pub fn vertex_bytes(&self) -> u64 { size_of_val(self.vertices.as_ref()) as u64 }
    #[inline] #[must_use] pub fn index_bytes(&self) -> u64 { size_of_val(self.indices.as_ref()) as u64 }
}

#[derive(Clone)]
pub enum MeshLoader
{
    Data
    {
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
    },
    /// An encoded [`MeshFile`]
    Encoded(Arc<[u8]>),
    /// A `.kmesh` file, relative to the resources root
    File(PathBuf),
    /// Axis-aligned cube centered on the origin, four vertices per face
    Cube
    {
        half_extent: f32,
    },
    /// Facing +Z in the XY plane
    Quad
    {
        half_extent: f32,
    },
}
impl Debug for MeshLoader
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            MeshLoader::Data { vertices, indices } => write!(f, "Data({} vertices, {} indices)", vertices.len(), indices.len()),
            MeshLoader::Encoded(bytes) => write!(f, "Encoded({} bytes)", bytes.len()),
            MeshLoader::File(path) => write!(f, "File({})", path.display()),
            MeshLoader::Cube { half_extent } => write!(f, "Cube({half_extent})"),
            MeshLoader::Quad { half_extent } => write!(f, "Quad({half_extent})"),
        }
    }
}

#[derive(Debug)]
pub enum MeshError
{
    NoVertices,
    NoIndices,
    PartialTriangle(usize),
    IndexOutOfRange { index: u32, vertex_count: usize },
    NonFiniteVertex(usize),
    UnsupportedFile(PathBuf),
    Read { path: PathBuf, source: std::io::Error },
    Decode(bitcode::Error),
}
impl Display for MeshError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            MeshError::PartialTriangle(count) => write!(f, "Index count {count} is not a multiple of 3"),
            MeshError::IndexOutOfRange { index, vertex_count } => write!(f, "Index {index} is out of range for {vertex_count} vertices"),
            MeshError::UnsupportedFile(path) => write!(f, "'{}' is not a .{MESH_FILE_EXTENSION} file", path.display()),
            MeshError::Read { path, source } => write!(f, "Failed to read '{}': {source}", path.display()),
            MeshError::Decode(err) => write!(f, "Failed to decode mesh: {err}"),
            _ => Debug::fmt(self, f),
        }
    }
}
impl Error for MeshError { }

fn validate(vertices: &[Vertex], indices: &[u32]) -> Result<Aabb, MeshError>
{
    if vertices.is_empty() { return Err(MeshError::NoVertices); }
    if indices.is_empty() { return Err(MeshError::NoIndices); }
    if indices.len() % 3 != 0 { return Err(MeshError::PartialTriangle(indices.len())); }

    if let Some(index) = indices.iter().find(|i| **i as usize >= vertices.len())
    {
        return Err(MeshError::IndexOutOfRange { index: *index, vertex_count: vertices.len() });
    }
    if let Some(bad) = vertices.iter().position(|v| !Vec3::from_array(v.position).is_finite())
    {
        return Err(MeshError::NonFiniteVertex(bad));
    }

    Aabb::from_points(vertices.iter().map(|v| Vec3::from_array(v.position))).ok_or(MeshError::NoVertices)
}

fn push_face(file: &mut MeshFile, center: Vec3, normal: Vec3, u: Vec3, v: Vec3, half_extent: f32)
{
    let base = file.vertices.len() as u32;
    let corners =
    [
        (-u - v, Vec2::new(0.0, 1.0)),
        (u - v, Vec2::new(1.0, 1.0)),
        (u + v, Vec2::new(1.0, 0.0)),
        (-u + v, Vec2::new(0.0, 0.0)),
    ];
    for (offset, uv) in corners
    {
        file.vertices.push(Vertex::new(center + offset * half_extent, normal, uv));
    }
    file.indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
}

#[must_use]
pub fn cube(half_extent: f32) -> MeshFile
{
    let mut file = MeshFile::default();
    // u x v = normal, so every face winds counter-clockwise
    let faces =
    [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    for (normal, u, v) in faces
    {
        push_face(&mut file, normal * half_extent, normal, u, v, half_extent);
    }
    file
}

#[must_use]
pub fn quad(half_extent: f32) -> MeshFile
{
    let mut file = MeshFile::default();
    push_face(&mut file, Vec3::ZERO, Vec3::Z, Vec3::X, Vec3::Y, half_extent);
    file
}

pub struct MeshLifecycler
{
    config: Arc<ResourcesConfig>,
    host_bytes: AtomicI64,
}
impl MeshLifecycler
{
    #[must_use]
    pub fn new(config: Arc<ResourcesConfig>) -> Self
    {
        Self { config, host_bytes: AtomicI64::new(0) }
    }

    #[inline] #[must_use]
    pub fn host_bytes(&self) -> i64 { self.host_bytes.load(Ordering::Relaxed) }

    fn read_file(&self, path: &Path) -> Result<MeshFile, MeshError>
    {
        let is_mesh_file = path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| UniCase::new(e) == UniCase::new(MESH_FILE_EXTENSION));
        if !is_mesh_file
        {
            return Err(MeshError::UnsupportedFile(path.to_path_buf()));
        }

        let path = self.config.resolve_path(path);
        let bytes = std::fs::read(&path).map_err(|source| MeshError::Read { path, source })?;
        MeshFile::decode(&bytes)
    }
}
impl ResourceLifecycler for MeshLifecycler
{
    type Resource = Mesh;
    type Loader = MeshLoader;

    fn create_impl(&self, name: &str, loader: &MeshLoader) -> Result<Mesh, BoxedError>
    {
        let file = match loader
        {
            MeshLoader::Data { vertices, indices } => MeshFile { vertices: vertices.clone(), indices: indices.clone() },
            MeshLoader::Encoded(bytes) => MeshFile::decode(bytes)?,
            MeshLoader::File(path) => self.read_file(path)?,
            MeshLoader::Cube { half_extent } => cube(*half_extent),
            MeshLoader::Quad { half_extent } => quad(*half_extent),
        };

        let bounds = validate(&file.vertices, &file.indices)?;
        let mesh = Mesh
        {
            name: name.to_string(),
            vertices: file.vertices.into_boxed_slice(),
            indices: file.indices.into_boxed_slice(),
            bounds,
        };
        self.host_bytes.fetch_add((mesh.vertex_bytes() + mesh.index_bytes()) as i64, Ordering::Relaxed);
        Ok(mesh)
    }

    fn free_impl(&self, resource: Arc<Mesh>)
    {
        self.host_bytes.fetch_sub((resource.vertex_bytes() + resource.index_bytes()) as i64, Ordering::Relaxed);
    }

    fn debug_gui(&self, ui: &mut Ui)
    {
        ui.label(format!("Host memory: {:#.2}B", format_binary!(self.host_bytes())));
    }
}
