/// In-memory scene graph produced by parsing a model container
///
/// This module holds:
/// - The node hierarchy and mesh data (glb.rs builds it from GLB bytes)
/// - Axis-aligned bounding boxes used for framing
/// - The root transform that a rig adjusts when it frames a model
///
/// Geometry is shared behind `Arc` so copies handed out by the loader are
/// cheap; the parts a rig mutates (root transform, materials) are owned per copy.

pub mod glb;

use cgmath::{Matrix4, Point3, SquareMatrix, Transform as _, Vector3, Zero};
use std::sync::Arc;

/// Axis-aligned bounding box in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    /// A box containing nothing; expanding it with a point yields that point
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn expand(&mut self, point: Vector3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Extent along each axis (zero for an empty box)
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            Vector3::zero()
        } else {
            self.max - self.min
        }
    }

    /// Center point (the origin for an empty box)
    pub fn center(&self) -> Vector3<f32> {
        if self.is_empty() {
            Vector3::zero()
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Largest of the three extents
    pub fn max_dimension(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    /// Box after a uniform positive scale followed by a translation
    pub fn scaled_translated(&self, scale: f32, translation: Vector3<f32>) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            min: self.min * scale + translation,
            max: self.max * scale + translation,
        }
    }
}

/// Root placement of a scene graph: uniform scale, then translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from_scale(self.scale)
    }
}

/// Surface parameters the rasterizer understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Linear RGBA base color (texture average already folded in)
    pub base_color: [f32; 4],
    /// 0.0 = dielectric, 1.0 = metal
    pub metalness: f32,
    /// Strength of environment lighting on this surface
    pub env_intensity: f32,
}

impl Default for Material {
    /// glTF's default material: white, fully metallic
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metalness: 1.0,
            env_intensity: 1.0,
        }
    }
}

/// Triangle list with a material reference
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub positions: Vec<[f32; 3]>,
    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl Primitive {
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = *self.positions.get(tri[0] as usize)?;
            let b = *self.positions.get(tri[1] as usize)?;
            let c = *self.positions.get(tri[2] as usize)?;
            Some([a, b, c])
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

/// One node of the hierarchy; `local` is relative to the parent
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub local: Matrix4<f32>,
    pub mesh: Option<usize>,
    pub children: Vec<Node>,
}

/// A parsed model ready to be framed into a rig
#[derive(Clone)]
pub struct SceneGraph {
    roots: Arc<[Node]>,
    meshes: Arc<[Mesh]>,
    /// Per-copy materials so shading post-steps never leak between rigs
    materials: Vec<Material>,
    /// Used by primitives without a material
    fallback_material: Material,
    /// Root placement, rewritten by `rig::frame`
    pub transform: Transform,
    /// Bounds of the geometry with an identity root transform
    content_bounds: Aabb,
}

impl SceneGraph {
    pub fn new(roots: Vec<Node>, meshes: Vec<Mesh>, materials: Vec<Material>) -> Self {
        let mut graph = Self {
            roots: roots.into(),
            meshes: meshes.into(),
            materials,
            fallback_material: Material::default(),
            transform: Transform::default(),
            content_bounds: Aabb::empty(),
        };

        let mut bounds = Aabb::empty();
        graph.walk(Matrix4::identity(), &mut |world, mesh| {
            for primitive in &mesh.primitives {
                for p in &primitive.positions {
                    let q = world.transform_point(Point3::new(p[0], p[1], p[2]));
                    bounds.expand(Vector3::new(q.x, q.y, q.z));
                }
            }
        });
        graph.content_bounds = bounds;
        graph
    }

    /// A graph with no nodes (frames to a degenerate box)
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.content_bounds.is_empty()
    }

    /// World-space bounds including the root transform
    pub fn bounding_box(&self) -> Aabb {
        self.content_bounds
            .scaled_translated(self.transform.scale, self.transform.position)
    }

    /// Material for a primitive, falling back to the glTF default
    pub fn material(&self, index: Option<usize>) -> Material {
        index
            .and_then(|i| self.materials.get(i).copied())
            .unwrap_or(self.fallback_material)
    }

    /// Every material a render can use, including the fallback
    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials
            .iter_mut()
            .chain(std::iter::once(&mut self.fallback_material))
    }

    /// Visit every mesh instance with its world matrix (root transform applied)
    pub fn for_each_instance(&self, mut visit: impl FnMut(&Matrix4<f32>, &Mesh)) {
        self.walk(self.transform.matrix(), &mut visit);
    }

    pub fn triangle_count(&self) -> usize {
        let mut count = 0;
        self.for_each_instance(|_, mesh| {
            count += mesh
                .primitives
                .iter()
                .map(|p| p.indices.len() / 3)
                .sum::<usize>();
        });
        count
    }

    fn walk(&self, root: Matrix4<f32>, visit: &mut dyn FnMut(&Matrix4<f32>, &Mesh)) {
        for node in self.roots.iter() {
            self.walk_node(node, &root, visit);
        }
    }

    fn walk_node(
        &self,
        node: &Node,
        parent: &Matrix4<f32>,
        visit: &mut dyn FnMut(&Matrix4<f32>, &Mesh),
    ) {
        let world = *parent * node.local;
        if let Some(mesh) = node.mesh.and_then(|i| self.meshes.get(i)) {
            visit(&world, mesh);
        }
        for child in &node.children {
            self.walk_node(child, &world, visit);
        }
    }
}

// Manual Debug implementation (vertex data is too large to print)
impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("roots", &self.roots.len())
            .field("meshes", &self.meshes.len())
            .field("transform", &self.transform)
            .field("bounds", &self.bounding_box())
            .finish_non_exhaustive()
    }
}
