/// Binary glTF (GLB) container parsing
///
/// Converts the default scene of a GLB file into a `SceneGraph`:
/// node hierarchy, triangle lists and flattened PBR material factors.
use cgmath::Matrix4;
use gltf::mesh::Mode;
use thiserror::Error;

use super::{Material, Mesh, Node, Primitive, SceneGraph};
use crate::render::color::srgb_to_linear;

/// Every GLB file starts with these four bytes
const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Hierarchies deeper than this are truncated
const MAX_NODE_DEPTH: usize = 64;

#[derive(Error, Debug)]
pub enum GlbError {
    #[error("not a binary glTF container")]
    NotBinary,

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("file contains no scene")]
    NoScene,
}

/// Parse GLB bytes into a scene graph
///
/// Only the default scene (or the first scene when none is marked default)
/// is converted. Buffers and images must be embedded in the container.
pub fn parse_glb(bytes: &[u8]) -> Result<SceneGraph, GlbError> {
    if !bytes.starts_with(GLB_MAGIC) {
        return Err(GlbError::NotBinary);
    }

    let (document, buffers, images) = gltf::import_slice(bytes)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(GlbError::NoScene)?;

    let materials = document
        .materials()
        .map(|material| convert_material(&material, &images))
        .collect();

    let meshes = document
        .meshes()
        .map(|mesh| convert_mesh(&mesh, &buffers))
        .collect();

    let roots = scene.nodes().map(|node| convert_node(&node, 0)).collect();

    Ok(SceneGraph::new(roots, meshes, materials))
}

fn convert_node(node: &gltf::Node, depth: usize) -> Node {
    let children = if depth < MAX_NODE_DEPTH {
        node.children()
            .map(|child| convert_node(&child, depth + 1))
            .collect()
    } else {
        Vec::new()
    };

    Node {
        local: Matrix4::from(node.transform().matrix()),
        mesh: node.mesh().map(|mesh| mesh.index()),
        children,
    }
}

fn convert_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Mesh {
    let mut primitives = Vec::new();

    for prim in mesh.primitives() {
        let reader = prim.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));

        let positions: Vec<[f32; 3]> = match reader.read_positions() {
            Some(it) => it.collect(),
            None => continue,
        };

        let raw: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        // Points and lines still count towards the bounds but draw nothing
        let indices = match prim.mode() {
            Mode::Triangles => raw,
            Mode::TriangleStrip => strip_to_list(&raw),
            Mode::TriangleFan => fan_to_list(&raw),
            _ => Vec::new(),
        };

        primitives.push(Primitive {
            positions,
            indices,
            material: prim.material().index(),
        });
    }

    Mesh {
        primitives,
    }
}

fn convert_material(material: &gltf::Material, images: &[gltf::image::Data]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let mut base_color = pbr.base_color_factor();

    // Fold the texture's average color into the factor
    if let Some(info) = pbr.base_color_texture() {
        let source = info.texture().source().index();
        if let Some(average) = images.get(source).and_then(average_color) {
            for (channel, value) in base_color.iter_mut().zip(average) {
                *channel *= value;
            }
        }
    }

    Material {
        base_color,
        metalness: pbr.metallic_factor(),
        env_intensity: 1.0,
    }
}

/// Mean linear color of an 8-bit RGB(A) image
fn average_color(image: &gltf::image::Data) -> Option<[f32; 4]> {
    let stride = match image.format {
        gltf::image::Format::R8G8B8A8 => 4,
        gltf::image::Format::R8G8B8 => 3,
        _ => return None,
    };

    let mut sum = [0.0f64; 4];
    let mut count = 0usize;
    for px in image.pixels.chunks_exact(stride) {
        sum[0] += px[0] as f64;
        sum[1] += px[1] as f64;
        sum[2] += px[2] as f64;
        sum[3] += if stride == 4 { px[3] as f64 } else { 255.0 };
        count += 1;
    }
    if count == 0 {
        return None;
    }

    let mean = |c: f64| (c / count as f64 / 255.0) as f32;
    Some([
        srgb_to_linear(mean(sum[0])),
        srgb_to_linear(mean(sum[1])),
        srgb_to_linear(mean(sum[2])),
        mean(sum[3]),
    ])
}

fn strip_to_list(strip: &[u32]) -> Vec<u32> {
    let mut list = Vec::new();
    for i in 0..strip.len().saturating_sub(2) {
        // Alternate winding so every triangle keeps the same orientation
        if i % 2 == 0 {
            list.extend_from_slice(&[strip[i], strip[i + 1], strip[i + 2]]);
        } else {
            list.extend_from_slice(&[strip[i + 1], strip[i], strip[i + 2]]);
        }
    }
    list
}

fn fan_to_list(fan: &[u32]) -> Vec<u32> {
    let mut list = Vec::new();
    for i in 1..fan.len().saturating_sub(1) {
        list.extend_from_slice(&[fan[0], fan[i], fan[i + 1]]);
    }
    list
}
