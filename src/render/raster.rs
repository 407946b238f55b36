/// CPU triangle rasterizer
///
/// Draws the model in a rig's slot with a depth buffer and per-face lighting.
/// Faces are lit two-sided: normals are flipped to face the camera, which
/// keeps models with inconsistent winding readable in thumbnails.
use cgmath::{InnerSpace, Matrix4, Point3, Transform as _, Vector3};
use image::{Rgba, RgbaImage};

use super::color::{rgb_from_hex, ColorEncoding};
use crate::rig::{Environment, LightState, RenderRig};
use crate::scene::Material;

/// Metals keep this much of their diffuse response (they rely on reflections)
const METAL_DIFFUSE_FLOOR: f32 = 0.1;

/// Render the rig's current model into a square image of `size` pixels
pub fn rasterize(rig: &RenderRig, size: u32, background: u32, encoding: ColorEncoding) -> RgbaImage {
    let [r, g, b] = rgb_from_hex(background);
    let mut image = RgbaImage::from_pixel(size, size, Rgba([r, g, b, 255]));

    let Some(model) = rig.model() else {
        return image;
    };
    if size == 0 {
        return image;
    }

    let mut depth = vec![f32::INFINITY; (size * size) as usize];
    let view_projection = rig.camera.view_projection();
    let forward = rig.camera.forward();

    model.for_each_instance(|world, mesh| {
        for primitive in &mesh.primitives {
            let material = model.material(primitive.material);

            for triangle in primitive.triangles() {
                let corners = triangle.map(|p| to_world(world, p));

                let Some(mut normal) = face_normal(&corners) else {
                    continue;
                };
                if normal.dot(forward) > 0.0 {
                    normal = -normal;
                }

                let linear = shade(&material, normal, &rig.lights);
                let pixel = Rgba([
                    encoding.encode(linear[0]),
                    encoding.encode(linear[1]),
                    encoding.encode(linear[2]),
                    255,
                ]);

                let screen = corners.map(|c| to_screen(&view_projection, c, size));
                fill_triangle(&mut image, &mut depth, screen, pixel);
            }
        }
    });

    image
}

fn to_world(world: &Matrix4<f32>, p: [f32; 3]) -> Vector3<f32> {
    let q = world.transform_point(Point3::new(p[0], p[1], p[2]));
    Vector3::new(q.x, q.y, q.z)
}

fn face_normal(corners: &[Vector3<f32>; 3]) -> Option<Vector3<f32>> {
    let n = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
    let length = n.magnitude();
    if length <= f32::EPSILON {
        None
    } else {
        Some(n / length)
    }
}

/// Pixel x, pixel y, NDC depth
fn to_screen(view_projection: &Matrix4<f32>, p: Vector3<f32>, size: u32) -> [f32; 3] {
    let ndc = view_projection.transform_point(Point3::new(p.x, p.y, p.z));
    let s = size as f32;
    [(ndc.x + 1.0) * 0.5 * s, (1.0 - ndc.y) * 0.5 * s, ndc.z]
}

/// Linear color of a face with the given (camera-facing) normal
fn shade(material: &Material, normal: Vector3<f32>, lights: &LightState) -> [f32; 3] {
    let n_dot_l = normal.dot(lights.key_direction).max(0.0);
    let diffuse = 1.0 - material.metalness * (1.0 - METAL_DIFFUSE_FLOOR);

    let environment = match lights.environment {
        Environment::None => [0.0; 3],
        Environment::Studio { intensity } => [intensity * material.env_intensity; 3],
        Environment::Sky {
            sky,
            ground,
            intensity,
        } => {
            let t = 0.5 + 0.5 * normal.y;
            let scale = intensity * material.env_intensity;
            [
                (ground[0] + (sky[0] - ground[0]) * t) * scale,
                (ground[1] + (sky[1] - ground[1]) * t) * scale,
                (ground[2] + (sky[2] - ground[2]) * t) * scale,
            ]
        }
    };

    let mut out = [0.0; 3];
    for c in 0..3 {
        let direct = (lights.ambient[c] + lights.key_intensity * n_dot_l) * diffuse;
        out[c] = material.base_color[c] * (direct + environment[c]);
    }
    out
}

fn edge(a: [f32; 3], b: [f32; 3], x: f32, y: f32) -> f32 {
    (b[0] - a[0]) * (y - a[1]) - (b[1] - a[1]) * (x - a[0])
}

fn fill_triangle(image: &mut RgbaImage, depth: &mut [f32], tri: [[f32; 3]; 3], pixel: Rgba<u8>) {
    let [a, b, c] = tri;
    let area = edge(a, b, c[0], c[1]);
    if area.abs() <= f32::EPSILON {
        return;
    }

    let width = image.width() as f32;
    let height = image.height() as f32;
    let min_x = a[0].min(b[0]).min(c[0]).floor().max(0.0) as u32;
    let min_y = a[1].min(b[1]).min(c[1]).floor().max(0.0) as u32;
    let max_x = a[0].max(b[0]).max(c[0]).ceil().min(width) as u32;
    let max_y = a[1].max(b[1]).max(c[1]).ceil().min(height) as u32;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            // Barycentric weights; all share the sign of `area` when inside
            let w0 = edge(b, c, px, py) / area;
            let w1 = edge(c, a, px, py) / area;
            let w2 = edge(a, b, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let z = w0 * a[2] + w1 * b[2] + w2 * c[2];
            if !(-1.0..=1.0).contains(&z) {
                continue;
            }

            let index = (y * image.width() + x) as usize;
            if z < depth[index] {
                depth[index] = z;
                image.put_pixel(x, y, pixel);
            }
        }
    }
}
