/// Render rigs: camera + lighting + one model slot
///
/// Two rigs exist at runtime: the thumbnail pipeline's offscreen rig and the
/// preview controller's interactive rig. Each is owned by exactly one
/// component and mutated only through `&mut`, so a render can never observe
/// a half-replaced model.
///
/// - `camera.rs` - orthographic camera and orbit state
/// - `shading.rs` - interchangeable lighting/material post-steps

pub mod camera;
pub mod shading;

use cgmath::{InnerSpace, Vector3};
use tracing::debug;

use crate::render::color::linear_from_hex;
use crate::scene::SceneGraph;
use camera::OrthoCamera;
use shading::Shading;

/// Models larger than this (largest bounding-box dimension) are shrunk
pub const RESCALE_THRESHOLD: f32 = 2.0;

/// Largest dimension after shrinking
const NORMALIZED_SIZE: f32 = 1.0;

/// Below this a bounding box is treated as degenerate
const DEGENERATE_SIZE: f32 = 1e-6;

/// Ambient light color (0x666666)
const AMBIENT_HEX: u32 = 0x666666;

/// Environment contribution chosen by the shading post-step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    None,
    /// Uniform irradiance from every direction
    Studio { intensity: f32 },
    /// Hemisphere blend between ground and sky colors
    Sky {
        sky: [f32; 3],
        ground: [f32; 3],
        intensity: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    /// Linear ambient color
    pub ambient: [f32; 3],
    /// Unit vector from the scene towards the key light
    pub key_direction: Vector3<f32>,
    pub key_intensity: f32,
    pub environment: Environment,
}

impl LightState {
    pub fn new(key_position: Vector3<f32>) -> Self {
        Self {
            ambient: linear_from_hex(AMBIENT_HEX),
            key_direction: key_position.normalize(),
            key_intensity: 1.0,
            environment: Environment::None,
        }
    }
}

/// Holder of the model currently shown by a rig
#[derive(Debug, Clone, Default)]
pub struct ModelSlot {
    model: Option<SceneGraph>,
}

impl ModelSlot {
    /// Swap in a new model, returning the previous one
    pub fn replace(&mut self, model: SceneGraph) -> Option<SceneGraph> {
        self.model.replace(model)
    }

    pub fn clear(&mut self) -> Option<SceneGraph> {
        self.model.take()
    }

    pub fn get(&self) -> Option<&SceneGraph> {
        self.model.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct RenderRig {
    pub camera: OrthoCamera,
    pub lights: LightState,
    slot: ModelSlot,
    shading: Shading,
}

impl RenderRig {
    /// Create a rig with the camera at (1, 1, 1) and the key light at
    /// (1, 2, 3); `flip` mirrors both to the negative z side
    pub fn new(flip: bool, shading: Shading) -> Self {
        let z = if flip { -1.0 } else { 1.0 };
        Self {
            camera: OrthoCamera::new(Vector3::new(1.0, 1.0, z)),
            lights: LightState::new(Vector3::new(1.0, 2.0, 3.0 * z)),
            slot: ModelSlot::default(),
            shading,
        }
    }

    /// The model currently displayed, if any
    pub fn model(&self) -> Option<&SceneGraph> {
        self.slot.get()
    }

    pub fn clear(&mut self) {
        self.slot.clear();
    }

    /// Normalize a scene graph and make it this rig's model
    ///
    /// Steps:
    /// 1. Measure the bounding box (root transform reset first, so framing
    ///    the same graph twice gives the same result)
    /// 2. Shrink uniformly to size 1 if the largest dimension exceeds 2,
    ///    then measure again
    /// 3. Move the box center to the origin
    /// 4. Run the shading post-step and swap the model slot
    /// 5. Fit the square orthographic frustum to the largest dimension
    pub fn frame(&mut self, mut graph: SceneGraph) {
        graph.transform = Default::default();

        let mut bounds = graph.bounding_box();
        let mut max_size = bounds.max_dimension();

        if max_size > RESCALE_THRESHOLD {
            graph.transform.scale = NORMALIZED_SIZE / max_size;
            bounds = graph.bounding_box();
            max_size = bounds.max_dimension();
        }

        graph.transform.position -= bounds.center();

        self.shading.apply(&mut graph, &mut self.lights);

        debug!(
            "🎯 Framed model: size {:.3}, scale {:.3}, {} triangles",
            max_size,
            graph.transform.scale,
            graph.triangle_count()
        );

        self.slot.replace(graph);

        let half_extent = if max_size <= DEGENERATE_SIZE {
            1.0
        } else {
            max_size
        };
        self.camera.set_half_extent(half_extent);
    }
}
