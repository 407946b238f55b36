/// Shading post-steps applied after a model is framed
///
/// Each variant adjusts the materials of the incoming graph and the rig's
/// environment lighting. They are interchangeable; none changes geometry.
use clap::ValueEnum;

use super::{Environment, LightState};
use crate::scene::SceneGraph;

/// Intensity factor of the studio environment
const ENVIRONMENT_INTENSITY: f32 = 0.8;

/// Sky and ground colors of the procedural sky (linear RGB)
const SKY_COLOR: [f32; 3] = [0.55, 0.7, 1.0];
const GROUND_COLOR: [f32; 3] = [0.25, 0.22, 0.2];
const SKY_INTENSITY: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Shading {
    /// Ambient + key light, metalness disabled
    #[default]
    Flat,
    /// Uniform studio environment reflected by every surface
    Environment,
    /// Hemisphere lighting from a procedural sky
    Sky,
}

impl Shading {
    pub fn apply(self, graph: &mut SceneGraph, lights: &mut LightState) {
        match self {
            Shading::Flat => {
                for material in graph.materials_mut() {
                    material.metalness = 0.0;
                }
                lights.environment = Environment::None;
            }
            Shading::Environment => {
                for material in graph.materials_mut() {
                    material.metalness = 0.0;
                    material.env_intensity = ENVIRONMENT_INTENSITY;
                }
                lights.environment = Environment::Studio {
                    intensity: ENVIRONMENT_INTENSITY,
                };
            }
            Shading::Sky => {
                lights.environment = Environment::Sky {
                    sky: SKY_COLOR,
                    ground: GROUND_COLOR,
                    intensity: SKY_INTENSITY,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::fixtures::box_graph;
    use cgmath::Vector3;

    #[test]
    fn test_flat_disables_metalness_everywhere() {
        let mut graph = box_graph([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        let mut lights = LightState::new(Vector3::new(1.0, 2.0, 3.0));

        Shading::Flat.apply(&mut graph, &mut lights);

        assert_eq!(graph.material(Some(0)).metalness, 0.0);
        // Primitives without a material are covered too
        assert_eq!(graph.material(None).metalness, 0.0);
        assert_eq!(lights.environment, Environment::None);
    }

    #[test]
    fn test_environment_sets_intensity() {
        let mut graph = box_graph([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        let mut lights = LightState::new(Vector3::new(1.0, 2.0, 3.0));

        Shading::Environment.apply(&mut graph, &mut lights);

        assert_eq!(graph.material(Some(0)).env_intensity, ENVIRONMENT_INTENSITY);
        assert!(matches!(lights.environment, Environment::Studio { .. }));
    }

    #[test]
    fn test_sky_keeps_materials() {
        let mut graph = box_graph([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        let before = graph.material(Some(0));
        let mut lights = LightState::new(Vector3::new(1.0, 2.0, 3.0));

        Shading::Sky.apply(&mut graph, &mut lights);

        assert_eq!(graph.material(Some(0)), before);
        assert!(matches!(lights.environment, Environment::Sky { .. }));
    }
}
