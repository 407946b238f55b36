/// Orthographic camera with orbit controls
///
/// The camera always looks at the origin (where `frame` centers the model)
/// from a fixed distance. Orbiting changes the direction, zooming divides the
/// frustum; `reset_orbit` returns both to the home view.
use cgmath::{ortho, InnerSpace, Matrix4, Point3, Vector3};
use std::f32::consts::PI;

/// Distance from the origin to the eye; the frustum is orthographic so this
/// only has to clear the normalized model
const CAMERA_DISTANCE: f32 = 10.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 20.0;

/// Keeps the eye off the poles so `look_at` stays well defined
const POLAR_MARGIN: f32 = 0.01;

/// Symmetric view volume bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Frustum {
    pub fn square(half_extent: f32) -> Self {
        Self {
            left: -half_extent,
            right: half_extent,
            top: half_extent,
            bottom: -half_extent,
        }
    }

    #[cfg(test)]
    pub fn half_extent(&self) -> f32 {
        self.top
    }
}

/// Accumulated user rotation and zoom on top of the home view
#[derive(Debug, Clone, Copy, PartialEq)]
struct Orbit {
    azimuth: f32,
    elevation: f32,
    zoom: f32,
}

impl Default for Orbit {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrthoCamera {
    /// Unit vector from the origin towards the home eye position
    home: Vector3<f32>,
    frustum: Frustum,
    orbit: Orbit,
    projection: Matrix4<f32>,
}

impl OrthoCamera {
    /// Camera looking at the origin from `home` (need not be normalized)
    pub fn new(home: Vector3<f32>) -> Self {
        let mut camera = Self {
            home: home.normalize(),
            frustum: Frustum::square(1.0),
            orbit: Orbit::default(),
            projection: Matrix4::from_scale(1.0),
        };
        camera.update_projection();
        camera
    }

    #[cfg(test)]
    pub fn frustum(&self) -> Frustum {
        self.frustum
    }

    /// Set a square frustum and recompute the projection
    pub fn set_half_extent(&mut self, half_extent: f32) {
        self.frustum = Frustum::square(half_extent);
        self.update_projection();
    }

    pub fn update_projection(&mut self) {
        let zoom = self.orbit.zoom;
        let f = self.frustum;
        self.projection = ortho(
            f.left / zoom,
            f.right / zoom,
            f.bottom / zoom,
            f.top / zoom,
            NEAR,
            FAR,
        );
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Eye position after applying the orbit to the home direction
    pub fn eye(&self) -> Point3<f32> {
        let base_azimuth = self.home.x.atan2(self.home.z);
        let base_polar = self.home.y.clamp(-1.0, 1.0).acos();

        let azimuth = base_azimuth + self.orbit.azimuth;
        let polar = (base_polar - self.orbit.elevation).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);

        Point3::new(
            CAMERA_DISTANCE * polar.sin() * azimuth.sin(),
            CAMERA_DISTANCE * polar.cos(),
            CAMERA_DISTANCE * polar.sin() * azimuth.cos(),
        )
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), Point3::new(0.0, 0.0, 0.0), Vector3::unit_y())
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view()
    }

    /// Unit vector pointing from the eye towards the origin
    pub fn forward(&self) -> Vector3<f32> {
        let eye = self.eye();
        -Vector3::new(eye.x, eye.y, eye.z).normalize()
    }

    /// Rotate around the origin by the given angles (radians)
    pub fn rotate(&mut self, azimuth: f32, elevation: f32) {
        self.orbit.azimuth += azimuth;
        self.orbit.elevation += elevation;
    }

    /// Multiply the zoom factor, clamped to a sane range
    pub fn zoom_by(&mut self, factor: f32) {
        self.orbit.zoom = (self.orbit.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.update_projection();
    }

    /// Drop any accumulated rotation and zoom
    pub fn reset_orbit(&mut self) {
        self.orbit = Orbit::default();
        self.update_projection();
    }

    #[cfg(test)]
    pub fn is_home(&self) -> bool {
        self.orbit == Orbit::default()
    }
}
