//! Render-side state types shared with the web frontend.
//!
//! Nothing here touches platform APIs. The web frontend turns these into
//! uniform and instance buffers; tests use them to observe a rendered frame.

use crate::constants::{CAMERA_FOVY_DEG, CAMERA_Z, CAMERA_ZFAR, CAMERA_ZNEAR};
use glam::{Mat4, Vec3};

/// Right-handed perspective camera looking down -Z at the spark field.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, CAMERA_Z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 1.0,
            fovy_radians: CAMERA_FOVY_DEG.to_radians(),
            znear: CAMERA_ZNEAR,
            zfar: CAMERA_ZFAR,
        }
    }
}

impl Camera {
    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }
    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// Which of the two point clouds a particle is drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Back,
    Front,
}

/// One sprite instance as uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub rotation: f32,
}

/// Per-frame uniforms shared by both layers.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub size_scale: f32,
    pub _pad: [f32; 3],
}

impl FrameUniforms {
    pub fn new(camera: &Camera, size_scale: f32) -> Self {
        Self {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            size_scale,
            _pad: [0.0; 3],
        }
    }
}

/// Receives the two layer batches produced by one field tick.
///
/// Back is always drawn before Front.
pub trait PointSpriteSink {
    fn draw_layer(&mut self, layer: Layer, points: &[PointVertex], uniforms: &FrameUniforms);
}
