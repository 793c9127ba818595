use cloth_core::collision::CollisionPrimitive;
use cloth_core::{ClothError, ClothSimulator, SimulationConfig, WindField};
use glam::{Quat, Vec3};
use wasm_bindgen::prelude::*;

/// Render vertex: 32 bytes, matches the WGSL `Vertex` struct.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuVertex {
    position: [f32; 3], // 12 bytes
    _pad0: f32,         //  4 bytes
    normal: [f32; 3],   // 12 bytes
    _pad1: f32,         //  4 bytes
}

fn js_error(e: ClothError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// A cloth patch driven from JavaScript.
///
/// The host steps it once per animation frame and uploads the vertex buffer
/// straight from wasm memory.
#[wasm_bindgen]
pub struct ClothWorld {
    sim: ClothSimulator,
    vertices: Vec<GpuVertex>,
}

#[wasm_bindgen]
impl ClothWorld {
    #[wasm_bindgen(constructor)]
    pub fn new(width: usize, height: usize, spacing: f32) -> Result<ClothWorld, JsValue> {
        let mut sim = ClothSimulator::new();
        sim.initialize(SimulationConfig::with_grid(width, height, spacing))
            .map_err(js_error)?;
        sim.start().map_err(js_error)?;

        web_sys::console::log_1(
            &format!("ClothWorld created: {}x{} particles", width, height).into(),
        );

        let mut world = ClothWorld {
            vertices: vec![<GpuVertex as bytemuck::Zeroable>::zeroed(); sim.particle_count()],
            sim,
        };
        world.write_vertices();
        Ok(world)
    }

    /// Advance one frame; returns the time spent in milliseconds.
    ///
    /// A paused world is left as is.
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f32) -> Result<f32, JsValue> {
        if self.sim.state() != cloth_core::SimulationState::Running {
            return Ok(0.0);
        }
        let start = js_sys::Date::now();
        self.sim.update(dt).map_err(js_error)?;
        self.write_vertices();
        let elapsed = (js_sys::Date::now() - start) as f32;
        if !ClothSimulator::measures_frame_time() {
            self.sim.record_frame_time(elapsed);
        }
        Ok(elapsed)
    }

    #[wasm_bindgen]
    pub fn vertex_buffer_ptr(&self) -> *const f32 {
        self.vertices.as_ptr() as *const f32
    }

    #[wasm_bindgen]
    pub fn vertex_buffer_byte_length(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<GpuVertex>()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.sim.particle_count()
    }

    #[wasm_bindgen]
    pub fn set_pinned(&mut self, x: usize, y: usize, pinned: bool) -> Result<(), JsValue> {
        self.sim.set_pinned(x, y, pinned).map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn apply_impulse(&mut self, x: usize, y: usize, fx: f32, fy: f32, fz: f32) -> Result<(), JsValue> {
        self.sim
            .apply_impulse(x, y, Vec3::new(fx, fy, fz))
            .map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn add_sphere(&mut self, x: f32, y: f32, z: f32, radius: f32) -> usize {
        self.sim
            .add_collision_primitive(CollisionPrimitive::sphere(Vec3::new(x, y, z), radius))
    }

    #[wasm_bindgen]
    pub fn add_plane(&mut self, x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> usize {
        self.sim.add_collision_primitive(CollisionPrimitive::plane(
            Vec3::new(x, y, z),
            Vec3::new(nx, ny, nz),
        ))
    }

    /// `rotation` is a quaternion `[x, y, z, w]`; anything else means axis-aligned.
    #[wasm_bindgen]
    pub fn add_box(&mut self, center: &[f32], half_extents: &[f32], rotation: &[f32]) -> Result<usize, JsValue> {
        let (Ok(c), Ok(h)) = (<[f32; 3]>::try_from(center), <[f32; 3]>::try_from(half_extents)) else {
            return Err(JsValue::from_str("box center and half extents need 3 components"));
        };
        let rotation = <[f32; 4]>::try_from(rotation)
            .map(Quat::from_array)
            .unwrap_or(Quat::IDENTITY);
        Ok(self.sim.add_collision_primitive(CollisionPrimitive::oriented_box(
            Vec3::from_array(c),
            Vec3::from_array(h),
            rotation,
        )))
    }

    #[wasm_bindgen]
    pub fn clear_colliders(&mut self) {
        self.sim.clear_collision_primitives();
    }

    #[wasm_bindgen]
    pub fn set_wind(&mut self, dx: f32, dy: f32, dz: f32, strength: f32, turbulence: f32, frequency: f32) {
        self.sim.set_wind_fields(vec![WindField::new(
            Vec3::new(dx, dy, dz),
            strength,
            turbulence,
            frequency,
        )]);
    }

    #[wasm_bindgen]
    pub fn clear_wind(&mut self) {
        self.sim.clear_wind_fields();
    }

    #[wasm_bindgen]
    pub fn set_solver_config(
        &mut self,
        substeps: u32,
        solver_iterations: u32,
        self_collision: bool,
        adaptive_quality: bool,
    ) {
        self.sim.set_substeps(substeps);
        self.sim.set_iterations(solver_iterations);
        self.sim.enable_self_collision(self_collision);
        self.sim.set_adaptive_quality(adaptive_quality);
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.sim.reset().map_err(js_error)?;
        self.write_vertices();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn pause(&mut self) -> Result<(), JsValue> {
        self.sim.pause().map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn resume(&mut self) -> Result<(), JsValue> {
        self.sim.resume().map_err(js_error)
    }

    fn write_vertices(&mut self) {
        let positions = self.sim.positions();
        let normals = self.sim.normals();
        for ((v, p), n) in self.vertices.iter_mut().zip(positions).zip(normals) {
            v.position = p.to_array();
            v.normal = n.to_array();
        }
    }
}
