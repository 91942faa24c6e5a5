//! Frustum culling demo
//!
//! Builds a field of static spheres plus a few drifting dynamic ones, then
//! renders a fixed number of frames through a headless backend while a
//! second camera orbits the field. With the `frustum-culling` feature on,
//! the draw-call count drops whenever the orbiting camera looks away from
//! most of the field.
//!
//! Usage: `culling_demo [config.toml|config.ron]`

use std::any::Any;
use std::sync::Arc;

use rand::Rng;
use scene_engine::foundation::logging;
use scene_engine::geometry::Segment;
use scene_engine::prelude::*;
use scene_engine::render::{CameraView, LightView};

const FIELD_SIZE: i32 = 12;
const FIELD_SPACING: f32 = 4.0;
const DRIFTERS: usize = 8;
const FRAMES: usize = 600;
const DELTA_TIME: f64 = 1.0 / 60.0;

/// Backend that only logs what it is asked to draw
#[derive(Debug, Default)]
struct LoggingBackend {
    draws: u64,
    depth: usize,
}

impl RenderBackend for LoggingBackend {
    fn set_active_camera(&mut self, camera: &CameraView) {
        log::trace!("camera {:?} at {:?}", camera.entity, camera.position);
    }

    fn set_active_lights(&mut self, lights: &[LightView], _ambient: Color) {
        log::trace!("{} lights", lights.len());
    }

    fn push_transform(&mut self, _matrix: &Mat4) {
        self.depth += 1;
    }

    fn pop_transform(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn bind_material(&mut self, _material: &Material) {}

    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.draws += 1;
        log::trace!("draw {} at depth {}", mesh.name(), self.depth);
    }

    fn draw_skybox(&mut self, _skybox: &SkyBox) {}

    fn draw_debug_lines(&mut self, segments: &[Segment], color: Color, _thickness: f32) {
        log::trace!("{} debug lines in {:?}", segments.len(), color);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Orbits its entity around a point while facing it
struct RotateAround {
    center: Vec3,
    axis: Vec3,
    degrees_per_second: f32,
}

impl Behaviour for RotateAround {
    fn update(&mut self, scene: &mut Scene, owner: EntityId, delta_time: f64) {
        if let Some(mut transform) = scene.transform_mut(owner) {
            transform
                .rotate_around(self.center, self.axis, self.degrees_per_second * delta_time as f32)
                .look_at(self.center, None);
        }
    }
}

/// Moves its entity at a constant velocity
struct Drift {
    velocity: Vec3,
}

impl Behaviour for Drift {
    fn update(&mut self, scene: &mut Scene, owner: EntityId, delta_time: f64) {
        if let Some(mut transform) = scene.transform_mut(owner) {
            transform.translate(self.velocity * delta_time as f32, Space::World);
        }
    }
}

/// Latitude/longitude sphere as a plain triangle list
fn uv_sphere(radius: f32, rings: usize, sectors: usize) -> Mesh {
    let point = |ring: usize, sector: usize| {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let phi = std::f32::consts::TAU * sector as f32 / sectors as f32;
        Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()) * radius
    };

    let mut positions = Vec::with_capacity(rings * sectors * 6);
    for ring in 0..rings {
        for sector in 0..sectors {
            let (a, b) = (point(ring, sector), point(ring, sector + 1));
            let (c, d) = (point(ring + 1, sector), point(ring + 1, sector + 1));
            positions.extend([a, c, b, b, c, d]);
        }
    }
    Mesh::from_positions("sphere", &positions)
}

fn glass(color: Color) -> Material {
    let mut material = Material::with_diffuse(color);
    material.set_shader(ShaderType::StandardTransparent);
    material.set_opacity(0.4);
    material
}

fn build_scene(config: &EngineConfig) -> Result<Scene, EngineError> {
    let mut rng = rand::thread_rng();
    let mut scene = Scene::with_octree_config("culling", config.octree);
    let sphere = Arc::new(uv_sphere(1.0, 12, 16));
    let palette = [Color::RED, Color::GREEN, Color::BLUE, Color::YELLOW];

    let half = FIELD_SIZE as f32 * FIELD_SPACING * 0.5;
    for x in 0..FIELD_SIZE {
        for z in 0..FIELD_SIZE {
            let entity = scene.create_entity(format!("static sphere {x},{z}"));
            let color = palette[rng.gen_range(0..palette.len())];
            scene.add_component(entity, MeshRenderer::with_material(Arc::clone(&sphere), Material::with_diffuse(color)))?;
            if let Some(mut transform) = scene.transform_mut(entity) {
                transform.set_position(Vec3::new(x as f32 * FIELD_SPACING - half, 0.0, z as f32 * FIELD_SPACING - half));
            }
            scene.mark_static(entity);
        }
    }

    for index in 0..DRIFTERS {
        let entity = scene.create_entity(format!("drifter {index}"));
        let material = if index % 2 == 0 { glass(Color::WHITE) } else { Material::default() };
        scene.add_component(entity, MeshRenderer::with_material(Arc::clone(&sphere), material))?;
        scene.add_component(
            entity,
            Component::behaviour(Drift {
                velocity: Vec3::new(rng.gen_range(-2.0..2.0), 0.0, rng.gen_range(-2.0..2.0)),
            }),
        )?;
        if let Some(mut transform) = scene.transform_mut(entity) {
            transform.set_position(Vec3::new(rng.gen_range(-half..half), 3.0, rng.gen_range(-half..half)));
        }
    }

    let sun = scene.create_entity("sun");
    scene.add_component(sun, Light::directional(Color::WHITE, 0.8))?;
    if let Some(mut transform) = scene.transform_mut(sun) {
        transform.set_euler_angles(Vec3::new(50.0, -30.0, 0.0));
    }

    let overview = scene.create_entity("overview camera");
    scene.add_component(overview, Camera::perspective())?;
    if let Some(mut transform) = scene.transform_mut(overview) {
        transform.set_position(Vec3::new(0.0, half * 2.0, -half * 2.0)).look_at(Vec3::zeros(), None);
    }

    let mut culling_camera = Camera::perspective();
    culling_camera.set_z_layer(1.0);
    culling_camera.set_clipping_far(half * 2.0);
    let orbiter = scene.create_entity("culling camera");
    scene.add_component(orbiter, culling_camera)?;
    scene.add_component(orbiter, Debugger::new(DebugFlags::BOUNDING_BOX))?;
    scene.add_component(
        orbiter,
        Component::behaviour(RotateAround {
            center: Vec3::zeros(),
            axis: Vec3::y(),
            degrees_per_second: 30.0,
        }),
    )?;
    if let Some(mut transform) = scene.transform_mut(orbiter) {
        transform.set_position(Vec3::new(half * 0.5, 2.0, 0.0)).look_at(Vec3::zeros(), None);
    }

    Ok(scene)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("info");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {path}");
            EngineConfig::load_from_file(path)?
        }
        None => EngineConfig::default(),
    };

    let mut project = Project::new("culling demo");
    project.add_scene(build_scene(&config)?);

    let mut context = RuntimeContext::new(LoggingBackend::default(), config);
    context.load_project(project)?;
    context.start()?;

    for frame in 0..FRAMES {
        context.tick(DELTA_TIME)?;
        if frame % 60 == 0 {
            log::info!("{}", context.rendering().stats());
        }
    }

    if let Some(backend) = context.rendering().backend_as::<LoggingBackend>() {
        log::info!("{} meshes submitted in total", backend.draws);
    }
    context.stop();
    Ok(())
}
