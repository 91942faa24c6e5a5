//! Per-frame scene orchestration
//!
//! A scene is initialized once, then driven by `update` and `render` once
//! per tick. Rendering follows a fixed order: opaque objects, opaque static
//! batches, the skybox, transparent objects, transparent static batches and
//! finally debug lines.

use crate::error::EngineError;
use crate::foundation::collections::EntityId;
use crate::foundation::math::Mat4;
use crate::render::{BatchSource, CameraView, LightView, RenderingManager};
use crate::scene::{Component, ComponentSlot, MeshRenderer, Scene};

impl Scene {
    /// Index every entity, warm up dynamic renderers and build static batches
    ///
    /// Runs once; later calls are logged and ignored.
    pub fn initialize(&mut self, rendering: &mut RenderingManager) {
        if self.initialized {
            log::error!("Scene '{}' is already initialized", self.name());
            return;
        }

        let items: Vec<_> = self
            .order
            .iter()
            .filter_map(|id| Some((*id, self.octree_item(*id)?)))
            .collect();
        self.octree.initialize(items);

        // One uncounted pass so every dynamic mesh reaches the backend before the first frame
        for entity in &self.order {
            let Some(object) = self.entities.get(*entity) else { continue };
            if object.is_static() {
                continue;
            }
            if let (Some(renderer), Some(matrix)) = (self.enabled_renderer(*entity), self.world_matrix(*entity)) {
                submit(rendering, renderer, &matrix);
            }
        }

        let sources: Vec<_> = self
            .order
            .iter()
            .filter(|id| self.entities.get(**id).is_some_and(|object| object.is_static()))
            .filter_map(|id| {
                let renderer = self.enabled_renderer(*id)?;
                Some(BatchSource {
                    material: renderer.material(),
                    mesh: renderer.mesh(),
                    matrix: self.world_matrix(*id)?,
                })
            })
            .collect();
        rendering.build_static_batches(sources);
        rendering.draw_opaque_batches(None);
        rendering.draw_transparent_batches(None);

        self.initialized = true;
        log::info!(
            "Scene '{}' initialized: {} entities, {} static batches",
            self.name(),
            self.entities.len(),
            rendering.batches().batch_count()
        );
    }

    /// Run every enabled behaviour once, in attachment order
    ///
    /// Behaviours removed by an earlier behaviour in the same pass are skipped.
    pub fn update(&mut self, delta_time: f64) {
        let behaviours = self.behaviours.clone();
        for id in behaviours {
            let Some(ComponentSlot { owner, component: Component::Behaviour(slot) }) = self.components.get_mut(id) else {
                continue;
            };
            if !slot.is_enabled() {
                continue;
            }
            let owner = *owner;
            let Some(mut behaviour) = slot.take() else { continue };

            behaviour.update(self, owner, delta_time);

            if let Some(slot) = self.behaviour_mut(id) {
                slot.restore(behaviour);
            }
        }
    }

    /// Highest z-layer enabled camera; the first created wins ties
    pub fn active_camera(&self) -> Option<EntityId> {
        let mut cameras: Vec<_> = self
            .cameras
            .iter()
            .filter_map(|id| match self.components.get(*id)? {
                ComponentSlot { owner, component: Component::Camera(camera) } if camera.is_enabled() => Some((*owner, camera.z_layer())),
                _ => None,
            })
            .collect();
        cameras.sort_by(|a, b| b.1.total_cmp(&a.1));
        cameras.first().map(|(entity, _)| *entity)
    }

    /// Draw one frame through `rendering`
    pub fn render(&mut self, rendering: &mut RenderingManager) -> Result<(), EngineError> {
        let view = self.camera_view().ok_or_else(|| EngineError::NoActiveCamera(self.name().to_owned()))?;
        let skybox = self
            .camera(view.entity)
            .map(|camera| camera.skybox().clone())
            .unwrap_or_default();

        rendering.begin_frame();
        rendering.set_active_camera(&view);
        let lights = self.light_views();
        rendering.set_active_lights(&lights, self.ambient_light);

        let culling = cfg!(feature = "frustum-culling");
        rendering.stats_mut().set_frustum_culling(culling);
        let visible = if culling {
            self.octree.intersect(&view.frustum)
        } else {
            self.order.clone()
        };
        let batch_frustum = culling.then_some(&view.frustum);

        let frame = rendering.current_frame();
        let mut transparent = Vec::new();
        for entity in visible {
            let Some(object) = self.entities.get(entity) else { continue };
            if object.is_static() {
                continue;
            }
            let Some(matrix) = self.world_matrix(entity) else { continue };
            let Some(renderer) = self.mesh_renderer_mut(entity).filter(|renderer| renderer.is_enabled()) else {
                continue;
            };

            let material = renderer.material();
            if material.is_transparent() {
                // Fully transparent objects are never submitted
                if material.opacity() > 0.0 {
                    transparent.push((entity, matrix));
                }
            } else if renderer.mark_drawn(frame) {
                submit(rendering, renderer, &matrix);
            }
        }

        rendering.draw_opaque_batches(batch_frustum);
        rendering.draw_skybox(&skybox, &view.position);

        for (entity, matrix) in transparent {
            if let Some(renderer) = self.mesh_renderer_mut(entity) {
                if renderer.mark_drawn(frame) {
                    submit(rendering, renderer, &matrix);
                }
            }
        }
        rendering.draw_transparent_batches(batch_frustum);

        #[cfg(debug_assertions)]
        self.draw_debug(rendering);

        rendering.end_frame();
        Ok(())
    }

    fn camera_view(&self) -> Option<CameraView> {
        let entity = self.active_camera()?;
        let camera = self.camera(entity)?;
        let node = self.transform(entity)?;
        let (position, rotation) = (node.position(), node.rotation());
        Some(CameraView {
            entity,
            position,
            view_projection: camera.projection_matrix(&position, &rotation),
            frustum: camera.frustum(&position, &rotation),
        })
    }

    fn light_views(&self) -> Vec<LightView> {
        self.lights
            .iter()
            .filter_map(|id| {
                let ComponentSlot { owner, component: Component::Light(light) } = self.components.get(*id)? else {
                    return None;
                };
                if !light.is_enabled() {
                    return None;
                }
                let node = self.transform(*owner)?;
                Some(LightView {
                    entity: *owner,
                    light: light.clone(),
                    position: node.position(),
                    direction: node.forward(),
                })
            })
            .collect()
    }

    fn enabled_renderer(&self, entity: EntityId) -> Option<&MeshRenderer> {
        self.mesh_renderer(entity).filter(|renderer| renderer.is_enabled())
    }

    #[cfg(debug_assertions)]
    fn draw_debug(&self, rendering: &mut RenderingManager) {
        use crate::geometry::Segment;
        use crate::render::Color;
        use crate::scene::{DebugFlags, LightType};
        use crate::foundation::math::{world_forward, world_right, world_up};

        const CIRCLE_SEGMENTS: usize = 36;

        for id in &self.debuggers {
            let Some(ComponentSlot { owner, component: Component::Debugger(debugger) }) = self.components.get(*id) else {
                continue;
            };
            let entity = *owner;
            let Some(node) = self.transform(entity) else { continue };
            let position = node.position();

            if debugger.is_visible(DebugFlags::GIZMO) {
                rendering.draw_debug_lines(&[Segment::new(position, position + node.up())], Color::GREEN);
                rendering.draw_debug_lines(&[Segment::new(position, position + node.right())], Color::RED);
                rendering.draw_debug_lines(&[Segment::new(position, position + node.forward())], Color::BLUE);
            }

            if debugger.is_visible(DebugFlags::OCTREE_NODES) {
                let segments: Vec<_> = self
                    .octree
                    .find(entity)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|leaf| self.octree.node(*leaf))
                    .flat_map(|leaf| leaf.bounds().segments())
                    .collect();
                if !segments.is_empty() {
                    rendering.draw_debug_lines(&segments, Color::WHITE);
                }
            }

            if debugger.is_visible(DebugFlags::BOUNDING_BOX) {
                let segments = if let Some(camera) = self.camera(entity) {
                    camera.frustum(&position, &node.rotation()).segments().to_vec()
                } else if let Some(light) = self.light(entity).filter(|light| light.light_type() == LightType::Point) {
                    [world_up(), world_right(), world_forward()]
                        .iter()
                        .flat_map(|normal| Segment::approximate_circle(&position, normal, light.range(), CIRCLE_SEGMENTS))
                        .collect()
                } else if let Some(bounds) = self.entity_bounds(entity) {
                    bounds.segments().to_vec()
                } else {
                    Vec::new()
                };
                rendering.draw_debug_lines(&segments, Color::YELLOW);
            }
        }
    }
}

/// Draw one renderer at `matrix`
fn submit(rendering: &mut RenderingManager, renderer: &MeshRenderer, matrix: &Mat4) {
    rendering.push_transform(matrix);
    rendering.bind_material(renderer.material());
    rendering.draw_mesh(renderer.mesh());
    rendering.pop_transform();
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::config::RenderConfig;
    use crate::foundation::math::Vec3;
    use crate::geometry::{BoundingBox, Mesh};
    use crate::render::{BackendCall, Color, Material, RecordingBackend, ShaderType};
    use crate::scene::{Camera, Debugger, DebugFlags, Light, LightType, Space};

    fn quad(name: &str) -> Arc<Mesh> {
        let v = BoundingBox::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)).vertices();
        Arc::new(Mesh::from_positions(name, &[v[0], v[1], v[5], v[5], v[4], v[0]]))
    }

    fn transparent(opacity: f32) -> Material {
        let mut material = Material::with_diffuse(Color::BLUE);
        material.set_shader(ShaderType::UnlitTransparent);
        material.set_opacity(opacity);
        material
    }

    fn rendering() -> RenderingManager {
        RenderingManager::new(RecordingBackend::new(), RenderConfig::default())
    }

    fn recorded(rendering: &RenderingManager) -> &RecordingBackend {
        rendering.backend_as::<RecordingBackend>().unwrap()
    }

    /// Labels of everything drawn after `start`, skyboxes included
    fn draws_since(rendering: &RenderingManager, start: usize) -> Vec<String> {
        recorded(rendering).calls()[start..]
            .iter()
            .filter_map(|call| match call {
                BackendCall::DrawMesh { name, .. } => Some(name.clone()),
                BackendCall::DrawSkybox(_) => Some("skybox".to_owned()),
                _ => None,
            })
            .collect()
    }

    /// Scene with a camera at the origin looking down +Z
    fn scene_with_camera() -> (Scene, EntityId) {
        let mut scene = Scene::new("test");
        let camera = scene.create_entity("camera");
        scene.add_component(camera, Camera::perspective()).unwrap();
        (scene, camera)
    }

    fn renderable(scene: &mut Scene, name: &str, material: Material, z: f32) -> EntityId {
        let entity = scene.create_entity(name);
        scene.add_component(entity, MeshRenderer::with_material(quad(name), material)).unwrap();
        scene.transform_mut(entity).unwrap().set_position(Vec3::new(0.0, 0.0, z));
        entity
    }

    fn start(scene: &mut Scene, rendering: &mut RenderingManager) -> usize {
        scene.set_running(true);
        scene.initialize(rendering);
        recorded(rendering).calls().len()
    }

    #[test]
    fn test_frame_draw_order() {
        let (mut scene, _) = scene_with_camera();
        renderable(&mut scene, "glass", transparent(0.5), 10.0);
        renderable(&mut scene, "rock", Material::default(), 10.0);
        let wall = renderable(&mut scene, "wall", Material::with_diffuse(Color::RED), 12.0);
        let window = renderable(&mut scene, "window", transparent(0.5), 12.0);
        scene.mark_static(wall);
        scene.mark_static(window);

        let mut rendering = rendering();
        let first = start(&mut scene, &mut rendering);
        assert_eq!(draws_since(&rendering, 0), ["glass", "rock", "static batch 0", "static batch 1"]);

        scene.render(&mut rendering).unwrap();
        assert_eq!(
            draws_since(&rendering, first),
            ["rock", "static batch 0", "skybox", "glass", "static batch 1"]
        );
        assert_eq!(recorded(&rendering).transform_depth(), 0);
        assert_eq!(rendering.stats().batch_count(), 2);
    }

    #[test]
    fn test_invisible_materials_never_drawn() {
        let (mut scene, _) = scene_with_camera();
        renderable(&mut scene, "ghost", transparent(0.0), 10.0);
        let wall = renderable(&mut scene, "ghost wall", transparent(0.0), 12.0);
        scene.mark_static(wall);

        let mut rendering = rendering();
        let first = start(&mut scene, &mut rendering);
        for _ in 0..3 {
            scene.render(&mut rendering).unwrap();
        }
        assert_eq!(draws_since(&rendering, first), ["skybox", "skybox", "skybox"]);
    }

    #[test]
    fn test_highest_layer_camera_wins() {
        let mut scene = Scene::new("test");
        let low = scene.create_entity("low");
        let first_high = scene.create_entity("first high");
        let second_high = scene.create_entity("second high");
        let mut camera = Camera::perspective();
        scene.add_component(low, camera.clone()).unwrap();
        camera.set_z_layer(2.0);
        scene.add_component(first_high, camera.clone()).unwrap();
        scene.add_component(second_high, camera).unwrap();
        assert_eq!(scene.active_camera(), Some(first_high));

        scene.camera_mut(first_high).unwrap().disable();
        assert_eq!(scene.active_camera(), Some(second_high));

        let mut rendering = rendering();
        let first = start(&mut scene, &mut rendering);
        scene.render(&mut rendering).unwrap();
        assert_eq!(recorded(&rendering).calls()[first], BackendCall::SetActiveCamera(second_high));
    }

    #[test]
    fn test_render_without_camera_fails() {
        let mut scene = Scene::new("empty");
        let mut rendering = rendering();
        start(&mut scene, &mut rendering);
        assert!(matches!(scene.render(&mut rendering), Err(EngineError::NoActiveCamera(name)) if name == "empty"));
    }

    #[test]
    fn test_only_enabled_lights_are_bound() {
        let (mut scene, _) = scene_with_camera();
        let sun = scene.create_entity("sun");
        scene.add_component(sun, Light::directional(Color::WHITE, 1.0)).unwrap();
        let lamp = scene.create_entity("lamp");
        scene.add_component(lamp, Light::point(Color::YELLOW, 1.0, 5.0)).unwrap();
        scene.light_mut(lamp).unwrap().disable();

        let mut rendering = rendering();
        let first = start(&mut scene, &mut rendering);
        scene.render(&mut rendering).unwrap();
        assert_eq!(recorded(&rendering).calls()[first + 1], BackendCall::SetActiveLights(vec![sun]));
    }

    #[cfg(feature = "frustum-culling")]
    #[test]
    fn test_objects_outside_frustum_are_culled() {
        let (mut scene, _) = scene_with_camera();
        renderable(&mut scene, "ahead", Material::default(), 10.0);
        renderable(&mut scene, "behind", Material::default(), -10.0);

        let mut rendering = rendering();
        let first = start(&mut scene, &mut rendering);
        scene.render(&mut rendering).unwrap();
        assert_eq!(draws_since(&rendering, first), ["ahead", "skybox"]);
        assert!(rendering.stats().frustum_culling());
    }

    #[cfg(feature = "frustum-culling")]
    #[test]
    fn test_warm_up_draws_stay_out_of_frame_stats() {
        let (mut scene, _) = scene_with_camera();
        for index in 0..5 {
            renderable(&mut scene, &format!("behind {index}"), Material::default(), -10.0);
        }

        let mut rendering = rendering();
        start(&mut scene, &mut rendering);
        scene.render(&mut rendering).unwrap();
        scene.render(&mut rendering).unwrap();

        // Only the skybox is drawn in each real frame
        approx::assert_relative_eq!(rendering.stats().average_draw_calls(), 1.0);
    }

    #[test]
    fn test_behaviours_run_in_order_and_may_remove_themselves() {
        let (mut scene, _) = scene_with_camera();
        let mover = scene.create_entity("mover");
        let runs = Rc::new(Cell::new(0));

        scene
            .add_component(
                mover,
                Component::behaviour(|scene: &mut Scene, owner: EntityId, dt: f64| {
                    if let Some(mut transform) = scene.transform_mut(owner) {
                        transform.translate(Vec3::new(dt as f32, 0.0, 0.0), Space::World);
                    }
                }),
            )
            .unwrap();
        let counter = Rc::clone(&runs);
        scene
            .add_component(
                mover,
                Component::behaviour(move |scene: &mut Scene, owner: EntityId, _: f64| {
                    counter.set(counter.get() + 1);
                    scene.destroy_entity(owner).unwrap();
                }),
            )
            .unwrap();

        scene.update(0.5);
        assert_eq!(runs.get(), 1);
        assert!(scene.entity(mover).is_none());
        assert!(scene.behaviours.is_empty());

        scene.update(0.5);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_disabled_behaviours_are_skipped() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("spinner");
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let id = scene
            .add_component(entity, Component::behaviour(move |_: &mut Scene, _: EntityId, _: f64| counter.set(counter.get() + 1)))
            .unwrap();

        scene.update(0.1);
        scene.behaviour_mut(id).unwrap().disable();
        scene.update(0.1);
        assert_eq!(runs.get(), 1);
        assert!(!scene.behaviour_mut(id).unwrap().is_enabled());
    }

    #[test]
    fn test_moving_behaviour_updates_octree() {
        let (mut scene, _) = scene_with_camera();
        let anchor = renderable(&mut scene, "anchor", Material::default(), 0.0);
        scene.transform_mut(anchor).unwrap().set_scale(Vec3::new(40.0, 40.0, 40.0));
        let mover = renderable(&mut scene, "mover", Material::default(), 10.0);
        scene
            .add_component(
                mover,
                Component::behaviour(|scene: &mut Scene, owner: EntityId, _: f64| {
                    if let Some(mut transform) = scene.transform_mut(owner) {
                        transform.set_position(Vec3::new(0.0, 0.0, -10.0));
                    }
                }),
            )
            .unwrap();

        let mut rendering = rendering();
        let first = start(&mut scene, &mut rendering);
        scene.update(0.016);
        scene.render(&mut rendering).unwrap();

        let drawn = draws_since(&rendering, first);
        #[cfg(feature = "frustum-culling")]
        assert!(!drawn.contains(&"mover".to_owned()));
        assert!(drawn.contains(&"anchor".to_owned()));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_debug_pass_colors() {
        let (mut scene, camera) = scene_with_camera();
        let lamp = scene.create_entity("lamp");
        scene.add_component(lamp, Light::new(LightType::Point)).unwrap();
        scene.add_component(lamp, Debugger::new(DebugFlags::BOUNDING_BOX)).unwrap();
        scene.add_component(camera, Debugger::new(DebugFlags::GIZMO | DebugFlags::BOUNDING_BOX)).unwrap();

        let mut rendering = rendering();
        let first = start(&mut scene, &mut rendering);
        scene.render(&mut rendering).unwrap();

        let lines: Vec<_> = recorded(&rendering).calls()[first..]
            .iter()
            .filter_map(|call| match call {
                BackendCall::DrawDebugLines { segments, color } => Some((*segments, *color)),
                _ => None,
            })
            .collect();
        assert_eq!(
            lines,
            [(108, Color::YELLOW), (1, Color::GREEN), (1, Color::RED), (1, Color::BLUE), (12, Color::YELLOW)]
        );
    }
}
