//! Runtime context
//!
//! Bundles the loaded project, the rendering manager and the running flag.
//! It is created once by the host application and passed by reference
//! wherever the engine state is needed.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::foundation::collections::EntityId;
use crate::geometry::Ray;
use crate::render::{RenderBackend, RenderingManager};
use crate::scene::{Project, Scene};
use crate::spatial::RaycastHit;

/// Engine state shared by the host loop
#[derive(Debug)]
pub struct RuntimeContext {
    project: Option<Project>,
    rendering: RenderingManager,
    config: EngineConfig,
    running: bool,
}

impl RuntimeContext {
    /// Context with no project loaded
    pub fn new(backend: impl RenderBackend + 'static, config: EngineConfig) -> Self {
        Self {
            project: None,
            rendering: RenderingManager::new(backend, config.render.clone()),
            config,
            running: false,
        }
    }

    /// Configuration applied at start
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `start` has been called without a matching `stop`
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Rendering front-end
    pub const fn rendering(&self) -> &RenderingManager {
        &self.rendering
    }

    /// Rendering front-end, mutably
    pub fn rendering_mut(&mut self) -> &mut RenderingManager {
        &mut self.rendering
    }

    /// Replace the loaded project; refused while running
    pub fn load_project(&mut self, project: Project) -> Result<(), EngineError> {
        if self.running {
            return Err(EngineError::AlreadyRunning);
        }
        log::info!("Loaded project '{}' ({} scenes)", project.name(), project.scenes().len());
        self.project = Some(project);
        Ok(())
    }

    /// Loaded project
    pub const fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Loaded project, mutably
    pub fn project_mut(&mut self) -> Option<&mut Project> {
        self.project.as_mut()
    }

    /// Active scene of the loaded project
    pub fn active_scene(&self) -> Result<&Scene, EngineError> {
        self.project
            .as_ref()
            .ok_or(EngineError::NoActiveProject)?
            .active_scene()
            .ok_or(EngineError::NoActiveScene)
    }

    /// Active scene of the loaded project, mutably
    pub fn active_scene_mut(&mut self) -> Result<&mut Scene, EngineError> {
        active_scene_mut(&mut self.project)
    }

    /// Freeze static entities and initialize the active scene
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.running {
            return Err(EngineError::AlreadyRunning);
        }
        let scene = active_scene_mut(&mut self.project)?;
        if !scene.is_initialized() {
            scene.set_octree_config(self.config.octree);
        }
        scene.set_running(true);
        scene.initialize(&mut self.rendering);
        self.running = true;
        log::info!("Started scene '{}'", scene.name());
        Ok(())
    }

    /// Update behaviours, then render one frame
    pub fn tick(&mut self, delta_time: f64) -> Result<(), EngineError> {
        if !self.running {
            return Err(EngineError::NotRunning);
        }
        let scene = active_scene_mut(&mut self.project)?;
        scene.update(delta_time);
        scene.render(&mut self.rendering)
    }

    /// Unfreeze static entities
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        if let Ok(scene) = active_scene_mut(&mut self.project) {
            scene.set_running(false);
        }
        self.running = false;
        log::info!("Stopped: {}", self.rendering.stats());
    }

    /// Cast a ray into the active scene
    pub fn raycast(&self, ray: &Ray) -> Result<Option<RaycastHit<EntityId>>, EngineError> {
        Ok(self.active_scene()?.raycast(ray))
    }
}

fn active_scene_mut(project: &mut Option<Project>) -> Result<&mut Scene, EngineError> {
    project
        .as_mut()
        .ok_or(EngineError::NoActiveProject)?
        .active_scene_mut()
        .ok_or(EngineError::NoActiveScene)
}
