//! Projects group the scenes of an application

use crate::scene::Scene;

/// Named collection of scenes with at most one active scene
#[derive(Debug)]
pub struct Project {
    name: String,
    scenes: Vec<Scene>,
    active: Option<usize>,
}

impl Project {
    /// Empty project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenes: Vec::new(),
            active: None,
        }
    }

    /// Project name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a scene and return its index; the first scene added becomes active
    pub fn add_scene(&mut self, scene: Scene) -> usize {
        self.scenes.push(scene);
        let index = self.scenes.len() - 1;
        if self.active.is_none() {
            self.active = Some(index);
        }
        index
    }

    /// Scenes in insertion order
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Scene by index
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Scene by index, mutably
    pub fn scene_mut(&mut self, index: usize) -> Option<&mut Scene> {
        self.scenes.get_mut(index)
    }

    /// Index of the first scene with the given name
    pub fn find_scene(&self, name: &str) -> Option<usize> {
        self.scenes.iter().position(|scene| scene.name() == name)
    }

    /// Index of the active scene
    pub const fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Make a scene active; returns false for an unknown index
    pub fn set_active_scene(&mut self, index: usize) -> bool {
        let Some(scene) = self.scenes.get(index) else {
            return false;
        };
        log::info!("Project '{}': activating scene '{}'", self.name, scene.name());
        self.active = Some(index);
        true
    }

    /// Active scene
    pub fn active_scene(&self) -> Option<&Scene> {
        self.active.and_then(|index| self.scenes.get(index))
    }

    /// Active scene, mutably
    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.active.and_then(|index| self.scenes.get_mut(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_scene_becomes_active() {
        let mut project = Project::new("demo");
        assert!(project.active_scene().is_none());

        project.add_scene(Scene::new("menu"));
        let level = project.add_scene(Scene::new("level"));
        assert_eq!(project.active_scene().map(Scene::name), Some("menu"));

        assert!(project.set_active_scene(level));
        assert_eq!(project.active_scene().map(Scene::name), Some("level"));
        assert!(!project.set_active_scene(7));
        assert_eq!(project.find_scene("level"), Some(level));
    }
}
