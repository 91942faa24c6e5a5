//! Camera backgrounds

use serde::{Deserialize, Serialize};

use crate::render::Color;

/// Faces of a textured skybox, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyBoxFace {
    /// +Y
    Top = 0,
    /// -Y
    Bottom = 1,
    /// +Z
    Front = 2,
    /// -Z
    Back = 3,
    /// -X
    Left = 4,
    /// +X
    Right = 5,
}

/// Background drawn behind everything else, either a flat color or six textures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyBox {
    background: Color,
    textures: Vec<String>,
}

impl Default for SkyBox {
    fn default() -> Self {
        Self::from_color(Color::BLACK)
    }
}

impl SkyBox {
    /// Flat-colored background
    pub fn from_color(background: Color) -> Self {
        Self {
            background,
            textures: Vec::new(),
        }
    }

    /// Textured background; faces are ordered top, bottom, front, back, left, right
    pub fn from_textures(textures: [String; 6]) -> Self {
        Self {
            background: Color::BLACK,
            textures: textures.into(),
        }
    }

    /// Flat background color
    pub const fn background(&self) -> Color {
        self.background
    }

    /// Texture names, empty for a flat background
    pub fn textures(&self) -> &[String] {
        &self.textures
    }

    /// Texture of one face, if textured
    pub fn texture(&self, face: SkyBoxFace) -> Option<&str> {
        self.textures.get(face as usize).map(String::as_str)
    }

    /// Whether any face has a texture
    pub fn is_textured(&self) -> bool {
        !self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_lookup() {
        let faces = ["up", "down", "north", "south", "west", "east"].map(String::from);
        let skybox = SkyBox::from_textures(faces);
        assert!(skybox.is_textured());
        assert_eq!(skybox.texture(SkyBoxFace::Front), Some("north"));
        assert_eq!(skybox.texture(SkyBoxFace::Right), Some("east"));
        assert_eq!(SkyBox::from_color(Color::BLUE).texture(SkyBoxFace::Top), None);
    }
}
