//! Surface materials

use crate::render::Color;

/// Shader program a material is drawn with
///
/// Values at or above [`ShaderType::TRANSPARENCY_THRESHOLD`] are blended and
/// drawn after every opaque object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ShaderType {
    /// Flat color or texture, no lighting
    Unlit = 0,
    /// Lit with the scene lights
    Standard = 1,
    /// Blended variant of [`ShaderType::Unlit`]
    UnlitTransparent = 100,
    /// Blended variant of [`ShaderType::Standard`]
    StandardTransparent = 101,
}

impl ShaderType {
    /// First shader value that is drawn in the transparent pass
    pub const TRANSPARENCY_THRESHOLD: u32 = 100;

    /// Numeric shader value
    pub const fn value(self) -> u32 {
        self as u32
    }

    /// Whether this shader belongs to the transparent pass
    pub const fn is_transparent(self) -> bool {
        self.value() >= Self::TRANSPARENCY_THRESHOLD
    }
}

/// Appearance of a mesh renderer
///
/// Two materials are equal when every property matches exactly; static
/// batches are formed from renderers with equal materials.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    shader: ShaderType,
    diffuse: Color,
    specular: Color,
    shininess: f32,
    opacity: f32,
    texture: Option<String>,
    two_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shader: ShaderType::Standard,
            diffuse: Color::WHITE,
            specular: Color::BLACK,
            shininess: 0.0,
            opacity: 1.0,
            texture: None,
            two_sided: false,
        }
    }
}

impl Material {
    /// Standard material with a diffuse color
    pub fn with_diffuse(diffuse: Color) -> Self {
        Self { diffuse, ..Self::default() }
    }

    /// Shader program
    pub const fn shader(&self) -> ShaderType {
        self.shader
    }

    /// Whether this material is drawn in the transparent pass
    pub const fn is_transparent(&self) -> bool {
        self.shader.is_transparent()
    }

    /// Diffuse color
    pub const fn diffuse(&self) -> Color {
        self.diffuse
    }

    /// Specular color
    pub const fn specular(&self) -> Color {
        self.specular
    }

    /// Specular exponent
    pub const fn shininess(&self) -> f32 {
        self.shininess
    }

    /// Opacity in `[0, 1]`
    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Texture name, if any
    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    /// Whether back faces are drawn
    pub const fn is_two_sided(&self) -> bool {
        self.two_sided
    }

    /// Set the shader program
    pub fn set_shader(&mut self, shader: ShaderType) {
        self.shader = shader;
    }

    /// Set the diffuse color
    pub fn set_diffuse(&mut self, color: Color) {
        self.diffuse = color;
    }

    /// Set the specular color
    pub fn set_specular(&mut self, color: Color) {
        self.specular = color;
    }

    /// Set the specular exponent, clamped to be non-negative
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess.max(0.0);
    }

    /// Set the opacity, clamped to `[0, 1]`
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Set or clear the texture
    pub fn set_texture(&mut self, texture: Option<String>) {
        self.texture = texture;
    }

    /// Enable or disable back-face drawing
    pub fn set_two_sided(&mut self, two_sided: bool) {
        self.two_sided = two_sided;
    }
}
