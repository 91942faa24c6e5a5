//! Light component

use serde::{Deserialize, Serialize};

use crate::render::Color;

/// Types of lights supported by the lighting system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightType {
    /// Spot light that creates a cone of light from a position
    Spot,
    /// Point light that radiates in all directions from a position
    Point,
    /// Directional light (like sunlight) with parallel rays
    Directional,
}

/// Light source attached to an entity
///
/// Position and direction come from the owning entity's transform; the
/// light faces along the transform's forward axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    light_type: LightType,
    color: Color,
    intensity: f32,
    range: f32,
    spot_outer_angle: f32,
    spot_inner_angle: f32,
    enabled: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
            spot_outer_angle: 15.0,
            spot_inner_angle: 10.0,
            enabled: true,
        }
    }
}

impl Light {
    /// Light of the given type with default parameters
    ///
    /// Directional lights start at half intensity.
    pub fn new(light_type: LightType) -> Self {
        let intensity = if light_type == LightType::Directional { 0.5 } else { 1.0 };
        Self {
            light_type,
            intensity,
            ..Self::default()
        }
    }

    /// Directional light
    pub fn directional(color: Color, intensity: f32) -> Self {
        let mut light = Self::new(LightType::Directional);
        light.set_color(color);
        light.set_intensity(intensity);
        light
    }

    /// Point light reaching `range` world units
    pub fn point(color: Color, intensity: f32, range: f32) -> Self {
        let mut light = Self::new(LightType::Point);
        light.set_color(color);
        light.set_intensity(intensity);
        light.set_range(range);
        light
    }

    /// Spot light with cone angles in degrees
    pub fn spot(color: Color, intensity: f32, range: f32, inner_angle: f32, outer_angle: f32) -> Self {
        let mut light = Self::point(color, intensity, range);
        light.light_type = LightType::Spot;
        light.set_spot_inner_angle(inner_angle);
        light.set_spot_outer_angle(outer_angle);
        light
    }

    /// Spot, point or directional
    pub const fn light_type(&self) -> LightType {
        self.light_type
    }

    /// Emitted color
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Brightness multiplier
    pub const fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Reach of point and spot lights
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Outer cone angle in degrees
    pub const fn spot_outer_angle(&self) -> f32 {
        self.spot_outer_angle
    }

    /// Inner cone angle in degrees
    pub const fn spot_inner_angle(&self) -> f32 {
        self.spot_inner_angle
    }

    /// Whether the light is bound when rendering
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bind the light again
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop binding the light
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Change the light type
    pub fn set_light_type(&mut self, light_type: LightType) {
        self.light_type = light_type;
    }

    /// Change the light color
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Negative intensities clamp to zero
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    /// Negative ranges clamp to zero
    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.0);
    }

    /// Clamped to 0..=90 degrees
    pub fn set_spot_outer_angle(&mut self, degrees: f32) {
        self.spot_outer_angle = degrees.clamp(0.0, 90.0);
    }

    /// Clamped to 0..=90 degrees
    pub fn set_spot_inner_angle(&mut self, degrees: f32) {
        self.spot_inner_angle = degrees.clamp(0.0, 90.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_defaults_to_half_intensity() {
        let light = Light::new(LightType::Directional);
        assert_eq!(light.intensity(), 0.5);
        assert_eq!(Light::new(LightType::Point).intensity(), 1.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut light = Light::spot(Color::WHITE, 1.0, 5.0, 10.0, 20.0);
        light.set_intensity(-3.0);
        light.set_range(-1.0);
        light.set_spot_outer_angle(120.0);
        light.set_spot_inner_angle(-5.0);
        assert_eq!(light.intensity(), 0.0);
        assert_eq!(light.range(), 0.0);
        assert_eq!(light.spot_outer_angle(), 90.0);
        assert_eq!(light.spot_inner_angle(), 0.0);
        assert_eq!(light.light_type(), LightType::Spot);
    }
}
