//! Per-vertex RGBA diagnostic colors, laid out for direct GPU upload.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Linear RGBA color, one per vertex slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct VertexColor(pub [f32; 4]);

impl VertexColor {
    /// Unmarked vertex.
    pub const NONE: Self = Self([0.0, 0.0, 0.0, 0.0]);
    /// Vertex inside a contact zone.
    pub const CONTACT: Self = Self([0.0, 0.0, 1.0, 1.0]);

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b, 1.0])
    }
}

impl Default for VertexColor {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_cast_to_a_flat_buffer() {
        let colors = vec![VertexColor::CONTACT; 4];
        let bytes: &[u8] = bytemuck::cast_slice(&colors);
        assert_eq!(bytes.len(), 4 * 16);
        let floats: &[f32] = bytemuck::cast_slice(&colors);
        assert_eq!(floats[2], 1.0);
    }
}
