//! Pixel-space viewport rectangles

use serde::{Deserialize, Serialize};

use crate::error::{config_error, Result};

/// Integer screen rectangle assigned to one eye (or the whole display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    /// Checked constructor; negative sizes are rejected.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self> {
        let mut viewport = Self::default();
        viewport.set_viewport(x, y, width, height)?;
        Ok(viewport)
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        if width < 0 || height < 0 {
            return Err(config_error(format!(
                "viewport size must be non-negative, got {width}x{height}"
            )));
        }
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Arguments for `glViewport` / `RenderPass::set_viewport`.
    pub fn gl_viewport(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.width, self.height)
    }

    /// Arguments for `glScissor` / `RenderPass::set_scissor_rect`.
    pub fn gl_scissor(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.width, self.height)
    }

    /// `[x, y, width, height]` as floats, for uniforms and UI rects.
    pub fn to_rect(&self) -> [f32; 4] {
        [
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        ]
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive top edge.
    pub fn top(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.top()
    }

    pub fn overlaps(&self, other: &Viewport) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}
