//! Pointer snapshot shared between the event adapter and the control tick.

use glam::Vec2;
use std::sync::atomic::{AtomicU64, Ordering};

/// Normalized pointer position over the surface, or absent when it is outside.
///
/// Coordinates are in `[0, 1]` with the origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PointerState {
    #[default]
    Absent,
    Present(Vec2),
}

/// Bounding box of the surface in client pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PointerState {
    /// Pointer at a normalized position. Values are clamped to the unit square;
    /// non-finite input is treated as absent.
    pub fn present(x: f32, y: f32) -> Self {
        if !x.is_finite() || !y.is_finite() {
            return PointerState::Absent;
        }
        PointerState::Present(Vec2::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
    }

    /// Normalize a client-pixel position against the surface rectangle.
    #[inline]
    pub fn from_surface(x_px: f32, y_px: f32, rect: SurfaceRect) -> Self {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return PointerState::Absent;
        }
        Self::present(
            (x_px - rect.left) / rect.width,
            (y_px - rect.top) / rect.height,
        )
    }

    #[inline]
    pub fn position(&self) -> Option<Vec2> {
        match self {
            PointerState::Present(p) => Some(*p),
            PointerState::Absent => None,
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        matches!(self, PointerState::Present(_))
    }
}

// NaN payload that clamped coordinates can never produce
const ABSENT_BITS: u64 = u64::MAX;

/// Single-writer/single-reader pointer snapshot.
///
/// Both coordinates are packed into one atomic word so a reader never sees
/// the x of one event paired with the y of another.
#[derive(Debug)]
pub struct PointerCell {
    bits: AtomicU64,
}

impl Default for PointerCell {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerCell {
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(ABSENT_BITS),
        }
    }

    pub fn store(&self, state: PointerState) {
        self.bits.store(pack(state), Ordering::Release);
    }

    pub fn clear(&self) {
        self.store(PointerState::Absent);
    }

    pub fn load(&self) -> PointerState {
        unpack(self.bits.load(Ordering::Acquire))
    }
}

fn pack(state: PointerState) -> u64 {
    match state {
        PointerState::Absent => ABSENT_BITS,
        PointerState::Present(p) => ((p.x.to_bits() as u64) << 32) | p.y.to_bits() as u64,
    }
}

fn unpack(bits: u64) -> PointerState {
    if bits == ABSENT_BITS {
        return PointerState::Absent;
    }
    let x = f32::from_bits((bits >> 32) as u32);
    let y = f32::from_bits(bits as u32);
    PointerState::Present(Vec2::new(x, y))
}
