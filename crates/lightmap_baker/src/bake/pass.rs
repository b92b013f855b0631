//! Progressive refinement schedule
//!
//! A triangle is swept seven times. The first sweep samples every fourth
//! texel on both axes; each later sweep fills the gaps of the previous ones
//! and may interpolate from neighbors that are already baked. The layout of
//! one 4x4 block (digits are pass indices):
//!
//! ```text
//! 0 4 1 4 0
//! 5 6 5 6 5
//! 2 4 3 4 2
//! 5 6 5 6 5
//! 0 4 1 4 0
//! ```

use bitflags::bitflags;

use crate::foundation::math::IVec2;

bitflags! {
    /// Axes along which a pass looks for interpolation neighbors
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InterpolateAxes: u8 {
        /// Neighbors at `(x - d, y)` and `(x + d, y)`
        const X = 0b01;
        /// Neighbors at `(x, y - d)` and `(x, y + d)`
        const Y = 0b10;
    }
}

/// One sweep of the progressive schedule. Transitions are strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RasterPass {
    /// Stride 4, no interpolation
    Space4A,
    /// Stride 4, offset (2, 0), interpolate along X
    Space2BX,
    /// Stride 4, offset (0, 2), interpolate along Y
    Space2BY,
    /// Stride 4, offset (2, 2), interpolate along X and Y
    Space4C,
    /// Stride 2, offset (1, 0), interpolate along X
    Space1DX,
    /// Stride 2, offset (0, 1), interpolate along Y
    Space1DY,
    /// Stride 2, offset (1, 1), interpolate along X and Y
    Space1E,
    /// All sweeps complete
    Done,
}

impl RasterPass {
    /// Every walkable pass in schedule order
    pub const ALL: [RasterPass; 7] = [
        RasterPass::Space4A,
        RasterPass::Space2BX,
        RasterPass::Space2BY,
        RasterPass::Space4C,
        RasterPass::Space1DX,
        RasterPass::Space1DY,
        RasterPass::Space1E,
    ];

    /// The pass that follows this one
    pub fn next(self) -> Self {
        match self {
            Self::Space4A => Self::Space2BX,
            Self::Space2BX => Self::Space2BY,
            Self::Space2BY => Self::Space4C,
            Self::Space4C => Self::Space1DX,
            Self::Space1DX => Self::Space1DY,
            Self::Space1DY => Self::Space1E,
            Self::Space1E | Self::Done => Self::Done,
        }
    }

    /// Texel step on both axes
    pub fn stride(self) -> i32 {
        match self {
            Self::Space4A | Self::Space2BX | Self::Space2BY | Self::Space4C => 4,
            Self::Space1DX | Self::Space1DY | Self::Space1E | Self::Done => 2,
        }
    }

    /// Offset of the first texel from the triangle's bbox origin
    pub fn offset(self) -> IVec2 {
        match self {
            Self::Space4A | Self::Done => IVec2::new(0, 0),
            Self::Space2BX => IVec2::new(2, 0),
            Self::Space2BY => IVec2::new(0, 2),
            Self::Space4C => IVec2::new(2, 2),
            Self::Space1DX => IVec2::new(1, 0),
            Self::Space1DY => IVec2::new(0, 1),
            Self::Space1E => IVec2::new(1, 1),
        }
    }

    /// Axes checked by the interpolation heuristic
    pub fn interpolate_axes(self) -> InterpolateAxes {
        match self {
            Self::Space4A | Self::Done => InterpolateAxes::empty(),
            Self::Space2BX | Self::Space1DX => InterpolateAxes::X,
            Self::Space2BY | Self::Space1DY => InterpolateAxes::Y,
            Self::Space4C | Self::Space1E => InterpolateAxes::X | InterpolateAxes::Y,
        }
    }

    /// Distance to the interpolation neighbors
    pub fn neighbor_distance(self) -> i32 {
        self.stride() / 2
    }

    /// Whether texels in this pass may be interpolated instead of sampled
    pub fn can_interpolate(self) -> bool {
        !self.interpolate_axes().is_empty()
    }

    /// Id used in checkpoints
    pub fn id(self) -> i32 {
        match self {
            Self::Space4A => 0,
            Self::Space2BX => 1,
            Self::Space2BY => 2,
            Self::Space4C => 3,
            Self::Space1DX => 4,
            Self::Space1DY => 5,
            Self::Space1E => 6,
            Self::Done => 7,
        }
    }

    /// Pass for a checkpoint id
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::Space4A),
            1 => Some(Self::Space2BX),
            2 => Some(Self::Space2BY),
            3 => Some(Self::Space4C),
            4 => Some(Self::Space1DX),
            5 => Some(Self::Space1DY),
            6 => Some(Self::Space1E),
            7 => Some(Self::Done),
            _ => None,
        }
    }
}
