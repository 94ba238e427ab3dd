//! Archive layout configuration
//!
//! Nothing inside an archive says which blocks hold maps or how large each
//! map is, yet both facts drive boundary inference: map blocks use the
//! strings-area lookahead when detecting the end of their secure region, and
//! carving needs the map dimensions to size the tile region. This module
//! holds those facts as configuration, with built-in values for the two
//! shipped archives, loadable from and savable to JSON.
//!
//! ```rust
//! use wasteland_formats::layout::GameLayout;
//!
//! let layout = GameLayout::default();
//! assert_eq!(layout.archive(0).map(|a| a.map_block_count), Some(20));
//!
//! let json = layout.to_json()?;
//! let reloaded = GameLayout::from_json(&json)?;
//! assert_eq!(reloaded, layout);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{FormatError, FormatResult};

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Layout JSON could not be parsed or written
    #[error("invalid layout JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Map dimension count does not match the number of map blocks
    #[error("archive {game_index}: {map_block_count} map blocks but {dims} map dimensions")]
    DimensionCount {
        /// Archive game index
        game_index: u8,
        /// Declared map block count
        map_block_count: usize,
        /// Number of dimensions supplied
        dims: usize,
    },

    /// Game index outside the range the block header can encode
    #[error("invalid game index {0}: must be 0 or 1")]
    InvalidGameIndex(u8),

    /// A map dimension is unusable
    #[error("archive {game_index}, block {block}: {source}")]
    InvalidMap {
        /// Archive game index
        game_index: u8,
        /// Map block index
        block: usize,
        /// Underlying dimension error
        #[source]
        source: FormatError,
    },
}

/// Dimensions of a block's tile map, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapDim {
    /// Tiles per row; must be even because two action classes share a byte
    pub width: usize,
    /// Number of rows
    pub height: usize,
}

impl MapDim {
    /// Create map dimensions.
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Square map.
    pub const fn square(side: usize) -> Self {
        Self::new(side, side)
    }

    /// Size of the tile region: half a byte of action class plus one byte of
    /// action selector per tile.
    pub const fn tiles_len(self) -> usize {
        self.width * self.height * 3 / 2
    }

    /// Reject dimensions that cannot be packed into a tile region.
    pub fn validate(self) -> FormatResult<()> {
        if self.width % 2 != 0 {
            return Err(FormatError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Layout of one archive file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLayout {
    /// Game index written in each block header (`0` for GAME1, `1` for GAME2)
    pub game_index: u8,
    /// Number of leading blocks that hold maps
    pub map_block_count: usize,
    /// Map dimensions, one per map block
    pub map_dims: Vec<MapDim>,
}

const LARGE: MapDim = MapDim::square(64);
const SMALL: MapDim = MapDim::square(32);

impl ArchiveLayout {
    /// Layout of the shipped GAME1 archive.
    pub fn game1() -> Self {
        let mut map_dims = vec![SMALL; 20];
        // World map and Needles.
        map_dims[0] = LARGE;
        map_dims[10] = LARGE;

        Self {
            game_index: 0,
            map_block_count: map_dims.len(),
            map_dims,
        }
    }

    /// Layout of the shipped GAME2 archive.
    pub fn game2() -> Self {
        let mut map_dims = vec![SMALL; 22];
        // Las Vegas and Darwin base.
        map_dims[2] = LARGE;
        map_dims[11] = LARGE;

        Self {
            game_index: 1,
            map_block_count: map_dims.len(),
            map_dims,
        }
    }

    /// Map dimensions of block `index`, if it is a map block.
    pub fn map_dim(&self, index: usize) -> Option<MapDim> {
        if index < self.map_block_count {
            self.map_dims.get(index).copied()
        } else {
            None
        }
    }

    /// Validate the layout
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.game_index > 1 {
            return Err(LayoutError::InvalidGameIndex(self.game_index));
        }

        if self.map_dims.len() != self.map_block_count {
            return Err(LayoutError::DimensionCount {
                game_index: self.game_index,
                map_block_count: self.map_block_count,
                dims: self.map_dims.len(),
            });
        }

        for (block, dim) in self.map_dims.iter().enumerate() {
            dim.validate().map_err(|source| LayoutError::InvalidMap {
                game_index: self.game_index,
                block,
                source,
            })?;
        }

        Ok(())
    }
}

/// Layout of a full game installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLayout {
    /// Archive layouts, indexed by game index
    pub archives: Vec<ArchiveLayout>,
}

impl Default for GameLayout {
    fn default() -> Self {
        Self {
            archives: vec![ArchiveLayout::game1(), ArchiveLayout::game2()],
        }
    }
}

impl GameLayout {
    /// Layout for the archive with the given game index.
    pub fn archive(&self, game_index: u8) -> Option<&ArchiveLayout> {
        self.archives.iter().find(|a| a.game_index == game_index)
    }

    /// Parse and validate a layout from JSON.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Serialize the layout as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every archive layout.
    pub fn validate(&self) -> Result<(), LayoutError> {
        self.archives.iter().try_for_each(ArchiveLayout::validate)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = GameLayout::default();
        assert!(layout.validate().is_ok());

        let game1 = layout.archive(0).expect("GAME1 layout");
        assert_eq!(game1.map_block_count, 20);
        assert_eq!(game1.map_dim(0), Some(MapDim::square(64)));
        assert_eq!(game1.map_dim(1), Some(MapDim::square(32)));
        assert_eq!(game1.map_dim(20), None);

        let game2 = layout.archive(1).expect("GAME2 layout");
        assert_eq!(game2.map_block_count, 22);
        assert_eq!(game2.map_dim(2), Some(MapDim::square(64)));
        assert_eq!(game2.map_dim(11), Some(MapDim::square(64)));
    }

    #[test]
    fn test_tiles_len() {
        assert_eq!(MapDim::square(32).tiles_len(), 1536);
        assert_eq!(MapDim::square(64).tiles_len(), 6144);
        assert_eq!(MapDim::new(2, 1).tiles_len(), 3);
    }

    #[test]
    fn test_odd_width_rejected() {
        let err = MapDim::new(3, 4).validate().unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidDimensions {
                width: 3,
                height: 4
            }
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let layout = GameLayout::default();
        let json = layout.to_json().unwrap();
        assert_eq!(GameLayout::from_json(&json).unwrap(), layout);
    }

    #[test]
    fn test_json_dimension_count_mismatch() {
        let json = r#"{"archives":[{"game_index":0,"map_block_count":2,"map_dims":[{"width":32,"height":32}]}]}"#;
        let err = GameLayout::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::DimensionCount {
                map_block_count: 2,
                dims: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_json_bad_game_index() {
        let json = r#"{"archives":[{"game_index":2,"map_block_count":0,"map_dims":[]}]}"#;
        assert!(matches!(
            GameLayout::from_json(json),
            Err(LayoutError::InvalidGameIndex(2))
        ));
    }
}
