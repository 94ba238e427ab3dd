//! Map block area carving
//!
//! A map block's secure region starts with three fixed areas, followed by
//! the areas the central directory points at:
//!
//! ```text
//! Secure region:
//! ├── Map tiles (width × height × 3 / 2)
//! ├── Central directory (42 bytes)
//! ├── Map info (50 bytes)
//! └── Directory areas (any order, some empty)
//! Plain region:
//! └── Strings area
//! ```
//!
//! Carving never copies: a [`CarvedBlock`] owns the [`BlockBody`] and records
//! each area as an [`AreaSpan`] into one of its two regions.

use crate::directory::{ACTION_TABLE_COUNT, CentralDirectory, DIRECTORY_LEN, DirectoryEntry};
use crate::error::{FormatError, FormatResult, ResultExt};
use crate::layout::MapDim;
use crate::msq::BlockBody;
use crate::npc::NpcTable;
use crate::strings::StringsArea;

/// Size of the map info area
pub const MAP_INFO_LEN: usize = 50;

/// Block region an area lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Decrypted secure region
    Secure,
    /// Plain region
    Plain,
}

/// Byte range of an area within a block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaSpan {
    /// Region the range indexes
    pub region: Region,
    /// Offset of the first byte
    pub start: usize,
    /// Length in bytes
    pub len: usize,
}

impl AreaSpan {
    /// Span in the secure region.
    pub const fn secure(start: usize, len: usize) -> Self {
        Self {
            region: Region::Secure,
            start,
            len,
        }
    }

    /// Span in the plain region.
    pub const fn plain(start: usize, len: usize) -> Self {
        Self {
            region: Region::Plain,
            start,
            len,
        }
    }

    /// One past the last byte.
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    /// Whether the area has no bytes.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check that a replacement of `replacement_len` bytes fits exactly.
    pub fn ensure_len(&self, replacement_len: usize) -> FormatResult<()> {
        if replacement_len != self.len {
            return Err(FormatError::SizeMismatch {
                expected: self.len,
                actual: replacement_len,
            });
        }
        Ok(())
    }
}

/// Every carved area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// Tile action classes and selectors
    MapTiles,
    /// The central directory itself
    CentralDirectory,
    /// Map info
    MapInfo,
    /// An area named by the central directory
    Directory(DirectoryEntry),
}

impl Area {
    /// All areas, fixed areas first, then directory entries in on-disk order.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::MapTiles, Self::CentralDirectory, Self::MapInfo]
            .into_iter()
            .chain(
                [
                    DirectoryEntry::Strings,
                    DirectoryEntry::MonsterNames,
                    DirectoryEntry::MonsterData,
                ]
                .into_iter()
                .chain((0..ACTION_TABLE_COUNT as u8).map(DirectoryEntry::ActionTable))
                .chain([DirectoryEntry::SpecialActions, DirectoryEntry::NpcTable])
                .map(Self::Directory),
            )
    }
}

/// A map block split into its areas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarvedBlock {
    body: BlockBody,
    dim: MapDim,
    directory: CentralDirectory,
    map_tiles: AreaSpan,
    central_directory: AreaSpan,
    map_info: AreaSpan,
    strings: AreaSpan,
    monster_names: AreaSpan,
    monster_data: AreaSpan,
    action_tables: [AreaSpan; ACTION_TABLE_COUNT],
    special_actions: AreaSpan,
    npc_table: AreaSpan,
}

fn fixed_span(secure: &[u8], start: usize, len: usize, what: &'static str) -> FormatResult<AreaSpan> {
    if start + len > secure.len() {
        return Err(FormatError::truncated(what, start + len, secure.len()));
    }
    Ok(AreaSpan::secure(start, len))
}

fn directory_span(
    body: &BlockBody,
    directory: &CentralDirectory,
    entry: DirectoryEntry,
) -> FormatResult<AreaSpan> {
    // The strings area always fills the start of the plain region,
    // whatever its pointer says.
    if entry == DirectoryEntry::Strings {
        let (_, len) = StringsArea::decode(&body.plain)?;
        return Ok(AreaSpan::plain(0, len));
    }

    let secure = &body.secure;
    let pointer = usize::from(directory.pointer(entry));
    if directory.is_empty_area(entry) {
        // A shared pointer is only range-checked for the area that owns it.
        return Ok(AreaSpan::secure(pointer.min(secure.len()), 0));
    }

    match entry {
        DirectoryEntry::NpcTable => {
            let source = secure.get(pointer..).ok_or_else(|| {
                FormatError::InvalidPointer(format!(
                    "NPC table at {pointer:#06x} is past the secure region ({} bytes)",
                    secure.len()
                ))
            })?;
            let (_, len) = NpcTable::decode(source, pointer)?;
            Ok(AreaSpan::secure(pointer, len))
        }
        _ => {
            let end = directory.area_end(entry, secure.len());
            if end > secure.len() || pointer > end {
                return Err(FormatError::InvalidPointer(format!(
                    "area [{pointer:#06x}, {end:#06x}) extends past the secure region ({} bytes)",
                    secure.len()
                )));
            }
            Ok(AreaSpan::secure(pointer, end - pointer))
        }
    }
}

/// Carve a map block into its areas.
pub fn carve_block(body: BlockBody, dim: MapDim) -> FormatResult<CarvedBlock> {
    dim.validate()?;
    let secure = &body.secure;

    let map_tiles = fixed_span(secure, 0, dim.tiles_len(), "map tiles")?;
    let central_directory = fixed_span(secure, map_tiles.end(), DIRECTORY_LEN, "central directory")?;
    let directory = CentralDirectory::decode(&secure[central_directory.start..])?;
    let map_info = fixed_span(secure, central_directory.end(), MAP_INFO_LEN, "map info")?;

    let span = |entry: DirectoryEntry| {
        directory_span(&body, &directory, entry).with_context(|| entry.to_string())
    };

    let strings = span(DirectoryEntry::Strings)?;
    let monster_names = span(DirectoryEntry::MonsterNames)?;
    let monster_data = span(DirectoryEntry::MonsterData)?;
    let mut action_tables = [AreaSpan::secure(0, 0); ACTION_TABLE_COUNT];
    for (i, table) in action_tables.iter_mut().enumerate() {
        *table = span(DirectoryEntry::ActionTable(i as u8))?;
    }
    let special_actions = span(DirectoryEntry::SpecialActions)?;
    let npc_table = span(DirectoryEntry::NpcTable)?;

    tracing::debug!(
        width = dim.width,
        height = dim.height,
        secure_len = body.secure.len(),
        plain_len = body.plain.len(),
        strings_len = strings.len,
        npc_table_len = npc_table.len,
        "carved map block"
    );

    Ok(CarvedBlock {
        body,
        dim,
        directory,
        map_tiles,
        central_directory,
        map_info,
        strings,
        monster_names,
        monster_data,
        action_tables,
        special_actions,
        npc_table,
    })
}

impl CarvedBlock {
    /// Underlying block body.
    pub fn body(&self) -> &BlockBody {
        &self.body
    }

    /// Take back the block body.
    pub fn into_body(self) -> BlockBody {
        self.body
    }

    /// Map dimensions used to carve the block.
    pub fn dim(&self) -> MapDim {
        self.dim
    }

    /// Decoded central directory.
    pub fn directory(&self) -> &CentralDirectory {
        &self.directory
    }

    /// Span of `area`.
    pub fn span(&self, area: Area) -> AreaSpan {
        match area {
            Area::MapTiles => self.map_tiles,
            Area::CentralDirectory => self.central_directory,
            Area::MapInfo => self.map_info,
            Area::Directory(entry) => match entry {
                DirectoryEntry::Strings => self.strings,
                DirectoryEntry::MonsterNames => self.monster_names,
                DirectoryEntry::MonsterData => self.monster_data,
                DirectoryEntry::ActionTable(i) => self.action_tables[usize::from(i)],
                DirectoryEntry::SpecialActions => self.special_actions,
                DirectoryEntry::NpcTable => self.npc_table,
            },
        }
    }

    /// Bytes covered by `span`.
    pub fn bytes(&self, span: AreaSpan) -> &[u8] {
        let region = match span.region {
            Region::Secure => &self.body.secure,
            Region::Plain => &self.body.plain,
        };
        region.get(span.start..span.end()).unwrap_or_default()
    }

    /// Bytes of `area`.
    pub fn area(&self, area: Area) -> &[u8] {
        self.bytes(self.span(area))
    }

    /// Tile region.
    pub fn map_tiles(&self) -> &[u8] {
        self.area(Area::MapTiles)
    }

    /// Map info area.
    pub fn map_info(&self) -> &[u8] {
        self.area(Area::MapInfo)
    }

    /// Action table `index`.
    pub fn action_table(&self, index: usize) -> &[u8] {
        self.bytes(self.action_tables[index])
    }

    /// Size of every area.
    pub fn sizes(&self) -> Vec<(Area, usize)> {
        Area::all().map(|area| (area, self.span(area).len)).collect()
    }

    /// Offset of every area within its region.
    pub fn offsets(&self) -> Vec<(Area, AreaSpan)> {
        Area::all().map(|area| (area, self.span(area))).collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::MsqFormat;
    use pretty_assertions::assert_eq;

    const DIM: MapDim = MapDim::new(4, 2);

    /// Secure region for a 4x2 map: 12 tile bytes, directory at 12, map info
    /// at 54, directory areas from 104.
    fn secure_region(directory: &CentralDirectory, areas: &[u8]) -> Vec<u8> {
        let mut secure = vec![0x11; DIM.tiles_len()];
        secure.extend(directory.build().unwrap());
        secure.extend_from_slice(&[0x22; MAP_INFO_LEN]);
        secure.extend_from_slice(areas);
        secure
    }

    fn strings_area() -> Vec<u8> {
        let mut plain = vec![0x20, 0x65];
        plain.resize(60, b'a');
        plain.extend_from_slice(&[0x04, 0x00, 0x05, 0x00]);
        plain.extend_from_slice(&[0x00; 12]);
        plain
    }

    #[test]
    fn test_carve_areas() {
        let directory = CentralDirectory {
            strings: 0,
            monster_names: 110,
            monster_data: 112,
            action_tables: [104, 0, 0, 0, 0, 0, 0, 0, 0, 0, 107, 0, 0, 0, 0, 0],
            special_actions: 0,
            npc_table: 0,
        };
        let areas = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let body = BlockBody::new(secure_region(&directory, &areas), strings_area());

        let carved = carve_block(body, DIM).unwrap();
        assert_eq!(carved.map_tiles(), &[0x11; 12]);
        assert_eq!(carved.map_info(), &[0x22; MAP_INFO_LEN]);
        assert_eq!(carved.directory(), &directory);

        assert_eq!(carved.action_table(0), &[1, 2, 3]);
        assert_eq!(carved.action_table(10), &[4, 5, 6]);
        assert_eq!(carved.area(Area::Directory(DirectoryEntry::MonsterNames)), &[7, 8]);
        assert_eq!(carved.area(Area::Directory(DirectoryEntry::MonsterData)), &[9, 10]);
        assert!(carved.action_table(1).is_empty());

        let strings = carved.span(Area::Directory(DirectoryEntry::Strings));
        assert_eq!(strings, AreaSpan::plain(0, 60 + 4 + 10));
    }

    #[test]
    fn test_shared_pointer_goes_to_higher_priority() {
        // Special actions (rank 0) and action table 3 (rank 5) share 104.
        let directory = CentralDirectory {
            action_tables: [0, 0, 0, 104, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            special_actions: 104,
            ..CentralDirectory::default()
        };
        let body = BlockBody::new(secure_region(&directory, &[0xaa; 6]), strings_area());

        let carved = carve_block(body, DIM).unwrap();
        assert!(carved.span(Area::Directory(DirectoryEntry::SpecialActions)).is_empty());
        assert_eq!(carved.action_table(3), &[0xaa; 6]);
    }

    #[test]
    fn test_npc_table_sized_by_decoder() {
        let mut areas = vec![0x00, 0x00, 0x6c, 0x00];
        areas.extend_from_slice(&[0x33; 256]);
        areas.extend_from_slice(&[0x44; 8]);

        let directory = CentralDirectory {
            npc_table: 104,
            action_tables: [364, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            ..CentralDirectory::default()
        };
        let body = BlockBody::new(secure_region(&directory, &areas), strings_area());

        let carved = carve_block(body, DIM).unwrap();
        assert_eq!(
            carved.span(Area::Directory(DirectoryEntry::NpcTable)),
            AreaSpan::secure(104, 260)
        );
        assert_eq!(carved.action_table(0), &[0x44; 8]);
    }

    #[test]
    fn test_odd_width_rejected() {
        let body = BlockBody::new(vec![0; 200], strings_area());
        assert!(matches!(
            carve_block(body, MapDim::new(3, 2)),
            Err(FormatError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_short_secure_region() {
        let body = BlockBody::new(vec![0; 20], Vec::new());
        let err = carve_block(body, DIM).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { what: "central directory", .. }));
    }

    #[test]
    fn test_area_past_secure_region() {
        let directory = CentralDirectory {
            action_tables: [104, 200, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            ..CentralDirectory::default()
        };
        let body = BlockBody::new(secure_region(&directory, &[0; 4]), strings_area());

        let err = carve_block(body, DIM).unwrap_err();
        assert_eq!(
            err.to_string().split(':').next(),
            Some("action table 0")
        );
        assert!(matches!(err.root_cause(), FormatError::InvalidPointer(_)));
    }

    #[test]
    fn test_shared_pointer_past_secure_region() {
        // The NPC table loses 0xffff to the strings area, whose pointer is
        // never read, so its empty span must still lie inside the region.
        let directory = CentralDirectory {
            strings: 0xffff,
            npc_table: 0xffff,
            ..CentralDirectory::default()
        };
        let secure = secure_region(&directory, &[0x55; 4]);
        let secure_len = secure.len();
        let carved = carve_block(BlockBody::new(secure, strings_area()), DIM).unwrap();

        let npc = carved.span(Area::Directory(DirectoryEntry::NpcTable));
        assert_eq!(npc, AreaSpan::secure(secure_len, 0));
        assert!(carved.bytes(npc).is_empty());
        assert!(carved.bytes(AreaSpan::secure(0x1_0000, 4)).is_empty());
    }

    #[test]
    fn test_sizes_and_offsets() {
        let directory = CentralDirectory {
            action_tables: [104, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            ..CentralDirectory::default()
        };
        let body = BlockBody::new(secure_region(&directory, &[0; 4]), strings_area());
        let carved = carve_block(body, DIM).unwrap();

        let sizes = carved.sizes();
        assert_eq!(sizes.len(), 3 + 21);
        assert_eq!(sizes[0], (Area::MapTiles, 12));
        assert_eq!(sizes[1], (Area::CentralDirectory, DIRECTORY_LEN));
        assert_eq!(sizes[2], (Area::MapInfo, MAP_INFO_LEN));

        let offsets = carved.offsets();
        assert_eq!(offsets[2].1, AreaSpan::secure(54, MAP_INFO_LEN));

        let table0 = carved.span(Area::Directory(DirectoryEntry::ActionTable(0)));
        assert!(table0.ensure_len(4).is_ok());
        assert!(matches!(
            table0.ensure_len(5),
            Err(FormatError::SizeMismatch {
                expected: 4,
                actual: 5
            })
        ));
    }
}
