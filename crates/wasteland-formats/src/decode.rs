//! Full map block decoding
//!
//! Glues the container, carving, and area codecs together: an archive is
//! split into blocks, the map blocks are carved with their configured
//! dimensions, and each carved area is handed to its decoder.

use crate::action::{ActionTables, LootTable, SHOP_TABLE, TRANSITION_TABLE, TransitionTable};
use crate::carve::{Area, CarvedBlock, carve_block};
use crate::directory::{CentralDirectory, DirectoryEntry};
use crate::error::{FormatError, FormatResult, ResultExt};
use crate::layout::{ArchiveLayout, MapDim};
use crate::msq::{BlockBody, BlockDescriptor, parse_archive};
use crate::npc::NpcTable;
use crate::strings::StringsArea;

/// A map block with every area decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    /// Carved block; raw areas are read through it
    pub carved: CarvedBlock,
    /// The sixteen action tables
    pub action_tables: ActionTables,
    /// Typed view of the transition table
    pub transitions: TransitionTable,
    /// Typed view of the loot table
    pub loot: LootTable,
    /// NPC records
    pub npc_table: NpcTable,
    /// Strings area
    pub strings: StringsArea,
}

impl DecodedBlock {
    /// Central directory.
    pub fn directory(&self) -> &CentralDirectory {
        self.carved.directory()
    }

    /// Raw tile region.
    pub fn map_tiles(&self) -> &[u8] {
        self.carved.map_tiles()
    }

    /// Raw map info.
    pub fn map_info(&self) -> &[u8] {
        self.carved.map_info()
    }

    /// Raw special actions area.
    pub fn special_actions(&self) -> &[u8] {
        self.carved.area(Area::Directory(DirectoryEntry::SpecialActions))
    }

    /// Raw monster names area.
    pub fn monster_names(&self) -> &[u8] {
        self.carved.area(Area::Directory(DirectoryEntry::MonsterNames))
    }

    /// Raw shop table area.
    pub fn shop_data(&self) -> &[u8] {
        self.carved.action_table(SHOP_TABLE)
    }

    /// Raw monster data area.
    pub fn monster_data(&self) -> &[u8] {
        self.carved.area(Area::Directory(DirectoryEntry::MonsterData))
    }
}

/// Carve a map block body and decode each of its areas.
pub fn decode_block(body: BlockBody, dim: MapDim) -> FormatResult<DecodedBlock> {
    let carved = carve_block(body, dim)?;
    let action_tables = ActionTables::decode(&carved)?;

    let transitions_area = carved.action_table(TRANSITION_TABLE);
    let transitions = if transitions_area.is_empty() {
        TransitionTable::default()
    } else {
        let base = carved
            .directory()
            .pointer(DirectoryEntry::ActionTable(TRANSITION_TABLE as u8));
        TransitionTable::decode(transitions_area, usize::from(base))
            .with_context(|| format!("action table {TRANSITION_TABLE}"))?
    };

    let loot = action_tables.loot()?;

    let npc_span = carved.span(Area::Directory(DirectoryEntry::NpcTable));
    let npc_table = if npc_span.is_empty() {
        NpcTable::default()
    } else {
        NpcTable::decode(carved.bytes(npc_span), npc_span.start)
            .with_context(|| DirectoryEntry::NpcTable.to_string())?
            .0
    };

    let (strings, _) = StringsArea::decode(carved.area(Area::Directory(DirectoryEntry::Strings)))
        .with_context(|| DirectoryEntry::Strings.to_string())?;

    Ok(DecodedBlock {
        carved,
        action_tables,
        transitions,
        loot,
        npc_table,
        strings,
    })
}

/// An archive split into blocks, with its map blocks decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedArchive {
    /// Every block, map blocks first
    pub blocks: Vec<BlockDescriptor>,
    /// Decoded map blocks, one per configured map dimension
    pub maps: Vec<DecodedBlock>,
}

/// Parse an archive and decode its map blocks using `layout`.
pub fn decode_archive(data: &[u8], layout: &ArchiveLayout) -> FormatResult<DecodedArchive> {
    let blocks = parse_archive(data, layout.map_block_count)?;
    if blocks.len() < layout.map_block_count {
        return Err(FormatError::truncated(
            "map blocks",
            layout.map_block_count,
            blocks.len(),
        ));
    }

    let maps = blocks
        .iter()
        .enumerate()
        .take(layout.map_block_count)
        .map(|(index, block)| {
            let dim = layout.map_dim(index).ok_or_else(|| {
                FormatError::InvalidDimensions {
                    width: 0,
                    height: 0,
                }
                .context(format!("block {index}: no map dimensions configured"))
            })?;
            decode_block(block.body.clone(), dim).with_context(|| format!("block {index}"))
        })
        .collect::<FormatResult<Vec<_>>>()?;

    tracing::debug!(
        game_index = layout.game_index,
        blocks = blocks.len(),
        maps = maps.len(),
        "decoded archive"
    );
    Ok(DecodedArchive { blocks, maps })
}
