//! Central directory of a map block
//!
//! The directory follows the tile region and holds 21 little-endian pointers
//! into the secure region, in this on-disk order:
//!
//! ```text
//! Central directory (42 bytes):
//! ├── strings (u16)
//! ├── monster names (u16)
//! ├── monster data (u16)
//! ├── action tables (16 × u16)
//! ├── special actions (u16)
//! └── NPC table (u16)
//! ```
//!
//! Areas are not stored in directory order and some are empty. An empty area
//! either has a zero pointer or shares its pointer with an entry of higher
//! priority; see [`PRIORITY_ORDER`].

use std::fmt;

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use crate::MsqFormat;
use crate::error::{FormatError, FormatResult};

/// Encoded directory size in bytes
pub const DIRECTORY_LEN: usize = 42;

/// Number of action tables in a map block
pub const ACTION_TABLE_COUNT: usize = 16;

/// A directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryEntry {
    /// Special actions area
    SpecialActions,
    /// NPC table
    NpcTable,
    /// Action table `0..16`
    ActionTable(u8),
    /// Monster names
    MonsterNames,
    /// Monster data
    MonsterData,
    /// Strings area
    Strings,
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpecialActions => f.write_str("special actions"),
            Self::NpcTable => f.write_str("NPC table"),
            Self::ActionTable(i) => write!(f, "action table {i}"),
            Self::MonsterNames => f.write_str("monster names"),
            Self::MonsterData => f.write_str("monster data"),
            Self::Strings => f.write_str("strings"),
        }
    }
}

const fn action_tables_in_priority() -> [DirectoryEntry; 21] {
    let mut order = [DirectoryEntry::SpecialActions; 21];
    order[1] = DirectoryEntry::NpcTable;
    let mut i = 0;
    while i < ACTION_TABLE_COUNT {
        order[2 + i] = DirectoryEntry::ActionTable(i as u8);
        i += 1;
    }
    order[18] = DirectoryEntry::MonsterNames;
    order[19] = DirectoryEntry::MonsterData;
    order[20] = DirectoryEntry::Strings;
    order
}

/// Entries from lowest to highest priority.
///
/// When two entries share a pointer, the higher-priority one owns the area
/// and the other is empty.
pub const PRIORITY_ORDER: [DirectoryEntry; 21] = action_tables_in_priority();

impl DirectoryEntry {
    /// Position in [`PRIORITY_ORDER`].
    pub const fn rank(self) -> usize {
        match self {
            Self::SpecialActions => 0,
            Self::NpcTable => 1,
            Self::ActionTable(i) => 2 + i as usize,
            Self::MonsterNames => 18,
            Self::MonsterData => 19,
            Self::Strings => 20,
        }
    }
}

/// Central directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct CentralDirectory {
    /// Strings area
    pub strings: u16,
    /// Monster names
    pub monster_names: u16,
    /// Monster data
    pub monster_data: u16,
    /// Action tables
    pub action_tables: [u16; ACTION_TABLE_COUNT],
    /// Special actions
    pub special_actions: u16,
    /// NPC table
    pub npc_table: u16,
}

impl CentralDirectory {
    /// Decode a directory from the first 42 bytes of `data`.
    pub fn decode(data: &[u8]) -> FormatResult<Self> {
        if data.len() < DIRECTORY_LEN {
            return Err(FormatError::truncated(
                "central directory",
                DIRECTORY_LEN,
                data.len(),
            ));
        }
        let directory = Self::read(&mut Cursor::new(&data[..DIRECTORY_LEN]))?;
        tracing::debug!(?directory, "read central directory");
        Ok(directory)
    }

    /// Build a directory from pointers given in [`PRIORITY_ORDER`].
    pub fn from_priority_pointers(pointers: [u16; 21]) -> Self {
        let mut directory = Self::default();
        for (entry, pointer) in PRIORITY_ORDER.into_iter().zip(pointers) {
            directory.set(entry, pointer);
        }
        directory
    }

    /// Pointer of `entry`.
    pub fn pointer(&self, entry: DirectoryEntry) -> u16 {
        match entry {
            DirectoryEntry::SpecialActions => self.special_actions,
            DirectoryEntry::NpcTable => self.npc_table,
            DirectoryEntry::ActionTable(i) => self.action_tables[usize::from(i)],
            DirectoryEntry::MonsterNames => self.monster_names,
            DirectoryEntry::MonsterData => self.monster_data,
            DirectoryEntry::Strings => self.strings,
        }
    }

    /// Replace the pointer of `entry`.
    pub fn set(&mut self, entry: DirectoryEntry, pointer: u16) {
        match entry {
            DirectoryEntry::SpecialActions => self.special_actions = pointer,
            DirectoryEntry::NpcTable => self.npc_table = pointer,
            DirectoryEntry::ActionTable(i) => self.action_tables[usize::from(i)] = pointer,
            DirectoryEntry::MonsterNames => self.monster_names = pointer,
            DirectoryEntry::MonsterData => self.monster_data = pointer,
            DirectoryEntry::Strings => self.strings = pointer,
        }
    }

    /// All pointers in [`PRIORITY_ORDER`].
    pub fn pointers(&self) -> [u16; 21] {
        PRIORITY_ORDER.map(|entry| self.pointer(entry))
    }

    /// Whether `entry` has no area of its own.
    ///
    /// True when its pointer is zero or a higher-priority entry has the same
    /// pointer.
    pub fn is_empty_area(&self, entry: DirectoryEntry) -> bool {
        let pointer = self.pointer(entry);
        pointer == 0
            || PRIORITY_ORDER[entry.rank() + 1..]
                .iter()
                .any(|&other| self.pointer(other) == pointer)
    }

    /// End of the area starting at `entry`'s pointer.
    ///
    /// This is the smallest directory pointer greater than it, or `limit` if
    /// there is none.
    pub fn area_end(&self, entry: DirectoryEntry, limit: usize) -> usize {
        let pointer = self.pointer(entry);
        self.pointers()
            .into_iter()
            .filter(|&p| p > pointer)
            .min()
            .map_or(limit, usize::from)
    }
}

impl MsqFormat for CentralDirectory {
    fn parse(data: &[u8]) -> FormatResult<Self> {
        Self::decode(data)
    }

    fn build(&self) -> FormatResult<Vec<u8>> {
        let mut out = Vec::with_capacity(DIRECTORY_LEN);
        self.write(&mut Cursor::new(&mut out))?;
        Ok(out)
    }
}
