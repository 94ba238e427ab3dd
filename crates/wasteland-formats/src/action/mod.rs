//! Action tables
//!
//! Every map tile carries an action class (4 bits) and an action selector
//! (8 bits). The class picks one of sixteen action tables; the selector picks
//! an element of that table. Most tables stay opaque byte elements here; the
//! transition and loot tables also have typed views.

pub mod loot;
pub mod transition;

pub use loot::{Loot, LootCash, LootItem, LootTable};
pub use transition::{Transition, TransitionTable};

use crate::carve::CarvedBlock;
use crate::directory::{ACTION_TABLE_COUNT, DirectoryEntry};
use crate::error::{FormatResult, ResultExt};
use crate::table::Table;

/// Table of shop definitions
pub const SHOP_TABLE: usize = 6;

/// Table of loot bags
pub const LOOT_TABLE: usize = 9;

/// Table of transitions
pub const TRANSITION_TABLE: usize = 10;

/// All sixteen action tables of a map block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTables {
    /// Tables indexed by action class; empty areas decode as empty tables
    pub tables: [Table; ACTION_TABLE_COUNT],
}

impl ActionTables {
    /// Parse every non-empty action table of a carved block.
    pub fn decode(carved: &CarvedBlock) -> FormatResult<Self> {
        let mut tables: [Table; ACTION_TABLE_COUNT] = Default::default();
        for (i, table) in tables.iter_mut().enumerate() {
            let bytes = carved.action_table(i);
            if bytes.is_empty() {
                continue;
            }
            let base = usize::from(carved.directory().pointer(DirectoryEntry::ActionTable(i as u8)));
            *table = Table::parse(bytes, base).with_context(|| format!("action table {i}"))?;
        }
        Ok(Self { tables })
    }

    /// Table `index`.
    pub fn get(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    /// Shop table; shop records stay opaque.
    pub fn shops(&self) -> &Table {
        &self.tables[SHOP_TABLE]
    }

    /// Typed view of the loot table.
    pub fn loot(&self) -> FormatResult<LootTable> {
        LootTable::decode(&self.tables[LOOT_TABLE]).with_context(|| format!("action table {LOOT_TABLE}"))
    }

    /// Replace the transition table with an encoded typed view.
    pub fn set_transitions(&mut self, transitions: &TransitionTable) -> FormatResult<()> {
        self.tables[TRANSITION_TABLE] = transitions
            .to_table()
            .with_context(|| format!("action table {TRANSITION_TABLE}"))?;
        Ok(())
    }

    /// Replace the loot table with an encoded typed view.
    pub fn set_loot(&mut self, loot: &LootTable) {
        self.tables[LOOT_TABLE] = loot.to_table();
    }

    /// Encode all tables back to back starting at `base_offset`.
    ///
    /// Returns the bytes and the offset of each table, for the directory.
    /// Empty tables take no space and get pointer 0.
    pub fn encode(&self, base_offset: usize) -> FormatResult<(Vec<u8>, [usize; ACTION_TABLE_COUNT])> {
        let mut out = Vec::with_capacity(self.tables.iter().map(Table::encoded_len).sum());
        let mut offsets = [0; ACTION_TABLE_COUNT];

        for (i, (table, offset)) in self.tables.iter().zip(offsets.iter_mut()).enumerate() {
            if table.is_empty() {
                continue;
            }
            let base = base_offset + out.len();
            *offset = base;
            out.extend(table.encode(base).with_context(|| format!("action table {i}"))?);
        }
        Ok((out, offsets))
    }
}
