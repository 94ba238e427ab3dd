//! 5-bit string group decompression
//!
//! A group is a little-endian bit stream read in 5-bit windows, least
//! significant bit first. Each symbol indexes the character table, with two
//! control codes:
//!
//! - `0x1e`: the next character is uppercased (`- 0x20`)
//! - `0x1f`: the next symbol indexes the upper half of the table (`+ 0x1e`)
//!
//! Repeating a control code before it has been consumed is an error.

use super::area::CHAR_TABLE_LEN;
use crate::error::{FormatError, FormatResult};

/// Uppercase the next character
pub const CODE_CAPITALIZE: u8 = 0x1e;

/// Read the next symbol from the upper half of the character table
pub const CODE_SHIFT: u8 = 0x1f;

const SHIFT_OFFSET: usize = 0x1e;
const CAPITAL_OFFSET: u8 = 0x20;

fn bit(data: &[u8], index: usize) -> u8 {
    (data[index / 8] >> (index % 8)) & 1
}

/// Split a group into 5-bit symbols.
///
/// A window at bit `off` is read only while `off + 5` is strictly less than
/// the total bit count, so trailing padding never yields a symbol.
pub fn symbols(data: &[u8]) -> Vec<u8> {
    let total_bits = data.len() * 8;
    (0..)
        .step_by(5)
        .take_while(|off| off + 5 < total_bits)
        .map(|off| (0..5).fold(0u8, |acc, i| acc | (bit(data, off + i) << i)))
        .collect()
}

/// Decompress one string group.
pub fn decompress_group(char_table: &[u8; CHAR_TABLE_LEN], data: &[u8]) -> FormatResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut capitalize = false;
    let mut shift = false;

    for (position, symbol) in symbols(data).into_iter().enumerate() {
        match symbol {
            CODE_CAPITALIZE | CODE_SHIFT => {
                let pending = if symbol == CODE_CAPITALIZE {
                    &mut capitalize
                } else {
                    &mut shift
                };
                if *pending {
                    return Err(FormatError::InvalidControlSequence { symbol, position });
                }
                *pending = true;
            }
            _ => {
                let mut index = usize::from(symbol);
                if shift {
                    index += SHIFT_OFFSET;
                    shift = false;
                }
                let mut ch = char_table[index];
                if capitalize {
                    ch = ch.wrapping_sub(CAPITAL_OFFSET);
                    capitalize = false;
                }
                out.push(ch);
            }
        }
    }

    Ok(out)
}
