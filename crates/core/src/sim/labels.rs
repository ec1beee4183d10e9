//! ld65 label files.
//!
//! `ld65 -Ln` writes one VICE monitor command per symbol:
//!
//! ```text
//! al 00C0DE .name
//! al C:0801 .start
//! ```
//!
//! Only `al` lines are meaningful; blank lines and `#`/`;` comments are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use crate::common::error::LoadError;

/// Symbol name to address map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeMap<String, u16>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses label file text.
    ///
    /// A symbol defined twice keeps its last address.
    ///
    /// # Returns
    ///
    /// The table, or `LoadError::BadLabel` naming the first malformed line.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut table = Self::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            let (name, addr) = parse_line(line).map_err(|reason| LoadError::BadLabel {
                line: i + 1,
                reason,
            })?;
            table.insert(name, addr);
        }
        Ok(table)
    }

    /// Reads and parses a label file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Adds or replaces a symbol.
    pub fn insert(&mut self, name: impl Into<String>, addr: u16) {
        let _ = self.symbols.insert(name.into(), addr);
    }

    /// Address of `name`.
    pub fn get(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    /// All symbols in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> + '_ {
        self.symbols.iter().map(|(n, &a)| (n.as_str(), a))
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True if the table holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn parse_line(line: &str) -> Result<(String, u16), String> {
    let mut fields = line.split_whitespace();
    match fields.next() {
        Some("al") => {}
        Some(other) => return Err(format!("unknown command '{other}'")),
        None => return Err("empty line".into()),
    }
    let addr_field = fields.next().ok_or("missing address")?;
    let name_field = fields.next().ok_or("missing symbol name")?;
    if fields.next().is_some() {
        return Err("trailing fields".into());
    }

    let hex = addr_field.strip_prefix("C:").unwrap_or(addr_field);
    let value = u32::from_str_radix(hex, 16).map_err(|_| format!("bad address '{addr_field}'"))?;
    let addr = u16::try_from(value).map_err(|_| format!("address ${value:X} exceeds $FFFF"))?;

    let name = name_field.strip_prefix('.').unwrap_or(name_field);
    if name.is_empty() {
        return Err("empty symbol name".into());
    }
    Ok((name.to_string(), addr))
}
