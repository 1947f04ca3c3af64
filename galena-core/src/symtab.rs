//! Scoped symbol table.
//!
//! Names are interned; every name owns a chain of entries ordered
//! innermost-first, so a fresh binding of an already-known name shadows the
//! outer one and removal re-exposes it. Entries are removed *by identity*
//! ([`SymbolId`]), never by name: the same name can occur several times in
//! one chain.
//!
//! `|x|` and `x` hash and compare as the same name by default, matching the
//! solver this front end was written for; strict SMT-LIB distinctness can be
//! restored with [`SymbolTable::with_options`].

use crate::backend::{Backend, NodeId, SortId};
use crate::error::Coo;
use crate::token::{KEYWORD_TABLE, Tag};
use lasso::{Rodeo, Spur};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

/// Identity of a symbol-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

/// One binding of a name.
#[derive(Debug)]
pub struct SymbolEntry {
    /// Tag of the entry (builtin operators keep their operator tag, user
    /// symbols are [`Tag::Symbol`]).
    pub tag: Tag,
    /// The name as written, bars included for quoted symbols.
    pub name: String,
    /// Coordinate of the defining occurrence; `0:0` until declared.
    pub coo: Coo,
    /// Scope level the entry was created at.
    pub scope_level: u32,
    /// Set for `let`-bound symbols.
    pub bound: bool,
    /// Set for sort aliases (`define-sort`, `declare-sort`).
    pub is_sort: bool,
    /// Backend node attached by declare/define/bind.
    pub node: Option<NodeId>,
    /// Backend sort for sort aliases.
    pub sort_alias: Option<SortId>,
    key: Spur,
}

/// The table itself.
pub struct SymbolTable {
    interner: Rodeo,
    chains: FxHashMap<Spur, SmallVec<[SymbolId; 2]>>,
    entries: Vec<Option<SymbolEntry>>,
    scope_level: u32,
    global_declarations: bool,
    quote_equiv: bool,
    count: usize,
}

impl SymbolTable {
    /// A table with the default options, seeded with all reserved words,
    /// commands, keywords, theory symbols and logic names at scope 0.
    pub fn new() -> Self {
        Self::with_options(true)
    }

    /// A table with explicit quote-equivalence behavior.
    pub fn with_options(quote_equiv: bool) -> Self {
        let mut table = SymbolTable {
            interner: Rodeo::default(),
            chains: FxHashMap::default(),
            entries: Vec::with_capacity(KEYWORD_TABLE.len() * 2),
            scope_level: 0,
            global_declarations: false,
            quote_equiv,
            count: 0,
        };
        for (name, tag) in KEYWORD_TABLE {
            debug_assert!(table.find(name).is_none());
            table.insert(*tag, name);
        }
        table
    }

    fn key_text<'n>(&self, name: &'n str) -> &'n str {
        if self.quote_equiv && name.len() >= 2 && name.starts_with('|') && name.ends_with('|') {
            &name[1..name.len() - 1]
        } else {
            name
        }
    }

    /// The innermost entry for `name`, if any.
    pub fn find(&self, name: &str) -> Option<SymbolId> {
        let key = self.interner.get(self.key_text(name))?;
        self.chains.get(&key).and_then(|c| c.last().copied())
    }

    /// Create a fresh entry for `name` at the current scope level and make
    /// it the innermost binding of that name.
    pub fn insert(&mut self, tag: Tag, name: &str) -> SymbolId {
        let key = self.interner.get_or_intern(self.key_text(name));
        let id = SymbolId(self.entries.len() as u32);
        self.entries.push(Some(SymbolEntry {
            tag,
            name: name.to_string(),
            coo: Coo::default(),
            scope_level: self.scope_level,
            bound: false,
            is_sort: false,
            node: None,
            sort_alias: None,
            key,
        }));
        self.chains.entry(key).or_default().push(id);
        self.count += 1;
        trace!(name, level = self.scope_level, "insert symbol");
        id
    }

    /// Borrow an entry.
    pub fn get(&self, id: SymbolId) -> &SymbolEntry {
        self.entries[id.0 as usize]
            .as_ref()
            .expect("symbol entry removed")
    }

    /// Mutably borrow an entry.
    pub fn get_mut(&mut self, id: SymbolId) -> &mut SymbolEntry {
        self.entries[id.0 as usize]
            .as_mut()
            .expect("symbol entry removed")
    }

    /// The name of an entry.
    pub fn name(&self, id: SymbolId) -> &str {
        &self.get(id).name
    }

    /// Unlink an entry by identity and release its backend node.
    pub fn remove(&mut self, id: SymbolId, backend: &mut dyn Backend) {
        let entry = self.entries[id.0 as usize]
            .take()
            .expect("symbol entry removed twice");
        trace!(name = entry.name.as_str(), level = entry.scope_level, "remove symbol");
        if let Some(chain) = self.chains.get_mut(&entry.key)
            && let Some(at) = chain.iter().rposition(|&e| e == id)
        {
            chain.remove(at);
        }
        if let Some(node) = entry.node {
            backend.release(node);
        }
        self.count -= 1;
    }

    /// Open a new scope level.
    pub fn open_scope(&mut self) {
        self.scope_level += 1;
        trace!(level = self.scope_level, "opened scope");
    }

    /// Close the current scope level, removing every entry created at it
    /// unless global declarations are in force.
    pub fn close_scope(&mut self, backend: &mut dyn Backend) {
        debug_assert!(self.scope_level > 0);
        if !self.global_declarations {
            let level = self.scope_level;
            let doomed: Vec<SymbolId> = self
                .entries
                .iter()
                .enumerate()
                .filter_map(|(i, e)| {
                    e.as_ref()
                        .filter(|e| e.scope_level == level)
                        .map(|_| SymbolId(i as u32))
                })
                .collect();
            for id in doomed {
                self.remove(id, backend);
            }
        }
        trace!(level = self.scope_level, "closed scope");
        self.scope_level -= 1;
    }

    /// Current scope level (0 outside any `push`).
    pub fn level(&self) -> u32 {
        self.scope_level
    }

    /// Toggle the `:global-declarations` behavior.
    pub fn set_global_declarations(&mut self, on: bool) {
        self.global_declarations = on;
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if the table holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Release every node still attached to an entry (parser teardown).
    pub fn release_all(&mut self, backend: &mut dyn Backend) {
        for entry in self.entries.iter_mut().flatten() {
            if let Some(node) = entry.node.take() {
                backend.release(node);
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeBackend;

    #[test]
    fn builtins_are_seeded() {
        let table = SymbolTable::new();
        let id = table.find("bvadd").unwrap();
        assert_eq!(table.get(id).tag, Tag::Bv(crate::token::BvOp::Add));
        assert!(table.find("no-such-symbol").is_none());
    }

    #[test]
    fn innermost_binding_shadows() {
        let mut table = SymbolTable::new();
        let mut backend = NodeBackend::new();
        let outer = table.insert(Tag::Symbol, "x");
        let inner = table.insert(Tag::Symbol, "x");
        assert_eq!(table.find("x"), Some(inner));
        table.remove(inner, &mut backend);
        assert_eq!(table.find("x"), Some(outer));
    }

    #[test]
    fn removal_is_by_identity() {
        let mut table = SymbolTable::new();
        let mut backend = NodeBackend::new();
        let a = table.insert(Tag::Symbol, "y");
        let b = table.insert(Tag::Symbol, "y");
        let c = table.insert(Tag::Symbol, "y");
        table.remove(b, &mut backend);
        assert_eq!(table.find("y"), Some(c));
        table.remove(c, &mut backend);
        assert_eq!(table.find("y"), Some(a));
    }

    #[test]
    fn quoted_and_plain_names_are_one_chain() {
        let mut table = SymbolTable::new();
        let id = table.insert(Tag::Symbol, "|spaced name|");
        assert_eq!(table.find("|spaced name|"), Some(id));
        let plain = table.insert(Tag::Symbol, "z");
        assert_eq!(table.find("|z|"), Some(plain));
    }

    #[test]
    fn strict_quoting_keeps_names_apart() {
        let mut table = SymbolTable::with_options(false);
        let plain = table.insert(Tag::Symbol, "z");
        assert_eq!(table.find("|z|"), None);
        assert_eq!(table.find("z"), Some(plain));
    }

    #[test]
    fn close_scope_removes_only_the_level() {
        let mut table = SymbolTable::new();
        let mut backend = NodeBackend::new();
        let outer = table.insert(Tag::Symbol, "v");
        table.open_scope();
        table.insert(Tag::Symbol, "v");
        table.insert(Tag::Symbol, "w");
        table.close_scope(&mut backend);
        assert_eq!(table.find("v"), Some(outer));
        assert!(table.find("w").is_none());
    }

    #[test]
    fn global_declarations_survive_scope_close() {
        let mut table = SymbolTable::new();
        let mut backend = NodeBackend::new();
        table.set_global_declarations(true);
        table.open_scope();
        let id = table.insert(Tag::Symbol, "kept");
        table.close_scope(&mut backend);
        assert_eq!(table.find("kept"), Some(id));
        assert_eq!(table.level(), 0);
    }
}
