//! Column-name normalization and alias resolution.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::schema::aliases::AliasTable;

/// Normalize a column name for alias matching
///
/// Drops every character that is not an ASCII letter or digit and uppercases
/// the rest, so `Origin_Airport`, `ORIGIN AIRPORT` and `originairport` all
/// collapse to `ORIGINAIRPORT`.
#[must_use]
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// One actual column bound to a canonical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Position of the column in the input column list
    pub column_index: usize,
    /// Name of the column as it appears in the input
    pub column: String,
    /// Canonical field the column is bound to
    pub canonical: String,
}

/// The result of resolving a column list against an alias table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnBinding {
    bindings: Vec<Binding>,
}

impl ColumnBinding {
    /// Canonical name bound to the column at `index`, if any
    #[must_use]
    pub fn canonical_at(&self, index: usize) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.column_index == index)
            .map(|b| b.canonical.as_str())
    }

    /// Actual column bound to `canonical`, if any
    #[must_use]
    pub fn column_for(&self, canonical: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.canonical == canonical)
            .map(|b| b.column.as_str())
    }

    /// True when every binding maps a column onto its own name
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.bindings.iter().all(|b| b.column == b.canonical)
    }

    /// Bindings in alias-table order
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Resolve actual column names to canonical field names
///
/// For every canonical field, in table order, the first alias (in declared
/// order) matching a still-unbound column wins. A column literally named after
/// a canonical field is bound to that field before any alias is tried, which
/// keeps resolution of an already-canonical column set the identity. When two
/// columns share a normalized key the earlier column is used.
///
/// # Arguments
/// * `columns` - Column names in batch order
/// * `table` - The alias table to resolve against
///
/// # Returns
/// The binding; columns without a match are simply absent from it
#[must_use]
pub fn resolve<S: AsRef<str>>(columns: &[S], table: &AliasTable) -> ColumnBinding {
    let mut by_key: FxHashMap<String, SmallVec<[usize; 2]>> = FxHashMap::default();
    for (idx, column) in columns.iter().enumerate() {
        by_key
            .entry(normalize_key(column.as_ref()))
            .or_default()
            .push(idx);
    }

    let entries = table.entries();
    let mut bound = vec![false; columns.len()];
    let mut slots: Vec<Option<usize>> = vec![None; entries.len()];

    // Exact canonical names first
    for (slot, entry) in slots.iter_mut().zip(entries) {
        if let Some(idx) =
            (0..columns.len()).find(|&i| !bound[i] && columns[i].as_ref() == entry.canonical)
        {
            bound[idx] = true;
            *slot = Some(idx);
        }
    }

    for (slot, entry) in slots.iter_mut().zip(entries) {
        if slot.is_some() {
            continue;
        }
        let hit = entry.keys.iter().find_map(|key| {
            by_key
                .get(key)
                .and_then(|positions| positions.iter().copied().find(|&i| !bound[i]))
        });
        if let Some(idx) = hit {
            bound[idx] = true;
            *slot = Some(idx);
        }
    }

    let bindings = slots
        .into_iter()
        .zip(entries)
        .filter_map(|(slot, entry)| {
            slot.map(|idx| Binding {
                column_index: idx,
                column: columns[idx].as_ref().to_string(),
                canonical: entry.canonical.clone(),
            })
        })
        .collect();

    ColumnBinding { bindings }
}
