//! Header tables: interned strings and enum-type identities.
//!
//! Tables are built by pre-walking the document before any op bytes are
//! written, so references are stable and the decoder can materialize
//! both tables before reading ops.

use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::{STRING_INTERN_MIN_COUNT, STRING_INTERN_MIN_LEN};
use crate::types::delta::{DeltaDocument, DeltaOp};
use crate::types::value::{EnumTypeId, TypeSpec, Value};

/// Interned strings for a headerful frame.
#[derive(Debug, Default)]
pub struct StringTable {
    entries: Vec<Arc<str>>,
    index: HashMap<Arc<str>, u32>,
}

impl StringTable {
    /// Table id for a string, when interned.
    pub fn lookup(&self, value: &str) -> Option<u32> {
        self.index.get(value).copied()
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[Arc<str>] {
        &self.entries
    }

    /// Whether nothing was interned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, value: Arc<str>) {
        if !self.index.contains_key(&value) {
            let id = self.entries.len() as u32;
            self.entries.push(Arc::clone(&value));
            self.index.insert(value, id);
        }
    }
}

/// Enum-type identities referenced by a frame.
#[derive(Debug, Default)]
pub struct EnumTypeTable {
    entries: Vec<EnumTypeId>,
    index: HashMap<EnumTypeId, u32>,
}

impl EnumTypeTable {
    /// Table id for an identity, when present.
    pub fn lookup(&self, ty: &EnumTypeId) -> Option<u32> {
        self.index.get(ty).copied()
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[EnumTypeId] {
        &self.entries
    }

    /// Whether no enum types are referenced.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by table id (decode side).
    pub fn get(&self, id: usize) -> Option<&EnumTypeId> {
        self.entries.get(id)
    }

    /// Append an entry (decode side), keeping the index consistent.
    pub fn push(&mut self, ty: EnumTypeId) {
        let id = self.entries.len() as u32;
        self.index.insert(ty.clone(), id);
        self.entries.push(ty);
    }
}

/// Occurrence counter preserving first-appearance order.
#[derive(Default)]
struct Walk {
    counts: HashMap<Arc<str>, usize>,
    order: Vec<Arc<str>>,
    enums: EnumTypeTable,
}

impl Walk {
    fn string(&mut self, value: &Arc<str>) {
        let entry = self.counts.entry(Arc::clone(value)).or_insert(0);
        *entry += 1;
        if *entry == 1 {
            self.order.push(Arc::clone(value));
        }
    }

    fn enum_type(&mut self, ty: &EnumTypeId) {
        self.string(&ty.full_name);
        self.string(&ty.module);
        if self.enums.lookup(ty).is_none() {
            self.enums.push(ty.clone());
        }
    }

    fn type_spec(&mut self, spec: &TypeSpec) {
        if let TypeSpec::Enum(ty) = spec {
            self.enum_type(ty);
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Str(s) => self.string(s),
            Value::Enum(e) => self.enum_type(&e.ty),
            Value::List(list) => {
                self.type_spec(&list.elem);
                for item in &list.items {
                    self.value(item);
                }
            }
            Value::Map(map) => {
                self.type_spec(&map.key);
                self.type_spec(&map.value);
                for (k, v) in &map.entries {
                    self.value(k);
                    self.value(v);
                }
            }
            _ => {}
        }
    }

    fn op(&mut self, op: &DeltaOp) {
        if let Some(key) = &op.key {
            self.value(key);
        }
        if let Some(value) = &op.value {
            self.value(value);
        }
        if let Some(nested) = &op.nested {
            self.document(nested);
        }
    }

    fn document(&mut self, doc: &DeltaDocument) {
        for op in doc.iter() {
            self.op(op);
        }
    }
}

/// Pre-walk a document and build the requested tables.
///
/// A string is interned when it occurs at least twice or is at least
/// the intern-length threshold; enum full names and module names
/// participate like any other string.
pub fn build_tables(
    doc: &DeltaDocument,
    want_strings: bool,
    want_enums: bool,
) -> (Option<StringTable>, Option<EnumTypeTable>) {
    if !want_strings && !want_enums {
        return (None, None);
    }
    let mut walk = Walk::default();
    walk.document(doc);

    let strings = want_strings.then(|| {
        let mut table = StringTable::default();
        for value in &walk.order {
            let count = walk.counts.get(value).copied().unwrap_or(0);
            if count >= STRING_INTERN_MIN_COUNT || value.len() >= STRING_INTERN_MIN_LEN {
                table.insert(Arc::clone(value));
            }
        }
        table
    });
    let enums = want_enums.then(|| {
        let mut walk_enums = EnumTypeTable::default();
        std::mem::swap(&mut walk_enums, &mut walk.enums);
        walk_enums
    });
    (strings, enums)
}
