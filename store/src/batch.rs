//! Write batching: groups store operations so a backend can apply them in
//! one transaction.
//!
//! ```ignore
//! let mut batch = WriteBatch::new();
//! batch.clear(Table::Locks);
//! batch.put(Table::Locks, key, value);
//! batch.put_meta(MetaKey::LastActivity, &now.to_be_bytes());
//! store.apply(batch)?;
//! ```
//!
//! Operations apply in insertion order, so a `clear` followed by `put`s
//! replaces a table's contents.

use crate::meta::MetaKey;
use crate::table::Table;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    Put {
        table: Table,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        table: Table,
        key: Vec<u8>,
    },
    /// Remove every entry of the table.
    Clear(Table),
}

#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<StoreOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, table: Table, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(StoreOp::Put {
            table,
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, table: Table, key: impl Into<Vec<u8>>) {
        self.ops.push(StoreOp::Delete {
            table,
            key: key.into(),
        });
    }

    pub fn clear(&mut self, table: Table) {
        self.ops.push(StoreOp::Clear(table));
    }

    pub fn put_meta(&mut self, key: MetaKey, value: &[u8]) {
        self.put(Table::Meta, key.as_bytes(), value);
    }

    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<StoreOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_keep_insertion_order() {
        let mut batch = WriteBatch::new();
        batch.clear(Table::Locks);
        batch.put(Table::Locks, b"k".to_vec(), b"v".to_vec());
        batch.delete(Table::Accounts, b"gone".to_vec());
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.ops()[0], StoreOp::Clear(Table::Locks));
        assert!(matches!(batch.ops()[2], StoreOp::Delete { table: Table::Accounts, .. }));
    }
}
