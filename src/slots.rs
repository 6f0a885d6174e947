//! Logical slot allocation.
//!
//! Discovered controls arrive unordered. [`allocate`] turns one list of
//! [`ControlDescriptor`]s into a [`SlotTable`]: descriptors sorted by
//! `(offset, key)` with logical index = position, plus a `RawKey -> index` map.
//!
//! Offsets put well-known axes in a fixed order across devices (X before Y
//! before Z ...) while hats and buttons keep discovery order. The key breaks
//! ties so the order is total and the result deterministic.
//!
//! A table is never patched. When capabilities are re-queried the whole table is
//! rebuilt, so the map is always exactly the inverse of the sorted list.

use std::collections::HashMap;

/// Identifies a control within one capability snapshot of one device:
/// `(capability list position, usage)`.
///
/// Not stable across re-enumeration; capability positions may change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawKey(u32);

impl RawKey {
    pub fn new(cap_position: usize, usage: u16) -> Self {
        let position = (cap_position & 0xFFFF) as u32;
        Self((position << 16) | u32::from(usage))
    }

    #[inline]
    pub fn cap_position(self) -> usize {
        (self.0 >> 16) as usize
    }

    #[inline]
    pub fn usage(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

/// One discovered axis, hat or button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub key: RawKey,
    pub usage_page: u16,
    /// Desired placement: fixed for well-known axes, append order otherwise.
    pub offset: u32,
    /// `None` until allocation runs.
    pub index: Option<usize>,
}

impl ControlDescriptor {
    pub fn new(key: RawKey, usage_page: u16, offset: u32) -> Self {
        Self {
            key,
            usage_page,
            offset,
            index: None,
        }
    }
}

/// Allocated controls of one kind for one device.
///
/// `SlotTable::default()` is the "not yet allocated" table: every lookup misses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotTable {
    descriptors: Vec<ControlDescriptor>,
    index_by_key: HashMap<RawKey, usize>,
}

impl SlotTable {
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Logical index of a raw key, if it was allocated.
    #[inline]
    pub fn index_of(&self, key: RawKey) -> Option<usize> {
        self.index_by_key.get(&key).copied()
    }

    /// Descriptor at a logical index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ControlDescriptor> {
        self.descriptors.get(index)
    }

    /// Descriptors in logical-index order.
    pub fn iter(&self) -> impl Iterator<Item = &ControlDescriptor> {
        self.descriptors.iter()
    }
}

/// Sort descriptors by `(offset, key)`, number them `0..n` and build the lookup map.
pub fn allocate(mut descriptors: Vec<ControlDescriptor>) -> SlotTable {
    descriptors.sort_by_key(|d| (d.offset, d.key));

    let mut index_by_key = HashMap::with_capacity(descriptors.len());
    for (i, d) in descriptors.iter_mut().enumerate() {
        d.index = Some(i);
        index_by_key.insert(d.key, i);
    }

    SlotTable {
        descriptors,
        index_by_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(position: usize, usage: u16, offset: u32) -> ControlDescriptor {
        ControlDescriptor::new(RawKey::new(position, usage), 0x01, offset)
    }

    #[test]
    fn raw_key_packs_position_and_usage() {
        let k = RawKey::new(3, 0x31);
        assert_eq!(k.cap_position(), 3);
        assert_eq!(k.usage(), 0x31);
        assert!(RawKey::new(0, 0xFFFF) < RawKey::new(1, 0));
    }

    #[test]
    fn offsets_then_keys_decide_order() {
        // offsets [2, 0, 0, 1] with distinct keys
        let input = vec![desc(0, 0x32, 2), desc(1, 0x30, 0), desc(2, 0x30, 0), desc(3, 0x31, 1)];
        let table = allocate(input);

        let order: Vec<(u32, RawKey)> = table.iter().map(|d| (d.offset, d.key)).collect();
        assert_eq!(
            order,
            vec![
                (0, RawKey::new(1, 0x30)),
                (0, RawKey::new(2, 0x30)),
                (1, RawKey::new(3, 0x31)),
                (2, RawKey::new(0, 0x32)),
            ]
        );
        assert_eq!(table.index_of(RawKey::new(1, 0x30)), Some(0));
        assert_eq!(table.index_of(RawKey::new(2, 0x30)), Some(1));
        assert_eq!(table.index_of(RawKey::new(3, 0x31)), Some(2));
        assert_eq!(table.index_of(RawKey::new(0, 0x32)), Some(3));
    }

    #[test]
    fn indices_are_filled_in() {
        let table = allocate(vec![desc(0, 1, 5), desc(1, 2, 4)]);
        for (i, d) in table.iter().enumerate() {
            assert_eq!(d.index, Some(i));
        }
    }

    #[test]
    fn unallocated_table_misses_every_lookup() {
        let table = SlotTable::default();
        assert!(table.is_empty());
        assert_eq!(table.index_of(RawKey::new(0, 0x30)), None);
        assert!(table.get(0).is_none());
    }
}
