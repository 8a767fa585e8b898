//! Insertion-ordered containers used throughout the object graph.
//!
//! The IDE's own diff/merge tooling is sensitive to key order inside
//! `project.pbxproj`, so every dictionary in the graph is backed by
//! [`indexmap::IndexMap`] rather than a hash map, and every sequence is a
//! plain `Vec` with an explicit index-preserving insert helper (`spec.md`
//! §9 "Insertion-ordered maps").

use indexmap::IndexMap;

/// An insertion-ordered key/value map. Re-exported as a type alias so call
/// sites read as domain vocabulary (`Dictionary`) rather than a raw
/// `IndexMap`.
pub type OrderedMap<K, V> = IndexMap<K, V>;

/// Extension trait giving `Vec` an explicit "insert at index, clamped to the
/// current length" operation.
///
/// `spec.md` §9 notes that the source's `Array::insert(_, at: i)` always
/// inserted at index 0 regardless of `i` — an acknowledged bug. This crate
/// implements the documented behavior: insert at the given index.
pub trait OrderedSequence<T> {
    fn insert_at(&mut self, index: usize, value: T);
}

impl<T> OrderedSequence<T> for Vec<T> {
    fn insert_at(&mut self, index: usize, value: T) {
        let index = index.min(self.len());
        self.insert(index, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_at_clamps_to_length() {
        let mut v = vec![1, 2, 3];
        v.insert_at(1, 99);
        assert_eq!(v, vec![1, 99, 2, 3]);

        let mut v2 = vec![1, 2, 3];
        v2.insert_at(100, 99);
        assert_eq!(v2, vec![1, 2, 3, 99]);
    }

    #[test]
    fn ordered_map_preserves_insertion_order() {
        let mut m: OrderedMap<&str, i32> = OrderedMap::new();
        m.insert("z", 1);
        m.insert("a", 2);
        m.insert("m", 3);
        let keys: Vec<_> = m.keys().copied().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
