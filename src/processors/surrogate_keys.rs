use std::collections::HashMap;

/// Insertion-ordered assignment of small integer keys to free-text names.
///
/// The first name seen gets key 1, the next new name key 2, and so on.
/// Equal names always map to the same key and distinct names never share
/// one. Iteration follows first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurrogateKeys {
    entries: Vec<(String, u32)>,
    index: HashMap<String, u32>,
}

impl SurrogateKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `name`, assigning the next free key on first sight.
    pub fn assign(&mut self, name: &str) -> u32 {
        if let Some(&key) = self.index.get(name) {
            return key;
        }

        let key = self.next_key();
        self.entries.push((name.to_string(), key));
        self.index.insert(name.to_string(), key);
        key
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn next_key(&self) -> u32 {
        self.entries.iter().map(|(_, key)| *key).max().unwrap_or(0) + 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, key)| (name.as_str(), *key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_seen_order() {
        let mut keys = SurrogateKeys::new();

        assert_eq!(keys.assign("Montréal"), 1);
        assert_eq!(keys.assign("Laval"), 2);
        assert_eq!(keys.assign("Montréal"), 1);
        assert_eq!(keys.assign("Longueuil"), 3);

        let entries: Vec<(&str, u32)> = keys.iter().collect();
        assert_eq!(
            entries,
            vec![("Montréal", 1), ("Laval", 2), ("Longueuil", 3)]
        );
    }

    #[test]
    fn test_keys_are_injective() {
        let mut keys = SurrogateKeys::new();
        let names = ["Urbain", "Résidentiel", "urbain", "Urbain ", "Urbain"];

        let assigned: Vec<u32> = names.iter().map(|name| keys.assign(name)).collect();

        // Names are compared exactly: case and whitespace variants are distinct
        assert_eq!(assigned, vec![1, 2, 3, 4, 1]);
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_empty_map() {
        let keys = SurrogateKeys::new();

        assert!(keys.is_empty());
        assert_eq!(keys.next_key(), 1);
        assert_eq!(keys.get("Montréal"), None);
        assert!(!keys.contains("Montréal"));
    }
}
