//! Typed key-value configuration bag with an insertion-order-preserving map
//! and a mutation observer so owners can react to a changed attribute
//! without polling.

/// An ordered string-to-string configuration map.
///
/// Unknown keys are accepted and stored without validation; it is the
/// consumer's job (rotate policy, archive strategy, ...) to interpret
/// recognized keys and fall back to a default on an unrecognized value.
pub struct AttributeBag {
    entries: Vec<(String, String)>,
    observer: Option<Box<dyn FnMut(&str, &str)>>,
}

impl Default for AttributeBag {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeBag {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            observer: None,
        }
    }

    /// Register a callback invoked after every successful `put`, with the
    /// key and the new value. Replaces any previously registered observer.
    pub fn set_observer(&mut self, observer: impl FnMut(&str, &str) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or overwrite `key`, preserving first-seen order on overwrite.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value.clone(),
            None => self.entries.push((key.clone(), value.clone())),
        }
        if let Some(observer) = self.observer.as_mut() {
            observer(&key, &value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_put_get_roundtrip() {
        let mut bag = AttributeBag::new();
        bag.put("rotate", "size");
        assert_eq!(bag.get("rotate"), Some("size"));
        assert!(bag.has("rotate"));
        assert!(!bag.has("archive"));
    }

    #[test]
    fn test_overwrite_preserves_order() {
        let mut bag = AttributeBag::new();
        bag.put("a", "1");
        bag.put("b", "2");
        bag.put("a", "3");
        let collected: Vec<_> = bag.iter().collect();
        assert_eq!(collected, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_observer_fires_on_put() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let mut bag = AttributeBag::new();
        bag.set_observer(move |k, v| {
            seen_clone.lock().unwrap().push((k.to_string(), v.to_string()));
        });
        bag.put("compression_mode", "gzip");
        bag.put("archive", "number");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("compression_mode".to_string(), "gzip".to_string()),
                ("archive".to_string(), "number".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_key_is_stored() {
        let mut bag = AttributeBag::new();
        bag.put("x-custom", "whatever");
        assert_eq!(bag.get("x-custom"), Some("whatever"));
    }
}
