use std::collections::BTreeMap;

/// A series' tags in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(Vec<(String, String)>);

impl TagSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }

    /// Canonical encoding of the tag set.
    ///
    /// Keys and values are written quoted and escaped, so distinct tag sets
    /// never collide even when they contain `=` or `,`.
    pub fn signature(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{:?}={:?},", key, value))
            .collect()
    }

    /// Whether both sets identify the same series. An empty set identifies nothing.
    pub fn matches(&self, other: &TagSet) -> bool {
        !self.is_empty() && !other.is_empty() && self.signature() == other.signature()
    }
}

impl From<BTreeMap<String, String>> for TagSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        TagSet(map.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map: BTreeMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        TagSet::from(map)
    }
}
