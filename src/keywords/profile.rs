// KeywordProfile — the top-K keywords for one entity, with raw frequencies.
//
// Keywords are held in rank order (by similarity to the entity's document
// embedding). Persisted form is a plain JSON object `{"keyword": frequency}`
// parsed strictly: frequencies must be non-negative integers that fit u32,
// and a repeated key is an error rather than a silent overwrite.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AnalysisError;

/// One ranked keyword and how many times it appeared in the entity's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    pub keyword: String,
    pub frequency: u32,
}

/// Keyword → frequency in rank order, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMap(Vec<KeywordEntry>);

impl KeywordMap {
    pub fn new(entries: Vec<KeywordEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[KeywordEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a persisted keyword map strictly.
    pub fn from_json(entity: &str, json: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(json).map_err(|source| AnalysisError::MalformedProfile {
            entity: entity.to_string(),
            source,
        })
    }

    pub fn to_json(&self) -> String {
        // Map of strings to integers cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for KeywordMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.keyword, &entry.frequency)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeywordMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeywordMapVisitor;

        impl<'de> Visitor<'de> for KeywordMapVisitor {
            type Value = KeywordMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping keywords to non-negative integer frequencies")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<KeywordMap, A::Error> {
                let mut seen = HashSet::new();
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((keyword, frequency)) = access.next_entry::<String, u32>()? {
                    if !seen.insert(keyword.clone()) {
                        return Err(de::Error::custom(format!("duplicate keyword {keyword:?}")));
                    }
                    entries.push(KeywordEntry { keyword, frequency });
                }
                Ok(KeywordMap(entries))
            }
        }

        deserializer.deserialize_map(KeywordMapVisitor)
    }
}

/// The keyword profile for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordProfile {
    pub entity: String,
    /// Election candidate this theme stock is associated with, if known.
    pub candidate: Option<String>,
    pub keywords: KeywordMap,
}

impl KeywordProfile {
    pub fn new(entity: &str, candidate: Option<&str>, keywords: Vec<KeywordEntry>) -> Self {
        Self {
            entity: entity.to_string(),
            candidate: candidate.map(str::to_string),
            keywords: KeywordMap::new(keywords),
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords in rank order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> + '_ {
        self.keywords.entries().iter().map(|e| e.keyword.as_str())
    }

    pub fn frequency(&self, keyword: &str) -> Option<u32> {
        self.keywords
            .entries()
            .iter()
            .find(|e| e.keyword == keyword)
            .map(|e| e.frequency)
    }

    /// Entries sorted by frequency descending (ties keep rank order).
    pub fn by_frequency(&self) -> Vec<&KeywordEntry> {
        let mut entries: Vec<&KeywordEntry> = self.keywords.entries().iter().collect();
        entries.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        entries
    }
}

/// Keyword profiles keyed by entity.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: HashMap<String, KeywordProfile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile: KeywordProfile) {
        self.profiles.insert(profile.entity.clone(), profile);
    }

    /// Look up an entity's profile. A missing profile is a typed error: it
    /// usually means extraction never ran for this entity.
    pub fn require(&self, entity: &str) -> Result<&KeywordProfile, AnalysisError> {
        self.profiles
            .get(entity)
            .ok_or_else(|| AnalysisError::MissingKeywordData {
                entity: entity.to_string(),
            })
    }

    pub fn get(&self, entity: &str) -> Option<&KeywordProfile> {
        self.profiles.get(entity)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<KeywordProfile> for ProfileSet {
    fn from_iter<I: IntoIterator<Item = KeywordProfile>>(iter: I) -> Self {
        let mut set = ProfileSet::new();
        for profile in iter {
            set.insert(profile);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(keyword: &str, frequency: u32) -> KeywordEntry {
        KeywordEntry {
            keyword: keyword.to_string(),
            frequency,
        }
    }

    #[test]
    fn test_json_preserves_rank_order() {
        let map = KeywordMap::new(vec![entry("지역화폐", 3), entry("코나", 9)]);
        let json = map.to_json();
        assert_eq!(json, r#"{"지역화폐":3,"코나":9}"#);
        assert_eq!(KeywordMap::from_json("코나아이", &json).unwrap(), map);
    }

    #[test]
    fn test_rejects_non_integer_frequency() {
        for bad in [
            r#"{"코나": 1.5}"#,
            r#"{"코나": -1}"#,
            r#"{"코나": "3"}"#,
            r#"{"코나": 4294967296}"#,
            r#"["코나"]"#,
            "{'코나': 3}",
        ] {
            let err = KeywordMap::from_json("코나아이", bad).unwrap_err();
            assert!(
                matches!(err, AnalysisError::MalformedProfile { .. }),
                "expected MalformedProfile for {bad}"
            );
        }
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = KeywordMap::from_json("안랩", r#"{"안철수": 2, "안철수": 3}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_empty_object_is_valid() {
        assert!(KeywordMap::from_json("안랩", "{}").unwrap().is_empty());
    }

    #[test]
    fn test_by_frequency_is_stable() {
        let profile = KeywordProfile::new(
            "덕성",
            Some("윤석열"),
            vec![entry("a", 2), entry("b", 5), entry("c", 2)],
        );
        let ordered: Vec<&str> = profile
            .by_frequency()
            .iter()
            .map(|e| e.keyword.as_str())
            .collect();
        assert_eq!(ordered, vec!["b", "a", "c"]);
        assert_eq!(profile.frequency("b"), Some(5));
        assert_eq!(profile.frequency("z"), None);
    }

    #[test]
    fn test_profile_set_missing_entity() {
        let set: ProfileSet = vec![KeywordProfile::new("덕성", None, vec![entry("a", 2)])]
            .into_iter()
            .collect();
        assert!(set.require("덕성").is_ok());
        assert!(matches!(
            set.require("안랩"),
            Err(AnalysisError::MissingKeywordData { .. })
        ));
    }
}
