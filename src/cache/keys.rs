//! Cache key definitions.
//!
//! A [`QueryKey`] is a [`KeyPath`] (literal segments and positional
//! identifiers) followed by the canonical parameter record of the query that
//! produced it. Keys sharing a path address the same resource subtree, which
//! is what prefix invalidation and removal match on.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::params::Params;

/// Leading literal shared by every key this crate builds.
pub const ROOT: &str = "/commerce-sdk-react";
pub const ORGANIZATIONS: &str = "/organizations/";

/// One element of a key path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeySegment {
    /// Constant naming a resource type, e.g. `"/baskets/"`.
    Literal(&'static str),
    /// Positional identifier; `None` when the caller did not supply it.
    Id(Option<String>),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Literal(literal) => f.write_str(literal),
            KeySegment::Id(Some(id)) => f.write_str(id),
            KeySegment::Id(None) => f.write_str("<missing>"),
        }
    }
}

impl Serialize for KeySegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KeySegment::Literal(literal) => serializer.serialize_str(literal),
            KeySegment::Id(Some(id)) => serializer.serialize_str(id),
            KeySegment::Id(None) => serializer.serialize_none(),
        }
    }
}

/// Ordered literal/identifier prefix of a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Vec<KeySegment>);

impl KeyPath {
    /// Path containing only [`ROOT`].
    pub fn root() -> Self {
        Self(vec![KeySegment::Literal(ROOT)])
    }

    /// `ROOT, "/organizations/", organizationId` taken from `params`.
    pub fn organization(params: &Params) -> Self {
        Self::root()
            .literal(ORGANIZATIONS)
            .id(params.get_str("organizationId"))
    }

    #[must_use]
    pub fn literal(mut self, literal: &'static str) -> Self {
        self.0.push(KeySegment::Literal(literal));
        self
    }

    #[must_use]
    pub fn id(mut self, id: Option<&str>) -> Self {
        self.0.push(KeySegment::Id(id.map(str::to_string)));
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every segment of `self` matches the leading segments of `other`.
    pub fn is_prefix_of(&self, other: &KeyPath) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Whether any identifier position is unset.
    pub fn has_missing_id(&self) -> bool {
        self.0
            .iter()
            .any(|segment| matches!(segment, KeySegment::Id(None)))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for segment in &self.0 {
            seq.serialize_element(segment)?;
        }
        seq.end()
    }
}

/// Full address of one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    path: KeyPath,
    params: Params,
}

impl QueryKey {
    /// `params` must already be narrowed to the query's allow-list.
    pub fn new(path: KeyPath, params: Params) -> Self {
        Self { path, params }
    }

    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Fuzzy match: true when `prefix` is a prefix of this key's path.
    pub fn matches_path(&self, prefix: &KeyPath) -> bool {
        prefix.is_prefix_of(&self.path)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.params)
    }
}

impl Serialize for QueryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.path.len() + 1))?;
        for segment in self.path.segments() {
            seq.serialize_element(segment)?;
        }
        seq.serialize_element(&self.params)?;
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn basket_path(basket_id: Option<&str>) -> KeyPath {
        KeyPath::organization(&Params::new().with("organizationId", "f_ecom"))
            .literal("/baskets/")
            .id(basket_id)
    }

    #[test]
    fn prefix_matching_ignores_params() {
        let parent = basket_path(Some("B1"));
        let en = QueryKey::new(
            parent.clone().literal("/taxes"),
            Params::new().with("locale", "en-US"),
        );
        let fr = QueryKey::new(parent.clone(), Params::new().with("locale", "fr-FR"));

        assert!(en.matches_path(&parent));
        assert!(fr.matches_path(&parent));
        assert!(!fr.matches_path(&basket_path(Some("B2"))));
    }

    #[test]
    fn child_is_not_prefix_of_parent() {
        let parent = basket_path(Some("B1"));
        let child = parent.clone().literal("/payment-methods");
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
    }

    #[test]
    fn missing_id_is_kept_in_position() {
        let path = basket_path(None);
        assert!(path.has_missing_id());
        assert_eq!(path.len(), 5);
        assert_eq!(path.to_string(), "/commerce-sdk-react/organizations/f_ecom/baskets/<missing>");
    }

    #[test]
    fn key_serializes_as_segments_then_params() {
        let key = QueryKey::new(basket_path(None), Params::new().with("siteId", "RefArch"));
        let value = serde_json::to_value(&key).expect("key serializes");

        assert_eq!(
            value,
            json!([
                "/commerce-sdk-react",
                "/organizations/",
                "f_ecom",
                "/baskets/",
                null,
                {"siteId": "RefArch"}
            ])
        );
    }
}
