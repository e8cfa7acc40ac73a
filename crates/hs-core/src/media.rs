//! # Media Types & Negotiation Primitives
//!
//! [`MediaType`] is the normalized `type/subtype` essence of a MIME type.
//! [`parse_accept`] turns an `Accept` header into an ordered, de-duplicated
//! list of requested media types. [`TypeMappings`] associates media types
//! with the (optional) schema that describes them.

use std::fmt;
use std::str::FromStr;

use crate::error::HyperSchemaError;
use crate::identity::SchemaName;

/// Normalized MIME essence (`type/subtype`, lowercase, no parameters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaType(String);

impl MediaType {
    /// `application/json`
    pub const JSON: &'static str = "application/json";
    /// `application/x-www-form-urlencoded`
    pub const FORM_URLENCODED: &'static str = "application/x-www-form-urlencoded";
    /// `*/*`
    pub const ANY: &'static str = "*/*";

    /// Parse a header value such as `Application/JSON; charset=utf-8`.
    pub fn parse(raw: &str) -> Result<Self, HyperSchemaError> {
        let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.split_once('/') {
            Some((ty, sub))
                if !ty.is_empty() && !sub.is_empty() && !sub.contains('/') =>
            {
                Ok(Self(essence))
            }
            _ => Err(HyperSchemaError::InvalidMediaType(raw.to_string())),
        }
    }

    /// `application/json`.
    pub fn json() -> Self {
        Self(Self::JSON.to_string())
    }

    /// `application/x-www-form-urlencoded`.
    pub fn form_urlencoded() -> Self {
        Self(Self::FORM_URLENCODED.to_string())
    }

    /// Whether this is the full wildcard `*/*`.
    pub fn is_wildcard_all(&self) -> bool {
        self.0 == Self::ANY
    }

    /// Whether this is `application/x-www-form-urlencoded`.
    pub fn is_form_urlencoded(&self) -> bool {
        self.0 == Self::FORM_URLENCODED
    }

    /// Borrow the essence string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MediaType {
    type Err = HyperSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse an `Accept` header into media types ordered by quality.
///
/// Entries with `q=0` or an unparsable media range are dropped. A missing
/// or malformed `q` counts as `1.0`. The sort is stable, so equal-quality
/// entries keep header order. Duplicates keep their first position.
pub fn parse_accept(header: &str) -> Vec<MediaType> {
    let mut weighted: Vec<(MediaType, f32)> = Vec::new();

    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let Some(range) = parts.next() else { continue };
        let Ok(media) = MediaType::parse(range) else { continue };

        let quality = parts
            .filter_map(|p| {
                let (name, value) = p.split_once('=')?;
                name.trim().eq_ignore_ascii_case("q").then_some(value)
            })
            .next()
            .map(|q| q.trim().parse::<f32>().unwrap_or(1.0))
            .unwrap_or(1.0);

        if quality <= 0.0 {
            continue;
        }
        weighted.push((media, quality));
    }

    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ordered: Vec<MediaType> = Vec::with_capacity(weighted.len());
    for (media, _) in weighted {
        if !ordered.contains(&media) {
            ordered.push(media);
        }
    }
    ordered
}

/// Insertion-ordered mapping of media type → describing schema.
///
/// A `None` schema means the media type is accepted (or produced) but no
/// schema applies: no validation on input, no `describedBy` link on output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMappings {
    entries: Vec<(MediaType, Option<SchemaName>)>,
}

impl TypeMappings {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a media type described by `schema`.
    pub fn with(mut self, media: MediaType, schema: Option<SchemaName>) -> Self {
        self.insert(media, schema);
        self
    }

    /// Add (or replace) a media type with no schema.
    pub fn without_schema(self, media: MediaType) -> Self {
        self.with(media, None)
    }

    /// Build from raw `(media type, schema name)` pairs.
    ///
    /// An empty schema name maps to `None`.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, HyperSchemaError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut mappings = Self::new();
        for (media, schema) in pairs {
            let media = MediaType::parse(media)?;
            let schema = if schema.is_empty() {
                None
            } else {
                Some(SchemaName::new(schema)?)
            };
            mappings.insert(media, schema);
        }
        Ok(mappings)
    }

    /// Insert a mapping. An existing media type keeps its position.
    pub fn insert(&mut self, media: MediaType, schema: Option<SchemaName>) {
        if let Some(entry) = self.entries.iter_mut().find(|(m, _)| *m == media) {
            entry.1 = schema;
        } else {
            self.entries.push((media, schema));
        }
    }

    /// Whether `media` is mapped (with or without a schema).
    pub fn contains(&self, media: &MediaType) -> bool {
        self.entries.iter().any(|(m, _)| m == media)
    }

    /// Schema for `media`. Outer `None` means unmapped; inner `None`
    /// means mapped without a schema.
    pub fn get(&self, media: &MediaType) -> Option<Option<&SchemaName>> {
        self.entries
            .iter()
            .find(|(m, _)| m == media)
            .map(|(_, s)| s.as_ref())
    }

    /// Iterate over mappings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&MediaType, Option<&SchemaName>)> {
        self.entries.iter().map(|(m, s)| (m, s.as_ref()))
    }

    /// Number of mapped media types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no media types are mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(s: &str) -> MediaType {
        MediaType::parse(s).unwrap()
    }

    #[test]
    fn parse_strips_parameters_and_lowercases() {
        assert_eq!(mt("Application/JSON; charset=UTF-8").as_str(), "application/json");
        assert_eq!(mt("  text/plain ").as_str(), "text/plain");
    }

    #[test]
    fn parse_rejects_malformed() {
        for raw in ["", "json", "/json", "application/", "a/b/c"] {
            assert!(MediaType::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn wildcard_detection() {
        assert!(mt("*/*").is_wildcard_all());
        assert!(!mt("application/*").is_wildcard_all());
    }

    #[test]
    fn accept_orders_by_quality() {
        let parsed = parse_accept("text/html;q=0.5, application/json, application/xml;q=0.9");
        let names: Vec<&str> = parsed.iter().map(MediaType::as_str).collect();
        assert_eq!(names, ["application/json", "application/xml", "text/html"]);
    }

    #[test]
    fn accept_keeps_header_order_for_equal_quality() {
        let parsed = parse_accept("application/unsupported+json,application/vnd.test+json");
        let names: Vec<&str> = parsed.iter().map(MediaType::as_str).collect();
        assert_eq!(names, ["application/unsupported+json", "application/vnd.test+json"]);
    }

    #[test]
    fn accept_drops_zero_quality_and_garbage() {
        let parsed = parse_accept("application/json;q=0, nonsense, text/plain");
        assert_eq!(parsed, vec![mt("text/plain")]);
    }

    #[test]
    fn accept_quality_parameter_name_is_case_insensitive() {
        let parsed = parse_accept("application/json;Q=0, text/plain; q = 0.3, text/csv");
        assert_eq!(parsed, vec![mt("text/csv"), mt("text/plain")]);
    }

    #[test]
    fn accept_malformed_quality_counts_as_one() {
        let parsed = parse_accept("text/plain;q=0.2, application/json;q=abc");
        assert_eq!(parsed[0], mt("application/json"));
    }

    #[test]
    fn accept_deduplicates() {
        let parsed = parse_accept("application/json, Application/JSON;q=0.5");
        assert_eq!(parsed, vec![mt("application/json")]);
    }

    #[test]
    fn accept_empty_header() {
        assert!(parse_accept("").is_empty());
    }

    #[test]
    fn mappings_preserve_insertion_order_on_replace() {
        let mut m = TypeMappings::new()
            .with(mt("application/vnd.a+json"), Some(SchemaName::new("a").unwrap()))
            .without_schema(mt("application/json"));
        m.insert(mt("application/vnd.a+json"), None);

        let order: Vec<&str> = m.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, ["application/vnd.a+json", "application/json"]);
        assert_eq!(m.get(&mt("application/vnd.a+json")), Some(None));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn mappings_get_distinguishes_unmapped_from_schemaless() {
        let m = TypeMappings::from_pairs([("application/json", ""), ("text/csv", "rows")]).unwrap();
        assert_eq!(m.get(&mt("application/json")), Some(None));
        assert_eq!(m.get(&mt("text/csv")).flatten().map(SchemaName::as_str), Some("rows"));
        assert_eq!(m.get(&mt("text/html")), None);
        assert!(m.contains(&mt("text/csv")));
    }

    #[test]
    fn from_pairs_rejects_bad_entries() {
        assert!(TypeMappings::from_pairs([("json", "x")]).is_err());
        assert!(TypeMappings::from_pairs([("application/json", "../x")]).is_err());
    }
}
