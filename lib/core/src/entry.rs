//! Template entries: one reusable component blueprint per corpus record.

use crate::role::PageRole;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Keys that mark a schema slot as holding an image, compared lowercase
pub const IMAGE_KEY_NAMES: [&str; 7] = [
    "src",
    "avatar",
    "logo",
    "background",
    "photo",
    "icon",
    "thumbnail",
];

const IMAGE_KEY_SUFFIXES: [&str; 4] = ["src", "avatar", "background", "photo"];

/// Whether a props-schema key names an image slot
pub fn is_image_key(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains("image")
        || IMAGE_KEY_NAMES.contains(&key.as_str())
        || IMAGE_KEY_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

/// A reusable UI-component blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Prop name -> schema fragment, in dataset order
    #[serde(default)]
    pub props_schema: Map<String, Value>,
    #[serde(default)]
    pub must_have: Vec<String>,
    #[serde(default)]
    pub example_props: Map<String, Value>,
    #[serde(default)]
    pub images_required: bool,
    #[serde(default)]
    pub image_keywords: Vec<String>,
    #[serde(default)]
    pub page_role: PageRole,
}

impl TemplateEntry {
    /// Minimal entry of the given type; every other field takes its default
    pub fn new(kind: impl Into<String>, page_role: PageRole) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            industries: Vec::new(),
            tags: Vec::new(),
            description: String::new(),
            props_schema: Map::new(),
            must_have: Vec::new(),
            example_props: Map::new(),
            images_required: false,
            image_keywords: Vec::new(),
            page_role,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_industries<I, S>(mut self, industries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.industries = industries.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_schema_key(mut self, key: impl Into<String>, schema: Value) -> Self {
        self.props_schema.insert(key.into(), schema);
        self
    }

    #[must_use]
    pub fn with_example_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.example_props.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_image_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Props-schema keys in dataset order
    pub fn schema_keys(&self) -> impl Iterator<Item = &str> {
        self.props_schema.keys().map(String::as_str)
    }

    pub fn has_image_slot(&self) -> bool {
        self.schema_keys().any(is_image_key)
    }

    pub fn is_general(&self) -> bool {
        self.tags.iter().any(|t| t.trim().eq_ignore_ascii_case("general"))
    }

    /// Industry labels and tags, which both count for industry matching
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.industries
            .iter()
            .chain(self.tags.iter())
            .map(String::as_str)
    }

    /// Identity used to keep one logical entry from appearing twice in a slate
    pub fn dedup_key(&self, role: PageRole) -> String {
        match &self.id {
            Some(id) if !id.trim().is_empty() => format!("id:{}", id.trim()),
            _ => format!("type:{}|{}", self.kind, role.as_str()),
        }
    }

    /// Content words for keyword overlap: type, tags, description and the
    /// props schema (keys plus string values). Field labels and industries
    /// stay out; industries are matched by the industry boost instead.
    pub fn lexical_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.kind.as_str()];
        parts.extend(self.tags.iter().map(String::as_str));
        parts.push(self.description.as_str());
        for (key, value) in &self.props_schema {
            parts.push(key.as_str());
            if let Some(text) = value.as_str() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    /// Text fed to the embedder
    pub fn retrieval_text(&self) -> String {
        let schema = serde_json::to_string(&self.props_schema).unwrap_or_default();
        format!(
            "type: {}\ntags: {}\nindustries: {}\nnotes: {}\npropsSchema: {}",
            self.kind,
            self.tags.join(", "),
            self.industries.join(", "),
            self.description,
            schema
        )
    }
}

/// Wire shape of one dataset line. Field spellings vary across dataset
/// revisions, so this is looser than [`TemplateEntry`] and gets validated on
/// conversion.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, deserialize_with = "nullable_string")]
    id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "nullable_string")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    industry: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    industries: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    notes: Option<String>,
    #[serde(default, deserialize_with = "object_or_keys")]
    props_schema: Map<String, Value>,
    #[serde(default, deserialize_with = "one_or_many")]
    must_have: Vec<String>,
    #[serde(default, deserialize_with = "object_or_keys")]
    example_props: Map<String, Value>,
    #[serde(default)]
    images_required: Option<bool>,
    #[serde(default, deserialize_with = "one_or_many")]
    image_keywords: Vec<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    page_role: Option<String>,
}

impl TryFrom<RawRecord> for TemplateEntry {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let kind = raw
            .kind
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| "missing or blank `type`".to_string())?;

        let mut industries = raw.industries;
        for industry in raw.industry {
            if !industries.contains(&industry) {
                industries.push(industry);
            }
        }

        let description = raw
            .description
            .filter(|d| !d.trim().is_empty())
            .or(raw.notes)
            .unwrap_or_default();

        Ok(TemplateEntry {
            id: raw.id.filter(|id| !id.trim().is_empty()),
            kind,
            industries,
            tags: raw.tags,
            description,
            props_schema: raw.props_schema,
            must_have: raw.must_have,
            example_props: raw.example_props,
            images_required: raw.images_required.unwrap_or(false),
            image_keywords: raw.image_keywords,
            page_role: raw
                .page_role
                .as_deref()
                .map(PageRole::parse_lenient)
                .unwrap_or_default(),
        })
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts `{"title": {...}}` or a bare key list `["title", "image"]`
fn object_or_keys<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(|k| (k.to_string(), Value::Null)))
            .collect(),
        _ => Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<TemplateEntry, String> {
        let raw: RawRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
        TemplateEntry::try_from(raw)
    }

    #[test]
    fn test_full_record() {
        let entry = parse(json!({
            "id": "hero-1",
            "type": "Hero",
            "industry": ["restaurant"],
            "tags": ["warm", "general"],
            "notes": "Big opener",
            "propsSchema": {"title": "string", "backgroundImage": "url"},
            "exampleProps": {"title": "Welcome"},
            "imagesRequired": true,
            "imageKeywords": ["pasta"],
            "pageRole": "hero"
        }))
        .unwrap();

        assert_eq!(entry.id.as_deref(), Some("hero-1"));
        assert_eq!(entry.kind, "Hero");
        assert_eq!(entry.industries, vec!["restaurant"]);
        assert_eq!(entry.description, "Big opener");
        assert_eq!(entry.schema_keys().collect::<Vec<_>>(), vec!["title", "backgroundImage"]);
        assert!(entry.has_image_slot());
        assert!(entry.is_general());
        assert_eq!(entry.page_role, PageRole::Hero);
    }

    #[test]
    fn test_defaults_and_loose_shapes() {
        let entry = parse(json!({
            "type": "  Footer ",
            "tags": "general",
            "industries": null,
            "propsSchema": ["links", "logo"],
            "pageRole": "not-a-role"
        }))
        .unwrap();

        assert_eq!(entry.kind, "Footer");
        assert_eq!(entry.tags, vec!["general"]);
        assert!(entry.industries.is_empty());
        assert_eq!(entry.page_role, PageRole::Aux);
        assert!(entry.has_image_slot());
        assert!(!entry.images_required);
    }

    #[test]
    fn test_missing_type_rejected() {
        assert!(parse(json!({"tags": ["x"]})).is_err());
        assert!(parse(json!({"type": "   "})).is_err());
    }

    #[test]
    fn test_image_key_detection() {
        for key in ["image", "heroImage", "SRC", "avatar", "logo", "backgroundPhoto", "thumbnail", "iconSrc"] {
            assert!(is_image_key(key), "{key} should be image-like");
        }
        for key in ["title", "subtitle", "links", "ctaLabel"] {
            assert!(!is_image_key(key), "{key} should not be image-like");
        }
    }

    #[test]
    fn test_dedup_key_prefers_id() {
        let with_id = TemplateEntry::new("Hero", PageRole::Hero).with_id("h1");
        let without = TemplateEntry::new("Hero", PageRole::Hero);
        assert_eq!(with_id.dedup_key(PageRole::Hero), "id:h1");
        assert_eq!(without.dedup_key(PageRole::Hero), "type:Hero|hero");
    }

    #[test]
    fn test_retrieval_text_mentions_fields() {
        let entry = TemplateEntry::new("Gallery", PageRole::Media)
            .with_tags(["photos"])
            .with_description("Image grid")
            .with_schema_key("images", json!("array"));
        let text = entry.retrieval_text();
        assert!(text.contains("type: Gallery"));
        assert!(text.contains("tags: photos"));
        assert!(text.contains("notes: Image grid"));
        assert!(text.contains("\"images\""));
    }

    #[test]
    fn test_lexical_text_skips_labels_and_industries() {
        let entry = TemplateEntry::new("Gallery", PageRole::Media)
            .with_industries(["restaurant"])
            .with_tags(["photos"])
            .with_description("Image grid")
            .with_schema_key("images", json!("array"));
        assert_eq!(entry.lexical_text(), "Gallery photos Image grid images array");
    }

    #[test]
    fn test_canonical_serde_roundtrip() {
        let entry = TemplateEntry::new("Stats", PageRole::Value)
            .with_id("s1")
            .with_example_prop("items", json!([1, 2]));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "Stats");
        assert_eq!(json["pageRole"], "value");
        let back: TemplateEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
