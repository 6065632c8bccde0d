//! Brand identity data model.
//!
//! These are the boundary types: what the pipeline assembles, what the
//! cache stores, and what clients receive. Everything serializes to JSON
//! with snake_case fields, and timestamps cross the boundary as fractional
//! seconds since the Unix epoch.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// A logo candidate discovered on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logo {
    /// Absolute URL of the image.
    pub url: String,
    /// Alt text or title attached to the image, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Name of the extraction strategy that found it.
    pub source: String,
    /// Strategy-assigned confidence, higher is better.
    pub score: u32,
}

/// Role a color plays in the assembled palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRole {
    /// The dominant brand color.
    Primary,
    /// The second most prominent color.
    Secondary,
    /// A highlight color.
    Accent,
}

/// A ranked brand color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColor {
    /// Normalized `#rrggbb` form.
    pub hex: String,
    /// Position in the palette.
    pub role: ColorRole,
    /// Combined occurrence weight across strategies.
    pub weight: u32,
}

/// The assembled brand identity for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandIdentity {
    /// The URL as requested.
    pub url: String,
    /// Where the renderer actually landed after redirects, when it differs
    /// from the requested URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    /// Site or brand name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Short site description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Logo candidates, best first.
    pub logos: Vec<Logo>,
    /// Palette, primary first.
    pub colors: Vec<BrandColor>,
    /// When the page was fetched, seconds since epoch.
    pub fetched_at: f64,
    /// Whether this result was served from the cache. Never stored as
    /// true; set on the way out of a cache hit.
    #[serde(default)]
    pub from_cache: bool,
    /// Extraction steps that failed and fell back to their documented
    /// default for this result.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_steps: Vec<String>,
}

impl BrandIdentity {
    /// An empty identity for `url`, the shape every extraction failure
    /// degrades toward.
    pub fn empty(url: impl Into<String>, fetched_at: f64) -> Self {
        Self {
            url: url.into(),
            final_url: None,
            name: None,
            description: None,
            logos: Vec::new(),
            colors: Vec::new(),
            fetched_at,
            from_cache: false,
            degraded_steps: Vec::new(),
        }
    }
}

/// One extraction request as the pipeline receives it.
///
/// Not a wire type: the cancellation handle exists only in-process, so
/// transport adapters build this from their own request representation.
#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    /// Target website. A bare domain is accepted and upgraded to https.
    pub url: String,
    /// Identity used to bucket rate-limit state, typically a network
    /// address or API credential.
    pub client_identity: String,
    /// Caller-supplied trace id; one is generated when absent.
    pub request_id: Option<String>,
    /// Cooperative cancellation handle for client disconnects.
    pub cancel: Option<CancellationToken>,
}

impl ExtractRequest {
    /// A request with no trace id and no cancellation handle.
    pub fn new(url: impl Into<String>, client_identity: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_identity: client_identity.into(),
            request_id: None,
            cancel: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_without_absent_fields() {
        let identity = BrandIdentity::empty("https://example.com", 1_700_000_000.5);
        let value = serde_json::to_value(&identity).unwrap();

        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["fetched_at"], json!(1_700_000_000.5));
        assert_eq!(value["from_cache"], json!(false));
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("name"));
        assert!(!object.contains_key("final_url"));
        assert!(!object.contains_key("degraded_steps"));
    }

    #[test]
    fn deserializes_cached_document_with_defaults() {
        let stored = json!({
            "url": "https://example.com",
            "name": "Example",
            "logos": [
                {"url": "https://example.com/logo.svg", "source": "meta_tag_logo", "score": 80}
            ],
            "colors": [
                {"hex": "#102030", "role": "primary", "weight": 12}
            ],
            "fetched_at": 1_700_000_000.0
        });

        let identity: BrandIdentity = serde_json::from_value(stored).unwrap();
        assert_eq!(identity.name.as_deref(), Some("Example"));
        assert!(!identity.from_cache);
        assert!(identity.degraded_steps.is_empty());
        assert_eq!(identity.logos[0].alt, None);
        assert_eq!(identity.colors[0].role, ColorRole::Primary);
    }

    #[test]
    fn color_roles_use_snake_case_names() {
        assert_eq!(
            serde_json::to_value(ColorRole::Primary).unwrap(),
            json!("primary")
        );
        assert_eq!(
            serde_json::to_value(ColorRole::Accent).unwrap(),
            json!("accent")
        );
    }

    #[test]
    fn identity_roundtrips() {
        let identity = BrandIdentity {
            url: "https://example.com".to_string(),
            final_url: Some("https://www.example.com/".to_string()),
            name: Some("Example".to_string()),
            description: Some("An example".to_string()),
            logos: vec![Logo {
                url: "https://example.com/logo.png".to_string(),
                alt: Some("Example logo".to_string()),
                source: "img_tag_logo".to_string(),
                score: 60,
            }],
            colors: vec![BrandColor {
                hex: "#336699".to_string(),
                role: ColorRole::Primary,
                weight: 9,
            }],
            fetched_at: 1_700_000_123.25,
            from_cache: false,
            degraded_steps: vec!["stylesheet_colors".to_string()],
        };

        let value = serde_json::to_value(&identity).unwrap();
        let back: BrandIdentity = serde_json::from_value(value).unwrap();
        assert_eq!(back, identity);
    }
}
