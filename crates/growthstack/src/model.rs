use serde::{Deserialize, Serialize};

/// Five percentage-like audit metrics. Semantically 0-100 but not enforced;
/// the values come from model output and are rendered as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditScores {
    pub seo: u32,
    pub performance: u32,
    pub accessibility: u32,
    pub best_practices: u32,
    pub aeo_readiness: u32,
}

impl AuditScores {
    pub fn uniform(value: u32) -> Self {
        Self {
            seo: value,
            performance: value,
            accessibility: value,
            best_practices: value,
            aeo_readiness: value,
        }
    }

    /// Default "current" snapshot when extraction supplies none.
    pub fn baseline() -> Self {
        Self::uniform(50)
    }

    /// Default "target" snapshot when extraction supplies none.
    pub fn goal() -> Self {
        Self::uniform(95)
    }
}

/// A current/target snapshot pair; the renderer displays the delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub current: AuditScores,
    pub target: AuditScores,
}

/// Search-intent classification. The enumeration is closed, but model output
/// is not: any other string is carried through as `Other` and rendered in
/// the unknown style rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeywordIntent {
    Transactional,
    Informational,
    Navigational,
    Other(String),
}

impl From<String> for KeywordIntent {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "transactional" => KeywordIntent::Transactional,
            "informational" => KeywordIntent::Informational,
            "navigational" => KeywordIntent::Navigational,
            _ => KeywordIntent::Other(value),
        }
    }
}

impl From<KeywordIntent> for String {
    fn from(value: KeywordIntent) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for KeywordIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordIntent::Transactional => f.write_str("Transactional"),
            KeywordIntent::Informational => f.write_str("Informational"),
            KeywordIntent::Navigational => f.write_str("Navigational"),
            KeywordIntent::Other(raw) => f.write_str(raw),
        }
    }
}

/// A search term surfaced by the audit. Duplicates across the result set are
/// allowed; volume and difficulty are free-form estimates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub intent: KeywordIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// A named rival: what it does well, and how to beat it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub advantage: String,
    pub gap: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSource {
    pub source: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

/// Pillar-dependent auxiliary facts, present only when the analysis
/// surfaced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_sources: Option<Vec<ReviewSource>>,
}

/// A grounding citation: what live data the narrative drew from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub title: String,
    pub uri: String,
}

/// The unified audit result: the sole object persisted to cache and the
/// sole object consumed by rendering. Wire names stay camelCase (and the
/// citation list stays `urls`) so serialized entries remain a stable format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    pub the_difference: String,
    pub findings: Vec<String>,
    #[serde(rename = "urls", default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub competitors: Vec<Competitor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<Keyword>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl AuditResult {
    /// Minimal degraded result surfaced to the user on a generic transport
    /// failure. Never written to cache.
    pub fn service_error() -> Self {
        Self {
            text: "Error encountered.".to_string(),
            comparison: None,
            the_difference: "Service error.".to_string(),
            findings: vec!["Connection failed.".to_string()],
            citations: Vec::new(),
            competitors: Vec::new(),
            keywords: Vec::new(),
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_defaults_are_fifty_and_ninety_five() {
        assert_eq!(AuditScores::baseline(), AuditScores::uniform(50));
        assert_eq!(AuditScores::goal().aeo_readiness, 95);
    }

    #[test]
    fn scores_use_camel_case_wire_names() {
        let json = serde_json::to_value(AuditScores::baseline()).unwrap();
        assert_eq!(json["bestPractices"], 50);
        assert_eq!(json["aeoReadiness"], 50);
    }

    #[test]
    fn unknown_intent_degrades_instead_of_failing() {
        let keyword: Keyword = serde_json::from_value(serde_json::json!({
            "term": "best crm software",
            "intent": "Commercial"
        }))
        .unwrap();
        assert_eq!(
            keyword.intent,
            KeywordIntent::Other("Commercial".to_string())
        );
        assert_eq!(keyword.intent.to_string(), "Commercial");
    }

    #[test]
    fn intent_parse_is_case_insensitive() {
        let intent = KeywordIntent::from("transactional".to_string());
        assert_eq!(intent, KeywordIntent::Transactional);
        assert_eq!(String::from(intent), "Transactional");
    }

    #[test]
    fn audit_result_keeps_the_original_wire_names() {
        let result = AuditResult {
            text: "narrative".to_string(),
            comparison: Some(Comparison {
                current: AuditScores::baseline(),
                target: AuditScores::goal(),
            }),
            the_difference: "summary".to_string(),
            findings: vec!["finding".to_string()],
            citations: vec![Citation {
                title: "Example".to_string(),
                uri: "https://example.com".to_string(),
            }],
            competitors: Vec::new(),
            keywords: Vec::new(),
            metadata: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["theDifference"], "summary");
        assert_eq!(json["urls"][0]["uri"], "https://example.com");
        assert!(json.get("competitors").is_none());
    }

    #[test]
    fn cached_payloads_from_the_previous_schema_still_deserialize() {
        // Shape written by earlier releases: full camelCase object with
        // explicit empty lists.
        let raw = r#"{
            "text": "plan",
            "comparison": {
                "current": {"seo": 40, "performance": 55, "accessibility": 70, "bestPractices": 60, "aeoReadiness": 30},
                "target": {"seo": 95, "performance": 95, "accessibility": 95, "bestPractices": 95, "aeoReadiness": 95}
            },
            "theDifference": "gap",
            "findings": ["a"],
            "urls": [{"title": "t", "uri": "u"}],
            "competitors": [],
            "keywords": [{"term": "k", "intent": "Navigational"}],
            "metadata": {"channelExists": true, "channelLink": "https://youtube.com/@x"}
        }"#;
        let result: AuditResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.comparison.unwrap().current.aeo_readiness, 30);
        assert_eq!(result.keywords[0].intent, KeywordIntent::Navigational);
        assert_eq!(result.metadata.unwrap().channel_exists, Some(true));
    }

    #[test]
    fn service_error_is_the_fixed_degraded_result() {
        let result = AuditResult::service_error();
        assert_eq!(result.text, "Error encountered.");
        assert_eq!(result.findings, vec!["Connection failed.".to_string()]);
        assert_eq!(result.the_difference, "Service error.");
        assert!(result.comparison.is_none());
    }
}
