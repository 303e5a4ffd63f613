//! Analysis orchestrator.
//!
//! Two sequential model calls per pillar: a grounded free-text narrative,
//! then a structured JSON extraction over that narrative. The merged result
//! is cached per (pillar, domain); model-call errors propagate to the caller
//! untouched and nothing is cached on error.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use growthstack_common::gemini::{
    Content, ContentModel, GenerateContentRequest, GenerationConfig, Tool, ToolConfig,
};
use growthstack_common::store::KeyValueStore;

use crate::cache::AuditCache;
use crate::error::AppError;
use crate::model::{AuditResult, AuditScores, Citation, Comparison, Competitor, Keyword, Metadata};
use crate::pillar::{Pillar, ToolCapability, DEFAULT_MODEL};

const SYSTEM_PERSONA: &str = "You are a world-class forensic marketing analyst. You specialize \
in COMPETITIVE INTELLIGENCE and KEYWORD AUDITING. For any domain provided, you must identify \
its top keywords, its competitors, and perform a comparative audit. Search for ACTUAL keyword \
data, search volume estimates, and user intent (Transactional vs Informational).";

const FALLBACK_SUMMARY: &str = "Data extracted with fallback formatting.";
const FALLBACK_FINDING: &str = "Review the Strategy Plan for full details.";
const FAILED_NARRATIVE: &str = "Analysis failed.";

/// Best-effort coordinates for map-grounded pillars. Absence never blocks an
/// analysis.
#[derive(Debug, Clone, Copy)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub struct Analyzer<M, S> {
    model: M,
    cache: AuditCache<S>,
}

impl<M: ContentModel, S: KeyValueStore> Analyzer<M, S> {
    pub fn new(model: M, cache: AuditCache<S>) -> Self {
        Self { model, cache }
    }

    /// Produce the unified audit result for one (pillar, domain) pair,
    /// either from cache or by driving both model passes.
    pub async fn analyze(
        &self,
        pillar: Pillar,
        domain: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<AuditResult, AppError> {
        if let Some(hit) = self.cache.get(pillar, domain).await {
            debug!(pillar = %pillar, domain, "cache hit");
            return Ok(hit);
        }

        let narrative = self.narrative_pass(pillar, domain, coordinates).await?;
        let payload = self.extraction_pass(domain, &narrative.text).await?;
        let result = merge(narrative, payload);

        self.cache.set(pillar, domain, &result).await;
        Ok(result)
    }

    /// Pass 1: grounded free-text analysis. Captures the narrative and the
    /// grounding citations it drew from.
    async fn narrative_pass(
        &self,
        pillar: Pillar,
        domain: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<Narrative, AppError> {
        let profile = pillar.prompt_profile();

        let mut request = GenerateContentRequest::from_prompt(main_prompt(pillar, domain));
        request.system_instruction = Some(Content::from_text(format!(
            "{SYSTEM_PERSONA} {}",
            profile.directive
        )));
        request.tools = profile
            .capabilities
            .iter()
            .map(|capability| match capability {
                ToolCapability::WebSearch => Tool::web_search(),
                ToolCapability::MapsSearch => Tool::maps_search(),
            })
            .collect();
        if profile.capabilities.contains(&ToolCapability::MapsSearch) {
            if let Some(at) = coordinates {
                request.tool_config = Some(ToolConfig::near(at.latitude, at.longitude));
            }
        }

        let response = self.model.generate(profile.model, request).await?;
        let citations = response
            .grounding_sources()
            .into_iter()
            .filter_map(|source| {
                source.uri.map(|uri| Citation {
                    title: source.title.unwrap_or_default(),
                    uri,
                })
            })
            .collect();

        Ok(Narrative {
            text: response.text(),
            citations,
        })
    }

    /// Pass 2: feed the narrative back and extract the structured payload in
    /// strict JSON mode. An unparseable reply substitutes the whole fallback
    /// payload; it never fails the analysis.
    async fn extraction_pass(
        &self,
        domain: &str,
        report: &str,
    ) -> Result<StructuredPayload, AppError> {
        let mut request = GenerateContentRequest::from_prompt(extraction_prompt(domain, report));
        request.generation_config = Some(GenerationConfig::json(extraction_schema()));

        let response = self.model.generate(DEFAULT_MODEL, request).await?;
        let raw = response.text();
        let payload = serde_json::from_str::<StructuredPayload>(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "structured extraction parse failed, using fallback payload");
            StructuredPayload::fallback()
        });
        Ok(payload)
    }
}

struct Narrative {
    text: String,
    citations: Vec<Citation>,
}

/// The pass-2 payload. Every field is optional so a partially valid reply
/// still merges; per-field defaults are applied in [`merge`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StructuredPayload {
    current: Option<AuditScores>,
    target: Option<AuditScores>,
    the_difference: Option<String>,
    findings: Option<Vec<String>>,
    competitors: Option<Vec<Competitor>>,
    keywords: Option<Vec<Keyword>>,
    metadata: Option<Metadata>,
}

impl StructuredPayload {
    fn fallback() -> Self {
        Self {
            current: Some(AuditScores::baseline()),
            target: Some(AuditScores::goal()),
            the_difference: Some(FALLBACK_SUMMARY.to_string()),
            findings: Some(vec![FALLBACK_FINDING.to_string()]),
            competitors: Some(Vec::new()),
            keywords: Some(Vec::new()),
            metadata: None,
        }
    }
}

/// Merge the two passes. Defaults are per-field: a payload that supplies
/// `current` but omits `target` still gets the 95s target independently.
fn merge(narrative: Narrative, payload: StructuredPayload) -> AuditResult {
    let text = if narrative.text.is_empty() {
        FAILED_NARRATIVE.to_string()
    } else {
        narrative.text
    };

    AuditResult {
        text,
        comparison: Some(Comparison {
            current: payload.current.unwrap_or_else(AuditScores::baseline),
            target: payload.target.unwrap_or_else(AuditScores::goal),
        }),
        the_difference: payload
            .the_difference
            .unwrap_or_else(|| FALLBACK_SUMMARY.to_string()),
        findings: payload.findings.unwrap_or_default(),
        citations: narrative.citations,
        competitors: payload.competitors.unwrap_or_default(),
        keywords: payload.keywords.unwrap_or_default(),
        metadata: payload.metadata,
    }
}

fn main_prompt(pillar: Pillar, domain: &str) -> String {
    format!(
        "Deep-scan domain \"{domain}\" for the \"{pillar}\" pillar.\n\
         REQUIRED ACTIONS:\n\
         1. Extract a \"Keyword Landscape\" for the entire website: 5-10 primary and secondary keywords.\n\
         2. Identify 2-3 top competitors.\n\
         3. Perform a side-by-side comparison of {pillar} metrics.\n\
         4. Provide 3-5 forensic discoveries from the search data.\n\
         5. Draft a roadmap to dominate these keywords."
    )
}

fn extraction_prompt(domain: &str, report: &str) -> String {
    format!(
        "Extract domain-specific analysis data for \"{domain}\" from the following report.\n\n\
         REPORT: \"{report}\"\n\n\
         Respond with a single JSON object: current and target audit scores \
         (seo, performance, accessibility, bestPractices, aeoReadiness), theDifference summary, \
         findings, competitors (name, url, advantage, gap), keywords (term, intent, volume, \
         difficulty), and metadata (channelExists, channelLink, reviewSources)."
    )
}

/// Response schema for the extraction pass, in the OpenAPI subset the model
/// API accepts.
fn extraction_schema() -> serde_json::Value {
    let scores = json!({
        "type": "OBJECT",
        "properties": {
            "seo": {"type": "INTEGER"},
            "performance": {"type": "INTEGER"},
            "accessibility": {"type": "INTEGER"},
            "bestPractices": {"type": "INTEGER"},
            "aeoReadiness": {"type": "INTEGER"}
        }
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "current": scores.clone(),
            "target": scores,
            "theDifference": {"type": "STRING"},
            "findings": {"type": "ARRAY", "items": {"type": "STRING"}},
            "keywords": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "term": {"type": "STRING"},
                        "intent": {"type": "STRING"},
                        "volume": {"type": "STRING"},
                        "difficulty": {"type": "STRING"}
                    },
                    "required": ["term", "intent"]
                }
            },
            "competitors": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {"type": "STRING"},
                        "url": {"type": "STRING"},
                        "advantage": {"type": "STRING"},
                        "gap": {"type": "STRING"}
                    }
                }
            },
            "metadata": {
                "type": "OBJECT",
                "properties": {
                    "channelExists": {"type": "BOOLEAN"},
                    "channelLink": {"type": "STRING"},
                    "reviewSources": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "source": {"type": "STRING"},
                                "count": {"type": "INTEGER"},
                                "rating": {"type": "NUMBER"}
                            }
                        }
                    }
                }
            }
        },
        "required": ["keywords", "competitors", "findings", "theDifference"]
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache;
    use crate::testutil::{grounded_response, text_response, MemoryStore, ScriptedModel};
    use growthstack_common::gemini::GeminiError;

    fn analyzer(
        replies: Vec<Result<growthstack_common::gemini::GenerateContentResponse, GeminiError>>,
    ) -> (
        Analyzer<Arc<ScriptedModel>, Arc<MemoryStore>>,
        Arc<ScriptedModel>,
        Arc<MemoryStore>,
    ) {
        let model = Arc::new(ScriptedModel::new(replies));
        let store = Arc::new(MemoryStore::default());
        let analyzer = Analyzer::new(Arc::clone(&model), AuditCache::new(Arc::clone(&store)));
        (analyzer, model, store)
    }

    fn valid_payload() -> String {
        serde_json::json!({
            "current": {"seo": 40, "performance": 55, "accessibility": 70, "bestPractices": 60, "aeoReadiness": 30},
            "target": {"seo": 90, "performance": 92, "accessibility": 94, "bestPractices": 96, "aeoReadiness": 98},
            "theDifference": "Large gap in AEO coverage.",
            "findings": ["Competitors own the snippet space."],
            "competitors": [{"name": "Rival Inc", "url": "https://rival.example", "advantage": "brand", "gap": "outrank on long-tail"}],
            "keywords": [{"term": "best widgets", "intent": "Transactional", "volume": "10k", "difficulty": "38"}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache_without_model_invocation() {
        let (analyzer, model, _) = analyzer(vec![
            Ok(text_response("narrative")),
            Ok(text_response(&valid_payload())),
        ]);

        let first = analyzer.analyze(Pillar::Seo, "example.com", None).await.unwrap();
        assert_eq!(model.calls(), 2);

        // No scripted replies remain; any further model call would panic.
        let second = analyzer.analyze(Pillar::Seo, "example.com", None).await.unwrap();
        assert_eq!(model.calls(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_extraction_uses_the_fallback_payload_and_is_cached() {
        let (analyzer, _, store) = analyzer(vec![
            Ok(text_response("the strategy plan")),
            Ok(text_response("```not json at all")),
        ]);

        let result = analyzer.analyze(Pillar::Aeo, "example.com", None).await.unwrap();
        let comparison = result.comparison.clone().expect("comparison always present");
        assert_eq!(comparison.current, AuditScores::uniform(50));
        assert_eq!(comparison.target, AuditScores::uniform(95));
        assert_eq!(result.findings.len(), 1);
        assert!(result.competitors.is_empty());
        assert!(result.keywords.is_empty());
        assert!(!result.the_difference.is_empty());
        assert_eq!(result.text, "the strategy plan");

        let cached = store
            .get(&cache::cache_key(Pillar::Aeo, "example.com"))
            .await
            .expect("fallback result is still cached");
        let parsed: AuditResult = serde_json::from_str(&cached).unwrap();
        assert_eq!(parsed, result);
    }

    #[tokio::test]
    async fn partial_payload_gets_per_field_defaults() {
        let payload = serde_json::json!({
            "current": {"seo": 12, "performance": 34, "accessibility": 56, "bestPractices": 78, "aeoReadiness": 90}
        })
        .to_string();
        let (analyzer, _, _) = analyzer(vec![
            Ok(text_response("report")),
            Ok(text_response(&payload)),
        ]);

        let result = analyzer.analyze(Pillar::Seo, "example.com", None).await.unwrap();
        let comparison = result.comparison.unwrap();
        assert_eq!(comparison.current.seo, 12);
        assert_eq!(comparison.current.aeo_readiness, 90);
        assert_eq!(comparison.target, AuditScores::uniform(95));
        assert!(result.findings.is_empty());
        assert!(!result.the_difference.is_empty());
    }

    #[tokio::test]
    async fn auth_error_propagates_and_nothing_is_cached() {
        let (analyzer, _, store) = analyzer(vec![Err(GeminiError::Auth {
            message: "no credential selected".to_string(),
        })]);

        let err = analyzer
            .analyze(Pillar::Seo, "example.com", None)
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert!(store
            .get(&cache::cache_key(Pillar::Seo, "example.com"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn non_auth_error_is_distinguishable() {
        let transport_err = serde_json::from_str::<serde_json::Value>("upstream down").unwrap_err();
        let (analyzer, _, _) = analyzer(vec![Err(GeminiError::InvalidJson(transport_err))]);

        let err = analyzer
            .analyze(Pillar::Seo, "example.com", None)
            .await
            .unwrap_err();
        assert!(!err.is_auth());
    }

    #[tokio::test]
    async fn empty_narrative_is_replaced_by_the_failure_sentinel() {
        let (analyzer, _, _) = analyzer(vec![
            Ok(Default::default()),
            Ok(text_response(&valid_payload())),
        ]);

        let result = analyzer.analyze(Pillar::Social, "example.com", None).await.unwrap();
        assert_eq!(result.text, "Analysis failed.");
        // Structured fields still merge normally.
        assert_eq!(result.keywords.len(), 1);
    }

    #[tokio::test]
    async fn grounding_citations_are_filtered_and_attached() {
        let chunks = serde_json::json!([
            {"web": {"title": "SERP study", "uri": "https://serp.example"}},
            {},
            {"maps": {"title": "Map pack", "uri": "https://maps.example"}},
            {"web": {"title": "no uri, dropped"}}
        ]);
        let (analyzer, _, _) = analyzer(vec![
            Ok(grounded_response("narrative", chunks)),
            Ok(text_response(&valid_payload())),
        ]);

        let result = analyzer.analyze(Pillar::Seo, "example.com", None).await.unwrap();
        assert_eq!(result.citations.len(), 2);
        assert_eq!(result.citations[0].title, "SERP study");
        assert_eq!(result.citations[1].uri, "https://maps.example");
    }

    #[tokio::test]
    async fn local_seo_requests_maps_grounding_and_the_model_override() {
        let (analyzer, model, _) = analyzer(vec![
            Ok(text_response("narrative")),
            Ok(text_response(&valid_payload())),
        ]);

        analyzer
            .analyze(
                Pillar::LocalSeo,
                "example.com",
                Some(Coordinates {
                    latitude: 40.7,
                    longitude: -74.0,
                }),
            )
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        let (narrative_model, narrative_request) = &requests[0];
        assert_eq!(narrative_model, "gemini-2.5-flash");
        let narrative_json = serde_json::to_value(narrative_request).unwrap();
        assert!(narrative_json["tools"][0]["googleMaps"].is_object());
        assert!(narrative_json["tools"][1]["googleSearch"].is_object());
        assert_eq!(
            narrative_json["toolConfig"]["retrievalConfig"]["latLng"]["longitude"],
            -74.0
        );
        assert!(narrative_json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("map pack rankings"));

        let (extraction_model, extraction_request) = &requests[1];
        assert_eq!(extraction_model, DEFAULT_MODEL);
        let extraction_json = serde_json::to_value(extraction_request).unwrap();
        assert_eq!(
            extraction_json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            extraction_json["generationConfig"]["responseSchema"]["required"][3],
            "theDifference"
        );
    }

    #[tokio::test]
    async fn coordinates_are_omitted_when_not_supplied() {
        let (analyzer, model, _) = analyzer(vec![
            Ok(text_response("narrative")),
            Ok(text_response(&valid_payload())),
        ]);

        analyzer
            .analyze(Pillar::LocalSeo, "example.com", None)
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        let narrative_json = serde_json::to_value(&requests[0].1).unwrap();
        assert!(narrative_json.get("toolConfig").is_none());
    }
}
