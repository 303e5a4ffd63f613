use serde::{Deserialize, Serialize};

/// One of the six fixed marketing-analysis dimensions. The set is closed;
/// adding a pillar means adding a catalog row and a prompt profile, not new
/// control flow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Pillar {
    #[serde(rename = "SEO")]
    Seo,
    #[serde(rename = "AEO")]
    Aeo,
    #[serde(rename = "YouTube")]
    Youtube,
    #[serde(rename = "Local SEO")]
    LocalSeo,
    #[serde(rename = "Social")]
    Social,
    #[serde(rename = "Reviews")]
    Reviews,
}

impl Pillar {
    /// Catalog order. The batch runner and the report both iterate this.
    pub const ALL: [Pillar; 6] = [
        Pillar::Seo,
        Pillar::Aeo,
        Pillar::Youtube,
        Pillar::LocalSeo,
        Pillar::Social,
        Pillar::Reviews,
    ];

    /// Human-facing name, used in prompts and rendering.
    pub fn name(&self) -> &'static str {
        self.info().title
    }

    /// Stable lowercase identifier used in cache keys.
    pub fn cache_id(&self) -> &'static str {
        match self {
            Pillar::Seo => "seo",
            Pillar::Aeo => "aeo",
            Pillar::Youtube => "youtube",
            Pillar::LocalSeo => "local_seo",
            Pillar::Social => "social",
            Pillar::Reviews => "reviews",
        }
    }

    pub fn info(&self) -> &'static PillarInfo {
        &PILLARS[*self as usize]
    }

    pub fn prompt_profile(&self) -> PromptProfile {
        let directive = match self {
            Pillar::Seo => {
                "Identify 10-15 high-value keywords for the entire website. Classify them by \
                 intent. Find keyword gaps where competitors are winning."
            }
            Pillar::Aeo => {
                "Focus on long-tail conversational keywords and question-based queries that \
                 trigger AI Overviews."
            }
            Pillar::Youtube => {
                "Find top-performing video keywords and tags used by industry leaders in this \
                 niche."
            }
            Pillar::LocalSeo => {
                "Identify 'near me' and geo-modified keywords. Compare map pack rankings for \
                 these specific terms."
            }
            Pillar::Social => {
                "Identify trending hashtags and brand-related keywords driving social \
                 conversations."
            }
            Pillar::Reviews => {
                "Find keywords commonly used in customer reviews (sentiment-based keywords) and \
                 compare them to rivals."
            }
        };

        match self {
            // Map-pack comparisons need the maps capability and run on the
            // stable model variant instead of the preview one.
            Pillar::LocalSeo => PromptProfile {
                directive,
                capabilities: &[ToolCapability::MapsSearch, ToolCapability::WebSearch],
                model: LOCAL_SEO_MODEL,
            },
            _ => PromptProfile {
                directive,
                capabilities: &[ToolCapability::WebSearch],
                model: DEFAULT_MODEL,
            },
        }
    }
}

impl std::fmt::Display for Pillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Model used for every pass unless a pillar profile overrides it.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
/// Override for the Local SEO narrative pass.
pub const LOCAL_SEO_MODEL: &str = "gemini-2.5-flash";

/// Grounding capability a pillar's narrative pass may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCapability {
    WebSearch,
    MapsSearch,
}

/// Prompt configuration for one pillar's narrative pass.
#[derive(Debug, Clone, Copy)]
pub struct PromptProfile {
    pub directive: &'static str,
    pub capabilities: &'static [ToolCapability],
    pub model: &'static str,
}

/// Static display metadata for one pillar. Pure reference data, defined once
/// and never constructed at runtime.
#[derive(Debug, Clone)]
pub struct PillarInfo {
    pub id: Pillar,
    pub title: &'static str,
    pub objective: &'static str,
    pub description: &'static str,
    // Display hints for graphical embedders; nothing in the CLI reads them.
    #[allow(dead_code)]
    pub icon: &'static str,
    #[allow(dead_code)]
    pub color: &'static str,
}

pub static PILLARS: [PillarInfo; 6] = [
    PillarInfo {
        id: Pillar::Seo,
        title: "SEO",
        objective: "Brings Search Traffic",
        description: "Optimize for organic search rankings to capture high-intent users.",
        icon: "fa-solid fa-magnifying-glass-chart",
        color: "from-blue-500 to-cyan-400",
    },
    PillarInfo {
        id: Pillar::Aeo,
        title: "AEO",
        objective: "Brings AI Recommendations",
        description: "Optimize content structure for LLMs, answer engines, and voice search.",
        icon: "fa-solid fa-microchip",
        color: "from-purple-500 to-indigo-400",
    },
    PillarInfo {
        id: Pillar::Youtube,
        title: "YouTube",
        objective: "Builds Trust",
        description: "Video content creates authority and human connection.",
        icon: "fa-brands fa-youtube",
        color: "from-red-600 to-rose-400",
    },
    PillarInfo {
        id: Pillar::LocalSeo,
        title: "Local SEO",
        objective: "Brings Calls",
        description: "Be visible when customers are looking for nearby services.",
        icon: "fa-solid fa-location-dot",
        color: "from-orange-500 to-amber-400",
    },
    PillarInfo {
        id: Pillar::Social,
        title: "Social",
        objective: "Brand Remembered",
        description: "Stay top-of-mind through consistent engagement.",
        icon: "fa-solid fa-share-nodes",
        color: "from-pink-500 to-rose-400",
    },
    PillarInfo {
        id: Pillar::Reviews,
        title: "Reviews",
        objective: "Converts Leads",
        description: "Social proof is the final nudge for prospects.",
        icon: "fa-solid fa-star",
        color: "from-emerald-500 to-teal-400",
    },
];
