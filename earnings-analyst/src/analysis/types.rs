//! Data structures for the transcript analysis pipeline
//!
//! Records produced by the model are decoded leniently (see
//! [`lenient`](super::lenient)) and always serialize every field, so
//! consumers never have to handle a missing key.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Speaker sentinel for quotes with no attribution
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// Speaker sentinel for quotes synthesized by the pipeline
pub const SYSTEM_SPEAKER: &str = "System";

/// `format` marker on plans built without a parsed model response
pub const FALLBACK_FORMAT: &str = "fallback";

/// Stand-in for a blank section id
pub const UNIDENTIFIED_SECTION: &str = "unidentified_section";

/// Stand-in for a blank section name
pub const UNTITLED_SECTION: &str = "Untitled Section";

/// Stand-in for a blank section description
pub const NO_DESCRIPTION: &str = "No description provided.";

/// Longest raw response kept on a fallback plan
const MAX_RAW_RESPONSE_CHARS: usize = 4000;

fn default_enabled() -> bool {
    true
}

fn or_sentinel<'a>(value: &'a str, sentinel: &'a str) -> &'a str {
    if value.trim().is_empty() {
        sentinel
    } else {
        value
    }
}

// ============================================================================
// Section Descriptors
// ============================================================================

/// One report section, as supplied by the section template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    /// Stable key
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,

    /// Display name
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,

    /// Free-text requirement for what the section must cover
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,

    /// Disabled sections are dropped before the run starts
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SectionDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            enabled: true,
        }
    }

    /// Id, or [`UNIDENTIFIED_SECTION`] when blank
    pub fn display_id(&self) -> &str {
        or_sentinel(&self.id, UNIDENTIFIED_SECTION)
    }

    /// Name, or [`UNTITLED_SECTION`] when blank
    pub fn display_name(&self) -> &str {
        or_sentinel(&self.name, UNTITLED_SECTION)
    }

    /// Description, or [`NO_DESCRIPTION`] when blank
    pub fn display_description(&self) -> &str {
        or_sentinel(&self.description, NO_DESCRIPTION)
    }
}

/// Keep enabled sections, preserving order
pub fn enabled_sections(sections: Vec<SectionDescriptor>) -> Vec<SectionDescriptor> {
    sections.into_iter().filter(|s| s.enabled).collect()
}

// ============================================================================
// Research Plan Types (stage 1)
// ============================================================================

/// Planning-stage output for one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlanRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub section_id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub section_name: String,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub research_plan: ResearchPlan,

    /// Set to [`FALLBACK_FORMAT`] when no structured plan could be parsed
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub format: Option<String>,
}

impl ResearchPlanRecord {
    /// Minimal plan for a section whose response held no usable structure
    pub fn fallback(section: &SectionDescriptor, raw_response: &str) -> Self {
        let mut extra = Map::new();
        extra.insert(
            "raw_response".to_string(),
            Value::String(raw_response.chars().take(MAX_RAW_RESPONSE_CHARS).collect()),
        );

        Self {
            section_id: section.display_id().to_string(),
            section_name: section.display_name().to_string(),
            research_plan: ResearchPlan {
                extra,
                ..ResearchPlan::default()
            },
            format: Some(FALLBACK_FORMAT.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.format.as_deref() == Some(FALLBACK_FORMAT)
    }

    /// Fill blank identity fields from the section that was being planned
    pub fn normalize(mut self, section: &SectionDescriptor) -> Self {
        if self.section_id.trim().is_empty() {
            self.section_id = section.display_id().to_string();
        }
        if self.section_name.trim().is_empty() {
            self.section_name = section.display_name().to_string();
        }
        self
    }
}

/// What to extract for a section and how to organize it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Requirement text carried forward to the analysis stage
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub content_availability: ContentAvailability,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub extraction_strategy: ExtractionStrategy,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub organization: Organization,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub integration_notes: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub quality_considerations: Vec<String>,

    /// Keys the model added beyond the requested shape
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Content found in the transcript, bucketed by priority
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAvailability {
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub high_priority: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub medium_priority: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub low_priority: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStrategy {
    #[serde(default, deserialize_with = "lenient::string")]
    pub approach: String,

    /// Quotes worth pulling verbatim
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub quote_targets: Vec<String>,

    /// Figures worth capturing
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub metric_targets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Planned subsection headings, in order
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub structure: Vec<String>,
}

// ============================================================================
// Section Analysis Types (stage 2)
// ============================================================================

/// Analysis-stage output for one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysisRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub section_name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub section_title: String,

    /// Synthesized narrative for the whole section
    #[serde(default, deserialize_with = "lenient::string")]
    pub section_statement: String,

    #[serde(default, deserialize_with = "lenient::items")]
    pub content: Vec<Subsection>,
}

impl SectionAnalysisRecord {
    /// Minimal analysis for a section whose response held no usable structure
    pub fn fallback(section: &SectionDescriptor) -> Self {
        Self {
            section_name: section.display_name().to_string(),
            section_title: section.display_name().to_string(),
            section_statement: format!(
                "Structured analysis for {} could not be parsed from the model response.",
                section.display_name()
            ),
            content: Vec::new(),
        }
    }

    /// Fill blank identity fields and speaker sentinels
    pub fn normalize(mut self, section: &SectionDescriptor) -> Self {
        if self.section_name.trim().is_empty() {
            self.section_name = section.display_name().to_string();
        }
        if self.section_title.trim().is_empty() {
            self.section_title = self.section_name.clone();
        }
        for subsection in &mut self.content {
            for quote in &mut subsection.quotes {
                quote.speaker.fill_unknown();
            }
        }
        self
    }

    /// Total quotes across all subsections
    pub fn quote_count(&self) -> usize {
        self.content.iter().map(|s| s.quotes.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    #[serde(default, alias = "title", deserialize_with = "lenient::string")]
    pub subsection_title: String,

    #[serde(default, deserialize_with = "lenient::items")]
    pub quotes: Vec<Quote>,
}

/// A transcript quote with attribution. All five fields are always
/// serialized; `context: null` marks a quote with no surrounding context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Exact text, may carry inline `**emphasis**`
    #[serde(default, alias = "text", deserialize_with = "lenient::string")]
    pub quote: String,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub context: Option<String>,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub speaker: Speaker,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub sentiment: Sentiment,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Speaker {
    pub name: String,
    pub title: String,
    pub company: String,
}

impl Default for Speaker {
    fn default() -> Self {
        Self {
            name: UNKNOWN_SPEAKER.to_string(),
            title: UNKNOWN_SPEAKER.to_string(),
            company: UNKNOWN_SPEAKER.to_string(),
        }
    }
}

impl Speaker {
    pub fn system() -> Self {
        Self {
            name: SYSTEM_SPEAKER.to_string(),
            title: SYSTEM_SPEAKER.to_string(),
            company: SYSTEM_SPEAKER.to_string(),
        }
    }

    fn fill_unknown(&mut self) {
        for field in [&mut self.name, &mut self.title, &mut self.company] {
            if field.trim().is_empty() {
                *field = UNKNOWN_SPEAKER.to_string();
            }
        }
    }
}

/// Accepts a full `{name, title, company}` object or a bare name
impl<'de> Deserialize<'de> for Speaker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Full {
            #[serde(default, deserialize_with = "lenient::string")]
            name: String,
            #[serde(default, deserialize_with = "lenient::string")]
            title: String,
            #[serde(default, deserialize_with = "lenient::string")]
            company: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Full(Full),
        }

        let mut speaker = match Repr::deserialize(deserializer)? {
            Repr::Name(name) => Speaker {
                name,
                ..Speaker::default()
            },
            Repr::Full(full) => Speaker {
                name: full.name,
                title: full.title,
                company: full.company,
            },
        };
        speaker.fill_unknown();
        Ok(speaker)
    }
}

/// Closed sentiment vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
    Mixed,
}

impl SentimentLabel {
    /// Case-insensitive; anything outside the vocabulary is neutral
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" | "bullish" | "optimistic" => Self::Positive,
            "negative" | "bearish" | "cautious" => Self::Negative,
            "mixed" => Self::Mixed,
            _ => Self::Neutral,
        }
    }
}

impl<'de> Deserialize<'de> for SentimentLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = lenient::string(deserializer)?;
        Ok(Self::parse(&label))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub rationale: String,
}

/// Accepts `{label, rationale}` or a bare label
impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Full {
            #[serde(default)]
            label: SentimentLabel,
            #[serde(default, deserialize_with = "lenient::string")]
            rationale: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Label(String),
            Full(Full),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Label(label) => Sentiment {
                label: SentimentLabel::parse(&label),
                rationale: String::new(),
            },
            Repr::Full(full) => Sentiment {
                label: full.label,
                rationale: full.rationale,
            },
        })
    }
}

// ============================================================================
// Stage Boundary
// ============================================================================

/// Analysis-stage work item, derived from one research plan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTarget {
    pub descriptor: SectionDescriptor,
    pub plan: ResearchPlan,
}

impl AnalysisTarget {
    /// Build from the record's own identity fields, not from its position
    /// in the original section sequence
    pub fn from_plan_record(record: &ResearchPlanRecord) -> Self {
        let name = or_sentinel(&record.section_name, UNTITLED_SECTION).to_string();
        let description = record
            .research_plan
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Analyze {} using the research plan.", name));

        Self {
            descriptor: SectionDescriptor {
                id: or_sentinel(&record.section_id, UNIDENTIFIED_SECTION).to_string(),
                name,
                description,
                enabled: true,
            },
            plan: record.research_plan.clone(),
        }
    }
}
