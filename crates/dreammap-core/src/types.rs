use crate::phase::{normalize_phase, phase_glyph};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Minimum number of characters (after trimming) a dream narrative needs
/// before it is sent anywhere.
pub const MIN_DREAM_TEXT_CHARS: usize = 8;

/// Raw code and label used when no moon reading could be obtained.
pub const UNKNOWN_PHASE: &str = "Unknown Phase";

pub const UNTITLED_DREAM: &str = "Untitled dream";

/// One user submission. Consumed once by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub location_id: Option<String>,
}

impl AnalysisRequest {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            date: None,
            location_id: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motif {
    pub symbol: String,
    pub meaning: String,
}

impl Motif {
    pub fn new(symbol: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            meaning: meaning.into(),
        }
    }
}

/// Coarse emotional tone of a dream.
///
/// Labels outside the closed set are kept verbatim in `Other` so they can
/// still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Calm,
    Stressed,
    Mixed,
    Sad,
    Hopeful,
    Confused,
    Angry,
    Joyful,
    Other(String),
}

impl Sentiment {
    pub const KNOWN_LABELS: [&'static str; 8] = [
        "calm", "stressed", "mixed", "sad", "hopeful", "confused", "angry", "joyful",
    ];

    /// Case-sensitive match against the closed set.
    pub fn from_label(label: &str) -> Self {
        match label {
            "calm" => Sentiment::Calm,
            "stressed" => Sentiment::Stressed,
            "mixed" => Sentiment::Mixed,
            "sad" => Sentiment::Sad,
            "hopeful" => Sentiment::Hopeful,
            "confused" => Sentiment::Confused,
            "angry" => Sentiment::Angry,
            "joyful" => Sentiment::Joyful,
            other => Sentiment::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Calm => "calm",
            Sentiment::Stressed => "stressed",
            Sentiment::Mixed => "mixed",
            Sentiment::Sad => "sad",
            Sentiment::Hopeful => "hopeful",
            Sentiment::Confused => "confused",
            Sentiment::Angry => "angry",
            Sentiment::Joyful => "joyful",
            Sentiment::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Sentiment::Other(_))
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Sentiment::from_label(&label))
    }
}

/// Model output after allow-list validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedAnalysis {
    pub summary: String,
    pub motifs: Vec<Motif>,
    pub personal_interpretation: String,
    pub what_to_do_next: Vec<String>,
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPhaseReading {
    pub raw_code: String,
    pub canonical_label: String,
}

impl MoonPhaseReading {
    /// Reading for a raw code reported by the astronomy service.
    pub fn from_raw(raw_code: impl Into<String>) -> Self {
        let raw_code = raw_code.into();
        let canonical_label = normalize_phase(&raw_code);
        Self {
            raw_code,
            canonical_label,
        }
    }

    /// Sentinel reading used when the lookup failed outright.
    pub fn unknown() -> Self {
        Self {
            raw_code: UNKNOWN_PHASE.to_string(),
            canonical_label: UNKNOWN_PHASE.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.raw_code == UNKNOWN_PHASE
    }

    pub fn glyph(&self) -> &'static str {
        phase_glyph(&self.canonical_label)
    }
}

/// A finished analysis as handed to the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedDreamRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub text: String,
    #[serde(flatten)]
    pub analysis: ValidatedAnalysis,
    pub moon_phase: String,
}

impl CompletedDreamRecord {
    pub fn new(
        title: &str,
        text: &str,
        analysis: ValidatedAnalysis,
        moon_phase: impl Into<String>,
    ) -> Self {
        let title = title.trim();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            title: if title.is_empty() {
                UNTITLED_DREAM.to_string()
            } else {
                title.to_string()
            },
            text: text.trim().to_string(),
            analysis,
            moon_phase: moon_phase.into(),
        }
    }

    pub fn moon_glyph(&self) -> &'static str {
        phase_glyph(&self.moon_phase)
    }
}
