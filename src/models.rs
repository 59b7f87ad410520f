use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: String, // e.g. "face wash", "moisturizer"
    pub skin_type: String, // e.g. "acne-prone"
    pub price: f64,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
}

impl Role {
    /// Unknown or missing roles are treated as user turns.
    pub fn from_lossy(raw: Option<&str>) -> Self {
        match raw {
            Some("assistant") => Role::Assistant,
            Some("system") => Role::System,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    // Kept loose: the widget has sent arrays, null and nothing at all here.
    #[serde(default)]
    pub chat_history: serde_json::Value,
}

impl ChatRequest {
    /// History entries as `{role, content}`, defaulting role to user and
    /// content to "". Anything that is not an array yields no history.
    pub fn normalized_history(&self) -> Vec<ChatMessage> {
        let Some(entries) = self.chat_history.as_array() else {
            return Vec::new();
        };
        entries
            .iter()
            .map(|entry| {
                let role = Role::from_lossy(entry.get("role").and_then(|r| r.as_str()));
                let content = entry.get("content").and_then(|c| c.as_str()).unwrap_or_default();
                ChatMessage::new(role, content)
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatResponse {
    pub reply: String,
    pub recommendations: Vec<Product>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireAnswers {
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub concerns: Vec<String>, // multi-select, but a single string is accepted too
    #[serde(default)]
    pub lifestyle: Option<String>,
    #[serde(default)]
    pub routine: Option<String>,
}

impl QuestionnaireAnswers {
    pub fn has_concern(&self, concern: &str) -> bool {
        self.concerns.iter().any(|c| c == concern)
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(concern)) => vec![concern],
        Some(OneOrMany::Many(concerns)) => concerns,
    })
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RoutineRequest {
    #[serde(default)]
    pub answers: QuestionnaireAnswers,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoutineStep {
    pub name: String,
    pub description: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Routine {
    pub morning: Vec<RoutineStep>,
    pub evening: Vec<RoutineStep>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoutineResponse {
    pub routine: Routine,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    None,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::None => 0,
            Severity::Mild => 1,
            Severity::Moderate => 2,
            Severity::Severe => 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AcneFinding {
    pub severity: Severity,
    pub location: String, // "Face", "Body", "Both"
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkinAnalysis {
    pub hydration: String,
    pub oiliness: String,
    pub sensitivity: String,
    pub acne: AcneFinding,
    pub concerns: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageAnalysis {
    #[serde(rename = "image")]
    pub filename: String,
    pub analysis: SkinAnalysis,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AggregateAcne {
    pub severity: Severity,
    pub location: String,
    /// Set once a later image outranks the running worst finding.
    pub progression: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OverallAnalysis {
    pub hydration: String,
    pub oiliness: String,
    pub sensitivity: String,
    pub acne: AggregateAcne,
    pub concerns: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TreatmentRecommendation {
    #[serde(rename = "type")]
    pub treatment_type: String,
    pub severity: Severity,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkinAnalysisReport {
    pub overall: OverallAnalysis,
    pub details: Vec<ImageAnalysis>,
    pub recommendations: Vec<TreatmentRecommendation>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub api_url: String,
    pub primary_color: String,
    pub position: String,
    pub welcome_message: String,
    pub widget_title: String,
    #[serde(default)]
    pub company_logo: Option<String>,
}
