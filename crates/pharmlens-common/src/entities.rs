/// Record types exchanged with the upstream risk-assessment pipeline.
/// Shape is validated once here; downstream code works with typed fields only.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{PharmlensError, Result};

// ---------------------------------------------------------------------------
// Risk label
// ---------------------------------------------------------------------------

/// Categorical risk label produced by the risk engine.
/// The set is open: labels other than the three known ones are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLabel {
    Safe,
    Toxic,
    Ineffective,
    Other(String),
}

impl RiskLabel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLabel::Safe        => "Safe",
            RiskLabel::Toxic       => "Toxic",
            RiskLabel::Ineffective => "Ineffective",
            RiskLabel::Other(s)    => s.as_str(),
        }
    }

    /// Toxic and Ineffective both carry the recommendation into the summary.
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLabel::Toxic | RiskLabel::Ineffective)
    }
}

impl From<String> for RiskLabel {
    fn from(s: String) -> Self {
        // Exact, case-sensitive match
        match s.as_str() {
            "Safe"        => RiskLabel::Safe,
            "Toxic"       => RiskLabel::Toxic,
            "Ineffective" => RiskLabel::Ineffective,
            _             => RiskLabel::Other(s),
        }
    }
}

impl From<&str> for RiskLabel {
    fn from(s: &str) -> Self {
        RiskLabel::from(s.to_string())
    }
}

impl From<RiskLabel> for String {
    fn from(label: RiskLabel) -> Self {
        match label {
            RiskLabel::Other(s) => s,
            known               => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Detected variant
// ---------------------------------------------------------------------------

/// A variant call attached to the risk record.
/// Only `star` is interpreted; every other upstream field is carried through untouched.
///
/// An entry parsed from upstream JSON keeps the value it arrived as, and that
/// value is what serializes back out. Variants built in code (or edited with
/// `with_field`) serialize from `star` and `extra`.
#[derive(Debug, Clone, Default)]
pub struct DetectedVariant {
    pub star: Option<String>,  // e.g. *4
    pub extra: serde_json::Map<String, Value>,
    received: Option<Value>,
}

impl DetectedVariant {
    pub fn star(star: impl Into<String>) -> Self {
        Self { star: Some(star.into()), ..Self::default() }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self.received = None;
        self
    }

    /// The upstream entry exactly as received, if this variant was parsed.
    pub fn received(&self) -> Option<&Value> {
        self.received.as_ref()
    }

    /// Lenient conversion used at the record boundary. Never fails:
    /// a non-object entry becomes a variant with no star allele.
    fn from_value(value: Value) -> Self {
        let (star, extra) = match &value {
            Value::Object(obj) => {
                let star = match obj.get("star") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };
                let extra = obj
                    .iter()
                    .filter(|(k, _)| k.as_str() != "star")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (star, extra)
            }
            _ => (None, serde_json::Map::new()),
        };
        Self { star, extra, received: Some(value) }
    }
}

/// Equality is over the interpreted fields; the received form is not compared.
impl PartialEq for DetectedVariant {
    fn eq(&self, other: &Self) -> bool {
        self.star == other.star && self.extra == other.extra
    }
}

impl Serialize for DetectedVariant {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if let Some(received) = &self.received {
            return received.serialize(serializer);
        }
        let len = self.extra.len() + usize::from(self.star.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(star) = &self.star {
            map.serialize_entry("star", star)?;
        }
        for (k, v) in &self.extra {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DetectedVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(DetectedVariant::from_value)
    }
}

/// `detected_variants` may be absent, null, or not an array at all.
/// Anything other than an array is treated as "unknown".
fn lenient_variants<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<DetectedVariant>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.into_iter().map(DetectedVariant::from_value).collect()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Risk assessment
// ---------------------------------------------------------------------------

/// A drug-gene pharmacogenomic risk finding. Read-only input to explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub drug: String,
    pub gene: String,
    #[serde(default)]
    pub diplotype: String,       // e.g. *1/*4
    pub phenotype: String,       // e.g. Poor Metabolizer
    pub risk_label: RiskLabel,
    #[serde(default)]
    pub recommendation: String,
    #[serde(
        default,
        deserialize_with = "lenient_variants",
        skip_serializing_if = "Option::is_none"
    )]
    pub detected_variants: Option<Vec<DetectedVariant>>,
}

impl RiskAssessment {
    pub fn new(
        drug: impl Into<String>,
        gene: impl Into<String>,
        phenotype: impl Into<String>,
        risk_label: impl Into<RiskLabel>,
    ) -> Self {
        Self {
            drug: drug.into(),
            gene: gene.into(),
            diplotype: String::new(),
            phenotype: phenotype.into(),
            risk_label: risk_label.into(),
            recommendation: String::new(),
            detected_variants: None,
        }
    }

    pub fn with_diplotype(mut self, diplotype: impl Into<String>) -> Self {
        self.diplotype = diplotype.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_variants(mut self, variants: Vec<DetectedVariant>) -> Self {
        self.detected_variants = Some(variants);
        self
    }

    /// Parse and validate a record received as JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validate an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let record: Self = serde_json::from_value(value)
            .map_err(|e| PharmlensError::InvalidRecord(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        if self.drug.trim().is_empty() {
            return Err(PharmlensError::InvalidRecord("drug must not be blank".to_string()));
        }
        if self.gene.trim().is_empty() {
            return Err(PharmlensError::InvalidRecord("gene must not be blank".to_string()));
        }
        Ok(())
    }

    /// Star alleles of the detected variants, in order.
    /// `None` when the upstream record carried no variant list.
    pub fn variant_stars(&self) -> Option<Vec<&str>> {
        self.detected_variants.as_ref().map(|variants| {
            variants
                .iter()
                .map(|v| v.star.as_deref().unwrap_or(""))
                .collect()
        })
    }
}

// ---------------------------------------------------------------------------
// Explanation
// ---------------------------------------------------------------------------

/// Human-readable explanation returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub mechanism: String,
}

impl Explanation {
    pub fn new(summary: impl Into<String>, mechanism: impl Into<String>) -> Self {
        Self { summary: summary.into(), mechanism: mechanism.into() }
    }

    /// Both fields carry text.
    pub fn is_complete(&self) -> bool {
        !self.summary.trim().is_empty() && !self.mechanism.trim().is_empty()
    }
}
