//! Deterministic explanation templates used when the model is unavailable.

use pharmlens_common::{Explanation, RiskAssessment, RiskLabel};

const UNSPECIFIED_VARIANTS: &str = "unspecified variants";

pub fn fallback_summary(risk: &RiskAssessment) -> String {
    match &risk.risk_label {
        RiskLabel::Safe => format!(
            "Patient is a {} for {}. Standard dosing of {} is likely appropriate.",
            risk.phenotype, risk.gene, risk.drug
        ),
        label if label.is_elevated() => format!(
            "Elevated clinical risk identified for {} due to {} {} status. {}",
            risk.drug, risk.gene, risk.phenotype, risk.recommendation
        ),
        _ => format!(
            "Dose adjustment or monitoring may be required for {} based on {} {} phenotype.",
            risk.drug, risk.gene, risk.phenotype
        ),
    }
}

pub fn fallback_mechanism(risk: &RiskAssessment) -> String {
    // An empty-but-present list renders as "variants: )"
    let variants = risk
        .variant_stars()
        .map(|stars| stars.join(", "))
        .unwrap_or_else(|| UNSPECIFIED_VARIANTS.to_string());

    format!(
        "The {} gene (variants: {}) influences metabolism or transporter activity affecting {} \
         pharmacokinetics, potentially altering drug exposure and response as described in CPIC guidance.",
        risk.gene, variants, risk.drug
    )
}

/// Pure; never fails.
pub fn synthesize(risk: &RiskAssessment) -> Explanation {
    Explanation {
        summary: fallback_summary(risk),
        mechanism: fallback_mechanism(risk),
    }
}
