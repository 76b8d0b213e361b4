//! Instruction text sent to the model.

use pharmlens_common::RiskAssessment;

/// Build the single user instruction for one risk record.
/// Every field is embedded verbatim; variants are rendered as compact JSON
/// (`null` when the record carried no variant list).
pub fn build_prompt(risk: &RiskAssessment) -> String {
    let variants = serde_json::to_string(&risk.detected_variants)
        .unwrap_or_else(|_| "null".to_string());

    format!(
        r#"
You are a clinical pharmacogenomics expert.

Explain the following risk assessment for a healthcare provider.

Drug: {drug}
Gene: {gene}
Diplotype: {diplotype}
Phenotype: {phenotype}
Risk Label: {risk_label}
Recommendation: {recommendation}
Detected Variants: {variants}

Return ONLY valid JSON in this exact format:

{{
  "summary": "Concise clinical explanation of the risk.",
  "mechanism": "Biological and pharmacokinetic explanation including gene and specific variants."
}}

Do not include markdown, headings, or extra commentary.
"#,
        drug = risk.drug,
        gene = risk.gene,
        diplotype = risk.diplotype,
        phenotype = risk.phenotype,
        risk_label = risk.risk_label,
        recommendation = risk.recommendation,
        variants = variants,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmlens_common::DetectedVariant;

    fn record() -> RiskAssessment {
        RiskAssessment::new("Codeine", "CYP2D6", "Poor Metabolizer", "Toxic")
            .with_diplotype("*4/*4")
            .with_recommendation("Avoid use.")
    }

    #[test]
    fn test_prompt_embeds_every_field() {
        let p = build_prompt(&record());
        for line in [
            "Drug: Codeine",
            "Gene: CYP2D6",
            "Diplotype: *4/*4",
            "Phenotype: Poor Metabolizer",
            "Risk Label: Toxic",
            "Recommendation: Avoid use.",
            "Detected Variants: null",
        ] {
            assert!(p.contains(line), "missing {line:?}");
        }
    }

    #[test]
    fn test_prompt_renders_variants_as_compact_json() {
        let risk = record().with_variants(vec![
            DetectedVariant::star("*4").with_field("rsid", serde_json::json!("rs3892097")),
        ]);
        let p = build_prompt(&risk);
        assert!(p.contains(r#"Detected Variants: [{"star":"*4","rsid":"rs3892097"}]"#));
    }

    #[test]
    fn test_prompt_renders_received_variants_verbatim() {
        let risk = RiskAssessment::from_json(
            r#"{
                "drug": "Codeine", "gene": "CYP2D6",
                "phenotype": "Intermediate Metabolizer", "risk_label": "Safe",
                "detected_variants": [
                    {"rsid": "rs1", "star": "*4"},
                    "*3",
                    {"star": 2},
                    {"star": null, "rsid": "rs9"}
                ]
            }"#,
        )
        .unwrap();

        let p = build_prompt(&risk);
        assert!(p.contains(
            r#"Detected Variants: [{"rsid":"rs1","star":"*4"},"*3",{"star":2},{"star":null,"rsid":"rs9"}]"#
        ));
    }

    #[test]
    fn test_prompt_requests_bare_json() {
        let p = build_prompt(&record());
        assert!(p.contains("Return ONLY valid JSON"));
        assert!(p.contains(r#""summary": "#));
        assert!(p.contains(r#""mechanism": "#));
        assert!(p.contains("Do not include markdown"));
    }
}
