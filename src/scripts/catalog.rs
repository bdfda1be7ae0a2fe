//! Built-in narration catalog for the shipped pipeline variants.
//!
//! Defaults cover every stage of both variants (stage ids are shared where
//! the stages are). The demo claim gets bespoke narration for the stages
//! where the demo walkthrough dwells: extraction, validation, pend, and
//! adjudication.

use serde_json::json;

use super::{ScriptLibrary, ScriptLine, StageScript};
use crate::claims::{DEMO_CLAIM_NUMBER, DEMO_PATIENT_NAME};
use crate::log::LogAction;

/// The full built-in script library: generic defaults plus demo-claim
/// overrides keyed by both claim number and patient name.
#[must_use]
pub fn builtin() -> ScriptLibrary {
    let mut library = defaults();
    for key in [DEMO_CLAIM_NUMBER, DEMO_PATIENT_NAME] {
        library = demo_overrides(library, key);
    }
    library
}

fn defaults() -> ScriptLibrary {
    ScriptLibrary::new()
        .with_default(
            "intake",
            StageScript::new(
                vec![
                    ScriptLine::new("Claim submission received.", 1_000),
                    ScriptLine::new("Claim number assigned and indexed.", 900),
                    ScriptLine::new("Routing to document processing queue.", 800),
                ],
                1_000,
            )
            .with_completion("Claim registered in the intake queue."),
        )
        .with_default(
            "chess_eligibility",
            StageScript::new(
                vec![
                    ScriptLine::new("Querying CHESS for member coverage.", 1_200),
                    ScriptLine::new("Coverage record located.", 900),
                    ScriptLine::new("Plan limits and effective dates confirmed.", 900),
                ],
                1_000,
            )
            .with_completion("CHESS eligibility confirmed."),
        )
        .with_default(
            "extraction",
            StageScript::new(
                vec![
                    ScriptLine::new("Reading submitted claim documents.", 1_200),
                    ScriptLine::new("Identifying claimant and provider sections.", 1_100),
                    ScriptLine::new("Extracting invoice line items.", 1_100),
                    ScriptLine::new("Structured data ready for review.", 900)
                        .with_action(LogAction::ShowDocument, json!({ "view": "extraction" })),
                ],
                1_200,
            )
            .with_completion("Document extraction completed."),
        )
        .with_default(
            "validation",
            StageScript::new(
                vec![
                    ScriptLine::new("Checking required fields for completeness.", 1_000),
                    ScriptLine::new("Cross-referencing member and policy records.", 1_000),
                    ScriptLine::new("Applying in-good-order rules.", 900),
                ],
                1_000,
            ),
        )
        .with_default(
            "pend",
            StageScript::new(
                vec![
                    ScriptLine::new("Claim pended: information is incomplete.", 1_100),
                    ScriptLine::new("Requesting missing details from the provider.", 1_200),
                    ScriptLine::new("Updated information received and attached.", 1_000),
                ],
                1_100,
            )
            .with_completion("Pend resolved; returning to validation."),
        )
        .with_default(
            "adjudication",
            StageScript::new(
                vec![
                    ScriptLine::new("Evaluating claim against plan provisions.", 1_200),
                    ScriptLine::new("Calculating eligible amounts and copay.", 1_100),
                    ScriptLine::new("Assigning processing priority.", 900).with_action(
                        LogAction::SetPriority,
                        json!({ "priority": "medium" }),
                    ),
                    ScriptLine::new("Benefit determination recorded.", 900),
                ],
                1_200,
            )
            .with_completion("Adjudication completed."),
        )
        .with_default(
            "chess_sync",
            StageScript::new(
                vec![
                    ScriptLine::new("Writing adjudication outcome back to CHESS.", 1_100),
                    ScriptLine::new("CHESS record synchronized.", 900),
                ],
                900,
            ),
        )
        .with_default(
            "payment",
            StageScript::new(
                vec![
                    ScriptLine::new("Preparing payment instruction.", 1_000),
                    ScriptLine::new("Payment scheduled to member account.", 900),
                    ScriptLine::new("Remittance advice generated.", 800),
                ],
                1_000,
            )
            .with_completion("Payment processed."),
        )
        .with_default(
            "closure",
            StageScript::new(
                vec![
                    ScriptLine::new("Final checks complete.", 800),
                    ScriptLine::new("Claim record closed and archived.", 700),
                ],
                800,
            )
            .with_completion("Claim closed."),
        )
}

fn demo_overrides(library: ScriptLibrary, key: &str) -> ScriptLibrary {
    library
        .with_override(
            key,
            "extraction",
            StageScript::new(
                vec![
                    ScriptLine::new(
                        format!("Reading dental claim form for {DEMO_PATIENT_NAME}."),
                        1_200,
                    ),
                    ScriptLine::new(
                        "Provider identified: Clinique Dentaire St-Laurent, Montreal.",
                        1_100,
                    ),
                    ScriptLine::new(
                        "Invoice parsed: 2 line items, total $412.50 CAD.",
                        1_100,
                    ),
                    ScriptLine::new("Extraction confidence high; data ready for review.", 900)
                        .with_action(
                            LogAction::ShowDocument,
                            json!({
                                "view": "extraction",
                                "claimNumber": DEMO_CLAIM_NUMBER,
                            }),
                        ),
                ],
                1_200,
            )
            .with_completion(format!(
                "Document extraction completed for {DEMO_CLAIM_NUMBER}."
            )),
        )
        .with_override(
            key,
            "validation",
            StageScript::new(
                vec![
                    ScriptLine::new("Verifying member id against group contract 58112.", 1_000),
                    ScriptLine::new(
                        "Procedure codes present; x-ray attachment referenced.",
                        1_000,
                    ),
                    ScriptLine::new("Running in-good-order determination.", 900),
                ],
                1_000,
            ),
        )
        .with_override(
            key,
            "pend",
            StageScript::new(
                vec![
                    ScriptLine::new(
                        "Pended: pre-treatment x-ray missing from submission.",
                        1_100,
                    ),
                    ScriptLine::new(
                        "Request sent to Clinique Dentaire St-Laurent.",
                        1_200,
                    ),
                    ScriptLine::new("X-ray received; attachment linked to claim.", 1_000),
                ],
                1_100,
            )
            .with_completion("Missing x-ray resolved; resubmitting to validation."),
        )
        .with_override(
            key,
            "adjudication",
            StageScript::new(
                vec![
                    ScriptLine::new("Applying dental plan schedule B coverage.", 1_200),
                    ScriptLine::new("Eligible amount $330.00 of $412.50 submitted.", 1_100),
                    ScriptLine::new("Priority set from claim age and amount.", 900).with_action(
                        LogAction::SetPriority,
                        json!({
                            "priority": "high",
                            "claimNumber": DEMO_CLAIM_NUMBER,
                        }),
                    ),
                    ScriptLine::new("Determination: approved with member copay.", 900),
                ],
                1_200,
            )
            .with_completion(format!("Adjudication completed for {DEMO_PATIENT_NAME}.")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_standard_stage_has_a_default_script() {
        let library = builtin();
        for stage in [
            "intake",
            "extraction",
            "validation",
            "pend",
            "adjudication",
            "payment",
            "closure",
            "chess_eligibility",
            "chess_sync",
        ] {
            assert!(
                library.script_for(&stage.into(), &[]).is_some(),
                "missing default script for {stage}"
            );
        }
    }

    #[test]
    fn demo_claim_gets_bespoke_extraction() {
        let library = builtin();
        let script = library
            .script_for(&"extraction".into(), &[DEMO_CLAIM_NUMBER])
            .unwrap();
        assert!(script.lines[0].text.contains(DEMO_PATIENT_NAME));
        // Patient-name key resolves to the same override.
        let by_name = library
            .script_for(&"extraction".into(), &[DEMO_PATIENT_NAME])
            .unwrap();
        assert_eq!(by_name, script);
    }
}
