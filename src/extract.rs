//! Document extraction collaborator.
//!
//! The extraction stage narrates a document being read; this module supplies
//! the structured tree the document viewer renders when that stage fires its
//! show-document action. The trait is the seam — a real backend would OCR a
//! PDF, the shipped mock synthesizes a plausible tree from the claim record.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::{Value, json};
use thiserror::Error;

use crate::claims::Claim;

/// Errors from document extraction.
#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("no document available for claim {claim_number}")]
    #[diagnostic(
        code(claimsim::extract::no_document),
        help("The demo data set only attaches documents to generated claims.")
    )]
    NoDocument { claim_number: String },
}

/// Produces the structured field tree for a claim's submitted documents.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, claim: &Claim) -> Result<Value, ExtractError>;
}

/// Deterministic extractor that synthesizes the tree from the claim record.
#[derive(Debug, Default)]
pub struct MockExtractor;

impl MockExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for MockExtractor {
    async fn extract(&self, claim: &Claim) -> Result<Value, ExtractError> {
        let copay = (claim.amount * 0.2 * 100.0).round() / 100.0;
        let eligible = ((claim.amount - copay) * 100.0).round() / 100.0;

        Ok(json!({
            "ClaimantInformation": {
                "PatientName": claim.patient_name,
                "MemberId": claim.member_id,
                "City": claim.city,
            },
            "ClaimDetails": {
                "ClaimNumber": claim.claim_number,
                "SubmittedDate": claim.submitted_date.format("%Y-%m-%d").to_string(),
                "IntegrationType": claim.integration_type,
            },
            "ProviderInformation": {
                "ProviderName": "Clinique Dentaire St-Laurent",
                "ProviderCity": claim.city,
            },
            "Invoice": {
                "Currency": claim.currency,
                "TotalAmount": claim.amount,
                "LineItems": [
                    {
                        "Description": "Examination and diagnosis",
                        "Amount": copay,
                    },
                    {
                        "Description": "Treatment as submitted",
                        "Amount": eligible,
                    },
                ],
            },
        }))
    }
}
