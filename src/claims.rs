//! Claims data provider: the claim record shape, a mock generator for demo
//! data, and the dashboard summary consumed by the chat assistant.
//!
//! The simulator receives one [`Claim`] to drive per-claim script overrides
//! and variant selection; everything else here exists to feed the dashboard
//! and assistant collaborators.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::FlowVariant;

/// Claim number of the scripted demo claim (bespoke narration).
pub const DEMO_CLAIM_NUMBER: &str = "CLM-2025-1047";
/// Patient name of the scripted demo claim.
pub const DEMO_PATIENT_NAME: &str = "Marie Tremblay";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Accepted,
    Pending,
    Denied,
}

/// One insurance claim record as supplied by the claims data provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: u32,
    pub claim_number: String,
    pub patient_name: String,
    pub member_id: String,
    pub city: String,
    pub status: ClaimStatus,
    pub amount: f64,
    pub currency: String,
    pub submitted_date: NaiveDate,
    /// Tag selecting the flow variant (`"standard"` or `"chess"`).
    pub integration_type: String,
}

impl Claim {
    /// Keys checked against script overrides, most specific first.
    #[must_use]
    pub fn script_keys(&self) -> [&str; 2] {
        [&self.claim_number, &self.patient_name]
    }

    /// The flow variant this claim is simulated against.
    #[must_use]
    pub fn flow_variant(&self) -> FlowVariant {
        FlowVariant::for_integration_type(&self.integration_type)
    }
}

/// The demo claim that carries scripted narration overrides.
#[must_use]
pub fn demo_claim() -> Claim {
    Claim {
        id: 1,
        claim_number: DEMO_CLAIM_NUMBER.to_string(),
        patient_name: DEMO_PATIENT_NAME.to_string(),
        member_id: "MBR-588-1120".to_string(),
        city: "Montreal".to_string(),
        status: ClaimStatus::Pending,
        amount: 412.50,
        currency: "CAD".to_string(),
        submitted_date: Utc::now().date_naive() - Duration::days(2),
        integration_type: "standard".to_string(),
    }
}

const FIRST_NAMES: &[&str] = &[
    "Olivia", "Liam", "Emma", "Noah", "Sophie", "Lucas", "Camille", "Ethan", "Chloe", "Nathan",
    "Amelia", "Felix", "Jade", "Samuel", "Leah",
];

const LAST_NAMES: &[&str] = &[
    "Gagnon", "Smith", "Roy", "Patel", "Nguyen", "Bouchard", "Wilson", "Chen", "Fortin", "Singh",
    "Lavoie", "Brown", "Morin", "Kim", "Pelletier",
];

const CITIES: &[&str] = &[
    "Toronto",
    "Montreal",
    "Vancouver",
    "Calgary",
    "Ottawa",
    "Halifax",
    "Winnipeg",
    "Quebec City",
    "Edmonton",
    "Mississauga",
];

/// Mock claims generator.
///
/// Deterministic under a fixed seed; the demo claim is always the first
/// record so its script overrides are reachable from the default data set.
#[derive(Debug)]
pub struct ClaimGenerator {
    rng: StdRng,
}

impl ClaimGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `count` claims, led by the demo claim.
    pub fn generate(&mut self, count: usize) -> Vec<Claim> {
        let mut claims = Vec::with_capacity(count);
        if count == 0 {
            return claims;
        }
        claims.push(demo_claim());
        for id in 2..=(count as u32) {
            claims.push(self.random_claim(id));
        }
        claims
    }

    fn random_claim(&mut self, id: u32) -> Claim {
        let rng = &mut self.rng;
        let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Alex");
        let last = LAST_NAMES.choose(rng).copied().unwrap_or("Martin");
        let city = CITIES.choose(rng).copied().unwrap_or("Toronto");

        let status = match rng.random_range(0..10) {
            0..5 => ClaimStatus::Accepted,
            5..8 => ClaimStatus::Pending,
            _ => ClaimStatus::Denied,
        };
        let amount = f64::from(rng.random_range(45_00..2_500_00_u32)) / 100.0;
        let days_ago = i64::from(rng.random_range(0..90_u32));
        let integration_type = if rng.random_bool(0.25) { "chess" } else { "standard" };

        Claim {
            id,
            claim_number: format!("CLM-2025-{:04}", 1000 + id),
            patient_name: format!("{first} {last}"),
            member_id: format!("MBR-{:03}-{:04}", rng.random_range(100..999_u32), id),
            city: city.to_string(),
            status,
            amount,
            currency: "CAD".to_string(),
            submitted_date: Utc::now().date_naive() - Duration::days(days_ago),
            integration_type: integration_type.to_string(),
        }
    }
}

impl Default for ClaimGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate counters shown on the dashboard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatistics {
    pub processed_today: usize,
    pub processed_week: usize,
    pub processed_month: usize,
    pub accepted: usize,
    pub pending: usize,
    pub denied: usize,
    pub total: usize,
}

/// Per-city status breakdown.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityBreakdown {
    pub city: String,
    pub total: usize,
    pub accepted: usize,
    pub pending: usize,
    pub denied: usize,
}

/// The dashboard payload forwarded to the chat assistant as context.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsSummary {
    pub statistics: ClaimStatistics,
    pub city_data: Vec<CityBreakdown>,
    pub recent_claims: Vec<Claim>,
}

/// Summarize a claim set into the dashboard payload.
///
/// Cities are ordered by descending total; recent claims are the five most
/// recently submitted.
#[must_use]
pub fn summarize(claims: &[Claim]) -> ClaimsSummary {
    let today = Utc::now().date_naive();
    let mut statistics = ClaimStatistics {
        total: claims.len(),
        ..Default::default()
    };
    let mut by_city: Vec<CityBreakdown> = Vec::new();

    for claim in claims {
        match claim.status {
            ClaimStatus::Accepted => statistics.accepted += 1,
            ClaimStatus::Pending => statistics.pending += 1,
            ClaimStatus::Denied => statistics.denied += 1,
        }
        let age = (today - claim.submitted_date).num_days();
        if age <= 0 {
            statistics.processed_today += 1;
        }
        if age <= 7 {
            statistics.processed_week += 1;
        }
        if age <= 30 {
            statistics.processed_month += 1;
        }

        let entry = match by_city.iter_mut().find(|c| c.city == claim.city) {
            Some(entry) => entry,
            None => {
                by_city.push(CityBreakdown {
                    city: claim.city.clone(),
                    total: 0,
                    accepted: 0,
                    pending: 0,
                    denied: 0,
                });
                by_city.last_mut().expect("just pushed")
            }
        };
        entry.total += 1;
        match claim.status {
            ClaimStatus::Accepted => entry.accepted += 1,
            ClaimStatus::Pending => entry.pending += 1,
            ClaimStatus::Denied => entry.denied += 1,
        }
    }

    by_city.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.city.cmp(&b.city)));

    let mut recent: Vec<Claim> = claims.to_vec();
    recent.sort_by(|a, b| b.submitted_date.cmp(&a.submitted_date));
    recent.truncate(5);

    ClaimsSummary {
        statistics,
        city_data: by_city,
        recent_claims: recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_deterministic_under_seed() {
        let a = ClaimGenerator::seeded(11).generate(20);
        let b = ClaimGenerator::seeded(11).generate(20);
        assert_eq!(a.len(), 20);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.claim_number, y.claim_number);
            assert_eq!(x.patient_name, y.patient_name);
            assert_eq!(x.amount, y.amount);
        }
    }

    #[test]
    fn demo_claim_leads_the_set() {
        let claims = ClaimGenerator::seeded(3).generate(5);
        assert_eq!(claims[0].claim_number, DEMO_CLAIM_NUMBER);
        assert_eq!(claims[0].script_keys()[1], DEMO_PATIENT_NAME);
    }

    #[test]
    fn summary_counts_statuses_and_cities() {
        let claims = ClaimGenerator::seeded(7).generate(40);
        let summary = summarize(&claims);
        assert_eq!(summary.statistics.total, 40);
        assert_eq!(
            summary.statistics.accepted + summary.statistics.pending + summary.statistics.denied,
            40
        );
        let city_total: usize = summary.city_data.iter().map(|c| c.total).sum();
        assert_eq!(city_total, 40);
        assert!(summary.recent_claims.len() <= 5);
    }
}
