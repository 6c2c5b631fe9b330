//! crates/dream_university_core/src/scoring.rs
//!
//! Country ranking and university categorization. Everything here is pure:
//! the same profile always yields the same result.

use crate::domain::{CountryRecommendation, MatchCategory, MatchTier, Profile, University};

/// Maximum number of countries returned by [`rank_countries`].
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Budgets below this (in the profile's own currency, unconverted) favour low-cost countries.
pub const LOW_BUDGET_THRESHOLD: u64 = 15_000;

const BASELINE: [(&str, u8, MatchTier, &str); 7] = [
    ("Canada", 60, MatchTier::Medium, "Immigration friendly & moderate tuition."),
    ("Germany", 65, MatchTier::Medium, "Low tuition fees, high technical standards."),
    ("USA", 55, MatchTier::Medium, "Top tier education but high cost."),
    ("UK", 60, MatchTier::Medium, "1-year Masters is time efficient."),
    ("Australia", 65, MatchTier::Medium, "High quality of life & post-study work."),
    ("India", 50, MatchTier::Low, "Home advantage & low cost."),
    ("Ireland", 60, MatchTier::Medium, "Growing tech hub in Europe."),
];

const LOW_BUDGET_OVERRIDES: [(&str, u8, &str); 2] = [
    ("India", 98, "Best financial fit."),
    ("Germany", 90, "Tuition free options."),
];

const PREFERRED_MATCH: u8 = 95;

/// Ranks countries for `profile`, best first, at most [`MAX_RECOMMENDATIONS`].
///
/// The student's own target country always scores 95 and beats any budget
/// override aimed at the same country.
pub fn rank_countries(profile: &Profile) -> Vec<CountryRecommendation> {
    let target = profile.target_country.as_deref();

    let mut countries: Vec<CountryRecommendation> = BASELINE
        .iter()
        .map(|(country, match_percent, tier, rationale)| CountryRecommendation {
            country: country.to_string(),
            match_percent: *match_percent,
            tier: *tier,
            rationale: rationale.to_string(),
        })
        .collect();

    if profile.budget < LOW_BUDGET_THRESHOLD {
        for entry in countries.iter_mut() {
            if Some(entry.country.as_str()) == target {
                continue;
            }
            if let Some((_, match_percent, rationale)) =
                LOW_BUDGET_OVERRIDES.iter().find(|(name, _, _)| *name == entry.country)
            {
                entry.match_percent = *match_percent;
                entry.tier = MatchTier::High;
                entry.rationale = rationale.to_string();
            }
        }
    }

    if let Some(target) = target {
        if let Some(entry) = countries.iter_mut().find(|c| c.country == target) {
            entry.match_percent = PREFERRED_MATCH;
            entry.tier = MatchTier::High;
            entry.rationale = format!("Your primary preference: {}", entry.country);
        }
    }

    // `sort_by` is stable, so ties keep baseline order.
    countries.sort_by(|a, b| b.match_percent.cmp(&a.match_percent));
    countries.truncate(MAX_RECOMMENDATIONS);
    countries
}

/// Places a university in the Dream/Target/Safe band for a GPA.
///
/// Unranked universities (and a rank of 0, which catalogs use for "unknown")
/// are always Safe.
pub fn categorize(university: &University, gpa: f64) -> MatchCategory {
    match university.global_rank {
        Some(rank) if rank > 0 && rank <= 50 => {
            if gpa >= 3.8 {
                MatchCategory::Target
            } else {
                MatchCategory::Dream
            }
        }
        Some(rank) if rank > 0 && rank <= 100 => {
            if gpa >= 3.0 {
                MatchCategory::Target
            } else {
                MatchCategory::Dream
            }
        }
        _ => MatchCategory::Safe,
    }
}

/// The narrative shown under the ranked countries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub recommendation: String,
    pub action_items: Vec<String>,
}

pub fn analysis_report(profile: &Profile, ranked: &[CountryRecommendation]) -> AnalysisReport {
    let best = ranked.first().map(|c| c.country.as_str()).unwrap_or("your target country");
    let mut recommendation = format!(
        "Based on your {} budget and {} GPA, we highly recommend focusing on {} for the best ROI.",
        profile.budget, profile.gpa, best
    );
    if let Some(risky) = ranked.get(2) {
        recommendation.push_str(&format!(
            " {} appears risky due to high competition.",
            risky.country
        ));
    }

    let mut action_items = Vec::new();
    if profile.tests.is_empty() {
        action_items.push("Take IELTS/TOEFL immediately.".to_string());
    }
    action_items.push("Prepare financial documents.".to_string());

    AnalysisReport { recommendation, action_items }
}

/// The "why this university" sentence on the details panel.
pub fn fit_rationale(university: &University) -> String {
    format!(
        "Based on your profile, {} offers strong programs in your target field. The location in {} aligns with your preferences, and while the tuition is ${}, it offers high ROI potential.",
        university.name, university.country, university.tuition_usd
    )
}
