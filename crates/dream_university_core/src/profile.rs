//! crates/dream_university_core/src/profile.rs
//!
//! Profile construction: the placeholder created at sign-in, the four-step
//! onboarding wizard that fills it in, and the lenient input rules applied
//! at the point of entry.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{Completeness, Profile, TestScore};

/// Name used when the sign-in form is submitted with an empty name.
pub const DEFAULT_NAME: &str = "Student";
/// Email used when the sign-in form is submitted without one.
pub const DEFAULT_EMAIL: &str = "user@example.com";

pub const ONBOARDING_STEPS: u8 = 4;

pub const LANGUAGE_OPTIONS: [&str; 6] = ["English", "German", "French", "Spanish", "Hindi", "Mandarin"];

pub const COUNTRY_OPTIONS: [&str; 8] = [
    "USA",
    "UK",
    "Canada",
    "Germany",
    "Australia",
    "Ireland",
    "India",
    "New Zealand",
];

/// Target-country choice meaning "no preference".
pub const NO_PREFERENCE: &str = "Any";

pub const TEST_OPTIONS: [&str; 10] = [
    "JEE Mains",
    "JEE Advanced",
    "CUET",
    "NEET",
    "GATE",
    "CAT",
    "SAT",
    "IELTS",
    "TOEFL",
    "GRE",
];

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z\s]*$").expect("static name pattern"))
}

/// Letters and whitespace only. Used to reject keystrokes, not to report errors.
pub fn is_acceptable_name(candidate: &str) -> bool {
    name_pattern().is_match(candidate)
}

/// Scores and ranks may hold digits and punctuation but never letters.
pub fn is_acceptable_score(candidate: &str) -> bool {
    !candidate.chars().any(|c| c.is_ascii_alphabetic())
}

/// Normalizes free-form budget text ("30,000") into an integer.
///
/// Grouping commas are stripped and the leading integer is read. Anything
/// non-numeric, and negative amounts, coerce to 0.
pub fn parse_budget(input: &str) -> u64 {
    let cleaned: String = input.trim_start().chars().filter(|c| *c != ',').collect();
    if cleaned.starts_with('-') {
        return 0;
    }
    let unsigned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    let digits: String = unsigned.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

/// The fields one onboarding step contributes.
#[derive(Debug, Clone, PartialEq)]
pub enum OnboardingStep {
    Academics {
        target_degree: String,
        gpa: f64,
        target_course: String,
        tests: Vec<TestScore>,
    },
    Budget {
        currency: String,
        budget_input: String,
    },
    Languages {
        languages: Vec<String>,
    },
    Target {
        /// `None` or "Any" means no preference.
        country: Option<String>,
    },
}

pub struct ProfileStore;

impl ProfileStore {
    /// The profile created at sign-in: identity set, preferences zeroed.
    pub fn create_placeholder(name: &str, email: &str) -> Profile {
        let name = if name.trim().is_empty() { DEFAULT_NAME } else { name };
        let email = if email.trim().is_empty() { DEFAULT_EMAIL } else { email };
        Profile {
            name: name.to_string(),
            email: email.to_string(),
            city: String::new(),
            currency: "USD".to_string(),
            budget: 0,
            gpa: 0.0,
            target_degree: String::new(),
            target_course: String::new(),
            target_country: None,
            languages: Vec::new(),
            tests: Vec::new(),
            completeness: Completeness::Incomplete,
        }
    }

    /// Merges one step's fields into a new profile value.
    pub fn apply_onboarding_step(profile: &Profile, step: OnboardingStep) -> Profile {
        let mut next = profile.clone();
        match step {
            OnboardingStep::Academics { target_degree, gpa, target_course, tests } => {
                next.target_degree = target_degree;
                next.gpa = gpa.max(0.0);
                next.target_course = target_course;
                next.tests = tests;
            }
            OnboardingStep::Budget { currency, budget_input } => {
                next.currency = currency;
                next.budget = parse_budget(&budget_input);
            }
            OnboardingStep::Languages { languages } => {
                next.languages.clear();
                for language in &languages {
                    next.add_language(language);
                }
            }
            OnboardingStep::Target { country } => {
                next.target_country = country.filter(|c| !c.is_empty() && c != NO_PREFERENCE);
            }
        }
        next
    }

    /// Called after the last step. Marks the profile complete.
    ///
    /// Budget text is already normalized when the Budget step is applied, since
    /// the profile only carries the parsed amount.
    pub fn finalize(profile: &Profile) -> Profile {
        let mut next = profile.clone();
        next.completeness = Completeness::Complete;
        next
    }
}

//=========================================================================================
// Onboarding Wizard
//=========================================================================================

/// In-progress onboarding input. Starts from the wizard's suggested values.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingWizard {
    step: u8,
    pub target_degree: String,
    pub gpa: f64,
    pub target_course: String,
    pub tests: Vec<TestScore>,
    pub pending_test: TestScore,
    pub currency: String,
    pub budget_input: String,
    pub languages: Vec<String>,
    pub target_country: Option<String>,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self {
            step: 1,
            target_degree: "Masters".to_string(),
            gpa: 0.0,
            target_course: String::new(),
            tests: Vec::new(),
            pending_test: TestScore { name: "IELTS".to_string(), score: String::new() },
            currency: "USD".to_string(),
            budget_input: "30,000".to_string(),
            languages: Vec::new(),
            target_country: Some("USA".to_string()),
        }
    }
}

impl OnboardingWizard {
    /// 1-based step number.
    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn is_last_step(&self) -> bool {
        self.step == ONBOARDING_STEPS
    }

    /// The "next" action is disabled on the academics step until a GPA is entered.
    pub fn can_advance(&self) -> bool {
        !(self.step == 1 && self.gpa == 0.0)
    }

    /// Applies a score keystroke; letters are rejected.
    pub fn set_pending_score(&mut self, score: &str) -> bool {
        if !is_acceptable_score(score) {
            return false;
        }
        self.pending_test.score = score.to_string();
        true
    }

    /// Records the pending test if it has a score, then clears the score.
    pub fn add_pending_test(&mut self) -> bool {
        if self.pending_test.score.is_empty() {
            return false;
        }
        self.tests.push(self.pending_test.clone());
        self.pending_test.score.clear();
        true
    }

    /// Picks the test the next score belongs to. Only offered tests are accepted.
    pub fn select_test(&mut self, name: &str) -> bool {
        if !TEST_OPTIONS.contains(&name) {
            return false;
        }
        self.pending_test.name = name.to_string();
        true
    }

    /// Adds or removes an offered language; anything else is ignored.
    pub fn toggle_language(&mut self, language: &str) -> bool {
        if !LANGUAGE_OPTIONS.contains(&language) {
            return false;
        }
        if let Some(pos) = self.languages.iter().position(|l| l == language) {
            self.languages.remove(pos);
        } else {
            self.languages.push(language.to_string());
        }
        true
    }

    /// `None` or "Any" means no preference; otherwise the country must be offered.
    pub fn select_country(&mut self, country: Option<String>) -> bool {
        match country {
            Some(name) if name != NO_PREFERENCE && !COUNTRY_OPTIONS.contains(&name.as_str()) => {
                false
            }
            country => {
                self.target_country = country;
                true
            }
        }
    }

    /// The step data for the current step.
    pub fn current_step_data(&self) -> OnboardingStep {
        match self.step {
            1 => OnboardingStep::Academics {
                target_degree: self.target_degree.clone(),
                gpa: self.gpa,
                target_course: self.target_course.clone(),
                tests: self.tests.clone(),
            },
            2 => OnboardingStep::Budget {
                currency: self.currency.clone(),
                budget_input: self.budget_input.clone(),
            },
            3 => OnboardingStep::Languages { languages: self.languages.clone() },
            _ => OnboardingStep::Target { country: self.target_country.clone() },
        }
    }

    /// Merges every step into `profile` and finalizes it.
    pub fn complete(&self, profile: &Profile) -> Profile {
        let mut merged = profile.clone();
        for step in 1..=ONBOARDING_STEPS {
            let view = Self { step, ..self.clone() };
            merged = ProfileStore::apply_onboarding_step(&merged, view.current_step_data());
        }
        ProfileStore::finalize(&merged)
    }

    /// Moves to the next step. Returns `false` when blocked or already on the last step.
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() || self.is_last_step() {
            return false;
        }
        self.step += 1;
        true
    }
}
