//! crates/dream_university_core/src/fallback.rs
//!
//! Locally produced substitutes for external content. Each value has the same
//! shape as the real thing so callers never branch on failure.

use crate::domain::{Profile, University};

/// Assistant turn used whenever the counsellor cannot be reached.
pub const OFFLINE_NOTICE: &str = "System Offline.";

/// Image shown for catalog entries without one.
pub const DEFAULT_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1523050854058-8df90110c9f1?auto=format&fit=crop&q=80";

pub fn greeting(name: &str) -> String {
    format!(
        "Hello {}. I am your dedicated counsellor from Dream University. How may I assist you today?",
        name
    )
}

fn entry(
    id: u32,
    name: &str,
    country: &str,
    tuition_usd: u64,
    image_url: &str,
    institution_type: &str,
    global_rank: u32,
) -> University {
    University {
        id,
        name: name.to_string(),
        country: country.to_string(),
        tuition_usd,
        image_url: image_url.to_string(),
        institution_type: Some(institution_type.to_string()),
        tags: Vec::new(),
        global_rank: Some(global_rank),
        acceptance_rate_percent: None,
    }
}

/// Indian institutions appended when a fetched catalog has none.
pub fn india_supplement() -> Vec<University> {
    vec![
        entry(
            101,
            "Indian Institute of Technology (IIT) Bombay",
            "India",
            3_000,
            "https://images.unsplash.com/photo-1562774053-701939374585?auto=format&fit=crop&q=80",
            "Public",
            149,
        ),
        entry(
            102,
            "Indian Institute of Science (IISc)",
            "India",
            2_000,
            "https://images.unsplash.com/photo-1590012314607-cda9d9b699ae?auto=format&fit=crop&q=80",
            "Public",
            155,
        ),
        entry(
            103,
            "University of Delhi",
            "India",
            500,
            "https://images.unsplash.com/photo-1592280771800-bcf9a1a4788c?auto=format&fit=crop&q=80",
            "Public",
            500,
        ),
    ]
}

/// Working set used when the catalog cannot be fetched at all.
pub fn fallback_catalog() -> Vec<University> {
    vec![
        entry(
            1,
            "Stanford University",
            "USA",
            62_000,
            "https://images.unsplash.com/photo-1541339907198-e08756dedf3f?auto=format&fit=crop&q=80",
            "Private",
            3,
        ),
        entry(
            101,
            "IIT Bombay",
            "India",
            3_000,
            "https://images.unsplash.com/photo-1562774053-701939374585?auto=format&fit=crop&q=80",
            "Public",
            149,
        ),
        entry(
            2,
            "University of Oxford",
            "UK",
            35_000,
            "https://images.unsplash.com/photo-1592280771800-bcf9a1a4788c?auto=format&fit=crop&q=80",
            "Public",
            5,
        ),
    ]
}

/// Deterministic statement of purpose built from the profile alone.
pub fn statement_of_purpose(profile: &Profile) -> String {
    let languages = if profile.languages.is_empty() {
        "multiple languages".to_string()
    } else {
        profile.languages.join(", ")
    };
    let destination = profile.target_country.as_deref().unwrap_or("abroad");

    format!(
        "STATEMENT OF PURPOSE\n\n\
         To the Admissions Committee,\n\n\
         I am writing to express my strong interest in the {degree} program in {course} at your esteemed university. \
         With a GPA of {gpa} and a deep passion for the field, I believe I am an ideal candidate for this program.\n\n\
         My academic journey has been defined by a curiosity to learn and a drive to excel. \
         Having developed proficiency in {languages}, I appreciate the value of diverse perspectives in problem-solving. \
         My goal is to gain specialized knowledge and practical skills in {destination} that will allow me to make meaningful contributions to the industry.\n\n\
         I am particularly drawn to your university's reputation for excellence and its commitment to fostering innovation. \
         I am eager to engage with your distinguished faculty and collaborate with fellow students from around the world.\n\n\
         Thank you for considering my application.\n\n\
         Sincerely,\n{name}",
        degree = profile.target_degree,
        course = profile.target_course,
        gpa = profile.gpa,
        languages = languages,
        destination = destination,
        name = profile.name,
    )
}
