//! crates/dream_university_core/src/catalog.rs
//!
//! Loads the university working set. A session always ends up with a usable
//! catalog: failures are replaced by the fallback list and catalogs without
//! any Indian institution are topped up.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::University;
use crate::fallback;
use crate::ports::{CatalogService, PortError, PortResult};

/// Country whose presence the working set guarantees.
pub const GUARANTEED_COUNTRY: &str = "India";

/// Fetches the catalog, bounded by `timeout`, and normalizes it.
///
/// Never fails: any error yields [`fallback::fallback_catalog`].
pub async fn load_universities(catalog: &dyn CatalogService, timeout: Duration) -> Vec<University> {
    let fetched: PortResult<Vec<University>> =
        match tokio::time::timeout(timeout, catalog.fetch_universities()).await {
            Ok(result) => result,
            Err(_) => Err(PortError::Timeout(timeout.as_millis() as u64)),
        };

    match fetched {
        Ok(universities) => {
            let working_set = ensure_country_diversity(universities);
            info!("Catalog loaded with {} universities.", working_set.len());
            working_set
        }
        Err(e) => {
            warn!("Catalog fetch failed, using fallback data: {}", e);
            fallback::fallback_catalog()
        }
    }
}

/// Drops duplicate ids (first occurrence wins) and appends the India
/// supplement when no entry is in India.
///
/// Supplement entries whose id is already taken are moved past the highest id
/// in the catalog so the working set stays uniquely keyed.
pub fn ensure_country_diversity(universities: Vec<University>) -> Vec<University> {
    let mut seen = HashSet::new();
    let mut working_set: Vec<University> = Vec::with_capacity(universities.len() + 3);
    for university in universities {
        if seen.insert(university.id) {
            working_set.push(university);
        } else {
            warn!("Dropping duplicate catalog id {}.", university.id);
        }
    }

    if working_set.iter().any(|u| u.country == GUARANTEED_COUNTRY) {
        return working_set;
    }

    let mut next_free = working_set.iter().map(|u| u.id).max().unwrap_or(0);
    for mut university in fallback::india_supplement() {
        if seen.contains(&university.id) {
            next_free += 1;
            while seen.contains(&next_free) {
                next_free += 1;
            }
            university.id = next_free;
        }
        seen.insert(university.id);
        working_set.push(university);
    }
    working_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn uni(id: u32, country: &str) -> University {
        University {
            id,
            name: format!("University {}", id),
            country: country.to_string(),
            tuition_usd: 10_000,
            image_url: String::new(),
            institution_type: None,
            tags: Vec::new(),
            global_rank: None,
            acceptance_rate_percent: None,
        }
    }

    struct StaticCatalog(Vec<University>);

    #[async_trait]
    impl CatalogService for StaticCatalog {
        async fn fetch_universities(&self) -> PortResult<Vec<University>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl CatalogService for BrokenCatalog {
        async fn fetch_universities(&self) -> PortResult<Vec<University>> {
            Err(PortError::Unexpected("connection refused".into()))
        }
    }

    struct HangingCatalog;

    #[async_trait]
    impl CatalogService for HangingCatalog {
        async fn fetch_universities(&self) -> PortResult<Vec<University>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn catalog_without_india_gets_three_supplements() {
        let catalog = StaticCatalog(vec![uni(1, "USA"), uni(2, "UK")]);
        let working_set = load_universities(&catalog, Duration::from_secs(5)).await;

        assert_eq!(working_set.len(), 5);
        let ids: Vec<u32> = working_set.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 101, 102, 103]);
    }

    #[tokio::test]
    async fn catalog_with_india_is_kept_as_is() {
        let catalog = StaticCatalog(vec![uni(1, "USA"), uni(7, "India")]);
        let working_set = load_universities(&catalog, Duration::from_secs(5)).await;
        assert_eq!(working_set.len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_yields_fallback_catalog() {
        let working_set = load_universities(&BrokenCatalog, Duration::from_secs(5)).await;
        let countries: Vec<&str> = working_set.iter().map(|u| u.country.as_str()).collect();
        assert_eq!(countries, vec!["USA", "India", "UK"]);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_fetch_is_bounded() {
        let working_set = load_universities(&HangingCatalog, Duration::from_secs(30)).await;
        assert_eq!(working_set.len(), 3);
    }

    #[test]
    fn colliding_supplement_ids_are_reassigned() {
        let working_set = ensure_country_diversity(vec![uni(101, "USA"), uni(101, "UK"), uni(5, "UK")]);
        let ids: Vec<u32> = working_set.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![101, 5, 102, 103, 104]);
        assert_eq!(working_set.iter().filter(|u| u.country == "India").count(), 3);
    }
}
