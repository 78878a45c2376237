//! Travel advisories
//!
//! Notices come from an [`AdvisoryProvider`]. The only provider today is
//! [`StaticAdvisoryProvider`], which serves a fixed set of notices stamped
//! with the fetch time; a remote feed can replace it without touching the
//! dashboard.

use crate::models::{AdvisoryNotice, Severity};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    /// Current notices, most general first. Never fails.
    async fn fetch_advisories(&self) -> Vec<AdvisoryNotice>;
}

/// Seed notice before it is stamped
#[derive(Debug, Clone)]
pub struct AdvisorySeed {
    pub id: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    pub region: &'static str,
}

const DEFAULT_SEEDS: [AdvisorySeed; 2] = [
    AdvisorySeed {
        id: "1",
        severity: Severity::Info,
        message: "Husk at medbringe gyldigt pas og visum ved indrejse.",
        region: "Hele Mexico",
    },
    AdvisorySeed {
        id: "2",
        severity: Severity::Warning,
        message: "Vær opmærksom på øget sikkerhed omkring turistområder i Cancun.",
        region: "Cancun",
    },
];

#[derive(Debug, Clone)]
pub struct StaticAdvisoryProvider {
    seeds: Vec<AdvisorySeed>,
}

impl StaticAdvisoryProvider {
    #[must_use]
    pub fn new(seeds: Vec<AdvisorySeed>) -> Self {
        Self { seeds }
    }
}

impl Default for StaticAdvisoryProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SEEDS.to_vec())
    }
}

#[async_trait]
impl AdvisoryProvider for StaticAdvisoryProvider {
    async fn fetch_advisories(&self) -> Vec<AdvisoryNotice> {
        let issued_at = Utc::now();
        debug!("Serving {} static advisories", self.seeds.len());

        self.seeds
            .iter()
            .map(|seed| AdvisoryNotice {
                id: seed.id.to_string(),
                severity: seed.severity,
                message: seed.message.to_string(),
                issued_at,
                region: seed.region.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_notices() {
        let before = Utc::now();
        let notices = StaticAdvisoryProvider::default().fetch_advisories().await;

        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].severity, Severity::Info);
        assert_eq!(notices[0].region, "Hele Mexico");
        assert!(notices[0].message.contains("pas og visum"));
        assert_eq!(notices[1].severity, Severity::Warning);
        assert_eq!(notices[1].region, "Cancun");
        assert!(notices.iter().all(|n| n.issued_at >= before));
    }

    #[tokio::test]
    async fn test_custom_seeds() {
        let provider = StaticAdvisoryProvider::new(vec![AdvisorySeed {
            id: "hurricane",
            severity: Severity::Danger,
            message: "Orkanvarsel for Yucatán-halvøen.",
            region: "Yucatán",
        }]);

        let notices = provider.fetch_advisories().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].id, "hurricane");
        assert_eq!(notices[0].severity.label(), "Høj Risiko");
    }
}
