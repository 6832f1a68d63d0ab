use async_trait::async_trait;
use chrono::NaiveDate;
use dreammap_core::{MoonPhaseReading, Result};
use tracing::warn;

/// Anything that can report the moon phase for a date and place.
#[async_trait]
pub trait MoonPhaseSource: Send + Sync {
    /// Raw phase code (e.g. `fullmoon`), or `MoonPhaseUnavailable`.
    ///
    /// `None` date or location means "use the source's defaults".
    async fn fetch_raw_phase(
        &self,
        date: Option<NaiveDate>,
        location_id: Option<&str>,
    ) -> Result<String>;

    /// Best-effort reading. Never fails; any error becomes the sentinel.
    async fn fetch(&self, date: Option<NaiveDate>, location_id: Option<&str>) -> MoonPhaseReading {
        match self.fetch_raw_phase(date, location_id).await {
            Ok(raw) => MoonPhaseReading::from_raw(raw),
            Err(e) => {
                warn!(error = %e, "Moon phase lookup failed, reporting unknown phase");
                MoonPhaseReading::unknown()
            }
        }
    }
}
