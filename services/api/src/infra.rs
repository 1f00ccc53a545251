use chrono::{Local, NaiveDate};
use health_dss::dss::DssRegistry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) registry: Arc<DssRegistry>,
}

/// Reference date for age-dependent facts; today's local date unless the caller pins one.
pub(crate) fn reference_date(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_padded_iso_dates() {
        let date = parse_date(" 2025-06-01 ").expect("valid date");
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"));
        assert!(parse_date("06/01/2025").is_err());
    }

    #[test]
    fn reference_date_prefers_pinned_value() {
        let pinned = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date");
        assert_eq!(reference_date(Some(pinned)), pinned);
    }
}
