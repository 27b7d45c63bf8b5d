use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Dashboard counters. Every known status is present, zero or not.
#[derive(Serialize)]
pub struct StatsResponse {
    pub bookings: BTreeMap<&'static str, i64>,
    pub technicians: BTreeMap<&'static str, i64>,
}
