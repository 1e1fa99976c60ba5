//! TTL policy, one duration per logical query.

use serde::Deserialize;
use std::time::Duration;

/// Time-to-live per cached query.
///
/// Defaults follow the volatility of each query: near-static reference data
/// lives a day, moderately shifting lists fifteen minutes, recomputed
/// aggregates ten.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    /// patient-by-id (rarely changes).
    pub patient: Duration,
    /// patient with appointment aggregates.
    pub patient_full: Duration,
    /// patient dashboard statistics.
    pub patient_dashboard: Duration,
    /// paginated/searched patient list.
    pub patients_list: Duration,
    /// doctor-by-id (near-static reference data).
    pub doctor: Duration,
    /// unpaged doctor list.
    pub doctors: Duration,
    /// paginated/searched doctor list.
    pub doctors_list: Duration,
    /// doctor dashboard statistics.
    pub doctor_dashboard: Duration,
    /// ratings for a doctor (changes on new submissions).
    pub doctor_ratings: Duration,
    /// appointment-by-id (moderate volatility).
    pub appointment: Duration,
    /// appointment with medical records (changes with clinical activity).
    pub appointment_medical: Duration,
    /// paginated appointment list.
    pub appointments_list: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            patient: Duration::from_secs(60 * 60 * 24),
            patient_full: Duration::from_secs(60 * 15),
            patient_dashboard: Duration::from_secs(60 * 10),
            patients_list: Duration::from_secs(60 * 15),
            doctor: Duration::from_secs(60 * 60 * 24),
            doctors: Duration::from_secs(60 * 60 * 24),
            doctors_list: Duration::from_secs(60 * 15),
            doctor_dashboard: Duration::from_secs(60 * 10),
            doctor_ratings: Duration::from_secs(60 * 15),
            appointment: Duration::from_secs(60 * 15),
            appointment_medical: Duration::from_secs(60 * 10),
            appointments_list: Duration::from_secs(60 * 10),
        }
    }
}
