//! Cache key scheme.
//!
//! Pure functions mapping a logical query to a deterministic key string.
//! Parameter segments always appear in the same positional order
//! (page, limit, search, scope), so identical logical queries collide on
//! the same key and distinct ones never do. The `patterns` module produces
//! glob patterns used exclusively as invalidation scan inputs, never as
//! storage keys.

/// Label used for an absent search term.
const NO_SEARCH: &str = "no-search";

/// Label used for an absent list scope id.
const NO_ID: &str = "no-id";

fn search_label(search: Option<&str>) -> &str {
    match search {
        Some(term) if !term.is_empty() => term,
        _ => NO_SEARCH,
    }
}

/// `patient:{id}` — patient-by-id.
pub fn patient(id: &str) -> String {
    format!("patient:{id}")
}

/// `patient:full:{id}` — patient with appointment aggregates.
pub fn patient_full(id: &str) -> String {
    format!("patient:full:{id}")
}

/// `patient:dashboard:{id}` — patient dashboard statistics.
pub fn patient_dashboard(id: &str) -> String {
    format!("patient:dashboard:{id}")
}

/// `patients:all:{page}:{limit}:{search}` — paginated patient list.
pub fn patients_list(page: u32, limit: u32, search: Option<&str>) -> String {
    format!("patients:all:{page}:{limit}:{}", search_label(search))
}

/// `doctor:{id}` — doctor-by-id.
pub fn doctor(id: &str) -> String {
    format!("doctor:{id}")
}

/// `doctor:dashboard:{id}` — doctor dashboard statistics.
pub fn doctor_dashboard(id: &str) -> String {
    format!("doctor:dashboard:{id}")
}

/// `doctor:ratings:{id}` — ratings for a doctor.
pub fn doctor_ratings(id: &str) -> String {
    format!("doctor:ratings:{id}")
}

/// `doctors:all` — the unpaged doctor list.
pub fn doctors() -> String {
    "doctors:all".to_string()
}

/// `doctors:all:{page}:{limit}:{search}` — paginated doctor list.
pub fn doctors_list(page: u32, limit: u32, search: Option<&str>) -> String {
    format!("doctors:all:{page}:{limit}:{}", search_label(search))
}

/// `appointment:{id}` — appointment-by-id.
pub fn appointment(id: &str) -> String {
    format!("appointment:{id}")
}

/// `appointment:medical:{id}` — appointment with its medical records.
pub fn appointment_medical(id: &str) -> String {
    format!("appointment:medical:{id}")
}

/// `appointments:all:{page}:{limit}:{search}:{scope}` — paginated
/// appointment list, optionally scoped to a patient or doctor id.
pub fn appointments_list(page: u32, limit: u32, search: Option<&str>, scope: Option<&str>) -> String {
    let scope = match scope {
        Some(id) if !id.is_empty() => id,
        _ => NO_ID,
    };
    format!(
        "appointments:all:{page}:{limit}:{}:{scope}",
        search_label(search)
    )
}

/// Glob patterns for bulk invalidation scans.
pub mod patterns {
    /// Every paginated patient list key.
    pub fn patients_lists() -> String {
        "patients:all:*".to_string()
    }

    /// Every paginated doctor list key.
    pub fn doctors_lists() -> String {
        "doctors:all:*".to_string()
    }

    /// Every appointment list key, regardless of scope.
    pub fn appointments_lists() -> String {
        "appointments:all:*".to_string()
    }

    /// Every appointment list key scoped to a patient or doctor id.
    pub fn appointments_lists_for(scope: &str) -> String {
        format!("appointments:all:*:{scope}")
    }

    /// Every medical-record list key scoped to a patient.
    pub fn medical_for_patient(patient_id: &str) -> String {
        format!("medical:{patient_id}:*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        assert_eq!(patient("p1"), "patient:p1");
        assert_eq!(patient_full("p1"), "patient:full:p1");
        assert_eq!(patient_dashboard("p1"), "patient:dashboard:p1");
        assert_eq!(doctor("d1"), "doctor:d1");
        assert_eq!(doctor_ratings("d1"), "doctor:ratings:d1");
        assert_eq!(doctors(), "doctors:all");
        assert_eq!(appointment("a1"), "appointment:a1");
        assert_eq!(appointment_medical("a1"), "appointment:medical:a1");
    }

    #[test]
    fn list_keys_encode_every_parameter() {
        assert_eq!(
            patients_list(1, 10, None),
            "patients:all:1:10:no-search"
        );
        assert_eq!(
            patients_list(2, 20, Some("smith")),
            "patients:all:2:20:smith"
        );
        assert_eq!(
            doctors_list(1, 10, Some("")),
            "doctors:all:1:10:no-search"
        );
        assert_eq!(
            appointments_list(1, 10, None, Some("p1")),
            "appointments:all:1:10:no-search:p1"
        );
        assert_eq!(
            appointments_list(3, 5, Some("lee"), None),
            "appointments:all:3:5:lee:no-id"
        );
    }

    #[test]
    fn distinct_parameters_never_collide() {
        let keys = [
            patients_list(1, 10, None),
            patients_list(2, 10, None),
            patients_list(1, 20, None),
            patients_list(1, 10, Some("smith")),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn patterns_cover_list_keys() {
        use super::patterns;
        assert_eq!(patterns::patients_lists(), "patients:all:*");
        assert_eq!(patterns::appointments_lists_for("p1"), "appointments:all:*:p1");
        assert_eq!(patterns::medical_for_patient("p1"), "medical:p1:*");
    }
}
