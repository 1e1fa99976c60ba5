//! Event types describing mutations of the source-of-record.
//!
//! A `WriteEvent` is produced by the write interceptor after each successful
//! mutating call and consumed by write hooks (cache invalidation being the
//! primary one).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::{Model, WriteAction};

/// Identifiers affected by a mutating call.
///
/// Extracted from the write payload where present, falling back to the
/// filter clause and finally the returned record. All fields are optional;
/// which ones are populated depends on the model (an appointment write
/// carries the patient and doctor ids, a rating write the doctor id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedIds {
    /// Primary key of the mutated record.
    pub record_id: Option<String>,
    /// Related patient id, if the model references one.
    pub patient_id: Option<String>,
    /// Related doctor id, if the model references one.
    pub doctor_id: Option<String>,
    /// Related appointment id (medical record writes).
    pub appointment_id: Option<String>,
}

impl AffectedIds {
    /// Ids carrying only a record primary key.
    pub fn record(id: impl Into<String>) -> Self {
        Self {
            record_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Set the related patient id.
    pub fn with_patient(mut self, id: impl Into<String>) -> Self {
        self.patient_id = Some(id.into());
        self
    }

    /// Set the related doctor id.
    pub fn with_doctor(mut self, id: impl Into<String>) -> Self {
        self.doctor_id = Some(id.into());
        self
    }

    /// Set the related appointment id.
    pub fn with_appointment(mut self, id: impl Into<String>) -> Self {
        self.appointment_id = Some(id.into());
        self
    }

    /// Returns true if no identifier could be extracted.
    pub fn is_empty(&self) -> bool {
        self.record_id.is_none()
            && self.patient_id.is_none()
            && self.doctor_id.is_none()
            && self.appointment_id.is_none()
    }
}

/// Event representing a mutation of a tracked record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteEvent {
    /// The mutated model.
    pub model: Model,
    /// The mutating action (create, update, delete).
    pub action: WriteAction,
    /// Identifiers involved in the mutation.
    pub ids: AffectedIds,
    /// Timestamp of the event.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl WriteEvent {
    /// Create a new write event.
    pub fn new(model: Model, action: WriteAction, ids: AffectedIds) -> Self {
        Self {
            model,
            action,
            ids,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Create a "created" event.
    pub fn created(model: Model, ids: AffectedIds) -> Self {
        Self::new(model, WriteAction::Create, ids)
    }

    /// Create an "updated" event.
    pub fn updated(model: Model, ids: AffectedIds) -> Self {
        Self::new(model, WriteAction::Update, ids)
    }

    /// Create a "deleted" event.
    pub fn deleted(model: Model, ids: AffectedIds) -> Self {
        Self::new(model, WriteAction::Delete, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affected_ids_builder() {
        let ids = AffectedIds::record("a1").with_patient("p1").with_doctor("d1");
        assert_eq!(ids.record_id.as_deref(), Some("a1"));
        assert_eq!(ids.patient_id.as_deref(), Some("p1"));
        assert_eq!(ids.doctor_id.as_deref(), Some("d1"));
        assert!(ids.appointment_id.is_none());
        assert!(!ids.is_empty());
        assert!(AffectedIds::default().is_empty());
    }

    #[test]
    fn event_serializes() {
        let event = WriteEvent::created(Model::Patient, AffectedIds::record("p1"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["model"], "Patient");
        assert_eq!(json["action"], "create");
        assert_eq!(json["ids"]["record_id"], "p1");
    }
}
