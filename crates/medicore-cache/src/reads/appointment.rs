//! Appointment read-through accessors.

use std::collections::HashSet;

use medicore_core::Model;
use medicore_storage::{Filter, Page, RecordStore, Sort, StorageError, StoredRecord};
use serde_json::Value;

use super::{ListParams, project, read_through};
use crate::context::CacheContext;
use crate::envelope::Envelope;
use crate::keys;

const PATIENT_SUMMARY: [&str; 8] = [
    "first_name",
    "last_name",
    "gender",
    "date_of_birth",
    "img",
    "color_code",
    "phone",
    "address",
];
const DOCTOR_SUMMARY: [&str; 4] = ["name", "specialization", "img", "color_code"];

async fn joined_appointment(
    db: &dyn RecordStore,
    appointment: &StoredRecord,
) -> Result<Value, StorageError> {
    let patient = match appointment.field_str("patient_id") {
        Some(pid) => match db.find_one(Model::Patient, &Filter::by_id(pid)).await? {
            Some(patient) => project(&patient, &PATIENT_SUMMARY),
            None => Value::Null,
        },
        None => Value::Null,
    };
    let doctor = match appointment.field_str("doctor_id") {
        Some(did) => match db.find_one(Model::Doctor, &Filter::by_id(did)).await? {
            Some(doctor) => project(&doctor, &DOCTOR_SUMMARY),
            None => Value::Null,
        },
        None => Value::Null,
    };

    let mut record = appointment.record.clone();
    if let Value::Object(map) = &mut record {
        map.insert("patient".to_string(), patient);
        map.insert("doctor".to_string(), doctor);
    }
    Ok(record)
}

/// Appointment by id with joined patient and doctor summaries. Cached
/// under `appointment:{id}`.
pub async fn get_appointment_by_id(ctx: &CacheContext, db: &dyn RecordStore, id: &str) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Appointment id is required");
    }
    let key = keys::appointment(id);
    read_through(ctx, &key, ctx.ttl().appointment, async {
        match db.find_one(Model::Appointment, &Filter::by_id(id)).await? {
            Some(appointment) => Ok(Envelope::ok(joined_appointment(db, &appointment).await?)),
            None => Ok(Envelope::not_found("Appointment data not found")),
        }
    })
    .await
}

/// Appointment with the full patient and doctor records plus its medical
/// records. Cached under `appointment:medical:{id}`.
pub async fn get_appointment_with_medical_records_by_id(
    ctx: &CacheContext,
    db: &dyn RecordStore,
    id: &str,
) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Appointment id is required");
    }
    let key = keys::appointment_medical(id);
    read_through(ctx, &key, ctx.ttl().appointment_medical, async {
        let Some(appointment) = db.find_one(Model::Appointment, &Filter::by_id(id)).await? else {
            return Ok(Envelope::not_found("Appointment data not found"));
        };

        let patient = match appointment.field_str("patient_id") {
            Some(pid) => db
                .find_one(Model::Patient, &Filter::by_id(pid))
                .await?
                .map(|p| p.record)
                .unwrap_or(Value::Null),
            None => Value::Null,
        };
        let doctor = match appointment.field_str("doctor_id") {
            Some(did) => db
                .find_one(Model::Doctor, &Filter::by_id(did))
                .await?
                .map(|d| d.record)
                .unwrap_or(Value::Null),
            None => Value::Null,
        };
        let medical_records: Vec<Value> = db
            .find_many(
                Model::MedicalRecord,
                &Filter::new().eq("appointment_id", id),
                Some(&Sort::desc("created_at")),
                None,
            )
            .await?
            .into_iter()
            .map(|r| r.record)
            .collect();

        let mut record = appointment.record.clone();
        if let Value::Object(map) = &mut record {
            map.insert("patient".to_string(), patient);
            map.insert("doctor".to_string(), doctor);
            map.insert("medical_records".to_string(), Value::Array(medical_records));
        }
        Ok(Envelope::ok(record))
    })
    .await
}

async fn ids_matching(
    db: &dyn RecordStore,
    model: Model,
    term: &str,
    fields: &[&str],
) -> Result<HashSet<String>, StorageError> {
    let records = db
        .find_many(model, &Filter::new().search(term, fields), None, None)
        .await?;
    Ok(records.into_iter().map(|r| r.id).collect())
}

/// Paginated appointment list, optionally scoped to one participant id
/// (matched against patient or doctor) and searchable by participant name.
/// Cached under `appointments:all:{page}:{limit}:{search}:{scope}`.
pub async fn get_patient_appointments(
    ctx: &CacheContext,
    db: &dyn RecordStore,
    params: &ListParams,
    scope: Option<&str>,
) -> Envelope {
    let (page, limit, search) = params.resolve();
    let scope = scope.map(str::trim).filter(|s| !s.is_empty());
    let key = keys::appointments_list(page, limit, search, scope);
    read_through(ctx, &key, ctx.ttl().appointments_list, async {
        let filter = match scope {
            Some(id) => Filter::new().or_eq("patient_id", id).or_eq("doctor_id", id),
            None => Filter::new(),
        };
        let window = Page::new(page, limit);
        let sort = Sort::desc("appointment_date");

        let (selected, total_records) = match search {
            None => {
                let records = db
                    .find_many(Model::Appointment, &filter, Some(&sort), Some(&window))
                    .await?;
                let total = db.count(Model::Appointment, &filter).await?;
                (records, total)
            }
            Some(term) => {
                // Appointments carry only participant ids, so a name search
                // resolves matching participants first and filters here.
                let patient_ids =
                    ids_matching(db, Model::Patient, term, &["first_name", "last_name"]).await?;
                let doctor_ids = ids_matching(db, Model::Doctor, term, &["name"]).await?;

                let all = db
                    .find_many(Model::Appointment, &filter, Some(&sort), None)
                    .await?;
                let matched: Vec<StoredRecord> = all
                    .into_iter()
                    .filter(|a| {
                        a.field_str("patient_id")
                            .is_some_and(|pid| patient_ids.contains(pid))
                            || a.field_str("doctor_id")
                                .is_some_and(|did| doctor_ids.contains(did))
                    })
                    .collect();
                let total = matched.len() as u64;
                let paged = matched
                    .into_iter()
                    .skip(window.skip())
                    .take(window.limit as usize)
                    .collect();
                (paged, total)
            }
        };

        let mut data = Vec::with_capacity(selected.len());
        for appointment in &selected {
            data.push(joined_appointment(db, appointment).await?);
        }

        Ok(Envelope::paginated(
            Value::Array(data),
            total_records,
            window.total_pages(total_records),
            page,
        ))
    })
    .await
}
