//! Doctor read-through accessors.

use medicore_core::Model;
use medicore_storage::{Filter, Page, RecordStore, Sort};
use serde_json::{Value, json};

use super::patient::process_appointments;
use super::{ListParams, project, read_through};
use crate::context::CacheContext;
use crate::envelope::Envelope;
use crate::keys;

/// Unpaginated doctor list, used by scheduling pickers. Cached under
/// `doctors:all`.
pub async fn get_doctors(ctx: &CacheContext, db: &dyn RecordStore) -> Envelope {
    let key = keys::doctors();
    read_through(ctx, &key, ctx.ttl().doctors, async {
        let doctors = db
            .find_many(Model::Doctor, &Filter::new(), Some(&Sort::asc("name")), None)
            .await?;
        let data: Vec<Value> = doctors.iter().map(|d| d.record.clone()).collect();
        Ok(Envelope::ok(Value::Array(data)))
    })
    .await
}

/// Paginated, searchable doctor list. Cached under
/// `doctors:all:{page}:{limit}:{search}`.
pub async fn get_all_doctors(
    ctx: &CacheContext,
    db: &dyn RecordStore,
    params: &ListParams,
) -> Envelope {
    let (page, limit, search) = params.resolve();
    let key = keys::doctors_list(page, limit, search);
    read_through(ctx, &key, ctx.ttl().doctors_list, async {
        let filter = match search {
            Some(term) => Filter::new().search(term, &["name", "specialization", "email"]),
            None => Filter::new(),
        };
        let window = Page::new(page, limit);
        let doctors = db
            .find_many(
                Model::Doctor,
                &filter,
                Some(&Sort::asc("name")),
                Some(&window),
            )
            .await?;
        let total_records = db.count(Model::Doctor, &Filter::new()).await?;

        let data: Vec<Value> = doctors.iter().map(|d| d.record.clone()).collect();
        Ok(Envelope::paginated(
            Value::Array(data),
            total_records,
            window.total_pages(total_records),
            page,
        ))
    })
    .await
}

/// Doctor by id with appointment count and recent appointments. Cached
/// under `doctor:{id}`.
pub async fn get_doctor_by_id(ctx: &CacheContext, db: &dyn RecordStore, id: &str) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Doctor id is required");
    }
    let key = keys::doctor(id);
    read_through(ctx, &key, ctx.ttl().doctor, async {
        let Some(doctor) = db.find_one(Model::Doctor, &Filter::by_id(id)).await? else {
            return Ok(Envelope::not_found("Doctor data not found"));
        };

        let by_doctor = Filter::new().eq("doctor_id", id);
        let total_appointments = db.count(Model::Appointment, &by_doctor).await?;
        let recent = db
            .find_many(
                Model::Appointment,
                &by_doctor,
                Some(&Sort::desc("appointment_date")),
                Some(&Page::new(1, 10)),
            )
            .await?;

        let mut appointments = Vec::with_capacity(recent.len());
        for appointment in &recent {
            let patient = match appointment.field_str("patient_id") {
                Some(pid) => match db.find_one(Model::Patient, &Filter::by_id(pid)).await? {
                    Some(patient) => project(
                        &patient,
                        &["first_name", "last_name", "gender", "img", "color_code"],
                    ),
                    None => Value::Null,
                },
                None => Value::Null,
            };
            let mut record = appointment.record.clone();
            if let Value::Object(map) = &mut record {
                map.insert("patient".to_string(), patient);
            }
            appointments.push(record);
        }

        Ok(Envelope::ok(doctor.record.clone())
            .with_extra("appointments", Value::Array(appointments))
            .with_extra("total_appointments", json!(total_appointments)))
    })
    .await
}

/// Ratings left for a doctor, with count and rounded average. Cached under
/// `doctor:ratings:{id}`.
pub async fn get_rating_by_id(ctx: &CacheContext, db: &dyn RecordStore, id: &str) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Doctor id is required");
    }
    let key = keys::doctor_ratings(id);
    read_through(ctx, &key, ctx.ttl().doctor_ratings, async {
        let ratings = db
            .find_many(
                Model::Rating,
                &Filter::new().eq("staff_id", id),
                Some(&Sort::desc("created_at")),
                None,
            )
            .await?;

        let total_ratings = ratings.len() as u64;
        let sum: f64 = ratings
            .iter()
            .filter_map(|r| r.field("rating").and_then(Value::as_f64))
            .sum();
        let average_rating = if total_ratings == 0 {
            0.0
        } else {
            (sum / total_ratings as f64 * 10.0).round() / 10.0
        };

        let mut entries = Vec::with_capacity(ratings.len());
        for rating in &ratings {
            let patient = match rating.field_str("patient_id") {
                Some(pid) => match db.find_one(Model::Patient, &Filter::by_id(pid)).await? {
                    Some(patient) => project(&patient, &["first_name", "last_name"]),
                    None => Value::Null,
                },
                None => Value::Null,
            };
            let mut record = rating.record.clone();
            if let Value::Object(map) = &mut record {
                map.insert("patient".to_string(), patient);
            }
            entries.push(record);
        }

        Ok(Envelope::ok(json!({
            "total_ratings": total_ratings,
            "average_rating": average_rating,
            "ratings": entries,
        })))
    })
    .await
}

/// Doctor dashboard statistics: clinic-wide counts plus the doctor's own
/// appointment aggregates. Cached under `doctor:dashboard:{id}`.
pub async fn get_doctor_dashboard_stats(
    ctx: &CacheContext,
    db: &dyn RecordStore,
    id: &str,
) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Doctor id is required");
    }
    let key = keys::doctor_dashboard(id);
    read_through(ctx, &key, ctx.ttl().doctor_dashboard, async {
        let Some(doctor) = db.find_one(Model::Doctor, &Filter::by_id(id)).await? else {
            return Ok(Envelope::not_found("Doctor data not found"));
        };
        let data = project(&doctor, &["name", "specialization", "img", "color_code"]);

        let total_patients = db.count(Model::Patient, &Filter::new()).await?;
        let total_nurses = db
            .count(Model::Staff, &Filter::new().eq("role", "NURSE"))
            .await?;

        let appointments = db
            .find_many(
                Model::Appointment,
                &Filter::new().eq("doctor_id", id),
                Some(&Sort::desc("appointment_date")),
                None,
            )
            .await?;
        let (appointment_counts, monthly_data) = process_appointments(&appointments);

        let doctor_summary = project(&doctor, &["name", "specialization", "img", "color_code"]);
        let mut last_records = Vec::new();
        for appointment in appointments.iter().take(5) {
            let patient = match appointment.field_str("patient_id") {
                Some(pid) => match db.find_one(Model::Patient, &Filter::by_id(pid)).await? {
                    Some(patient) => project(
                        &patient,
                        &["first_name", "last_name", "gender", "date_of_birth", "img", "color_code"],
                    ),
                    None => Value::Null,
                },
                None => Value::Null,
            };
            let mut record = appointment.record.clone();
            if let Value::Object(map) = &mut record {
                map.insert("patient".to_string(), patient);
                map.insert("doctor".to_string(), doctor_summary.clone());
            }
            last_records.push(record);
        }

        let available_doctors: Vec<Value> = db
            .find_many(Model::Doctor, &Filter::new(), None, Some(&Page::new(1, 5)))
            .await?
            .iter()
            .map(|d| project(d, &["name", "specialization", "img", "working_days", "color_code"]))
            .collect();

        Ok(Envelope::ok(data)
            .with_extra("total_patients", json!(total_patients))
            .with_extra("total_nurses", json!(total_nurses))
            .with_extra("total_appointments", json!(appointments.len()))
            .with_extra("appointment_counts", appointment_counts)
            .with_extra("last_records", Value::Array(last_records))
            .with_extra("available_doctors", Value::Array(available_doctors))
            .with_extra("monthly_data", monthly_data))
    })
    .await
}
