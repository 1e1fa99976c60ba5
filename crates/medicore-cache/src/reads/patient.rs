//! Patient read-through accessors.

use medicore_core::Model;
use medicore_storage::{Filter, Page, RecordStore, Sort, StoredRecord};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{ListParams, project, read_through};
use crate::context::CacheContext;
use crate::envelope::Envelope;
use crate::keys;

const APPOINTMENT_STATUSES: [&str; 4] = ["PENDING", "SCHEDULED", "COMPLETED", "CANCELLED"];

fn month_abbrev(month: u8) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        _ => "Dec",
    }
}

/// Aggregate appointments into per-status counts and a per-month series
/// for the current year up to the current month.
pub(crate) fn process_appointments(appointments: &[StoredRecord]) -> (Value, Value) {
    let now = OffsetDateTime::now_utc();
    let current_month = now.month() as u8;

    let mut counts = Map::new();
    for status in APPOINTMENT_STATUSES {
        counts.insert(status.to_string(), json!(0));
    }

    let mut monthly: Vec<(u64, u64)> = vec![(0, 0); current_month as usize];

    for appointment in appointments {
        let status = appointment.field_str("status").unwrap_or_default();
        if APPOINTMENT_STATUSES.contains(&status) {
            let current = counts[status].as_u64().unwrap_or(0);
            counts.insert(status.to_string(), json!(current + 1));
        }

        let Some(date) = appointment
            .field_str("appointment_date")
            .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
        else {
            continue;
        };
        let month = date.month() as u8;
        if date.year() == now.year() && month <= current_month {
            let bucket = &mut monthly[(month - 1) as usize];
            bucket.0 += 1;
            if status == "COMPLETED" {
                bucket.1 += 1;
            }
        }
    }

    let monthly_data: Vec<Value> = monthly
        .iter()
        .enumerate()
        .map(|(i, (appointment, completed))| {
            json!({
                "name": month_abbrev((i + 1) as u8),
                "appointment": appointment,
                "completed": completed,
            })
        })
        .collect();

    (Value::Object(counts), Value::Array(monthly_data))
}

fn merged(base: &Value, entries: Vec<(&str, Value)>) -> Value {
    let mut object = match base {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other.clone());
            map
        }
    };
    for (key, value) in entries {
        object.insert(key.to_string(), value);
    }
    Value::Object(object)
}

/// Patient by id. Cached under `patient:{id}`.
pub async fn get_patient_by_id(ctx: &CacheContext, db: &dyn RecordStore, id: &str) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Patient id is required");
    }
    let key = keys::patient(id);
    read_through(ctx, &key, ctx.ttl().patient, async {
        match db.find_one(Model::Patient, &Filter::by_id(id)).await? {
            Some(patient) => Ok(Envelope::ok(patient.record.clone())),
            None => Ok(Envelope::not_found("Patient data not found")),
        }
    })
    .await
}

/// Patient with appointment aggregates (total count, last visit). The id
/// may be a record id or an email address. Cached under `patient:full:{id}`.
pub async fn get_patient_full_data_by_id(
    ctx: &CacheContext,
    db: &dyn RecordStore,
    id: &str,
) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Patient id is required");
    }
    let key = keys::patient_full(id);
    read_through(ctx, &key, ctx.ttl().patient_full, async {
        let filter = Filter::new().or_eq("id", id).or_eq("email", id);
        let Some(patient) = db.find_one(Model::Patient, &filter).await? else {
            return Ok(Envelope::not_found("Patient data not found"));
        };

        let by_patient = Filter::new().eq("patient_id", &patient.id);
        let total_appointments = db.count(Model::Appointment, &by_patient).await?;
        let last_visit = db
            .find_many(
                Model::Appointment,
                &by_patient,
                Some(&Sort::desc("appointment_date")),
                Some(&Page::new(1, 1)),
            )
            .await?
            .first()
            .and_then(|a| a.field("appointment_date").cloned())
            .unwrap_or(Value::Null);

        let data = merged(
            &patient.record,
            vec![
                ("total_appointments", json!(total_appointments)),
                ("last_visit", last_visit),
            ],
        );
        Ok(Envelope::ok(data))
    })
    .await
}

/// Patient dashboard statistics: status counts, monthly series, last five
/// appointments with joined projections, available doctors. Cached under
/// `patient:dashboard:{id}`.
pub async fn get_patient_dashboard_statistics(
    ctx: &CacheContext,
    db: &dyn RecordStore,
    id: &str,
) -> Envelope {
    if id.is_empty() {
        return Envelope::not_found("Patient id is required");
    }
    let key = keys::patient_dashboard(id);
    read_through(ctx, &key, ctx.ttl().patient_dashboard, async {
        let Some(patient) = db.find_one(Model::Patient, &Filter::by_id(id)).await? else {
            return Ok(Envelope::not_found("Patient data not found"));
        };
        let data = project(
            &patient,
            &["first_name", "last_name", "gender", "img", "color_code"],
        );

        let appointments = db
            .find_many(
                Model::Appointment,
                &Filter::new().eq("patient_id", id),
                Some(&Sort::desc("appointment_date")),
                None,
            )
            .await?;
        let (appointment_counts, monthly_data) = process_appointments(&appointments);

        let patient_summary = project(
            &patient,
            &["first_name", "last_name", "gender", "date_of_birth", "img", "color_code"],
        );
        let mut last_records = Vec::new();
        for appointment in appointments.iter().take(5) {
            let doctor = match appointment.field_str("doctor_id") {
                Some(did) => match db.find_one(Model::Doctor, &Filter::by_id(did)).await? {
                    Some(doctor) => project(
                        &doctor,
                        &["name", "img", "specialization", "color_code"],
                    ),
                    None => Value::Null,
                },
                None => Value::Null,
            };
            last_records.push(merged(
                &appointment.record,
                vec![("doctor", doctor), ("patient", patient_summary.clone())],
            ));
        }

        let available_doctors: Vec<Value> = db
            .find_many(Model::Doctor, &Filter::new(), None, Some(&Page::new(1, 4)))
            .await?
            .iter()
            .map(|d| project(d, &["name", "specialization", "img", "working_days", "color_code"]))
            .collect();

        Ok(Envelope::ok(data)
            .with_extra("appointment_counts", appointment_counts)
            .with_extra("last_records", Value::Array(last_records))
            .with_extra("total_appointments", json!(appointments.len()))
            .with_extra("available_doctors", Value::Array(available_doctors))
            .with_extra("monthly_data", monthly_data))
    })
    .await
}

/// Paginated, searchable patient list. Cached under
/// `patients:all:{page}:{limit}:{search}`.
pub async fn get_all_patients(
    ctx: &CacheContext,
    db: &dyn RecordStore,
    params: &ListParams,
) -> Envelope {
    let (page, limit, search) = params.resolve();
    let key = keys::patients_list(page, limit, search);
    read_through(ctx, &key, ctx.ttl().patients_list, async {
        let filter = match search {
            Some(term) => Filter::new().search(
                term,
                &["first_name", "last_name", "phone", "email"],
            ),
            None => Filter::new(),
        };
        let window = Page::new(page, limit);
        let patients = db
            .find_many(
                Model::Patient,
                &filter,
                Some(&Sort::asc("first_name")),
                Some(&window),
            )
            .await?;
        let total_records = db.count(Model::Patient, &Filter::new()).await?;

        let data: Vec<Value> = patients.iter().map(|p| p.record.clone()).collect();
        Ok(Envelope::paginated(
            Value::Array(data),
            total_records,
            window.total_pages(total_records),
            page,
        ))
    })
    .await
}
