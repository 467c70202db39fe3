//! Random sample reports for local development.

use chrono::{DateTime, Months, TimeDelta, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use report_core::report::format_instant;
use report_core::ReportDraft;

pub const DEFAULT_SEED_COUNT: usize = 20;

const PATIENT_NAMES: [&str; 8] = [
    "John Smith",
    "Jane Doe",
    "Bob Johnson",
    "Sarah Williams",
    "Michael Brown",
    "Emily Davis",
    "David Wilson",
    "Lisa Johnson",
];

const REPORT_TYPES: [&str; 9] = [
    "General",
    "Lab",
    "Radiology",
    "Cardiology",
    "Pulmonology",
    "Neurology",
    "Dermatology",
    "Obstetrics",
    "Endocrinology",
];

const SUMMARIES: [&str; 10] = [
    "Patient presented with mild fever and cough. Chest X-ray shows no signs of pneumonia.",
    "Blood test reveals elevated cholesterol levels. Patient also shows signs of tachycardia during physical examination.",
    "MRI scan of right knee shows minor tear in the meniscus. Physical therapy recommended.",
    "Patient reports intermittent chest pain. ECG shows possible arrhythmia. Referred to cardiologist.",
    "Annual checkup shows all vital signs within normal ranges. Vaccination status updated.",
    "Patient complains of persistent headaches. CT scan shows no abnormalities.",
    "Follow-up for respiratory infection. Symptoms have improved.",
    "Dermatology examination for skin rash. Diagnosed as contact dermatitis.",
    "Post-surgery follow-up. Incision healing well with no signs of infection.",
    "Prenatal checkup. Fetal heartbeat normal, fundal height appropriate for gestational age.",
];

/// Builds `count` reports with ids `"1"..="count"`, dated within the year before `now`.
///
/// `createdAt` and `updatedAt` equal the report date.
pub fn generate_reports<R: Rng + ?Sized>(
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<ReportDraft> {
    let year_ago = now
        .checked_sub_months(Months::new(12))
        .unwrap_or(now - TimeDelta::days(365));
    let window_ms = (now - year_ago).num_milliseconds().max(0);

    (1..=count)
        .map(|index| {
            let date = year_ago + TimeDelta::milliseconds(rng.gen_range(0..=window_ms));
            let stamp = format_instant(date);

            ReportDraft {
                id: Some(index.to_string()),
                patient_name: pick(&PATIENT_NAMES, rng),
                patient_id: Some(format!("P{:03}", rng.gen_range(1..=999))),
                date: Some(stamp.clone()),
                summary: pick(&SUMMARIES, rng),
                report_type: pick(&REPORT_TYPES, rng),
                created_at: Some(stamp.clone()),
                updated_at: Some(stamp),
            }
        })
        .collect()
}

fn pick<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> Option<String> {
    pool.choose(rng).map(|s| s.to_string())
}
