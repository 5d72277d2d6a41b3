// libs/task-cell/src/services/projection.rs
//
// Pure mapping and bucketing rules for task records. Bucketing takes
// `today` as a parameter and is recomputed on every query.

use chrono::NaiveDate;
use tracing::warn;

use shared_utils::dates;

use crate::models::{Task, TaskBuckets, TaskRecord, TaskTab, TaskType};

/// Map one wire record into the uniform task shape.
pub fn map_record(record: TaskRecord) -> Task {
    let kind = resolve_type(
        record.task_category_name.as_deref(),
        record.task_sub_category_name.as_deref(),
    );

    let remarks = record.remarks.unwrap_or_default();
    let (dose, time) = split_remarks(&remarks, kind);

    let completed = record
        .task_status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("completed"));

    Task {
        id: record.id,
        kind,
        name: record.task_name,
        therapy_for: record.therapy_for,
        ref_file: record.ref_file,
        date: dates::normalize_task_date(&record.task_date),
        time,
        completed,
        dose,
        remarks,
    }
}

/// Category, lower-cased, decides the type; an unrecognized or absent
/// category falls back to the sub-category (Audio/Video/Image map to
/// audio/video/medicine).
fn resolve_type(category: Option<&str>, sub_category: Option<&str>) -> TaskType {
    if let Some(category) = category {
        match category.to_lowercase().as_str() {
            "audio" => return TaskType::Audio,
            "video" => return TaskType::Video,
            "medicine" => return TaskType::Medicine,
            _ => {}
        }
    }

    match sub_category {
        Some(sub) if sub.eq_ignore_ascii_case("audio") => TaskType::Audio,
        Some(sub) if sub.eq_ignore_ascii_case("video") => TaskType::Video,
        Some(sub) if sub.eq_ignore_ascii_case("image") => TaskType::Medicine,
        _ => {
            if category.is_some() || sub_category.is_some() {
                warn!(
                    "Unrecognized task category {:?}/{:?}, using default",
                    category, sub_category
                );
            }
            TaskType::Default
        }
    }
}

/// Remarks split on the literal `" at "` into dose and time for non-media
/// tasks. Without the separator the whole string is the dose and the time
/// stays at the sentinel.
fn split_remarks(remarks: &str, kind: TaskType) -> (String, String) {
    if matches!(kind, TaskType::Audio | TaskType::Video) {
        return (String::new(), "N/A".to_string());
    }

    match remarks.split_once(" at ") {
        Some((dose, time)) => (dose.to_string(), time.to_string()),
        None => (remarks.to_string(), "N/A".to_string()),
    }
}

/// Tab for a task date relative to today, both truncated to days:
/// 0 -> today, 1 -> tomorrow, 2..=3 -> next3, negative -> past; anything
/// further out is excluded. Unparseable dates are excluded and logged.
pub fn bucket_for(date_text: &str, today: NaiveDate) -> Option<TaskTab> {
    let date = match dates::parse_iso_date(date_text) {
        Some(date) => date,
        None => {
            warn!("Excluding task with unparseable date {:?}", date_text);
            return None;
        }
    };

    let diff = (date - today).num_days();
    match diff {
        0 => Some(TaskTab::Today),
        1 => Some(TaskTab::Tomorrow),
        2..=3 => Some(TaskTab::NextThree),
        d if d < 0 => Some(TaskTab::Past),
        _ => None,
    }
}

/// Partition tasks into the four tabs.
pub fn project(tasks: Vec<Task>, today: NaiveDate) -> TaskBuckets {
    let mut buckets = TaskBuckets::default();

    for task in tasks {
        match bucket_for(&task.date, today) {
            Some(TaskTab::Today) => buckets.today.push(task),
            Some(TaskTab::Tomorrow) => buckets.tomorrow.push(task),
            Some(TaskTab::NextThree) => buckets.next3.push(task),
            Some(TaskTab::Past) => buckets.past.push(task),
            None => {}
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn record(category: Option<&str>, sub: Option<&str>, remarks: Option<&str>) -> TaskRecord {
        TaskRecord {
            id: "t1".to_string(),
            task_name: "Morning exercise".to_string(),
            therapy_for: "Knee".to_string(),
            task_category_name: category.map(str::to_string),
            task_sub_category_name: sub.map(str::to_string),
            remarks: remarks.map(str::to_string),
            ref_file: None,
            task_date: "10-06-2024".to_string(),
            task_status: Some("Pending".to_string()),
        }
    }

    #[test]
    fn category_drives_type() {
        assert_eq!(map_record(record(Some("Audio"), None, None)).kind, TaskType::Audio);
        assert_eq!(map_record(record(Some("VIDEO"), None, None)).kind, TaskType::Video);
        assert_eq!(
            map_record(record(Some("medicine"), None, None)).kind,
            TaskType::Medicine
        );
    }

    #[test]
    fn sub_category_fallback_when_category_unrecognized() {
        assert_eq!(
            map_record(record(Some("Therapy"), Some("Audio"), None)).kind,
            TaskType::Audio
        );
        assert_eq!(
            map_record(record(None, Some("Image"), None)).kind,
            TaskType::Medicine
        );
        // A category that already resolves takes priority over the sub-category.
        assert_eq!(
            map_record(record(Some("audio"), Some("Image"), None)).kind,
            TaskType::Audio
        );
    }

    #[test]
    fn unknown_everything_is_default() {
        assert_eq!(map_record(record(None, None, None)).kind, TaskType::Default);
        assert_eq!(
            map_record(record(Some("Misc"), Some("Other"), None)).kind,
            TaskType::Default
        );
    }

    #[test]
    fn remarks_split_into_dose_and_time() {
        let task = map_record(record(Some("medicine"), None, Some("2 pills at 9:00 PM")));
        assert_eq!(task.dose, "2 pills");
        assert_eq!(task.time, "9:00 PM");
    }

    #[test]
    fn remarks_without_separator_keep_sentinel_time() {
        let task = map_record(record(Some("medicine"), None, Some("2 pills after dinner")));
        assert_eq!(task.dose, "2 pills after dinner");
        assert_eq!(task.time, "N/A");
    }

    #[test]
    fn media_tasks_skip_remarks_heuristic() {
        let task = map_record(record(Some("audio"), None, Some("listen at bedtime")));
        assert!(task.is_media());
        assert_eq!(task.dose, "");
        assert_eq!(task.time, "N/A");
        assert_eq!(task.remarks, "listen at bedtime");

        assert!(!map_record(record(Some("medicine"), None, None)).is_media());
    }

    #[test]
    fn dates_are_normalized_and_status_derived() {
        let mut r = record(None, None, None);
        r.task_status = Some("COMPLETED".to_string());
        let task = map_record(r);
        assert_eq!(task.date, "2024-06-10");
        assert!(task.completed);
    }

    #[test]
    fn bucket_examples() {
        assert_eq!(bucket_for("2024-06-10", today()), Some(TaskTab::Today));
        assert_eq!(bucket_for("2024-06-11", today()), Some(TaskTab::Tomorrow));
        assert_eq!(bucket_for("2024-06-13", today()), Some(TaskTab::NextThree));
        assert_eq!(bucket_for("2024-06-14", today()), None);
        assert_eq!(bucket_for("2024-06-05", today()), Some(TaskTab::Past));
    }

    #[test]
    fn projection_partitions_and_excludes() {
        let mut tasks = Vec::new();
        for (id, date) in [
            ("a", "2024-06-10"),
            ("b", "2024-06-11"),
            ("c", "2024-06-12"),
            ("d", "2024-06-13"),
            ("e", "2024-06-14"),
            ("f", "2024-06-01"),
        ] {
            let mut r = record(None, None, None);
            r.id = id.to_string();
            r.task_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .format("%d-%m-%Y")
                .to_string();
            tasks.push(map_record(r));
        }

        let buckets = project(tasks, today());

        assert_eq!(buckets.today.len(), 1);
        assert_eq!(buckets.tomorrow.len(), 1);
        assert_eq!(buckets.next3.len(), 2);
        assert_eq!(buckets.past.len(), 1);
        // "e" is four days out and appears nowhere.
        assert_eq!(buckets.total(), 5);
    }
}
