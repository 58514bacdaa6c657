use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    helpers::format_datetime,
    models::{LoggedSegment, WindowSegment},
    Database,
};

fn row_to_logged(row: &Row) -> Result<LoggedSegment, rusqlite::Error> {
    Ok(LoggedSegment {
        datetime_start: row.get("datetime_start")?,
        datetime_end: row.get("datetime_end")?,
        duration_seconds: row.get("duration_seconds")?,
        window_title: row.get("window_title")?,
        tag: row.get("tag")?,
        note: row.get("note")?,
        work_status: row.get("work_status")?,
        break_reason: row.get("break_reason")?,
    })
}

impl Database {
    /// Append one segment to the window log. Returns once the row is committed.
    pub fn insert_segment(&self, segment: &WindowSegment) -> Result<()> {
        let start = format_datetime(&segment.start_time);
        let end = format_datetime(&segment.end_time);
        let duration = segment.duration_secs();
        let title = segment.label.clone();
        let tag = segment.tag.clone().unwrap_or_default();
        let note = segment.note.clone();
        let work_status = segment.work_status.as_ref().map(|s| s.as_str());
        let break_reason = segment.break_reason().map(str::to_string);

        self.execute_blocking(move |conn| {
            conn.execute(
                "INSERT INTO window_log (
                    datetime_start,
                    datetime_end,
                    duration_seconds,
                    window_title,
                    tag,
                    note,
                    work_status,
                    break_reason
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![start, end, duration, title, tag, note, work_status, break_reason],
            )
            .context("failed to append window segment")?;
            Ok(())
        })
    }

    /// Most recent log rows, newest first.
    pub async fn recent_segments(&self, limit: usize) -> Result<Vec<LoggedSegment>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT datetime_start, datetime_end, duration_seconds, window_title,
                        tag, note, work_status, break_reason
                 FROM window_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map(params![limit], row_to_logged)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::WorkStatus;
    use chrono::{Duration, Local, TimeZone};

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("log.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn appended_rows_keep_log_layout() {
        let (_dir, db) = open();
        let start = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        db.insert_segment(&WindowSegment {
            start_time: start,
            end_time: start + Duration::milliseconds(61_500),
            label: "main.rs - Editor".into(),
            tag: Some("Work".into()),
            note: "refactor".into(),
            work_status: None,
        })
        .unwrap();
        db.insert_segment(&WindowSegment {
            start_time: start + Duration::seconds(62),
            end_time: start + Duration::seconds(70),
            label: "Browser".into(),
            tag: None,
            note: String::new(),
            work_status: Some(WorkStatus::Break {
                reason: "coffee".into(),
            }),
        })
        .unwrap();

        let rows = db.recent_segments(10).await.unwrap();
        assert_eq!(rows.len(), 2);

        let latest = &rows[0];
        assert_eq!(latest.window_title, "Browser");
        assert_eq!(latest.tag, "");
        assert_eq!(latest.work_status.as_deref(), Some("break"));
        assert_eq!(latest.break_reason.as_deref(), Some("coffee"));

        let first = &rows[1];
        assert_eq!(first.datetime_start, "2024-05-01 09:00:00");
        assert_eq!(first.datetime_end, "2024-05-01 09:01:01");
        assert_eq!(first.duration_seconds, 61);
        assert_eq!(first.tag, "Work");
        assert_eq!(first.work_status, None);
    }

    #[tokio::test]
    async fn inverted_segment_logs_zero_duration() {
        let (_dir, db) = open();
        let start = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 10).unwrap();

        db.insert_segment(&WindowSegment {
            start_time: start,
            end_time: start - Duration::seconds(3),
            label: "Terminal".into(),
            tag: Some("Work".into()),
            note: "n".into(),
            work_status: None,
        })
        .unwrap();

        let rows = db.recent_segments(1).await.unwrap();
        assert_eq!(rows[0].duration_seconds, 0);
    }
}
