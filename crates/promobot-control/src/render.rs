//! Compact status views — one short message per query, the way a chat bot
//! edits a status card in place.

use promobot_scheduler::JobSnapshot;
use promobot_templates::Template;

/// Single-job card: state, progress, next run.
pub fn render_status(s: &JobSnapshot) -> String {
    let mut out = format!(
        "Job {} — {}\nschedule: {}\nattempts: {} ({} ok, {} failed)",
        s.id,
        s.state,
        s.schedule.describe(),
        s.attempts_made,
        s.success_count,
        s.failure_count,
    );
    if let Some(next) = s.next_run {
        out.push_str(&format!("\nnext run: {}", next.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    out
}

/// One line per job.
pub fn render_jobs(jobs: &[JobSnapshot]) -> String {
    if jobs.is_empty() {
        return "No jobs.".to_string();
    }
    jobs.iter()
        .map(|s| {
            format!(
                "{}: {} {}/{}",
                s.id,
                s.state,
                s.attempts_made,
                s.schedule
                    .max_attempts()
                    .map_or("∞".to_string(), |m| m.to_string()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per template: name plus a trimmed body preview.
pub fn render_templates(templates: &[Template]) -> String {
    if templates.is_empty() {
        return "No templates.".to_string();
    }
    templates
        .iter()
        .map(|t| {
            let preview: String = t.payload.text.chars().take(60).collect();
            format!("{}: {}", t.name, preview)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use promobot_core::{JobId, PrincipalId};
    use promobot_scheduler::{JobState, Schedule};

    fn snapshot() -> JobSnapshot {
        JobSnapshot {
            id: JobId(3),
            creator: PrincipalId(1),
            state: JobState::Running,
            schedule: Schedule::Interval {
                every_secs: 10,
                max_repeats: Some(3),
            },
            attempts_made: 2,
            success_count: 2,
            failure_count: 0,
            next_run: None,
            created_at: Utc::now(),
            last_transition_at: Utc::now(),
        }
    }

    #[test]
    fn status_card_shows_state_and_progress() {
        let text = render_status(&snapshot());
        assert!(text.contains("Job 3 — running"));
        assert!(text.contains("attempts: 2 (2 ok, 0 failed)"));
        assert!(!text.contains("next run"));
    }

    #[test]
    fn unbounded_jobs_render_infinity_cap() {
        let mut s = snapshot();
        s.schedule = Schedule::Interval {
            every_secs: 5,
            max_repeats: None,
        };
        assert!(render_jobs(&[s]).contains("2/∞"));
    }

    #[test]
    fn empty_lists_have_placeholders() {
        assert_eq!(render_jobs(&[]), "No jobs.");
        assert_eq!(render_templates(&[]), "No templates.");
    }
}
