use serde::{Deserialize, Serialize};

use promobot_core::{JobId, PrincipalId, Role, TargetRef};
use promobot_scheduler::{JobSnapshot, Schedule};
use promobot_templates::Template;

use crate::render;

/// Every operation the control surface accepts, independent of transport.
/// Button presses and slash commands both map onto these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Create a job from the actor's template `template`, replying to
    /// `target` on the given schedule.
    CreateJob {
        template: String,
        target: TargetRef,
        schedule: Schedule,
    },
    Start { job: JobId },
    Pause { job: JobId },
    Stop { job: JobId },
    Details { job: JobId },
    ListJobs,
    AddAdmin { target: PrincipalId, role: Role },
    RemoveAdmin { target: PrincipalId },
    ListTemplates,
    RemoveTemplate { name: String },
    /// Enter recording mode: the actor's next captured message becomes the
    /// payload of template `name`.
    RecordTemplate { name: String },
    FinishRecording,
}

/// Successful command outcome. `Display` renders the compact text a chat
/// transport would show the user.
#[derive(Debug, Clone)]
pub enum Reply {
    JobCreated(JobId),
    Ack(String),
    Status(JobSnapshot),
    Jobs(Vec<JobSnapshot>),
    Templates(Vec<Template>),
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::JobCreated(id) => write!(f, "Job {id} created"),
            Reply::Ack(msg) => write!(f, "{msg}"),
            Reply::Status(snapshot) => write!(f, "{}", render::render_status(snapshot)),
            Reply::Jobs(jobs) => write!(f, "{}", render::render_jobs(jobs)),
            Reply::Templates(templates) => write!(f, "{}", render::render_templates(templates)),
        }
    }
}
