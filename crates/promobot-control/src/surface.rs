use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use promobot_audit::{AuditEntry, AuditLog, EventKind};
use promobot_core::{PrincipalId, TemplatePayload};
use promobot_roles::{permissions, RoleRegistry};
use promobot_scheduler::JobRuntime;
use promobot_templates::TemplateStore;

use crate::command::{Command, Reply};
use crate::error::{ControlError, Result};

/// Validates and dispatches typed commands into the scheduler, registry and
/// template store.
///
/// Stateless except for the per-principal recording mode; permissions are
/// looked up fresh on every call, never cached from an earlier render.
pub struct ControlSurface {
    runtime: JobRuntime,
    roles: Arc<RoleRegistry>,
    templates: Arc<TemplateStore>,
    audit: Arc<AuditLog>,
    /// Principals currently recording a template, mapped to the name the
    /// next captured message will be saved under.
    recording: Mutex<HashMap<PrincipalId, String>>,
}

impl ControlSurface {
    pub fn new(
        runtime: JobRuntime,
        roles: Arc<RoleRegistry>,
        templates: Arc<TemplateStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            runtime,
            roles,
            templates,
            audit,
            recording: Mutex::new(HashMap::new()),
        }
    }

    /// Execute one command on behalf of `actor`.
    pub fn handle(&self, actor: PrincipalId, command: Command) -> Result<Reply> {
        match command {
            Command::CreateJob {
                template,
                target,
                schedule,
            } => {
                // Snapshot the payload now; the job never reads the store again.
                let payload = self.templates.get(actor, &template)?;
                let id = self
                    .runtime
                    .create_job(actor, target.chat, target, payload, schedule)?;
                Ok(Reply::JobCreated(id))
            }

            Command::Start { job } => {
                self.runtime.start(job, actor)?;
                Ok(Reply::Ack(format!("Job {job} started")))
            }
            Command::Pause { job } => {
                self.runtime.pause(job, actor)?;
                Ok(Reply::Ack(format!("Job {job} paused")))
            }
            Command::Stop { job } => {
                self.runtime.stop(job, actor)?;
                Ok(Reply::Ack(format!("Job {job} stopping")))
            }

            Command::Details { job } => Ok(Reply::Status(self.runtime.details(job, actor)?)),
            Command::ListJobs => Ok(Reply::Jobs(self.runtime.list(actor)?)),

            Command::AddAdmin { target, role } => {
                self.roles.set_role(actor, target, role)?;
                self.audit.append(
                    &AuditEntry::now(EventKind::RoleAssigned)
                        .by(actor)
                        .note(format!("target={target} role={role}")),
                )?;
                Ok(Reply::Ack(format!("{target} is now {role}")))
            }
            Command::RemoveAdmin { target } => {
                self.roles.revoke(actor, target)?;
                self.audit.append(
                    &AuditEntry::now(EventKind::RoleRevoked)
                        .by(actor)
                        .note(format!("target={target}")),
                )?;
                Ok(Reply::Ack(format!("{target} role revoked")))
            }

            Command::ListTemplates => Ok(Reply::Templates(self.templates.list(actor)?)),

            Command::RemoveTemplate { name } => {
                // Owner-scoped: a principal can only ever remove their own.
                // Jobs holding a snapshot of the payload are unaffected.
                self.templates.remove(actor, &name)?;
                Ok(Reply::Ack(format!("Template '{name}' removed")))
            }

            Command::RecordTemplate { name } => {
                if !permissions::can_create_job(self.roles.role_of(actor)) {
                    return Err(ControlError::Forbidden {
                        reason: "editor rights required to record templates".to_string(),
                    });
                }
                self.recording.lock().unwrap().insert(actor, name.clone());
                info!(%actor, %name, "template recording started");
                Ok(Reply::Ack(format!(
                    "Recording template '{name}' — send the message to capture"
                )))
            }
            Command::FinishRecording => {
                let name = self
                    .recording
                    .lock()
                    .unwrap()
                    .remove(&actor)
                    .ok_or(ControlError::NotRecording)?;
                Ok(Reply::Ack(format!("Finished recording '{name}'")))
            }
        }
    }

    /// Feed a captured message to a principal in recording mode.
    ///
    /// Returns `None` when the principal is not recording — the transport
    /// treats the message as ordinary chat traffic in that case.
    pub fn capture_message(
        &self,
        actor: PrincipalId,
        payload: TemplatePayload,
    ) -> Result<Option<Reply>> {
        let name = match self.recording.lock().unwrap().get(&actor) {
            Some(name) => name.clone(),
            None => return Ok(None),
        };
        self.templates.put(actor, &name, &payload)?;
        Ok(Some(Reply::Ack(format!("Template '{name}' captured"))))
    }
}
