use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rusqlite::Connection;
use tokio::sync::watch;
use tracing::{error, info, warn};

use promobot_audit::{AuditEntry, AuditLog, EventKind};
use promobot_channels::MessageSink;
use promobot_core::{ChatId, JobId, PrincipalId, PromobotConfig, TargetRef, TemplatePayload};
use promobot_roles::{permissions, RoleRegistry};

use crate::db;
use crate::error::{Result, SchedulerError};
use crate::state::{next_state, JobEvent};
use crate::types::{Job, JobSnapshot, JobState, Schedule};

/// Runtime behaviour knobs, taken from process config.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// When true, new jobs never auto-advance past Queued.
    pub safe_mode: bool,
    /// When true, resuming an interval job restarts the interval from the
    /// resume instant instead of keeping the original deadline.
    pub reset_on_resume: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            reset_on_resume: false,
        }
    }
}

impl From<&PromobotConfig> for RuntimeConfig {
    fn from(cfg: &PromobotConfig) -> Self {
        Self {
            safe_mode: cfg.safe_mode,
            reset_on_resume: cfg.reset_on_resume,
        }
    }
}

/// What the control side tells a posting loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSignal {
    Run,
    Pause,
    Stop,
}

/// Live per-job record: the job itself plus its loop's control channel.
///
/// `ticket` is the exclusive execution token from the singleton-loop rule:
/// every spawned loop captures the current value and exits as soon as it no
/// longer matches, so a stale loop can never outlive a stop or a respawn.
struct JobEntry {
    job: Mutex<Job>,
    signal: watch::Sender<LoopSignal>,
    ticket: AtomicU64,
}

impl JobEntry {
    fn new(job: Job) -> Arc<Self> {
        // The receiver is dropped immediately: `signal.is_closed()` then
        // doubles as "no loop is alive for this job".
        let (signal, _) = watch::channel(LoopSignal::Pause);
        Arc::new(Self {
            job: Mutex::new(job),
            signal,
            ticket: AtomicU64::new(0),
        })
    }
}

struct Inner {
    cfg: RuntimeConfig,
    jobs: DashMap<JobId, Arc<JobEntry>>,
    sink: Arc<dyn MessageSink>,
    roles: Arc<RoleRegistry>,
    audit: Arc<AuditLog>,
    db: Mutex<Connection>,
}

/// Owns every live job and is the only writer of job state and counters.
///
/// Cheap to clone; all clones share the same job map. Must live inside a
/// Tokio runtime because starting a job spawns its posting loop.
#[derive(Clone)]
pub struct JobRuntime {
    inner: Arc<Inner>,
}

impl JobRuntime {
    /// Build a runtime over an open connection, initialising the schema.
    pub fn new(
        conn: Connection,
        sink: Arc<dyn MessageSink>,
        roles: Arc<RoleRegistry>,
        audit: Arc<AuditLog>,
        cfg: RuntimeConfig,
    ) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self {
            inner: Arc::new(Inner {
                cfg,
                jobs: DashMap::new(),
                sink,
                roles,
                audit,
                db: Mutex::new(conn),
            }),
        })
    }

    /// Reconcile persisted jobs after a process restart.
    ///
    /// Jobs that were Running or Stopping when the process died are marked
    /// Paused (or Stopped, for a stop already underway) and wait for an
    /// explicit Start. Queued and Paused jobs come back as they were.
    /// Returns the number of jobs restored to the live set.
    pub fn recover(&self) -> Result<usize> {
        let active = {
            let conn = self.inner.db.lock().unwrap();
            db::load_active(&conn)?
        };

        let mut restored = 0;
        for mut job in active {
            let from = job.state;
            match from {
                JobState::Running => {
                    job.state = JobState::Paused;
                    job.last_transition_at = Utc::now();
                    self.inner.persist(&job);
                    self.inner.audit_quiet(
                        AuditEntry::now(EventKind::Recovered)
                            .job(job.id)
                            .states(from.to_string(), job.state.to_string())
                            .note("paused on restart; explicit start required"),
                    );
                }
                JobState::Stopping => {
                    // The stop was already underway; the dead loop cannot
                    // dispatch again, so the cancellation is complete.
                    job.state = JobState::Stopped;
                    job.next_run = None;
                    job.last_transition_at = Utc::now();
                    self.inner.persist(&job);
                    self.inner.audit_quiet(
                        AuditEntry::now(EventKind::Recovered)
                            .job(job.id)
                            .states(from.to_string(), job.state.to_string())
                            .note("stop completed on restart"),
                    );
                    continue;
                }
                _ => {}
            }
            self.inner.jobs.insert(job.id, JobEntry::new(job));
            restored += 1;
        }

        info!(restored, "runtime recovery complete");
        Ok(restored)
    }

    /// Create a job from a captured template snapshot.
    ///
    /// The payload is copied here, insulating the job from any later edit or
    /// deletion of the template it came from. Unless SAFE_MODE is on, the job
    /// auto-advances to Running.
    pub fn create_job(
        &self,
        actor: PrincipalId,
        chat: ChatId,
        target: TargetRef,
        payload: TemplatePayload,
        schedule: Schedule,
    ) -> Result<JobId> {
        let role = self.inner.roles.role_of(actor);
        if !permissions::can_create_job(role) {
            return Err(SchedulerError::Forbidden {
                reason: format!("role {role} cannot create jobs"),
            });
        }
        schedule.validate().map_err(SchedulerError::InvalidSchedule)?;

        let now = Utc::now();
        let id = {
            let conn = self.inner.db.lock().unwrap();
            db::insert_job(&conn, actor, chat, target, &payload, &schedule, now)?
        };
        let job = Job {
            id,
            creator: actor,
            chat,
            target,
            payload,
            schedule: schedule.clone(),
            state: JobState::Queued,
            attempts_made: 0,
            success_count: 0,
            failure_count: 0,
            next_run: None,
            created_at: now,
            last_transition_at: now,
        };
        let entry = JobEntry::new(job);
        self.inner.jobs.insert(id, Arc::clone(&entry));
        self.inner.audit.append(
            &AuditEntry::now(EventKind::JobCreated)
                .job(id)
                .by(actor)
                .note(schedule.describe()),
        )?;
        info!(job_id = %id, %actor, schedule = %schedule.describe(), "job created");

        if !self.inner.cfg.safe_mode {
            self.inner.start_job(&entry, None)?;
        }
        Ok(id)
    }

    /// Start a Queued job or resume a Paused one.
    pub fn start(&self, id: JobId, actor: PrincipalId) -> Result<()> {
        let entry = self.entry_for_control(id, actor)?;
        self.inner.start_job(&entry, Some(actor))
    }

    /// Suspend a Running job before its next attempt. An attempt already
    /// dispatched is allowed to finish.
    pub fn pause(&self, id: JobId, actor: PrincipalId) -> Result<()> {
        let entry = self.entry_for_control(id, actor)?;
        let mut job = entry.job.lock().unwrap();
        self.inner
            .apply_locked(&mut job, JobEvent::Pause, Some(actor), "pause")?;
        drop(job);
        entry.signal.send_replace(LoopSignal::Pause);
        Ok(())
    }

    /// Stop a job. Queued jobs stop immediately; live jobs pass through
    /// Stopping while their loop winds down, guaranteeing no further attempt
    /// is dispatched.
    pub fn stop(&self, id: JobId, actor: PrincipalId) -> Result<()> {
        let entry = self.entry_for_control(id, actor)?;
        let mut job = entry.job.lock().unwrap();
        match job.state {
            JobState::Queued => {
                job.next_run = None;
                self.inner
                    .apply_locked(&mut job, JobEvent::Stop, Some(actor), "stop")?;
                entry.ticket.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            JobState::Running | JobState::Paused => {
                self.inner
                    .apply_locked(&mut job, JobEvent::Stop, Some(actor), "stop")?;
                drop(job);
                if entry.signal.is_closed() {
                    // Recovered job with no live loop: nothing to wind down.
                    self.inner.finish(&entry, JobEvent::LoopExited, None);
                } else {
                    entry.signal.send_replace(LoopSignal::Stop);
                }
                Ok(())
            }
            from => Err(SchedulerError::InvalidTransition {
                from,
                command: "stop",
            }),
        }
    }

    /// Point-in-time snapshot of one job. Read-only; requires at least
    /// Viewer. Archived ids answer `JobNotFound`.
    pub fn details(&self, id: JobId, actor: PrincipalId) -> Result<JobSnapshot> {
        if !self.inner.roles.role_of(actor).can_view() {
            return Err(SchedulerError::Forbidden {
                reason: "viewer rights required".to_string(),
            });
        }
        let entry = self
            .inner
            .jobs
            .get(&id)
            .ok_or(SchedulerError::JobNotFound { id })?;
        let snapshot = entry.job.lock().unwrap().snapshot();
        Ok(snapshot)
    }

    /// Snapshots of every live job, ordered by id.
    pub fn list(&self, actor: PrincipalId) -> Result<Vec<JobSnapshot>> {
        if !self.inner.roles.role_of(actor).can_view() {
            return Err(SchedulerError::Forbidden {
                reason: "viewer rights required".to_string(),
            });
        }
        let mut snapshots: Vec<JobSnapshot> = self
            .inner
            .jobs
            .iter()
            .map(|e| e.value().job.lock().unwrap().snapshot())
            .collect();
        snapshots.sort_by_key(|s| s.id);
        Ok(snapshots)
    }

    /// Drop terminal jobs older than `retention` from the live set. Their
    /// rows and audit history stay in SQLite.
    pub fn evict_terminal(&self, retention: std::time::Duration) -> usize {
        let cutoff = Utc::now() - to_chrono(retention);
        let before = self.inner.jobs.len();
        self.inner.jobs.retain(|_, entry| {
            let job = entry.job.lock().unwrap();
            !(job.state.is_terminal() && job.last_transition_at < cutoff)
        });
        let evicted = before - self.inner.jobs.len();
        if evicted > 0 {
            info!(evicted, "terminal jobs archived out of the live set");
        }
        evicted
    }

    /// Look up a job and check the actor's control rights over it.
    fn entry_for_control(&self, id: JobId, actor: PrincipalId) -> Result<Arc<JobEntry>> {
        let entry = self
            .inner
            .jobs
            .get(&id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(SchedulerError::JobNotFound { id })?;
        let role = self.inner.roles.role_of(actor);
        let creator = entry.job.lock().unwrap().creator;
        if !permissions::can_control(role, actor, creator) {
            return Err(SchedulerError::Forbidden {
                reason: format!("role {role} cannot control job {id}"),
            });
        }
        Ok(entry)
    }
}

impl Inner {
    /// Apply a command-driven transition while the caller holds the job lock.
    /// Persists the new state and appends the audit entry before returning,
    /// so per-job audit order matches transition order.
    fn apply_locked(
        &self,
        job: &mut Job,
        event: JobEvent,
        actor: Option<PrincipalId>,
        command: &'static str,
    ) -> Result<JobState> {
        let from = job.state;
        let to = next_state(from, event)
            .ok_or(SchedulerError::InvalidTransition { from, command })?;
        job.state = to;
        job.last_transition_at = Utc::now();
        if to.is_terminal() {
            job.next_run = None;
        }
        {
            let conn = self.db.lock().unwrap();
            db::update_job(&conn, job)?;
        }
        let mut entry = AuditEntry::now(EventKind::Transition)
            .job(job.id)
            .states(from.to_string(), to.to_string());
        if let Some(actor) = actor {
            entry = entry.by(actor);
        }
        self.audit.append(&entry)?;
        info!(job_id = %job.id, %from, %to, ?actor, "transition applied");
        Ok(to)
    }

    /// Start or resume under the per-job lock, spawning the loop when none is
    /// alive. Holding the lock across the decision means two concurrent Start
    /// calls can never spawn duplicate loops.
    fn start_job(self: &Arc<Self>, entry: &Arc<JobEntry>, actor: Option<PrincipalId>) -> Result<()> {
        let mut job = entry.job.lock().unwrap();
        match job.state {
            JobState::Queued => {
                self.apply_locked(&mut job, JobEvent::Start, actor, "start")?;
                drop(job);
                self.spawn_loop(entry);
                Ok(())
            }
            JobState::Paused => {
                self.apply_locked(&mut job, JobEvent::Start, actor, "start")?;
                drop(job);
                if entry.signal.is_closed() {
                    // Recovered job: its loop died with the old process.
                    self.spawn_loop(entry);
                } else {
                    entry.signal.send_replace(LoopSignal::Run);
                }
                Ok(())
            }
            from => Err(SchedulerError::InvalidTransition {
                from,
                command: "start",
            }),
        }
    }

    fn spawn_loop(self: &Arc<Self>, entry: &Arc<JobEntry>) {
        // Bumping the ticket first invalidates any stale loop outright.
        let ticket = entry.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        entry.signal.send_replace(LoopSignal::Run);
        let rx = entry.signal.subscribe();
        let inner = Arc::clone(self);
        let entry = Arc::clone(entry);
        tokio::spawn(posting_loop(inner, entry, ticket, rx));
    }

    /// Terminal transition driven by the loop itself. Loop-side failures are
    /// logged, never propagated: no error in one job's loop may affect
    /// another job or the runtime's own integrity.
    fn finish(&self, entry: &JobEntry, event: JobEvent, note: Option<String>) {
        let mut job = entry.job.lock().unwrap();
        if job.state.is_terminal() {
            return;
        }
        let from = job.state;
        let Some(to) = next_state(from, event) else {
            warn!(job_id = %job.id, %from, ?event, "loop found no terminal transition");
            return;
        };
        job.state = to;
        job.next_run = None;
        job.last_transition_at = Utc::now();
        entry.ticket.fetch_add(1, Ordering::SeqCst);
        self.persist(&job);
        let mut audit_entry = AuditEntry::now(EventKind::Transition)
            .job(job.id)
            .states(from.to_string(), to.to_string());
        if let Some(note) = note {
            audit_entry = audit_entry.note(note);
        }
        self.audit_quiet(audit_entry);
        info!(job_id = %job.id, %from, %to, "job finished");
    }

    /// Persist a job row, logging instead of propagating on failure.
    fn persist(&self, job: &Job) {
        let conn = self.db.lock().unwrap();
        if let Err(e) = db::update_job(&conn, job) {
            error!(job_id = %job.id, error = %e, "failed to persist job");
        }
    }

    /// Append an audit entry, logging instead of propagating on failure.
    fn audit_quiet(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.append(&entry) {
            error!(error = %e, "failed to append audit entry");
        }
    }

    fn store_next_run(&self, entry: &JobEntry, next: Option<DateTime<Utc>>) {
        let mut job = entry.job.lock().unwrap();
        job.next_run = next;
        self.persist(&job);
    }
}

/// One posting loop per Running job.
///
/// Suspension is cooperative: the loop waits on the next deadline or a signal
/// change, whichever comes first. An attempt already dispatched always runs
/// to completion; pause and stop take effect at the next decision point.
async fn posting_loop(
    inner: Arc<Inner>,
    entry: Arc<JobEntry>,
    ticket: u64,
    mut rx: watch::Receiver<LoopSignal>,
) {
    let (id, chat, target, payload, schedule) = {
        let job = entry.job.lock().unwrap();
        (
            job.id,
            job.chat,
            job.target,
            job.payload.clone(),
            job.schedule.clone(),
        )
    };
    let every = schedule.every();
    let max = schedule.max_attempts();

    // First deadline: a persisted next_run wins (a resumed job keeps its
    // phase), otherwise fire now for `once` and one interval out otherwise.
    let mut deadline = {
        let mut job = entry.job.lock().unwrap();
        let d = match (job.next_run, every) {
            (Some(t), _) if !inner.cfg.reset_on_resume => t,
            (_, Some(every)) => Utc::now() + to_chrono(every),
            _ => Utc::now(),
        };
        job.next_run = Some(d);
        inner.persist(&job);
        d
    };
    info!(job_id = %id, "posting loop started");

    loop {
        if entry.ticket.load(Ordering::SeqCst) != ticket {
            return; // superseded by a newer loop or a terminal transition
        }
        // Copy the signal out so the watch ref is released before awaiting.
        let sig = *rx.borrow_and_update();
        match sig {
            LoopSignal::Stop => {
                inner.finish(&entry, JobEvent::LoopExited, None);
                return;
            }
            LoopSignal::Pause => {
                // No attempt slot is consumed while paused.
                if rx.changed().await.is_err() {
                    return;
                }
                if *rx.borrow() == LoopSignal::Run {
                    if let (true, Some(every)) = (inner.cfg.reset_on_resume, every) {
                        deadline = Utc::now() + to_chrono(every);
                        inner.store_next_run(&entry, Some(deadline));
                    }
                }
                continue;
            }
            LoopSignal::Run => {}
        }

        let wait = (deadline - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
                continue; // pause/stop arrived mid-wait
            }
        }

        // The deadline fired, but a signal may have raced it.
        if *rx.borrow_and_update() != LoopSignal::Run {
            continue;
        }
        if entry.ticket.load(Ordering::SeqCst) != ticket {
            return;
        }

        // Dispatch one attempt. The attempt counter moves first, keeping
        // success + failure <= attempts while the send is in flight.
        let dispatching = {
            let mut job = entry.job.lock().unwrap();
            // A stop or pause applied after the deadline fired may not be
            // visible on the signal yet; the state under the lock is
            // authoritative. Once a job leaves Running, no attempt begins.
            if job.state == JobState::Running {
                job.attempts_made += 1;
                inner.persist(&job);
                true
            } else {
                false
            }
        };
        if !dispatching {
            // The command that moved the state sends its signal next; wait
            // for it rather than spin on the lapsed deadline.
            if rx.changed().await.is_err() {
                return;
            }
            continue;
        }
        let result = inner.sink.post(chat, target, &payload).await;

        let mut fatal = None;
        {
            let mut job = entry.job.lock().unwrap();
            match &result {
                Ok(()) => {
                    job.success_count += 1;
                    inner.audit_quiet(AuditEntry::now(EventKind::AttemptSent).job(id));
                }
                Err(e) => {
                    job.failure_count += 1;
                    inner.audit_quiet(
                        AuditEntry::now(EventKind::AttemptFailed)
                            .job(id)
                            .note(e.to_string()),
                    );
                    if e.is_permanent() {
                        fatal = Some(e.to_string());
                    } else {
                        warn!(job_id = %id, error = %e, "attempt failed transiently");
                    }
                }
            }
            inner.persist(&job);
        }

        // A stop that landed during the dispatch wins over exhaustion.
        if *rx.borrow() == LoopSignal::Stop {
            inner.finish(&entry, JobEvent::LoopExited, None);
            return;
        }
        if let Some(reason) = fatal {
            inner.finish(&entry, JobEvent::Fatal, Some(reason));
            return;
        }
        let attempts = entry.job.lock().unwrap().attempts_made;
        if max.is_some_and(|m| attempts >= m) {
            inner.finish(&entry, JobEvent::Exhausted, None);
            return;
        }

        // Fixed phase: advance from the previous deadline, not from now.
        let Some(every) = every else {
            // Non-repeating schedule with its single attempt spent.
            inner.finish(&entry, JobEvent::Exhausted, None);
            return;
        };
        deadline += to_chrono(every);
        inner.store_next_run(&entry, Some(deadline));
    }
}

fn to_chrono(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
}
