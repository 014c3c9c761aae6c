use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::domain::{
    models::{
        auth::Caller,
        enrollment::InvitationStatus,
        notification::Notice,
        session::{CallRole, NewSessionParams, Participant, ProvisioningStatus, Session},
        user::Role,
    },
    ports::{CallMember, CourseRepository, EnrollmentRepository, Notifier, SessionRepository, UserRepository, VideoProvider},
    services::{conflict, time_normalizer::{TimeInput, TimeNormalizer}},
};
use crate::error::AppError;

pub const NEW_SESSION_TITLE: &str = "Nueva sesión";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingStage {
    Validating,
    RosterBuilding,
    Persisting,
    RemoteProvisioning,
    Committed,
}

pub struct ScheduleRequest {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub start: TimeInput,
    pub end: TimeInput,
    pub origin_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub user_id: String,
    pub display_name: String,
    pub role: CallRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProvisioningOutcome {
    Provisioned,
    Failed { warning: String },
}

impl ProvisioningOutcome {
    pub fn status(&self) -> ProvisioningStatus {
        match self {
            ProvisioningOutcome::Provisioned => ProvisioningStatus::Provisioned,
            ProvisioningOutcome::Failed { .. } => ProvisioningStatus::Failed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduledSession {
    pub session: Session,
    pub roster: Vec<RosterEntry>,
    pub provisioning: ProvisioningOutcome,
}

pub struct SessionScheduler {
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    sessions: Arc<dyn SessionRepository>,
    video: Arc<dyn VideoProvider>,
    notifier: Arc<dyn Notifier>,
    clock: TimeNormalizer,
}

impl SessionScheduler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        sessions: Arc<dyn SessionRepository>,
        video: Arc<dyn VideoProvider>,
        notifier: Arc<dyn Notifier>,
        clock: TimeNormalizer,
    ) -> Self {
        Self { users, courses, enrollments, sessions, video, notifier, clock }
    }

    pub async fn schedule_session(&self, caller: &Caller, request: ScheduleRequest) -> Result<ScheduledSession, AppError> {
        let mut stage = SchedulingStage::Validating;
        let result = self.run(caller, request, &mut stage).await;
        if let Err(e) = &result {
            warn!(stage = ?stage, teacher_id = %caller.id, "Scheduling rejected: {}", e);
        }
        result
    }

    async fn run(&self, caller: &Caller, request: ScheduleRequest, stage: &mut SchedulingStage) -> Result<ScheduledSession, AppError> {
        if !caller.is(Role::Teacher) {
            return Err(AppError::Forbidden("No tienes permisos para crear llamadas".into()));
        }
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("Session title is required".into()));
        }

        let course = self.courses.find_by_id(&request.course_id).await?
            .ok_or(AppError::NotFound("Curso no encontrado".into()))?;
        if course.teacher_id != caller.id {
            return Err(AppError::Forbidden("No puedes programar sesiones en un curso ajeno".into()));
        }

        let teacher = self.users.find_by_id(&caller.id).await?
            .ok_or(AppError::NotFound("Profesor no encontrado".into()))?;

        let start = self.clock.to_storage(&request.start);
        let end = self.clock.to_storage(&request.end);

        let existing = self.sessions.list_by_teacher(&caller.id).await?;
        conflict::ensure_free(&existing, start, end).map_err(|e| self.for_display(e))?;

        self.advance(stage, SchedulingStage::RosterBuilding);
        let accepted = self.enrollments.list_by_course(&course.id, InvitationStatus::Accepted).await?;

        let mut roster = vec![RosterEntry {
            user_id: teacher.id.clone(),
            display_name: teacher.display_name(),
            role: CallRole::Host,
        }];
        for enrollment in accepted.iter().filter(|e| e.student_id != teacher.id) {
            let student = self.users.find_by_id(&enrollment.student_id).await?
                .ok_or_else(|| AppError::NotFound(format!("Usuario {} no encontrado", enrollment.student_id)))?;
            roster.push(RosterEntry {
                user_id: student.id.clone(),
                display_name: student.display_name(),
                role: CallRole::Participant,
            });
        }

        self.advance(stage, SchedulingStage::Persisting);
        let session = Session::new(NewSessionParams {
            course_id: course.id.clone(),
            title: request.title,
            description: request.description,
            start,
            end,
            origin_url: request.origin_url,
        });

        let host_joined = Utc::now().naive_utc();
        let participants: Vec<Participant> = roster
            .iter()
            .map(|member| {
                let joined_at = (member.role == CallRole::Host).then_some(host_joined);
                Participant::new(session.id.clone(), member.user_id.clone(), member.role, joined_at)
            })
            .collect();

        let mut created = self.sessions
            .create_with_participants(&teacher.id, &session, &participants)
            .await
            .map_err(|e| self.for_display(e))?;

        self.advance(stage, SchedulingStage::RemoteProvisioning);
        let provisioning = self.provision(&created, &teacher.id, &roster).await;
        match self.sessions.set_provisioning_status(&created.id, provisioning.status()).await {
            Ok(()) => created.provisioning_status = provisioning.status(),
            Err(e) => warn!("Could not record provisioning status for session {}: {:?}", created.id, e),
        }

        let message = format!("Tu profesor: {} ha creado una nueva sesión", teacher.display_name());
        for member in roster.iter().filter(|m| m.role == CallRole::Participant) {
            let notice = Notice {
                user_id: member.user_id.clone(),
                title: NEW_SESSION_TITLE.to_string(),
                message: message.clone(),
                session_id: Some(created.id.clone()),
            };
            if let Err(e) = self.notifier.notify(notice).await {
                warn!("Failed to queue session notification for {}: {:?}", member.user_id, e);
            }
        }

        self.advance(stage, SchedulingStage::Committed);
        info!(
            session_id = %created.id,
            course_id = %course.id,
            roster = roster.len(),
            "Scheduled session '{}'", created.title
        );

        Ok(ScheduledSession { session: created, roster, provisioning })
    }

    /// Registers the roster with the video provider and opens the call room.
    pub async fn provision(&self, session: &Session, creator_id: &str, roster: &[RosterEntry]) -> ProvisioningOutcome {
        for member in roster {
            if let Err(e) = self.video.upsert_user(&member.user_id, &member.display_name).await {
                warn!(session_id = %session.id, "Provider user upsert failed for {}: {}", member.user_id, e);
                return ProvisioningOutcome::Failed { warning: e.to_string() };
            }
        }

        let members: Vec<CallMember> = roster
            .iter()
            .map(|m| CallMember { user_id: m.user_id.clone(), role: m.role.provider_role().to_string() })
            .collect();

        match self.video.create_or_get_call(&session.call_id, creator_id, &members).await {
            Ok(()) => ProvisioningOutcome::Provisioned,
            Err(e) => {
                warn!(session_id = %session.id, "Provider call creation failed: {}", e);
                ProvisioningOutcome::Failed { warning: e.to_string() }
            }
        }
    }

    /// Re-runs provisioning for failed sessions, least recently attempted first.
    ///
    /// Each attempt is stamped whatever its outcome, so sessions that keep
    /// failing rotate to the back of the queue.
    pub async fn retry_failed_provisioning(&self, limit: i64) -> Result<usize, AppError> {
        let failed = self.sessions.list_by_provisioning_status(ProvisioningStatus::Failed, limit).await?;
        let mut recovered = 0;

        for session in failed {
            match self.retry_one(&session).await {
                Ok(ProvisioningOutcome::Provisioned) => recovered += 1,
                Ok(ProvisioningOutcome::Failed { .. }) => {}
                Err(e) => warn!(session_id = %session.id, "Provisioning retry skipped: {:?}", e),
            }
        }

        Ok(recovered)
    }

    async fn retry_one(&self, session: &Session) -> Result<ProvisioningOutcome, AppError> {
        let profiles = self.sessions.list_participants(&session.id).await?;
        let outcome = match profiles.iter().find(|p| p.role == CallRole::Host) {
            Some(host) => {
                let creator_id = host.user_id.clone();
                let roster: Vec<RosterEntry> = profiles
                    .into_iter()
                    .map(|p| RosterEntry { user_id: p.user_id, display_name: p.display_name, role: p.role })
                    .collect();
                self.provision(session, &creator_id, &roster).await
            }
            None => {
                warn!(session_id = %session.id, "Session has no host; cannot provision");
                ProvisioningOutcome::Failed { warning: "Session has no host".into() }
            }
        };

        self.sessions.set_provisioning_status(&session.id, outcome.status()).await?;
        Ok(outcome)
    }

    fn advance(&self, stage: &mut SchedulingStage, next: SchedulingStage) {
        debug!(from = ?*stage, to = ?next, "Scheduling stage");
        *stage = next;
    }

    fn for_display(&self, err: AppError) -> AppError {
        match err {
            AppError::SchedulingConflict { session_id, title, start, end } => AppError::SchedulingConflict {
                session_id,
                title,
                start: self.clock.display(start),
                end: self.clock.display(end),
            },
            AppError::InvalidRange { start, end } => AppError::InvalidRange {
                start: self.clock.display(start),
                end: self.clock.display(end),
            },
            other => other,
        }
    }
}
