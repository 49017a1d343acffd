//! Login sequence
//!
//! Authenticates, persists the identity, then prefetches what the other
//! pages read. The follow-up fetches are described as [`LoginStep`]s, each
//! with a [`StepPolicy`]: a `Required` step aborts the login on failure, a
//! `BestEffort` step is logged and skipped.
//!
//! Nothing is persisted unless upstream accepted the credentials and the
//! payload carries at least one student and one progression record.

use crate::client::{ClientError, DomainClient, LoginRequest, TimetableQuery};
use crate::config::{resolve_academic_year, AcademicYearField, PortalConfig};
use crate::gateway::SessionToken;
use crate::models::{present, Envelope, ProgressionRecord, Snapshot, StudentInfo};
use crate::store::{SessionStore, SnapshotStore, StoreError, StoreKey};
use crate::views::Route;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Email and password are required")]
    MissingCredentials,
    /// Upstream business error, verbatim.
    #[error("{0}")]
    Rejected(String),
    /// Business error on a follow-up fetch, verbatim.
    #[error("{message}")]
    StepRejected { step: LoginStep, message: String },
    #[error("Invalid user data received")]
    InvalidUserData,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    Required,
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Institute,
    Progression,
    Attendance,
    Timetable,
}

impl LoginStep {
    /// Run order after authentication.
    pub const SEQUENCE: [LoginStep; 4] = [
        LoginStep::Institute,
        LoginStep::Progression,
        LoginStep::Attendance,
        LoginStep::Timetable,
    ];

    pub fn policy(self) -> StepPolicy {
        match self {
            LoginStep::Institute | LoginStep::Progression => StepPolicy::Required,
            LoginStep::Attendance | LoginStep::Timetable => StepPolicy::BestEffort,
        }
    }

    fn key(self) -> StoreKey {
        match self {
            LoginStep::Institute => StoreKey::InstituteData,
            LoginStep::Progression => StoreKey::StudentProgData,
            LoginStep::Attendance => StoreKey::AttendanceData,
            LoginStep::Timetable => StoreKey::TimetableData,
        }
    }
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginStep::Institute => "institute",
            LoginStep::Progression => "progression",
            LoginStep::Attendance => "attendance",
            LoginStep::Timetable => "timetable",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Saved,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: LoginStep,
    pub status: StepStatus,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub route: Route,
    pub steps: Vec<StepReport>,
}

impl LoginOutcome {
    pub fn status_of(&self, step: LoginStep) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }
}

/// What the follow-up steps read from the login payload.
struct Identity {
    session: Option<SessionToken>,
    student: StudentInfo,
    progression: ProgressionRecord,
}

pub struct LoginFlow<'a> {
    client: &'a DomainClient,
    store: &'a dyn SessionStore,
    device_type: &'a str,
    academic_year_fields: &'a [AcademicYearField],
}

impl<'a> LoginFlow<'a> {
    pub fn new(client: &'a DomainClient, store: &'a dyn SessionStore, config: &'a PortalConfig) -> Self {
        Self {
            client,
            store,
            device_type: &config.device_type,
            academic_year_fields: &config.academic_year_fields,
        }
    }

    pub async fn run(&self, email: &str, password: &str) -> Result<LoginOutcome, LoginError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            device_type: self.device_type.to_string(),
        };
        let reply = self.client.login(&request).await?;
        if let Some(message) = reply.response.error_message() {
            warn!("login rejected by upstream: {message}");
            return Err(LoginError::Rejected(message));
        }

        let data = reply.response.data();
        let (Some(student), Some(progression)) = (data.first_student(), data.first_progression()) else {
            warn!(
                students = data.login_details.students.len(),
                progressions = data.progression_data.len(),
                "login payload lacks student or progression records"
            );
            return Err(LoginError::InvalidUserData);
        };
        let identity = Identity {
            session: reply.session.clone(),
            student: student.clone(),
            progression: progression.clone(),
        };

        self.store.save(StoreKey::LoginData, &reply.response)?;
        if let Some(token) = &reply.session {
            self.store.save_session_token(token)?;
        }
        self.store.set_authenticated(true)?;
        info!(student = %identity.student.stu_id, "logged in");

        let mut steps = Vec::with_capacity(LoginStep::SEQUENCE.len());
        for step in LoginStep::SEQUENCE {
            let status = match self.run_step(step, &identity).await {
                Ok(status) => status,
                Err(e) if step.policy() == StepPolicy::Required => {
                    warn!(%step, "required login step failed: {e}");
                    return Err(e);
                }
                Err(e) => {
                    warn!(%step, "login step failed, continuing: {e}");
                    StepStatus::Failed(e.to_string())
                }
            };
            steps.push(StepReport { step, status });
        }

        Ok(LoginOutcome {
            route: Route::Dashboard,
            steps,
        })
    }

    async fn run_step(&self, step: LoginStep, identity: &Identity) -> Result<StepStatus, LoginError> {
        let session = identity.session.as_ref();
        let prog = &identity.progression;

        match step {
            LoginStep::Institute => {
                let snapshot = self.client.institute_details(session, &prog.institute_id).await?;
                self.keep(step, &snapshot)?;
            }
            LoginStep::Progression => {
                let ids = [identity.student.stu_id.clone()];
                let snapshot = self.client.student_progression(session, &ids).await?;
                self.keep(step, &snapshot)?;
            }
            LoginStep::Attendance => {
                let Some(cm_prog_id) = present(&prog.cm_prog_id) else {
                    return Ok(StepStatus::Skipped("no CmProgID on progression record".into()));
                };
                let snapshot = self.client.attendance(session, cm_prog_id).await?;
                self.keep(step, &snapshot)?;
            }
            LoginStep::Timetable => {
                let Some(query) = timetable_query(prog, self.academic_year_fields) else {
                    return Ok(StepStatus::Skipped("no academic year on progression record".into()));
                };
                let snapshot = self.client.timetable(session, &query).await?;
                self.keep(step, &snapshot)?;
            }
        }
        Ok(StepStatus::Saved)
    }

    /// Stores the reply unless upstream flagged it with `errors`.
    fn keep<T>(&self, step: LoginStep, snapshot: &Snapshot<Envelope<T>>) -> Result<(), LoginError> {
        if let Some(message) = snapshot.error_message() {
            return Err(LoginError::StepRejected { step, message });
        }
        self.store.save(step.key(), snapshot)?;
        Ok(())
    }
}

/// Timetable parameters from a progression record.
pub fn timetable_query(prog: &ProgressionRecord, fields: &[AcademicYearField]) -> Option<TimetableQuery> {
    Some(TimetableQuery {
        institute_id: prog.institute_id.clone(),
        program_id: prog.program_id.clone(),
        course_id: prog.course_id.clone(),
        department_id: prog.department_id.clone(),
        academic_year: resolve_academic_year(fields, prog)?,
        semester_id: prog.semester_id.clone(),
        section_id: prog.section_id.clone(),
    })
}
