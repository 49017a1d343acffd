//! Domain client
//!
//! One typed method per college API operation. Named parameters go in a
//! JSON POST body; the chapter lookups encode theirs positionally in a GET
//! path. Each operation fails with its own fixed message.

use crate::gateway::{GatewayRequest, GatewayTransport, SessionToken, TransportError};
use crate::models::{
    AttendanceResponse, ChapterContentResponse, ChapterListResponse, InstituteResponse, LoginResponse,
    Snapshot, StudentProgResponse, SubjectAttendanceResponse, TeachingContentResponse, TimetableResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    InstituteDetails,
    StudentProgression,
    Attendance,
    SubjectAttendance,
    Timetable,
    TeachingContent,
    ChapterNames,
    ChapterContent,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Login => "Login failed",
            Operation::InstituteDetails => "Failed to fetch institute details",
            Operation::StudentProgression => "Failed to fetch student progression",
            Operation::Attendance => "Failed to fetch attendance data",
            Operation::SubjectAttendance => "Failed to fetch subject attendance",
            Operation::Timetable => "Failed to fetch timetable",
            Operation::TeachingContent => "Failed to fetch teaching content",
            Operation::ChapterNames => "Failed to fetch chapter names",
            Operation::ChapterContent => "Failed to fetch chapter content",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FailureCause {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("gateway answered {0}")]
    Status(u16),
    #[error("unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Displays as the operation's failure message; the cause is the source.
#[derive(Debug, thiserror::Error)]
#[error("{}", .operation.failure_message())]
pub struct ClientError {
    pub operation: Operation,
    #[source]
    pub cause: FailureCause,
}

pub mod endpoints {
    pub const LOGIN: &str = "/login/validate";
    pub const INSTITUTE_DETAILS: &str = "/api/institute/getInstDtls";
    pub const STUDENT_PROGRESSION: &str = "/api/studentprog/getStudProg";
    pub const ATTENDANCE: &str = "/api/Attendance/getDtaForStupage";
    pub const SUBJECT_ATTENDANCE: &str = "/api/getAttendanceByAttTypAndSubj";
    pub const TIMETABLE: &str = "/api/Timetable/get";
    pub const TEACHING_CONTENT: &str = "/api/TeachContent/getTeachContent";
    pub const CHAPTER_NAMES: &str = "/api/TeachContent/getChapterNamesById";
    pub const CHAPTER_CONTENT: &str = "/api/TeachContent/getChapterContentByIds";
}

// ===== Request payloads =====

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "pwd")]
    pub password: String,
    #[serde(rename = "dtype")]
    pub device_type: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("device_type", &self.device_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimetableQuery {
    #[serde(rename = "InId")]
    pub institute_id: String,
    #[serde(rename = "PrID")]
    pub program_id: String,
    #[serde(rename = "CrID")]
    pub course_id: String,
    #[serde(rename = "DeptID")]
    pub department_id: String,
    #[serde(rename = "AcYr")]
    pub academic_year: String,
    #[serde(rename = "SemID")]
    pub semester_id: String,
    #[serde(rename = "SecID")]
    pub section_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeachingContentQuery {
    #[serde(rename = "StuID")]
    pub stu_id: String,
    #[serde(rename = "SecID")]
    pub section_id: String,
    #[serde(rename = "SemID")]
    pub semester_id: String,
    #[serde(rename = "AcYr")]
    pub academic_year: String,
    #[serde(rename = "InId")]
    pub institute_id: String,
    #[serde(rename = "PrID")]
    pub program_id: String,
    #[serde(rename = "CrID")]
    pub course_id: String,
    #[serde(rename = "DeptID")]
    pub department_id: String,
}

/// Path segments of the chapter-name lookup, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterListQuery {
    pub cm_id: String,
    pub section_id: String,
    pub stu_id: String,
    pub semester_id: String,
    pub academic_year: String,
    pub institute_id: String,
    pub program_id: String,
    pub course_id: String,
    pub department_id: String,
}

impl ChapterListQuery {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}/{}/{}/{}/{}",
            endpoints::CHAPTER_NAMES,
            self.cm_id,
            self.section_id,
            self.stu_id,
            self.semester_id,
            self.academic_year,
            self.institute_id,
            self.program_id,
            self.course_id,
            self.department_id
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectAttendanceQuery {
    #[serde(rename = "CmProgID")]
    pub cm_prog_id: String,
    #[serde(rename = "isFE")]
    pub is_fe: bool,
    #[serde(rename = "AttenTy")]
    pub attendance_types: Vec<String>,
    #[serde(rename = "SubID")]
    pub subject_id: String,
}

/// Login answer plus the cookie the gateway relayed, if any.
#[derive(Debug, Clone)]
pub struct LoginReply {
    pub response: LoginResponse,
    pub session: Option<SessionToken>,
}

// ===== Client =====

#[derive(Clone)]
pub struct DomainClient {
    transport: Arc<dyn GatewayTransport>,
}

impl DomainClient {
    pub fn new(transport: Arc<dyn GatewayTransport>) -> Self {
        Self { transport }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginReply, ClientError> {
        let body = to_body(Operation::Login, credentials)?;
        let (session, response) = self
            .call(Operation::Login, GatewayRequest::post(endpoints::LOGIN, body))
            .await?;
        if session.is_none() {
            debug!("login answered without a session cookie");
        }
        Ok(LoginReply { response, session })
    }

    pub async fn institute_details(
        &self,
        session: Option<&SessionToken>,
        institute_id: &str,
    ) -> Result<InstituteResponse, ClientError> {
        let request = GatewayRequest::post(endpoints::INSTITUTE_DETAILS, json!({ "InId": institute_id }));
        self.fetch(Operation::InstituteDetails, request.with_session(session)).await
    }

    pub async fn student_progression(
        &self,
        session: Option<&SessionToken>,
        student_ids: &[String],
    ) -> Result<StudentProgResponse, ClientError> {
        let request = GatewayRequest::post(endpoints::STUDENT_PROGRESSION, json!(student_ids));
        self.fetch(Operation::StudentProgression, request.with_session(session)).await
    }

    pub async fn attendance(
        &self,
        session: Option<&SessionToken>,
        cm_prog_id: &str,
    ) -> Result<AttendanceResponse, ClientError> {
        let request = GatewayRequest::post(endpoints::ATTENDANCE, json!({ "CmProgID": cm_prog_id }));
        self.fetch(Operation::Attendance, request.with_session(session)).await
    }

    pub async fn attendance_by_subject(
        &self,
        session: Option<&SessionToken>,
        query: &SubjectAttendanceQuery,
    ) -> Result<SubjectAttendanceResponse, ClientError> {
        let body = to_body(Operation::SubjectAttendance, query)?;
        let request = GatewayRequest::post(endpoints::SUBJECT_ATTENDANCE, body);
        self.fetch(Operation::SubjectAttendance, request.with_session(session)).await
    }

    pub async fn timetable(
        &self,
        session: Option<&SessionToken>,
        query: &TimetableQuery,
    ) -> Result<TimetableResponse, ClientError> {
        let body = to_body(Operation::Timetable, query)?;
        let request = GatewayRequest::post(endpoints::TIMETABLE, body);
        self.fetch(Operation::Timetable, request.with_session(session)).await
    }

    pub async fn teaching_content(
        &self,
        session: Option<&SessionToken>,
        query: &TeachingContentQuery,
    ) -> Result<TeachingContentResponse, ClientError> {
        let body = to_body(Operation::TeachingContent, query)?;
        let request = GatewayRequest::post(endpoints::TEACHING_CONTENT, body);
        self.fetch(Operation::TeachingContent, request.with_session(session)).await
    }

    pub async fn chapter_names(
        &self,
        session: Option<&SessionToken>,
        query: &ChapterListQuery,
    ) -> Result<ChapterListResponse, ClientError> {
        let request = GatewayRequest::get(query.endpoint());
        self.fetch(Operation::ChapterNames, request.with_session(session)).await
    }

    pub async fn chapter_content(
        &self,
        session: Option<&SessionToken>,
        cm_id: &str,
        chapter_id: &str,
        sub_chapter_id: &str,
    ) -> Result<ChapterContentResponse, ClientError> {
        let endpoint = format!("{}/{cm_id}/{chapter_id}/{sub_chapter_id}", endpoints::CHAPTER_CONTENT);
        self.fetch(Operation::ChapterContent, GatewayRequest::get(endpoint).with_session(session))
            .await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: GatewayRequest,
    ) -> Result<Snapshot<T>, ClientError> {
        self.call(operation, request).await.map(|(_, snapshot)| snapshot)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: GatewayRequest,
    ) -> Result<(Option<SessionToken>, Snapshot<T>), ClientError> {
        let endpoint = request.endpoint.clone();
        let fail = |cause: FailureCause| {
            warn!(?operation, %endpoint, "{cause}");
            ClientError { operation, cause }
        };

        let reply = self
            .transport
            .send(request)
            .await
            .map_err(|e| fail(FailureCause::Transport(e)))?;
        if !reply.is_success() {
            return Err(fail(FailureCause::Status(reply.status)));
        }
        let snapshot = Snapshot::from_value(reply.body).map_err(|e| fail(FailureCause::Shape(e)))?;
        Ok((reply.session, snapshot))
    }
}

fn to_body<T: Serialize>(operation: Operation, payload: &T) -> Result<Value, ClientError> {
    serde_json::to_value(payload).map_err(|e| ClientError {
        operation,
        cause: FailureCause::Shape(e),
    })
}
