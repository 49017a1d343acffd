//! Course materials page
//!
//! Subject list comes from the store or is fetched once and stored. Chapter
//! lists and chapter details are fetched on selection and kept only in the
//! view. While one chapter fetch is in flight, further selections are
//! ignored. Chapter-level failures are logged, the page keeps its state.

use super::{require_auth, Mounted};
use crate::client::{ChapterListQuery, DomainClient, TeachingContentQuery};
use crate::config::{resolve_academic_year, PortalConfig};
use crate::gateway::SessionToken;
use crate::models::{
    present, ChapterContent, ChapterItem, LoginResponse, ProgressionRecord, StudentInfo, TeachingContent,
    TeachingContentResponse,
};
use crate::store::{SessionStore, SnapshotStore, StoreKey};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

pub const NO_STUDENT_DATA: &str = "No student data found";
pub const INVALID_TEACHING_CONTENT: &str = "Invalid teaching content response";

/// What a selection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Loaded,
    /// Another chapter fetch was in flight.
    Busy,
    NotFound,
    /// Logged; the view is unchanged apart from the selection itself.
    Failed,
}

/// Student/progression attributes every chapter-name lookup needs.
#[derive(Debug, Clone)]
struct ChapterScope {
    stu_id: String,
    section_id: String,
    semester_id: String,
    academic_year: String,
    institute_id: String,
    program_id: String,
    course_id: String,
    department_id: String,
}

impl ChapterScope {
    fn new(student: &StudentInfo, prog: &ProgressionRecord, academic_year: String) -> Self {
        Self {
            stu_id: student.stu_id.clone(),
            section_id: prog.section_id.clone(),
            semester_id: prog.semester_id.clone(),
            academic_year,
            institute_id: prog.institute_id.clone(),
            program_id: prog.program_id.clone(),
            course_id: prog.course_id.clone(),
            department_id: prog.department_id.clone(),
        }
    }

    fn chapter_query(&self, cm_id: &str) -> ChapterListQuery {
        ChapterListQuery {
            cm_id: cm_id.to_string(),
            section_id: self.section_id.clone(),
            stu_id: self.stu_id.clone(),
            semester_id: self.semester_id.clone(),
            academic_year: self.academic_year.clone(),
            institute_id: self.institute_id.clone(),
            program_id: self.program_id.clone(),
            course_id: self.course_id.clone(),
            department_id: self.department_id.clone(),
        }
    }

    fn teaching_query(&self) -> TeachingContentQuery {
        TeachingContentQuery {
            stu_id: self.stu_id.clone(),
            section_id: self.section_id.clone(),
            semester_id: self.semester_id.clone(),
            academic_year: self.academic_year.clone(),
            institute_id: self.institute_id.clone(),
            program_id: self.program_id.clone(),
            course_id: self.course_id.clone(),
            department_id: self.department_id.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct CoursesState {
    subjects: Vec<TeachingContent>,
    selected_subject: Option<TeachingContent>,
    chapters: Vec<ChapterItem>,
    selected_chapter: Option<ChapterContent>,
}

/// Clears the loading flag when the fetch ends, even if it is dropped.
struct LoadingGuard<'f>(&'f AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CoursesView<'a> {
    client: &'a DomainClient,
    session: Option<SessionToken>,
    scope: Option<ChapterScope>,
    state: Mutex<CoursesState>,
    loading: AtomicBool,
}

impl fmt::Debug for CoursesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoursesView")
            .field("state", &*self.state.lock())
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

fn chapter_scope(store: &dyn SessionStore, config: &PortalConfig) -> Option<ChapterScope> {
    let login = store.load::<LoginResponse>(StoreKey::LoginData)?;
    let student = login.data().first_student()?;
    let prog = login.data().first_progression()?;
    let academic_year = resolve_academic_year(&config.academic_year_fields, prog)?;
    Some(ChapterScope::new(student, prog, academic_year))
}

pub async fn mount<'a>(
    client: &'a DomainClient,
    store: &dyn SessionStore,
    config: &PortalConfig,
) -> Mounted<CoursesView<'a>> {
    if let Some(route) = require_auth(store) {
        return Mounted::Redirect(route);
    }

    let session = store.session_token();
    let scope = chapter_scope(store, config);

    let cached = store
        .load::<TeachingContentResponse>(StoreKey::TeachingContentData)
        .filter(|snap| !snap.raw()["output"]["data"].is_null());
    let subjects = match cached {
        Some(snapshot) => {
            debug!("subjects served from store");
            snapshot.data().clone()
        }
        None => {
            let Some(scope) = &scope else {
                return Mounted::Failed(NO_STUDENT_DATA.to_string());
            };
            let snapshot = match client.teaching_content(session.as_ref(), &scope.teaching_query()).await {
                Ok(snapshot) => snapshot,
                Err(e) => return Mounted::Failed(e.to_string()),
            };
            if snapshot.raw()["output"]["data"].is_null() {
                return Mounted::Failed(INVALID_TEACHING_CONTENT.to_string());
            }
            if let Err(e) = store.save(StoreKey::TeachingContentData, &snapshot) {
                warn!("teaching content fetched but not stored: {e}");
            }
            snapshot.data().clone()
        }
    };

    Mounted::Ready(CoursesView {
        client,
        session,
        scope,
        state: Mutex::new(CoursesState {
            subjects,
            ..Default::default()
        }),
        loading: AtomicBool::new(false),
    })
}

impl<'a> CoursesView<'a> {
    fn begin(&self) -> Option<LoadingGuard<'_>> {
        if self.loading.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(LoadingGuard(&self.loading))
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn subjects(&self) -> Vec<TeachingContent> {
        self.state.lock().subjects.clone()
    }

    pub fn selected_subject(&self) -> Option<TeachingContent> {
        self.state.lock().selected_subject.clone()
    }

    pub fn chapters(&self) -> Vec<ChapterItem> {
        self.state.lock().chapters.clone()
    }

    pub fn selected_chapter(&self) -> Option<ChapterContent> {
        self.state.lock().selected_chapter.clone()
    }

    /// Selects a subject by `_id`, `CmID` or subject code and loads its chapters.
    pub async fn select_subject(&self, key: &str) -> Selection {
        let Some(_guard) = self.begin() else {
            debug!(key, "subject selection ignored, fetch in flight");
            return Selection::Busy;
        };

        let subject = {
            let mut state = self.state.lock();
            let Some(subject) = state
                .subjects
                .iter()
                .find(|s| s.id == key || s.cm_id == key || s.subject_code == key)
                .cloned()
            else {
                return Selection::NotFound;
            };
            state.selected_subject = Some(subject.clone());
            state.selected_chapter = None;
            state.chapters.clear();
            subject
        };

        let Some(scope) = &self.scope else {
            warn!("no student data for chapter lookup");
            return Selection::Failed;
        };
        match self
            .client
            .chapter_names(self.session.as_ref(), &scope.chapter_query(&subject.cm_id))
            .await
        {
            Ok(snapshot) => {
                self.state.lock().chapters = snapshot.data().clone();
                Selection::Loaded
            }
            Err(e) => {
                warn!(subject = %subject.subject_code, "Failed to load chapters: {e}");
                Selection::Failed
            }
        }
    }

    /// Loads the detail of a chapter of the selected subject, by `SubChapID`.
    pub async fn select_chapter(&self, sub_chapter_id: &str) -> Selection {
        let Some(_guard) = self.begin() else {
            debug!(sub_chapter_id, "chapter selection ignored, fetch in flight");
            return Selection::Busy;
        };

        let (subject, chapter) = {
            let state = self.state.lock();
            let Some(subject) = state.selected_subject.clone() else {
                return Selection::NotFound;
            };
            let Some(chapter) = state
                .chapters
                .iter()
                .find(|c| c.sub_chapter_id == sub_chapter_id)
                .cloned()
            else {
                return Selection::NotFound;
            };
            (subject, chapter)
        };

        match self
            .client
            .chapter_content(
                self.session.as_ref(),
                &subject.cm_id,
                &chapter.chapter_id,
                &chapter.sub_chapter_id,
            )
            .await
        {
            Ok(snapshot) => {
                self.state.lock().selected_chapter = Some(snapshot.data().clone());
                Selection::Loaded
            }
            Err(e) => {
                warn!(sub_chapter_id, "Failed to load chapter content: {e}");
                Selection::Failed
            }
        }
    }
}

fn write_chapter(f: &mut fmt::Formatter<'_>, content: &ChapterContent) -> fmt::Result {
    let sub = &content.sub_chapter;
    writeln!(f, "\n{}", content.chapter_name)?;
    writeln!(f, "{}", sub.name)?;
    let sections = [
        ("Learning Objectives", &sub.objectives),
        ("Content Summary", &sub.content_summary),
        ("Web References", &sub.web_reference),
        ("Textbooks", &sub.textbook),
    ];
    for (title, text) in sections {
        if !text.trim().is_empty() {
            writeln!(f, "\n{title}\n  {text}")?;
        }
    }
    if !sub.attachments.is_empty() {
        writeln!(f, "\nStudy Materials")?;
        for attachment in &sub.attachments {
            writeln!(f, "  {}  {}", attachment.name, attachment.url)?;
        }
    }
    Ok(())
}

impl fmt::Display for CoursesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        writeln!(f, "Course Materials\n\nSubjects")?;
        let selected_id = state.selected_subject.as_ref().map(|s| s.id.as_str());
        for subject in &state.subjects {
            let marker = if Some(subject.id.as_str()) == selected_id { ">" } else { " " };
            writeln!(f, "{marker} {} ({})  [{}]", subject.subject_name, subject.subject_code, subject.cm_id)?;
        }

        let Some(subject) = &state.selected_subject else {
            return writeln!(f, "\nSelect a subject to view chapters");
        };
        writeln!(f, "\nChapters: {} ({})", subject.subject_name, subject.subject_code)?;
        for chapter in &state.chapters {
            write!(f, "  {} {} / {}", chapter.section_no, chapter.chapter_name, chapter.sub_chapter_name)?;
            if chapter.attachment_count > 0 {
                write!(f, "  [{} files]", chapter.attachment_count)?;
            }
            if let Some(target) = present(&chapter.target_date) {
                write!(f, "  due {target}")?;
            }
            writeln!(f, "  ({})", chapter.sub_chapter_id)?;
        }

        match &state.selected_chapter {
            Some(content) => write_chapter(f, content),
            None => Ok(()),
        }
    }
}
