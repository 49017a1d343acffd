//! Dashboard page, built entirely from stored snapshots.

use super::{require_auth, Mounted};
use crate::models::{AttendanceResponse, InstituteResponse, LoginResponse, ProgressionRecord, SubjectAttendance};
use crate::store::{SessionStore, SnapshotStore, StoreKey};
use chrono::DateTime;
use std::fmt;

pub const FALLBACK_INSTITUTE_NAME: &str = "MIET Portal";
pub const MISSING_STUDENT_DATA: &str = "Unable to load student data. Please try logging in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceBand {
    Good,
    Warning,
    Low,
}

impl AttendanceBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 75.0 {
            AttendanceBand::Good
        } else if percentage >= 60.0 {
            AttendanceBand::Warning
        } else {
            AttendanceBand::Low
        }
    }

    fn label(self) -> &'static str {
        match self {
            AttendanceBand::Good => "good",
            AttendanceBand::Warning => "warning",
            AttendanceBand::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

fn field(label: &'static str, value: impl Into<String>) -> Field {
    Field {
        label,
        value: value.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRow {
    pub name: String,
    pub code: String,
    pub present: u32,
    pub absent: u32,
    pub total: u32,
    pub percentage: f64,
    pub band: AttendanceBand,
}

impl From<&SubjectAttendance> for SubjectRow {
    fn from(s: &SubjectAttendance) -> Self {
        Self {
            name: s.subject_name.clone(),
            code: s.subject_code.clone(),
            present: s.present,
            absent: s.absent,
            total: s.all,
            percentage: s.overall_percentage,
            band: AttendanceBand::from_percentage(s.overall_percentage),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceOverview {
    pub overall_percentage: f64,
    pub overall_present: u32,
    pub overall_total: u32,
    pub month_percentage: f64,
    pub month_present: u32,
    pub month_total: u32,
    pub subjects: Vec<SubjectRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardPage {
    pub institute_name: String,
    pub institute_address: Option<String>,
    pub student_name: String,
    pub initials: String,
    pub email: String,
    pub profile: Vec<Field>,
    pub academic: Vec<Field>,
    pub personal: Vec<Field>,
    pub attendance: Option<AttendanceOverview>,
}

pub fn mount(store: &dyn SessionStore) -> Mounted<DashboardPage> {
    if let Some(route) = require_auth(store) {
        return Mounted::Redirect(route);
    }

    let Some(login) = store.load::<LoginResponse>(StoreKey::LoginData) else {
        return Mounted::Failed(MISSING_STUDENT_DATA.to_string());
    };
    let (Some(student), Some(prog)) = (login.data().first_student(), login.data().first_progression()) else {
        return Mounted::Failed(MISSING_STUDENT_DATA.to_string());
    };

    let institute = store.load::<InstituteResponse>(StoreKey::InstituteData);
    let institute = institute.as_ref().and_then(|snap| snap.data().first());
    let institute_name = institute
        .map(|i| i.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_INSTITUTE_NAME)
        .to_string();
    let institute_address = institute
        .map(|i| i.address.line2.clone())
        .filter(|line| !line.is_empty());

    Mounted::Ready(DashboardPage {
        institute_name,
        institute_address,
        student_name: student.full_name(),
        initials: student.initials(),
        email: prog.contact_email.clone(),
        profile: vec![
            field("Application No.", &prog.application_number),
            field("Admission No.", &prog.admission_number),
            field("Course", &prog.course_name),
            field("Semester", &prog.semester_name),
        ],
        academic: vec![
            field("Department", &prog.department_name),
            field("Department Code", &prog.department_code),
            field("Academic Year", &prog.academic_year_name),
            field("Section", &prog.section_name),
            field("Program", &prog.program_name),
            field("Status", &prog.status),
        ],
        personal: personal_details(prog),
        attendance: attendance_overview(store),
    })
}

fn personal_details(prog: &ProgressionRecord) -> Vec<Field> {
    let gender = if prog.sex == "M" { "Male" } else { "Female" };
    vec![
        field("Date of Birth", format_date(&prog.dob)),
        field("Gender", gender),
        field("Father's Name", &prog.father_name),
        field("Mother's Name", &prog.mother_name),
        field("Mobile", &prog.mobile),
        field(
            "Address",
            format!("{}, {}", prog.contact_address_1, prog.contact_address_2),
        ),
    ]
}

/// `None` when nothing was stored or upstream sent no data.
fn attendance_overview(store: &dyn SessionStore) -> Option<AttendanceOverview> {
    let snapshot = store.load::<AttendanceResponse>(StoreKey::AttendanceData)?;
    if snapshot.raw()["output"]["data"].is_null() {
        return None;
    }
    let data = snapshot.data();
    Some(AttendanceOverview {
        overall_percentage: data.overall_percentage,
        overall_present: data.overall_present,
        overall_total: data.overall_total,
        month_percentage: data.current_month_percentage,
        month_present: data.current_month_present,
        month_total: data.current_month_total,
        subjects: data.subjects.iter().map(SubjectRow::from).collect(),
    })
}

/// ISO timestamps become dd/mm/yyyy; anything else is shown as-is.
fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

impl fmt::Display for DashboardPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.institute_name)?;
        if let Some(address) = &self.institute_address {
            writeln!(f, "{address}")?;
        }
        writeln!(f)?;
        writeln!(f, "[{}] {}", self.initials, self.student_name)?;
        if !self.email.is_empty() {
            writeln!(f, "{}", self.email)?;
        }
        write_fields(f, &self.profile)?;

        writeln!(f, "\nAttendance Overview")?;
        match &self.attendance {
            Some(a) => {
                writeln!(
                    f,
                    "  Overall: {}% ({} / {} classes)",
                    a.overall_percentage, a.overall_present, a.overall_total
                )?;
                writeln!(
                    f,
                    "  Current month: {}% ({} / {} classes)",
                    a.month_percentage, a.month_present, a.month_total
                )?;
                writeln!(f, "  Total subjects: {}", a.subjects.len())?;
                if !a.subjects.is_empty() {
                    writeln!(
                        f,
                        "  {:<28} {:<8} {:>7} {:>7} {:>6} {:>8}",
                        "Subject", "Code", "Present", "Absent", "Total", "%"
                    )?;
                }
                for s in &a.subjects {
                    writeln!(
                        f,
                        "  {:<28} {:<8} {:>7} {:>7} {:>6} {:>7}% ({})",
                        s.name,
                        s.code,
                        s.present,
                        s.absent,
                        s.total,
                        s.percentage,
                        s.band.label()
                    )?;
                }
            }
            None => {
                writeln!(f, "  Attendance data not available")?;
                writeln!(f, "  Try logging in again later.")?;
            }
        }

        writeln!(f, "\nAcademic Information")?;
        write_fields(f, &self.academic)?;
        writeln!(f, "\nPersonal Information")?;
        write_fields(f, &self.personal)
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[Field]) -> fmt::Result {
    for Field { label, value } in fields {
        writeln!(f, "  {label}: {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use camu_devkit::PortalFixtures;
    use serde_json::json;

    fn logged_in() -> MemoryStore {
        let store = MemoryStore::new();
        store.set_authenticated(true).unwrap();
        store.put(StoreKey::LoginData, PortalFixtures::login_success()).unwrap();
        store
    }

    fn value<'a>(fields: &'a [Field], label: &str) -> &'a str {
        fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }

    #[test]
    fn test_unauthenticated_redirects() {
        let store = MemoryStore::new();
        store.put(StoreKey::LoginData, PortalFixtures::login_success()).unwrap();
        assert!(matches!(mount(&store), Mounted::Redirect(crate::views::Route::Login)));
    }

    #[test]
    fn test_full_page_from_snapshots() {
        let store = logged_in();
        store.put(StoreKey::InstituteData, PortalFixtures::institute()).unwrap();
        store.put(StoreKey::AttendanceData, PortalFixtures::attendance()).unwrap();

        let page = mount(&store).ready().unwrap();
        assert_eq!(page.institute_name, "Model Institute of Engineering & Technology");
        assert_eq!(page.institute_address.as_deref(), Some("Jammu, J&K"));
        assert_eq!(page.student_name, "Asha K Verma");
        assert_eq!(page.initials, "AV");
        assert_eq!(value(&page.profile, "Admission No."), "ADM-1234");
        assert_eq!(value(&page.academic, "Program"), "Bachelor of Engineering");
        assert_eq!(value(&page.personal, "Gender"), "Female");
        assert_eq!(value(&page.personal, "Date of Birth"), "17/04/2003");
        assert_eq!(value(&page.personal, "Address"), "12 Canal Road, Jammu");

        let attendance = page.attendance.as_ref().unwrap();
        assert_eq!(attendance.overall_percentage, 81.5);
        let bands: Vec<AttendanceBand> = attendance.subjects.iter().map(|s| s.band).collect();
        assert_eq!(
            bands,
            vec![AttendanceBand::Good, AttendanceBand::Warning, AttendanceBand::Low]
        );

        let text = page.to_string();
        assert!(text.contains("Overall: 81.5% (163 / 200 classes)"));
        assert!(text.contains("Current month: 64% (16 / 25 classes)"));
        assert!(text.contains("Total subjects: 3"));
    }

    #[test]
    fn test_fallbacks_without_institute_or_attendance() {
        let page = mount(&logged_in()).ready().unwrap();
        assert_eq!(page.institute_name, FALLBACK_INSTITUTE_NAME);
        assert!(page.institute_address.is_none());
        assert!(page.attendance.is_none());
        assert!(page.to_string().contains("Attendance data not available"));
    }

    #[test]
    fn test_null_attendance_data_counts_as_missing() {
        let store = logged_in();
        store
            .put(StoreKey::AttendanceData, json!({"output": {"data": null, "errors": null}}))
            .unwrap();
        assert!(mount(&store).ready().unwrap().attendance.is_none());
    }

    #[test]
    fn test_missing_student_records_show_inline_error() {
        let store = MemoryStore::new();
        store.set_authenticated(true).unwrap();
        match mount(&store) {
            Mounted::Failed(msg) => assert_eq!(msg, MISSING_STUDENT_DATA),
            other => panic!("unexpected {other:?}"),
        }

        store
            .put(StoreKey::LoginData, PortalFixtures::login_without_students())
            .unwrap();
        assert!(matches!(mount(&store), Mounted::Failed(_)));
    }

    #[test]
    fn test_attendance_bands() {
        assert_eq!(AttendanceBand::from_percentage(75.0), AttendanceBand::Good);
        assert_eq!(AttendanceBand::from_percentage(74.9), AttendanceBand::Warning);
        assert_eq!(AttendanceBand::from_percentage(60.0), AttendanceBand::Warning);
        assert_eq!(AttendanceBand::from_percentage(59.99), AttendanceBand::Low);
    }

    #[test]
    fn test_gender_mapping() {
        let prog = ProgressionRecord {
            sex: "M".into(),
            ..Default::default()
        };
        assert_eq!(value(&personal_details(&prog), "Gender"), "Male");
        let other = ProgressionRecord {
            sex: "X".into(),
            ..Default::default()
        };
        assert_eq!(value(&personal_details(&other), "Gender"), "Female");
    }
}
