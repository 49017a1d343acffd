//! Typed views of the college API payloads
//!
//! Every upstream response is wrapped in `{"output": {"data": .., "errors": ..}}`.
//! Field names on the wire are the upstream's own; the Rust side uses
//! snake_case with explicit renames. All structs tolerate missing fields.
//!
//! Snapshots are kept verbatim: [`Snapshot`] carries the raw JSON next to the
//! parsed view and serializes back to the raw JSON untouched. The parsed view
//! reads `null` object members as absent, so a `null` display field falls
//! back to its default instead of rejecting the payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::ops::Deref;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whole non-negative number from a JSON number or numeric string; anything
/// else reads as 0.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round().min(f64::from(u32::MAX)) as u32)
        .unwrap_or_default())
}

/// Weekday 1..=7; anything else reads as 0 and is dropped by the timetable.
fn lenient_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let day = lenient_count(deserializer)?;
    Ok(u8::try_from(day).ok().filter(|d| (1..=7).contains(d)).unwrap_or(0))
}

/// Copy of `value` without `null` object members, at any depth.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}

/// Treats `None` and `""` the same way.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// ===== Envelope =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Envelope<T> {
    pub output: Output<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Output<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: T,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl<T> Envelope<T> {
    pub fn data(&self) -> &T {
        &self.output.data
    }

    pub fn into_data(self) -> T {
        self.output.data
    }

    /// Business error reported by upstream, if any.
    ///
    /// `null`, `false` and `""` all mean "no error".
    pub fn error_message(&self) -> Option<String> {
        match self.output.errors.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// ===== Snapshot =====

/// Unmodified upstream JSON plus its parsed view.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    raw: Value,
    parsed: T,
}

impl<T: DeserializeOwned> Snapshot<T> {
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let parsed = T::deserialize(&without_nulls(&raw))?;
        Ok(Self { raw, parsed })
    }
}

impl<T> Snapshot<T> {
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.parsed
    }
}

impl<T> Serialize for Snapshot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Snapshot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Snapshot::from_value(raw).map_err(serde::de::Error::custom)
    }
}

pub type LoginResponse = Snapshot<Envelope<LoginData>>;
pub type InstituteResponse = Snapshot<Envelope<Vec<InstituteDetails>>>;
pub type StudentProgResponse = Snapshot<Envelope<Vec<ProgressionRecord>>>;
pub type AttendanceResponse = Snapshot<Envelope<AttendanceData>>;
pub type TimetableResponse = Snapshot<Envelope<TimetableData>>;
pub type TeachingContentResponse = Snapshot<Envelope<Vec<TeachingContent>>>;
pub type ChapterListResponse = Snapshot<Envelope<Vec<ChapterItem>>>;
pub type ChapterContentResponse = Snapshot<Envelope<ChapterContent>>;
/// Subject-level attendance is passed through untyped.
pub type SubjectAttendanceResponse = Snapshot<Envelope<Value>>;

// ===== Login =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginData {
    #[serde(rename = "logindetails")]
    pub login_details: LoginDetails,
    #[serde(rename = "progressionData", deserialize_with = "null_as_default")]
    pub progression_data: Vec<ProgressionRecord>,
}

impl LoginData {
    pub fn first_student(&self) -> Option<&StudentInfo> {
        self.login_details.students.first()
    }

    pub fn first_progression(&self) -> Option<&ProgressionRecord> {
        self.progression_data.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginDetails {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub user_type: String,
    #[serde(rename = "Student", deserialize_with = "null_as_default")]
    pub students: Vec<StudentInfo>,
    #[serde(rename = "instLangs")]
    pub inst_langs: Vec<String>,
    #[serde(rename = "instDefaultLang")]
    pub inst_default_lang: String,
    #[serde(rename = "instTheme")]
    pub inst_theme: String,
    #[serde(rename = "instFntSze")]
    pub inst_font_size: f64,
    #[serde(rename = "instRTL")]
    pub inst_rtl: bool,
    #[serde(rename = "instFntStl")]
    pub inst_font_style: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentInfo {
    #[serde(rename = "ProfileId")]
    pub profile_id: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "StuID")]
    pub stu_id: String,
    #[serde(rename = "FNa")]
    pub first_name: String,
    #[serde(rename = "MNa")]
    pub middle_name: String,
    #[serde(rename = "LNa")]
    pub last_name: String,
    #[serde(rename = "ApplnId")]
    pub application_id: String,
    #[serde(rename = "PhotoImgID")]
    pub photo_img_id: String,
    #[serde(rename = "CurCrID")]
    pub current_course_id: String,
    #[serde(rename = "CurPrID")]
    pub current_program_id: String,
}

impl StudentInfo {
    /// "First Middle Last", skipping empty parts.
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn initials(&self) -> String {
        [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|s| s.chars().next())
            .collect()
    }
}

// ===== Progression =====

/// Enrollment state for one academic term.
///
/// Known fields are typed; anything else upstream sends lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "InId")]
    pub institute_id: String,
    #[serde(rename = "StuID")]
    pub stu_id: String,
    #[serde(rename = "CmProgID")]
    pub cm_prog_id: Option<String>,
    #[serde(rename = "InName")]
    pub institute_name: String,
    #[serde(rename = "CrName")]
    pub course_name: String,
    #[serde(rename = "CrCode")]
    pub course_code: String,
    #[serde(rename = "DepName")]
    pub department_name: String,
    #[serde(rename = "DeptCode")]
    pub department_code: String,
    #[serde(rename = "PrName")]
    pub program_name: String,
    #[serde(rename = "AcYrNm")]
    pub academic_year_name: String,
    #[serde(rename = "AcYr")]
    pub academic_year: Option<String>,
    #[serde(rename = "YrOfAdm")]
    pub year_of_admission: Option<String>,
    #[serde(rename = "SemName")]
    pub semester_name: String,
    #[serde(rename = "SemID")]
    pub semester_id: String,
    #[serde(rename = "SecName")]
    pub section_name: String,
    #[serde(rename = "SecID")]
    pub section_id: String,
    #[serde(rename = "PrID")]
    pub program_id: String,
    #[serde(rename = "CrID")]
    pub course_id: String,
    #[serde(rename = "DeptID")]
    pub department_id: String,
    #[serde(rename = "FNa")]
    pub first_name: String,
    #[serde(rename = "LNa")]
    pub last_name: String,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "DOB")]
    pub dob: String,
    #[serde(rename = "PhotoImgID")]
    pub photo_img_id: String,
    #[serde(rename = "FatNa")]
    pub father_name: String,
    #[serde(rename = "MotNa")]
    pub mother_name: String,
    #[serde(rename = "CnAdMob")]
    pub mobile: String,
    #[serde(rename = "CnEmail")]
    pub contact_email: String,
    #[serde(rename = "CnAdL1")]
    pub contact_address_1: String,
    #[serde(rename = "CnAdL2")]
    pub contact_address_2: String,
    #[serde(rename = "AplnNum")]
    pub application_number: String,
    #[serde(rename = "AdmNum")]
    pub admission_number: String,
    #[serde(rename = "stustatus")]
    pub status: String,
    pub address: Address,
    #[serde(rename = "Menus")]
    pub menus: Menus,
    /// Attributes this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(rename = "AdL1")]
    pub line1: String,
    #[serde(rename = "AdL2")]
    pub line2: String,
    #[serde(rename = "AdL3")]
    pub line3: String,
    pub postcode: String,
    #[serde(rename = "EmAd")]
    pub email: String,
    #[serde(rename = "PhNo")]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Menus {
    #[serde(rename = "Activity")]
    pub activity: bool,
    #[serde(rename = "Assemnt")]
    pub assessment: bool,
    #[serde(rename = "Assgnmnt")]
    pub assignment: bool,
    #[serde(rename = "Attdn")]
    pub attendance: bool,
    #[serde(rename = "Billing")]
    pub billing: bool,
    #[serde(rename = "TimeTable")]
    pub timetable: bool,
    #[serde(rename = "Profile")]
    pub profile: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ===== Institute =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstituteDetails {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    pub address: Address,
    #[serde(rename = "ReceiptImgID")]
    pub receipt_img_id: String,
    pub theme: String,
    #[serde(rename = "fntSze")]
    pub font_size: f64,
    #[serde(rename = "fntStl")]
    pub font_style: String,
    #[serde(rename = "RTL")]
    pub rtl: bool,
}

// ===== Attendance =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceData {
    #[serde(rename = "StuID")]
    pub stu_id: String,
    #[serde(rename = "OvrAllPrcntg")]
    pub overall_percentage: f64,
    #[serde(rename = "CurMnthPrcntg")]
    pub current_month_percentage: f64,
    #[serde(rename = "subjectList", deserialize_with = "null_as_default")]
    pub subjects: Vec<SubjectAttendance>,
    #[serde(rename = "OvrAllPCnt", deserialize_with = "lenient_count")]
    pub overall_present: u32,
    #[serde(rename = "OvrAllCnt", deserialize_with = "lenient_count")]
    pub overall_total: u32,
    #[serde(rename = "CurMPCnt", deserialize_with = "lenient_count")]
    pub current_month_present: u32,
    #[serde(rename = "CurMCnt", deserialize_with = "lenient_count")]
    pub current_month_total: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectAttendance {
    #[serde(rename = "AttType")]
    pub attendance_type: String,
    #[serde(rename = "SubjId")]
    pub subject_id: String,
    #[serde(rename = "SubjNm")]
    pub subject_name: String,
    #[serde(rename = "SubjCd")]
    pub subject_code: String,
    #[serde(rename = "pnt")]
    pub points: f64,
    #[serde(rename = "prsentCnt", deserialize_with = "lenient_count")]
    pub present: u32,
    #[serde(rename = "absentCnt", deserialize_with = "lenient_count")]
    pub absent: u32,
    #[serde(rename = "leaveCnt", deserialize_with = "lenient_count")]
    pub leave: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub all: u32,
    pub p: f64,
    #[serde(rename = "prsPercnt")]
    pub present_percentage: f64,
    #[serde(rename = "absPercnt")]
    pub absent_percentage: f64,
    #[serde(rename = "OvrAllPrcntg")]
    pub overall_percentage: f64,
}

// ===== Timetable =====

/// Upstream sends `[entries, [], [], range]`; only slots 0 and 3 are used.
#[derive(Debug, Clone, Default)]
pub struct TimetableData {
    pub entries: Vec<TimetableEntry>,
    pub range: Option<TimetableDateRange>,
}

impl<'de> Deserialize<'de> for TimetableData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots: Vec<Value> = null_as_default(deserializer)?;
        let entries = match slots.first() {
            Some(Value::Null) | None => Vec::new(),
            Some(v) => Vec::<TimetableEntry>::deserialize(v).map_err(serde::de::Error::custom)?,
        };
        let range = slots
            .get(3)
            .filter(|v| v.is_object())
            .map(TimetableDateRange::deserialize)
            .transpose()
            .map_err(serde::de::Error::custom)?;
        Ok(Self { entries, range })
    }
}

impl Serialize for TimetableData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let range = match &self.range {
            Some(r) => serde_json::to_value(r).map_err(serde::ser::Error::custom)?,
            None => Value::Null,
        };
        (&self.entries, [(); 0], [(); 0], range).serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableEntry {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "PerNm")]
    pub period_name: String,
    #[serde(rename = "FrTime")]
    pub from_time: String,
    #[serde(rename = "ToTime")]
    pub to_time: String,
    #[serde(rename = "SltDur")]
    pub slot_duration: String,
    /// 1 = Monday .. 7 = Sunday
    #[serde(rename = "Day", deserialize_with = "lenient_day")]
    pub day: u8,
    pub title: String,
    #[serde(rename = "SubNa")]
    pub subject_name: Option<String>,
    #[serde(rename = "SubCd")]
    pub subject_code: Option<String>,
    #[serde(rename = "StaffNm")]
    pub staff_name: Option<String>,
    #[serde(rename = "FacID")]
    pub faculty_id: Option<String>,
    #[serde(rename = "SubID")]
    pub subject_id: Option<String>,
    #[serde(rename = "eventDate")]
    pub event_date: String,
    pub desc: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub color: String,
    #[serde(rename = "textColor")]
    pub text_color: String,
}

impl TimetableEntry {
    pub fn is_break(&self) -> bool {
        self.title.contains("Break")
    }

    /// Subject name, falling back to the slot title.
    pub fn display_title(&self) -> &str {
        present(&self.subject_name).unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableDateRange {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "StDt")]
    pub start_date: String,
    #[serde(rename = "EnDt")]
    pub end_date: String,
    #[serde(rename = "FrDate")]
    pub from_date: String,
    #[serde(rename = "ToDate")]
    pub to_date: String,
}

// ===== Teaching content =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeachingContent {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "SubjId")]
    pub subject_id: String,
    #[serde(rename = "TPID")]
    pub tp_id: String,
    #[serde(rename = "CmID")]
    pub cm_id: String,
    #[serde(rename = "SubNa")]
    pub subject_name: String,
    #[serde(rename = "SubjCode")]
    pub subject_code: String,
    #[serde(rename = "DeptID")]
    pub department_id: String,
    #[serde(rename = "PrID")]
    pub program_id: String,
    #[serde(rename = "CrID")]
    pub course_id: String,
    #[serde(rename = "SemID")]
    pub semester_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterItem {
    #[serde(rename = "ChapNm")]
    pub chapter_name: String,
    #[serde(rename = "SubChapNm")]
    pub sub_chapter_name: String,
    #[serde(rename = "NofAttahmnts", deserialize_with = "lenient_count")]
    pub attachment_count: u32,
    #[serde(rename = "ScNo")]
    pub section_no: String,
    #[serde(rename = "SortNo")]
    pub sort_no: f64,
    #[serde(rename = "ChapID")]
    pub chapter_id: String,
    #[serde(rename = "SubChapID")]
    pub sub_chapter_id: String,
    #[serde(rename = "TargDt")]
    pub target_date: Option<String>,
    #[serde(rename = "CompDt")]
    pub completed_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterContent {
    #[serde(rename = "SubjId")]
    pub subject_id: String,
    #[serde(rename = "SubNa")]
    pub subject_name: String,
    #[serde(rename = "ChapName")]
    pub chapter_name: String,
    #[serde(rename = "SubChapter")]
    pub sub_chapter: SubChapterDetails,
    #[serde(rename = "isFE")]
    pub is_fe: bool,
    #[serde(rename = "PrID")]
    pub program_id: String,
    #[serde(rename = "CrID")]
    pub course_id: String,
    #[serde(rename = "DeptID")]
    pub department_id: String,
    #[serde(rename = "SemID")]
    pub semester_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubChapterDetails {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ScNo")]
    pub section_no: String,
    #[serde(rename = "Dur")]
    pub duration: f64,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "Obj")]
    pub objectives: String,
    #[serde(rename = "TeAct")]
    pub teaching_activity: String,
    #[serde(rename = "LeAct")]
    pub learning_activity: String,
    #[serde(rename = "AsMet")]
    pub assessment_method: String,
    #[serde(rename = "TeAid")]
    pub teaching_aid: String,
    #[serde(rename = "ConSum")]
    pub content_summary: String,
    #[serde(rename = "ConAbs")]
    pub content_abstract: String,
    #[serde(rename = "webRef")]
    pub web_reference: String,
    #[serde(rename = "txtBk")]
    pub textbook: String,
    #[serde(rename = "StFl")]
    pub study_file: String,
    #[serde(rename = "Attachments", deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "posQus")]
    pub possible_questions: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    #[serde(rename = "AttachNm")]
    pub name: String,
    #[serde(rename = "AttachID")]
    pub attach_id: String,
    pub url: String,
    pub t: String,
    #[serde(rename = "_id")]
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn login_json() -> Value {
        json!({
            "output": {
                "data": {
                    "logindetails": {
                        "Name": "Asha Verma",
                        "Student": [{ "StuID": "S1", "FNa": "Asha", "MNa": "", "LNa": "Verma" }]
                    },
                    "progressionData": [{
                        "_id": "P1",
                        "InId": "I1",
                        "CmProgID": "C1",
                        "Menus": { "Attdn": true, "Library": true },
                        "HostelReq": true
                    }]
                },
                "errors": null
            }
        })
    }

    #[test]
    fn test_login_snapshot_parses_and_keeps_raw() {
        let raw = login_json();
        let snap = LoginResponse::from_value(raw.clone()).unwrap();
        assert!(snap.error_message().is_none());

        let student = snap.data().first_student().unwrap();
        assert_eq!(student.stu_id, "S1");
        assert_eq!(student.full_name(), "Asha Verma");
        assert_eq!(student.initials(), "AV");

        let prog = snap.data().first_progression().unwrap();
        assert_eq!(prog.institute_id, "I1");
        assert_eq!(prog.cm_prog_id.as_deref(), Some("C1"));
        assert!(prog.menus.attendance);
        assert_eq!(prog.menus.extra.get("Library"), Some(&json!(true)));
        assert_eq!(prog.extra.get("HostelReq"), Some(&json!(true)));

        assert_eq!(serde_json::to_value(&snap).unwrap(), raw);
    }

    #[test]
    fn test_error_message_variants() {
        let rejected: Envelope<LoginData> =
            serde_json::from_value(json!({"output": {"data": null, "errors": "Invalid password"}})).unwrap();
        assert_eq!(rejected.error_message().as_deref(), Some("Invalid password"));
        assert!(rejected.data().login_details.students.is_empty());

        let structured: Envelope<Value> =
            serde_json::from_value(json!({"output": {"data": {}, "errors": {"code": 7}}})).unwrap();
        assert_eq!(structured.error_message().as_deref(), Some(r#"{"code":7}"#));

        let empty: Envelope<Value> =
            serde_json::from_value(json!({"output": {"data": {}, "errors": ""}})).unwrap();
        assert!(empty.error_message().is_none());

        let missing: Envelope<Value> = serde_json::from_value(json!({"output": {"data": 1}})).unwrap();
        assert!(missing.error_message().is_none());
    }

    #[test]
    fn test_timetable_tuple() {
        let raw = json!({
            "output": {
                "data": [
                    [{ "Day": 2, "FrTime": "09:00", "ToTime": "10:00", "title": "Lunch Break", "SubNa": null }],
                    [],
                    [],
                    { "StDt": "2024-08-05", "EnDt": "2024-12-03" }
                ],
                "errors": null
            }
        });
        let snap = TimetableResponse::from_value(raw).unwrap();
        let data = snap.data();
        assert_eq!(data.entries.len(), 1);
        assert!(data.entries[0].is_break());
        assert_eq!(data.entries[0].display_title(), "Lunch Break");
        assert_eq!(data.range.as_ref().unwrap().end_date, "2024-12-03");

        let empty: Envelope<TimetableData> =
            serde_json::from_value(json!({"output": {"data": null, "errors": null}})).unwrap();
        assert!(empty.data().entries.is_empty());
        assert!(empty.data().range.is_none());
    }

    #[test]
    fn test_snapshot_rejects_wrong_shape() {
        let bad = json!({"output": {"data": "not a list", "errors": null}});
        assert!(TeachingContentResponse::from_value(bad).is_err());
    }

    #[test]
    fn test_null_display_fields_fall_back_to_defaults() {
        let raw = json!({
            "output": {
                "data": {
                    "logindetails": {
                        "Name": null,
                        "instFntSze": null,
                        "Student": [{ "StuID": "S1", "FNa": "Asha", "MNa": null, "LNa": "Verma", "PhotoImgID": null }]
                    },
                    "progressionData": [{
                        "_id": "P1",
                        "InId": "I1",
                        "SecName": null,
                        "address": { "AdL1": null, "postcode": null },
                        "Menus": null
                    }]
                },
                "errors": null
            }
        });
        let snap = LoginResponse::from_value(raw.clone()).unwrap();
        let student = snap.data().first_student().unwrap();
        assert_eq!(student.middle_name, "");
        assert_eq!(student.full_name(), "Asha Verma");
        let prog = snap.data().first_progression().unwrap();
        assert_eq!(prog.section_name, "");
        assert_eq!(prog.address.line1, "");
        assert!(prog.extra.is_empty());

        // stored form keeps the nulls
        assert_eq!(serde_json::to_value(&snap).unwrap(), raw);
    }

    #[test]
    fn test_odd_numbers_do_not_reject_the_payload() {
        let attendance = json!({
            "output": {
                "data": {
                    "OvrAllPCnt": 162.6,
                    "OvrAllCnt": "200",
                    "CurMPCnt": -3,
                    "CurMCnt": null,
                    "subjectList": [{ "SubjNm": "OS", "prsentCnt": 4.0, "absentCnt": "n/a", "all": 4 }]
                },
                "errors": null
            }
        });
        let snap = AttendanceResponse::from_value(attendance).unwrap();
        let data = snap.data();
        assert_eq!(data.overall_present, 163);
        assert_eq!(data.overall_total, 200);
        assert_eq!(data.current_month_present, 0);
        assert_eq!(data.current_month_total, 0);
        assert_eq!(data.subjects[0].present, 4);
        assert_eq!(data.subjects[0].absent, 0);

        let week = json!({
            "output": {
                "data": [
                    [
                        { "Day": 3, "FrTime": "09:00" },
                        { "Day": 300, "FrTime": "10:00" },
                        { "Day": "5", "FrTime": "11:00" }
                    ],
                    [], [], null
                ],
                "errors": null
            }
        });
        let snap = TimetableResponse::from_value(week).unwrap();
        let days: Vec<u8> = snap.data().entries.iter().map(|e| e.day).collect();
        assert_eq!(days, vec![3, 0, 5]);
    }

    #[test]
    fn test_present_treats_empty_as_absent() {
        assert_eq!(present(&Some("x".into())), Some("x"));
        assert_eq!(present(&Some("  ".into())), None);
        assert_eq!(present(&None), None);
    }
}
