/*!
Canned upstream payloads

Builders for responses shaped like the ones the college API returns, wrapped
in the `{"output": {"data": ..., "errors": ...}}` envelope.
*/

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

/// Builders for upstream response bodies used across the test suites.
pub struct PortalFixtures;

impl PortalFixtures {
    pub const STUDENT_ID: &'static str = "STU-1001";
    pub const INSTITUTE_ID: &'static str = "INST-7";
    pub const CM_PROG_ID: &'static str = "CMP-55";
    pub const SESSION_COOKIE: &'static str = "connect.sid=s%3Aabc123; Path=/; HttpOnly";
    pub const TRACKING_COOKIE: &'static str = "_ga=GA1.2.99; Path=/";

    /// Wraps `data` in a successful envelope.
    pub fn envelope(data: Value) -> Value {
        json!({ "output": { "data": data, "errors": null } })
    }

    /// Envelope carrying an upstream business error.
    pub fn rejected(message: &str) -> Value {
        json!({ "output": { "data": null, "errors": message } })
    }

    pub fn student() -> Value {
        json!({
            "ProfileId": "PRF-1",
            "_id": "S-OBJ-1",
            "StuID": Self::STUDENT_ID,
            "FNa": "Asha",
            "MNa": "K",
            "LNa": "Verma",
            "ApplnId": "APP-9",
            "PhotoImgID": "IMG-1",
            "CurCrID": "CR-3",
            "CurPrID": "PR-2"
        })
    }

    /// Progression record with every field the portal reads.
    pub fn progression() -> Value {
        json!({
            "_id": "PROG-REC-1",
            "InId": Self::INSTITUTE_ID,
            "StuID": Self::STUDENT_ID,
            "CmProgID": Self::CM_PROG_ID,
            "InName": "Model Institute of Engineering",
            "CrName": "B.E. Computer Engineering",
            "CrCode": "BECE",
            "DepName": "Computer Engineering",
            "DeptCode": "CSE",
            "AcYrNm": "2024-25",
            "AcYr": "AY-2024",
            "YrOfAdm": "ADM-2022",
            "SemName": "Semester 5",
            "SemID": "SEM-5",
            "SecName": "A",
            "SecID": "SEC-A",
            "PrID": "PR-2",
            "CrID": "CR-3",
            "DeptID": "DEPT-4",
            "FNa": "Asha",
            "LNa": "Verma",
            "Sex": "F",
            "DOB": "2003-04-17T00:00:00.000Z",
            "PhotoImgID": "IMG-1",
            "FatNa": "R. Verma",
            "MotNa": "S. Verma",
            "CnAdMob": "9000000001",
            "CnEmail": "asha@example.edu",
            "CnAdL1": "12 Canal Road",
            "CnAdL2": "Jammu",
            "AplnNum": "APL-77",
            "AdmNum": "ADM-1234",
            "PrName": "Bachelor of Engineering",
            "stustatus": "Active",
            "address": {
                "AdL1": "Kot Bhalwal",
                "AdL2": "Jammu, J&K",
                "AdL3": "",
                "postcode": "181122",
                "EmAd": "info@example.edu",
                "PhNo": "0191-000000"
            },
            "Menus": {
                "Activity": true,
                "Assemnt": true,
                "Assgnmnt": false,
                "Attdn": true,
                "Billing": false,
                "TimeTable": true,
                "Profile": true,
                "Library": false
            },
            "HostelReq": false
        })
    }

    fn login_data(students: Vec<Value>, progressions: Vec<Value>) -> Value {
        json!({
            "logindetails": {
                "_id": "U-1",
                "Email": "asha@example.edu",
                "Name": "Asha Verma",
                "Type": "Student",
                "Student": students,
                "instLangs": ["en"],
                "instDefaultLang": "en",
                "instTheme": "blue",
                "instFntSze": 14,
                "instRTL": false,
                "instFntStl": "Inter"
            },
            "progressionData": progressions
        })
    }

    /// Successful login with one student and one progression record.
    pub fn login_success() -> Value {
        Self::envelope(Self::login_data(vec![Self::student()], vec![Self::progression()]))
    }

    /// Successful HTTP login whose payload has no student records.
    pub fn login_without_students() -> Value {
        Self::envelope(Self::login_data(vec![], vec![Self::progression()]))
    }

    /// Successful HTTP login whose payload has no progression records.
    pub fn login_without_progression() -> Value {
        Self::envelope(Self::login_data(vec![Self::student()], vec![]))
    }

    /// Login success whose progression record lacks `CmProgID`.
    pub fn login_without_cm_prog() -> Value {
        let mut progression = Self::progression();
        if let Some(obj) = progression.as_object_mut() {
            obj.remove("CmProgID");
        }
        Self::envelope(Self::login_data(vec![Self::student()], vec![progression]))
    }

    pub fn institute() -> Value {
        Self::envelope(json!([{
            "_id": Self::INSTITUTE_ID,
            "Name": "Model Institute of Engineering & Technology",
            "address": {
                "AdL1": "Kot Bhalwal",
                "AdL2": "Jammu, J&K",
                "AdL3": "",
                "postcode": "181122",
                "EmAd": "info@example.edu",
                "PhNo": "0191-000000"
            },
            "ReceiptImgID": "RCPT-1",
            "theme": "blue",
            "fntSze": 14,
            "fntStl": "Inter",
            "RTL": false
        }]))
    }

    pub fn progression_list() -> Value {
        Self::envelope(json!([Self::progression()]))
    }

    pub fn attendance() -> Value {
        Self::envelope(json!({
            "StuID": Self::STUDENT_ID,
            "OvrAllPrcntg": 81.5,
            "CurMnthPrcntg": 64.0,
            "OvrAllPCnt": 163,
            "OvrAllCnt": 200,
            "CurMPCnt": 16,
            "CurMCnt": 25,
            "subjectList": [
                Self::subject_attendance("SUB-1", "Operating Systems", "CS501", 38, 2, 92.0),
                Self::subject_attendance("SUB-2", "Compiler Design", "CS502", 26, 14, 65.0),
                Self::subject_attendance("SUB-3", "Computer Networks", "CS503", 20, 20, 50.0)
            ]
        }))
    }

    pub fn subject_attendance(
        id: &str,
        name: &str,
        code: &str,
        present: u32,
        absent: u32,
        percentage: f64,
    ) -> Value {
        json!({
            "AttType": "Theory",
            "SubjId": id,
            "SubjNm": name,
            "SubjCd": code,
            "pnt": present,
            "prsentCnt": present,
            "absentCnt": absent,
            "leaveCnt": 0,
            "all": present + absent,
            "p": present,
            "prsPercnt": percentage,
            "absPercnt": 100.0 - percentage,
            "OvrAllPrcntg": percentage
        })
    }

    /// One timetable slot; `day` is 1 (Monday) through 7 (Sunday).
    pub fn timetable_entry(day: u8, from: &str, to: &str, title: &str) -> Value {
        json!({
            "_id": format!("TT-{day}-{from}"),
            "PerNm": "P",
            "FrTime": from,
            "ToTime": to,
            "SltDur": "60 min",
            "Day": day,
            "title": title,
            "SubNa": if title.contains("Break") { Value::Null } else { json!(title) },
            "SubCd": if title.contains("Break") { Value::Null } else { json!("CS5XX") },
            "StaffNm": if title.contains("Break") { Value::Null } else { json!("Dr. Rao") },
            "eventDate": "2024-08-05",
            "type": "class",
            "color": "#1e40af",
            "textColor": "#ffffff"
        })
    }

    /// Timetable envelope in the upstream tuple shape `[entries, [], [], range]`.
    pub fn timetable(entries: Vec<Value>) -> Value {
        let start = NaiveDate::from_ymd_opt(2024, 8, 5).unwrap_or_default();
        let end = start + Duration::days(120);
        Self::envelope(json!([
            entries,
            [],
            [],
            {
                "_id": "RANGE-1",
                "StDt": start.format("%Y-%m-%d").to_string(),
                "EnDt": end.format("%Y-%m-%d").to_string(),
                "FrDate": start.format("%d/%m/%Y").to_string(),
                "ToDate": end.format("%d/%m/%Y").to_string()
            }
        ]))
    }

    /// Week with entries on Wednesday (two, out of order), Monday and Friday.
    pub fn sample_week() -> Value {
        Self::timetable(vec![
            Self::timetable_entry(3, "11:00", "12:00", "Compiler Design"),
            Self::timetable_entry(3, "09:00", "10:00", "Operating Systems"),
            Self::timetable_entry(1, "10:00", "10:15", "Short Break"),
            Self::timetable_entry(5, "14:00", "15:00", "Computer Networks"),
        ])
    }

    pub fn teaching_content() -> Value {
        Self::envelope(json!([
            {
                "_id": "TC-1",
                "SubjId": "SUB-1",
                "TPID": "TP-1",
                "CmID": "CM-OS",
                "SubNa": "Operating Systems",
                "SubjCode": "CS501",
                "DeptID": "DEPT-4",
                "PrID": "PR-2",
                "CrID": "CR-3",
                "SemID": "SEM-5"
            },
            {
                "_id": "TC-2",
                "SubjId": "SUB-2",
                "TPID": "TP-2",
                "CmID": "CM-CD",
                "SubNa": "Compiler Design",
                "SubjCode": "CS502",
                "DeptID": "DEPT-4",
                "PrID": "PR-2",
                "CrID": "CR-3",
                "SemID": "SEM-5"
            }
        ]))
    }

    pub fn chapter_list() -> Value {
        Self::envelope(json!([
            {
                "ChapNm": "Processes",
                "SubChapNm": "Process scheduling",
                "NofAttahmnts": 2,
                "ScNo": "1.1",
                "SortNo": 1,
                "ChapID": "CH-1",
                "SubChapID": "SCH-11",
                "TargDt": null,
                "CompDt": null
            },
            {
                "ChapNm": "Memory",
                "SubChapNm": "Paging",
                "NofAttahmnts": 0,
                "ScNo": "2.1",
                "SortNo": 2,
                "ChapID": "CH-2",
                "SubChapID": "SCH-21",
                "TargDt": "2024-09-01",
                "CompDt": null
            }
        ]))
    }

    pub fn chapter_content() -> Value {
        Self::envelope(json!({
            "SubjId": "SUB-1",
            "SubNa": "Operating Systems",
            "ChapName": "Processes",
            "isFE": false,
            "PrID": "PR-2",
            "CrID": "CR-3",
            "DeptID": "DEPT-4",
            "SemID": "SEM-5",
            "SubChapter": {
                "Name": "Process scheduling",
                "ScNo": "1.1",
                "Dur": 3,
                "_id": "SCH-11",
                "Obj": "Compare FCFS, SJF and round-robin scheduling.",
                "TeAct": "Lecture",
                "LeAct": "Exercises",
                "AsMet": "Quiz",
                "TeAid": "Slides",
                "ConSum": "Schedulers and dispatch latency.",
                "ConAbs": "",
                "webRef": "https://example.edu/os/scheduling",
                "txtBk": "Silberschatz, Operating System Concepts",
                "StFl": "",
                "Attachments": [
                    {
                        "AttachNm": "scheduling.pdf",
                        "AttachID": "AT-1",
                        "url": "https://files.example.edu/AT-1",
                        "t": "pdf",
                        "_id": "ATT-1"
                    }
                ],
                "posQus": []
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_fixtures_shapes() {
        let ok = PortalFixtures::login_success();
        assert!(ok["output"]["errors"].is_null());
        assert_eq!(
            ok["output"]["data"]["logindetails"]["Student"][0]["StuID"],
            PortalFixtures::STUDENT_ID
        );

        let no_students = PortalFixtures::login_without_students();
        assert_eq!(
            no_students["output"]["data"]["logindetails"]["Student"].as_array().map(Vec::len),
            Some(0)
        );

        let no_cm = PortalFixtures::login_without_cm_prog();
        assert!(no_cm["output"]["data"]["progressionData"][0].get("CmProgID").is_none());

        let rejected = PortalFixtures::rejected("Invalid credentials");
        assert_eq!(rejected["output"]["errors"], "Invalid credentials");
    }

    #[test]
    fn test_timetable_tuple_shape() {
        let tt = PortalFixtures::sample_week();
        let data = tt["output"]["data"].as_array().unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data[0].as_array().unwrap().len(), 4);
        assert_eq!(data[3]["StDt"], "2024-08-05");
        assert_eq!(data[3]["EnDt"], "2024-12-03");
    }
}
