//! Weekly timetable page
//!
//! Served from the stored snapshot when there is one; otherwise fetched
//! with the first progression record of the login snapshot and stored.

use super::{require_auth, Mounted};
use crate::client::DomainClient;
use crate::config::PortalConfig;
use crate::login::timetable_query;
use crate::models::{present, LoginResponse, TimetableDateRange, TimetableEntry, TimetableResponse};
use crate::store::{SessionStore, SnapshotStore, StoreKey};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

pub const NO_TIMETABLE: &str = "No timetable data available";
pub const NO_PROGRESSION: &str = "No progression data found";
pub const NO_ACADEMIC_YEAR: &str = "No academic year found for the current progression";

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// 1 = Monday .. 7 = Sunday
pub fn day_name(day: u8) -> Option<&'static str> {
    DAY_NAMES.get(usize::from(day).checked_sub(1)?).copied()
}

/// Entries keyed by weekday, each day sorted by start time.
///
/// Times compare as text ("09:00" < "10:00"). Days outside 1..=7 are dropped.
pub fn group_by_day(entries: &[TimetableEntry]) -> BTreeMap<u8, Vec<TimetableEntry>> {
    let mut grouped: BTreeMap<u8, Vec<TimetableEntry>> = BTreeMap::new();
    for entry in entries {
        if day_name(entry.day).is_none() {
            debug!(day = entry.day, "timetable entry with unknown weekday dropped");
            continue;
        }
        grouped.entry(entry.day).or_default().push(entry.clone());
    }
    for day in grouped.values_mut() {
        day.sort_by(|a, b| a.from_time.cmp(&b.from_time));
    }
    grouped
}

#[derive(Debug, Clone)]
pub struct TimetablePage {
    pub days: BTreeMap<u8, Vec<TimetableEntry>>,
    pub range: Option<TimetableDateRange>,
}

impl TimetablePage {
    fn from_snapshot(snapshot: &TimetableResponse) -> Self {
        let data = snapshot.data();
        Self {
            days: group_by_day(&data.entries),
            range: data.range.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

pub async fn mount(client: &DomainClient, store: &dyn SessionStore, config: &PortalConfig) -> Mounted<TimetablePage> {
    if let Some(route) = require_auth(store) {
        return Mounted::Redirect(route);
    }

    let cached = store
        .load::<TimetableResponse>(StoreKey::TimetableData)
        .filter(|snap| snap.error_message().is_none());
    if let Some(cached) = cached {
        debug!("timetable served from store");
        return Mounted::Ready(TimetablePage::from_snapshot(&cached));
    }

    let login = store.load::<LoginResponse>(StoreKey::LoginData);
    let Some(prog) = login.as_ref().and_then(|l| l.data().first_progression()) else {
        return Mounted::Failed(NO_PROGRESSION.to_string());
    };
    let Some(query) = timetable_query(prog, &config.academic_year_fields) else {
        return Mounted::Failed(NO_ACADEMIC_YEAR.to_string());
    };

    let session = store.session_token();
    let snapshot = match client.timetable(session.as_ref(), &query).await {
        Ok(snapshot) => snapshot,
        Err(e) => return Mounted::Failed(e.to_string()),
    };
    if let Some(message) = snapshot.error_message() {
        return Mounted::Failed(message);
    }
    if let Err(e) = store.save(StoreKey::TimetableData, &snapshot) {
        warn!("timetable fetched but not stored: {e}");
    }
    Mounted::Ready(TimetablePage::from_snapshot(&snapshot))
}

fn write_entry(f: &mut fmt::Formatter<'_>, entry: &TimetableEntry) -> fmt::Result {
    write!(f, "  {} - {}  ", entry.from_time, entry.to_time)?;
    if entry.is_break() {
        return writeln!(f, "-- {} --", entry.display_title());
    }
    write!(f, "{}", entry.display_title())?;
    if let Some(code) = present(&entry.subject_code) {
        write!(f, " ({code})")?;
    }
    if let Some(staff) = present(&entry.staff_name) {
        write!(f, ", {staff}")?;
    }
    if !entry.slot_duration.is_empty() {
        write!(f, "  [{}]", entry.slot_duration)?;
    }
    writeln!(f)
}

impl fmt::Display for TimetablePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weekly Timetable")?;
        if let Some(range) = &self.range {
            writeln!(f, "Valid {} to {}", range.start_date, range.end_date)?;
        }
        if self.days.is_empty() {
            return writeln!(f, "\n{NO_TIMETABLE}");
        }
        for (day, entries) in &self.days {
            writeln!(f, "\n{}", day_name(*day).unwrap_or("?"))?;
            for entry in entries {
                write_entry(f, entry)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::endpoints;
    use crate::gateway::SessionToken;
    use crate::models::Envelope;
    use crate::store::MemoryStore;
    use crate::testing::ScriptedGateway;
    use crate::views::Route;
    use camu_devkit::PortalFixtures;
    use serde_json::json;
    use std::sync::Arc;

    fn entries(week: serde_json::Value) -> Vec<TimetableEntry> {
        let envelope: Envelope<crate::models::TimetableData> = serde_json::from_value(week).unwrap();
        envelope.into_data().entries
    }

    fn setup() -> (Arc<ScriptedGateway>, DomainClient, MemoryStore) {
        let gateway = Arc::new(ScriptedGateway::new());
        let client = DomainClient::new(gateway.clone());
        let store = MemoryStore::new();
        store.set_authenticated(true).unwrap();
        store.put(StoreKey::LoginData, PortalFixtures::login_success()).unwrap();
        store.save_session_token(&SessionToken::new("sid=9")).unwrap();
        (gateway, client, store)
    }

    #[test]
    fn test_group_by_day_orders_days_and_times() {
        let grouped = group_by_day(&entries(PortalFixtures::sample_week()));
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
        let wednesday: Vec<&str> = grouped[&3].iter().map(|e| e.from_time.as_str()).collect();
        assert_eq!(wednesday, vec!["09:00", "11:00"]);
        assert!(grouped[&1][0].is_break());
    }

    #[test]
    fn test_group_by_day_drops_unknown_weekdays() {
        let week = PortalFixtures::timetable(vec![
            PortalFixtures::timetable_entry(0, "09:00", "10:00", "Ghost"),
            PortalFixtures::timetable_entry(8, "09:00", "10:00", "Ghost"),
            PortalFixtures::timetable_entry(7, "09:00", "10:00", "Seminar"),
        ]);
        let grouped = group_by_day(&entries(week));
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_calls() {
        let (gateway, client, store) = setup();
        store.put(StoreKey::TimetableData, PortalFixtures::sample_week()).unwrap();

        let page = mount(&client, &store, &PortalConfig::default()).await.ready().unwrap();
        assert_eq!(page.days.len(), 3);
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_and_stores() {
        let (gateway, client, store) = setup();
        gateway.reply(endpoints::TIMETABLE, PortalFixtures::sample_week());

        let page = mount(&client, &store, &PortalConfig::default()).await.ready().unwrap();
        assert_eq!(page.range.as_ref().unwrap().start_date, "2024-08-05");
        assert_eq!(store.get(StoreKey::TimetableData), Some(PortalFixtures::sample_week()));

        let sent = gateway.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].session.as_ref().map(SessionToken::as_str), Some("sid=9"));
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["InId"], PortalFixtures::INSTITUTE_ID);
        assert_eq!(body["AcYr"], "AY-2024");

        // second open is served from the store
        mount(&client, &store, &PortalConfig::default()).await.ready().unwrap();
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_redirects_without_network() {
        let (gateway, client, store) = setup();
        store.set_authenticated(false).unwrap();
        let mounted = mount(&client, &store, &PortalConfig::default()).await;
        assert!(matches!(mounted, Mounted::Redirect(Route::Login)));
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn test_errors_are_inline() {
        let (gateway, client, store) = setup();
        gateway.reply_status(endpoints::TIMETABLE, 500);
        match mount(&client, &store, &PortalConfig::default()).await {
            Mounted::Failed(msg) => assert_eq!(msg, "Failed to fetch timetable"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(store.get(StoreKey::TimetableData).is_none());

        store
            .put(StoreKey::LoginData, PortalFixtures::login_without_progression())
            .unwrap();
        match mount(&client, &store, &PortalConfig::default()).await {
            Mounted::Failed(msg) => assert_eq!(msg, NO_PROGRESSION),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_business_error_not_stored() {
        let (gateway, client, store) = setup();
        gateway.reply(endpoints::TIMETABLE, PortalFixtures::rejected("Timetable not published"));
        match mount(&client, &store, &PortalConfig::default()).await {
            Mounted::Failed(msg) => assert_eq!(msg, "Timetable not published"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(store.get(StoreKey::TimetableData).is_none());
    }

    #[tokio::test]
    async fn test_stored_business_error_is_refetched() {
        let (gateway, client, store) = setup();
        store
            .put(StoreKey::TimetableData, PortalFixtures::rejected("Timetable not published"))
            .unwrap();
        gateway.reply(endpoints::TIMETABLE, PortalFixtures::sample_week());

        let page = mount(&client, &store, &PortalConfig::default()).await.ready().unwrap();
        assert_eq!(page.days.len(), 3);
        assert_eq!(gateway.request_count(), 1);
        assert_eq!(store.get(StoreKey::TimetableData), Some(PortalFixtures::sample_week()));
    }

    #[test]
    fn test_render() {
        let store = MemoryStore::new();
        store.put(StoreKey::TimetableData, PortalFixtures::sample_week()).unwrap();
        let snapshot: TimetableResponse = store.load(StoreKey::TimetableData).unwrap();
        let text = TimetablePage::from_snapshot(&snapshot).to_string();

        let monday = text.find("Monday").unwrap();
        let wednesday = text.find("Wednesday").unwrap();
        let friday = text.find("Friday").unwrap();
        assert!(monday < wednesday && wednesday < friday);
        assert!(!text.contains("Tuesday"));
        assert!(text.contains("-- Short Break --"));
        assert!(text.contains("09:00 - 10:00  Operating Systems (CS5XX), Dr. Rao  [60 min]"));
        assert!(text.find("Operating Systems").unwrap() < text.find("Compiler Design").unwrap());

        let empty: TimetableResponse = serde_json::from_value(json!({
            "output": { "data": [[], [], [], null], "errors": null }
        }))
        .unwrap();
        assert!(TimetablePage::from_snapshot(&empty).to_string().contains(NO_TIMETABLE));
    }
}
