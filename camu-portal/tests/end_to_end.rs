//! Portal -> gateway -> stubbed upstream, over real HTTP.

use camu_devkit::{init_test_logging, serve, PortalFixtures, StubReply, UpstreamStub};
use camu_gateway::{build_router, AppState, GatewayConfig, UpstreamRelay};
use camu_portal::views::{courses, dashboard, timetable, Selection};
use camu_portal::{
    logout, DomainClient, FileStore, HttpGateway, LoginError, LoginFlow, Mounted, PortalConfig, Route,
    SessionStore, SnapshotStore, StoreKey,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinHandle;

struct Stack {
    stub: UpstreamStub,
    gateway_handle: JoinHandle<()>,
    client: DomainClient,
    config: PortalConfig,
    store: FileStore,
    _dir: TempDir,
}

impl Stack {
    async fn start() -> Self {
        init_test_logging();
        let stub = UpstreamStub::start().await.unwrap();
        let cfg = GatewayConfig::with_upstream(&stub.base_url());
        let (addr, gateway_handle) = serve(build_router(AppState::new(UpstreamRelay::new(cfg.upstream))))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let config = PortalConfig {
            gateway_url: format!("http://{addr}"),
            store_path: dir.path().join("session.json"),
            ..PortalConfig::default()
        };
        let store = FileStore::open(&config.store_path).unwrap();
        let client = DomainClient::new(Arc::new(HttpGateway::new(config.gateway_url.clone())));

        Self {
            stub,
            gateway_handle,
            client,
            config,
            store,
            _dir: dir,
        }
    }

    fn script_upstream(&self) {
        self.stub.reply(
            "/login/validate",
            StubReply::json(PortalFixtures::login_success())
                .with_cookie(PortalFixtures::SESSION_COOKIE)
                .with_cookie(PortalFixtures::TRACKING_COOKIE),
        );
        self.stub
            .reply("/api/institute/getInstDtls", StubReply::json(PortalFixtures::institute()));
        self.stub.reply(
            "/api/studentprog/getStudProg",
            StubReply::json(PortalFixtures::progression_list()),
        );
        self.stub.reply(
            "/api/Attendance/getDtaForStupage",
            StubReply::json(PortalFixtures::attendance()),
        );
        self.stub
            .reply("/api/Timetable/get", StubReply::json(PortalFixtures::sample_week()));
        self.stub.reply(
            "/api/TeachContent/getTeachContent",
            StubReply::json(PortalFixtures::teaching_content()),
        );
        self.stub.reply_prefix(
            "/api/TeachContent/getChapterNamesById/",
            StubReply::json(PortalFixtures::chapter_list()),
        );
        self.stub.reply_prefix(
            "/api/TeachContent/getChapterContentByIds/",
            StubReply::json(PortalFixtures::chapter_content()),
        );
    }

    fn store(&self) -> &dyn SessionStore {
        &self.store
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        self.gateway_handle.abort();
    }
}

fn joined_cookies() -> String {
    format!("{}; {}", PortalFixtures::SESSION_COOKIE, PortalFixtures::TRACKING_COOKIE)
}

#[tokio::test]
async fn test_login_then_browse_every_page() {
    let s = Stack::start().await;
    s.script_upstream();

    let outcome = LoginFlow::new(&s.client, s.store(), &s.config)
        .run("asha@example.edu", "secret")
        .await
        .unwrap();
    assert_eq!(outcome.route, Route::Dashboard);
    assert_eq!(s.stub.request_count(), 5);

    let login = &s.stub.requests_to("/login/validate")[0];
    assert_eq!(login.header("appversion"), Some("v1"));
    assert_eq!(login.header("clienttzofst"), Some("330"));
    assert!(login.header("cookie").is_none());

    // the joined cookie comes back on every later call
    let institute = &s.stub.requests_to("/api/institute/getInstDtls")[0];
    assert_eq!(institute.header("cookie"), Some(joined_cookies().as_str()));
    assert_eq!(
        s.store().session_token().map(|t| t.as_str().to_string()),
        Some(joined_cookies())
    );

    let page = dashboard::mount(s.store()).ready().unwrap();
    assert_eq!(page.institute_name, "Model Institute of Engineering & Technology");
    assert_eq!(page.attendance.as_ref().unwrap().subjects.len(), 3);

    let tt = timetable::mount(&s.client, s.store(), &s.config).await.ready().unwrap();
    assert_eq!(tt.days.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
    assert_eq!(s.stub.request_count(), 5, "timetable is served from the store");

    let view = courses::mount(&s.client, s.store(), &s.config).await.ready().unwrap();
    assert_eq!(view.select_subject("CS501").await, Selection::Loaded);
    assert_eq!(view.select_chapter("SCH-11").await, Selection::Loaded);
    assert_eq!(
        view.selected_chapter().unwrap().sub_chapter.name,
        "Process scheduling"
    );

    let chapter_calls = s.stub.requests_to("/api/TeachContent/getChapterNamesById/");
    assert_eq!(chapter_calls[0].method, "GET");
    assert_eq!(
        chapter_calls[0].path,
        "/api/TeachContent/getChapterNamesById/CM-OS/SEC-A/STU-1001/SEM-5/AY-2024/INST-7/PR-2/CR-3/DEPT-4"
    );
    assert_eq!(chapter_calls[0].header("cookie"), Some(joined_cookies().as_str()));
}

#[tokio::test]
async fn test_session_survives_reopen_and_logout_forces_refetch() {
    let s = Stack::start().await;
    s.script_upstream();
    LoginFlow::new(&s.client, s.store(), &s.config)
        .run("asha@example.edu", "secret")
        .await
        .unwrap();

    let reopened = FileStore::open(&s.config.store_path).unwrap();
    assert!(reopened.is_authenticated());
    assert_eq!(
        reopened.get(StoreKey::TimetableData),
        Some(PortalFixtures::sample_week())
    );

    assert_eq!(logout(s.store()).unwrap(), Route::Login);
    assert!(matches!(dashboard::mount(s.store()), Mounted::Redirect(Route::Login)));
    assert!(timetable::mount(&s.client, s.store(), &s.config).await.is_redirect());

    s.stub.clear_requests();
    LoginFlow::new(&s.client, s.store(), &s.config)
        .run("asha@example.edu", "secret")
        .await
        .unwrap();
    assert_eq!(s.stub.requests_to("/api/Timetable/get").len(), 1);
    assert!(timetable::mount(&s.client, s.store(), &s.config).await.ready().is_some());

    const TEACH: &str = "/api/TeachContent/getTeachContent";
    assert!(courses::mount(&s.client, s.store(), &s.config).await.ready().is_some());
    assert!(courses::mount(&s.client, s.store(), &s.config).await.ready().is_some());
    assert_eq!(s.stub.requests_to(TEACH).len(), 1);

    logout(s.store()).unwrap();
    LoginFlow::new(&s.client, s.store(), &s.config)
        .run("asha@example.edu", "secret")
        .await
        .unwrap();
    assert!(courses::mount(&s.client, s.store(), &s.config).await.ready().is_some());
    assert_eq!(s.stub.requests_to(TEACH).len(), 2);
}

#[tokio::test]
async fn test_rejected_and_unreachable_logins() {
    let s = Stack::start().await;
    s.stub.reply(
        "/login/validate",
        StubReply::json(PortalFixtures::rejected("Invalid credentials")),
    );

    let err = LoginFlow::new(&s.client, s.store(), &s.config)
        .run("asha@example.edu", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::Rejected(_)));
    assert!(!s.store().is_authenticated());

    s.stub
        .reply("/login/validate", StubReply::status(503, serde_json::json!({})));
    let err = LoginFlow::new(&s.client, s.store(), &s.config)
        .run("asha@example.edu", "secret")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
    assert!(s.store().get(StoreKey::LoginData).is_none());
}
