use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use noticeboard::application::composer::ComposerService;
use noticeboard::application::editor::EditorService;
use noticeboard::application::feed::FeedService;
use noticeboard::application::guard::RoleGuard;
use noticeboard::application::images::{
    ImageHost, ImageHostError, ImageUploader, PartialUploadPolicy,
};
use noticeboard::application::pagination::{AnnouncementCursor, CursorPage, PageRequest};
use noticeboard::application::repos::{
    AdminConfigRepo, AnnouncementsRepo, AnnouncementsWriteRepo, CreateAnnouncementParams,
    RepoError, UpdateAnnouncementParams,
};
use noticeboard::config::AuthSettings;
use noticeboard::domain::announcements::AnnouncementRecord;
use noticeboard::domain::staging::StagedImage;
use noticeboard::infra::http::{BoardState, build_router};

const CAPTAIN: &str = "captain@ship.test";
const DECKHAND: &str = "deckhand@ship.test";
const BOUNDARY: &str = "board-test-boundary";
const STERN: &str = "https://i.ibb.co/test/stern.png";
const BOW: &str = "https://i.ibb.co/test/bow.png";

#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<AnnouncementRecord>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    fn with_texts(texts: &[&str]) -> Self {
        let now = OffsetDateTime::now_utc();
        let records = texts
            .iter()
            .enumerate()
            .map(|(n, text)| AnnouncementRecord {
                id: Uuid::new_v4(),
                text: (*text).to_string(),
                images: None,
                date: now - Duration::minutes(n as i64),
            })
            .collect();
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn texts(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    fn first_id(&self) -> Uuid {
        self.records.lock().unwrap()[0].id
    }

    fn with_images(text: &str, images: &[&str]) -> Self {
        let store = Self::with_texts(&[text]);
        store.records.lock().unwrap()[0].images =
            Some(images.iter().map(|url| (*url).to_string()).collect());
        store
    }

    fn images_of(&self, id: Uuid) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.images.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnnouncementsRepo for MemoryStore {
    async fn list_announcements(
        &self,
        page: PageRequest<AnnouncementCursor>,
    ) -> Result<CursorPage<AnnouncementRecord>, RepoError> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
        let mut items: Vec<_> = records
            .into_iter()
            .filter(|r| match page.cursor {
                Some(c) => (r.date, r.id) < (c.date(), c.id()),
                None => true,
            })
            .take(page.limit as usize + 1)
            .collect();
        let next_cursor = if items.len() > page.limit as usize {
            items.pop();
            items
                .last()
                .map(|last| AnnouncementCursor::new(last.date, last.id).encode())
        } else {
            None
        };
        Ok(CursorPage::new(items, next_cursor))
    }

    async fn find_announcement(&self, id: Uuid) -> Result<Option<AnnouncementRecord>, RepoError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }
}

#[async_trait]
impl AnnouncementsWriteRepo for MemoryStore {
    async fn create_announcement(
        &self,
        params: CreateAnnouncementParams,
    ) -> Result<AnnouncementRecord, RepoError> {
        *self.writes.lock().unwrap() += 1;
        let record = AnnouncementRecord {
            id: Uuid::new_v4(),
            text: params.text,
            images: params.images,
            date: OffsetDateTime::now_utc(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_announcement(
        &self,
        params: UpdateAnnouncementParams,
    ) -> Result<AnnouncementRecord, RepoError> {
        *self.writes.lock().unwrap() += 1;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == params.id)
            .ok_or(RepoError::NotFound)?;
        record.text = params.text;
        record.images = params.images;
        Ok(record.clone())
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<(), RepoError> {
        *self.writes.lock().unwrap() += 1;
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

struct FixedAdmin(Option<&'static str>);

#[async_trait]
impl AdminConfigRepo for FixedAdmin {
    async fn load_admin_email(&self) -> Result<Option<String>, RepoError> {
        Ok(self.0.map(str::to_string))
    }
}

struct EchoHost;

#[async_trait]
impl ImageHost for EchoHost {
    async fn upload(&self, image: &StagedImage) -> Result<String, ImageHostError> {
        Ok(format!("https://i.ibb.co/test/{}", image.filename))
    }
}

fn router_with(store: Arc<MemoryStore>, admin: Option<&'static str>) -> Router {
    let uploader = ImageUploader::new(Arc::new(EchoHost), PartialUploadPolicy::Proceed);
    let state = BoardState {
        title: Arc::from("Ship's Log"),
        feed: Arc::new(FeedService::new(store.clone(), 5, chrono_tz::UTC)),
        composer: Arc::new(ComposerService::new(store.clone(), uploader.clone())),
        editor: Arc::new(EditorService::new(store.clone(), store, uploader)),
        guard: RoleGuard::new(Arc::new(FixedAdmin(admin))),
        auth: Arc::new(AuthSettings {
            identity_header: header::HeaderName::from_static("x-forwarded-email"),
            entry_url: "/oauth2/start".to_string(),
        }),
        upload_limit_bytes: 1024 * 1024,
        db: None,
    };
    build_router(state)
}

fn get(uri: &str, identity: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(email) = identity {
        builder = builder.header("x-forwarded-email", email);
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart body in the shape the board forms submit.
#[derive(Default)]
struct FormBody {
    parts: String,
}

impl FormBody {
    fn field(mut self, name: &str, value: &str) -> Self {
        self.parts.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
        self
    }

    fn file(mut self, filename: &str, content_type: &str, data: &str) -> Self {
        self.parts.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n{data}\r\n"
        ));
        self
    }

    /// What an untouched file input submits.
    fn no_file(self) -> Self {
        self.file("", "application/octet-stream", "")
    }

    fn post(mut self, uri: &str, identity: &str) -> Request<Body> {
        self.parts.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("x-forwarded-email", identity)
            .header("datastar-request", "true")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.parts))
            .unwrap()
    }
}

fn multipart_post(uri: &str, identity: &str, text: &str) -> Request<Body> {
    FormBody::default().field("text", text).no_file().post(uri, identity)
}

fn position(body: &str, needle: &str) -> usize {
    body.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` missing from response"))
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_entry_page() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));

    let response = app.oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/oauth2/start"
    );
}

#[tokio::test]
async fn anonymous_datastar_request_navigates_by_script() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));
    let request = Request::builder()
        .uri("/ui/announcements")
        .header("datastar-request", "true")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("window.location.assign"));
    assert!(body.contains("/oauth2/start"));
}

#[tokio::test]
async fn member_is_sent_to_entry_page() {
    let store = Arc::new(MemoryStore::with_texts(&["All hands at noon"]));
    let app = router_with(store, Some(CAPTAIN));

    let response = app.oneshot(get("/", Some(CAPTAIN))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/oauth2/start"
    );
    let body = body_text(response).await;
    assert!(!body.contains("All hands at noon"));
}

#[tokio::test]
async fn member_load_more_navigates_by_script() {
    let store = Arc::new(MemoryStore::with_texts(&["All hands at noon"]));
    let app = router_with(store, Some(CAPTAIN));
    let request = Request::builder()
        .uri("/ui/announcements")
        .header("x-forwarded-email", DECKHAND)
        .header("datastar-request", "true")
        .body(Body::empty())
        .unwrap();

    let body = body_text(app.oneshot(request).await.unwrap()).await;

    assert!(body.contains("window.location.assign"));
    assert!(!body.contains("All hands at noon"));
}

#[tokio::test]
async fn captain_sees_composer_and_controls() {
    let store = Arc::new(MemoryStore::with_texts(&["Set sail at dawn"]));
    let app = router_with(store, Some(CAPTAIN));

    let body = body_text(app.oneshot(get("/", Some(CAPTAIN))).await.unwrap()).await;

    assert!(body.contains("composer-form"));
    assert!(body.contains("/delete"));
    assert!(body.contains("badge"));
}

#[tokio::test]
async fn missing_admin_config_fails_closed() {
    let app = router_with(Arc::new(MemoryStore::default()), None);

    let response = app.oneshot(get("/", Some(CAPTAIN))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn empty_board_shows_notice_and_no_loader_button() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));

    let body = body_text(app.oneshot(get("/", Some(CAPTAIN))).await.unwrap()).await;

    assert!(body.contains("feed-empty"));
    assert!(!body.contains("Load more"));
}

#[tokio::test]
async fn first_page_offers_more_when_feed_is_longer() {
    let texts: Vec<String> = (0..7).map(|n| format!("notice{n}")).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let app = router_with(Arc::new(MemoryStore::with_texts(&refs)), Some(CAPTAIN));

    let body = body_text(app.oneshot(get("/", Some(CAPTAIN))).await.unwrap()).await;

    assert!(body.contains("notice0"));
    assert!(body.contains("notice4"));
    assert!(!body.contains("notice5"));
    assert!(body.contains("Load more"));
}

#[tokio::test]
async fn malformed_cursor_is_a_bad_request() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));

    let response = app
        .oneshot(get("/ui/announcements?cursor=not-a-cursor", Some(CAPTAIN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn member_cannot_post() {
    let store = Arc::new(MemoryStore::default());
    let app = router_with(store.clone(), Some(CAPTAIN));

    let response = app
        .oneshot(multipart_post("/announcements", DECKHAND, "Mutiny"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("window.location.assign"));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn blank_post_writes_nothing() {
    let store = Arc::new(MemoryStore::default());
    let app = router_with(store.clone(), Some(CAPTAIN));

    let response = app
        .oneshot(multipart_post("/announcements", CAPTAIN, "   \n  "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("toast-warning"));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn captain_post_prepends_card_and_resets_composer() {
    let store = Arc::new(MemoryStore::default());
    let app = router_with(store.clone(), Some(CAPTAIN));

    let response = app
        .oneshot(multipart_post("/announcements", CAPTAIN, "Fresh water aboard"))
        .await
        .unwrap();

    let body = body_text(response).await;
    assert!(body.contains("#announcement-list"));
    assert!(body.contains("prepend"));
    assert!(body.contains("#composer"));
    assert!(body.contains("toast-success"));
    assert_eq!(store.texts(), ["Fresh water aboard"]);
}

#[tokio::test]
async fn captain_delete_removes_card() {
    let store = Arc::new(MemoryStore::with_texts(&["Drill at six"]));
    let id = store.first_id();
    let app = router_with(store.clone(), Some(CAPTAIN));
    let request = Request::builder()
        .method("POST")
        .uri(format!("/announcements/{id}/delete"))
        .header("x-forwarded-email", CAPTAIN)
        .body(Body::empty())
        .unwrap();

    let body = body_text(app.oneshot(request).await.unwrap()).await;

    assert!(body.contains(&format!("#announcement-{id}")));
    assert!(store.texts().is_empty());
}

#[tokio::test]
async fn editing_a_vanished_announcement_drops_its_card() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));
    let id = Uuid::new_v4();

    let body = body_text(
        app.oneshot(get(&format!("/announcements/{id}/edit"), Some(CAPTAIN)))
            .await
            .unwrap(),
    )
    .await;

    assert!(body.contains("no longer exists"));
    assert!(body.contains(&format!("#announcement-{id}")));
}

#[tokio::test]
async fn health_is_unavailable_without_database() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));

    let response = app.oneshot(get("/_health/db", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));

    let response = app.oneshot(get("/static/board.css", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_path_renders_not_found_page() {
    let app = router_with(Arc::new(MemoryStore::default()), Some(CAPTAIN));

    let response = app.oneshot(get("/nowhere", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Ship&#39;s Log") || body.contains("Ship's Log"));
}

#[tokio::test]
async fn posted_images_render_in_order_with_escaped_text() {
    let store = Arc::new(MemoryStore::default());
    let app = router_with(store, Some(CAPTAIN));

    let post = FormBody::default()
        .field("text", "<b>hi</b>")
        .file("u1.png", "image/png", "first")
        .file("u2.png", "image/png", "second")
        .post("/announcements", CAPTAIN);
    let posted = body_text(app.clone().oneshot(post).await.unwrap()).await;
    assert!(posted.contains("toast-success"));

    let page = body_text(app.oneshot(get("/", Some(CAPTAIN))).await.unwrap()).await;

    assert!(page.contains("&lt;b&gt;hi"));
    assert!(!page.contains("<b>hi</b>"));
    assert_eq!(page.matches("class=\"thumb\"").count(), 2);
    assert!(
        position(&page, "https://i.ibb.co/test/u1.png")
            < position(&page, "https://i.ibb.co/test/u2.png")
    );
}

#[tokio::test]
async fn save_replaces_card_with_retained_images_before_new_ones() {
    let store = Arc::new(MemoryStore::with_images("Anchor", &[STERN, BOW]));
    let id = store.first_id();
    let app = router_with(store.clone(), Some(CAPTAIN));

    let save = FormBody::default()
        .field("text", "Weigh")
        .field("retained", BOW)
        .file("mast.png", "image/png", "mast")
        .post(&format!("/announcements/{id}/edit"), CAPTAIN);
    let body = body_text(app.oneshot(save).await.unwrap()).await;

    assert!(body.contains(&format!("#announcement-{id}")));
    assert!(body.contains("Weigh"));
    assert!(!body.contains(STERN));
    assert!(position(&body, BOW) < position(&body, "https://i.ibb.co/test/mast.png"));
    assert!(body.contains("toast-success"));
    assert_eq!(store.texts(), ["Weigh"]);
    assert_eq!(
        store.images_of(id),
        [BOW, "https://i.ibb.co/test/mast.png"]
    );
}

#[tokio::test]
async fn removing_an_image_rerenders_only_the_retained_list() {
    let store = Arc::new(MemoryStore::with_images("Anchor", &[STERN, BOW]));
    let id = store.first_id();
    let app = router_with(store.clone(), Some(CAPTAIN));

    let remove = FormBody::default()
        .field("text", "Anchor")
        .field("retained", STERN)
        .field("retained", BOW)
        .no_file()
        .post(&format!("/announcements/{id}/edit/remove?index=0"), CAPTAIN);
    let body = body_text(app.oneshot(remove).await.unwrap()).await;

    assert!(body.contains("#edit-retained"));
    assert!(!body.contains(STERN));
    assert!(body.contains(BOW));
    assert_eq!(store.writes(), 0);
    assert_eq!(store.images_of(id), [STERN, BOW]);
}

#[tokio::test]
async fn remove_without_index_is_a_bad_request() {
    let store = Arc::new(MemoryStore::with_images("Anchor", &[STERN, BOW]));
    let id = store.first_id();
    let app = router_with(store.clone(), Some(CAPTAIN));

    let remove = FormBody::default()
        .field("retained", STERN)
        .field("retained", BOW)
        .no_file()
        .post(&format!("/announcements/{id}/edit/remove"), CAPTAIN);
    let response = app.oneshot(remove).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.images_of(id), [STERN, BOW]);
}

#[tokio::test]
async fn editor_preview_shows_staged_thumbnails() {
    let store = Arc::new(MemoryStore::with_texts(&["Anchor"]));
    let id = store.first_id();
    let app = router_with(store.clone(), Some(CAPTAIN));

    let preview = FormBody::default()
        .field("text", "Anchor")
        .file("deck.png", "image/png", "deck")
        .post(&format!("/announcements/{id}/edit/preview"), CAPTAIN);
    let body = body_text(app.oneshot(preview).await.unwrap()).await;

    assert!(body.contains("#edit-staged"));
    assert!(body.contains("data:image/png;base64,"));
    assert!(body.contains("deck.png"));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn composer_preview_skips_files_that_are_not_images() {
    let store = Arc::new(MemoryStore::default());
    let app = router_with(store.clone(), Some(CAPTAIN));

    let preview = FormBody::default()
        .field("text", "")
        .file("deck.png", "image/png", "deck")
        .file("notes.txt", "text/plain", "hello")
        .post("/ui/composer/preview", CAPTAIN);
    let body = body_text(app.oneshot(preview).await.unwrap()).await;

    assert!(body.contains("#composer-previews"));
    assert!(body.contains("data-filename=\"deck.png\""));
    assert!(!body.contains("data-filename=\"notes.txt\""));
    assert!(body.contains("toast-warning"));
    assert!(body.contains("notes.txt"));
    assert_eq!(store.writes(), 0);
}
