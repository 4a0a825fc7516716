//! In-memory collaborators and a router harness for tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    response::Response,
};
use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::{
        gate::{AccessDirectory, Identity, Role},
        jwt::JwtKeys,
        repo::{IdentityRecord, IdentityStore},
    },
    blogs::{
        dto::{BlogFields, BlogPost},
        store::{BlogStore, BlogUpdate, BlogWrite},
    },
    leads::{
        dto::{Appointment, NewAppointment, NewsletterSubscriber, PatchedLead},
        status::{AppointmentStatus, LeadPatch},
        store::LeadStore,
    },
    offers::store::{InsertOutcome, OfferCode, OfferStore, Redemption},
    revalidate::PageRevalidator,
    state::AppState,
    storage::{join_public_url, StorageClient},
    users::{dto::AdminUser, store::AdminStore},
};

/// Wire name of a status enum, as stored in the text column.
fn status_text<S: Serialize>(status: S) -> String {
    match serde_json::to_value(status) {
        Ok(serde_json::Value::String(s)) => s,
        other => panic!("status did not serialize to a string: {other:?}"),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Session provider and `admin_users` table in one, so role rows and identities stay linked.
#[derive(Default)]
pub struct InMemoryDirectory {
    identities: Mutex<HashMap<Uuid, IdentityRecord>>,
    admins: Mutex<Vec<AdminUser>>,
    events: Mutex<Vec<String>>,
    fail_next_revoke: Mutex<bool>,
}

impl InMemoryDirectory {
    /// Registers an identity, plus a role row when `role` is given.
    pub fn add(&self, email: &str, role: Option<Role>) -> Identity {
        let record = IdentityRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: String::new(),
        };
        self.identities
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        if let Some(role) = role {
            self.admins.lock().unwrap().push(AdminUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                role: role.as_str().to_string(),
                auth_user_id: Some(record.id),
                created_at: OffsetDateTime::now_utc(),
            });
        }
        Identity {
            id: record.id,
            email: record.email,
        }
    }

    /// Drops an identity behind the store's back, as an external revocation would.
    pub fn remove_identity(&self, id: Uuid) {
        self.identities.lock().unwrap().remove(&id);
    }

    pub fn identity_by_email(&self, email: &str) -> Option<Identity> {
        self.identities
            .lock()
            .unwrap()
            .values()
            .find(|i| i.email == email)
            .map(|i| Identity {
                id: i.id,
                email: i.email.clone(),
            })
    }

    /// Role-row deletions and identity revocations, in call order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn fail_next_revoke(&self) {
        *self.fail_next_revoke.lock().unwrap() = true;
    }
}

#[async_trait]
impl AccessDirectory for InMemoryDirectory {
    async fn find_identity(&self, id: Uuid) -> anyhow::Result<Option<Identity>> {
        Ok(self.identities.lock().unwrap().get(&id).map(|i| Identity {
            id: i.id,
            email: i.email.clone(),
        }))
    }

    async fn find_role(&self, identity_id: Uuid) -> anyhow::Result<Option<Role>> {
        let role = self
            .admins
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.auth_user_id == Some(identity_id))
            .map(|a| a.role.clone());
        role.map(|r| r.parse::<Role>().map_err(anyhow::Error::msg))
            .transpose()
    }
}

#[async_trait]
impl IdentityStore for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<IdentityRecord>> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .values()
            .find(|i| i.email == email)
            .cloned())
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<IdentityRecord>> {
        let mut identities = self.identities.lock().unwrap();
        if identities.values().any(|i| i.email == email) {
            return Ok(None);
        }
        let record = IdentityRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        identities.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn revoke(&self, id: Uuid) -> anyhow::Result<bool> {
        self.events.lock().unwrap().push(format!("revoke {id}"));
        if std::mem::take(&mut *self.fail_next_revoke.lock().unwrap()) {
            anyhow::bail!("identity provider unavailable");
        }
        Ok(self.identities.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl AdminStore for InMemoryDirectory {
    async fn list(&self) -> anyhow::Result<Vec<AdminUser>> {
        let mut rows = self.admins.lock().unwrap().clone();
        rows.reverse();
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<AdminUser>> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn insert(&self, email: &str, role: Role, auth_user_id: Uuid) -> anyhow::Result<AdminUser> {
        let user = AdminUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            auth_user_id: Some(auth_user_id),
            created_at: OffsetDateTime::now_utc(),
        };
        self.admins.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        self.events.lock().unwrap().push(format!("delete_admin {id}"));
        let mut admins = self.admins.lock().unwrap();
        let before = admins.len();
        admins.retain(|a| a.id != id);
        Ok(admins.len() < before)
    }

    async fn admin_exists(&self) -> anyhow::Result<bool> {
        Ok(self.admins.lock().unwrap().iter().any(|a| a.role == "admin"))
    }
}

#[derive(Default)]
pub struct InMemoryOffers {
    rows: Mutex<Vec<OfferCode>>,
    lookups: Mutex<usize>,
    taken_lookups: Mutex<usize>,
    code_conflict_next: Mutex<bool>,
}

impl InMemoryOffers {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Number of `code_exists` calls so far.
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    /// The next `n` uniqueness checks report the candidate as taken.
    pub fn pretend_taken(&self, n: usize) {
        *self.taken_lookups.lock().unwrap() = n;
    }

    pub fn fail_next_insert_with_code_conflict(&self) {
        *self.code_conflict_next.lock().unwrap() = true;
    }

    /// Status column edit, as the lead patch endpoint performs it.
    pub fn set_status(&self, id: Uuid, status: String) -> Option<OfferCode> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|o| o.id == id)?;
        row.status = status;
        Some(row.clone())
    }
}

#[async_trait]
impl OfferStore for InMemoryOffers {
    async fn code_exists(&self, code: &str) -> anyhow::Result<bool> {
        *self.lookups.lock().unwrap() += 1;
        let mut taken = self.taken_lookups.lock().unwrap();
        if *taken > 0 {
            *taken -= 1;
            return Ok(true);
        }
        Ok(self.rows.lock().unwrap().iter().any(|o| o.code == code))
    }

    async fn insert(&self, email: &str, code: &str) -> anyhow::Result<InsertOutcome> {
        if std::mem::take(&mut *self.code_conflict_next.lock().unwrap()) {
            return Ok(InsertOutcome::CodeTaken);
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|o| o.email == email) {
            return Ok(InsertOutcome::EmailTaken);
        }
        if rows.iter().any(|o| o.code == code) {
            return Ok(InsertOutcome::CodeTaken);
        }
        let offer = OfferCode {
            id: Uuid::new_v4(),
            email: email.to_string(),
            code: code.to_string(),
            is_used: false,
            status: "new".into(),
            created_at: OffsetDateTime::now_utc(),
            used_at: None,
        };
        rows.push(offer.clone());
        Ok(InsertOutcome::Created(offer))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<OfferCode>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.email == email)
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<OfferCode>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.code == code)
            .cloned())
    }

    async fn redeem(&self, id: Uuid) -> anyhow::Result<Redemption> {
        let mut rows = self.rows.lock().unwrap();
        Ok(match rows.iter_mut().find(|o| o.id == id) {
            None => Redemption::Missing,
            Some(o) if o.is_used => Redemption::AlreadyUsed(o.clone()),
            Some(o) => {
                o.is_used = true;
                o.used_at = Some(OffsetDateTime::now_utc());
                Redemption::Redeemed(o.clone())
            }
        })
    }

    async fn list(&self, search: Option<&str>) -> anyhow::Result<Vec<OfferCode>> {
        let needle = search.map(str::to_lowercase);
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| match &needle {
                Some(n) => o.email.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<Vec<(String, usize)>>,
}

impl FakeStorage {
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), body.len()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url("https://cdn.test/blog-images", key)
    }
}

#[derive(Default)]
pub struct InMemoryBlogs {
    rows: Mutex<Vec<BlogPost>>,
}

fn post_from(id: Uuid, f: &BlogFields, created_at: OffsetDateTime) -> BlogPost {
    BlogPost {
        id,
        slug: f.slug.clone(),
        title: f.title.clone(),
        excerpt: f.excerpt.clone(),
        content: f.content.clone(),
        author: f.author.clone(),
        date: f.date,
        category: f.category.clone(),
        image: f.image.clone(),
        read_time: f.read_time.clone(),
        tags: f.tags.clone(),
        created_at,
        updated_at: OffsetDateTime::now_utc(),
    }
}

#[async_trait]
impl BlogStore for InMemoryBlogs {
    async fn list(&self) -> anyhow::Result<Vec<BlogPost>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.reverse();
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<BlogPost>> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, fields: &BlogFields) -> anyhow::Result<BlogWrite> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|p| p.slug == fields.slug) {
            return Ok(BlogWrite::SlugTaken);
        }
        let post = post_from(Uuid::new_v4(), fields, OffsetDateTime::now_utc());
        rows.push(post.clone());
        Ok(BlogWrite::Created(post))
    }

    async fn update(&self, id: Uuid, fields: &BlogFields) -> anyhow::Result<BlogUpdate> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|p| p.slug == fields.slug && p.id != id) {
            return Ok(BlogUpdate::SlugTaken);
        }
        let Some(row) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(BlogUpdate::Missing);
        };
        let previous_slug = row.slug.clone();
        *row = post_from(id, fields, row.created_at);
        Ok(BlogUpdate::Updated {
            previous_slug,
            post: row.clone(),
        })
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<String>> {
        let mut rows = self.rows.lock().unwrap();
        let slug = rows
            .iter()
            .position(|p| p.id == id)
            .map(|i| rows.remove(i).slug);
        Ok(slug)
    }

    async fn recent(&self, limit: i64) -> anyhow::Result<Vec<BlogPost>> {
        let mut rows = self.list().await?;
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

/// Appointment and newsletter tables; offer status edits land in the shared offer fake.
pub struct InMemoryLeads {
    appointments: Mutex<Vec<Appointment>>,
    newsletters: Mutex<Vec<NewsletterSubscriber>>,
    offers: Arc<InMemoryOffers>,
}

impl InMemoryLeads {
    pub fn new(offers: Arc<InMemoryOffers>) -> Self {
        Self {
            appointments: Mutex::default(),
            newsletters: Mutex::default(),
            offers,
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryLeads {
    async fn insert_appointment(&self, a: &NewAppointment) -> anyhow::Result<Appointment> {
        let row = Appointment {
            id: Uuid::new_v4(),
            name: a.name.clone(),
            email: a.email.clone(),
            phone: a.phone.clone(),
            service: a.service.clone(),
            message: a.message.clone(),
            status: status_text(AppointmentStatus::default()),
            created_at: OffsetDateTime::now_utc(),
        };
        self.appointments.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn subscribe(&self, email: &str) -> anyhow::Result<NewsletterSubscriber> {
        let mut rows = self.newsletters.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.email == email) {
            row.status = "subscribed".into();
            return Ok(row.clone());
        }
        let row = NewsletterSubscriber {
            id: Uuid::new_v4(),
            email: email.to_string(),
            status: "subscribed".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list_appointments(
        &self,
        status: Option<AppointmentStatus>,
        search: Option<&str>,
    ) -> anyhow::Result<Vec<Appointment>> {
        let status = status.map(status_text);
        let mut rows: Vec<_> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| status.as_ref().map_or(true, |s| &a.status == s))
            .filter(|a| {
                search.map_or(true, |q| {
                    contains_ci(&a.email, q) || contains_ci(&a.name, q) || contains_ci(&a.phone, q)
                })
            })
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn list_newsletters(&self, search: Option<&str>) -> anyhow::Result<Vec<NewsletterSubscriber>> {
        let mut rows: Vec<_> = self
            .newsletters
            .lock()
            .unwrap()
            .iter()
            .filter(|r| search.map_or(true, |q| contains_ci(&r.email, q)))
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn recent_appointments(&self, limit: i64) -> anyhow::Result<Vec<Appointment>> {
        let mut rows = self.list_appointments(None, None).await?;
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn apply_patch(&self, id: Uuid, patch: LeadPatch) -> anyhow::Result<Option<PatchedLead>> {
        let patched = match patch {
            LeadPatch::Appointment(status) => {
                let mut rows = self.appointments.lock().unwrap();
                let row = rows.iter_mut().find(|a| a.id == id);
                row.map(|a| {
                    a.status = status_text(status);
                    PatchedLead::Appointment(a.clone())
                })
            }
            LeadPatch::Newsletter(status) => {
                let mut rows = self.newsletters.lock().unwrap();
                let row = rows.iter_mut().find(|r| r.id == id);
                row.map(|r| {
                    r.status = status_text(status);
                    PatchedLead::Newsletter(r.clone())
                })
            }
            LeadPatch::Offer(status) => self
                .offers
                .set_status(id, status_text(status))
                .map(PatchedLead::Offer),
        };
        Ok(patched)
    }
}

/// Records every revalidation batch instead of calling out.
#[derive(Default)]
pub struct RecordingRevalidator {
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingRevalidator {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRevalidator for RecordingRevalidator {
    async fn revalidate(&self, paths: &[String]) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(paths.to_vec());
        Ok(())
    }
}

/// Every in-memory collaborator behind [`AppState::fake`].
pub struct Fakes {
    pub storage: Arc<FakeStorage>,
    pub directory: Arc<InMemoryDirectory>,
    pub offers: Arc<InMemoryOffers>,
    pub blogs: Arc<InMemoryBlogs>,
    pub leads: Arc<InMemoryLeads>,
    pub revalidator: Arc<RecordingRevalidator>,
}

impl Fakes {
    pub fn new() -> Self {
        let offers = Arc::new(InMemoryOffers::default());
        Self {
            storage: Arc::default(),
            directory: Arc::default(),
            leads: Arc::new(InMemoryLeads::new(offers.clone())),
            offers,
            blogs: Arc::default(),
            revalidator: Arc::default(),
        }
    }
}

/// Full router over in-memory collaborators. Only the dashboard counts reach Postgres.
pub struct TestApp {
    pub state: AppState,
    pub fakes: Fakes,
}

impl TestApp {
    pub fn new() -> Self {
        let fakes = Fakes::new();
        Self {
            state: AppState::fake(&fakes),
            fakes,
        }
    }

    /// Registers an identity and returns a bearer access token for it.
    pub fn session(&self, email: &str, role: Option<Role>) -> String {
        let identity = self.fakes.directory.add(email, role);
        JwtKeys::from(&self.state.config.jwt)
            .sign_access(identity.id)
            .expect("sign access token")
    }

    pub async fn call(&self, req: Request<Body>) -> Response {
        build_app(self.state.clone())
            .oneshot(req)
            .await
            .expect("router is infallible")
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {t}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

/// Status plus the JSON body, or `Null` when the body is empty or not JSON.
pub async fn body_json(res: Response) -> (StatusCode, serde_json::Value) {
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}
