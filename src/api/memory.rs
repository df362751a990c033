//! In-memory backend used by tests

use super::error::ApiError;
use super::traits::{
    ApiResult, AuthGateway, EntityGateway, LocationGateway, ProgramCourseGateway,
};
use super::Gateways;
use crate::state::{
    ClientSettings, EntityId, EntityKind, EntitySummary, FormRecord, OptionItem, SessionUser,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Store {
    next_id: i64,
    entities: Vec<(EntityKind, EntitySummary)>,
}

/// A backend holding everything in memory, seeded with a small catalog
#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    pub user: SessionUser,
    pub countries: Vec<OptionItem>,
    pub states: HashMap<i64, Vec<OptionItem>>,
    pub cities: HashMap<i64, Vec<OptionItem>>,
    pub settings: HashMap<i64, ClientSettings>,
    pub programs: HashMap<i64, Vec<OptionItem>>,
    pub batches: HashMap<i64, Vec<OptionItem>>,
    pub courses: HashMap<i64, Vec<OptionItem>>,
}

impl MemoryBackend {
    /// India and Brazil with a few states and cities, one client on the
    /// program flow
    pub fn seeded() -> Self {
        let backend = Self {
            user: SessionUser {
                id: 1,
                username: "root".into(),
                role: Some("superadmin".into()),
                ..Default::default()
            },
            countries: vec![OptionItem::new(1, "India"), OptionItem::new(2, "Brazil")],
            states: HashMap::from([
                (1, vec![OptionItem::new(10, "Kerala"), OptionItem::new(11, "Goa")]),
                (2, vec![OptionItem::new(20, "Bahia"), OptionItem::new(21, "Ceará")]),
            ]),
            cities: HashMap::from([
                (10, vec![OptionItem::new(100, "Kochi")]),
                (20, vec![OptionItem::new(200, "Salvador")]),
            ]),
            settings: HashMap::from([(
                5,
                ClientSettings {
                    is_course_program_flow: true,
                    ..Default::default()
                },
            )]),
            programs: HashMap::from([(5, vec![OptionItem::new(60, "JEE")])]),
            batches: HashMap::new(),
            courses: HashMap::from([(60, vec![OptionItem::new(600, "Physics")])]),
            store: Mutex::new(Store {
                next_id: 100,
                ..Default::default()
            }),
        };
        backend.insert(
            EntityKind::Client,
            serde_json::json!({"id": 5, "name": "Acme", "email": "office@acme.io"}),
        );
        backend
    }

    fn insert(&self, kind: EntityKind, value: Value) {
        if let Ok(summary) = serde_json::from_value(value) {
            if let Ok(mut store) = self.store.lock() {
                store.entities.push((kind, summary));
            }
        }
    }

    pub fn into_gateways(self) -> Gateways {
        let backend = Arc::new(self);
        Gateways {
            auth: backend.clone(),
            entities: backend.clone(),
            locations: backend.clone(),
            catalog: backend,
        }
    }

    fn lock(&self) -> ApiResult<std::sync::MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| ApiError::Network("store poisoned".into()))
    }
}

#[async_trait]
impl AuthGateway for MemoryBackend {
    async fn csrf_token(&self) -> ApiResult<String> {
        Ok("memory".into())
    }

    async fn login(&self, username: &str, _password: &str) -> ApiResult<SessionUser> {
        if username == self.user.username {
            Ok(self.user.clone())
        } else {
            Err(ApiError::Rejected {
                status: 401,
                message: "Invalid credentials".into(),
            })
        }
    }

    async fn logout(&self) -> ApiResult<()> {
        Ok(())
    }

    async fn check_session(&self) -> ApiResult<Option<SessionUser>> {
        Ok(Some(self.user.clone()))
    }
}

#[async_trait]
impl EntityGateway for MemoryBackend {
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<EntitySummary>> {
        Ok(self
            .lock()?
            .entities
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: EntityId) -> ApiResult<EntitySummary> {
        self.lock()?
            .entities
            .iter()
            .find(|(k, e)| *k == kind && e.id == id.0)
            .map(|(_, e)| e.clone())
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                message: "Not found.".into(),
            })
    }

    async fn create(&self, kind: EntityKind, record: &FormRecord) -> ApiResult<EntityId> {
        let mut store = self.lock()?;
        let email = record
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);
        if email.is_some()
            && store
                .entities
                .iter()
                .any(|(k, e)| *k == kind && e.email == email)
        {
            let mut fields = super::FieldErrors::new();
            fields.insert("email".into(), "Email already registered.".into());
            return Err(ApiError::Fields(fields));
        }

        store.next_id += 1;
        let id = store.next_id;
        let mut value = Value::Object(record.clone());
        value["id"] = Value::from(id);
        let summary = serde_json::from_value(value)?;
        store.entities.push((kind, summary));
        Ok(EntityId(id))
    }

    async fn update(&self, kind: EntityKind, id: EntityId, record: &FormRecord) -> ApiResult<()> {
        let mut store = self.lock()?;
        let slot = store
            .entities
            .iter_mut()
            .find(|(k, e)| *k == kind && e.id == id.0)
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                message: "Not found.".into(),
            })?;
        let mut value = Value::Object(record.clone());
        value["id"] = Value::from(id.0);
        slot.1 = serde_json::from_value(value)?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> ApiResult<()> {
        let mut store = self.lock()?;
        let before = store.entities.len();
        store.entities.retain(|(k, e)| !(*k == kind && e.id == id.0));
        if store.entities.len() == before {
            return Err(ApiError::Rejected {
                status: 404,
                message: "Not found.".into(),
            });
        }
        Ok(())
    }
}

fn lookup(map: &HashMap<i64, Vec<OptionItem>>, key: i64) -> Vec<OptionItem> {
    map.get(&key).cloned().unwrap_or_default()
}

#[async_trait]
impl LocationGateway for MemoryBackend {
    async fn countries(&self) -> ApiResult<Vec<OptionItem>> {
        Ok(self.countries.clone())
    }

    async fn states(&self, country_id: i64) -> ApiResult<Vec<OptionItem>> {
        Ok(lookup(&self.states, country_id))
    }

    async fn cities(&self, state_id: i64) -> ApiResult<Vec<OptionItem>> {
        Ok(lookup(&self.cities, state_id))
    }
}

#[async_trait]
impl ProgramCourseGateway for MemoryBackend {
    async fn client_settings(&self, client_id: i64) -> ApiResult<ClientSettings> {
        Ok(self.settings.get(&client_id).cloned().unwrap_or_default())
    }

    async fn programs_for_client(&self, client_id: i64) -> ApiResult<Vec<OptionItem>> {
        Ok(lookup(&self.programs, client_id))
    }

    async fn batches_for_client(&self, client_id: i64) -> ApiResult<Vec<OptionItem>> {
        Ok(lookup(&self.batches, client_id))
    }

    async fn courses_for_program(&self, program_id: i64) -> ApiResult<Vec<OptionItem>> {
        Ok(lookup(&self.courses, program_id))
    }

    async fn courses_for_batch(&self, batch_id: i64) -> ApiResult<Vec<OptionItem>> {
        Ok(lookup(&self.courses, batch_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{OptionSource, SelectionCascade};
    use serde_json::json;

    fn record(value: Value) -> FormRecord {
        match value {
            Value::Object(map) => map,
            _ => FormRecord::new(),
        }
    }

    #[test]
    fn test_created_id_is_retrievable() {
        let backend = MemoryBackend::seeded();
        let body = record(json!({
            "first_name": "Asha",
            "last_name": "Rao",
            "email": "asha@acme.io"
        }));

        let id = tokio_test::block_on(backend.create(EntityKind::Teacher, &body)).unwrap();
        let fetched = tokio_test::block_on(backend.get(EntityKind::Teacher, id)).unwrap();

        assert_eq!(fetched.id, id.0);
        assert_eq!(fetched.display_name(), "Asha Rao");
        assert_eq!(fetched.email.as_deref(), Some("asha@acme.io"));
    }

    #[test]
    fn test_duplicate_email_is_field_error() {
        let backend = MemoryBackend::seeded();
        let body = record(json!({"name": "Acme 2", "email": "office@acme.io"}));
        let err = tokio_test::block_on(backend.create(EntityKind::Client, &body)).unwrap_err();
        assert!(matches!(err, ApiError::Fields(f) if f.contains_key("email")));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let backend = MemoryBackend::seeded();
        tokio_test::block_on(backend.delete(EntityKind::Client, EntityId(5))).unwrap();
        assert!(tokio_test::block_on(backend.get(EntityKind::Client, EntityId(5))).is_err());
    }

    #[tokio::test]
    async fn test_switching_country_replaces_states() {
        let gateways = MemoryBackend::seeded().into_gateways();
        let mut cascade = SelectionCascade::location();

        let root = cascade.root_request().unwrap();
        let countries = gateways.load_options(root.source, root.key).await;
        cascade.apply(&root, countries);

        let india = cascade.on_upstream_change(0, Some(1)).unwrap();
        let states = gateways.load_options(india.source, india.key).await;
        cascade.apply(&india, states);
        let kerala = cascade.on_upstream_change(1, Some(10)).unwrap();
        let cities = gateways.load_options(kerala.source, kerala.key).await;
        cascade.apply(&kerala, cities);
        cascade.on_upstream_change(2, Some(100));
        assert_eq!(cascade.links()[1].options[0].label, "Kerala");

        let brazil = cascade.on_upstream_change(0, Some(2)).unwrap();
        assert_eq!(cascade.selected(1), None);
        assert_eq!(cascade.selected(2), None);
        assert!(cascade.links()[2].options.is_empty());

        let states = gateways.load_options(brazil.source, brazil.key).await;
        cascade.apply(&brazil, states);
        let labels: Vec<&str> = cascade.links()[1]
            .options
            .iter()
            .map(|o| o.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Bahia", "Ceará"]);
    }

    #[tokio::test]
    async fn test_late_india_states_do_not_override_brazil() {
        let gateways = MemoryBackend::seeded().into_gateways();
        let mut cascade = SelectionCascade::location();
        let root = cascade.root_request().unwrap();
        let countries = gateways.load_options(root.source, root.key).await;
        cascade.apply(&root, countries);

        let india = cascade.on_upstream_change(0, Some(1)).unwrap();
        let brazil = cascade.on_upstream_change(0, Some(2)).unwrap();

        let brazil_states = gateways.load_options(brazil.source, brazil.key).await;
        let india_states = gateways.load_options(india.source, india.key).await;
        assert!(cascade.apply(&brazil, brazil_states));
        assert!(!cascade.apply(&india, india_states));
        assert_eq!(cascade.links()[1].options[0].label, "Bahia");
    }

    #[tokio::test]
    async fn test_organization_cascade_end_to_end() {
        let gateways = MemoryBackend::seeded().into_gateways();
        let mut cascade = SelectionCascade::organization();
        let root = cascade.root_request().unwrap();
        assert_eq!(root.source, OptionSource::Clients);
        let clients = gateways.load_options(root.source, root.key).await;
        cascade.apply(&root, clients);

        let groups = cascade.on_upstream_change(0, Some(5)).unwrap();
        let loaded = gateways.load_options(groups.source, groups.key).await;
        cascade.apply(&groups, loaded);
        assert_eq!(cascade.links()[1].field, "program");

        let courses = cascade.on_upstream_change(1, Some(60)).unwrap();
        let loaded = gateways.load_options(courses.source, courses.key).await;
        cascade.apply(&courses, loaded);
        assert_eq!(cascade.links()[2].options, vec![OptionItem::new(600, "Physics")]);
    }
}
