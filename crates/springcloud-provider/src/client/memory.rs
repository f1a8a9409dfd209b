//! An in-memory [`ResourceManager`] which behaves like Azure Resource Manager for the parts the
//! reconcilers rely upon: secrets are masked on reads, mutations are long-running operations and
//! deleting a resource deletes its children.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{
    Error, Operation, OperationStatus, Poll, PollResult, ResourceManager,
};

const SECRET_KEYS: &[&str] = &["password", "privateKey", "hostKey", "hostKeyAlgorithm"];
const MASK: &str = "*";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Method {
    Get,
    List,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub(crate) fn is_mutation(self) -> bool {
        matches!(self, Self::Put | Self::Patch | Self::Delete)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Call {
    pub method: Method,
    pub id: String,
}

#[derive(Default)]
struct State {
    resources: BTreeMap<String, Value>,
    calls: Vec<Call>,
    failures: HashMap<(Method, String), String>,
    failed_operations: HashMap<(Method, String), String>,
    merge_after_put: HashMap<String, Value>,
}

#[derive(Default)]
pub(crate) struct InMemoryResourceManager {
    state: Mutex<State>,
}

fn key(id: &str) -> String {
    id.trim_end_matches('/').to_ascii_lowercase()
}

impl InMemoryResourceManager {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("state lock is not poisoned")
    }

    /// Stores `value` as is, without recording a call.
    pub(crate) fn insert(&self, id: &str, mut value: Value) {
        set_identity(&mut value, id);
        self.lock().resources.insert(key(id), value);
    }

    /// Returns the stored (unmasked) resource.
    pub(crate) fn resource(&self, id: &str) -> Option<Value> {
        self.lock().resources.get(&key(id)).cloned()
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.lock().resources.contains_key(&key(id))
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method.is_mutation())
            .collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Makes the call itself fail with an internal server error.
    pub(crate) fn fail(&self, method: Method, id: &str, message: &str) {
        self.lock()
            .failures
            .insert((method, key(id)), message.to_owned());
    }

    /// Makes the long-running operation started by the call fail.
    pub(crate) fn fail_operation(&self, method: Method, id: &str, message: &str) {
        self.lock()
            .failed_operations
            .insert((method, key(id)), message.to_owned());
    }

    /// Merges `value` into the resource after every `PUT`, like the service does when it
    /// reports errors in the resource properties.
    pub(crate) fn merge_after_put(&self, id: &str, value: Value) {
        self.lock().merge_after_put.insert(key(id), value);
    }

    fn record(&self, method: Method, id: &str) -> Result<(), Error> {
        let mut state = self.lock();
        state.calls.push(Call {
            method,
            id: id.to_owned(),
        });
        match state.failures.get(&(method, key(id))) {
            Some(message) => Err(Error::Request {
                id: id.to_owned(),
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn operation(&self, method: Method, id: &str) -> Operation {
        let failure = self
            .lock()
            .failed_operations
            .get(&(method, key(id)))
            .cloned();
        let poller = ScriptedPoller {
            in_progress: 1,
            failure,
        };
        Operation::pending(id, Box::new(poller), Duration::ZERO)
    }
}

#[async_trait]
impl ResourceManager for InMemoryResourceManager {
    async fn get(&self, id: &str) -> Result<Value, Error> {
        self.record(Method::Get, id)?;
        let mut value = self.resource(id).ok_or_else(|| Error::NotFound { id: id.to_owned() })?;
        mask_secrets(&mut value);
        Ok(value)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>, Error> {
        self.record(Method::List, collection)?;
        let prefix = format!("{}/", key(collection));
        let mut values = self
            .lock()
            .resources
            .iter()
            .filter(|(id, _)| {
                id.strip_prefix(&prefix)
                    .is_some_and(|name| !name.is_empty() && !name.contains('/'))
            })
            .map(|(_, value)| value.clone())
            .collect::<Vec<_>>();
        values.iter_mut().for_each(mask_secrets);
        Ok(values)
    }

    async fn put(&self, id: &str, mut body: Value) -> Result<Operation, Error> {
        self.record(Method::Put, id)?;
        {
            let mut state = self.lock();
            if let Some(extra) = state.merge_after_put.get(&key(id)) {
                merge(&mut body, extra.clone());
            }
            set_identity(&mut body, id);
            state.resources.insert(key(id), body);
        }
        Ok(self.operation(Method::Put, id))
    }

    async fn patch(&self, id: &str, body: Value) -> Result<Operation, Error> {
        self.record(Method::Patch, id)?;
        {
            let mut state = self.lock();
            let existing = state
                .resources
                .get_mut(&key(id))
                .ok_or_else(|| Error::NotFound { id: id.to_owned() })?;
            merge(existing, body);
        }
        Ok(self.operation(Method::Patch, id))
    }

    async fn delete(&self, id: &str) -> Result<Operation, Error> {
        self.record(Method::Delete, id)?;
        {
            let mut state = self.lock();
            let own = key(id);
            let children = format!("{own}/");
            if state.resources.remove(&own).is_none() {
                return Err(Error::NotFound { id: id.to_owned() });
            }
            state.resources.retain(|id, _| !id.starts_with(&children));
        }
        Ok(self.operation(Method::Delete, id))
    }
}

struct ScriptedPoller {
    in_progress: usize,
    failure: Option<String>,
}

#[async_trait]
impl Poll for ScriptedPoller {
    async fn poll(&mut self) -> Result<PollResult, Error> {
        if self.in_progress > 0 {
            self.in_progress -= 1;
            return Ok(PollResult {
                status: OperationStatus::InProgress,
                retry_after: Some(Duration::ZERO),
                message: None,
            });
        }
        Ok(match &self.failure {
            Some(message) => PollResult {
                status: OperationStatus::Failed,
                retry_after: None,
                message: Some(message.clone()),
            },
            None => PollResult::with_status(OperationStatus::Succeeded),
        })
    }
}

fn set_identity(value: &mut Value, id: &str) {
    if let Value::Object(object) = value {
        object.insert("id".to_owned(), Value::String(id.to_owned()));
        if let Some(name) = id.rsplit('/').next() {
            object.insert("name".to_owned(), Value::String(name.to_owned()));
        }
    }
}

fn mask_secrets(value: &mut Value) {
    match value {
        Value::Object(object) => {
            for (key, value) in object.iter_mut() {
                if SECRET_KEYS.contains(&key.as_str()) && value.is_string() {
                    *value = Value::String(MASK.to_owned());
                } else {
                    mask_secrets(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(mask_secrets),
        _ => {}
    }
}

/// Merges `patch` into `target` like a JSON merge patch, except that `null` is stored as is.
fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::NotFoundExt;

    #[tokio::test]
    async fn reads_mask_secrets() {
        let manager = InMemoryResourceManager::default();
        let operation = manager
            .put(
                "/a/b",
                json!({"properties": {"credentials": {"username": "u", "password": "p"}}}),
            )
            .await
            .expect("put succeeds");
        operation.wait().await.expect("operation succeeds");

        let value = manager.get("/A/b").await.expect("resource exists");
        assert_eq!(
            value,
            json!({
                "id": "/a/b",
                "name": "b",
                "properties": {"credentials": {"username": "u", "password": "*"}}
            })
        );
    }

    #[tokio::test]
    async fn delete_removes_children() {
        let manager = InMemoryResourceManager::default();
        manager.insert("/svc", json!({}));
        manager.insert("/svc/registries/a", json!({}));

        manager.delete("/svc").await.expect("delete succeeds");
        assert!(!manager.contains("/svc/registries/a"));
        assert!(manager.get("/svc").await.optional().expect("no error").is_none());
    }

    #[tokio::test]
    async fn list_only_returns_direct_children() {
        let manager = InMemoryResourceManager::default();
        manager.insert("/svc/registries/a", json!({}));
        manager.insert("/svc/registries/b", json!({}));
        manager.insert("/svc/registries/b/nested/c", json!({}));

        let values = manager.list("/svc/registries").await.expect("list succeeds");
        assert_eq!(values.len(), 2);
    }
}
