//! Process-local [`PlatformClient`] used in tests and local development.
//!
//! Rows, objects and users live in memory. Failures can be injected per
//! table, per upload path prefix, or per function so that the submission
//! pipeline's required and best-effort paths can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::claims;
use crate::client::{AuthSession, PlatformClient, PlatformUser, RowQuery, SortOrder};
use crate::error::PlatformError;

/// Access token lifetime for minted sessions (one hour).
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// An object held in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A recorded function invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub function: String,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct MemoryUser {
    id: Uuid,
    email: String,
    password_hash: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    objects: HashMap<(String, String), StoredObject>,
    users: HashMap<String, MemoryUser>,
    revoked_tokens: HashSet<String>,
    invocations: Vec<Invocation>,
    failing_tables: HashSet<String>,
    failing_upload_prefixes: Vec<String>,
    failing_functions: HashSet<String>,
}

pub struct InMemoryPlatform {
    jwt_secret: String,
    token_ttl_secs: i64,
    state: Mutex<MemoryState>,
}

fn hash_secret(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Order two JSON values of the same column. Mixed types compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        // Nulls and missing columns sort last.
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => Ordering::Greater,
        (Some(_), None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

impl InMemoryPlatform {
    /// Create an empty platform whose sessions are signed with `jwt_secret`.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data; keep serving it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a password user. Emails are matched case-insensitively.
    pub fn register_user(&self, email: &str, password: &str) -> PlatformUser {
        let user = MemoryUser {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            password_hash: hash_secret(password),
        };
        let public = PlatformUser {
            id: user.id,
            email: user.email.clone(),
        };
        self.state().users.insert(user.email.clone(), user);
        public
    }

    /// Insert a row synchronously, filling `id` and `created_at` when absent.
    pub fn seed(&self, table: &str, row: Value) -> Value {
        let mut row = match row {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        };
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));

        let row = Value::Object(row);
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Snapshot of every row in `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.state()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state().invocations.clone()
    }

    /// Whether `access_token` was passed to `sign_out`.
    pub fn is_revoked(&self, access_token: &str) -> bool {
        self.state()
            .revoked_tokens
            .contains(&hash_secret(access_token))
    }

    // ---- failure injection ----

    /// Every row operation on `table` fails from now on.
    pub fn fail_table(&self, table: &str) {
        self.state().failing_tables.insert(table.to_string());
    }

    /// Uploads whose path starts with `prefix` fail from now on.
    pub fn fail_uploads_with_prefix(&self, prefix: &str) {
        self.state().failing_upload_prefixes.push(prefix.to_string());
    }

    pub fn fail_function(&self, function: &str) {
        self.state().failing_functions.insert(function.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_tables.clear();
        state.failing_upload_prefixes.clear();
        state.failing_functions.clear();
    }

    fn check_table(state: &MemoryState, table: &str) -> Result<(), PlatformError> {
        if state.failing_tables.contains(table) {
            return Err(PlatformError::Injected(format!("table {table} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformClient for InMemoryPlatform {
    async fn insert(&self, table: &str, row: Value) -> Result<Value, PlatformError> {
        Self::check_table(&self.state(), table)?;
        if !row.is_object() {
            return Err(PlatformError::Api {
                status: 400,
                body: "row must be a JSON object".into(),
            });
        }
        Ok(self.seed(table, row))
    }

    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>, PlatformError> {
        let state = self.state();
        Self::check_table(&state, table)?;

        let mut rows: Vec<Value> = state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, order)) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(column), b.get(column));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(
        &self,
        table: &str,
        query: &RowQuery,
        patch: Value,
    ) -> Result<Vec<Value>, PlatformError> {
        let mut state = self.state();
        Self::check_table(&state, table)?;
        let Value::Object(patch) = patch else {
            return Err(PlatformError::Api {
                status: 400,
                body: "patch must be a JSON object".into(),
            });
        };

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, query: &RowQuery) -> Result<usize, PlatformError> {
        let mut state = self.state();
        Self::check_table(&state, table)?;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok(before - rows.len())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PlatformError> {
        let mut state = self.state();
        if state
            .failing_upload_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Err(PlatformError::Injected(format!("upload of {path} rejected")));
        }

        let key = (bucket.to_string(), path.to_string());
        if state.objects.contains_key(&key) {
            return Err(PlatformError::Api {
                status: 409,
                body: format!("object {bucket}/{path} already exists"),
            });
        }
        state.objects.insert(
            key,
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(path.to_string())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, PlatformError> {
        if self.object(bucket, path).is_none() {
            return Err(PlatformError::NotFound(format!("object {bucket}/{path}")));
        }
        Ok(format!(
            "memory://{bucket}/{path}?expires_in={expires_in_secs}"
        ))
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<Value, PlatformError> {
        let mut state = self.state();
        state.invocations.push(Invocation {
            function: function.to_string(),
            body,
        });
        if state.failing_functions.contains(function) {
            return Err(PlatformError::Injected(format!("function {function} failed")));
        }
        Ok(serde_json::json!({ "ok": true }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, PlatformError> {
        let user = self
            .state()
            .users
            .get(&email.to_lowercase())
            .cloned()
            .filter(|u| u.password_hash == hash_secret(password))
            .ok_or_else(|| PlatformError::Auth("Invalid login credentials".into()))?;

        let access_token =
            claims::issue_token(user.id, &user.email, &self.jwt_secret, self.token_ttl_secs)
                .map_err(|e| PlatformError::Auth(e.to_string()))?;

        Ok(AuthSession {
            access_token,
            refresh_token: Uuid::new_v4().to_string(),
            expires_in: self.token_ttl_secs,
            user: PlatformUser {
                id: user.id,
                email: user.email,
            },
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), PlatformError> {
        claims::decode_token(access_token, &self.jwt_secret)
            .map_err(|e| PlatformError::Auth(e.to_string()))?;
        self.state()
            .revoked_tokens
            .insert(hash_secret(access_token));
        Ok(())
    }
}
