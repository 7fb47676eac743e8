//! Multi-index store with atomic single-use code claims.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::record::{ConsentKey, TokenRecord};

/// Store over issued token records, indexed by every credential a record
/// carries.
///
/// All indices sit behind one mutex: a record inserted by [`store`] is
/// either visible through all of its credentials or through none of them,
/// and [`claim_code`] is a single check-and-mark that returns `true`
/// exactly once per code under any interleaving.
///
/// [`store`]: TokenStore::store
/// [`claim_code`]: TokenStore::claim_code
#[derive(Debug, Default)]
pub struct TokenStore {
    indices: Mutex<Indices>,
}

#[derive(Debug, Default)]
struct Indices {
    by_access_token: HashMap<String, Arc<TokenRecord>>,
    by_refresh_token: HashMap<String, Arc<TokenRecord>>,
    by_code: HashMap<String, Arc<TokenRecord>>,
    by_consent: HashMap<ConsentKey, Arc<TokenRecord>>,
    used_codes: HashSet<String>,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under its access token, its refresh token when it
    /// has one, and the optional authorization code and consent identity,
    /// all inside one critical section.
    pub fn store(&self, record: TokenRecord, code: Option<String>, consent: Option<ConsentKey>) {
        let record = Arc::new(record);
        let mut indices = self.lock();
        indices
            .by_access_token
            .insert(record.response().access_token.clone(), Arc::clone(&record));
        if let Some(refresh) = record.response().refresh_token.clone() {
            indices.by_refresh_token.insert(refresh, Arc::clone(&record));
        }
        if let Some(code) = code {
            indices.by_code.insert(code, Arc::clone(&record));
        }
        if let Some(consent) = consent {
            indices.by_consent.insert(consent, record);
        }
    }

    /// Looks up the record behind an access token.
    #[must_use]
    pub fn get_by_access_token(&self, token: &str) -> Option<Arc<TokenRecord>> {
        self.live(self.lock().by_access_token.get(token).cloned())
    }

    /// Looks up the record behind a refresh token.
    #[must_use]
    pub fn get_by_refresh_token(&self, token: &str) -> Option<Arc<TokenRecord>> {
        self.live(self.lock().by_refresh_token.get(token).cloned())
    }

    /// Looks up the record behind an authorization code. The code may
    /// already have been claimed; callers decide via [`claim_code`].
    ///
    /// [`claim_code`]: TokenStore::claim_code
    #[must_use]
    pub fn get_by_code(&self, code: &str) -> Option<Arc<TokenRecord>> {
        self.live(self.lock().by_code.get(code).cloned())
    }

    /// Looks up the record behind a prior consent grant.
    #[must_use]
    pub fn get_by_consent(&self, consent: &ConsentKey) -> Option<Arc<TokenRecord>> {
        self.live(self.lock().by_consent.get(consent).cloned())
    }

    /// Marks a code as exchanged. Returns `true` for the first caller and
    /// `false` forever after, no matter how many threads race on it.
    pub fn claim_code(&self, code: &str) -> bool {
        self.lock().used_codes.insert(code.to_owned())
    }

    /// Drops the access-token index entry. Other indices keep the record.
    pub fn remove_access_token(&self, token: &str) -> bool {
        self.lock().by_access_token.remove(token).is_some()
    }

    /// Drops the refresh-token index entry. Other indices keep the record.
    pub fn remove_refresh_token(&self, token: &str) -> bool {
        self.lock().by_refresh_token.remove(token).is_some()
    }

    /// Drops the code index entry. A claim made earlier stays on record.
    pub fn remove_code(&self, code: &str) -> bool {
        self.lock().by_code.remove(code).is_some()
    }

    fn live(&self, record: Option<Arc<TokenRecord>>) -> Option<Arc<TokenRecord>> {
        record.filter(|r| !r.is_expired_at(Utc::now()))
    }

    fn lock(&self) -> MutexGuard<'_, Indices> {
        self.indices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TokenResponse;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Barrier;
    use std::thread;

    fn record(access_token: &str, refresh_token: Option<&str>) -> TokenRecord {
        let response = TokenResponse {
            access_token: access_token.to_owned(),
            refresh_token: refresh_token.map(str::to_owned),
            id_token: None,
            token_type: "Bearer".to_owned(),
            expires_in: 300,
            scope: Some("openid".to_owned()),
        };
        TokenRecord::new(
            response,
            json!({"sub": "alice"}),
            Utc::now(),
            Duration::seconds(300),
        )
    }

    fn consent() -> ConsentKey {
        ConsentKey::new("alice", "client-1", &["openid".to_owned()])
    }

    #[test]
    fn stored_record_is_visible_through_every_index() {
        let store = TokenStore::new();
        store.store(
            record("at-1", Some("rt-1")),
            Some("code-1".to_owned()),
            Some(consent()),
        );

        assert!(store.get_by_access_token("at-1").is_some());
        assert!(store.get_by_refresh_token("rt-1").is_some());
        assert!(store.get_by_code("code-1").is_some());
        assert!(store.get_by_consent(&consent()).is_some());
    }

    #[test]
    fn record_without_refresh_code_or_consent_is_only_under_its_access_token() {
        let store = TokenStore::new();
        store.store(record("at-1", None), None, None);

        assert!(store.get_by_access_token("at-1").is_some());
        assert!(store.get_by_refresh_token("at-1").is_none());
        assert!(store.get_by_code("at-1").is_none());
        assert!(store.get_by_consent(&consent()).is_none());
    }

    #[test]
    fn consent_lookup_is_insensitive_to_scope_order() {
        let store = TokenStore::new();
        let granted = ConsentKey::new(
            "alice",
            "client-1",
            &["profile".to_owned(), "openid".to_owned()],
        );
        store.store(record("at-1", None), None, Some(granted));

        let asked = ConsentKey::new(
            "alice",
            "client-1",
            &[
                "openid".to_owned(),
                "profile".to_owned(),
                "openid".to_owned(),
            ],
        );
        assert!(store.get_by_consent(&asked).is_some());
    }

    #[test]
    fn claim_code_returns_true_exactly_once() {
        let store = TokenStore::new();
        assert!(store.claim_code("code-1"));
        assert!(!store.claim_code("code-1"));
        assert!(store.claim_code("code-2"));
    }

    #[test]
    fn claim_code_is_atomic_across_threads() {
        let store = Arc::new(TokenStore::new());
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.claim_code("contested")
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn a_record_is_never_partially_visible() {
        let store = Arc::new(TokenStore::new());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..200 {
                    let refresh = format!("rt-{i}");
                    store.store(
                        record(&format!("at-{i}"), Some(refresh.as_str())),
                        Some(format!("code-{i}")),
                        None,
                    );
                }
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..20 {
                    for i in 0..200 {
                        if let Some(found) = store.get_by_code(&format!("code-{i}")) {
                            let access = &found.response().access_token;
                            assert!(store.get_by_access_token(access).is_some());
                            assert!(store.get_by_refresh_token(&format!("rt-{i}")).is_some());
                        }
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }

    #[test]
    fn removing_one_index_does_not_cascade() {
        let store = TokenStore::new();
        store.store(
            record("at-1", Some("rt-1")),
            Some("code-1".to_owned()),
            Some(consent()),
        );

        assert!(store.remove_access_token("at-1"));
        assert!(store.get_by_access_token("at-1").is_none());
        assert!(store.get_by_refresh_token("rt-1").is_some());
        assert!(store.get_by_code("code-1").is_some());
        assert!(store.get_by_consent(&consent()).is_some());

        assert!(!store.remove_access_token("at-1"));
    }

    #[test]
    fn claimed_codes_stay_claimed_after_removal() {
        let store = TokenStore::new();
        store.store(record("at-1", None), Some("code-1".to_owned()), None);

        assert!(store.claim_code("code-1"));
        assert!(store.remove_code("code-1"));
        assert!(!store.claim_code("code-1"));
    }

    #[test]
    fn expired_records_are_invisible() {
        let store = TokenStore::new();
        let stale = TokenRecord::new(
            TokenResponse {
                access_token: "at-old".to_owned(),
                refresh_token: Some("rt-old".to_owned()),
                id_token: None,
                token_type: "Bearer".to_owned(),
                expires_in: 300,
                scope: None,
            },
            json!({"sub": "alice"}),
            Utc::now() - Duration::seconds(600),
            Duration::seconds(300),
        );
        store.store(stale, Some("code-old".to_owned()), None);

        assert!(store.get_by_access_token("at-old").is_none());
        assert!(store.get_by_refresh_token("rt-old").is_none());
        assert!(store.get_by_code("code-old").is_none());
    }
}
