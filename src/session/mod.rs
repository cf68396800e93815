//! Sign-in, session restore and sign-out.
//!
//! A [`Session`] is resolved once at login: the role decides which services the
//! application builds for the rest of its life (see
//! [`AppSystem`](crate::lifecycle::AppSystem)).

use crate::api::{Backend, ClientError};
use crate::model::{MobileRole, Role, UserProfile};
use crate::store::{keys, load_json, save_json, KeyValueStore, StoreError};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The account is not allowed to use the mobile client.
    #[error("This account must use the web portal")]
    WebOnly,

    #[error("Could not save session: {0}")]
    Store(#[from] StoreError),
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub user: UserProfile,
}

impl Session {
    /// Signs in, resolves the role and persists the session.
    ///
    /// Only the credential exchange is bounded by `login_timeout`; when it elapses the
    /// attempt fails with a network error and is not retried.
    #[instrument(skip(backend, store, password))]
    pub async fn login(
        backend: &dyn Backend,
        store: &dyn KeyValueStore,
        login_timeout: Duration,
        email: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::ValidationError(
                "Please enter both email and password".to_string(),
            )
            .into());
        }

        let token = tokio::time::timeout(login_timeout, backend.login(&email, password))
            .await
            .map_err(|_| {
                ClientError::Network(
                    "The server is taking too long to respond".to_string(),
                )
            })??;
        backend.set_token(Some(token.clone()));

        let me = match backend.me().await {
            Ok(me) => me,
            Err(e) => {
                backend.set_token(None);
                return Err(e.into());
            }
        };
        let role = match MobileRole::parse(me.mobile_role.as_deref()) {
            MobileRole::App(role) => role,
            MobileRole::WebOnly => {
                backend.set_token(None);
                warn!("Web-only account refused");
                return Err(SessionError::WebOnly);
            }
        };

        if let Err(e) = Self::persist(store, &token, role, &me.user) {
            backend.set_token(None);
            for key in [keys::USER_TOKEN, keys::USER_ROLE, keys::USER_DATA] {
                let _ = store.remove(key);
            }
            warn!(error = %e, "Could not save session, signed out again");
            return Err(e.into());
        }
        info!(%role, user_id = me.user.id, "Signed in");

        Ok(Session {
            token,
            role,
            user: me.user,
        })
    }

    fn persist(
        store: &dyn KeyValueStore,
        token: &str,
        role: Role,
        user: &UserProfile,
    ) -> Result<(), StoreError> {
        store.set(keys::USER_TOKEN, token)?;
        store.set(keys::USER_ROLE, role.as_str())?;
        save_json(store, keys::USER_DATA, user)
    }

    /// Reads a persisted session. Anything missing or unreadable means "not signed in".
    pub fn restore(store: &dyn KeyValueStore) -> Option<Session> {
        match Self::read(store) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session");
                None
            }
        }
    }

    fn read(store: &dyn KeyValueStore) -> Result<Option<Session>, StoreError> {
        let Some(token) = store.get(keys::USER_TOKEN)?.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let Some(role) = store.get(keys::USER_ROLE)? else {
            return Ok(None);
        };
        let role = match role.as_str() {
            "customer" => Role::Customer,
            "driver" => Role::Driver,
            other => {
                return Err(StoreError::Corrupt {
                    key: keys::USER_ROLE.to_string(),
                    reason: format!("unknown role {other:?}"),
                })
            }
        };
        let Some(user) = load_json::<UserProfile>(store, keys::USER_DATA)? else {
            return Ok(None);
        };
        Ok(Some(Session { token, role, user }))
    }

    /// Clears the persisted session and the cart.
    pub fn logout(store: &dyn KeyValueStore) -> Result<(), StoreError> {
        for key in keys::SESSION {
            store.remove(key)?;
        }
        info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockBackend};
    use crate::model::Me;
    use crate::store::MemoryStore;

    fn me(role: Option<&str>) -> Me {
        Me {
            user: UserProfile {
                id: 5,
                email: "rudo@example.com".into(),
                first_name: "Rudo".into(),
                ..UserProfile::default()
            },
            mobile_role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let mock = MockBackend::new();
        mock.expect_login().return_ok("tok-1".into());
        mock.expect_me().return_ok(me(Some("driver")));
        let store = MemoryStore::new();

        let session = Session::login(&mock, &store, Duration::from_secs(15), "  Rudo@Example.com ", "pw")
            .await
            .unwrap();
        assert_eq!(session.role, Role::Driver);
        assert_eq!(mock.token().as_deref(), Some("tok-1"));
        assert_eq!(
            mock.calls()[0],
            Call::Login {
                email: "rudo@example.com".into()
            }
        );

        assert_eq!(Session::restore(&store), Some(session));
        mock.verify();
    }

    #[tokio::test]
    async fn test_missing_role_defaults_to_customer() {
        let mock = MockBackend::new();
        mock.expect_login().return_ok("tok-2".into());
        mock.expect_me().return_ok(me(None));
        let store = MemoryStore::new();

        let session = Session::login(&mock, &store, Duration::from_secs(15), "a@b.c", "pw")
            .await
            .unwrap();
        assert_eq!(session.role, Role::Customer);
        assert_eq!(store.get(keys::USER_ROLE).unwrap().as_deref(), Some("customer"));
    }

    #[tokio::test]
    async fn test_web_only_account_is_refused() {
        let mock = MockBackend::new();
        mock.expect_login().return_ok("tok-3".into());
        mock.expect_me().return_ok(me(Some("web_only")));
        let store = MemoryStore::new();

        let result = Session::login(&mock, &store, Duration::from_secs(15), "a@b.c", "pw").await;
        assert!(matches!(result, Err(SessionError::WebOnly)));
        assert_eq!(mock.token(), None);
        assert!(Session::restore(&store).is_none());
    }

    /// Accepts every write except the profile, like a disk filling up mid-save.
    struct FullDisk(MemoryStore);

    impl KeyValueStore for FullDisk {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == keys::USER_DATA {
                return Err(std::io::Error::other("no space left on device").into());
            }
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key)
        }
    }

    #[tokio::test]
    async fn test_failed_save_mid_login_leaves_nothing_behind() {
        let mock = MockBackend::new();
        mock.expect_login().return_ok("tok-4".into());
        mock.expect_me().return_ok(me(Some("customer")));
        let store = FullDisk(MemoryStore::new());

        let result = Session::login(&mock, &store, Duration::from_secs(15), "a@b.c", "pw").await;
        assert!(matches!(result, Err(SessionError::Store(StoreError::Io(_)))));
        assert_eq!(mock.token(), None);
        for key in [keys::USER_TOKEN, keys::USER_ROLE, keys::USER_DATA] {
            assert_eq!(store.get(key).unwrap(), None);
        }
        assert!(Session::restore(&store).is_none());
        mock.verify();
    }

    #[tokio::test]
    async fn test_read_only_store_fails_login() {
        let mock = MockBackend::new();
        mock.expect_login().return_ok("tok-5".into());
        mock.expect_me().return_ok(me(Some("driver")));
        let store = MemoryStore::new();
        store.set_read_only(true);

        let result = Session::login(&mock, &store, Duration::from_secs(15), "a@b.c", "pw").await;
        assert!(matches!(result, Err(SessionError::Store(_))));
        assert_eq!(mock.token(), None);
        assert!(Session::restore(&store).is_none());
    }

    #[tokio::test]
    async fn test_empty_credentials_are_validation_errors() {
        let mock = MockBackend::new();
        let store = MemoryStore::new();
        let result = Session::login(&mock, &store, Duration::from_secs(15), "  ", "pw").await;
        assert!(matches!(
            result,
            Err(SessionError::Client(ClientError::ValidationError(_)))
        ));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_timeout_is_network_error() {
        let mock = MockBackend::new();
        mock.expect_login()
            .after(Duration::from_secs(60))
            .return_ok("late".into());
        let store = MemoryStore::new();

        let result = Session::login(&mock, &store, Duration::from_secs(15), "a@b.c", "pw").await;
        assert!(matches!(result, Err(SessionError::Client(ClientError::Network(_)))));
        assert_eq!(mock.token(), None);
    }

    #[test]
    fn test_corrupt_persisted_state_restores_nothing() {
        let store = MemoryStore::new();
        store.set(keys::USER_TOKEN, "tok").unwrap();
        store.set(keys::USER_ROLE, "manager").unwrap();
        store.set(keys::USER_DATA, "{}").unwrap();
        assert!(Session::restore(&store).is_none());

        store.set(keys::USER_ROLE, "customer").unwrap();
        store.set(keys::USER_DATA, "{\"id\": \"not a number\"").unwrap();
        assert!(Session::restore(&store).is_none());

        store.set(keys::USER_DATA, "{\"id\": 4}").unwrap();
        assert_eq!(Session::restore(&store).map(|s| s.role), Some(Role::Customer));
    }

    #[test]
    fn test_logout_clears_everything() {
        let store = MemoryStore::new();
        for key in keys::SESSION {
            store.set(key, "x").unwrap();
        }
        Session::logout(&store).unwrap();
        for key in keys::SESSION {
            assert_eq!(store.get(key).unwrap(), None);
        }
    }
}
