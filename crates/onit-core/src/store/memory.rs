use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthStore, PasswordStore, RefreshTokenStore, UserStore};
use crate::context::RequestContext;
use crate::password::Password;
use crate::token::RefreshToken;
use crate::user::User;
use crate::{Error, Result, TRACING_TARGET_STORE};

/// In-process store keeping every record in memory.
///
/// Cloning is cheap and clones share state. Each operation holds a single
/// lock for its whole duration, which makes consumption and account
/// creation atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    user_names: HashMap<String, Uuid>,
    passwords: HashMap<String, Password>,
    refresh_tokens: HashMap<Uuid, RefreshToken>,
}

impl MemoryState {
    fn user_mut(&mut self, user_id: Uuid) -> Result<&mut User> {
        self.users.get_mut(&user_id).ok_or_else(Error::user_not_found)
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored refresh token of `session_id`, if any.
    pub async fn refresh_token(&self, session_id: Uuid) -> Option<RefreshToken> {
        self.inner.read().await.refresh_tokens.get(&session_id).cloned()
    }

    /// Returns the number of refresh tokens stored for `user_id`.
    pub async fn refresh_token_count(&self, user_id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .refresh_tokens
            .values()
            .filter(|token| token.user_id == user_id)
            .count()
    }
}

impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User> {
        ctx.run(async {
            let state = self.inner.read().await;
            state
                .users
                .get(&user_id)
                .cloned()
                .ok_or_else(Error::user_not_found)
        })
        .await
    }

    async fn find_user_by_name(&self, ctx: &RequestContext, name: &str) -> Result<User> {
        ctx.run(async {
            let state = self.inner.read().await;
            state
                .user_names
                .get(name)
                .and_then(|user_id| state.users.get(user_id))
                .cloned()
                .ok_or_else(Error::user_not_found)
        })
        .await
    }

    async fn insert_user(&self, ctx: &RequestContext, user: &User) -> Result<()> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            if state.users.contains_key(&user.id) || state.user_names.contains_key(&user.name) {
                return Err(Error::bad_request("failed to create user: user already exists"));
            }

            state.user_names.insert(user.name.clone(), user.id);
            state.users.insert(user.id, user.clone());
            Ok(())
        })
        .await
    }

    async fn add_session(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<User> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            let user = state.user_mut(user_id)?;
            user.add_session(session_id);
            Ok(user.clone())
        })
        .await
    }

    async fn remove_session(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<User> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            let user = state.user_mut(user_id)?;
            user.remove_session(session_id);
            Ok(user.clone())
        })
        .await
    }

    async fn clear_sessions(&self, ctx: &RequestContext, user_id: Uuid) -> Result<()> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            if let Some(user) = state.users.get_mut(&user_id) {
                user.sessions.clear();
            }
            Ok(())
        })
        .await
    }
}

impl PasswordStore for MemoryStore {
    async fn find_password_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<Password> {
        ctx.run(async {
            let state = self.inner.read().await;
            state
                .passwords
                .get(username)
                .cloned()
                .ok_or_else(|| Error::not_found("must register first"))
        })
        .await
    }

    async fn insert_password(&self, ctx: &RequestContext, password: &Password) -> Result<()> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            if state.passwords.contains_key(&password.username) {
                return Err(Error::bad_request(
                    "failed to create password: password already exists",
                ));
            }

            state
                .passwords
                .insert(password.username.clone(), password.clone());
            Ok(())
        })
        .await
    }

    async fn update_password(
        &self,
        ctx: &RequestContext,
        username: &str,
        salt: &[u8],
        hashed_password: &[u8],
    ) -> Result<()> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            let password = state
                .passwords
                .get_mut(username)
                .ok_or_else(|| Error::not_found("must register first"))?;

            password.salt = salt.to_vec();
            password.hashed_password = hashed_password.to_vec();
            Ok(())
        })
        .await
    }
}

impl RefreshTokenStore for MemoryStore {
    async fn check_refresh_token(&self, ctx: &RequestContext, session_id: Uuid) -> Result<bool> {
        ctx.run(async {
            let state = self.inner.read().await;
            Ok(state
                .refresh_tokens
                .get(&session_id)
                .is_some_and(|token| !token.consumed))
        })
        .await
    }

    async fn insert_refresh_token(&self, ctx: &RequestContext, token: &RefreshToken) -> Result<()> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            if state.refresh_tokens.contains_key(&token.session_id) {
                return Err(Error::server(
                    "failed to create session: session already exists",
                ));
            }

            state.refresh_tokens.insert(token.session_id, token.clone());
            Ok(())
        })
        .await
    }

    async fn consume_refresh_token(&self, ctx: &RequestContext, session_id: Uuid) -> Result<()> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            match state.refresh_tokens.get_mut(&session_id) {
                Some(token) if !token.consumed => {
                    token.consumed = true;
                    Ok(())
                }
                _ => {
                    tracing::debug!(
                        target: TRACING_TARGET_STORE,
                        session_id = %session_id,
                        "No unconsumed refresh token for session"
                    );
                    Err(Error::session_expired())
                }
            }
        })
        .await
    }

    async fn delete_refresh_tokens_by_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> Result<u64> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            let before = state.refresh_tokens.len();
            state
                .refresh_tokens
                .retain(|_, token| token.user_id != user_id);
            Ok((before - state.refresh_tokens.len()) as u64)
        })
        .await
    }
}

impl AuthStore for MemoryStore {
    async fn insert_account(
        &self,
        ctx: &RequestContext,
        user: &User,
        password: &Password,
    ) -> Result<()> {
        ctx.run(async {
            let mut state = self.inner.write().await;
            if state.users.contains_key(&user.id) || state.user_names.contains_key(&user.name) {
                return Err(Error::bad_request("failed to create user: user already exists"));
            }
            if state.passwords.contains_key(&password.username) {
                return Err(Error::bad_request(
                    "failed to create password: password already exists",
                ));
            }

            state.user_names.insert(user.name.clone(), user.id);
            state.users.insert(user.id, user.clone());
            state
                .passwords
                .insert(password.username.clone(), password.clone());
            Ok(())
        })
        .await
    }
}
