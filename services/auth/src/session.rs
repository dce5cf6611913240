//! Session resolution with access-token rotation

use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    error::AuthError,
    jwt::TokenKind,
    models::User,
    repositories::UserStore,
    tokens::{TokenError, TokenService},
};

/// Outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: User,
    /// Set when the access token was refused and a new one was minted from
    /// the refresh token; the caller must hand it back to the client.
    pub rotated_access_token: Option<String>,
}

/// Resolves the acting user from the presented tokens
#[derive(Clone)]
pub struct SessionResolver {
    tokens: TokenService,
    users: Arc<dyn UserStore>,
}

impl SessionResolver {
    /// Create a new session resolver
    pub fn new(tokens: TokenService, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Resolve the current user.
    ///
    /// A valid access token wins. Otherwise a valid refresh token yields a
    /// freshly issued access token. Anything else is `Unauthorized`; a
    /// blocked account is `Forbidden` on every path.
    pub async fn resolve(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<ResolvedSession, AuthError> {
        self.resolve_candidates(access_token.as_slice(), refresh_token)
            .await
    }

    /// Same as [`Self::resolve`], with several access tokens tried in order.
    /// The first one accepted wins; rotation only happens when all are refused.
    pub async fn resolve_candidates(
        &self,
        access_tokens: &[&str],
        refresh_token: Option<&str>,
    ) -> Result<ResolvedSession, AuthError> {
        for token in access_tokens {
            match self.tokens.validate(token).await {
                Ok(claims) if claims.kind() == TokenKind::Access => {
                    let user = self.active_user(&claims.login).await?;
                    return Ok(ResolvedSession {
                        user,
                        rotated_access_token: None,
                    });
                }
                Ok(_) => debug!("Refresh token presented as access token"),
                Err(TokenError::Store(e)) => return Err(TokenError::Store(e).into()),
                Err(e) => debug!("Access token rejected: {}", e),
            }
        }

        let token = refresh_token.ok_or(AuthError::Unauthorized)?;
        let claims = self.tokens.validate(token).await?;
        if claims.kind() != TokenKind::Refresh {
            debug!("Access token presented as refresh token");
            return Err(AuthError::Unauthorized);
        }

        let user = self.active_user(&claims.login).await?;
        let access_token = self.tokens.issue(&user, TokenKind::Access).await?;
        info!("Rotated access token for user {}", user.login);

        Ok(ResolvedSession {
            user,
            rotated_access_token: Some(access_token),
        })
    }

    async fn active_user(&self, login: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .find_active_by_login(login)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if user.is_blocked {
            info!("Blocked user {} refused", user.login);
            return Err(AuthError::forbidden("user is blocked"));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{JwtConfig, JwtService};
    use crate::models::NewUser;
    use crate::repositories::{InMemoryTokenStore, InMemoryUserStore};
    use chrono::{Duration, Utc};
    use jsonwebtoken::Algorithm;

    struct Fixture {
        resolver: SessionResolver,
        tokens: TokenService,
        users: Arc<InMemoryUserStore>,
        store: Arc<InMemoryTokenStore>,
    }

    fn jwt(access: Duration, refresh: Duration) -> JwtService {
        JwtService::new(JwtConfig {
            secret: "session-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_lifetime: access,
            refresh_token_lifetime: refresh,
        })
        .unwrap()
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let store = Arc::new(InMemoryTokenStore::new());
        let tokens = TokenService::new(jwt(Duration::days(1), Duration::days(30)), store.clone());

        Fixture {
            resolver: SessionResolver::new(tokens.clone(), users.clone()),
            tokens,
            users,
            store,
        }
    }

    impl Fixture {
        /// Issue a token whose lifetime ran out before now
        async fn expired(&self, user: &User, kind: TokenKind) -> String {
            let issued_at = Utc::now() - Duration::days(31);
            self.tokens.issue_at(user, kind, issued_at).await.unwrap()
        }
    }

    async fn create_user(users: &InMemoryUserStore, login: &str) -> User {
        users
            .create(&NewUser {
                login: login.to_string(),
                mail: format!("{}@example.com", login),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_access_token_resolves_without_rotation() {
        let f = fixture();
        let user = create_user(&f.users, "alice").await;
        let access = f.tokens.issue(&user, TokenKind::Access).await.unwrap();

        let session = f.resolver.resolve(Some(&access), None).await.unwrap();

        assert_eq!(session.user.id, user.id);
        assert!(session.rotated_access_token.is_none());
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_access_with_valid_refresh_rotates() {
        let f = fixture();
        let user = create_user(&f.users, "alice").await;
        let access = f.expired(&user, TokenKind::Access).await;
        let refresh = f.tokens.issue(&user, TokenKind::Refresh).await.unwrap();

        let session = f.resolver.resolve(Some(&access), Some(&refresh)).await.unwrap();

        assert_eq!(session.user.id, user.id);
        let rotated = session.rotated_access_token.expect("new access token");
        let claims = f.tokens.validate(&rotated).await.unwrap();
        assert_eq!(claims.login, "alice");
        assert!(!claims.is_refresh);
        assert_eq!(f.store.len().await, 3);
    }

    #[tokio::test]
    async fn test_missing_access_with_valid_refresh_rotates() {
        let f = fixture();
        let user = create_user(&f.users, "alice").await;
        let refresh = f.tokens.issue(&user, TokenKind::Refresh).await.unwrap();

        let session = f.resolver.resolve(None, Some(&refresh)).await.unwrap();
        assert!(session.rotated_access_token.is_some());
    }

    #[tokio::test]
    async fn test_blocked_user_refresh_is_forbidden() {
        let f = fixture();
        let user = create_user(&f.users, "mallory").await;
        let refresh = f.tokens.issue(&user, TokenKind::Refresh).await.unwrap();
        f.users.set_blocked(user.id, true).await.unwrap();

        let err = f.resolver.resolve(Some("garbage"), Some(&refresh)).await.unwrap_err();

        assert!(matches!(err, AuthError::Forbidden(_)));
        // No access token was minted for the blocked user
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_blocked_user_access_is_forbidden() {
        let f = fixture();
        let user = create_user(&f.users, "mallory").await;
        let access = f.tokens.issue(&user, TokenKind::Access).await.unwrap();
        f.users.set_blocked(user.id, true).await.unwrap();

        let err = f.resolver.resolve(Some(&access), None).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_both_tokens_invalid_is_unauthorized() {
        let f = fixture();
        let user = create_user(&f.users, "alice").await;
        let access = f.expired(&user, TokenKind::Access).await;
        let refresh = f.expired(&user, TokenKind::Refresh).await;

        let err = f.resolver.resolve(Some(&access), Some(&refresh)).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));

        let err = f.resolver.resolve(None, None).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));

        let err = f.resolver.resolve(Some("a"), Some("b")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_later_access_candidate_is_used_when_first_is_refused() {
        let f = fixture();
        let user = create_user(&f.users, "alice").await;
        let stale = f.expired(&user, TokenKind::Access).await;
        let access = f.tokens.issue(&user, TokenKind::Access).await.unwrap();

        let session = f
            .resolver
            .resolve_candidates(&[stale.as_str(), access.as_str()], None)
            .await
            .unwrap();

        assert_eq!(session.user.id, user.id);
        assert!(session.rotated_access_token.is_none());
        assert_eq!(f.store.len().await, 2);
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthorized() {
        let f = fixture();
        let user = create_user(&f.users, "ghost").await;
        let access = f.tokens.issue(&user, TokenKind::Access).await.unwrap();
        let refresh = f.tokens.issue(&user, TokenKind::Refresh).await.unwrap();
        f.users.soft_delete(user.id).await.unwrap();

        let err = f.resolver.resolve(Some(&access), None).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
        let err = f.resolver.resolve(None, Some(&refresh)).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_token_kinds_are_not_interchangeable() {
        let f = fixture();
        let user = create_user(&f.users, "alice").await;
        let access = f.tokens.issue(&user, TokenKind::Access).await.unwrap();
        let refresh = f.tokens.issue(&user, TokenKind::Refresh).await.unwrap();

        // A refresh token in the access slot only works through rotation
        let session = f.resolver.resolve(Some(&refresh), Some(&refresh)).await.unwrap();
        assert!(session.rotated_access_token.is_some());

        let err = f.resolver.resolve(None, Some(&access)).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }
}
