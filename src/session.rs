use crate::backend::{AuthUser, RemoteBackend};
use crate::error::{AppError, Result};

/// Who is calling. Passed to every operation that needs an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<AuthUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    /// Look the token up once. Any failure yields an anonymous session.
    pub async fn resolve(backend: &dyn RemoteBackend, access_token: Option<&str>) -> Self {
        let Some(token) = access_token else {
            return Self::anonymous();
        };
        match backend.get_user(token).await {
            Ok(Some(user)) => Self::authenticated(user),
            Ok(None) => {
                tracing::warn!("Access token has no active session");
                Self::anonymous()
            }
            Err(e) => {
                tracing::error!("Failed to resolve session: {}", e);
                Self::anonymous()
            }
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn require_user(&self) -> Result<&AuthUser> {
        self.user.as_ref().ok_or(AppError::Unauthenticated)
    }
}
