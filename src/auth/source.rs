use std::fmt;

use crate::util::subscribe::{ResultCallback, Subscription};

/// Receives the signed-in user, or `None` after a sign-out.
pub type AuthStateCallback<U, E> = ResultCallback<Option<U>, E>;

/// The auth instance an [`AuthStateHook`](crate::auth::AuthStateHook) observes.
pub trait AuthSource: Clone + Send + Sync + 'static {
    type User: Clone + Send + Sync + 'static;
    type Error: Clone + fmt::Debug + Send + Sync + 'static;

    /// Whether both handles belong to the same auth instance.
    fn is_equal(&self, other: &Self) -> bool;

    fn current_user(&self) -> Option<Self::User>;

    fn on_auth_state_changed(
        &self,
        callback: AuthStateCallback<Self::User, Self::Error>,
    ) -> Result<Subscription, Self::Error>;

    /// Like [`AuthSource::on_auth_state_changed`], but also fires when the signed-in user's ID
    /// token is refreshed.
    fn on_id_token_changed(
        &self,
        callback: AuthStateCallback<Self::User, Self::Error>,
    ) -> Result<Subscription, Self::Error>;
}
