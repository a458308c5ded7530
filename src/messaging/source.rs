use std::fmt;

use async_trait::async_trait;

/// The messaging instance a [`TokenHook`](crate::messaging::TokenHook) asks for a registration
/// token.
#[async_trait]
pub trait MessagingSource: Clone + Send + Sync + 'static {
    type Error: Clone + fmt::Debug + Send + Sync + 'static;

    /// Whether both handles belong to the same messaging instance.
    fn is_equal(&self, other: &Self) -> bool;

    async fn get_token(&self, vapid_key: Option<&str>) -> Result<String, Self::Error>;
}
