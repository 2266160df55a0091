use async_trait::async_trait;

use crate::models::Coordinates;
use crate::{Result, TintwaveError};

/// Best-effort source of the device position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates>;
}

/// A position known up front, or `None` when access was denied
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPosition(pub Option<Coordinates>);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates> {
        self.0
            .ok_or_else(|| TintwaveError::validation("Location access denied"))
    }
}
