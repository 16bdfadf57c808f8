//! Application layer: commands and queries served through the decoration pipeline.

pub mod command;
pub mod query;

use std::sync::Arc;

pub use command::{
    Commands, CreateOwner, CreateProperty, DeleteOwner, DeleteProperty, UpdateOwner,
    UpdateProperty,
};
pub use query::{GetOwner, GetProperty, ListPropertiesByCategory, ListPropertiesByOwner, Queries};

use crate::domain::{OwnerRepository, PropertyRepository};

#[derive(Clone)]
pub struct Application {
    pub commands: Commands,
    pub queries: Queries,
}

impl Application {
    #[must_use]
    pub fn new(
        properties: &Arc<dyn PropertyRepository>,
        owners: &Arc<dyn OwnerRepository>,
    ) -> Self {
        Self {
            commands: Commands::new(properties, owners),
            queries: Queries::new(properties, owners),
        }
    }
}
