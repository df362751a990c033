//! Examlyx backend access

mod client;
mod error;
#[cfg(test)]
pub mod memory;
mod traits;

pub use client::ApiClient;
pub use error::{ApiError, FieldErrors};
pub use traits::*;

use crate::state::{EntityKind, GroupFlow, LoadedOptions, OptionItem, OptionSource};
use std::sync::Arc;

/// The gateways the app talks to, shareable with spawned tasks
#[derive(Clone)]
pub struct Gateways {
    pub auth: Arc<dyn AuthGateway>,
    pub entities: Arc<dyn EntityGateway>,
    pub locations: Arc<dyn LocationGateway>,
    pub catalog: Arc<dyn ProgramCourseGateway>,
}

impl Gateways {
    /// All four gateways backed by one HTTP client
    pub fn from_client(client: ApiClient) -> Self {
        let client = Arc::new(client);
        Self {
            auth: client.clone(),
            entities: client.clone(),
            locations: client.clone(),
            catalog: client,
        }
    }

    /// Fetch the options for one selection link
    pub async fn load_options(&self, source: OptionSource, key: Option<i64>) -> ApiResult<LoadedOptions> {
        let keyed = |key: Option<i64>| {
            key.ok_or_else(|| ApiError::Decode(format!("{source:?} options need an upstream value")))
        };

        let options = match source {
            OptionSource::Clients => self
                .entities
                .list(EntityKind::Client)
                .await?
                .into_iter()
                .filter(|c| c.is_active)
                .map(|c| OptionItem::new(c.id, c.display_name()))
                .collect(),
            OptionSource::Countries => self.locations.countries().await?,
            OptionSource::States => self.locations.states(keyed(key)?).await?,
            OptionSource::Cities => self.locations.cities(keyed(key)?).await?,
            OptionSource::ClientGroups => return self.client_groups(keyed(key)?).await,
            OptionSource::Courses(GroupFlow::Program) => {
                self.catalog.courses_for_program(keyed(key)?).await?
            }
            OptionSource::Courses(GroupFlow::Batch) => {
                self.catalog.courses_for_batch(keyed(key)?).await?
            }
            OptionSource::Unavailable => Vec::new(),
        };
        Ok(LoadedOptions::plain(options))
    }

    /// Programs or batches of a client, depending on its settings
    async fn client_groups(&self, client_id: i64) -> ApiResult<LoadedOptions> {
        let settings = self.catalog.client_settings(client_id).await?;
        if settings.is_course_program_flow {
            Ok(LoadedOptions {
                options: self.catalog.programs_for_client(client_id).await?,
                flow: Some(GroupFlow::Program),
            })
        } else if settings.is_course_batch_flow {
            Ok(LoadedOptions {
                options: self.catalog.batches_for_client(client_id).await?,
                flow: Some(GroupFlow::Batch),
            })
        } else {
            Ok(LoadedOptions::default())
        }
    }
}
