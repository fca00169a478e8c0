//! SeaORM implementation of StationRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tracing::debug;

use crate::domain::{DomainResult, Station, StationRepository};
use crate::infrastructure::database::entities::station;

pub struct SeaOrmStationRepository {
    db: DatabaseConnection,
}

impl SeaOrmStationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: station::Model) -> Station {
    Station {
        id: m.id,
        name: m.name,
        capacity: u32::try_from(m.capacity).unwrap_or(0),
        is_active: m.is_active,
    }
}

#[async_trait]
impl StationRepository for SeaOrmStationRepository {
    async fn save(&self, s: Station) -> DomainResult<()> {
        debug!(station_id = %s.id, "Saving station");

        let model = station::ActiveModel {
            id: Set(s.id),
            name: Set(s.name),
            capacity: Set(i32::try_from(s.capacity).unwrap_or(i32::MAX)),
            is_active: Set(s.is_active),
        };
        station::Entity::insert(model)
            .on_conflict(
                OnConflict::column(station::Column::Id)
                    .update_columns([
                        station::Column::Name,
                        station::Column::Capacity,
                        station::Column::IsActive,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>> {
        let model = station::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }
}
