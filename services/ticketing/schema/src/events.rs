use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub date: chrono::NaiveDate,
    pub time: chrono::NaiveTime,
    pub location: String,
    pub description: String,
    /// Organizer display name.
    pub organizer: String,
    pub organizer_id: Uuid,
    pub capacity: i32,
    pub category: String,
    pub image: Option<String>,
    /// `upcoming` | `past` | `cancelled`
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::consent_requests::Entity")]
    ConsentRequests,
    #[sea_orm(has_many = "super::tickets::Entity")]
    Tickets,
}

impl Related<super::consent_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsentRequests.def()
    }
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
