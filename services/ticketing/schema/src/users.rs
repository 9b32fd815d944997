use sea_orm::entity::prelude::*;

/// Student or club administrator account. Provisioned outside the consent
/// workflow; never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Stored lowercased.
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub role: i16,
    pub wallet_address: Option<String>,
    pub department: Option<String>,
    pub verified: bool,
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
