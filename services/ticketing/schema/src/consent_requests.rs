use sea_orm::entity::prelude::*;

/// A student's consent request for one event, carrying the single active
/// email verification token.
///
/// At most one `pending` row per (event_id, student_id), enforced by a
/// partial unique index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "consent_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub student_id: Uuid,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    /// `pending` | `approved` | `rejected`
    pub status: String,
    pub email_verified: bool,
    pub blockchain_verified: bool,
    pub verification_token: String,
    pub token_expires_at: chrono::DateTime<chrono::Utc>,
    pub token_consumed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub issuance_ticket_id: Option<Uuid>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id"
    )]
    Events,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
