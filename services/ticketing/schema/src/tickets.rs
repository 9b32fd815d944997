use sea_orm::entity::prelude::*;

/// Ticket issued on approval of a consent request.
///
/// At most one `active` row per (event_id, student_id), enforced by a
/// partial unique index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub student_id: Uuid,
    #[sea_orm(unique)]
    pub consent_request_id: Uuid,
    pub issued_at: chrono::DateTime<chrono::Utc>,
    /// `active` | `used` | `expired`
    pub status: String,
    pub qr_reference: String,
    pub transaction_reference: String,
    /// `real` | `simulated`
    pub issuance_kind: String,
    pub used_at: Option<chrono::DateTime<chrono::Utc>>,
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
