use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionError, TransactionTrait, sea_query::Expr,
};

use campustix_domain::consent::ConsentStatus;
use campustix_domain::event::EventStatus;
use campustix_domain::id::{ConsentRequestId, EventId, TicketId, UserId};
use campustix_domain::ledger::{Issuance, TransactionReference, WalletAddress};
use campustix_domain::ticket::TicketStatus;
use campustix_domain::user::{UserRole, normalize_email};
use campustix_ticketing_schema::{consent_requests, events, tickets, users};

use crate::domain::repository::{
    ConsentRequestRepository, EventRepository, TicketRepository, UserRepository,
};
use crate::domain::types::{ApprovalOutcome, ConsentRequest, Event, EventFilter, Ticket, User};
use crate::error::TicketingError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, TicketingError> {
        let model = users::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, TicketingError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn create(&self, user: &User) -> Result<(), TicketingError> {
        users::ActiveModel {
            id: Set(user.id.as_uuid()),
            email: Set(normalize_email(&user.email)),
            name: Set(user.name.clone()),
            role: Set(i16::from(user.role.as_u8())),
            wallet_address: Set(user.wallet_address.as_ref().map(ToString::to_string)),
            department: Set(user.department.clone()),
            verified: Set(user.verified),
            created_at: Set(user.created_at),
            updated_at: Set(user.created_at),
        }
        .insert(&self.db)
        .await
        .context("create user")?;
        Ok(())
    }

    async fn update_wallet_address(
        &self,
        id: UserId,
        address: &WalletAddress,
    ) -> Result<(), TicketingError> {
        users::Entity::update_many()
            .col_expr(
                users::Column::WalletAddress,
                Expr::value(Some(address.to_string())),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.as_uuid()))
            .exec(&self.db)
            .await
            .context("update wallet address")?;
        Ok(())
    }
}

fn user_from_model(model: users::Model) -> Result<User, TicketingError> {
    let role = u8::try_from(model.role)
        .ok()
        .and_then(UserRole::from_u8)
        .with_context(|| format!("unknown role {} for user {}", model.role, model.id))?;
    let wallet_address = model
        .wallet_address
        .as_deref()
        .map(WalletAddress::parse)
        .transpose()
        .with_context(|| format!("stored wallet address of user {}", model.id))?;
    Ok(User {
        id: UserId(model.id),
        email: model.email,
        name: model.name,
        role,
        wallet_address,
        department: model.department,
        verified: model.verified,
        created_at: model.created_at,
    })
}

// ── Event repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEventRepository {
    pub db: DatabaseConnection,
}

impl EventRepository for DbEventRepository {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, TicketingError> {
        let model = events::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find event by id")?;
        model.map(event_from_model).transpose()
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, TicketingError> {
        let mut query = events::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(events::Column::Status.eq(status.as_str()));
        }
        if let Some(category) = filter.category {
            query = query.filter(events::Column::Category.eq(category.as_str()));
        }
        if let Some(organizer_id) = filter.organizer_id {
            query = query.filter(events::Column::OrganizerId.eq(organizer_id.as_uuid()));
        }
        let models = query
            .order_by_asc(events::Column::Date)
            .order_by_asc(events::Column::Time)
            .all(&self.db)
            .await
            .context("list events")?;
        models.into_iter().map(event_from_model).collect()
    }

    async fn create(&self, event: &Event) -> Result<(), TicketingError> {
        events::ActiveModel {
            id: Set(event.id.as_uuid()),
            name: Set(event.name.clone()),
            date: Set(event.date),
            time: Set(event.time),
            location: Set(event.location.clone()),
            description: Set(event.description.clone()),
            organizer: Set(event.organizer.clone()),
            organizer_id: Set(event.organizer_id.as_uuid()),
            capacity: Set(i32::try_from(event.capacity).context("event capacity out of range")?),
            category: Set(event.category.as_str().to_owned()),
            image: Set(event.image.clone()),
            status: Set(event.status.as_str().to_owned()),
            created_at: Set(event.created_at),
            updated_at: Set(event.created_at),
        }
        .insert(&self.db)
        .await
        .context("create event")?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: EventId,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<bool, TicketingError> {
        let result = events::Entity::update_many()
            .col_expr(events::Column::Status, Expr::value(to.as_str()))
            .col_expr(events::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(events::Column::Id.eq(id.as_uuid()))
            .filter(events::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .context("update event status")?;
        Ok(result.rows_affected > 0)
    }
}

fn event_from_model(model: events::Model) -> Result<Event, TicketingError> {
    Ok(Event {
        id: EventId(model.id),
        capacity: u32::try_from(model.capacity)
            .with_context(|| format!("negative capacity for event {}", model.id))?,
        category: model.category.parse().context("stored event category")?,
        status: model.status.parse().context("stored event status")?,
        name: model.name,
        date: model.date,
        time: model.time,
        location: model.location,
        description: model.description,
        organizer: model.organizer,
        organizer_id: UserId(model.organizer_id),
        image: model.image,
        created_at: model.created_at,
    })
}

// ── Consent request repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbConsentRequestRepository {
    pub db: DatabaseConnection,
}

impl ConsentRequestRepository for DbConsentRequestRepository {
    async fn create(&self, request: &ConsentRequest) -> Result<(), TicketingError> {
        consent_requests::ActiveModel {
            id: Set(request.id.as_uuid()),
            event_id: Set(request.event_id.as_uuid()),
            student_id: Set(request.student_id.as_uuid()),
            requested_at: Set(request.requested_at),
            status: Set(request.status.as_str().to_owned()),
            email_verified: Set(request.email_verified),
            blockchain_verified: Set(request.blockchain_verified),
            verification_token: Set(request.verification_token.clone()),
            token_expires_at: Set(request.token_expires_at),
            token_consumed_at: Set(request.token_consumed_at),
            issuance_ticket_id: Set(request.issuance_ticket_id.map(|t| t.as_uuid())),
            updated_at: Set(request.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            // Another process opened a request for the same pair.
            Some(SqlErr::UniqueConstraintViolation(_)) => TicketingError::ConsentAlreadyExists,
            _ => anyhow::Error::new(e).context("create consent request").into(),
        })?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ConsentRequestId,
    ) -> Result<Option<ConsentRequest>, TicketingError> {
        let model = consent_requests::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find consent request by id")?;
        model.map(consent_request_from_model).transpose()
    }

    async fn list_by_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<ConsentRequest>, TicketingError> {
        let models = consent_requests::Entity::find()
            .filter(consent_requests::Column::StudentId.eq(student_id.as_uuid()))
            .order_by_desc(consent_requests::Column::RequestedAt)
            .all(&self.db)
            .await
            .context("list consent requests by student")?;
        models.into_iter().map(consent_request_from_model).collect()
    }

    async fn list_by_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<ConsentRequest>, TicketingError> {
        let models = consent_requests::Entity::find()
            .filter(consent_requests::Column::EventId.eq(event_id.as_uuid()))
            .order_by_desc(consent_requests::Column::RequestedAt)
            .all(&self.db)
            .await
            .context("list consent requests by event")?;
        models.into_iter().map(consent_request_from_model).collect()
    }

    async fn find_open(
        &self,
        event_id: EventId,
        student_id: UserId,
    ) -> Result<Option<ConsentRequest>, TicketingError> {
        let model = consent_requests::Entity::find()
            .filter(consent_requests::Column::EventId.eq(event_id.as_uuid()))
            .filter(consent_requests::Column::StudentId.eq(student_id.as_uuid()))
            .filter(consent_requests::Column::Status.eq(ConsentStatus::Pending.as_str()))
            .one(&self.db)
            .await
            .context("find open consent request")?;
        model.map(consent_request_from_model).transpose()
    }

    async fn mark_email_verified(
        &self,
        id: ConsentRequestId,
        token: &str,
    ) -> Result<bool, TicketingError> {
        let now = Utc::now();
        let result = consent_requests::Entity::update_many()
            .col_expr(consent_requests::Column::EmailVerified, Expr::value(true))
            .col_expr(consent_requests::Column::TokenConsumedAt, Expr::value(now))
            .col_expr(consent_requests::Column::UpdatedAt, Expr::value(now))
            .filter(consent_requests::Column::Id.eq(id.as_uuid()))
            .filter(consent_requests::Column::VerificationToken.eq(token))
            .filter(consent_requests::Column::TokenConsumedAt.is_null())
            .filter(consent_requests::Column::Status.eq(ConsentStatus::Pending.as_str()))
            .filter(consent_requests::Column::EmailVerified.eq(false))
            .exec(&self.db)
            .await
            .context("mark email verified")?;
        Ok(result.rows_affected > 0)
    }

    async fn replace_token(
        &self,
        id: ConsentRequestId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, TicketingError> {
        let result = consent_requests::Entity::update_many()
            .col_expr(consent_requests::Column::VerificationToken, Expr::value(token))
            .col_expr(consent_requests::Column::TokenExpiresAt, Expr::value(expires_at))
            .col_expr(consent_requests::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(consent_requests::Column::Id.eq(id.as_uuid()))
            .filter(consent_requests::Column::Status.eq(ConsentStatus::Pending.as_str()))
            .filter(consent_requests::Column::EmailVerified.eq(false))
            .exec(&self.db)
            .await
            .context("replace verification token")?;
        Ok(result.rows_affected > 0)
    }

    async fn reserve_issuance_ticket_id(
        &self,
        id: ConsentRequestId,
        ticket_id: TicketId,
    ) -> Result<bool, TicketingError> {
        let result = consent_requests::Entity::update_many()
            .col_expr(
                consent_requests::Column::IssuanceTicketId,
                Expr::value(Some(ticket_id.as_uuid())),
            )
            .col_expr(consent_requests::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(consent_requests::Column::Id.eq(id.as_uuid()))
            .filter(consent_requests::Column::IssuanceTicketId.is_null())
            .exec(&self.db)
            .await
            .context("reserve issuance ticket id")?;
        Ok(result.rows_affected > 0)
    }

    async fn reject(&self, id: ConsentRequestId) -> Result<bool, TicketingError> {
        let result = consent_requests::Entity::update_many()
            .col_expr(
                consent_requests::Column::Status,
                Expr::value(ConsentStatus::Rejected.as_str()),
            )
            .col_expr(consent_requests::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(consent_requests::Column::Id.eq(id.as_uuid()))
            .filter(consent_requests::Column::Status.eq(ConsentStatus::Pending.as_str()))
            .exec(&self.db)
            .await
            .context("reject consent request")?;
        Ok(result.rows_affected > 0)
    }

    async fn approve_with_ticket(
        &self,
        id: ConsentRequestId,
        ticket: &Ticket,
        capacity: u32,
    ) -> Result<ApprovalOutcome, TicketingError> {
        let result = self
            .db
            .transaction::<_, ApprovalOutcome, DbErr>(|txn| {
                let ticket = ticket.clone();
                Box::pin(async move {
                    lock_event(txn, ticket.event_id).await?;
                    if active_ticket_exists(txn, ticket.event_id, ticket.student_id).await? {
                        return Ok(ApprovalOutcome::TicketExists);
                    }
                    if count_issued(txn, ticket.event_id).await? >= u64::from(capacity) {
                        return Ok(ApprovalOutcome::EventFull);
                    }
                    if !approve_request(txn, id).await? {
                        return Ok(ApprovalOutcome::NotPending);
                    }
                    insert_ticket(txn, &ticket).await?;
                    Ok(ApprovalOutcome::Approved)
                })
            })
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            // Lost the race on the partial unique index over active tickets.
            Err(TransactionError::Transaction(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                Ok(ApprovalOutcome::TicketExists)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("approve consent request with ticket")
                .into()),
        }
    }
}

/// `SELECT ... FOR UPDATE` on the event row, held until the transaction ends.
async fn lock_event(txn: &DatabaseTransaction, event_id: EventId) -> Result<(), DbErr> {
    events::Entity::find_by_id(event_id.as_uuid())
        .lock_exclusive()
        .one(txn)
        .await?;
    Ok(())
}

async fn count_issued<C: ConnectionTrait>(db: &C, event_id: EventId) -> Result<u64, DbErr> {
    tickets::Entity::find()
        .filter(tickets::Column::EventId.eq(event_id.as_uuid()))
        .filter(tickets::Column::Status.is_in([
            TicketStatus::Active.as_str(),
            TicketStatus::Used.as_str(),
        ]))
        .count(db)
        .await
}

async fn active_ticket_exists(
    txn: &DatabaseTransaction,
    event_id: EventId,
    student_id: UserId,
) -> Result<bool, DbErr> {
    let count = tickets::Entity::find()
        .filter(tickets::Column::EventId.eq(event_id.as_uuid()))
        .filter(tickets::Column::StudentId.eq(student_id.as_uuid()))
        .filter(tickets::Column::Status.eq(TicketStatus::Active.as_str()))
        .count(txn)
        .await?;
    Ok(count > 0)
}

async fn approve_request(txn: &DatabaseTransaction, id: ConsentRequestId) -> Result<bool, DbErr> {
    let result = consent_requests::Entity::update_many()
        .col_expr(
            consent_requests::Column::Status,
            Expr::value(ConsentStatus::Approved.as_str()),
        )
        .col_expr(consent_requests::Column::BlockchainVerified, Expr::value(true))
        .col_expr(consent_requests::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(consent_requests::Column::Id.eq(id.as_uuid()))
        .filter(consent_requests::Column::Status.eq(ConsentStatus::Pending.as_str()))
        .filter(consent_requests::Column::EmailVerified.eq(true))
        .exec(txn)
        .await?;
    Ok(result.rows_affected > 0)
}

async fn insert_ticket(txn: &DatabaseTransaction, ticket: &Ticket) -> Result<(), DbErr> {
    tickets::ActiveModel {
        id: Set(ticket.id.as_uuid()),
        event_id: Set(ticket.event_id.as_uuid()),
        student_id: Set(ticket.student_id.as_uuid()),
        consent_request_id: Set(ticket.consent_request_id.as_uuid()),
        issued_at: Set(ticket.issued_at),
        status: Set(ticket.status.as_str().to_owned()),
        qr_reference: Set(ticket.qr_reference.clone()),
        transaction_reference: Set(ticket.issuance.reference().to_string()),
        issuance_kind: Set(ticket.issuance.kind().as_str().to_owned()),
        used_at: Set(ticket.used_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn consent_request_from_model(
    model: consent_requests::Model,
) -> Result<ConsentRequest, TicketingError> {
    Ok(ConsentRequest {
        id: ConsentRequestId(model.id),
        event_id: EventId(model.event_id),
        student_id: UserId(model.student_id),
        requested_at: model.requested_at,
        status: model.status.parse().context("stored consent status")?,
        email_verified: model.email_verified,
        blockchain_verified: model.blockchain_verified,
        verification_token: model.verification_token,
        token_expires_at: model.token_expires_at,
        token_consumed_at: model.token_consumed_at,
        issuance_ticket_id: model.issuance_ticket_id.map(TicketId),
        updated_at: model.updated_at,
    })
}

// ── Ticket repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTicketRepository {
    pub db: DatabaseConnection,
}

impl TicketRepository for DbTicketRepository {
    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, TicketingError> {
        let model = tickets::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find ticket by id")?;
        model.map(ticket_from_model).transpose()
    }

    async fn list_by_student(&self, student_id: UserId) -> Result<Vec<Ticket>, TicketingError> {
        let models = tickets::Entity::find()
            .filter(tickets::Column::StudentId.eq(student_id.as_uuid()))
            .order_by_desc(tickets::Column::IssuedAt)
            .all(&self.db)
            .await
            .context("list tickets by student")?;
        models.into_iter().map(ticket_from_model).collect()
    }

    async fn find_active(
        &self,
        event_id: EventId,
        student_id: UserId,
    ) -> Result<Option<Ticket>, TicketingError> {
        let model = tickets::Entity::find()
            .filter(tickets::Column::EventId.eq(event_id.as_uuid()))
            .filter(tickets::Column::StudentId.eq(student_id.as_uuid()))
            .filter(tickets::Column::Status.eq(TicketStatus::Active.as_str()))
            .one(&self.db)
            .await
            .context("find active ticket")?;
        model.map(ticket_from_model).transpose()
    }

    async fn count_issued(&self, event_id: EventId) -> Result<u64, TicketingError> {
        let count = count_issued(&self.db, event_id)
            .await
            .context("count issued tickets")?;
        Ok(count)
    }

    async fn mark_used(&self, id: TicketId) -> Result<bool, TicketingError> {
        let now = Utc::now();
        let result = tickets::Entity::update_many()
            .col_expr(
                tickets::Column::Status,
                Expr::value(TicketStatus::Used.as_str()),
            )
            .col_expr(tickets::Column::UsedAt, Expr::value(now))
            .filter(tickets::Column::Id.eq(id.as_uuid()))
            .filter(tickets::Column::Status.eq(TicketStatus::Active.as_str()))
            .exec(&self.db)
            .await
            .context("mark ticket used")?;
        Ok(result.rows_affected > 0)
    }
}

fn ticket_from_model(model: tickets::Model) -> Result<Ticket, TicketingError> {
    let reference = TransactionReference::parse(&model.transaction_reference)
        .with_context(|| format!("stored transaction reference of ticket {}", model.id))?;
    let kind = model
        .issuance_kind
        .parse()
        .context("stored issuance kind")?;
    Ok(Ticket {
        id: TicketId(model.id),
        event_id: EventId(model.event_id),
        student_id: UserId(model.student_id),
        consent_request_id: ConsentRequestId(model.consent_request_id),
        issued_at: model.issued_at,
        status: model.status.parse().context("stored ticket status")?,
        qr_reference: model.qr_reference,
        issuance: Issuance::new(kind, reference),
        used_at: model.used_at,
    })
}
