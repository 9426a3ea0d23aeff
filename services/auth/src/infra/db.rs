use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};

use storefront_auth_schema::otp_codes;
use storefront_domain::id::OtpId;

use crate::domain::repository::OtpRepository;
use crate::domain::types::OtpRecord;
use crate::error::AuthServiceError;

/// Supersedes the live code for the identifier, if any, in the same statement that
/// inserts the new one. Relies on the partial unique index over unconsumed rows.
const UPSERT_ACTIVE_SQL: &str = r#"
INSERT INTO otp_codes (id, identifier, code, issued_at, expires_at, consumed_at)
VALUES ($1, $2, $3, $4, $5, NULL)
ON CONFLICT (identifier) WHERE consumed_at IS NULL
DO UPDATE SET
    id = EXCLUDED.id,
    code = EXCLUDED.code,
    issued_at = EXCLUDED.issued_at,
    expires_at = EXCLUDED.expires_at
"#;

#[derive(Clone)]
pub struct DbOtpRepository {
    pub db: DatabaseConnection,
}

impl OtpRepository for DbOtpRepository {
    async fn replace_active(&self, record: &OtpRecord) -> Result<(), AuthServiceError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            UPSERT_ACTIVE_SQL,
            [
                record.id.0.into(),
                record.identifier.clone().into(),
                record.code.clone().into(),
                record.issued_at.into(),
                record.expires_at.into(),
            ],
        );
        self.db
            .execute(stmt)
            .await
            .context("upsert active otp code")?;
        Ok(())
    }

    async fn find_active(&self, identifier: &str) -> Result<Option<OtpRecord>, AuthServiceError> {
        let model = otp_codes::Entity::find()
            .filter(otp_codes::Column::Identifier.eq(identifier))
            .filter(otp_codes::Column::ConsumedAt.is_null())
            .order_by_desc(otp_codes::Column::IssuedAt)
            .one(&self.db)
            .await
            .context("find active otp code")?;
        Ok(model.map(record_from_model))
    }

    async fn consume(&self, id: OtpId, at: DateTime<Utc>) -> Result<bool, AuthServiceError> {
        let result = otp_codes::Entity::update_many()
            .col_expr(otp_codes::Column::ConsumedAt, Expr::value(Some(at)))
            .filter(otp_codes::Column::Id.eq(id.0))
            .filter(otp_codes::Column::ConsumedAt.is_null())
            .exec(&self.db)
            .await
            .context("consume otp code")?;
        Ok(result.rows_affected == 1)
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, AuthServiceError> {
        let result = otp_codes::Entity::delete_many()
            .filter(otp_codes::Column::ExpiresAt.lt(before))
            .exec(&self.db)
            .await
            .context("purge expired otp codes")?;
        Ok(result.rows_affected)
    }
}

fn record_from_model(model: otp_codes::Model) -> OtpRecord {
    OtpRecord {
        id: OtpId(model.id),
        identifier: model.identifier,
        code: model.code,
        issued_at: model.issued_at,
        expires_at: model.expires_at,
        consumed_at: model.consumed_at,
    }
}
