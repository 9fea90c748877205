//! Tenant documents in `tenant_records`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use stockdesk_core::result::AppResult;
use stockdesk_core::types::{FilterField, FilterOp, FilterValue};

use super::{PgStore, db_error};
use crate::query::FindOptions;
use crate::query::eval;
use crate::store::RecordStore;
use crate::tenant::{ScopedDelete, ScopedDocument, ScopedFilter, ScopedPipeline, ScopedUpdate};

#[async_trait]
impl RecordStore for PgStore {
    async fn insert(&self, document: ScopedDocument) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO tenant_records (collection, id, company_id, data) VALUES ($1, $2, $3, $4)",
        )
        .bind(document.collection())
        .bind(document.id())
        .bind(document.company_id())
        .bind(document.document())
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to insert record"))?;
        Ok(())
    }

    async fn find(&self, filter: &ScopedFilter, options: &FindOptions) -> AppResult<Vec<Value>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT data FROM tenant_records");
        push_scope(&mut qb, filter);

        qb.push(" ORDER BY ");
        for field in &options.sort {
            qb.push("data -> ")
                .push_bind(field.field.clone())
                .push(" ")
                .push(field.direction.as_sql())
                .push(", ");
        }
        qb.push("id ASC");

        if let Some(limit) = options.limit {
            qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if options.offset > 0 {
            qb.push(" OFFSET ").push_bind(i64::try_from(options.offset).unwrap_or(i64::MAX));
        }

        qb.build_query_scalar::<Value>()
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to query records"))
    }

    async fn count(&self, filter: &ScopedFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tenant_records");
        push_scope(&mut qb, filter);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count records"))?;
        Ok(count as u64)
    }

    async fn update(&self, update: ScopedUpdate) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tenant_records SET data = data || ");
        qb.push_bind(Value::Object(update.patch().clone()))
            .push(", updated_at = NOW()");
        push_scope(&mut qb, update.filter());

        let result = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to update records"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, delete: ScopedDelete) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM tenant_records");
        push_scope(&mut qb, delete.filter());

        let result = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete records"))?;
        Ok(result.rows_affected())
    }

    async fn aggregate(&self, pipeline: &ScopedPipeline) -> AppResult<Vec<Value>> {
        // The tenant match runs in SQL; later stages run in process.
        let docs = self.find(pipeline.scope(), &FindOptions::default()).await?;
        Ok(eval::run_stages(docs, pipeline.stages()))
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}

/// Append the `WHERE` clause for a scoped filter.
fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, filter: &ScopedFilter) {
    qb.push(" WHERE collection = ")
        .push_bind(filter.collection())
        .push(" AND company_id = ")
        .push_bind(filter.company_id().into_uuid());

    for condition in filter.conditions() {
        qb.push(" AND ");
        push_condition(qb, condition);
    }
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, condition: &FilterField) {
    let field = condition.field.clone();

    match condition.op {
        FilterOp::IsNull => push_absent(qb, field),
        FilterOp::IsNotNull => {
            qb.push("NOT ");
            push_absent(qb, field);
        }
        FilterOp::Eq => {
            qb.push("data -> ")
                .push_bind(field)
                .push(" = ")
                .push_bind(json_value(&condition.value));
        }
        FilterOp::Ne => {
            qb.push("(");
            push_absent(qb, field.clone());
            qb.push(" OR data -> ")
                .push_bind(field)
                .push(" <> ")
                .push_bind(json_value(&condition.value))
                .push(")");
        }
        FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
            let op = match condition.op {
                FilterOp::Gt => " > ",
                FilterOp::Gte => " >= ",
                FilterOp::Lt => " < ",
                _ => " <= ",
            };
            // jsonb orders across types; require a matching type first.
            qb.push("(jsonb_typeof(data -> ")
                .push_bind(field.clone())
                .push(") = jsonb_typeof(")
                .push_bind(json_value(&condition.value))
                .push(") AND data -> ")
                .push_bind(field)
                .push(op)
                .push_bind(json_value(&condition.value))
                .push(")");
        }
        FilterOp::Like | FilterOp::ILike => {
            let op = if condition.op == FilterOp::Like { " LIKE " } else { " ILIKE " };
            qb.push("data ->> ")
                .push_bind(field)
                .push(op)
                .push_bind(condition.value.as_str().unwrap_or_default().to_string());
        }
        FilterOp::In => {
            let list = match &condition.value {
                FilterValue::StringList(list) => list.clone(),
                _ => Vec::new(),
            };
            qb.push("data ->> ")
                .push_bind(field)
                .push(" = ANY(")
                .push_bind(list)
                .push(")");
        }
    }
}

/// The field is missing or JSON null.
fn push_absent(qb: &mut QueryBuilder<'_, Postgres>, field: String) {
    qb.push("(data -> ")
        .push_bind(field.clone())
        .push(" IS NULL OR data -> ")
        .push_bind(field)
        .push(" = 'null'::jsonb)");
}

fn json_value(value: &FilterValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
