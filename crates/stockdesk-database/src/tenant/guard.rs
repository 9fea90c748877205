//! Tenant Scope Guard.
//!
//! Every operation on a tenant-owned collection passes through one of the
//! `scope_*` functions below before it can reach storage. Each applies the
//! same inject-or-validate rule to the operation's `company_id`
//! constraint:
//!
//! | ambient tenant | constraint in operation | outcome                         |
//! |----------------|-------------------------|---------------------------------|
//! | `Some(a)`      | none                    | `company_id = a` injected       |
//! | `Some(a)`      | `company_id = a`        | accepted                        |
//! | `Some(a)`      | `company_id = b`        | `TenantMismatch`                |
//! | `None`         | `company_id = b`        | accepted (caller accountable)   |
//! | `None`         | none                    | `TenantContextMissing`          |
//!
//! A constraint that does not pin exactly one company (`!=`, `IN`,
//! `IS NULL`, a non-UUID value, two different values) is a mismatch.
//!
//! The scoped types have private fields and no public constructors, so
//! holding one proves the guard ran.

use serde_json::{Map, Value};
use tracing::error;
use uuid::Uuid;

use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{CompanyId, Filter, FilterField, FilterOp};
use stockdesk_entity::{TENANT_FIELD, TenantEntity};

use super::context::TenantContext;
use crate::query::{Pipeline, Stage};

/// A filter restricted to exactly one company.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedFilter {
    collection: &'static str,
    company_id: CompanyId,
    conditions: Vec<FilterField>,
}

impl ScopedFilter {
    /// Target collection.
    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// The single company every matched document belongs to.
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Remaining non-tenant conditions.
    pub fn conditions(&self) -> &[FilterField] {
        &self.conditions
    }

    /// Whether `doc` belongs to the scoped company and satisfies the conditions.
    pub fn matches(&self, doc: &Value) -> bool {
        document_company(doc) == Some(self.company_id.into_uuid())
            && crate::query::eval::matches(&self.conditions, doc)
    }
}

/// An aggregation whose first stage restricts to exactly one company.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedPipeline {
    scope: ScopedFilter,
    stages: Vec<Stage>,
}

impl ScopedPipeline {
    /// The leading tenant match.
    pub fn scope(&self) -> &ScopedFilter {
        &self.scope
    }

    /// Stages that run after the tenant match.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// A document ready for insertion, carrying its validated company.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedDocument {
    collection: &'static str,
    id: Uuid,
    company_id: CompanyId,
    document: Value,
}

impl ScopedDocument {
    /// Target collection.
    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// Document identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning company.
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// The full document, `company_id` included.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consume into the document.
    pub fn into_document(self) -> Value {
        self.document
    }
}

/// A field-level update on a mutable collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedUpdate {
    filter: ScopedFilter,
    patch: Map<String, Value>,
}

impl ScopedUpdate {
    /// Which documents to update.
    pub fn filter(&self) -> &ScopedFilter {
        &self.filter
    }

    /// Top-level fields to overwrite. Never contains `company_id` or `id`.
    pub fn patch(&self) -> &Map<String, Value> {
        &self.patch
    }
}

/// A delete on a mutable collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedDelete {
    filter: ScopedFilter,
}

impl ScopedDelete {
    /// Which documents to delete.
    pub fn filter(&self) -> &ScopedFilter {
        &self.filter
    }
}

/// Builds scoped operations for entity type `E`.
#[derive(Debug, Clone, Copy)]
pub struct TenantGuard;

impl TenantGuard {
    /// Scope a find/count filter.
    pub fn scope_filter<E: TenantEntity>(ctx: &TenantContext, filter: Filter) -> AppResult<ScopedFilter> {
        let (tenant, conditions): (Vec<FilterField>, Vec<FilterField>) = filter
            .conditions
            .into_iter()
            .partition(|c| c.field == TENANT_FIELD);

        let explicit = explicit_company::<E>(ctx, &tenant)?;
        let company_id = resolve::<E>(ctx, explicit)?;

        Ok(ScopedFilter {
            collection: E::COLLECTION,
            company_id,
            conditions,
        })
    }

    /// Scope an aggregation. A leading match stage is validated like a
    /// filter; otherwise a tenant match is prepended.
    pub fn scope_pipeline<E: TenantEntity>(
        ctx: &TenantContext,
        pipeline: Pipeline,
    ) -> AppResult<ScopedPipeline> {
        let mut stages = pipeline.stages;
        let first = match stages.first_mut() {
            Some(Stage::Match(filter)) => {
                let filter = std::mem::take(filter);
                stages.remove(0);
                filter
            }
            _ => Filter::new(),
        };

        Ok(ScopedPipeline {
            scope: Self::scope_filter::<E>(ctx, first)?,
            stages,
        })
    }

    /// Scope an insert. A missing `company_id` is filled from context.
    pub fn scope_insert<E: TenantEntity>(ctx: &TenantContext, entity: &E) -> AppResult<ScopedDocument> {
        let mut document = serde_json::to_value(entity)?;
        let Value::Object(fields) = &mut document else {
            return Err(AppError::internal(format!(
                "{} documents must serialize to JSON objects",
                E::COLLECTION
            )));
        };

        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::validation(format!("{} document has no valid id", E::COLLECTION)))?;

        // A nil company id means "not set yet" and is filled from context.
        let explicit = match fields.get(TENANT_FIELD) {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
                Some(uuid) if uuid.is_nil() => None,
                Some(uuid) => Some(CompanyId::from_uuid(uuid)),
                None => {
                    return Err(reject_mismatch::<E>(ctx, &format!("invalid company_id {value}")));
                }
            },
        };
        let company_id = resolve::<E>(ctx, explicit)?;
        fields.insert(TENANT_FIELD.to_string(), Value::String(company_id.to_string()));

        Ok(ScopedDocument {
            collection: E::COLLECTION,
            id,
            company_id,
            document,
        })
    }

    /// Scope an update. Rejected outright for append-only collections.
    pub fn scope_update<E: TenantEntity>(
        ctx: &TenantContext,
        filter: Filter,
        patch: Map<String, Value>,
    ) -> AppResult<ScopedUpdate> {
        reject_if_append_only::<E>("update")?;

        if patch.contains_key(TENANT_FIELD) {
            return Err(reject_mismatch::<E>(ctx, "update attempts to reassign company_id"));
        }
        if patch.contains_key("id") {
            return Err(AppError::validation("Record id cannot be changed"));
        }

        Ok(ScopedUpdate {
            filter: Self::scope_filter::<E>(ctx, filter)?,
            patch,
        })
    }

    /// Scope a delete. Rejected outright for append-only collections.
    pub fn scope_delete<E: TenantEntity>(ctx: &TenantContext, filter: Filter) -> AppResult<ScopedDelete> {
        reject_if_append_only::<E>("delete")?;
        Ok(ScopedDelete {
            filter: Self::scope_filter::<E>(ctx, filter)?,
        })
    }
}

/// Validate the `company_id` conditions of a filter and reduce them to
/// at most one company.
fn explicit_company<E: TenantEntity>(
    ctx: &TenantContext,
    tenant: &[FilterField],
) -> AppResult<Option<CompanyId>> {
    let mut explicit: Option<Uuid> = None;
    for condition in tenant {
        let value = match (condition.op, condition.value.as_uuid()) {
            (FilterOp::Eq, Some(uuid)) if !uuid.is_nil() => uuid,
            _ => {
                return Err(reject_mismatch::<E>(
                    ctx,
                    &format!(
                        "company_id constraint {:?} {:?} does not select exactly one tenant",
                        condition.op, condition.value
                    ),
                ));
            }
        };
        match explicit {
            Some(existing) if existing != value => {
                return Err(reject_mismatch::<E>(
                    ctx,
                    &format!("conflicting company_id constraints {existing} and {value}"),
                ));
            }
            _ => explicit = Some(value),
        }
    }
    Ok(explicit.map(CompanyId::from_uuid))
}

/// Combine the ambient and explicit tenants.
fn resolve<E: TenantEntity>(ctx: &TenantContext, explicit: Option<CompanyId>) -> AppResult<CompanyId> {
    match (ctx.company_id(), explicit) {
        (Some(ambient), None) => Ok(ambient),
        (Some(ambient), Some(named)) if ambient == named => Ok(ambient),
        (Some(ambient), Some(named)) => Err(reject_mismatch::<E>(
            ctx,
            &format!("operation names company {named} but context is {ambient}"),
        )),
        (None, Some(named)) => Ok(named),
        (None, None) => {
            error!(
                collection = E::COLLECTION,
                user_id = ?ctx.user_id(),
                "Tenant-scoped operation without tenant context or explicit company filter"
            );
            Err(AppError::tenant_context_missing(format!(
                "Operation on '{}' has no tenant context and no explicit company_id",
                E::COLLECTION
            )))
        }
    }
}

fn reject_mismatch<E: TenantEntity>(ctx: &TenantContext, detail: &str) -> AppError {
    error!(
        collection = E::COLLECTION,
        context = %ctx,
        user_id = ?ctx.user_id(),
        detail,
        "Tenant mismatch; operation aborted"
    );
    AppError::tenant_mismatch(format!("Tenant mismatch on '{}': {detail}", E::COLLECTION))
}

fn reject_if_append_only<E: TenantEntity>(operation: &str) -> AppResult<()> {
    if E::APPEND_ONLY {
        error!(collection = E::COLLECTION, operation, "Mutation of append-only record rejected");
        return Err(AppError::immutable_entity(format!(
            "Records in '{}' are append-only and cannot be changed by {operation}; record a compensating entry instead",
            E::COLLECTION
        )));
    }
    Ok(())
}

fn document_company(doc: &Value) -> Option<Uuid> {
    doc.get(TENANT_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use stockdesk_core::ErrorKind;
    use stockdesk_core::types::{FilterValue, UserId};

    #[derive(Debug, Serialize, Deserialize)]
    struct Widget {
        id: Uuid,
        company_id: Uuid,
        name: String,
    }
    stockdesk_entity::tenant_entity!(Widget, "widgets");

    #[derive(Debug, Serialize, Deserialize)]
    struct Entry {
        id: Uuid,
        company_id: Uuid,
    }
    stockdesk_entity::tenant_entity!(Entry, "entries", append_only = true);

    fn request_ctx(company: CompanyId) -> TenantContext {
        TenantContext::for_request(UserId::new(), Some(company))
    }

    #[test]
    fn test_injects_ambient_tenant() {
        let company = CompanyId::new();
        let scoped =
            TenantGuard::scope_filter::<Widget>(&request_ctx(company), Filter::new().eq("name", "x"))
                .unwrap();
        assert_eq!(scoped.company_id(), company);
        assert_eq!(scoped.collection(), "widgets");
        assert_eq!(scoped.conditions().len(), 1);
    }

    #[test]
    fn test_accepts_matching_explicit_tenant() {
        let company = CompanyId::new();
        let filter = Filter::new().eq(TENANT_FIELD, company.into_uuid());
        let scoped = TenantGuard::scope_filter::<Widget>(&request_ctx(company), filter).unwrap();
        assert_eq!(scoped.company_id(), company);
        assert!(scoped.conditions().is_empty());
    }

    #[test]
    fn test_rejects_differing_explicit_tenant() {
        let filter = Filter::new().eq(TENANT_FIELD, Uuid::new_v4());
        let err = TenantGuard::scope_filter::<Widget>(&request_ctx(CompanyId::new()), filter).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantMismatch);
    }

    #[test]
    fn test_detached_context_requires_explicit_tenant() {
        let err = TenantGuard::scope_filter::<Widget>(&TenantContext::detached(), Filter::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantContextMissing);

        let company = Uuid::new_v4();
        let scoped = TenantGuard::scope_filter::<Widget>(
            &TenantContext::detached(),
            Filter::new().eq(TENANT_FIELD, company),
        )
        .unwrap();
        assert_eq!(scoped.company_id().into_uuid(), company);
    }

    #[test]
    fn test_user_without_company_is_like_detached() {
        let ctx = TenantContext::for_request(UserId::new(), None);
        let err = TenantGuard::scope_filter::<Widget>(&ctx, Filter::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantContextMissing);
    }

    #[test]
    fn test_rejects_constraints_that_span_tenants() {
        let ctx = TenantContext::detached();
        let cases = vec![
            Filter::new().with(TENANT_FIELD, FilterOp::Ne, Uuid::new_v4()),
            Filter::new().with(
                TENANT_FIELD,
                FilterOp::In,
                FilterValue::StringList(vec![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()]),
            ),
            Filter::new().with(TENANT_FIELD, FilterOp::IsNull, FilterValue::Null),
            Filter::new().eq(TENANT_FIELD, "not-a-uuid"),
            Filter::new().eq(TENANT_FIELD, Uuid::nil()),
            Filter::new().eq(TENANT_FIELD, Uuid::new_v4()).eq(TENANT_FIELD, Uuid::new_v4()),
        ];
        for filter in cases {
            let err = TenantGuard::scope_filter::<Widget>(&ctx, filter.clone()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::TenantMismatch, "{filter:?}");
        }
    }

    #[test]
    fn test_pipeline_without_leading_match_gets_one() {
        let company = CompanyId::new();
        let pipeline = Pipeline::new().limit(5);
        let scoped = TenantGuard::scope_pipeline::<Widget>(&request_ctx(company), pipeline).unwrap();
        assert_eq!(scoped.scope().company_id(), company);
        assert_eq!(scoped.stages(), &[Stage::Limit(5)]);
    }

    #[test]
    fn test_pipeline_leading_match_is_validated() {
        let pipeline = Pipeline::new().matching(Filter::new().eq(TENANT_FIELD, Uuid::new_v4()));
        let err =
            TenantGuard::scope_pipeline::<Widget>(&request_ctx(CompanyId::new()), pipeline).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantMismatch);
    }

    #[test]
    fn test_pipeline_only_first_stage_counts_as_scope() {
        let company = CompanyId::new();
        let pipeline = Pipeline::new()
            .limit(10)
            .matching(Filter::new().eq(TENANT_FIELD, company.into_uuid()));
        let err = TenantGuard::scope_pipeline::<Widget>(&TenantContext::detached(), pipeline).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantContextMissing);
    }

    #[test]
    fn test_insert_validates_document_company() {
        let company = CompanyId::new();
        let own = Widget {
            id: Uuid::new_v4(),
            company_id: company.into_uuid(),
            name: "a".into(),
        };
        let scoped = TenantGuard::scope_insert(&request_ctx(company), &own).unwrap();
        assert_eq!(scoped.company_id(), company);
        assert_eq!(scoped.id(), own.id);

        let foreign = Widget {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            name: "b".into(),
        };
        let err = TenantGuard::scope_insert(&request_ctx(company), &foreign).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantMismatch);
    }

    #[test]
    fn test_insert_fills_unset_company_from_context() {
        let company = CompanyId::new();
        let doc = Widget {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            name: "a".into(),
        };
        let scoped = TenantGuard::scope_insert(&request_ctx(company), &doc).unwrap();
        assert_eq!(scoped.company_id(), company);
        assert_eq!(scoped.document()["company_id"], company.to_string());

        let err = TenantGuard::scope_insert(&TenantContext::detached(), &doc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantContextMissing);
    }

    #[test]
    fn test_update_cannot_move_records_between_tenants() {
        let company = CompanyId::new();
        let mut patch = Map::new();
        patch.insert(TENANT_FIELD.into(), Value::String(Uuid::new_v4().to_string()));
        let err = TenantGuard::scope_update::<Widget>(&request_ctx(company), Filter::new(), patch).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TenantMismatch);
    }

    #[test]
    fn test_append_only_rejects_update_and_delete_first() {
        // Even without any tenant context the immutability check fires first.
        let ctx = TenantContext::detached();
        let err = TenantGuard::scope_update::<Entry>(&ctx, Filter::new(), Map::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImmutableEntity);
        let err = TenantGuard::scope_delete::<Entry>(&ctx, Filter::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImmutableEntity);
    }

    #[test]
    fn test_scoped_filter_matches_only_own_company() {
        let company = CompanyId::new();
        let scoped = TenantGuard::scope_filter::<Widget>(&request_ctx(company), Filter::new()).unwrap();
        let own = serde_json::json!({"id": Uuid::new_v4(), "company_id": company.to_string()});
        let other = serde_json::json!({"id": Uuid::new_v4(), "company_id": Uuid::new_v4().to_string()});
        assert!(scoped.matches(&own));
        assert!(!scoped.matches(&other));
    }
}
