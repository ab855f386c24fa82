//! Foreign-key options for forms and submit-time reference checks.

use crate::forms::{ChoiceView, FormErrors, INVALID_CHOICE};
use crate::storage::{Database, DatabaseError, Owned};

use super::error::AppError;

/// The account's work orders as select options.
pub async fn work_order_options(db: &Database, owner_id: i64) -> Result<Vec<ChoiceView>, AppError> {
    Ok(db
        .work_orders_owned_by(owner_id)
        .await?
        .into_iter()
        .map(|w| ChoiceView::new(w.id, w.name))
        .collect())
}

/// The account's links as select options.
pub async fn link_options(db: &Database, owner_id: i64) -> Result<Vec<ChoiceView>, AppError> {
    Ok(db
        .links_owned_by(owner_id)
        .await?
        .into_iter()
        .map(|l| ChoiceView::new(l.id, l.identifier))
        .collect())
}

/// Record an invalid-choice error unless `found` holds a row visible to
/// `scope` (`None` accepts any owner).
fn check_found<T: Owned>(
    found: Result<T, DatabaseError>,
    scope: Option<i64>,
    field: &str,
    errors: &mut FormErrors,
) -> Result<(), AppError> {
    match found {
        Ok(row) if scope.is_none_or(|owner| row.owner_id() == owner) => Ok(()),
        Ok(_) | Err(DatabaseError::NotFound(_)) => {
            errors.add(field, INVALID_CHOICE);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn check_work_order(
    db: &Database,
    id: Option<i64>,
    scope: Option<i64>,
    field: &str,
    errors: &mut FormErrors,
) -> Result<(), AppError> {
    match id {
        Some(id) => check_found(db.get_work_order(id).await, scope, field, errors),
        None => Ok(()),
    }
}

pub async fn check_link(
    db: &Database,
    id: Option<i64>,
    scope: Option<i64>,
    field: &str,
    errors: &mut FormErrors,
) -> Result<(), AppError> {
    match id {
        Some(id) => check_found(db.get_link(id).await, scope, field, errors),
        None => Ok(()),
    }
}

pub async fn check_account(
    db: &Database,
    id: Option<i64>,
    field: &str,
    errors: &mut FormErrors,
) -> Result<(), AppError> {
    let Some(id) = id else {
        return Ok(());
    };
    match db.get_account(id).await {
        Ok(_) => Ok(()),
        Err(DatabaseError::NotFound(_)) => {
            errors.add(field, INVALID_CHOICE);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
