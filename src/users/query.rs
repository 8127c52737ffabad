//! Parameterized statements for the `users` table.
//!
//! Values only ever reach SQL through `push_bind`; the builders below push
//! column names and operators, never caller input.

use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{UserChanges, UserFilter};

pub(crate) const PUBLIC_COLUMNS: &str = "id, email, role, created_at, updated_at";

/// `SELECT` over active users narrowed by every set filter field.
pub(crate) fn select_active(filter: &UserFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(PUBLIC_COLUMNS);
    qb.push(" FROM users WHERE deleted_at = 0");

    if let Some(id) = filter.id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(email) = &filter.email {
        qb.push(" AND email = ").push_bind(email.as_str());
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }

    qb.push(" ORDER BY created_at ASC");
    qb
}

/// `UPDATE` of the supplied fields on one active user. `updated_at` is always
/// part of the SET list. Callers reject empty `changes` before building.
pub(crate) fn update_active(
    id: Uuid,
    changes: &UserChanges,
    updated_at: OffsetDateTime,
) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE users SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(email) = &changes.email {
            set.push("email = ").push_bind_unseparated(email.as_str());
        }
        if let Some(role) = changes.role {
            set.push("role = ").push_bind_unseparated(role.as_str());
        }
        set.push("updated_at = ").push_bind_unseparated(updated_at);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" AND deleted_at = 0");
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    #[test]
    fn empty_filter_selects_all_active() {
        let filter = UserFilter::default();
        let qb = select_active(&filter);
        assert_eq!(
            qb.sql(),
            "SELECT id, email, role, created_at, updated_at FROM users \
             WHERE deleted_at = 0 ORDER BY created_at ASC"
        );
    }

    #[test]
    fn filter_fields_number_placeholders_in_order() {
        let filter = UserFilter {
            id: Some(Uuid::new_v4()),
            email: Some("a@b.com".into()),
            role: Some(Role::Client),
        };
        let qb = select_active(&filter);
        assert_eq!(
            qb.sql(),
            "SELECT id, email, role, created_at, updated_at FROM users \
             WHERE deleted_at = 0 AND id = $1 AND email = $2 AND role = $3 \
             ORDER BY created_at ASC"
        );
    }

    #[test]
    fn filter_skips_unset_fields() {
        let filter = UserFilter {
            role: Some(Role::Contractors),
            ..Default::default()
        };
        let qb = select_active(&filter);
        assert!(qb.sql().contains("WHERE deleted_at = 0 AND role = $1 ORDER BY"));
        assert!(!qb.sql().contains("email ="));
    }

    #[test]
    fn update_with_both_fields() {
        let changes = UserChanges {
            email: Some("new@b.com".into()),
            role: Some(Role::Contractors),
        };
        let qb = update_active(Uuid::new_v4(), &changes, OffsetDateTime::now_utc());
        assert_eq!(
            qb.sql(),
            "UPDATE users SET email = $1, role = $2, updated_at = $3 \
             WHERE id = $4 AND deleted_at = 0"
        );
    }

    #[test]
    fn update_with_role_only() {
        let changes = UserChanges {
            email: None,
            role: Some(Role::Client),
        };
        let qb = update_active(Uuid::new_v4(), &changes, OffsetDateTime::now_utc());
        assert_eq!(
            qb.sql(),
            "UPDATE users SET role = $1, updated_at = $2 WHERE id = $3 AND deleted_at = 0"
        );
    }

    #[test]
    fn user_values_never_appear_in_sql_text() {
        let changes = UserChanges {
            email: Some("x'; DROP TABLE users; --@b.com".into()),
            role: None,
        };
        let qb = update_active(Uuid::new_v4(), &changes, OffsetDateTime::now_utc());
        assert!(!qb.sql().contains("DROP"));
    }
}
