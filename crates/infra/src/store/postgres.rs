//! Postgres-backed employee and role stores.
//!
//! Employees live in `employees` with `email` as a unique alternate key and
//! their resolved roles embedded as `jsonb`. Roles live in `roles`, seeded
//! with [`DEFAULT_ROLES`] by `ensure_schema`.
//!
//! ## Error Mapping
//!
//! - Unique violations map to `StoreError::Conflict`
//! - Missing rows map to `StoreError::NotFound`
//! - Everything else maps to `StoreError::Backend` with the operation name

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use cellcentre_core::{EmployeeId, RoleId};
use cellcentre_employees::{
    Employee, EmployeeChanges, EmployeeFilter, EmployeeRepository, Role, RoleFilter,
    RoleRepository, StoreError,
};

use super::roles::DEFAULT_ROLES;

const CREATE_ROLES: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id    UUID PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
)
"#;

const CREATE_EMPLOYEES: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id             UUID        PRIMARY KEY,
    email          TEXT        NOT NULL UNIQUE,
    password_hash  TEXT        NOT NULL,
    name           TEXT        NOT NULL,
    phone          TEXT        NOT NULL,
    roles          JSONB       NOT NULL,
    created_at     TIMESTAMPTZ NOT NULL,
    updated_at     TIMESTAMPTZ NOT NULL
)
"#;

const SEED_ROLE: &str = "INSERT INTO roles (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING";

const EMPLOYEE_COLUMNS: &str =
    "id, email, password_hash, name, phone, roles, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresEmployeeStore {
    pool: Arc<PgPool>,
}

impl PostgresEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Role store sharing this store's pool.
    pub fn role_store(&self) -> PostgresRoleStore {
        PostgresRoleStore {
            pool: self.pool.clone(),
        }
    }

    /// Create both tables if missing and seed the default roles (idempotent).
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_ROLES)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_roles", e))?;
        sqlx::query(CREATE_EMPLOYEES)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_employees", e))?;
        for name in DEFAULT_ROLES {
            sqlx::query(SEED_ROLE)
                .bind(*RoleId::new().as_uuid())
                .bind(name)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("seed_roles", e))?;
        }
        Ok(())
    }
}

/// Lookup column chosen from a filter; the id wins when both are set.
enum Key<'a> {
    Id(Uuid),
    Email(&'a str),
}

fn employee_key(filter: &EmployeeFilter) -> Result<Key<'_>, StoreError> {
    match (&filter.id, filter.email.as_deref()) {
        (Some(id), _) => Ok(Key::Id(*id.as_uuid())),
        (None, Some(email)) if !email.is_empty() => Ok(Key::Email(email)),
        _ => Err(StoreError::InvalidFilter("employee filter is empty".to_string())),
    }
}

#[async_trait]
impl EmployeeRepository for PostgresEmployeeStore {
    #[instrument(skip(self), err)]
    async fn get(&self, filter: &EmployeeFilter) -> Result<Employee, StoreError> {
        let query = match employee_key(filter)? {
            Key::Id(id) => {
                sqlx::query(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"))
                    .bind(id)
                    .fetch_optional(&*self.pool)
                    .await
            }
            Key::Email(email) => sqlx::query(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await,
        };
        let row = query
            .map_err(|e| map_sqlx_error("get_employee", e))?
            .ok_or_else(|| StoreError::NotFound("employee".to_string()))?;
        employee_from_row(&row)
    }

    #[instrument(skip(self, employee), fields(employee_id = %employee.id), err)]
    async fn create(&self, employee: Employee) -> Result<Employee, StoreError> {
        let roles = roles_to_json(&employee.roles)?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO employees (id, email, password_hash, name, phone, roles, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(*employee.id.as_uuid())
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(&employee.name)
        .bind(&employee.phone)
        .bind(roles)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_employee", e))?;
        employee_from_row(&row)
    }

    #[instrument(skip(self, changes), err)]
    async fn update(
        &self,
        id: EmployeeId,
        changes: EmployeeChanges,
    ) -> Result<Employee, StoreError> {
        let roles = changes.roles.as_deref().map(roles_to_json).transpose()?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE employees SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                name = COALESCE($4, name),
                phone = COALESCE($5, phone),
                roles = COALESCE($6, roles),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(*id.as_uuid())
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.name)
        .bind(changes.phone)
        .bind(roles)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_employee", e))?
        .ok_or_else(|| StoreError::NotFound(format!("employee {id}")))?;
        employee_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, filter: &EmployeeFilter) -> Result<(), StoreError> {
        let result = match employee_key(filter)? {
            Key::Id(id) => {
                sqlx::query("DELETE FROM employees WHERE id = $1")
                    .bind(id)
                    .execute(&*self.pool)
                    .await
            }
            Key::Email(email) => {
                sqlx::query("DELETE FROM employees WHERE email = $1")
                    .bind(email)
                    .execute(&*self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("delete_employee", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("employee".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresRoleStore {
    pool: Arc<PgPool>,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleStore {
    #[instrument(skip(self), err)]
    async fn get(&self, filter: &RoleFilter) -> Result<Role, StoreError> {
        let query = match (&filter.id, filter.name.as_deref()) {
            (Some(id), _) => {
                sqlx::query("SELECT id, name FROM roles WHERE id = $1")
                    .bind(*id.as_uuid())
                    .fetch_optional(&*self.pool)
                    .await
            }
            (None, Some(name)) if !name.is_empty() => {
                sqlx::query("SELECT id, name FROM roles WHERE name = $1")
                    .bind(name)
                    .fetch_optional(&*self.pool)
                    .await
            }
            _ => return Err(StoreError::InvalidFilter("role filter is empty".to_string())),
        };
        let row = query
            .map_err(|e| map_sqlx_error("get_role", e))?
            .ok_or_else(|| {
                StoreError::NotFound(
                    filter
                        .name
                        .clone()
                        .or_else(|| filter.id.map(|id| id.to_string()))
                        .unwrap_or_default(),
                )
            })?;
        let read = |e: sqlx::Error| map_sqlx_error("decode_role", e);
        Ok(Role {
            id: RoleId::from_uuid(row.try_get("id").map_err(read)?),
            name: row.try_get("name").map_err(read)?,
        })
    }
}

fn roles_to_json(roles: &[Role]) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(roles)
        .map_err(|e| StoreError::Backend(format!("roles serialization failed: {e}")))
}

fn employee_from_row(row: &sqlx::postgres::PgRow) -> Result<Employee, StoreError> {
    let read = |e: sqlx::Error| map_sqlx_error("decode_employee", e);
    let id: Uuid = row.try_get("id").map_err(read)?;
    let roles: serde_json::Value = row.try_get("roles").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(read)?;

    Ok(Employee {
        id: EmployeeId::from_uuid(id),
        email: row.try_get("email").map_err(read)?,
        password_hash: row.try_get("password_hash").map_err(read)?,
        name: row.try_get("name").map_err(read)?,
        phone: row.try_get("phone").map_err(read)?,
        created_at,
        updated_at,
        roles: serde_json::from_value(roles)
            .map_err(|e| StoreError::Backend(format!("bad roles column: {e}")))?,
    })
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(format!("{} in {}", db_err.message(), operation))
        }
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_key_prefers_id_and_rejects_empty() {
        let id = EmployeeId::new();
        let filter = EmployeeFilter {
            id: Some(id),
            email: Some("a@page.com".into()),
        };
        assert!(matches!(employee_key(&filter), Ok(Key::Id(u)) if u == *id.as_uuid()));
        assert!(matches!(
            employee_key(&EmployeeFilter::by_email("a@page.com")),
            Ok(Key::Email("a@page.com"))
        ));
        assert!(matches!(
            employee_key(&EmployeeFilter::by_email("")),
            Err(StoreError::InvalidFilter(_))
        ));
    }

    #[test]
    fn pool_closed_is_a_backend_error() {
        assert!(matches!(
            map_sqlx_error("get_employee", sqlx::Error::PoolClosed),
            StoreError::Backend(msg) if msg.contains("get_employee")
        ));
    }

    #[tokio::test]
    #[ignore] // Requires Postgres: DATABASE_URL=postgres://... cargo test -- --ignored
    async fn employee_round_trip_with_seeded_roles() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PostgresEmployeeStore::connect(&url).await.unwrap();
        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
        let roles = store.role_store();

        let admin = roles
            .get(&RoleFilter {
                id: None,
                name: Some("admin".into()),
            })
            .await
            .unwrap();
        let by_id = roles
            .get(&RoleFilter {
                id: Some(admin.id),
                name: None,
            })
            .await
            .unwrap();
        assert_eq!(admin, by_id);

        let email = format!("{}@page.com", Uuid::new_v4().simple());
        let epoch = DateTime::<Utc>::default();
        let employee = Employee {
            id: EmployeeId::new(),
            email: email.clone(),
            password_hash: "hash".into(),
            name: "Someone".into(),
            phone: String::new(),
            created_at: epoch,
            updated_at: epoch,
            roles: vec![admin.clone()],
        };
        let stored = store.create(employee.clone()).await.unwrap();
        assert!(stored.created_at > epoch);
        assert_eq!(stored.roles, vec![admin]);
        assert!(matches!(
            store
                .create(Employee {
                    id: EmployeeId::new(),
                    ..employee.clone()
                })
                .await,
            Err(StoreError::Conflict(_))
        ));

        let fetched = store.get(&EmployeeFilter::by_email(&email)).await.unwrap();
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.password_hash, "hash");

        let updated = store
            .update(
                stored.id,
                EmployeeChanges {
                    name: Some("Renamed".into()),
                    ..EmployeeChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, email);
        assert!(updated.updated_at >= stored.updated_at);

        store.delete(&EmployeeFilter::by_id(stored.id)).await.unwrap();
        assert!(matches!(
            store.get(&EmployeeFilter::by_id(stored.id)).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&EmployeeFilter::by_email(&email)).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
