//! Employee repository over the flat-file store.

use staffdesk_config::CorruptPolicy;
use staffdesk_store::{JsonStore, StoreResult};
use std::path::PathBuf;
use tracing::debug;

use crate::entity::Employee;

/// Repository for employee CRUD and search.
///
/// Thin specialization of [`JsonStore`]: every call is a fresh
/// load-mutate-save cycle against the employee file, so the file is the
/// single source of truth at call time.
#[derive(Clone)]
pub struct EmployeeRepository {
    store: JsonStore<Employee>,
}

impl EmployeeRepository {
    /// Create a repository backed by the employee file at `path`.
    pub fn new(path: impl Into<PathBuf>, on_corrupt: CorruptPolicy) -> Self {
        Self {
            store: JsonStore::new(path, on_corrupt),
        }
    }

    /// All employees in file order.
    pub async fn employees(&self) -> StoreResult<Vec<Employee>> {
        self.store.load_all().await
    }

    /// The employee with the given id, if present.
    pub async fn employee_by_id(&self, id: i64) -> StoreResult<Option<Employee>> {
        let employees = self.store.load_all().await?;
        Ok(employees.into_iter().find(|e| e.id == id))
    }

    /// Add a new employee. The store assigns the id and writes it back
    /// into `employee`.
    pub async fn add_employee(&self, employee: &mut Employee) -> StoreResult<()> {
        self.store.add(employee).await?;
        debug!(id = employee.id, "added employee");
        Ok(())
    }

    /// Replace the stored employee with the same id. Unknown ids are a
    /// silent no-op.
    pub async fn update_employee(&self, employee: &Employee) -> StoreResult<()> {
        self.store.update(employee).await
    }

    /// Remove the employee with the given id.
    pub async fn delete_employee(&self, id: i64) -> StoreResult<()> {
        self.store.remove(id).await?;
        debug!(id, "deleted employee");
        Ok(())
    }

    /// Employees whose name, email, project account name, or designation
    /// contains `term`, case-insensitively.
    ///
    /// An empty or whitespace-only term applies no filter.
    pub async fn search_employees(&self, term: &str) -> StoreResult<Vec<Employee>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.employees().await;
        }

        self.store
            .find(|e| {
                e.name.to_lowercase().contains(&term)
                    || e.email.to_lowercase().contains(&term)
                    || e.project_account_name.to_lowercase().contains(&term)
                    || e.designation.to_lowercase().contains(&term)
            })
            .await
    }
}
