use parking_lot::RwLock;
use shared::models::{Employee, Rider};
use std::sync::Arc;

use super::{ChangeFeed, StoreChange};

/// Client-local staff list (read-only here; staff CRUD lives elsewhere)
#[derive(Debug, Clone, Default)]
pub struct EmployeeStore {
    employees: Arc<RwLock<Vec<Employee>>>,
    feed: ChangeFeed,
}

impl EmployeeStore {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            employees: Arc::default(),
            feed,
        }
    }

    pub fn replace_all(&self, employees: Vec<Employee>) {
        let count = employees.len();
        *self.employees.write() = employees;
        tracing::debug!(count, "Employees replaced");
        self.feed.publish(StoreChange::EmployeesReplaced { count });
    }

    pub fn snapshot(&self) -> Vec<Employee> {
        self.employees.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Employee> {
        self.employees.read().iter().find(|e| e.id == id).cloned()
    }

    /// Employees whose role is `rider`
    pub fn riders(&self) -> Vec<Rider> {
        self.employees
            .read()
            .iter()
            .filter_map(|e| Rider::try_from(e.clone()).ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.employees.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.read().is_empty()
    }
}
