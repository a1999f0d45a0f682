//! Employee Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role string carried by delivery staff
pub const RIDER_ROLE: &str = "rider";

/// Staff record as served by `/api/employee`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    /// Phone, email, shop assignment, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            extra: Map::new(),
        }
    }

    pub fn is_rider(&self) -> bool {
        self.role.eq_ignore_ascii_case(RIDER_ROLE)
    }
}

/// An employee whose role is `rider`
///
/// Embedded verbatim in `Order::rider_info`. Orders reference riders, they
/// never own them: the employee list stays the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rider(Employee);

impl Rider {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn employee(&self) -> &Employee {
        &self.0
    }

    pub fn into_employee(self) -> Employee {
        self.0
    }
}

/// Error returned when promoting a non-rider employee
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("employee {id} has role {role:?}, not a rider")]
pub struct NotARider {
    pub id: String,
    pub role: String,
}

impl TryFrom<Employee> for Rider {
    type Error = NotARider;

    fn try_from(employee: Employee) -> Result<Self, Self::Error> {
        if employee.is_rider() {
            Ok(Self(employee))
        } else {
            Err(NotARider {
                id: employee.id,
                role: employee.role,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rider_from_employee() {
        let rider = Rider::try_from(Employee::new("e1", "Ravi", "rider")).unwrap();
        assert_eq!(rider.id(), "e1");
        assert_eq!(rider.name(), "Ravi");

        let err = Rider::try_from(Employee::new("e2", "Meena", "manager")).unwrap_err();
        assert_eq!(err.id, "e2");
        assert_eq!(err.role, "manager");
    }

    #[test]
    fn test_rider_is_transparent_on_the_wire() {
        let value = json!({"_id": "e1", "name": "Ravi", "role": "rider", "phone": "99"});
        let rider: Rider = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(rider.employee().extra["phone"], "99");
        assert_eq!(serde_json::to_value(&rider).unwrap(), value);
    }
}
