#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Manager = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    /// Managers and admins may approve or reject leave requests.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviewer_capability() {
        assert!(Role::Admin.is_reviewer());
        assert!(Role::Manager.is_reviewer());
        assert!(!Role::Employee.is_reviewer());
    }

    #[test]
    fn unknown_role_id_is_rejected() {
        assert_eq!(Role::from_id(2), Some(Role::Manager));
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }
}
