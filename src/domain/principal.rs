//! Requesting identities
//!
//! Identity management lives outside this service; callers hand us an
//! already-authenticated principal.

/// Role tag carried by every principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Operator,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Admin { id: String },
    /// Station staff; `station_id` is the station they are assigned to, if any
    Operator {
        id: String,
        station_id: Option<String>,
    },
    /// EV owner making reservations
    Owner { id: String },
}

impl Principal {
    pub fn owner(id: impl Into<String>) -> Self {
        Self::Owner { id: id.into() }
    }

    pub fn operator(id: impl Into<String>) -> Self {
        Self::Operator {
            id: id.into(),
            station_id: None,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::Admin { id: id.into() }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Admin { id } | Self::Operator { id, .. } | Self::Owner { id } => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Admin { .. } => Role::Admin,
            Self::Operator { .. } => Role::Operator,
            Self::Owner { .. } => Role::Owner,
        }
    }
}
