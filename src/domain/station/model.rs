//! Station domain entity

/// Charging station as seen by the booking core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: String,
    pub name: Option<String>,
    /// Number of slots the operator declared for this station
    pub capacity: u32,
    pub is_active: bool,
}

impl Station {
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: None,
            capacity,
            is_active: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
