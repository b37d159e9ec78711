use crate::shared::entity::{Entity, ID};

/// Read-only projection of the owning user. Accounts, auth and billing live
/// outside this service; the core only needs the contact addresses and the
/// entitlement gate at validation and fire time.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: ID,
    pub email: String,
    /// Required for the SMS and Voice channels
    pub phone: Option<String>,
    /// When false, all delivery for this user's reminders is suppressed
    pub entitled: bool,
}

impl User {
    pub fn new(email: String) -> Self {
        Self {
            id: Default::default(),
            email,
            phone: None,
            entitled: true,
        }
    }
}

impl Entity for User {
    fn id(&self) -> ID {
        self.id.clone()
    }
}
