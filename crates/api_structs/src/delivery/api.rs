use remindr_domain::ID;
use serde::{Deserialize, Serialize};

pub mod deliver_reminder {
    use super::*;

    /// Shared-secret header the dispatcher must present when invoking the
    /// delivery callback
    pub const DELIVERY_KEY_HEADER: &str = "remindr-delivery-key";

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub reminder_id: ID,
        /// `due_at` of the occurrence this trigger was armed for. Compared
        /// against the reminder's current due time to reject stale fires
        pub occurrence: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub outcome: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub attempted: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub failed: Vec<String>,
    }

    impl APIResponse {
        pub fn delivered(attempted: Vec<String>, failed: Vec<String>) -> Self {
            Self {
                outcome: "delivered".into(),
                attempted,
                failed,
            }
        }

        pub fn skipped(reason: &str) -> Self {
            Self {
                outcome: format!("skipped: {}", reason),
                attempted: Vec::new(),
                failed: Vec::new(),
            }
        }
    }
}
