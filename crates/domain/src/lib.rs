mod reminder;
mod shared;
mod user;

pub use reminder::{Channels, Reminder, ReminderKind, Schedule, DAY_MILLIS};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use user::User;
