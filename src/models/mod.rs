mod blood_group;
pub(crate) mod user;

pub use blood_group::BloodGroup;
pub use user::{NewUser, User, UserSummary};
