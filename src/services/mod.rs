pub mod companies;
pub mod provisioning;
pub mod users;
