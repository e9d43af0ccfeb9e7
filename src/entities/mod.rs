pub mod company;
pub mod company_driver;
pub mod driver_profile;
pub mod profile;
pub mod trip;
pub mod user;
pub mod vehicle;
