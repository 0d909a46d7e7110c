pub mod authz;
pub mod project;
pub mod user;
