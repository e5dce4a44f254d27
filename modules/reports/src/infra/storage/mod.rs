pub mod entity;
pub mod schema;
pub mod seed;
