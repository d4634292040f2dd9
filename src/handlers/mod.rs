pub mod health;
pub mod update;
