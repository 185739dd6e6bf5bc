pub mod assignments;
pub mod documents;
pub mod drivers;
pub mod health;
pub mod profiles;
pub mod vehicles;
