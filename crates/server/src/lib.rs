pub mod routes;
pub mod startup;
pub mod telegram;
pub mod errors;

pub use startup::run;
