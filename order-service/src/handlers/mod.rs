pub mod catalog;
pub mod custom_orders;
pub mod health;
pub mod invoices;
pub mod jobs;
pub mod quotations;
pub mod reports;
