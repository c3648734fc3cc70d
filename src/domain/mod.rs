pub mod account;
pub mod activation;
pub mod catalog;
pub mod coupon;
pub mod errors;
pub mod events;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod provider;
