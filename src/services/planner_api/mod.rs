pub mod client;

pub use client::PlannerApiClient;
