pub mod ai_provider;
pub mod catalog;
pub mod practice;
pub mod repository;
