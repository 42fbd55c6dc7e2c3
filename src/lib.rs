//! # Reservation Agent
//!
//! A conversational table reservation assistant.
//!
//! This library provides:
//! - A reservation book with a fixed date horizon and slot grid
//! - Reservation tools (list slots, book, cancel) exposed to a tool-calling LLM
//! - An agent loop that alternates between the model and the tools until the
//!   model produces a final answer
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reservation_agent::agent::Agent;
//! use reservation_agent::config::Config;
//! use reservation_agent::llm::OllamaClient;
//! use reservation_agent::reservations::ReservationBook;
//! use reservation_agent::tools::ToolRegistry;
//!
//! let config = Config::from_env()?;
//! let today = chrono::Local::now().date_naive();
//! let book = Arc::new(ReservationBook::new(today, &config.schedule, config.booking_policy));
//! let llm = Arc::new(OllamaClient::new(config.model_base_url.clone()));
//! let mut agent = Agent::new((&config).into(), llm, ToolRegistry::new(book));
//! let answer = agent.respond("Is there a table for two tonight?").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod reservations;
pub mod tools;

pub use config::Config;
