//! Core domain layer for Chronicle.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! services that build account transaction history from a Substrate chain.
//! It follows hexagonal architecture principles - this is the innermost
//! layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     chronicle (binary)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │ chronicle-graphql │ chronicle-pallets │ chronicle-substrate │
//! │      (API)        │     (rules)       │       (RPC)         │
//! ├───────────────────┴───────────────────┴─────────────────────┤
//! │                    chronicle-storage                        │
//! │                 (memory / PostgreSQL cache)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    chronicle-core  ← YOU ARE HERE           │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Transaction, CacheEntry, ChainEvent, etc.)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Classifier, scanner, cache layer and history facade
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Ports
//!
//! - [`ports::ChainGateway`] - Read blocks, events and timestamps from a chain
//! - [`ports::CacheStore`] - Persist one cache record per account
//! - [`ports::PalletRule`] - Classify the calls of one pallet
//! - [`ports::Clock`] - Wall-clock time for cache freshness
//!
//! ## Request Lifecycle
//!
//! 1. [`services::HistoryService`] checks the cache for a fresh entry
//! 2. On a miss, [`services::BlockScanner`] walks blocks newest first
//! 3. [`services::Classifier`] turns each relevant extrinsic into a transaction
//! 4. The full result is cached, then filtered for the caller

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
