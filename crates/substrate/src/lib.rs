//! Substrate RPC adapter for Chronicle.
//!
//! This crate implements the [`ChainGateway`] port from `chronicle-core`,
//! giving the history engine read access to a BelizeChain node over
//! WebSocket RPC.
//!
//! # Features
//!
//! - Height to hash lookup through the legacy `chain_getBlockHash` method
//! - Dynamic metadata decoding of extrinsics and events using subxt
//! - SCALE to positional JSON conversion, with account ids rendered as SS58
//! - Timestamp extraction from the `Timestamp.set` inherent
//!
//! # Usage
//!
//! ```ignore
//! use chronicle_substrate::{SubstrateGateway, SubstrateGatewayConfig};
//!
//! let config = SubstrateGatewayConfig {
//!     ws_url: "ws://localhost:9944".to_string(),
//! };
//!
//! let gateway = SubstrateGateway::connect(&config).await?;
//! let tip = gateway.current_height().await?;
//! let hash = gateway.block_hash(tip).await?;
//! let extrinsics = gateway.extrinsics_of(&hash).await?;
//! gateway.close();
//! ```
//!
//! [`ChainGateway`]: chronicle_core::ports::ChainGateway

mod client;
mod value;

pub use client::{SubstrateGateway, SubstrateGatewayConfig};
