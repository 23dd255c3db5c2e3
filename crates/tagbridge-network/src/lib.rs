//! Network side of tag registration.
//!
//! This crate provides the TCP client that speaks the registration protocol
//! and the one-shot [`register_tag`] exchange built on it.
//!
//! # Components
//!
//! - **TcpClient**: framed connection with per-operation timeouts
//! - **register_tag**: connect, send one request, read one response, close
//!
//! # Example
//!
//! ```no_run
//! use tagbridge_core::{Rarity, TagUid, UnitKind};
//! use tagbridge_network::{TcpClientConfig, register_tag};
//! use tagbridge_protocol::RegistrationRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TcpClientConfig::new("127.0.0.1", 7777);
//! let uid = TagUid::from_hex("04A3B2C1D2E3F4")?;
//! let request = RegistrationRequest::new(uid, UnitKind::Goblin, Rarity::Rare);
//!
//! let response = register_tag(&config, request).await?;
//! println!("registered, {} abilities", response.active_abilities().count());
//! # Ok(())
//! # }
//! ```

mod client;
mod registration;

pub use client::{TcpClient, TcpClientConfig, TcpClientError};
pub use registration::{RegistrationError, register_tag};
