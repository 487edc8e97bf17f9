//! Switchboard Client - named channels and typed calls
//!
//! An [`RpcClient`] owns one [`Channel`] per configured outbound. Typed
//! clients ([`RawClient`], [`JsonClient`], [`BincodeClient`]) pair a channel
//! with a codec and run each call through
//! `Building -> Encoding -> Sending -> AwaitingReply -> Decoding -> Complete`,
//! or `Failed`.
//!
//! # Example
//!
//! ```no_run
//! use switchboard_client::{Outbound, RpcClient};
//! use switchboard_core::Request;
//!
//! # async fn example() -> switchboard_core::Result<()> {
//! let client = RpcClient::builder("billing")
//!     .outbound("users", Outbound::tcp("127.0.0.1:7000".parse().unwrap()))
//!     .build()?;
//!
//! let response = client
//!     .raw("users")?
//!     .call::<Vec<u8>, Vec<u8>>(Request::new("users/lookup", b"42".to_vec()))
//!     .await?;
//! println!("{} bytes", response.body.len());
//! # Ok(())
//! # }
//! ```

mod call;
mod channel;
mod client;
pub mod config;
mod outbound;
mod typed;

pub use call::PreparedCall;
pub use channel::Channel;
pub use client::{RpcClient, RpcClientBuilder};
pub use config::{ClientConfig, OutboundConfig};
pub use outbound::{Outbound, TransportFactory};
pub use typed::{BincodeClient, JsonClient, RawClient, TypedClient};
