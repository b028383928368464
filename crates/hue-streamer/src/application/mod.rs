//! Application layer of the streamer.
//!
//! Use cases here orchestrate `hue_core` values and talk to the outside world
//! only through traits ([`bridge_api::BridgeApi`], [`streaming_loop::FrameSink`]).
//! Nothing in this layer opens a socket or touches the file system.
//!
//! # Sub-modules
//!
//! - **`startup`** – Version check, registration with retry, and group choice.
//! - **`activate`** – Switches the group into streaming mode and waits for the
//!   session id on the event stream.
//! - **`session`** – The explicitly constructed [`session::StreamSession`].
//! - **`light_store`** – The shared color buffer written by producers.
//! - **`producers`** – Random pattern and calibration highlight.
//! - **`streaming_loop`** – The 20 Hz encode-and-send loop and its drain.

pub mod activate;
pub mod bridge_api;
pub mod light_store;
pub mod producers;
pub mod session;
pub mod startup;
pub mod streaming_loop;
