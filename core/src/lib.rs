//! Typed command bridge between application code and a native backend process.
//!
//! Layers, from the wire up:
//!
//! * [`transport`]: one named remote call in, exactly one result out.
//! * [`controller`]: typed CRUD per entity kind plus explicit domain operations.
//! * [`service`]: workflows composed from several controller calls.
//!
//! Nothing here is global. Build a [`Controllers`] from a transport at the
//! composition root and hand out clones.

pub mod controller;
pub mod entity;
pub mod error;
pub mod service;
pub mod transport;

pub use controller::Controllers;
pub use error::Error;
