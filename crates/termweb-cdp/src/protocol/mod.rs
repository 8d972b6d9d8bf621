//! CDP protocol domain types.
//!
//! Typed parameter and result structs for the commands the termweb core
//! sends. Serialization follows CDP's camelCase JSON; fields the core
//! never sets are omitted rather than modelled.

pub mod browser;
pub mod emulation;
pub mod input;
pub mod page;
pub mod runtime;
pub mod target;

pub use browser::*;
pub use emulation::*;
pub use input::*;
pub use page::*;
pub use runtime::*;
pub use target::*;
