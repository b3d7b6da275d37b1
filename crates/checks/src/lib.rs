//! Builtin host verification checks.
//!
//! Each module implements one check kind against the
//! [`Check`](hostcheck_core::check::Check) contract. The binary calls
//! [`register_builtins`] once at startup so configuration can refer to
//! these checks by identifier.

pub mod command;
pub mod http;
pub mod process;

use hostcheck_core::check::Check;
use hostcheck_core::error::LoadError;
use hostcheck_core::registry::CheckRegistry;

pub use command::CommandCheck;
pub use http::HttpCheck;
pub use process::ProcessCheck;

/// Register every builtin check factory.
pub fn register_builtins(registry: &mut CheckRegistry) -> Result<(), LoadError> {
    registry.register(http::IDENTIFIER, |entry| {
        HttpCheck::from_entry(entry).map(|check| Box::new(check) as Box<dyn Check>)
    })?;
    registry.register(command::IDENTIFIER, |entry| {
        CommandCheck::from_entry(entry).map(|check| Box::new(check) as Box<dyn Check>)
    })?;
    registry.register(process::IDENTIFIER, |entry| {
        ProcessCheck::from_entry(entry).map(|check| Box::new(check) as Box<dyn Check>)
    })?;
    Ok(())
}
