//! Lua expression runtime: engine, sandbox and the precompiled-source cache.

pub mod engine;
pub mod programs;
pub mod sandbox;

pub use engine::LuaEvaluator;
