//! Lua sandbox for configured expressions.
//!
//! Expressions come from the user's own configuration, so the standard
//! library stays available. What gets closed off are the escape hatches
//! that would bypass the gate itself:
//!
//! - C module loading (`package.loadlib`, `package.cpath`) for ABI safety
//! - direct process spawning (`os.execute`, `io.popen`): `run(...)` is
//!   the only way to start a process, and it goes through the runner port
//! - `os.exit`, which would take the host down

use mlua::prelude::*;

/// Apply sandbox restrictions to the Lua VM.
pub fn apply_sandbox(lua: &Lua) -> LuaResult<()> {
    lua.load(
        r#"
        -- Block C module loading (ABI safety)
        package.loadlib = nil
        package.cpath = ''
        -- Process escape hatches go through run() instead
        os.execute = nil
        os.exit = nil
        io.popen = nil
    "#,
    )
    .exec()
}
