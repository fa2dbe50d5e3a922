pub mod encoder;
pub mod format;
pub mod op;
pub mod psudo;
pub mod reg;
