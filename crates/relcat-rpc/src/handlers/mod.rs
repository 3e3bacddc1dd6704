// crates/relcat-rpc/src/handlers/mod.rs
//
// Handler modules for the RPC endpoints. Handlers hold no transport logic;
// they take a decoded request and the shared state they read from.

pub mod release;
