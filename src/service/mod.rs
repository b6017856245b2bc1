pub mod initializer;

pub use initializer::{InitPhase, SchemaInitializer, SchemaProvisioner};
