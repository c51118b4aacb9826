//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs for the handlers that mutate it

pub mod margen;
pub mod material;
pub mod plantilla;
pub mod presupuesto;
