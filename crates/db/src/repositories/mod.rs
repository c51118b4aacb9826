//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod config_repo;
pub mod margen_repo;
pub mod material_repo;
pub mod plantilla_repo;
pub mod presupuesto_repo;

pub use config_repo::ConfigRepo;
pub use margen_repo::MargenRepo;
pub use material_repo::MaterialRepo;
pub use plantilla_repo::PlantillaRepo;
pub use presupuesto_repo::PresupuestoRepo;
