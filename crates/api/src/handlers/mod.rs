//! Request handlers, grouped per feature area.

pub mod margenes;
pub mod oferta;
pub mod plantillas;
pub mod presupuestos;
