pub mod container;
pub mod controller;
pub mod http;
pub mod router;

pub use container::{Backend, Container, ContainerConfig};
pub use router::Router;
