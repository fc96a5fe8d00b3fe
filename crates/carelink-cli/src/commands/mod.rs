pub mod bootstrap;
pub mod clinical;
pub mod resources;
