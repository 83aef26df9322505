// lets #[resource] expand to ::resource_kiln paths inside this crate too
extern crate self as resource_kiln;

pub use proc_macros_kiln::resource;

mod resource;
pub use resource::*;

mod resource_types;
pub use resource_types::*;

mod resource_error;
pub use resource_error::*;

mod resource_lifecycler;
pub use resource_lifecycler::*;

mod resource_manager;
pub use resource_manager::*;

mod resource_factory;
pub use resource_factory::*;
