mod context;
mod page;
mod item;
mod collection;
mod site;
mod renderer;

pub use context::*;
pub use page::*;
pub use item::*;
pub use collection::*;
pub use site::*;
pub use renderer::*;
