pub mod loader;

pub use loader::ProgramLoader;
