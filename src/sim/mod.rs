pub mod checkpoint;
pub mod event;
pub mod level;
pub mod progress;
pub mod session;
pub mod step;
pub mod tutorial;
pub mod world;
