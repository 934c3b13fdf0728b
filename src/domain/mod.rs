pub mod ai;
pub mod cell;
pub mod entity;
pub mod geom;
pub mod pathfind;
pub mod rules;
