/// Eepers: a turn-based grid game about bombs, keys and sleepy creatures.
///
/// `domain` holds pure data and algorithms, `sim` owns the state aggregate
/// and drives turns and transitions, `ui` adapts the terminal to it.

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;
