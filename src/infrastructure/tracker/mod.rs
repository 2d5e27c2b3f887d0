pub mod linear;

pub use linear::LinearTracker;
