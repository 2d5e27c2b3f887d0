pub mod subprocess;

pub use subprocess::SubprocessRunner;
