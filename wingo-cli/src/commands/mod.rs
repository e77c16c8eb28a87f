pub mod config;
pub mod evaluate;
pub mod run;

pub use config::show_config;
pub use evaluate::{evaluate, EvaluateArgs};
pub use run::{run, RunArgs};
