//! Black-box test harness core: case loading, process invocation, output
//! checks and the streaming session driver.

pub mod cases;
pub mod collapse_dirs;
pub mod compare;
pub mod domain;
pub mod numerics;
pub mod runner;
pub mod session;

pub use cases::{TestCase, load_cases};
pub use runner::{CaseRunner, RunnerConfig, SandboxWrapper};
pub use session::run_session;
