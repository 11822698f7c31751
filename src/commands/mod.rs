//! # CLI Command Implementations
//!
//! One module per `cub-compose` subcommand. Each exposes an `execute`
//! function taking the shared `GlobalArgs` (plus its own `Args` struct when
//! it has flags) and calling into the `cub_compose` library for the work.
//!
//! Commands print progress and summaries to stdout; library log output goes
//! to stderr through `env_logger`.

pub mod down;
pub mod ls;
pub mod status;
pub mod up;
pub mod validate;
