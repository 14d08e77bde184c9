mod policy;
mod refresh_loop;

pub use policy::DEFAULT_REFRESH_INTERVAL_SECONDS;
pub use refresh_loop::{spawn_refresh_loop, RefreshTask};

pub(crate) use policy::refresh_interval;
