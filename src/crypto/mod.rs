mod state;

pub use state::{StateSigner, STATE_MAX_AGE_SECS};
