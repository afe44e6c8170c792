pub use anyhow::{Error, Result};
