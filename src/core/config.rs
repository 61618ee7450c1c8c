/*!
 * Runtime Configuration
 */

use crate::core::limits::DEFAULT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};

/// Analyzer configuration, fixed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Starting burst-detection buffer capacity; grows on bursts
    pub initial_buffer_size: usize,
    /// Mirror verbose diagnostics to the debug sink
    pub debug: bool,
}

impl Config {
    pub fn new(initial_buffer_size: usize, debug: bool) -> Self {
        Self {
            // A zero-capacity buffer would flag every entry as a burst
            initial_buffer_size: initial_buffer_size.max(1),
            debug,
        }
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size.max(1);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_buffer_size: DEFAULT_BUFFER_SIZE,
            debug: false,
        }
    }
}
