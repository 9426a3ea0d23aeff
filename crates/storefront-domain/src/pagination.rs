//! Page-number pagination used when enumerating the identity store.

use serde::{Deserialize, Serialize};

/// One page of a 1-based, fixed-size enumeration.
///
/// - `per_page`: ≥ 1, default 50
/// - `page`: ≥ 1, default 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_per_page() -> u32 {
    50
}

fn default_page() -> u32 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            page: default_page(),
        }
    }
}

impl PageRequest {
    /// First page of the given size (size clamped to ≥ 1).
    pub fn first(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            page: 1,
        }
    }

    /// The following page with the same size.
    pub fn next(self) -> Self {
        Self {
            per_page: self.per_page,
            page: self.page.saturating_add(1),
        }
    }
}
