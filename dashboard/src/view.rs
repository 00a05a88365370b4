use log::warn;
use shared::{
    ConversionView, DailySeriesView, EngagementView, PerformanceView, PopularityView, ReliabilityView, TrafficView,
};

use crate::error::ApiError;

/// Whether a derived view has anything to show
pub trait Emptiness {
    fn is_empty(&self) -> bool;
}

macro_rules! emptiness_via_method {
    ($($view:ty),* $(,)?) => {
        $(impl Emptiness for $view {
            fn is_empty(&self) -> bool {
                <$view>::is_empty(self)
            }
        })*
    };
}

emptiness_via_method!(
    TrafficView,
    DailySeriesView,
    EngagementView,
    PerformanceView,
    PopularityView,
    ReliabilityView,
    ConversionView,
);

/// Lifecycle of one analytics panel
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> ViewState<T> {
    /// Settles a fetch. A failure with a previously fetched value still
    /// shows that value; the error state is reserved for nothing cached.
    pub fn settle(result: Result<T, ApiError>, cached: Option<T>, what: &str) -> Self {
        match (result, cached) {
            (Ok(value), _) => ViewState::Ready(value),
            (Err(e), Some(value)) => {
                warn!("Refreshing {} failed, showing last fetched data: {}", what, e);
                ViewState::Ready(value)
            }
            (Err(e), None) => ViewState::Failed(format!("Failed to load {}: {}", what, e)),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ViewState<U> {
        match self {
            ViewState::Loading => ViewState::Loading,
            ViewState::Failed(message) => ViewState::Failed(message),
            ViewState::Ready(value) => ViewState::Ready(f(value)),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

impl<T: Emptiness> ViewState<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, ViewState::Ready(value) if value.is_empty())
    }
}
