//! Status macros shared by every crate in the workspace.
//!
//! They forward to `tracing`, so whichever subscriber the binary installs decides
//! how (and whether) they are shown.

pub const SUCCESS_TARGET: &str = "geotally::success";
pub const PRINT_TARGET: &str = "geotally::print";

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: $crate::log::SUCCESS_TARGET, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*)
    };
}
