// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros for convenient formatted logging

#[doc(hidden)]
#[macro_export]
macro_rules! __scope_log {
    ($enabled:ident, $log:ident, $log_with:ident, $scope:expr, error = $err:expr; $($arg:tt)+) => {{
        let scope = &$scope;
        if scope.$enabled() {
            scope.$log_with($err, format_args!($($arg)+));
        }
    }};
    ($enabled:ident, $log:ident, $log_with:ident, $scope:expr, $($arg:tt)+) => {{
        let scope = &$scope;
        if scope.$enabled() {
            scope.$log(format_args!($($arg)+));
        }
    }};
}

/// Log a formatted message at fatal level, then exit the process
///
/// # Examples
/// ```ignore
/// log_fatal!(scope, "cannot bind {}", addr);
/// log_fatal!(scope, error = &startup_failed; "cannot bind {}", addr);
/// ```
#[macro_export]
macro_rules! log_fatal {
    ($scope:expr, $($rest:tt)+) => {
        $crate::__scope_log!(fatal_enabled, fatal, fatal_with, $scope, $($rest)+)
    };
}

/// Log a formatted message at error level
///
/// # Examples
/// ```ignore
/// log_error!(scope, error = &db_unavailable.with_err(e); "query {} failed", id);
/// ```
#[macro_export]
macro_rules! log_error {
    ($scope:expr, $($rest:tt)+) => {
        $crate::__scope_log!(error_enabled, error, error_with, $scope, $($rest)+)
    };
}

/// Log a formatted message at warn level
#[macro_export]
macro_rules! log_warn {
    ($scope:expr, $($rest:tt)+) => {
        $crate::__scope_log!(warn_enabled, warn, warn_with, $scope, $($rest)+)
    };
}

/// Log a formatted message at info level
///
/// # Examples
/// ```ignore
/// log_info!(scope, "listening on {}", addr);
/// ```
#[macro_export]
macro_rules! log_info {
    ($scope:expr, $($rest:tt)+) => {
        $crate::__scope_log!(info_enabled, info, info_with, $scope, $($rest)+)
    };
}

/// Log a formatted message at debug level; arguments are not evaluated
/// unless debug output is enabled for the scope
#[macro_export]
macro_rules! log_debug {
    ($scope:expr, $($rest:tt)+) => {
        $crate::__scope_log!(debug_enabled, debug, debug_with, $scope, $($rest)+)
    };
}
