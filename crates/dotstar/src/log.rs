//! Crate-internal logging macros.
//!
//! Target builds log through `defmt` (`defmt` feature), host builds through
//! `tracing` (`tracing` feature). Call sites only use plain `{}` placeholders
//! so the same format string is valid for both backends. With neither
//! feature enabled the arguments are still type-checked and nothing is
//! emitted.

macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)*);
        #[cfg(feature = "tracing")]
        tracing::info!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
        #[cfg(feature = "tracing")]
        tracing::warn!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}
