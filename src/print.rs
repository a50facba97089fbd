//! Operator-facing status macros, split from diagnostic `log::debug!`/
//! `log::info!` tracing the way `phylum-dev-cli`'s `print.rs` does: these go
//! straight to stderr with a decorator, independent of the configured log
//! level, since they are the primary channel a human watches during a flow.

#[macro_export]
macro_rules! print_user_success {
    ($($tts:tt)*) => {{
        eprint!("✅ ");
        eprintln!($($tts)*);
    }}
}

#[macro_export]
macro_rules! print_user_warning {
    ($($tts:tt)*) => {{
        eprint!("⚠️  ");
        eprintln!($($tts)*);
    }}
}

#[macro_export]
macro_rules! print_user_failure {
    ($($tts:tt)*) => {{
        eprint!("❗ ");
        eprintln!($($tts)*);
    }}
}
