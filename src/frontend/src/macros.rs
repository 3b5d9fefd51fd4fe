/// Logs through the `log` facade with the message indented four spaces per
/// level of tree depth. Callers must depend on `log`.
#[macro_export]
macro_rules! indented_log {
    ($level:expr, $depth:expr, $($arg:tt)*) => {
        ::log::log!(
            $level,
            "{:width$}{}",
            "",
            ::std::format_args!($($arg)*),
            width = $depth * 4
        )
    };
}
