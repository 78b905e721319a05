//! # Method Symbols
//!
//! A remote operation is addressed by a *method symbol*: the fully qualified
//! service name and the method name joined by `/` (preferred, the gRPC wire
//! form) or `.` (the form found in proto sources). Splitting happens on the
//! *last* occurrence of the separator so that package dots never interfere.

/// The method symbol could not be split into a service and a method name.
#[derive(Debug, thiserror::Error)]
#[error("Method symbol '{0}' is not in 'package.Service/Method' or 'package.Service.Method' form")]
pub struct SymbolParseError(pub String);

/// Splits a method symbol into `(service, method)`.
///
/// `"pkg.Svc/Method"` and `"pkg.Svc.Method"` both resolve to
/// `("pkg.Svc", "Method")`. A symbol without either separator, or with an
/// empty half, fails with [`SymbolParseError`].
pub fn parse_symbol(symbol: &str) -> Result<(&str, &str), SymbolParseError> {
    let split = symbol
        .rsplit_once('/')
        .or_else(|| symbol.rsplit_once('.'));

    match split {
        Some((service, method)) if !service.is_empty() && !method.is_empty() => {
            Ok((service, method))
        }
        _ => Err(SymbolParseError(symbol.to_string())),
    }
}
