/// Router Module Index
///
/// Splits the API by access level. Protection is applied to a whole router with
/// an Axum layer in `create_router`, so a handler cannot be exposed without
/// authentication by accident.

/// Routes accessible to anyone: reads, registration and login.
pub mod public;

/// Routes behind the bearer-token middleware: every mutation of collections,
/// words and accounts. Ownership is checked in the services.
pub mod authenticated;
