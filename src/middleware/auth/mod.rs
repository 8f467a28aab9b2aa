//! The request gate.
//!
//! Per request, in this order:
//! 1. `access`  - every protected route: bearer token -> revocation check -> codec -> `AuthCtx`
//! 2. `manager` - manager routes only: account status + last-logout check
//! 3. handler
//! 4. `logout`  - logout routes only, after a successful handler: revoke + timestamp
pub mod access;
pub mod logout;
pub mod manager;
