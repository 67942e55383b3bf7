// crates/contract-gate-config/src/lib.rs
// ============================================================================
// Module: Contract Gate Config
// Description: Environment-sourced authentication and network settings.
// Purpose: Provide validated, typed settings for the contract runner.
// Dependencies: contract-gate-core, serde
// ============================================================================

//! ## Overview
//! Settings for a contract run are sourced from named environment variables:
//! the authentication mode selector and its per-mode credential fields, plus
//! cross-cutting network settings (request timeout, TLS verification).
//! Settings are plain data, validated eagerly at load time with typed
//! errors, and buildable without any environment for tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use settings::AuthMode;
pub use settings::AuthSettings;
pub use settings::NetworkSettings;
