//! IP lookup agent.
//!
//! Resolves the caller's public address, geolocation and network
//! classification by querying third-party HTTP providers. No single provider
//! is trusted to be available, so lookups go through ordered fallback chains
//! and every response is normalized into one canonical shape.
//!
//! # Features
//!
//! - **Fallback chains** - Providers tried in a fixed priority order, first success wins
//! - **Schema normalization** - ipapi.co, ip-api.com, ipinfo.io and ipwhois responses mapped to one record
//! - **Retry with backoff** - Current-address discovery retried with exponential backoff
//! - **Aggregate lookups** - Location and security resolved together, partial data kept
//! - **Structured results** - Every operation returns a [`LookupResult`], never an unhandled error
//!
//! # Example Configuration
//!
//! ```yaml
//! settings:
//!   timeout_ms: 10000
//!
//! retry:
//!   max_attempts: 3
//!   backoff_unit_ms: 1000
//!
//! location_providers:
//!   - name: ipapi.co
//!     endpoint: "https://ipapi.co/{ip}/json/"
//!     schema: ipapi_co
//!   - name: ip-api.com
//!     endpoint: "http://ip-api.com/json/{ip}"
//!     schema: ip_api_com
//! ```

pub mod agent;
pub mod aggregator;
pub mod canonical;
pub mod config;
pub mod fetcher;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod result;
pub mod retry;

pub use agent::FindMyIpAgent;
pub use canonical::{CanonicalLocation, CanonicalSecurity, CurrentAddress};
pub use config::Config;
pub use result::{ErrorKind, LookupResult, Status};
