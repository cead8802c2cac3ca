//! Client core for browsing a remote comic-character catalog.
//!
//! # Overview
//! Builds signed catalog requests and parses their responses without
//! touching the network (host-does-IO pattern), and keeps the paging,
//! search and local edit state of a list view on top of that.
//!
//! # Design
//! - `CatalogClient` is stateless: `build_*` produces requests, `parse_*`
//!   consumes responses, `fetch_*` runs both over a `Transport` and turns
//!   every failure into an empty result.
//! - `ListController` is a pure state machine that emits `FetchRequest`s
//!   and merges fetched pages with a local `Overlay` of renames and
//!   deletions.
//! - `Session` is the tokio event loop connecting the two, with a
//!   debounced search and a watch channel of `ListView` snapshots.
//! - Wire DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod http;
pub mod overlay;
pub mod session;
pub mod transport;
pub mod types;

pub use auth::{AuthParams, Credentials};
pub use client::CatalogClient;
pub use config::{CatalogConfig, ListConfig};
pub use controller::{CharacterDialog, DialogOutcome, FetchRequest, ListController, ListView};
pub use error::{ApiError, ConfigError, SessionClosed};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use overlay::Overlay;
pub use session::{Session, SessionHandle};
pub use transport::{Transport, UreqTransport};
pub use types::{Character, CharacterId, Page, PageQuery};
