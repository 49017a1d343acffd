/*!
# camu DevKit - stubs and helpers for testing the portal stack

Library used by the gateway and portal test suites:
- Recording stub of the upstream college API (no network access needed)
- Canned upstream payloads shaped like the real responses
- Helpers to serve a router on an ephemeral port and init logging
*/

#![recursion_limit = "256"]

pub mod upstream_stub;
pub mod fixtures;
pub mod test_utils;

pub use upstream_stub::{RecordedRequest, StubReply, UpstreamStub};
pub use fixtures::PortalFixtures;
pub use test_utils::{init_test_logging, serve};
