//! Agent caller implementations.

mod http_agent;
pub mod mock_agent;

pub use http_agent::HttpAgentCaller;
pub use mock_agent::{MockAgentCaller, MockReply};
