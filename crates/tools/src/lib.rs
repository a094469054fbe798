// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! forge-tools: the filesystem/shell Tools API the Agent Loop dispatches
//! tool calls to, plus the MCP stdio fallback client for names the
//! built-in API doesn't recognize.

pub mod access;
pub mod ask;
pub mod bash;
pub mod error;
pub mod fs_tools;
pub mod mcp;
pub mod project;
pub mod registry;
pub mod search;

pub use access::AccessControl;
pub use bash::BashResult;
pub use error::ToolError;
pub use mcp::{McpClient, McpServerConfig};
pub use registry::{Dispatch, Tools};
pub use search::GrepMatch;
