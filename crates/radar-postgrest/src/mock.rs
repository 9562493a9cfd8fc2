//! Scripted mock transport for tests
//!
//! Test support shipped in-crate (not `cfg(test)`-gated) so every crate in
//! the workspace can drive the shim against a deterministic server. Replies
//! are consumed in FIFO order regardless of verb; every call is recorded in
//! a log the tests can assert against (which tables were hit, in what
//! order, with which payloads).

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use crate::transport::{Filter, Row, Transport, TransportError};

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// Recorded insert
    Insert {
        table: String,
        row: Row,
        returning: Option<String>,
    },
    /// Recorded update
    Update {
        table: String,
        filters: Vec<Filter>,
        patch: Row,
    },
    /// Recorded select
    Select {
        table: String,
        filters: Vec<Filter>,
        columns: String,
    },
    /// Recorded delete
    Delete { table: String, filters: Vec<Filter> },
    /// Recorded stored-procedure invocation
    Rpc { function: String, args: Value },
}

impl MockCall {
    /// Table the call targeted, if it was a table verb
    pub fn table(&self) -> Option<&str> {
        match self {
            MockCall::Insert { table, .. }
            | MockCall::Update { table, .. }
            | MockCall::Select { table, .. }
            | MockCall::Delete { table, .. } => Some(table),
            MockCall::Rpc { .. } => None,
        }
    }

    /// The inserted row, if this call was an insert
    pub fn inserted_row(&self) -> Option<&Row> {
        match self {
            MockCall::Insert { row, .. } => Some(row),
            _ => None,
        }
    }
}

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful insert, optionally returning a row
    InsertOk(Option<Value>),
    /// Successful update
    UpdateOk,
    /// Successful select returning rows
    SelectOk(Vec<Value>),
    /// Successful delete
    DeleteOk,
    /// Successful stored-procedure invocation
    RpcOk(Value),
    /// Any verb fails with the given raw server error
    Fail(TransportError),
}

/// Transport double consuming a scripted FIFO queue of [`MockReply`]s
///
/// Interior mutability keeps the [`Transport`] trait's `&self` receivers;
/// the mock is single-threaded like the client it stands in for.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: RefCell<VecDeque<MockReply>>,
    calls: RefCell<Vec<MockCall>>,
}

impl MockTransport {
    /// Create an empty mock (every call fails with "mock script exhausted")
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reply to the script
    pub fn push(&self, reply: MockReply) {
        self.replies.borrow_mut().push_back(reply);
    }

    /// All calls recorded so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.borrow().clone()
    }

    /// Number of calls recorded so far
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Whether the script has been fully consumed
    pub fn script_exhausted(&self) -> bool {
        self.replies.borrow().is_empty()
    }

    fn next_reply(&self, call: MockCall) -> MockReply {
        self.calls.borrow_mut().push(call);
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| MockReply::Fail(TransportError::message("mock script exhausted")))
    }
}

impl Transport for MockTransport {
    fn insert(
        &self,
        table: &str,
        row: &Row,
        returning: Option<&str>,
    ) -> Result<Option<Value>, TransportError> {
        let reply = self.next_reply(MockCall::Insert {
            table: table.to_string(),
            row: row.clone(),
            returning: returning.map(str::to_string),
        });
        match reply {
            MockReply::InsertOk(value) => Ok(value),
            MockReply::Fail(err) => Err(err),
            other => Err(mismatch("insert", &other)),
        }
    }

    fn update(&self, table: &str, filters: &[Filter], patch: &Row) -> Result<(), TransportError> {
        let reply = self.next_reply(MockCall::Update {
            table: table.to_string(),
            filters: filters.to_vec(),
            patch: patch.clone(),
        });
        match reply {
            MockReply::UpdateOk => Ok(()),
            MockReply::Fail(err) => Err(err),
            other => Err(mismatch("update", &other)),
        }
    }

    fn select(
        &self,
        table: &str,
        filters: &[Filter],
        columns: &str,
    ) -> Result<Vec<Value>, TransportError> {
        let reply = self.next_reply(MockCall::Select {
            table: table.to_string(),
            filters: filters.to_vec(),
            columns: columns.to_string(),
        });
        match reply {
            MockReply::SelectOk(rows) => Ok(rows),
            MockReply::Fail(err) => Err(err),
            other => Err(mismatch("select", &other)),
        }
    }

    fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), TransportError> {
        let reply = self.next_reply(MockCall::Delete {
            table: table.to_string(),
            filters: filters.to_vec(),
        });
        match reply {
            MockReply::DeleteOk => Ok(()),
            MockReply::Fail(err) => Err(err),
            other => Err(mismatch("delete", &other)),
        }
    }

    fn rpc(&self, function: &str, args: &Value) -> Result<Value, TransportError> {
        let reply = self.next_reply(MockCall::Rpc {
            function: function.to_string(),
            args: args.clone(),
        });
        match reply {
            MockReply::RpcOk(value) => Ok(value),
            MockReply::Fail(err) => Err(err),
            other => Err(mismatch("rpc", &other)),
        }
    }
}

fn mismatch(verb: &str, reply: &MockReply) -> TransportError {
    TransportError::message(format!("mock reply {reply:?} does not match {verb} call"))
}
