//! The boundary between a database driver and a breaker.
//!
//! A driver wrapper calls [`Hook::before`] ahead of every operation and
//! [`Hook::after`] once it completed, handing the [`Admission`] from one to the other
//! along the call path. Only operations that reach the database are guarded; an empty
//! query result is a valid answer and is recorded as a success.
//!
//! ```
//! use std::fmt;
//!
//! use sqlbreaker::hook::{DriverError, Hook, Operation};
//! use sqlbreaker::CircuitBreaker;
//!
//! #[derive(Debug)]
//! enum DbError {
//!     NoRows,
//!     Io(String),
//! }
//!
//! impl fmt::Display for DbError {
//!     fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
//!         match self {
//!             DbError::NoRows => write!(f, "no rows in result set"),
//!             DbError::Io(err) => write!(f, "{}", err),
//!         }
//!     }
//! }
//!
//! impl DriverError for DbError {
//!     fn is_no_rows(&self) -> bool {
//!         matches!(self, DbError::NoRows)
//!     }
//! }
//!
//! let hook = Hook::new(CircuitBreaker::default());
//! let rows = hook.intercept(Operation::Query, || Err::<Vec<u32>, _>(DbError::NoRows));
//! assert!(rows.is_err());
//! assert_eq!((1, 1), hook.breaker().history());
//! ```

use std::fmt::{self, Display};

use super::breaker::{Breaker, CircuitBreaker};
use super::error::{Error, ServiceUnavailable};
use super::promise::Promise;

/// Driver operations passing through the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Opening a connection.
    Connect,
    /// Closing a connection.
    Close,
    /// Starting a transaction.
    BeginTx,
    /// Committing a transaction.
    Commit,
    /// Rolling back a transaction.
    Rollback,
    /// Executing a statement on a connection.
    Exec,
    /// Running a query on a connection.
    Query,
    /// Preparing a statement.
    Prepare,
    /// Executing a prepared statement.
    StmtExec,
    /// Running a prepared query.
    StmtQuery,
}

impl Operation {
    /// Returns `true` if the operation goes through the breaker.
    pub fn is_guarded(self) -> bool {
        matches!(
            self,
            Operation::BeginTx
                | Operation::Exec
                | Operation::Query
                | Operation::Prepare
                | Operation::StmtExec
                | Operation::StmtQuery
        )
    }

    /// Returns a string value for the operation identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Close => "close",
            Operation::BeginTx => "begin_tx",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
            Operation::Exec => "exec",
            Operation::Query => "query",
            Operation::Prepare => "prepare",
            Operation::StmtExec => "stmt_exec",
            Operation::StmtQuery => "stmt_query",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error reported by a database driver.
pub trait DriverError: Display {
    /// Must return `true` if the error only says the query matched no rows.
    fn is_no_rows(&self) -> bool {
        false
    }
}

/// The permission obtained for one driver operation.
///
/// Empty for unguarded operations; otherwise it carries the promise the outcome is
/// reported through.
#[derive(Debug)]
#[must_use = "an admission should be handed to `Hook::after`"]
pub struct Admission<P> {
    promise: Option<P>,
}

impl<P> Admission<P> {
    /// Returns an admission which records nothing.
    pub fn none() -> Self {
        Admission { promise: None }
    }

    /// Returns `true` if the outcome will be recorded.
    pub fn is_guarded(&self) -> bool {
        self.promise.is_some()
    }
}

/// Reports driver operations to a breaker.
#[derive(Debug, Clone)]
pub struct Hook<B> {
    breaker: B,
}

impl Hook<CircuitBreaker> {
    /// Creates a hook on top of a default circuit breaker.
    pub fn with_default() -> Self {
        Hook::new(CircuitBreaker::default())
    }
}

impl<B> Hook<B>
where
    B: Breaker,
{
    /// Creates a hook reporting to `breaker`.
    pub fn new(breaker: B) -> Self {
        Hook { breaker }
    }

    /// Returns the underlying breaker.
    pub fn breaker(&self) -> &B {
        &self.breaker
    }

    /// Asks the breaker whether `op` may reach the database.
    ///
    /// A rejected operation must fail with the returned error without touching the
    /// database.
    pub fn before(&self, op: Operation) -> Result<Admission<B::Promise>, ServiceUnavailable> {
        if !op.is_guarded() {
            return Ok(Admission::none());
        }

        Ok(Admission {
            promise: Some(self.breaker.allow()?),
        })
    }

    /// Records the result of an operation admitted by [`before`](Hook::before).
    pub fn after<T, E>(&self, admission: Admission<B::Promise>, result: &Result<T, E>)
    where
        E: DriverError,
    {
        let promise = match admission.promise {
            Some(promise) => promise,
            None => return,
        };

        match result {
            Ok(_) => promise.accept(),
            Err(err) if err.is_no_rows() => promise.accept(),
            Err(err) => promise.reject(&err.to_string()),
        }
    }

    /// Runs `f` as the operation `op`.
    pub fn intercept<F, T, E>(&self, op: Operation, f: F) -> Result<T, Error<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: DriverError,
    {
        let admission = self.before(op)?;
        let result = f();
        self.after(admission, &result);
        result.map_err(Error::Inner)
    }
}
