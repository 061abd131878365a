// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mediary Engine
//!
//! Reconciles a flat object store and a record-oriented metadata store into
//! a navigable folder hierarchy, and drives folder/item create, rename,
//! move, copy, and delete — including recursive subtree operations,
//! clipboard paste, and filename-conflict resolution.
//!
//! Operations are asynchronous but strictly sequential: multi-item loops run
//! one backend round-trip at a time, and none of the multi-step operations
//! are transactional. Recursive move is synthesized from
//! enumerate/copy/repoint/delete, so every recursive routine returns an
//! itemized [`OpReport`] instead of a single boolean.

pub mod clipboard;
pub mod conflict;
pub mod ops;
pub mod pager;
pub mod retry;
pub mod session;

pub use clipboard::{Clipboard, ClipboardKind};
pub use conflict::{generate_unique_name, ConflictResolution, ConflictResolver, NameConflict};
pub use ops::{ItemTransfer, OpFailure, OpReport, OperationEngine, TransferMode};
pub use pager::{PageResult, QueryPager, QueryState};
pub use retry::RetryPolicy;
pub use session::{PendingItemOp, Session};
