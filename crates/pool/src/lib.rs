//! # Unit Pool
//!
//! Bounded pool manager for expensive, slow-to-create reusable units.
//! Decides when to reuse an idle unit versus create a new one, enforces a
//! hard capacity ceiling, blocks callers while the pool is exhausted, and
//! recycles units when their asynchronous work completes.
//!
//! ```no_run
//! use unit_pool::{Pool, Unit, UnitError, UnitFactory};
//!
//! struct Surface(Vec<u8>);
//!
//! impl Unit for Surface {
//!     fn flush(&mut self) -> Result<(), UnitError> {
//!         self.0.fill(0);
//!         Ok(())
//!     }
//! }
//!
//! struct SurfaceFactory;
//!
//! impl UnitFactory for SurfaceFactory {
//!     type Unit = Surface;
//!
//!     async fn create(&self) -> Result<Surface, UnitError> {
//!         Ok(Surface(vec![0; 4096]))
//!     }
//! }
//!
//! # async fn run() -> unit_pool::Result<()> {
//! let pool = Pool::new("surfaces", SurfaceFactory, 4)?;
//! let mut surface = pool.wait().await?;
//! surface.0[0] = 1;
//! drop(surface); // flushed and back in the idle set
//! pool.drain().await?;
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod error;
pub mod guard;
pub mod logger;
pub mod pool;
pub mod registry;
pub mod unit;

pub use completion::CompletionSink;
pub use error::{Error, Result};
pub use guard::Lease;
pub use logger::{LogCategory, NoopLogger, PoolLogger};
#[cfg(feature = "tracing")]
pub use logger::TracingLogger;
pub use pool::{DiagnosticLevel, Pool, PoolBuilder, PoolConfig, PoolStats};
pub use registry::{MAX_NAME_LEN, Registration, Registry};
pub use unit::{Unit, UnitError, UnitErrorKind, UnitFactory};
