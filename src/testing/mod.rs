//! Fakes for exercising conversations without Telegram or the Brawl Stars API
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use clubwarden::fsm::ConversationContext;
//! use clubwarden::testing::TestBench;
//!
//! let bench = TestBench::new()?;
//! let chat = ConversationContext::new(1);
//! bench.send(chat, "/start").await?;
//! assert_eq!(bench.messenger.texts(chat).len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod bench;
pub mod fakes;
pub mod recorder;

pub use bench::{TestBench, TestBenchBuilder};
pub use fakes::{player, FixedClock, StaticDirectory};
pub use recorder::{RecordingMessenger, SentMessage};
