//! Game implementations for the CFR solver.
//!
//! These serve as:
//!
//! 1. **Validation**: Games with known equilibria verify that the engine is
//!    correct.
//!
//! 2. **Examples**: Demonstrate how to describe a game through a decision
//!    catalog and implement the `Game` trait on top of [`ActionPath`].
//!
//! 3. **Benchmarks**: Provide standardized games for performance testing.
//!
//! ## Available Games
//!
//! - [`signaling`]: two-type bet/call signaling game
//! - [`kuhn`]: Kuhn Poker, a 3-card poker game with a known Nash equilibrium
//! - [`settlement`]: litigation settlement bargaining with uneven chance
//!
//! [`ActionPath`]: crate::cfr::ActionPath

pub mod kuhn;
pub mod settlement;
pub mod signaling;
