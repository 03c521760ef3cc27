//! Setup strategies
//!
//! Each strategy truncates its input to a trailing lookback window and
//! returns zero or more signals. None of them share state.
//!
//! # Strategies
//!
//! - **Breakout family**: Turtle Breakout, Breakout (30-bar high proximity)
//! - **Low volatility**: Micro-gap runs, Glide v2 (SMA18/SMA50)
//! - **Reversal**: U-Pattern, Oops
//! - **Crossover**: SMA 365x50 cross, SMA 360x50 crossover scanner

pub mod helpers;

pub mod breakout;
pub mod glide;
pub mod low_volatility;
pub mod oops;
pub mod sma_365x50;
pub mod sma_cross;
pub mod turtle;
pub mod u_pattern;

pub use breakout::Breakout;
pub use glide::GlideV2;
pub use low_volatility::LowVolatilityGap;
pub use oops::OopsReversal;
pub use sma_365x50::SmaCross365x50;
pub use sma_cross::{CrossSetup, Crossover, CrossoverScanner};
pub use turtle::TurtleBreakout;
pub use u_pattern::{UMatch, UPattern};
