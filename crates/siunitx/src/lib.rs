//! # siunitx
//!
//! This crate parses physical quantities written in the notation of the
//!     LaTeX siunitx package and renders them as TeX math.
//!
//! A quantity like `\qty{1.23(4)e3}{\kilo\metre\per\second}` goes through a
//!     short pipeline:
//!
//! 1. The number is parsed into a [NumberPiece] and the unit into [UnitPiece]s.
//!     Which characters count as digits, signs, uncertainty brackets and so on
//!     is itself configurable.
//!
//! 2. The prefix mode may move powers of ten between the number and the unit.
//!
//! 3. The number is post-processed: rounding, minimum digits, exponent modes.
//!     The stages run in a fixed order, see [Stage].
//!     All arithmetic is done on decimal digit strings so nothing is lost to
//!     binary floating point.
//!
//! 4. The pieces are rendered into a small markup tree, [Node], which
//!     serializes to TeX.
//!
//! Every step is controlled by [Options].
//! Options are layered: defaults, then the options of the [Session]
//!     (set with `\sisetup`), then the options of a single command.
//!
//! ```
//! use siunitx::Session;
//!
//! let mut session = Session::new();
//! let node = session.invoke(r"\qty[round-mode=places, round-precision=1]{1.234}{\kilo\metre}").unwrap();
//! assert_eq!(node.to_tex(), r"1.2\,\mathrm{km}");
//!
//! session.invoke(r"\DeclareSIUnit{\parsec}{pc}").unwrap();
//! let node = session.qty("3", r"\mega\parsec", "").unwrap();
//! assert_eq!(node.to_tex(), r"3\,\mathrm{Mpc}");
//! ```

pub mod angle;
pub mod complex;
mod decimal;
pub mod error;
pub mod keyval;
pub mod list;
pub mod markup;
pub mod number;
pub mod options;
pub mod postprocess;
pub mod quantity;
pub mod render;
pub mod session;
mod spellcheck;
pub mod token;
pub mod unit;
pub mod unitrender;

pub use angle::Angle;
pub use complex::Complex;
pub use error::{Error, Kind, Literal, Span};
pub use list::Combinator;
pub use markup::Node;
pub use number::{NumberPiece, Uncertainty, UncertaintyKind};
pub use options::Options;
pub use postprocess::Stage;
pub use session::{Command, Session};
pub use unit::{Position, UnitPiece, UnitTable};
